use chrono::{DateTime, FixedOffset, Utc};

use crate::domain::{
    active_offers, daily_energy, group_by_provider, sort_most_recent_first, summarize, total_cost,
    Cents, ChargeRecord, HistoryError, LedgerEntry, LedgerError, Offer, PaymentMethod, ProviderId,
    Summary, TimeRange, TransferDirection, TransferRequest, WalletState,
};
use crate::storage::{LedgerSnapshot, Repository};

use super::{
    AppError, BalanceReport, DailyBar, DailyChart, HistoryReport, IntegrityReport,
    ProviderBalance, ProviderSegment, ProviderUsage,
};

/// Application service providing the wallet's request/response operations.
/// This is the primary interface for any client (CLI, API, UI, etc.).
pub struct WalletService {
    repo: Repository,
}

impl WalletService {
    /// Create a new wallet service over the given session store.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// A service over an empty wallet with no history.
    pub fn in_memory() -> Self {
        Self::new(Repository::empty())
    }

    // ========================
    // Ledger operations
    // ========================

    /// Add funds to the main balance.
    pub async fn top_up(
        &self,
        amount_cents: Cents,
        method: PaymentMethod,
    ) -> Result<WalletState, AppError> {
        match self.repo.top_up(amount_cents, method, Utc::now()).await {
            Ok(state) => {
                tracing::info!(
                    amount_cents,
                    method = method.as_str(),
                    main_balance = state.main_balance,
                    "top-up applied"
                );
                Ok(state)
            }
            Err(err) => {
                tracing::warn!(amount_cents, error = %err, "top-up rejected");
                Err(err.into())
            }
        }
    }

    /// Move funds between the main balance and a provider balance.
    pub async fn transfer(&self, request: TransferRequest) -> Result<WalletState, AppError> {
        match self.repo.transfer(request, Utc::now()).await {
            Ok(state) => {
                tracing::info!(
                    direction = request.direction.as_str(),
                    provider = request.provider.as_str(),
                    amount_cents = request.amount_cents,
                    main_balance = state.main_balance,
                    provider_balance = state.balance(request.provider),
                    "transfer applied"
                );
                Ok(state)
            }
            Err(err) => {
                tracing::warn!(
                    direction = request.direction.as_str(),
                    provider = request.provider.as_str(),
                    amount_cents = request.amount_cents,
                    error = %err,
                    "transfer rejected"
                );
                Err(match err {
                    LedgerError::InsufficientFunds {
                        available,
                        requested,
                    } => AppError::InsufficientFunds {
                        balance_name: debited_balance_name(&request),
                        available,
                        requested,
                    },
                    other => other.into(),
                })
            }
        }
    }

    /// Parse a provider slug and transfer. Unknown names are rejected before
    /// the ledger is touched.
    pub async fn transfer_named(
        &self,
        direction: TransferDirection,
        provider: &str,
        amount_cents: Cents,
    ) -> Result<WalletState, AppError> {
        let provider: ProviderId = provider.parse()?;
        self.transfer(TransferRequest {
            direction,
            provider,
            amount_cents,
        })
        .await
    }

    /// Current balances of the wallet.
    pub async fn wallet_state(&self) -> WalletState {
        self.repo.wallet_state().await
    }

    /// Main balance and every funded provider balance.
    pub async fn get_balances(&self) -> BalanceReport {
        let state = self.repo.wallet_state().await;
        tracing::debug!(main_balance = state.main_balance, "balances read");

        BalanceReport {
            main_balance: state.main_balance,
            providers: state
                .funded_providers()
                .map(|(provider, balance)| ProviderBalance { provider, balance })
                .collect(),
            total: state.total(),
        }
    }

    /// Balance for a single provider; zero when never funded.
    pub async fn get_balance(&self, provider: ProviderId) -> Cents {
        self.repo.balance(provider).await
    }

    /// Balance for a provider given by slug.
    pub async fn get_balance_by_name(&self, provider: &str) -> Result<Cents, AppError> {
        let provider: ProviderId = provider.parse()?;
        Ok(self.get_balance(provider).await)
    }

    /// Successful ledger operations, oldest first.
    pub async fn journal(&self) -> Vec<LedgerEntry> {
        self.repo.journal().await
    }

    /// Seeded state, balances and journal taken together.
    pub async fn ledger_snapshot(&self) -> LedgerSnapshot {
        self.repo.ledger_snapshot().await
    }

    // ========================
    // History operations
    // ========================

    /// Append a completed charging session to the history.
    pub async fn record_charge(&self, record: ChargeRecord) -> Result<ChargeRecord, AppError> {
        record.validate()?;
        self.repo.append_charge(record.clone()).await;
        tracing::info!(
            id = %record.id,
            provider = record.provider.as_str(),
            energy_kwh = record.energy_kwh,
            cost_cents = record.cost_cents,
            "charge recorded"
        );
        Ok(record)
    }

    /// Records in range, most recent first (list presentation).
    pub async fn query_history(&self, range: TimeRange, now: DateTime<Utc>) -> Vec<ChargeRecord> {
        let mut records = self.repo.list_charges_in_range(range, now).await;
        sort_most_recent_first(&mut records);
        tracing::debug!(range = range.as_str(), count = records.len(), "history queried");
        records
    }

    /// Every record held, in insertion order.
    pub async fn list_all_charges(&self) -> Vec<ChargeRecord> {
        self.repo.list_charges().await
    }

    /// Totals and average duration over a range.
    pub async fn summarize(
        &self,
        range: TimeRange,
        now: DateTime<Utc>,
    ) -> Result<Summary, AppError> {
        let records = self.repo.list_charges_in_range(range, now).await;
        Ok(summarize(&records)?)
    }

    /// Summary plus a per-provider breakdown. An empty range yields a report
    /// without a summary instead of an error.
    pub async fn history_report(
        &self,
        range: TimeRange,
        now: DateTime<Utc>,
    ) -> Result<HistoryReport, AppError> {
        let records = self.repo.list_charges_in_range(range, now).await;

        let summary = match summarize(&records) {
            Ok(summary) => Some(summary),
            Err(HistoryError::EmptyHistory) => None,
            Err(err) => return Err(err.into()),
        };

        let mut providers = Vec::new();
        for (provider, sessions) in group_by_provider(&records) {
            providers.push(ProviderUsage {
                provider,
                sessions: sessions.len(),
                total_kwh: sessions.iter().map(|r| r.energy_kwh).sum(),
                total_cost_cents: total_cost(&sessions)?,
            });
        }

        Ok(HistoryReport {
            range,
            as_of: now,
            summary,
            providers,
        })
    }

    /// Energy per day and provider, ascending by date.
    pub async fn daily_chart(
        &self,
        range: TimeRange,
        now: DateTime<Utc>,
        offset: FixedOffset,
    ) -> DailyChart {
        let records = self.repo.list_charges_in_range(range, now).await;
        let days = daily_energy(&records, offset)
            .into_iter()
            .map(|(date, per_provider)| DailyBar {
                date,
                segments: per_provider
                    .into_iter()
                    .map(|(provider, kwh)| ProviderSegment { provider, kwh })
                    .collect(),
            })
            .collect();

        DailyChart { range, days }
    }

    // ========================
    // Offers
    // ========================

    pub fn active_offers(&self, now: DateTime<Utc>, provider: Option<ProviderId>) -> Vec<Offer> {
        active_offers(self.repo.offers(), now, provider)
    }

    pub fn all_offers(&self) -> &[Offer] {
        self.repo.offers()
    }

    // ========================
    // Integrity operations
    // ========================

    /// Check that balances are non-negative and explained by the journal.
    pub async fn check_integrity(&self) -> IntegrityReport {
        let stats = self.repo.get_integrity_stats().await;
        let mut issues = Vec::new();

        if stats.has_sequence_gaps {
            issues.push("Journal sequence numbers have gaps".to_string());
        }
        if !stats.journal_matches_state {
            issues.push("Replaying the journal does not reproduce current balances".to_string());
        }
        for (provider, balance) in &stats.negative_balances {
            let name = provider.map(|p| p.as_str()).unwrap_or("main");
            issues.push(format!("Negative balance on {}: {} cents", name, balance));
        }

        if !issues.is_empty() {
            tracing::warn!(issues = issues.len(), "integrity check failed");
        }

        IntegrityReport {
            is_healthy: issues.is_empty(),
            entry_count: stats.entry_count,
            charge_count: stats.charge_count,
            issues,
        }
    }
}

fn debited_balance_name(request: &TransferRequest) -> String {
    match request.direction {
        TransferDirection::ToProvider => "main balance".to_string(),
        TransferDirection::ToMain => format!("{} balance", request.provider),
    }
}
