use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use crate::domain::{
    replay_journal, Cents, ChargeRecord, HistoryAggregator, Ledger, LedgerEntry, LedgerError,
    Offer, PaymentMethod, ProviderId, TimeRange, TransferRequest, WalletState,
};

/// Statistics for ledger integrity verification.
#[derive(Debug, Clone)]
pub struct IntegrityStats {
    pub entry_count: usize,
    pub charge_count: usize,
    pub has_sequence_gaps: bool,
    pub journal_matches_state: bool,
    pub negative_balances: Vec<(Option<ProviderId>, Cents)>,
}

/// Seeded state, current balances and journal, read under one lock.
#[derive(Debug, Clone)]
pub struct LedgerSnapshot {
    pub initial: WalletState,
    pub state: WalletState,
    pub journal: Vec<LedgerEntry>,
}

/// In-memory store for one wallet session.
///
/// The ledger sits behind a single mutex: a transfer's balance check and
/// its mutation happen under one lock acquisition, so concurrent requests
/// are serialized per wallet. Charge records live in an append-only
/// [`HistoryAggregator`]; readers take a cloned snapshot and never observe
/// a partially written record.
pub struct Repository {
    initial: WalletState,
    ledger: Mutex<Ledger>,
    history: RwLock<HistoryAggregator>,
    offers: Vec<Offer>,
}

impl Repository {
    /// Create a store from externally supplied seed data.
    pub fn new(initial: WalletState, charges: Vec<ChargeRecord>, offers: Vec<Offer>) -> Self {
        Self {
            ledger: Mutex::new(Ledger::new(initial.clone())),
            initial,
            history: RwLock::new(HistoryAggregator::new(charges)),
            offers,
        }
    }

    /// An empty wallet with no history.
    pub fn empty() -> Self {
        Self::new(WalletState::new(), Vec::new(), Vec::new())
    }

    // ========================
    // Ledger
    // ========================

    pub async fn top_up(
        &self,
        amount_cents: Cents,
        method: PaymentMethod,
        timestamp: DateTime<Utc>,
    ) -> Result<WalletState, LedgerError> {
        let mut ledger = self.ledger.lock().await;
        ledger.top_up(amount_cents, method, timestamp)
    }

    pub async fn transfer(
        &self,
        request: TransferRequest,
        timestamp: DateTime<Utc>,
    ) -> Result<WalletState, LedgerError> {
        let mut ledger = self.ledger.lock().await;
        ledger.transfer(request, timestamp)
    }

    pub async fn wallet_state(&self) -> WalletState {
        self.ledger.lock().await.state().clone()
    }

    pub async fn balance(&self, provider: ProviderId) -> Cents {
        self.ledger.lock().await.balance(provider)
    }

    pub async fn journal(&self) -> Vec<LedgerEntry> {
        self.ledger.lock().await.journal().to_vec()
    }

    pub fn initial_state(&self) -> &WalletState {
        &self.initial
    }

    /// Balances and the journal that explains them, never torn by a
    /// concurrent operation.
    pub async fn ledger_snapshot(&self) -> LedgerSnapshot {
        let ledger = self.ledger.lock().await;
        LedgerSnapshot {
            initial: self.initial.clone(),
            state: ledger.state().clone(),
            journal: ledger.journal().to_vec(),
        }
    }

    // ========================
    // Charge history
    // ========================

    pub async fn append_charge(&self, record: ChargeRecord) {
        self.history.write().await.append(record);
    }

    pub async fn list_charges(&self) -> Vec<ChargeRecord> {
        self.history.read().await.records().to_vec()
    }

    pub async fn list_charges_in_range(
        &self,
        range: TimeRange,
        now: DateTime<Utc>,
    ) -> Vec<ChargeRecord> {
        self.history.read().await.filter(range, now)
    }

    pub async fn charge_count(&self) -> usize {
        self.history.read().await.len()
    }

    // ========================
    // Offers
    // ========================

    pub fn offers(&self) -> &[Offer] {
        &self.offers
    }

    // ========================
    // Integrity
    // ========================

    pub async fn get_integrity_stats(&self) -> IntegrityStats {
        let ledger = self.ledger.lock().await;
        let state = ledger.state();
        let journal = ledger.journal();

        let has_sequence_gaps = journal
            .iter()
            .enumerate()
            .any(|(i, entry)| entry.sequence != i as u64 + 1);

        let mut negative_balances = Vec::new();
        if state.main_balance < 0 {
            negative_balances.push((None, state.main_balance));
        }
        for (provider, balance) in &state.provider_balances {
            if *balance < 0 {
                negative_balances.push((Some(*provider), *balance));
            }
        }

        IntegrityStats {
            entry_count: journal.len(),
            charge_count: self.history.read().await.len(),
            has_sequence_gaps,
            journal_matches_state: replay_journal(&self.initial, journal) == *state,
            negative_balances,
        }
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::empty()
    }
}
