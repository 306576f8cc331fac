use chrono::{DateTime, Utc};

use super::{
    Cents, LedgerEntry, PaymentMethod, ProviderId, TransferDirection, TransferRequest, WalletState,
};

/// Owns one wallet's balances and the journal of operations applied to them.
///
/// Every operation validates before it mutates, so a rejected call leaves
/// both the balances and the journal exactly as they were. Transfers keep
/// `main + Σ providers` constant; a top-up raises it by exactly its amount.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    state: WalletState,
    journal: Vec<LedgerEntry>,
}

impl Ledger {
    pub fn new(state: WalletState) -> Self {
        Self {
            state,
            journal: Vec::new(),
        }
    }

    pub fn state(&self) -> &WalletState {
        &self.state
    }

    pub fn main_balance(&self) -> Cents {
        self.state.main_balance
    }

    /// Balance held for a provider; zero when never funded.
    pub fn balance(&self, provider: ProviderId) -> Cents {
        self.state.balance(provider)
    }

    pub fn total(&self) -> Cents {
        self.state.total()
    }

    pub fn journal(&self) -> &[LedgerEntry] {
        &self.journal
    }

    /// Add external funds to the main balance.
    pub fn top_up(
        &mut self,
        amount_cents: Cents,
        method: PaymentMethod,
        timestamp: DateTime<Utc>,
    ) -> Result<WalletState, LedgerError> {
        validate_amount(amount_cents)?;

        // The total must stay representable, not only the main balance
        let new_main = self
            .state
            .main_balance
            .checked_add(amount_cents)
            .filter(|_| {
                self.state
                    .checked_total()
                    .and_then(|t| t.checked_add(amount_cents))
                    .is_some()
            })
            .ok_or(LedgerError::InvalidAmount(amount_cents))?;

        self.state.main_balance = new_main;
        self.append(LedgerEntry::top_up(amount_cents, method, timestamp));
        Ok(self.state.clone())
    }

    /// Move funds between the main balance and a provider balance.
    pub fn transfer(
        &mut self,
        request: TransferRequest,
        timestamp: DateTime<Utc>,
    ) -> Result<WalletState, LedgerError> {
        validate_amount(request.amount_cents)?;

        let provider_balance = self.state.balance(request.provider);
        let (new_main, new_provider) = match request.direction {
            TransferDirection::ToProvider => {
                ensure_available(self.state.main_balance, request.amount_cents)?;
                (
                    self.state.main_balance - request.amount_cents,
                    provider_balance + request.amount_cents,
                )
            }
            TransferDirection::ToMain => {
                ensure_available(provider_balance, request.amount_cents)?;
                (
                    self.state.main_balance + request.amount_cents,
                    provider_balance - request.amount_cents,
                )
            }
        };

        // Both sides computed; apply together
        self.state.main_balance = new_main;
        if new_provider == 0 {
            self.state.provider_balances.remove(&request.provider);
        } else {
            self.state
                .provider_balances
                .insert(request.provider, new_provider);
        }
        self.append(LedgerEntry::transfer(&request, timestamp));
        Ok(self.state.clone())
    }

    fn append(&mut self, mut entry: LedgerEntry) {
        entry.sequence = self.journal.len() as u64 + 1;
        self.journal.push(entry);
    }
}

fn validate_amount(amount_cents: Cents) -> Result<(), LedgerError> {
    if amount_cents <= 0 {
        return Err(LedgerError::InvalidAmount(amount_cents));
    }
    Ok(())
}

fn ensure_available(available: Cents, requested: Cents) -> Result<(), LedgerError> {
    if requested > available {
        return Err(LedgerError::InsufficientFunds {
            available,
            requested,
        });
    }
    Ok(())
}

/// Replay a journal on top of an initial state.
/// Used to verify that the recorded entries explain the current balances.
pub fn replay_journal(initial: &WalletState, journal: &[LedgerEntry]) -> WalletState {
    let mut state = initial.clone();
    for entry in journal {
        state.main_balance += entry.main_delta();
        if let Some(provider) = entry.provider() {
            *state.provider_balances.entry(provider).or_insert(0) -= entry.main_delta();
        }
    }
    state.provider_balances.retain(|_, balance| *balance != 0);
    state
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Amount was zero, negative, or too large to represent
    InvalidAmount(Cents),
    /// The debited balance does not cover the requested amount
    InsufficientFunds { available: Cents, requested: Cents },
    /// Identifier outside the known provider set
    UnknownProvider(String),
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::InvalidAmount(amount) => {
                write!(f, "Invalid amount: {} cents (must be positive)", amount)
            }
            LedgerError::InsufficientFunds {
                available,
                requested,
            } => write!(
                f,
                "Insufficient funds: requested {} cents, available {} cents",
                requested, available
            ),
            LedgerError::UnknownProvider(name) => write!(f, "Unknown provider: {}", name),
        }
    }
}

impl std::error::Error for LedgerError {}
