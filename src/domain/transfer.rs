use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, PaymentMethod, ProviderId, TransferDirection, TransferRequest};

pub type EntryId = Uuid;

/// What a journal entry recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum EntryKind {
    /// External funds entering the main balance
    TopUp { method: PaymentMethod },
    /// Funds moving between main and a provider balance
    Transfer {
        direction: TransferDirection,
        provider: ProviderId,
    },
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::TopUp { .. } => "top-up",
            EntryKind::Transfer { .. } => "transfer",
        }
    }
}

/// A journal entry represents one successful ledger operation.
/// Entries are immutable; failed operations never produce one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    /// Monotonically increasing sequence number for ordering, starting at 1
    pub sequence: u64,
    pub kind: EntryKind,
    /// Amount in cents (always positive)
    pub amount_cents: Cents,
    /// When the operation was applied
    pub timestamp: DateTime<Utc>,
}

impl LedgerEntry {
    /// Create a new entry. The sequence number is assigned by the ledger.
    pub(crate) fn new(kind: EntryKind, amount_cents: Cents, timestamp: DateTime<Utc>) -> Self {
        debug_assert!(amount_cents > 0, "journal amounts must be positive");
        Self {
            id: Uuid::new_v4(),
            sequence: 0,
            kind,
            amount_cents,
            timestamp,
        }
    }

    pub(crate) fn top_up(amount_cents: Cents, method: PaymentMethod, timestamp: DateTime<Utc>) -> Self {
        Self::new(EntryKind::TopUp { method }, amount_cents, timestamp)
    }

    pub(crate) fn transfer(request: &TransferRequest, timestamp: DateTime<Utc>) -> Self {
        Self::new(
            EntryKind::Transfer {
                direction: request.direction,
                provider: request.provider,
            },
            request.amount_cents,
            timestamp,
        )
    }

    /// Provider touched by this entry, if any.
    pub fn provider(&self) -> Option<ProviderId> {
        match self.kind {
            EntryKind::Transfer { provider, .. } => Some(provider),
            EntryKind::TopUp { .. } => None,
        }
    }

    /// Signed effect of this entry on the main balance.
    pub fn main_delta(&self) -> Cents {
        match self.kind {
            EntryKind::TopUp { .. } => self.amount_cents,
            EntryKind::Transfer {
                direction: TransferDirection::ToProvider,
                ..
            } => -self.amount_cents,
            EntryKind::Transfer {
                direction: TransferDirection::ToMain,
                ..
            } => self.amount_cents,
        }
    }
}
