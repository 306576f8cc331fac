use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Cents, LedgerError, ProviderId};

/// Balances of one wallet: the main balance plus one sub-balance per
/// charging provider. A provider missing from the map holds zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletState {
    pub main_balance: Cents,
    #[serde(default)]
    pub provider_balances: BTreeMap<ProviderId, Cents>,
}

impl WalletState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a wallet from externally supplied seed values.
    ///
    /// Seeding is an initializer, not a ledger operation: it is not journaled
    /// and does not count as a top-up. Negative seeds are rejected.
    pub fn seeded(
        main_balance: Cents,
        provider_balances: impl IntoIterator<Item = (ProviderId, Cents)>,
    ) -> Result<Self, LedgerError> {
        if main_balance < 0 {
            return Err(LedgerError::InvalidAmount(main_balance));
        }

        let mut balances = BTreeMap::new();
        for (provider, amount) in provider_balances {
            if amount < 0 {
                return Err(LedgerError::InvalidAmount(amount));
            }
            if amount > 0 {
                let slot: &mut Cents = balances.entry(provider).or_insert(0);
                *slot = slot
                    .checked_add(amount)
                    .ok_or(LedgerError::InvalidAmount(amount))?;
            }
        }

        let state = Self {
            main_balance,
            provider_balances: balances,
        };
        // Guard against seeds whose total does not fit in Cents
        state.checked_total().ok_or(LedgerError::InvalidAmount(main_balance))?;
        Ok(state)
    }

    /// Balance held for a provider; zero when the provider was never funded.
    pub fn balance(&self, provider: ProviderId) -> Cents {
        self.provider_balances.get(&provider).copied().unwrap_or(0)
    }

    /// Main balance plus every provider balance.
    pub fn total(&self) -> Cents {
        self.provider_balances
            .values()
            .fold(self.main_balance, |acc, b| acc.saturating_add(*b))
    }

    pub(crate) fn checked_total(&self) -> Option<Cents> {
        self.provider_balances
            .values()
            .try_fold(self.main_balance, |acc, b| acc.checked_add(*b))
    }

    /// Providers holding a non-zero balance, in identifier order.
    pub fn funded_providers(&self) -> impl Iterator<Item = (ProviderId, Cents)> + '_ {
        self.provider_balances
            .iter()
            .filter(|(_, balance)| **balance > 0)
            .map(|(provider, balance)| (*provider, *balance))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransferDirection {
    /// Main balance -> provider balance
    ToProvider,
    /// Provider balance -> main balance
    ToMain,
}

impl TransferDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferDirection::ToProvider => "to-provider",
            TransferDirection::ToMain => "to-main",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "to-provider" | "provider" => Some(TransferDirection::ToProvider),
            "to-main" | "main" => Some(TransferDirection::ToMain),
            _ => None,
        }
    }

    pub fn reversed(&self) -> Self {
        match self {
            TransferDirection::ToProvider => TransferDirection::ToMain,
            TransferDirection::ToMain => TransferDirection::ToProvider,
        }
    }
}

impl std::fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A request to move funds between the main balance and one provider.
/// Consumed immediately by the ledger; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub direction: TransferDirection,
    pub provider: ProviderId,
    pub amount_cents: Cents,
}

impl TransferRequest {
    pub fn to_provider(provider: ProviderId, amount_cents: Cents) -> Self {
        Self {
            direction: TransferDirection::ToProvider,
            provider,
            amount_cents,
        }
    }

    pub fn to_main(provider: ProviderId, amount_cents: Cents) -> Self {
        Self {
            direction: TransferDirection::ToMain,
            provider,
            amount_cents,
        }
    }

    /// The request that undoes this one.
    pub fn reversal(&self) -> Self {
        Self {
            direction: self.direction.reversed(),
            ..*self
        }
    }
}

/// Funding source recorded on a top-up. No payment is processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    #[default]
    CreditCard,
    BankTransfer,
    ApplePay,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "credit-card",
            PaymentMethod::BankTransfer => "bank-transfer",
            PaymentMethod::ApplePay => "apple-pay",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "credit-card" | "card" => Some(PaymentMethod::CreditCard),
            "bank-transfer" | "bank" => Some(PaymentMethod::BankTransfer),
            "apple-pay" => Some(PaymentMethod::ApplePay),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
