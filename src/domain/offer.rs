use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ProviderId;

/// Campaigns run for a fixed week ending at `valid_until`.
const OFFER_LENGTH_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub id: Uuid,
    pub provider: ProviderId,
    pub description: String,
    pub valid_until: DateTime<Utc>,
}

/// Time left on an offer, in whole days and hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Remaining {
    pub days: i64,
    pub hours: i64,
}

impl std::fmt::Display for Remaining {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}d {}h", self.days, self.hours)
    }
}

impl Offer {
    pub fn new(
        provider: ProviderId,
        description: impl Into<String>,
        valid_until: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            provider,
            description: description.into(),
            valid_until,
        }
    }

    pub fn valid_from(&self) -> DateTime<Utc> {
        self.valid_until - Duration::days(OFFER_LENGTH_DAYS)
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.valid_from() <= now && now < self.valid_until
    }

    /// `None` once the offer has expired.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<Remaining> {
        if now >= self.valid_until {
            return None;
        }
        let left = self.valid_until - now;
        Some(Remaining {
            days: left.num_days(),
            hours: left.num_hours() % 24,
        })
    }
}

/// Offers running at `now`, optionally restricted to one provider,
/// soonest-expiring first.
pub fn active_offers(offers: &[Offer], now: DateTime<Utc>, provider: Option<ProviderId>) -> Vec<Offer> {
    let mut active: Vec<Offer> = offers
        .iter()
        .filter(|o| o.is_active(now))
        .filter(|o| provider.is_none_or(|p| o.provider == p))
        .cloned()
        .collect();
    active.sort_by_key(|o| o.valid_until);
    active
}
