use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, ProviderId};

pub type ChargeId = Uuid;

/// A completed charging session. Records are immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeRecord {
    pub id: ChargeId,
    /// When the session took place
    pub timestamp: DateTime<Utc>,
    pub energy_kwh: f64,
    pub duration_secs: u64,
    pub station_name: String,
    /// Amount paid, in cents
    pub cost_cents: Cents,
    pub provider: ProviderId,
}

impl ChargeRecord {
    /// Create a validated record. Energy must be finite and non-negative,
    /// cost must be non-negative.
    pub fn new(
        timestamp: DateTime<Utc>,
        provider: ProviderId,
        station_name: impl Into<String>,
        energy_kwh: f64,
        duration_secs: u64,
        cost_cents: Cents,
    ) -> Result<Self, HistoryError> {
        let record = Self {
            id: Uuid::new_v4(),
            timestamp,
            energy_kwh,
            duration_secs,
            station_name: station_name.into(),
            cost_cents,
            provider,
        };
        record.validate()?;
        Ok(record)
    }

    pub fn with_id(mut self, id: ChargeId) -> Self {
        self.id = id;
        self
    }

    /// Check the invariants of a record built outside [`ChargeRecord::new`],
    /// e.g. one deserialized from a seed file.
    pub fn validate(&self) -> Result<(), HistoryError> {
        if !self.energy_kwh.is_finite() || self.energy_kwh < 0.0 {
            return Err(HistoryError::InvalidRecord(format!(
                "energy must be a non-negative number, got {}",
                self.energy_kwh
            )));
        }
        if self.cost_cents < 0 {
            return Err(HistoryError::InvalidRecord(format!(
                "cost must not be negative, got {} cents",
                self.cost_cents
            )));
        }
        Ok(())
    }
}

/// Window of history considered by aggregation queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    /// Last 7 days
    #[default]
    #[serde(rename = "week")]
    LastWeek,
    /// Last 30 days
    #[serde(rename = "month")]
    LastMonth,
    /// Last 365 days
    #[serde(rename = "year")]
    LastYear,
    All,
}

impl TimeRange {
    pub const ALL: [TimeRange; 4] = [
        TimeRange::LastWeek,
        TimeRange::LastMonth,
        TimeRange::LastYear,
        TimeRange::All,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::LastWeek => "week",
            TimeRange::LastMonth => "month",
            TimeRange::LastYear => "year",
            TimeRange::All => "all",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "week" | "last-week" => Some(TimeRange::LastWeek),
            "month" | "last-month" => Some(TimeRange::LastMonth),
            "year" | "last-year" => Some(TimeRange::LastYear),
            "all" => Some(TimeRange::All),
            _ => None,
        }
    }

    /// Length of the window; `None` for an unbounded range.
    pub fn window(&self) -> Option<Duration> {
        match self {
            TimeRange::LastWeek => Some(Duration::days(7)),
            TimeRange::LastMonth => Some(Duration::days(30)),
            TimeRange::LastYear => Some(Duration::days(365)),
            TimeRange::All => None,
        }
    }

    /// Inclusive bounds `[now - window, now]`; `None` for `All`.
    pub fn bounds(&self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.window().map(|window| (now - window, now))
    }

    pub fn contains(&self, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self.bounds(now) {
            Some((start, end)) => timestamp >= start && timestamp <= end,
            None => true,
        }
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// A statistic was requested over zero records
    EmptyHistory,
    /// A record violates its invariants
    InvalidRecord(String),
    /// An aggregate does not fit its type
    Overflow(&'static str),
}

impl std::fmt::Display for HistoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryError::EmptyHistory => write!(f, "No charge records in the selected range"),
            HistoryError::InvalidRecord(reason) => write!(f, "Invalid charge record: {}", reason),
            HistoryError::Overflow(what) => write!(f, "Aggregate overflow: {} is too large", what),
        }
    }
}

impl std::error::Error for HistoryError {}
