use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Cents, ProviderId, Summary, TimeRange};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryReport {
    pub range: TimeRange,
    pub as_of: DateTime<Utc>,
    /// `None` when the range holds no records
    pub summary: Option<Summary>,
    pub providers: Vec<ProviderUsage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderUsage {
    pub provider: ProviderId,
    pub sessions: usize,
    pub total_kwh: f64,
    pub total_cost_cents: Cents,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyChart {
    pub range: TimeRange,
    pub days: Vec<DailyBar>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub segments: Vec<ProviderSegment>,
}

impl DailyBar {
    pub fn total_kwh(&self) -> f64 {
        self.segments.iter().map(|s| s.kwh).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSegment {
    pub provider: ProviderId,
    pub kwh: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceReport {
    pub main_balance: Cents,
    pub providers: Vec<ProviderBalance>,
    pub total: Cents,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderBalance {
    pub provider: ProviderId,
    pub balance: Cents,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub is_healthy: bool,
    pub entry_count: usize,
    pub charge_count: usize,
    pub issues: Vec<String>,
}
