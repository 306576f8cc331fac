// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use chargewallet::application::WalletService;
use chargewallet::domain::{ChargeRecord, Cents, ProviderId, WalletState};
use chargewallet::io::Seed;
use chargewallet::storage::Repository;
use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Helper to create a service over main=1000.00, astor-sarj=100.00
pub fn test_service() -> WalletService {
    let state = WalletState::seeded(100000, [(ProviderId::AstorSarj, 10000)]).unwrap();
    WalletService::new(Repository::new(state, Vec::new(), Vec::new()))
}

/// Helper to create a service from the shipped demo data
pub fn demo_service(now: DateTime<Utc>) -> WalletService {
    Seed::demo(now).into_service()
}

/// Helper to parse a date string into DateTime<Utc>
pub fn parse_date(date_str: &str) -> DateTime<Utc> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
}

pub fn charge(
    at: DateTime<Utc>,
    provider: ProviderId,
    kwh: f64,
    duration_secs: u64,
    cost: Cents,
) -> ChargeRecord {
    ChargeRecord::new(at, provider, "Test Station", kwh, duration_secs, cost).unwrap()
}

/// Test fixture: the three sessions from the history screen
pub struct StandardCharges;

impl StandardCharges {
    /// (20 kWh, 50.00, 1h), (15 kWh, 35.00, 45m), (10 kWh, 20.00, 30m) over the last 3 days
    pub fn recent(now: DateTime<Utc>) -> Vec<ChargeRecord> {
        vec![
            charge(now - Duration::days(2), ProviderId::AstorSarj, 20.0, 3600, 5000),
            charge(now - Duration::days(1), ProviderId::Esarj, 15.0, 2700, 3500),
            charge(now, ProviderId::Otojet, 10.0, 1800, 2000),
        ]
    }

    pub async fn record_recent(service: &WalletService, now: DateTime<Utc>) {
        for record in Self::recent(now) {
            service.record_charge(record).await.unwrap();
        }
    }
}
