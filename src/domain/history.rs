use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Cents, ChargeRecord, HistoryError, ProviderId, TimeRange};

/// Totals and averages over a set of charge records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_kwh: f64,
    pub total_cost_cents: Cents,
    pub average_duration_secs: f64,
    pub count: usize,
}

/// Read-side view over an append-only set of charge records.
///
/// Nothing here mutates the records it is given.
#[derive(Debug, Clone, Default)]
pub struct HistoryAggregator {
    records: Vec<ChargeRecord>,
}

impl HistoryAggregator {
    pub fn new(records: Vec<ChargeRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[ChargeRecord] {
        &self.records
    }

    /// Records are only ever added, never edited or removed.
    pub fn append(&mut self, record: ChargeRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records whose timestamp falls in `[now - window, now]`, or every
    /// record for [`TimeRange::All`]. Order is unspecified.
    pub fn filter(&self, range: TimeRange, now: DateTime<Utc>) -> Vec<ChargeRecord> {
        filter_records(&self.records, range, now)
    }
}

pub fn filter_records(
    records: &[ChargeRecord],
    range: TimeRange,
    now: DateTime<Utc>,
) -> Vec<ChargeRecord> {
    records
        .iter()
        .filter(|r| range.contains(r.timestamp, now))
        .cloned()
        .collect()
}

/// Sum energy and cost, and average the session duration.
pub fn summarize(records: &[ChargeRecord]) -> Result<Summary, HistoryError> {
    if records.is_empty() {
        return Err(HistoryError::EmptyHistory);
    }

    let total_kwh: f64 = records.iter().map(|r| r.energy_kwh).sum();
    let total_cost_cents = total_cost(records)?;
    let total_duration = records
        .iter()
        .try_fold(0u64, |acc, r| acc.checked_add(r.duration_secs))
        .ok_or(HistoryError::Overflow("total duration"))?;

    Ok(Summary {
        total_kwh,
        total_cost_cents,
        average_duration_secs: total_duration as f64 / records.len() as f64,
        count: records.len(),
    })
}

/// Sum of record costs. Fails instead of wrapping when the total does not fit.
pub fn total_cost(records: &[ChargeRecord]) -> Result<Cents, HistoryError> {
    records
        .iter()
        .try_fold(0 as Cents, |acc, r| acc.checked_add(r.cost_cents))
        .ok_or(HistoryError::Overflow("total cost"))
}

/// Group records by the calendar day of their timestamp, evaluated in the
/// given reference offset rather than the local zone of the host.
pub fn group_by_day(
    records: &[ChargeRecord],
    offset: FixedOffset,
) -> BTreeMap<NaiveDate, Vec<ChargeRecord>> {
    let mut groups: BTreeMap<NaiveDate, Vec<ChargeRecord>> = BTreeMap::new();
    for record in records {
        let day = record.timestamp.with_timezone(&offset).date_naive();
        groups.entry(day).or_default().push(record.clone());
    }
    groups
}

pub fn group_by_provider(records: &[ChargeRecord]) -> BTreeMap<ProviderId, Vec<ChargeRecord>> {
    let mut groups: BTreeMap<ProviderId, Vec<ChargeRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.provider).or_default().push(record.clone());
    }
    groups
}

/// Energy delivered per day and provider, ascending by date. Feeds the bar chart.
pub fn daily_energy(
    records: &[ChargeRecord],
    offset: FixedOffset,
) -> Vec<(NaiveDate, BTreeMap<ProviderId, f64>)> {
    group_by_day(records, offset)
        .into_iter()
        .map(|(day, day_records)| {
            let mut per_provider: BTreeMap<ProviderId, f64> = BTreeMap::new();
            for record in &day_records {
                *per_provider.entry(record.provider).or_insert(0.0) += record.energy_kwh;
            }
            (day, per_provider)
        })
        .collect()
}

/// Oldest first, for charting.
pub fn sort_chronological(records: &mut [ChargeRecord]) {
    records.sort_by_key(|r| r.timestamp);
}

/// Newest first, for list display.
pub fn sort_most_recent_first(records: &mut [ChargeRecord]) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

/// Abbreviated hours/minutes, e.g. 5400 -> "1h 30m", 2700 -> "45m".
pub fn format_duration(secs: f64) -> String {
    let total_minutes = (secs.max(0.0) / 60.0).round() as u64;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    match (hours, minutes) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {}m", h, m),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn record(at: DateTime<Utc>, kwh: f64, duration: u64, cost: Cents, provider: ProviderId) -> ChargeRecord {
        ChargeRecord::new(at, provider, "Test Station", kwh, duration, cost).unwrap()
    }

    fn sample(now: DateTime<Utc>) -> Vec<ChargeRecord> {
        vec![
            record(now - Duration::days(2), 20.0, 3600, 5000, ProviderId::AstorSarj),
            record(now - Duration::days(1), 15.0, 2700, 3500, ProviderId::Esarj),
            record(now, 10.0, 1800, 2000, ProviderId::Otojet),
        ]
    }

    #[test]
    fn test_summarize() {
        let summary = summarize(&sample(Utc::now())).unwrap();

        assert_eq!(summary.total_kwh, 45.0);
        assert_eq!(summary.total_cost_cents, 10500);
        assert_eq!(summary.average_duration_secs, 2700.0);
        assert_eq!(summary.count, 3);
    }

    #[test]
    fn test_summarize_empty() {
        assert_eq!(summarize(&[]), Err(HistoryError::EmptyHistory));
    }

    #[test]
    fn test_summarize_reports_overflow() {
        let now = Utc::now();
        let huge_cost = vec![
            record(now, 1.0, 60, Cents::MAX, ProviderId::Zes),
            record(now, 1.0, 60, 1, ProviderId::Zes),
        ];
        assert_eq!(summarize(&huge_cost), Err(HistoryError::Overflow("total cost")));
        assert_eq!(total_cost(&huge_cost), Err(HistoryError::Overflow("total cost")));

        let huge_duration = vec![
            record(now, 1.0, u64::MAX, 100, ProviderId::Zes),
            record(now, 1.0, 1, 100, ProviderId::Zes),
        ];
        assert_eq!(
            summarize(&huge_duration),
            Err(HistoryError::Overflow("total duration"))
        );
    }

    #[test]
    fn test_append_extends_history() {
        let now = Utc::now();
        let mut history = HistoryAggregator::default();
        history.append(record(now, 1.0, 60, 100, ProviderId::Zes));
        history.append(record(now - Duration::days(40), 1.0, 60, 100, ProviderId::Zes));

        assert_eq!(history.len(), 2);
        assert_eq!(history.filter(TimeRange::LastMonth, now).len(), 1);
    }

    #[test]
    fn test_filter_by_range() {
        let now = Utc::now();
        let mut records = sample(now);
        records.push(record(now - Duration::days(20), 5.0, 600, 1000, ProviderId::Zes));
        records.push(record(now - Duration::days(200), 5.0, 600, 1000, ProviderId::Zes));
        records.push(record(now - Duration::days(400), 5.0, 600, 1000, ProviderId::Zes));
        let history = HistoryAggregator::new(records);

        assert_eq!(history.filter(TimeRange::LastWeek, now).len(), 3);
        assert_eq!(history.filter(TimeRange::LastMonth, now).len(), 4);
        assert_eq!(history.filter(TimeRange::LastYear, now).len(), 5);
        assert_eq!(history.filter(TimeRange::All, now).len(), 6);
        // Input untouched
        assert_eq!(history.len(), 6);
    }

    #[test]
    fn test_filter_excludes_future_records() {
        let now = Utc::now();
        let history = HistoryAggregator::new(vec![record(
            now + Duration::hours(1),
            1.0,
            60,
            100,
            ProviderId::Zes,
        )]);
        assert!(history.filter(TimeRange::LastWeek, now).is_empty());
        assert_eq!(history.filter(TimeRange::All, now).len(), 1);
    }

    #[test]
    fn test_group_by_day_uses_reference_offset() {
        // 22:30 UTC is already the next day at UTC+03:00
        let late = Utc.with_ymd_and_hms(2024, 3, 10, 22, 30, 0).unwrap();
        let early = Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap();
        let records = vec![
            record(late, 10.0, 600, 100, ProviderId::Zes),
            record(early, 5.0, 600, 100, ProviderId::Zes),
        ];

        let utc = group_by_day(&records, FixedOffset::east_opt(0).unwrap());
        assert_eq!(utc.len(), 1);

        let istanbul = group_by_day(&records, FixedOffset::east_opt(3 * 3600).unwrap());
        let days: Vec<NaiveDate> = istanbul.keys().copied().collect();
        assert_eq!(
            days,
            vec![
                NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
            ]
        );
    }

    #[test]
    fn test_group_by_provider() {
        let now = Utc::now();
        let mut records = sample(now);
        records.push(record(now, 1.0, 60, 100, ProviderId::AstorSarj));

        let groups = group_by_provider(&records);
        assert_eq!(groups[&ProviderId::AstorSarj].len(), 2);
        assert_eq!(groups[&ProviderId::Esarj].len(), 1);
        assert!(!groups.contains_key(&ProviderId::Zes));
    }

    #[test]
    fn test_daily_energy() {
        let day = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let records = vec![
            record(day, 10.0, 600, 100, ProviderId::Zes),
            record(day + Duration::hours(1), 2.5, 600, 100, ProviderId::Zes),
            record(day + Duration::hours(2), 4.0, 600, 100, ProviderId::Trugo),
            record(day - Duration::days(1), 7.0, 600, 100, ProviderId::Trugo),
        ];

        let chart = daily_energy(&records, FixedOffset::east_opt(0).unwrap());
        assert_eq!(chart.len(), 2);
        assert_eq!(chart[0].1[&ProviderId::Trugo], 7.0);
        assert_eq!(chart[1].1[&ProviderId::Zes], 12.5);
        assert_eq!(chart[1].1[&ProviderId::Trugo], 4.0);
    }

    #[test]
    fn test_sorting() {
        let now = Utc::now();
        let mut records = sample(now);
        records.reverse();

        sort_chronological(&mut records);
        assert!(records.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

        sort_most_recent_first(&mut records);
        assert_eq!(records[0].timestamp, now);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(2700.0), "45m");
        assert_eq!(format_duration(3600.0), "1h");
        assert_eq!(format_duration(5400.0), "1h 30m");
        assert_eq!(format_duration(0.0), "0m");
    }
}
