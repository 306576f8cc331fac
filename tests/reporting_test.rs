mod common;

use anyhow::Result;
use chargewallet::application::{AppError, WalletService};
use chargewallet::domain::{ChargeRecord, ProviderId, TimeRange};
use chrono::{Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use common::{charge, parse_date, StandardCharges};

#[tokio::test]
async fn test_summary_of_recent_charges() -> Result<()> {
    let service = WalletService::in_memory();
    let now = Utc::now();
    StandardCharges::record_recent(&service, now).await;

    let summary = service.summarize(TimeRange::LastWeek, now).await?;
    assert_eq!(summary.total_kwh, 45.0);
    assert_eq!(summary.total_cost_cents, 10500);
    assert_eq!(summary.average_duration_secs, 2700.0);
    assert_eq!(summary.count, 3);

    Ok(())
}

#[tokio::test]
async fn test_summary_of_empty_history() -> Result<()> {
    let service = WalletService::in_memory();

    let result = service.summarize(TimeRange::All, Utc::now()).await;
    assert!(matches!(result, Err(AppError::EmptyHistory)));

    // The report degrades to "no summary" instead of failing
    let report = service.history_report(TimeRange::All, Utc::now()).await?;
    assert!(report.summary.is_none());
    assert!(report.providers.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_oversized_totals_fail_instead_of_wrapping() -> Result<()> {
    let service = WalletService::in_memory();
    let now = Utc::now();
    service
        .record_charge(charge(now, ProviderId::Zes, 1.0, 600, 9_223_372_036_854_775_807))
        .await?;
    service
        .record_charge(charge(now, ProviderId::Zes, 1.0, 600, 1))
        .await?;

    let result = service.summarize(TimeRange::All, now).await;
    assert!(matches!(result, Err(AppError::Overflow(_))));
    let report = service.history_report(TimeRange::All, now).await;
    assert!(matches!(report, Err(AppError::Overflow(_))));

    let service = WalletService::in_memory();
    service
        .record_charge(charge(now, ProviderId::Trugo, 1.0, u64::MAX, 100))
        .await?;
    service
        .record_charge(charge(now, ProviderId::Trugo, 1.0, 1, 100))
        .await?;
    let result = service.summarize(TimeRange::All, now).await;
    assert!(matches!(result, Err(AppError::Overflow(ref what)) if what == "total duration"));

    Ok(())
}

#[tokio::test]
async fn test_query_history_by_range() -> Result<()> {
    let service = WalletService::in_memory();
    let now = parse_date("2024-06-30");

    for (days_ago, provider) in [
        (1, ProviderId::Zes),
        (6, ProviderId::Trugo),
        (15, ProviderId::Zes),
        (29, ProviderId::Esarj),
        (100, ProviderId::Voltla),
        (364, ProviderId::Zes),
        (500, ProviderId::Otojet),
    ] {
        service
            .record_charge(charge(now - Duration::days(days_ago), provider, 5.0, 600, 1000))
            .await?;
    }

    assert_eq!(service.query_history(TimeRange::LastWeek, now).await.len(), 2);
    assert_eq!(service.query_history(TimeRange::LastMonth, now).await.len(), 4);
    assert_eq!(service.query_history(TimeRange::LastYear, now).await.len(), 6);
    assert_eq!(service.query_history(TimeRange::All, now).await.len(), 7);

    Ok(())
}

#[tokio::test]
async fn test_query_history_is_most_recent_first() -> Result<()> {
    let service = WalletService::in_memory();
    let now = Utc::now();
    let mut records = StandardCharges::recent(now);
    records.swap(0, 2);
    for record in records {
        service.record_charge(record).await?;
    }

    let listed = service.query_history(TimeRange::All, now).await;
    assert!(listed.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    assert_eq!(listed[0].provider, ProviderId::Otojet);

    Ok(())
}

#[tokio::test]
async fn test_record_charge_rejects_invalid_record() -> Result<()> {
    let service = WalletService::in_memory();

    let mut record = charge(Utc::now(), ProviderId::Zes, 1.0, 60, 100);
    record.energy_kwh = f64::NAN;
    let result = service.record_charge(record).await;
    assert!(matches!(result, Err(AppError::InvalidRecord(_))));

    let mut record = charge(Utc::now(), ProviderId::Zes, 1.0, 60, 100);
    record.cost_cents = -1;
    assert!(service.record_charge(record).await.is_err());

    assert!(service.list_all_charges().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_history_report_breaks_down_providers() -> Result<()> {
    let service = WalletService::in_memory();
    let now = Utc::now();
    StandardCharges::record_recent(&service, now).await;
    service
        .record_charge(charge(now - Duration::hours(3), ProviderId::AstorSarj, 7.5, 900, 1800))
        .await?;

    let report = service.history_report(TimeRange::LastWeek, now).await?;
    let summary = report.summary.expect("summary");
    assert_eq!(summary.count, 4);

    let astor = report
        .providers
        .iter()
        .find(|p| p.provider == ProviderId::AstorSarj)
        .expect("astor usage");
    assert_eq!(astor.sessions, 2);
    assert_eq!(astor.total_kwh, 27.5);
    assert_eq!(astor.total_cost_cents, 6800);

    Ok(())
}

#[tokio::test]
async fn test_daily_chart_groups_in_reference_offset() -> Result<()> {
    let service = WalletService::in_memory();
    let now = Utc.with_ymd_and_hms(2024, 3, 12, 12, 0, 0).unwrap();

    // 21:30 UTC on the 10th is 00:30 on the 11th at +03:00
    for record in [
        charge(Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap(), ProviderId::Zes, 10.0, 600, 100),
        charge(Utc.with_ymd_and_hms(2024, 3, 10, 21, 30, 0).unwrap(), ProviderId::Trugo, 4.0, 600, 100),
        charge(Utc.with_ymd_and_hms(2024, 3, 11, 8, 0, 0).unwrap(), ProviderId::Zes, 6.0, 600, 100),
    ] {
        service.record_charge(record).await?;
    }

    let utc_chart = service
        .daily_chart(TimeRange::LastWeek, now, FixedOffset::east_opt(0).unwrap())
        .await;
    let utc_days: Vec<(NaiveDate, f64)> = utc_chart
        .days
        .iter()
        .map(|d| (d.date, d.total_kwh()))
        .collect();
    assert_eq!(
        utc_days,
        vec![
            (NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(), 14.0),
            (NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(), 6.0),
        ]
    );

    let istanbul = service
        .daily_chart(
            TimeRange::LastWeek,
            now,
            FixedOffset::east_opt(3 * 3600).unwrap(),
        )
        .await;
    let istanbul_days: Vec<(NaiveDate, f64)> = istanbul
        .days
        .iter()
        .map(|d| (d.date, d.total_kwh()))
        .collect();
    assert_eq!(
        istanbul_days,
        vec![
            (NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(), 10.0),
            (NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(), 10.0),
        ]
    );
    assert_eq!(istanbul.days[1].segments.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_readers_see_consistent_snapshots() -> Result<()> {
    let service = std::sync::Arc::new(WalletService::in_memory());
    let now = Utc::now();

    let writer = {
        let service = std::sync::Arc::clone(&service);
        tokio::spawn(async move {
            for i in 0..200u64 {
                let record = ChargeRecord::new(now, ProviderId::Zes, format!("S{}", i), 1.0, i, 100)
                    .unwrap();
                service.record_charge(record).await.unwrap();
            }
        })
    };

    // Every snapshot is a prefix: durations were written as 0, 1, 2, ...
    for _ in 0..50 {
        let snapshot = service.list_all_charges().await;
        for (index, record) in snapshot.iter().enumerate() {
            assert_eq!(record.duration_secs, index as u64);
        }
        tokio::task::yield_now().await;
    }

    writer.await?;
    assert_eq!(service.list_all_charges().await.len(), 200);
    Ok(())
}

#[tokio::test]
async fn test_demo_session_offers() -> Result<()> {
    let now = Utc::now();
    let service = common::demo_service(now);

    assert_eq!(service.active_offers(now, None).len(), 3);
    assert_eq!(service.active_offers(now, Some(ProviderId::Esarj)).len(), 1);
    assert!(service.active_offers(now + Duration::days(8), None).is_empty());

    Ok(())
}
