use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::WalletService;
use crate::domain::{format_cents, ChargeRecord, EntryKind, LedgerEntry, Offer, WalletState};

/// Header shared by charge export and import.
pub const CHARGE_CSV_HEADER: [&str; 7] = [
    "id",
    "timestamp",
    "provider",
    "station",
    "energy_kwh",
    "duration_secs",
    "cost",
];

/// Full session snapshot for JSON export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    /// Seeded balances; replaying `journal` onto them yields `wallet`
    pub initial: WalletState,
    pub wallet: WalletState,
    pub journal: Vec<LedgerEntry>,
    pub charges: Vec<ChargeRecord>,
    pub offers: Vec<Offer>,
}

/// Exporter for converting session data to various formats
pub struct Exporter<'a> {
    service: &'a WalletService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a WalletService) -> Self {
        Self { service }
    }

    /// Export charge history to CSV format, oldest first
    pub async fn export_charges_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let mut charges = self.service.list_all_charges().await;
        charges.sort_by_key(|c| c.timestamp);
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(CHARGE_CSV_HEADER)?;

        let mut count = 0;
        for charge in &charges {
            csv_writer.write_record(&[
                charge.id.to_string(),
                charge.timestamp.to_rfc3339(),
                charge.provider.as_str().to_string(),
                charge.station_name.clone(),
                charge.energy_kwh.to_string(),
                charge.duration_secs.to_string(),
                format_cents(charge.cost_cents),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export balances to CSV format. The main balance comes first.
    pub async fn export_balances_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let balances = self.service.get_balances().await;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["balance", "amount"])?;
        csv_writer.write_record(["main", format_cents(balances.main_balance).as_str()])?;

        let mut count = 1;
        for entry in &balances.providers {
            csv_writer.write_record([entry.provider.as_str(), format_cents(entry.balance).as_str()])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export the ledger journal to CSV format
    pub async fn export_journal_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let journal = self.service.journal().await;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "sequence",
            "timestamp",
            "kind",
            "detail",
            "provider",
            "amount",
        ])?;

        let mut count = 0;
        for entry in &journal {
            let detail = match entry.kind {
                EntryKind::TopUp { method } => method.as_str(),
                EntryKind::Transfer { direction, .. } => direction.as_str(),
            };
            csv_writer.write_record(&[
                entry.id.to_string(),
                entry.sequence.to_string(),
                entry.timestamp.to_rfc3339(),
                entry.kind.as_str().to_string(),
                detail.to_string(),
                entry
                    .provider()
                    .map(|p| p.as_str().to_string())
                    .unwrap_or_default(),
                format_cents(entry.amount_cents),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export the whole session as a JSON snapshot
    pub async fn export_full_json<W: Write>(&self, mut writer: W) -> Result<SessionSnapshot> {
        let ledger = self.service.ledger_snapshot().await;
        let snapshot = SessionSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            initial: ledger.initial,
            wallet: ledger.state,
            journal: ledger.journal,
            charges: self.service.list_all_charges().await,
            offers: self.service.all_offers().to_vec(),
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
