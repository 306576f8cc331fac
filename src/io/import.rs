use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::io::Read;
use uuid::Uuid;

use crate::application::WalletService;
use crate::domain::{parse_cents, Cents, ChargeRecord, Offer, ProviderId, WalletState};
use crate::storage::Repository;

/// Initial session contents: wallet balances, prior charge sessions and
/// running offers. Seeding happens outside the ledger and is not journaled.
#[derive(Debug, Clone)]
pub struct Seed {
    pub wallet: WalletState,
    pub charges: Vec<ChargeRecord>,
    pub offers: Vec<Offer>,
}

impl Seed {
    /// The demo data the app ships with, relative to `now`.
    pub fn demo(now: DateTime<Utc>) -> Self {
        let wallet = WalletState {
            main_balance: 100000,
            provider_balances: BTreeMap::from([
                (ProviderId::AstorSarj, 10000),
                (ProviderId::Esarj, 5000),
                (ProviderId::Otojet, 7500),
            ]),
        };

        let charge = |days_ago: i64,
                      provider: ProviderId,
                      station: &str,
                      kwh: f64,
                      secs: u64,
                      cost: Cents| ChargeRecord {
            id: Uuid::new_v4(),
            timestamp: now - Duration::days(days_ago),
            energy_kwh: kwh,
            duration_secs: secs,
            station_name: station.to_string(),
            cost_cents: cost,
            provider,
        };
        let charges = vec![
            charge(2, ProviderId::AstorSarj, "Hızlı Şarj 1", 20.0, 3600, 5000),
            charge(1, ProviderId::Esarj, "Normal Şarj 1", 15.0, 2700, 3500),
            charge(0, ProviderId::Otojet, "Yavaş Şarj 1", 10.0, 1800, 2000),
        ];

        let offers = vec![
            Offer::new(
                ProviderId::AstorSarj,
                "15:30 - 18:00 arası şarj işlemlerinde %20 indirim!",
                now + Duration::days(3),
            ),
            Offer::new(
                ProviderId::Esarj,
                "Gece şarjlarında %15 indirim",
                now + Duration::days(5),
            ),
            Offer::new(
                ProviderId::Otojet,
                "İlk şarjınızda 50 TL bonus",
                now + Duration::days(7),
            ),
        ];

        Self {
            wallet,
            charges,
            offers,
        }
    }

    pub fn into_repository(self) -> Repository {
        Repository::new(self.wallet, self.charges, self.offers)
    }

    pub fn into_service(self) -> WalletService {
        WalletService::new(self.into_repository())
    }
}

/// On-disk seed format. Money is written as decimal strings ("100.00").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub main_balance: Option<String>,
    #[serde(default)]
    pub provider_balances: BTreeMap<ProviderId, String>,
    #[serde(default)]
    pub charges: Vec<SeedCharge>,
    #[serde(default)]
    pub offers: Vec<SeedOffer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedCharge {
    #[serde(default)]
    pub id: Option<Uuid>,
    /// RFC 3339 or YYYY-MM-DD
    pub timestamp: String,
    pub provider: ProviderId,
    pub station: String,
    pub energy_kwh: f64,
    pub duration_secs: u64,
    pub cost: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedOffer {
    pub provider: ProviderId,
    pub description: String,
    /// RFC 3339 or YYYY-MM-DD
    pub valid_until: String,
}

impl SeedFile {
    /// Validate and convert into a [`Seed`].
    pub fn into_seed(self) -> Result<Seed> {
        let main_balance = match self.main_balance.as_deref() {
            Some(amount) => parse_cents(amount)
                .with_context(|| format!("Invalid main balance '{}'", amount))?,
            None => 0,
        };

        let mut provider_balances = Vec::with_capacity(self.provider_balances.len());
        for (provider, amount) in &self.provider_balances {
            let cents = parse_cents(amount)
                .with_context(|| format!("Invalid balance '{}' for {}", amount, provider))?;
            provider_balances.push((*provider, cents));
        }
        let wallet = WalletState::seeded(main_balance, provider_balances)
            .context("Seed balances must be non-negative")?;

        let mut charges = Vec::with_capacity(self.charges.len());
        for (index, seed) in self.charges.into_iter().enumerate() {
            let timestamp = parse_timestamp(&seed.timestamp)
                .with_context(|| format!("Charge #{}: bad timestamp", index + 1))?;
            let cost = parse_cents(&seed.cost)
                .with_context(|| format!("Charge #{}: bad cost '{}'", index + 1, seed.cost))?;
            let mut record = ChargeRecord::new(
                timestamp,
                seed.provider,
                seed.station,
                seed.energy_kwh,
                seed.duration_secs,
                cost,
            )
            .with_context(|| format!("Charge #{}", index + 1))?;
            if let Some(id) = seed.id {
                record = record.with_id(id);
            }
            charges.push(record);
        }

        let mut offers = Vec::with_capacity(self.offers.len());
        for seed in self.offers {
            let valid_until = parse_timestamp(&seed.valid_until)
                .with_context(|| format!("Offer for {}: bad valid_until", seed.provider))?;
            offers.push(Offer::new(seed.provider, seed.description, valid_until));
        }

        Ok(Seed {
            wallet,
            charges,
            offers,
        })
    }
}

/// Read a JSON seed file.
pub fn load_seed_json<R: Read>(reader: R) -> Result<Seed> {
    let file: SeedFile = serde_json::from_reader(reader).context("Seed file is not valid JSON")?;
    file.into_seed()
}

/// Result of an import operation
#[derive(Debug, Clone)]
pub struct ImportResult {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<ImportError>,
}

/// Error that occurred during import
#[derive(Debug, Clone)]
pub struct ImportError {
    pub line: usize,
    pub field: Option<String>,
    pub error: String,
}

/// Options for import operations
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub dry_run: bool,
    pub skip_duplicates: bool,
}

/// Importer for loading charge history into a session
pub struct Importer<'a> {
    service: &'a WalletService,
}

impl<'a> Importer<'a> {
    pub fn new(service: &'a WalletService) -> Self {
        Self { service }
    }

    /// Import charge records from CSV. Bad lines are reported, never fatal.
    pub async fn import_charges_csv<R: Read>(
        &self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let mut known_ids: HashSet<Uuid> = self
            .service
            .list_all_charges()
            .await
            .into_iter()
            .map(|c| c.id)
            .collect();

        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut imported = 0;
        let mut skipped = 0;
        let mut errors = Vec::new();

        for (line_num, result) in csv_reader.records().enumerate() {
            let line = line_num + 2; // +2 for header and 0-indexing

            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: None,
                        error: format!("CSV parse error: {}", e),
                    });
                    continue;
                }
            };

            let charge = match parse_charge_row(&record) {
                Ok(charge) => charge,
                Err(error) => {
                    errors.push(ImportError { line, ..error });
                    continue;
                }
            };

            if known_ids.contains(&charge.id) {
                if options.skip_duplicates {
                    skipped += 1;
                } else {
                    errors.push(ImportError {
                        line,
                        field: Some("id".to_string()),
                        error: format!("Duplicate charge id {}", charge.id),
                    });
                }
                continue;
            }
            known_ids.insert(charge.id);

            if options.dry_run {
                imported += 1;
                continue;
            }

            match self.service.record_charge(charge).await {
                Ok(_) => imported += 1,
                Err(e) => errors.push(ImportError {
                    line,
                    field: None,
                    error: format!("Charge rejected: {}", e),
                }),
            }
        }

        tracing::info!(imported, skipped, errors = errors.len(), "charge import finished");

        Ok(ImportResult {
            imported,
            skipped,
            errors,
        })
    }
}

fn parse_charge_row(record: &csv::StringRecord) -> Result<ChargeRecord, ImportError> {
    let field_error = |field: &str, error: String| ImportError {
        line: 0,
        field: Some(field.to_string()),
        error,
    };

    let id_str = record.get(0).unwrap_or("").trim();
    let id = if id_str.is_empty() {
        Uuid::new_v4()
    } else {
        Uuid::parse_str(id_str).map_err(|e| field_error("id", format!("Invalid id: {}", e)))?
    };

    let timestamp = parse_timestamp(record.get(1).unwrap_or(""))
        .map_err(|e| field_error("timestamp", format!("Invalid timestamp: {}", e)))?;

    let provider: ProviderId = record
        .get(2)
        .unwrap_or("")
        .parse()
        .map_err(|e| field_error("provider", format!("{}", e)))?;

    let station = record.get(3).unwrap_or("").to_string();

    let energy_str = record.get(4).unwrap_or("");
    let energy_kwh: f64 = energy_str
        .trim()
        .parse()
        .map_err(|_| field_error("energy_kwh", format!("Invalid energy '{}'", energy_str)))?;

    let duration_str = record.get(5).unwrap_or("");
    let duration_secs: u64 = duration_str.trim().parse().map_err(|_| {
        field_error(
            "duration_secs",
            format!("Invalid duration '{}'", duration_str),
        )
    })?;

    let cost = parse_cents(record.get(6).unwrap_or(""))
        .map_err(|e| field_error("cost", format!("Invalid cost: {}", e)))?;

    ChargeRecord::new(timestamp, provider, station, energy_kwh, duration_secs, cost)
        .map(|charge| charge.with_id(id))
        .map_err(|e| ImportError {
            line: 0,
            field: None,
            error: e.to_string(),
        })
}

// Helper function to parse timestamp
pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();

    // Try RFC3339 first
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Try YYYY-MM-DD format
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    anyhow::bail!("Invalid timestamp format: {}", s)
}
