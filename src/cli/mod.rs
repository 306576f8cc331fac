use anyhow::{Context, Result};
use chrono::{FixedOffset, Utc};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::application::{AppError, WalletService};
use crate::catalog;
use crate::domain::{
    format_cents, format_duration, format_money, parse_cents, EntryKind, PaymentMethod,
    ProviderId, TimeRange, TransferDirection, TransferRequest, WalletState,
};
use crate::io::{load_seed_json, Seed};

/// Chargewallet - EV charging wallet and charge history
#[derive(Parser)]
#[command(name = "chargewallet")]
#[command(about = "Multi-provider EV charging wallet with charge-history analytics")]
#[command(version)]
pub struct Cli {
    /// JSON seed file with initial balances, charges and offers (built-in demo data if omitted)
    #[arg(short, long, env = "CHARGEWALLET_SEED")]
    pub seed: Option<PathBuf>,

    /// Reference UTC offset used to assign charges to calendar days
    #[arg(
        long,
        default_value = "+03:00",
        env = "CHARGEWALLET_UTC_OFFSET",
        value_parser = parse_offset,
        allow_hyphen_values = true
    )]
    pub utc_offset: FixedOffset,

    /// Currency code shown next to amounts
    #[arg(long, default_value = "TRY", env = "CHARGEWALLET_CURRENCY")]
    pub currency: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the main balance and provider balances
    Balance {
        /// Provider slug (omit for all balances)
        provider: Option<String>,
    },

    /// Add funds to the main balance
    TopUp {
        /// Amount to add (e.g., "50.00" or "50")
        amount: String,

        /// Funding source: credit-card, bank-transfer, apple-pay
        #[arg(short, long, default_value = "credit-card")]
        method: String,
    },

    /// Move funds between the main balance and a provider
    Transfer {
        /// Amount to move (e.g., "50.00" or "50")
        amount: String,

        /// Provider slug or display name
        #[arg(short, long)]
        provider: String,

        /// to-provider or to-main
        #[arg(short, long, default_value = "to-provider")]
        direction: String,
    },

    /// List charge sessions, most recent first
    History {
        /// week, month, year or all
        #[arg(short, long, default_value = "week")]
        range: String,
    },

    /// Show totals and average session duration
    Summary {
        /// week, month, year or all
        #[arg(short, long, default_value = "week")]
        range: String,
    },

    /// Show energy per day, broken down by provider
    Chart {
        /// week, month, year or all
        #[arg(short, long, default_value = "week")]
        range: String,
    },

    /// List known charging providers
    Providers,

    /// List running offers
    Offers {
        /// Only offers from this provider
        #[arg(long)]
        provider: Option<String>,
    },

    /// Show ledger operations applied in this session
    Journal,

    /// Verify ledger integrity
    Check,

    /// Export data to CSV or JSON
    Export {
        /// What to export: charges, balances, journal, full
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Format: csv, json (default: csv, json for full)
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Import charge sessions from CSV
    Import {
        /// Input CSV file
        file: PathBuf,

        /// Validate without recording
        #[arg(long)]
        dry_run: bool,

        /// Skip records whose id is already present
        #[arg(long)]
        skip_duplicates: bool,
    },

    /// Run commands read from stdin, one per line, against one session
    Session,
}

/// One line of an interactive session.
#[derive(Parser)]
#[command(no_binary_name = true)]
struct SessionLine {
    #[command(subcommand)]
    command: Commands,
}

/// Display settings derived from the command line.
#[derive(Debug, Clone)]
pub struct Settings {
    pub currency: String,
    pub reference_offset: FixedOffset,
}

impl Cli {
    pub fn settings(&self) -> Settings {
        Settings {
            currency: self.currency.clone(),
            reference_offset: self.utc_offset,
        }
    }

    /// Build the session from the seed, then dispatch the command.
    pub async fn run(self) -> Result<()> {
        let settings = self.settings();
        let seed = match &self.seed {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("Cannot open seed file {}", path.display()))?;
                load_seed_json(file)
                    .with_context(|| format!("Cannot load seed file {}", path.display()))?
            }
            None => Seed::demo(Utc::now()),
        };
        tracing::debug!(
            charges = seed.charges.len(),
            offers = seed.offers.len(),
            "session seeded"
        );
        let service = seed.into_service();

        match self.command {
            Commands::Session => run_session(&service, &settings).await,
            command => execute(&service, &settings, command).await,
        }
    }
}

async fn run_session(service: &WalletService, settings: &Settings) -> Result<()> {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read from stdin")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if matches!(line, "quit" | "exit") {
            break;
        }

        let words: Vec<&str> = line.split_whitespace().collect();
        let parsed = match SessionLine::try_parse_from(words) {
            Ok(parsed) => parsed,
            Err(e) => {
                // Help and usage errors are shown, the session continues
                eprintln!("{}", e);
                continue;
            }
        };

        if matches!(parsed.command, Commands::Session) {
            eprintln!("Already in a session.");
            continue;
        }
        if let Err(e) = execute(service, settings, parsed.command).await {
            eprintln!("Error: {:#}", e);
        }
    }
    Ok(())
}

/// Run a single command against the session.
pub async fn execute(service: &WalletService, settings: &Settings, command: Commands) -> Result<()> {
    match command {
        Commands::Balance { provider } => run_balance_command(service, settings, provider).await?,

        Commands::TopUp { amount, method } => {
            let amount_cents =
                parse_cents(&amount).context("Invalid amount format. Use '50.00' or '50'")?;
            let method = PaymentMethod::from_str(&method).ok_or_else(|| {
                anyhow::anyhow!(
                    "Invalid payment method '{}'. Valid methods: credit-card, bank-transfer, apple-pay",
                    method
                )
            })?;

            let state = service.top_up(amount_cents, method).await?;
            println!(
                "Topped up {} via {}. Main balance: {}",
                format_money(amount_cents, &settings.currency),
                method,
                format_money(state.main_balance, &settings.currency)
            );
        }

        Commands::Transfer {
            amount,
            provider,
            direction,
        } => {
            let amount_cents =
                parse_cents(&amount).context("Invalid amount format. Use '50.00' or '50'")?;
            let provider = resolve_provider(&provider)?;
            let direction = TransferDirection::from_str(&direction).ok_or_else(|| {
                anyhow::anyhow!(
                    "Invalid direction '{}'. Use to-provider or to-main",
                    direction
                )
            })?;

            let request = TransferRequest {
                direction,
                provider,
                amount_cents,
            };
            let state = service.transfer(request).await?;
            print_transfer(settings, &request, &state);
        }

        Commands::History { range } => {
            let range = parse_range(&range)?;
            run_history_command(service, settings, range).await?;
        }

        Commands::Summary { range } => {
            let range = parse_range(&range)?;
            run_summary_command(service, settings, range).await?;
        }

        Commands::Chart { range } => {
            let range = parse_range(&range)?;
            run_chart_command(service, settings, range).await?;
        }

        Commands::Providers => {
            println!("{:<14} {:<16} ICON", "ID", "NAME");
            println!("{}", "-".repeat(44));
            for info in catalog::all_providers() {
                println!("{:<14} {:<16} {}", info.id.as_str(), info.display_name, info.icon);
            }
        }

        Commands::Offers { provider } => {
            let provider = provider.as_deref().map(resolve_provider).transpose()?;
            let now = Utc::now();
            let offers = service.active_offers(now, provider);
            if offers.is_empty() {
                println!("No active offers.");
            } else {
                for offer in offers {
                    let remaining = offer
                        .time_remaining(now)
                        .map(|r| r.to_string())
                        .unwrap_or_default();
                    println!(
                        "[{}] {} (ends in {})",
                        catalog::display_name(offer.provider),
                        offer.description,
                        remaining
                    );
                }
            }
        }

        Commands::Journal => run_journal_command(service, settings).await?,

        Commands::Check => {
            let report = service.check_integrity().await;
            println!("Ledger entries: {}", report.entry_count);
            println!("Charge records: {}", report.charge_count);
            if report.is_healthy {
                println!("Status: OK");
            } else {
                println!("Status: ISSUES FOUND");
                for issue in &report.issues {
                    println!("  - {}", issue);
                }
            }
        }

        Commands::Export {
            export_type,
            output,
            format,
        } => run_export_command(service, export_type, output, format).await?,

        Commands::Import {
            file,
            dry_run,
            skip_duplicates,
        } => run_import_command(service, file, dry_run, skip_duplicates).await?,

        Commands::Session => anyhow::bail!("Nested sessions are not supported"),
    }
    Ok(())
}

async fn run_balance_command(
    service: &WalletService,
    settings: &Settings,
    provider: Option<String>,
) -> Result<()> {
    match provider {
        Some(name) => {
            let provider = resolve_provider(&name)?;
            let balance = service.get_balance(provider).await;
            println!(
                "{}: {}",
                catalog::display_name(provider),
                format_money(balance, &settings.currency)
            );
        }
        None => {
            let report = service.get_balances().await;
            println!("{:<20} {:>12} {:<8}", "BALANCE", "AMOUNT", "CURRENCY");
            println!("{}", "-".repeat(42));
            println!(
                "{:<20} {:>12} {:<8}",
                "Main",
                format_cents(report.main_balance),
                settings.currency
            );
            for entry in &report.providers {
                println!(
                    "{:<20} {:>12} {:<8}",
                    catalog::display_name(entry.provider),
                    format_cents(entry.balance),
                    settings.currency
                );
            }
            println!("{}", "-".repeat(42));
            println!(
                "{:<20} {:>12} {:<8}",
                "Total",
                format_cents(report.total),
                settings.currency
            );
        }
    }
    Ok(())
}

fn print_transfer(settings: &Settings, request: &TransferRequest, state: &WalletState) {
    let provider_name = catalog::display_name(request.provider);
    let (from, to) = match request.direction {
        TransferDirection::ToProvider => ("Main", provider_name),
        TransferDirection::ToMain => (provider_name, "Main"),
    };
    println!(
        "Transferred {}: {} -> {}",
        format_money(request.amount_cents, &settings.currency),
        from,
        to
    );
    println!(
        "Main: {}  {}: {}",
        format_cents(state.main_balance),
        provider_name,
        format_cents(state.balance(request.provider))
    );
}

async fn run_history_command(
    service: &WalletService,
    settings: &Settings,
    range: TimeRange,
) -> Result<()> {
    let records = service.query_history(range, Utc::now()).await;

    if records.is_empty() {
        println!("No charges found.");
        return Ok(());
    }

    println!(
        "{:<17} {:<14} {:<20} {:>8} {:>8} {:>10}",
        "DATE", "PROVIDER", "STATION", "KWH", "TIME", "COST"
    );
    println!("{}", "-".repeat(82));
    for record in &records {
        let local = record.timestamp.with_timezone(&settings.reference_offset);
        println!(
            "{:<17} {:<14} {:<20} {:>8.1} {:>8} {:>10}",
            local.format("%Y-%m-%d %H:%M"),
            truncate(catalog::display_name(record.provider), 14),
            truncate(&record.station_name, 20),
            record.energy_kwh,
            format_duration(record.duration_secs as f64),
            format_cents(record.cost_cents)
        );
    }
    Ok(())
}

async fn run_summary_command(
    service: &WalletService,
    settings: &Settings,
    range: TimeRange,
) -> Result<()> {
    let report = service.history_report(range, Utc::now()).await?;

    println!("Charging summary ({})", range);
    println!("{}", "-".repeat(40));

    let Some(summary) = report.summary else {
        // An empty range is a placeholder, not an error
        println!("Total energy:      -");
        println!("Total cost:        -");
        println!("Average duration:  -");
        println!("Sessions:          0");
        return Ok(());
    };

    println!("Total energy:      {:.1} kWh", summary.total_kwh);
    println!(
        "Total cost:        {}",
        format_money(summary.total_cost_cents, &settings.currency)
    );
    println!(
        "Average duration:  {}",
        format_duration(summary.average_duration_secs)
    );
    println!("Sessions:          {}", summary.count);

    if !report.providers.is_empty() {
        println!();
        println!("{:<16} {:>8} {:>10} {:>12}", "PROVIDER", "SESSIONS", "KWH", "COST");
        for usage in &report.providers {
            println!(
                "{:<16} {:>8} {:>10.1} {:>12}",
                catalog::display_name(usage.provider),
                usage.sessions,
                usage.total_kwh,
                format_cents(usage.total_cost_cents)
            );
        }
    }
    Ok(())
}

async fn run_chart_command(
    service: &WalletService,
    settings: &Settings,
    range: TimeRange,
) -> Result<()> {
    let chart = service
        .daily_chart(range, Utc::now(), settings.reference_offset)
        .await;

    if chart.days.is_empty() {
        println!("No charges found.");
        return Ok(());
    }

    let max_kwh = chart
        .days
        .iter()
        .map(|d| d.total_kwh())
        .fold(0.0_f64, f64::max);

    for day in &chart.days {
        let total = day.total_kwh();
        let width = if max_kwh > 0.0 {
            ((total / max_kwh) * 30.0).round() as usize
        } else {
            0
        };
        let breakdown: Vec<String> = day
            .segments
            .iter()
            .map(|s| format!("{} {:.1}", catalog::display_name(s.provider), s.kwh))
            .collect();
        println!(
            "{} {:<30} {:>6.1} kWh  ({})",
            day.date.format("%d.%m"),
            "#".repeat(width),
            total,
            breakdown.join(", ")
        );
    }
    Ok(())
}

async fn run_journal_command(service: &WalletService, settings: &Settings) -> Result<()> {
    let journal = service.journal().await;
    if journal.is_empty() {
        println!("No ledger operations in this session.");
        return Ok(());
    }

    println!("{:>4} {:<17} {:<34} {:>10}", "#", "TIME", "OPERATION", "AMOUNT");
    println!("{}", "-".repeat(68));
    for entry in &journal {
        let description = match entry.kind {
            EntryKind::TopUp { method } => format!("top-up via {}", method),
            EntryKind::Transfer {
                direction: TransferDirection::ToProvider,
                provider,
            } => format!("main -> {}", catalog::display_name(provider)),
            EntryKind::Transfer {
                direction: TransferDirection::ToMain,
                provider,
            } => format!("{} -> main", catalog::display_name(provider)),
        };
        println!(
            "{:>4} {:<17} {:<34} {:>10}",
            entry.sequence,
            entry
                .timestamp
                .with_timezone(&settings.reference_offset)
                .format("%Y-%m-%d %H:%M"),
            truncate(&description, 34),
            format_cents(entry.amount_cents)
        );
    }
    Ok(())
}

async fn run_export_command(
    service: &WalletService,
    export_type: String,
    output: Option<PathBuf>,
    format: Option<String>,
) -> Result<()> {
    use crate::io::Exporter;

    let format = format.unwrap_or_else(|| match export_type.as_str() {
        "full" => "json".to_string(),
        _ => "csv".to_string(),
    });

    let mut writer: Box<dyn Write> = match &output {
        Some(path) => Box::new(
            File::create(path)
                .with_context(|| format!("Cannot create output file {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout()),
    };

    let exporter = Exporter::new(service);
    let count = match (export_type.as_str(), format.as_str()) {
        ("charges", "csv") => exporter.export_charges_csv(&mut writer).await?,
        ("balances", "csv") => exporter.export_balances_csv(&mut writer).await?,
        ("journal", "csv") => exporter.export_journal_csv(&mut writer).await?,
        ("full", "json") => {
            let snapshot = exporter.export_full_json(&mut writer).await?;
            snapshot.charges.len() + snapshot.journal.len()
        }
        (kind, fmt) => anyhow::bail!(
            "Unsupported export '{}' as '{}'. Use charges|balances|journal (csv) or full (json)",
            kind,
            fmt
        ),
    };

    if let Some(path) = output {
        eprintln!("Exported {} records to {}", count, path.display());
    }
    Ok(())
}

async fn run_import_command(
    service: &WalletService,
    file: PathBuf,
    dry_run: bool,
    skip_duplicates: bool,
) -> Result<()> {
    use crate::io::{ImportOptions, Importer};

    let reader =
        File::open(&file).with_context(|| format!("Cannot open {}", file.display()))?;
    let options = ImportOptions {
        dry_run,
        skip_duplicates,
    };
    let result = Importer::new(service)
        .import_charges_csv(reader, options)
        .await?;

    let verb = if dry_run { "Validated" } else { "Imported" };
    println!(
        "{} {} charges ({} skipped, {} errors)",
        verb,
        result.imported,
        result.skipped,
        result.errors.len()
    );
    for error in &result.errors {
        match &error.field {
            Some(field) => println!("  line {} [{}]: {}", error.line, field, error.error),
            None => println!("  line {}: {}", error.line, error.error),
        }
    }
    Ok(())
}

fn resolve_provider(name: &str) -> Result<ProviderId> {
    catalog::resolve(name).ok_or_else(|| AppError::UnknownProvider(name.to_string()).into())
}

fn parse_range(range: &str) -> Result<TimeRange> {
    TimeRange::from_str(range).ok_or_else(|| {
        anyhow::anyhow!(
            "Invalid range '{}'. Valid ranges: week, month, year, all",
            range
        )
    })
}

/// Parse "+03:00", "-0530", "UTC" or "Z" into a fixed offset.
pub fn parse_offset(input: &str) -> Result<FixedOffset, String> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("utc") || input == "Z" {
        return FixedOffset::east_opt(0).ok_or_else(|| "invalid offset".to_string());
    }

    let invalid = || format!("Invalid UTC offset '{}'. Use e.g. +03:00", input);
    let (sign, rest) = match input.split_at_checked(1) {
        Some(("+", rest)) => (1, rest),
        Some(("-", rest)) => (-1, rest),
        _ => return Err(invalid()),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
    if minutes >= 60 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
