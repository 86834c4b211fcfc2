use api_shared::{
    AlternativesRes, HospitalSummaryRes, InventoryRecordRes, MatchReq, MatchRes, CoordinateDto,
    RegionalInventoryRes, StockChangeReq, SupplyOverviewRes,
};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use hemo_core::config::core_config_from_env_values;
use hemo_core::constants::DEFAULT_INVENTORY_DATA_DIR;
use hemo_core::inventory::{FileInventoryStore, InventoryLedger, MemoryInventoryStore};
use hemo_core::{
    Clock, Coordinate, CoreConfig, DirectoryFixture, MatchingEngine, RecordId, SupplyAggregator,
    SystemClock,
};
use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "hemo")]
#[command(about = "HEMO blood matching and inventory CLI")]
struct Cli {
    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct Location {
    /// Latitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    lat: f64,
    /// Longitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    lon: f64,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank compatible donors for a request
    Match {
        /// Directory snapshot (YAML)
        #[arg(long, env = "HEMO_DIRECTORY_FIXTURE")]
        fixture: PathBuf,
        /// Requested blood type, e.g. AB- or ab-neg
        blood_type: String,
        /// Units needed (1-10)
        units: u32,
        /// low, medium, high or critical
        #[arg(long, default_value = "medium")]
        urgency: String,
        #[command(flatten)]
        at: Location,
        /// Search radius in km (defaults to HEMO_SEARCH_RADIUS_KM)
        #[arg(long)]
        radius: Option<f64>,
    },
    /// List emergency alternate blood types
    Alternatives {
        /// Directory snapshot (YAML)
        #[arg(long, env = "HEMO_DIRECTORY_FIXTURE")]
        fixture: PathBuf,
        /// Requested blood type
        blood_type: String,
        #[command(flatten)]
        at: Location,
    },
    /// Report donor supply, or hospital stock with --inventory, around a location
    Supply {
        /// Directory snapshot (YAML)
        #[arg(long, env = "HEMO_DIRECTORY_FIXTURE")]
        fixture: PathBuf,
        #[command(flatten)]
        at: Location,
        /// Radius in km (defaults to HEMO_SEARCH_RADIUS_KM)
        #[arg(long)]
        radius: Option<f64>,
        /// Roll up hospital inventory instead of donors
        #[arg(long)]
        inventory: bool,
    },
    /// Change or inspect one inventory record
    Stock {
        /// Inventory store directory
        #[arg(long, env = "INVENTORY_DATA_DIR", default_value = DEFAULT_INVENTORY_DATA_DIR)]
        data_dir: PathBuf,
        #[command(subcommand)]
        action: StockCommand,
    },
    /// Summarise a hospital's inventory
    Summary {
        /// Inventory store directory
        #[arg(long, env = "INVENTORY_DATA_DIR", default_value = DEFAULT_INVENTORY_DATA_DIR)]
        data_dir: PathBuf,
        /// Hospital id
        hospital_id: String,
    },
}

#[derive(Args)]
struct StockTarget {
    /// Hospital id
    hospital_id: String,
    /// Blood type, e.g. O+ or o-pos
    blood_type: String,
}

#[derive(Subcommand)]
enum StockCommand {
    /// Add units to stock
    Add {
        #[command(flatten)]
        target: StockTarget,
        quantity: u32,
        #[arg(long)]
        reason: Option<String>,
        #[arg(long)]
        performed_by: Option<String>,
        /// Bag or batch id; recorded with --expiry-date
        #[arg(long)]
        unit_id: Option<String>,
        /// RFC 3339 timestamp
        #[arg(long)]
        expiry_date: Option<DateTime<Utc>>,
    },
    /// Reserve available units
    Reserve {
        #[command(flatten)]
        target: StockTarget,
        quantity: u32,
        #[arg(long)]
        reason: Option<String>,
        #[arg(long)]
        performed_by: Option<String>,
    },
    /// Release reserved units
    Release {
        #[command(flatten)]
        target: StockTarget,
        quantity: u32,
        #[arg(long)]
        reason: Option<String>,
        #[arg(long)]
        performed_by: Option<String>,
    },
    /// Show the record and its movements
    Show {
        #[command(flatten)]
        target: StockTarget,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = match core_config_from_env_values(|name| std::env::var(name).ok()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error reading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut stdout = std::io::stdout();
    match run(cli, &cfg, &mut stdout).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, cfg: &CoreConfig, out: &mut dyn Write) -> CliResult<()> {
    let json = cli.json;
    match cli.command {
        Some(Commands::Match {
            fixture,
            blood_type,
            units,
            urgency,
            at,
            radius,
        }) => {
            let world = FixtureWorld::open(&fixture, cfg).await?;
            let req = match_req(blood_type, units, Some(urgency), &at);
            let request = req.to_request(Utc::now())?;
            let result = world
                .matching
                .find_matches(&request, radius.unwrap_or_else(|| cfg.search_radius_km()))
                .await?;
            let res = MatchRes::from_result(&result, None);
            if json {
                return print_json(out, &res);
            }
            writeln!(
                out,
                "{} match(es) for {} unit(s) of {} ({} urgency)",
                res.total_matches, res.units_needed, res.blood_type, res.urgency
            )?;
            for (rank, m) in res.matches.iter().enumerate() {
                writeln!(
                    out,
                    "{:>3}. {} [{}] score {} at {:.1} km",
                    rank + 1,
                    m.donor.name,
                    m.donor.blood_type,
                    m.score,
                    m.distance_km
                )?;
            }
        }
        Some(Commands::Alternatives {
            fixture,
            blood_type,
            at,
        }) => {
            let world = FixtureWorld::open(&fixture, cfg).await?;
            let request = match_req(blood_type, 1, None, &at).to_request(Utc::now())?;
            let report = world.matching.find_alternatives(&request).await?;
            let res = AlternativesRes::from(&report);
            if json {
                return print_json(out, &res);
            }
            if res.alternatives.is_empty() {
                writeln!(out, "No emergency alternates for {}.", res.original_blood_type)?;
            }
            for alt in &res.alternatives {
                writeln!(
                    out,
                    "{} ({} priority): {} donor(s) - {}",
                    alt.blood_type, alt.priority, alt.available_donor_count, alt.reason
                )?;
            }
        }
        Some(Commands::Supply {
            fixture,
            at,
            radius,
            inventory,
        }) => {
            let world = FixtureWorld::open(&fixture, cfg).await?;
            let location = Coordinate::new(at.lat, at.lon)?;
            let radius = radius.unwrap_or_else(|| cfg.search_radius_km());
            if inventory {
                let regional = world.supply.regional_inventory(location, radius).await?;
                let res = RegionalInventoryRes::from(&regional);
                if json {
                    return print_json(out, &res);
                }
                writeln!(
                    out,
                    "{} hospital(s) within {} km",
                    res.hospitals_included.len(),
                    res.radius_km
                )?;
                for row in &res.by_blood_type {
                    writeln!(
                        out,
                        "{:<4} available {:>4} reserved {:>4} low {} out {}",
                        row.blood_type,
                        row.available_stock,
                        row.reserved_stock,
                        row.hospitals_low,
                        row.hospitals_out_of_stock
                    )?;
                }
                for skipped in &res.skipped_hospitals {
                    writeln!(
                        out,
                        "skipped {} ({}): {}",
                        skipped.name, skipped.hospital_id, skipped.reason
                    )?;
                }
            } else {
                let overview = world.supply.blood_supply_overview(location, radius).await?;
                let res = SupplyOverviewRes::from(&overview);
                if json {
                    return print_json(out, &res);
                }
                writeln!(out, "{} donor(s) within {} km", res.total_donors, res.radius_km)?;
                for row in &res.by_blood_type {
                    writeln!(
                        out,
                        "{:<4} {:>3} eligible of {:>3}, {:>3} recent - {}",
                        row.blood_type,
                        row.eligible_donors,
                        row.available_donors,
                        row.recent_donors,
                        row.status_text
                    )?;
                }
            }
        }
        Some(Commands::Stock { data_dir, action }) => {
            let ledger = file_ledger(&data_dir, cfg);
            let record = match action {
                StockCommand::Add {
                    target,
                    quantity,
                    reason,
                    performed_by,
                    unit_id,
                    expiry_date,
                } => {
                    let opts = StockChangeReq {
                        quantity,
                        reason,
                        performed_by,
                        unit_id,
                        expiry_date,
                        ..Default::default()
                    }
                    .to_options()?;
                    ledger.add_stock(target.key()?, quantity, opts).await?
                }
                StockCommand::Reserve {
                    target,
                    quantity,
                    reason,
                    performed_by,
                } => {
                    let opts = change(quantity, reason, performed_by).to_options()?;
                    ledger.reserve_stock(target.key()?, quantity, opts).await?
                }
                StockCommand::Release {
                    target,
                    quantity,
                    reason,
                    performed_by,
                } => {
                    let opts = change(quantity, reason, performed_by).to_options()?;
                    ledger
                        .release_reserved_stock(target.key()?, quantity, opts)
                        .await?
                }
                StockCommand::Show { target } => ledger.record(&target.key()?).await?,
            };
            let res = InventoryRecordRes::from(&record);
            if json {
                return print_json(out, &res);
            }
            print_record(out, &res)?;
        }
        Some(Commands::Summary {
            data_dir,
            hospital_id,
        }) => {
            let ledger = file_ledger(&data_dir, cfg);
            let summary = ledger.hospital_summary(&RecordId::parse(&hospital_id)?).await?;
            let res = HospitalSummaryRes::from(&summary);
            if json {
                return print_json(out, &res);
            }
            writeln!(
                out,
                "Hospital {}: {} in stock, {} reserved, {} available",
                res.hospital_id, res.total_stock, res.total_reserved, res.total_available
            )?;
            for row in &res.by_blood_type {
                writeln!(
                    out,
                    "  {:<4} {:>4} available ({})",
                    row.blood_type, row.available_stock, row.status
                )?;
            }
            for alert in &res.low_stock_alerts {
                writeln!(
                    out,
                    "  LOW {} {} of {} [{}]",
                    alert.blood_type, alert.available_stock, alert.threshold, alert.level
                )?;
            }
            for group in &res.expiring_soon {
                writeln!(
                    out,
                    "  EXPIRING {} {} unit(s) in {} batch(es), first {}",
                    group.blood_type, group.units, group.batches, group.earliest_expiry
                )?;
            }
            for blood_type in &res.skipped_blood_types {
                writeln!(out, "  skipped unreadable record for {blood_type}")?;
            }
        }
        None => {
            writeln!(out, "Use 'hemo --help' for commands")?;
        }
    }

    Ok(())
}

/// Directory, matching and supply built from a YAML snapshot, with its opening inventory held
/// in memory.
struct FixtureWorld {
    matching: MatchingEngine,
    supply: SupplyAggregator,
}

impl FixtureWorld {
    async fn open(path: &Path, cfg: &CoreConfig) -> CliResult<Self> {
        let fixture = DirectoryFixture::load(path).await?;
        let directory = Arc::new(fixture.directory()?);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let ledger = Arc::new(InventoryLedger::new(
            Arc::new(MemoryInventoryStore::new()),
            clock.clone(),
            cfg,
        ));
        fixture.seed_inventory(&ledger).await?;
        Ok(Self {
            matching: MatchingEngine::new(directory.clone(), clock.clone(), cfg),
            supply: SupplyAggregator::new(directory.clone(), directory, ledger, clock, cfg),
        })
    }
}

impl StockTarget {
    fn key(&self) -> CliResult<hemo_core::inventory::InventoryKey> {
        Ok(api_shared::inventory::inventory_key(
            &self.hospital_id,
            &self.blood_type,
        )?)
    }
}

fn file_ledger(data_dir: &Path, cfg: &CoreConfig) -> InventoryLedger {
    InventoryLedger::new(
        Arc::new(FileInventoryStore::new(data_dir)),
        Arc::new(SystemClock),
        cfg,
    )
}

fn match_req(blood_type: String, units: u32, urgency: Option<String>, at: &Location) -> MatchReq {
    MatchReq {
        request_id: None,
        blood_type,
        units_needed: units,
        urgency,
        location: CoordinateDto {
            latitude: at.lat,
            longitude: at.lon,
        },
        search_radius_km: None,
        notify_donors: false,
    }
}

fn change(quantity: u32, reason: Option<String>, performed_by: Option<String>) -> StockChangeReq {
    StockChangeReq {
        quantity,
        reason,
        performed_by,
        ..Default::default()
    }
}

fn print_json<T: serde::Serialize>(out: &mut dyn Write, value: &T) -> CliResult<()> {
    writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
    Ok(())
}

fn print_record(out: &mut dyn Write, res: &InventoryRecordRes) -> CliResult<()> {
    writeln!(
        out,
        "{} @ {}: current {}, reserved {}, available {} ({})",
        res.blood_type,
        res.hospital_id,
        res.current_stock,
        res.reserved_stock,
        res.available_stock,
        res.status
    )?;
    for m in &res.movements {
        writeln!(
            out,
            "  {} {:<10} {:>4} {:>4} -> {:<4} {}",
            m.timestamp.format("%Y-%m-%d %H:%M:%S"),
            m.movement_type,
            m.quantity,
            m.stock_before,
            m.stock_after,
            m.reason
        )?;
    }
    for alert in res.alerts.iter().filter(|a| a.resolved_at.is_none()) {
        writeln!(out, "  ALERT [{}] {}", alert.level, alert.message)?;
    }
    Ok(())
}
