mod config;
mod error;
mod evidence;
mod identity;
mod parser;
mod resolve;
mod scanner;
mod series;
mod types;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

use config::Config;
use types::PersonSeries;

#[derive(Parser)]
#[command(
    name = "mail_resolve",
    about = "Email header identity resolver and send-event series builder"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run full resolution over a CSV file or shard directory → output/*.json
    Resolve {
        /// CSV file, or directory containing .csv shards
        #[arg(default_value = ".")]
        input: PathBuf,
        /// JSON config file (thresholds, sent-folder labels, overrides)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Directory for the JSON artifacts
        #[arg(long, default_value = "output")]
        output_dir: PathBuf,
    },
    /// Print the identity name-set inventory from cached output
    Roster {
        #[arg(long, default_value = "output")]
        output_dir: PathBuf,
    },
    /// Print one person's send-event series from cached output
    Query {
        person_id: String,
        #[arg(long, default_value = "output")]
        output_dir: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Command::Resolve {
            input,
            config,
            output_dir,
        }) => run_resolve(&input, config.as_deref(), &output_dir),
        Some(Command::Roster { output_dir }) => run_roster(&output_dir),
        Some(Command::Query {
            person_id,
            output_dir,
        }) => run_query(&person_id, &output_dir),
        // Default: resolve the current directory
        None => run_resolve(Path::new("."), None, Path::new("output")),
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  OUTPUT FILE HELPERS
// ═══════════════════════════════════════════════════════════════════════

fn write_json<T: serde::Serialize>(dir: &Path, name: &str, data: &T) -> anyhow::Result<()> {
    let path = dir.join(name);
    let json = serde_json::to_string_pretty(data)?;
    fs::write(&path, &json).with_context(|| format!("cannot write {}", path.display()))?;
    info!("  {} ({} bytes)", path.display(), json.len());
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(dir: &Path, name: &str) -> anyhow::Result<T> {
    let path = dir.join(name);
    let json = fs::read_to_string(&path).with_context(|| {
        format!(
            "cannot read {} (run `mail_resolve resolve` first to generate it)",
            path.display()
        )
    })?;
    serde_json::from_str(&json).with_context(|| format!("cannot parse {}", path.display()))
}

/// Everything the roster subcommand needs to re-print the mapping.
#[derive(serde::Serialize, serde::Deserialize)]
struct IdentitiesFile {
    identities: Vec<identity::IdentitySet>,
    evidence: Vec<evidence::PersonEvidence>,
    index_size: usize,
}

// ═══════════════════════════════════════════════════════════════════════
//  RESOLVE MODE: full pipeline → output/*.json
// ═══════════════════════════════════════════════════════════════════════

fn run_resolve(input: &Path, config_path: Option<&Path>, output_dir: &Path) -> anyhow::Result<()> {
    let cfg = match config_path {
        Some(p) => {
            let cfg = Config::load(p).with_context(|| format!("loading {}", p.display()))?;
            info!("config: {}", p.display());
            cfg
        }
        None => Config::default(),
    };
    let floor_epoch = cfg.floor_epoch()?;

    // Phase 1: discover and load the input table
    info!("scanning input at {}", input.display());
    let shards = scanner::discover_inputs(input)?;
    let records = scanner::load_records(&shards)?;
    let person_count = records
        .iter()
        .map(|r| r.person_id.as_str())
        .collect::<std::collections::BTreeSet<_>>()
        .len();
    info!(
        "loaded {} records for {} persons from {} shard(s)",
        records.len(),
        person_count,
        shards.len()
    );

    // Phase 2: per-person sent-folder evidence
    let evidence = evidence::build_evidence(&records, &cfg)?;
    info!(
        "{} of {} persons have usable sent-folder evidence",
        evidence.len(),
        person_count
    );

    // Phase 3: filter, expand, apply overrides
    let sets = identity::build_identity_sets(&evidence, &cfg);
    let total_names: usize = sets.iter().map(|s| s.names.len()).sum();
    info!(
        "identity sets: {} persons, {} accepted names ({} manual override(s))",
        sets.len(),
        total_names,
        cfg.manual_name_overrides.len()
    );

    // Phase 4: invert into the global lookup. Must succeed before any
    // record is resolved.
    let index = identity::ReverseNameIndex::build(&sets)?;
    info!("reverse index: {} names", index.len());
    if index.is_empty() {
        warn!("reverse index is empty; every record will resolve to nothing");
    }

    // Phase 5: resolve every record
    let (resolved, stats) = resolve::resolve_records(&records, &index)?;
    let sender_total = stats.senders_resolved + stats.senders_unresolved;
    info!(
        "senders resolved: {} / {} ({:.1}%)",
        stats.senders_resolved,
        sender_total,
        100.0 * stats.senders_resolved as f64 / sender_total.max(1) as f64
    );
    info!(
        "recipient slots resolved: {} / {}",
        stats.recipients_resolved, stats.recipient_slots
    );
    info!(
        "token shapes: {} structured with comma, {} structured plain, {} address, {} bare",
        stats.structured_comma, stats.structured_plain, stats.address_tokens, stats.bare_tokens
    );

    // Phase 6: fold into per-person series
    let series = series::build_series(&resolved, floor_epoch, cfg.min_events_per_person);
    info!(
        "series retained: {} persons ({} resolved persons dropped below thresholds)",
        series.len(),
        sets.len().saturating_sub(series.len())
    );

    // Write artifacts
    fs::create_dir_all(output_dir)
        .with_context(|| format!("cannot create {}", output_dir.display()))?;
    info!("writing artifacts:");
    write_json(
        output_dir,
        "identities.json",
        &IdentitiesFile {
            index_size: index.len(),
            identities: sets,
            evidence,
        },
    )?;
    write_json(output_dir, "records.json", &resolved)?;
    write_json(output_dir, "series.json", &series)?;

    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════
//  ROSTER MODE: print the identity inventory
// ═══════════════════════════════════════════════════════════════════════

fn run_roster(output_dir: &Path) -> anyhow::Result<()> {
    let data: IdentitiesFile = read_json(output_dir, "identities.json")?;

    let sent_by_person: BTreeMap<&str, usize> = data
        .evidence
        .iter()
        .map(|e| (e.person_id.as_str(), e.sent_records))
        .collect();

    for set in &data.identities {
        let names: Vec<&str> = set.names.iter().map(String::as_str).collect();
        let sent = sent_by_person.get(set.person_id.as_str()).copied();
        match sent {
            Some(n) => println!(
                "{} [{} sent]: {}",
                set.person_id,
                n,
                names.join(" | ")
            ),
            None => println!("{} [override]: {}", set.person_id, names.join(" | ")),
        }
    }

    eprintln!(
        "\nTotal: {} persons, {} names in the reverse index",
        data.identities.len(),
        data.index_size
    );
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════
//  QUERY MODE: one person's series from cached output
// ═══════════════════════════════════════════════════════════════════════

fn run_query(person_id: &str, output_dir: &Path) -> anyhow::Result<()> {
    let series: BTreeMap<String, PersonSeries> = read_json(output_dir, "series.json")?;

    let Some(person) = series.get(person_id) else {
        eprintln!(
            "No series for {person_id} ({} persons retained; see `mail_resolve roster`)",
            series.len()
        );
        return Ok(());
    };

    #[derive(serde::Serialize)]
    struct QueryResult<'a> {
        person_id: &'a str,
        count: usize,
        timestamps: &'a [i64],
    }

    let json = serde_json::to_string_pretty(&QueryResult {
        person_id,
        count: person.count,
        timestamps: &person.timestamps,
    })?;
    println!("{json}");
    Ok(())
}
