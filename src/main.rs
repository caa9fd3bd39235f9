//! furnace-cycles - casting-cycle metrics from furnace sensor logs
//!
//! # Usage
//!
//! ```bash
//! # Segmented logs of one installation, in file order
//! furnace-cycles cycles --installation UVNK1 logs/*.csv > cycles.jsonl
//!
//! # Several installations; each folder name is an installation
//! furnace-cycles cycles UVNK1/*.csv UVNK2/*.csv > cycles.jsonl
//!
//! # Pour reports; <stem>.temperature.csv and <stem>.passport.csv are picked up
//! furnace-cycles pour --output pours.jsonl "H1234 03.04.2024"/*.csv
//!
//! # Effective configuration
//! furnace-cycles show-config
//! ```
//!
//! # Environment Variables
//!
//! - `FURNACE_CONFIG`: Path to the analysis config (after `--config`)
//! - `FURNACE_INSTALLATION`: Default installation name for `cycles`
//! - `RUST_LOG`: Logging level (default: info)

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use furnace_cycles::config::{self, defaults, AnalysisConfig};
use furnace_cycles::ingest::{heat_name, load_passport, load_table};
use furnace_cycles::pipeline::{
    group_by_installation, passport_or_stem, run_cycle_batch, run_installations, run_pour_batch, CycleSource,
    LoadFailure, PourSource,
};
use furnace_cycles::types::RunLogEntry;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "furnace-cycles")]
#[command(about = "Casting-cycle segmentation and metric extraction for furnace sensor logs")]
#[command(version)]
struct CliArgs {
    /// Analysis config file (TOML). Falls back to $FURNACE_CONFIG,
    /// ./furnace_config.toml, then built-in defaults.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Emit logs as JSON instead of plain text
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Segment furnace logs into cycles and report per-cycle metrics
    Cycles {
        /// Installation the files belong to (default: each file's folder name)
        #[arg(long, env = "FURNACE_INSTALLATION")]
        installation: Option<String>,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Log files, in recording order
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Report one record per pour file
    Pour {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Pour report sheets
        #[arg(required = true)]
        reports: Vec<PathBuf>,
    },

    /// Print the effective configuration as TOML
    ShowConfig,
}

// ============================================================================
// Input loading
// ============================================================================

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `<dir>/<stem>.<suffix>.csv` next to `path`
fn companion(path: &Path, suffix: &str) -> PathBuf {
    path.with_file_name(format!("{}.{suffix}.csv", file_stem(path)))
}

/// Name of the folder holding `path`, empty when there is none
fn folder_name(path: &Path) -> String {
    path.parent()
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_companion(path: &Path) -> bool {
    let name = path.file_name().map(|n| n.to_string_lossy().to_lowercase()).unwrap_or_default();
    [defaults::TEMPERATURE_SHEET_SUFFIX, defaults::PASSPORT_SHEET_SUFFIX]
        .iter()
        .any(|suffix| name.ends_with(&format!(".{suffix}.csv")))
}

fn optional_passport(path: &Path) -> Option<furnace_cycles::ingest::Passport> {
    let passport_path = companion(path, defaults::PASSPORT_SHEET_SUFFIX);
    if !passport_path.exists() {
        return None;
    }
    match load_passport(&passport_path) {
        Ok(passport) => Some(passport),
        Err(e) => {
            warn!(path = %passport_path.display(), error = %e, "Unreadable passport, ignoring");
            None
        }
    }
}

fn load_cycle_source(path: &Path) -> Result<CycleSource, LoadFailure> {
    let source = path.display().to_string();
    let table = load_table(path).map_err(|e| LoadFailure {
        source: source.clone(),
        error: e.to_string(),
    })?;
    let passport = passport_or_stem(optional_passport(path).as_ref(), &file_stem(path));
    Ok(CycleSource { source, table, passport })
}

fn load_pour_source(path: &Path) -> Result<PourSource, LoadFailure> {
    let source = path.display().to_string();
    let report = load_table(path).map_err(|e| LoadFailure {
        source: source.clone(),
        error: e.to_string(),
    })?;

    let temperature_path = companion(path, defaults::TEMPERATURE_SHEET_SUFFIX);
    let temperature = if temperature_path.exists() {
        match load_table(&temperature_path) {
            Ok(table) => Some(table),
            Err(e) => {
                warn!(path = %temperature_path.display(), error = %e, "Unreadable temperature sheet, ignoring");
                None
            }
        }
    } else {
        None
    };

    Ok(PourSource {
        source,
        heat: heat_name(&folder_name(path)),
        report,
        temperature,
        passport: optional_passport(path),
    })
}

fn input_files(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    paths
        .into_iter()
        .filter(|p| {
            let skip = is_companion(p);
            if skip {
                debug!(path = %p.display(), "Skipping companion sheet given as input");
            }
            !skip
        })
        .collect()
}

// ============================================================================
// Output
// ============================================================================

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Cannot create output file {}", p.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}

#[derive(Serialize)]
struct LogLine<'a> {
    run_log: &'a RunLogEntry,
}

/// Records, then the run log, one JSON object per line
fn write_json_lines<T: Serialize>(out: &mut dyn Write, records: &[T], log: &[RunLogEntry]) -> Result<()> {
    for record in records {
        serde_json::to_writer(&mut *out, record).context("Failed to serialize record")?;
        writeln!(out).context("Failed to write output")?;
    }
    for entry in log {
        serde_json::to_writer(&mut *out, &LogLine { run_log: entry }).context("Failed to serialize run log")?;
        writeln!(out).context("Failed to write output")?;
    }
    out.flush().context("Failed to flush output")
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(explicit: Option<&Path>) -> Result<AnalysisConfig> {
    match explicit {
        Some(path) => AnalysisConfig::load_from_file(path)
            .with_context(|| format!("Cannot load config {}", path.display())),
        None => Ok(AnalysisConfig::load(None)),
    }
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.log_json);

    config::init(load_config(args.config.as_deref())?);
    let cfg = config::get();

    match args.command {
        SubCommand::ShowConfig => {
            print!("{}", cfg.to_toml().context("Failed to render config")?);
        }

        SubCommand::Cycles {
            installation,
            output,
            files,
        } => {
            let files = input_files(files);
            info!(files = files.len(), installation = ?installation, "Running cycle pipeline");
            let inputs: Vec<_> = files.par_iter().map(|p| load_cycle_source(p)).collect();
            let run = match installation.as_deref() {
                Some(name) => run_cycle_batch(Some(name), &inputs, cfg),
                None => {
                    let installations =
                        group_by_installation(files.iter().map(|p| folder_name(p)).zip(inputs));
                    debug!(installations = installations.len(), "Grouped files by folder");
                    run_installations(&installations, cfg)
                }
            };

            let mut out = open_output(output.as_deref())?;
            write_json_lines(&mut *out, &run.records, &run.log)?;
            info!(records = run.records.len(), files = run.log.len(), "Cycle pipeline complete");
        }

        SubCommand::Pour { output, reports } => {
            let reports = input_files(reports);
            info!(reports = reports.len(), "Running pour pipeline");
            let inputs: Vec<_> = reports.par_iter().map(|p| load_pour_source(p)).collect();
            let run = run_pour_batch(&inputs, cfg);

            let mut out = open_output(output.as_deref())?;
            write_json_lines(&mut *out, &run.records, &run.log)?;
            info!(records = run.records.len(), files = run.log.len(), "Pour pipeline complete");
        }
    }

    Ok(())
}
