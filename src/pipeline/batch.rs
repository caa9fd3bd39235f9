//! Batch runners
//!
//! Per-file extraction is independent and runs on the rayon pool. The
//! leakage carry-forward is then folded sequentially in input order, so
//! the output does not depend on scheduling.

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::{info, warn};

use super::cycle_report::build_cycle_records;
use super::heat_ranking::rank_heats;
use super::leakage_fold::LeakageTracker;
use super::pour_report::{build_pour_record, PourSource};
use crate::analysis::last_valid_leakage;
use crate::config::AnalysisConfig;
use crate::types::{
    CycleRecord, LeakageChannels, LeakageMeasurement, PourRecord, RunLogEntry, SampleTable, SkipReason,
};

/// One loaded cycle log
#[derive(Debug, Clone)]
pub struct CycleSource {
    pub source: String,
    pub table: SampleTable,
    pub passport: BTreeMap<String, String>,
}

/// A file that could not be loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub source: String,
    pub error: String,
}

/// Records and run log of one batch
#[derive(Debug, Clone)]
pub struct BatchOutput<R> {
    pub records: Vec<R>,
    pub log: Vec<RunLogEntry>,
}

impl<R> Default for BatchOutput<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            log: Vec::new(),
        }
    }
}

/// Per-file result before the carry-forward fold
struct CycleExtraction {
    source: String,
    leakage: Option<LeakageMeasurement>,
    outcome: Result<Vec<CycleRecord>, SkipReason>,
}

fn extract_cycles(input: &CycleSource, installation: Option<&str>, config: &AnalysisConfig) -> CycleExtraction {
    let leakage = LeakageChannels::bind(&input.table, &config.channels)
        .ok()
        .and_then(|ch| last_valid_leakage(ch.pressure, ch.form, &config.leakage));
    CycleExtraction {
        source: input.source.clone(),
        leakage,
        outcome: build_cycle_records(&input.table, &input.source, installation, &input.passport, config),
    }
}

/// Run the cycle pipeline over the files of one installation, in order.
pub fn run_cycle_batch(
    installation: Option<&str>,
    inputs: &[Result<CycleSource, LoadFailure>],
    config: &AnalysisConfig,
) -> BatchOutput<CycleRecord> {
    let extracted: Vec<Result<CycleExtraction, &LoadFailure>> = inputs
        .par_iter()
        .map(|input| match input {
            Ok(source) => Ok(extract_cycles(source, installation, config)),
            Err(failure) => Err(failure),
        })
        .collect();

    let mut tracker = LeakageTracker::new();
    let mut output = BatchOutput::default();

    for item in extracted {
        let file = match item {
            Ok(file) => file,
            Err(failure) => {
                warn!(source = %failure.source, error = %failure.error, "Failed to load file");
                output
                    .log
                    .push(RunLogEntry::failed(installation, &failure.source, failure.error.clone()));
                continue;
            }
        };

        tracker.observe(&file.source, file.leakage);
        match file.outcome {
            Ok(mut records) => {
                tracker.attach(&mut records);
                info!(source = %file.source, records = records.len(), "Processed cycle log");
                output.log.push(RunLogEntry::success(
                    installation,
                    &file.source,
                    format!("{} segments processed", records.len()),
                ));
                output.records.extend(records);
            }
            Err(reason) => {
                warn!(source = %file.source, reason = %reason, "Skipped cycle log");
                output.log.push(RunLogEntry::skipped(installation, &file.source, &reason));
            }
        }
    }

    output
}

/// Group items under their installation name.
///
/// Installations keep the order in which they are first seen and items keep
/// their input order inside each group.
pub fn group_by_installation<T>(items: impl IntoIterator<Item = (String, T)>) -> Vec<(String, Vec<T>)> {
    let mut groups: Vec<(String, Vec<T>)> = Vec::new();
    for (name, item) in items {
        match groups.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, members)) => members.push(item),
            None => groups.push((name, vec![item])),
        }
    }
    groups
}

/// Run the cycle pipeline per installation. The leakage estimate never
/// crosses an installation boundary. An empty name leaves the
/// installation unset on records and log entries.
pub fn run_installations(
    installations: &[(String, Vec<Result<CycleSource, LoadFailure>>)],
    config: &AnalysisConfig,
) -> BatchOutput<CycleRecord> {
    let mut output = BatchOutput::default();
    for (name, inputs) in installations {
        info!(installation = %name, files = inputs.len(), "Processing installation");
        let installation = (!name.is_empty()).then_some(name.as_str());
        let batch = run_cycle_batch(installation, inputs, config);
        output.records.extend(batch.records);
        output.log.extend(batch.log);
    }
    output
}

/// Run the pour pipeline and rank the pours of each heat.
pub fn run_pour_batch(
    inputs: &[Result<PourSource, LoadFailure>],
    config: &AnalysisConfig,
) -> BatchOutput<PourRecord> {
    let extracted: Vec<Result<Result<PourRecord, SkipReason>, &LoadFailure>> = inputs
        .par_iter()
        .map(|input| input.as_ref().map(|source| build_pour_record(source, config)))
        .collect();

    let mut output = BatchOutput::default();
    for (input, item) in inputs.iter().zip(extracted) {
        match item {
            Err(failure) => {
                warn!(source = %failure.source, error = %failure.error, "Failed to load pour");
                output.log.push(RunLogEntry::failed(None, &failure.source, failure.error.clone()));
            }
            Ok(Err(reason)) => {
                let source = input.as_ref().map_or("", |s| s.source.as_str());
                warn!(source, reason = %reason, "Skipped pour");
                output.log.push(RunLogEntry::skipped(None, source, &reason));
            }
            Ok(Ok(record)) => {
                info!(source = %record.source, fill = ?record.fill_index, "Processed pour");
                output.log.push(RunLogEntry::success(None, &record.source, "pour processed"));
                output.records.push(record);
            }
        }
    }

    rank_heats(&mut output.records, config.pour.sample_temperature_max);
    output
}
