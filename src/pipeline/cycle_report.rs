//! Cycle report builder for segmented furnace logs
//!
//! One `CycleRecord` per form-active segment that yields both a fill event
//! and a heating start. Leakage fields are left empty here; the ordered
//! carry-forward pass fills them in.

use std::collections::BTreeMap;

use tracing::debug;

use crate::analysis::{
    self, stats::finite_or_none, stats::nan_max, ThermocouplePairs,
};
use crate::config::{defaults, AnalysisConfig};
use crate::types::{CycleChannels, CycleRecord, SampleTable, Segment, SkipReason};

/// Passport fields for a cycle log, or the file stem as passport number
pub fn passport_or_stem(passport: Option<&BTreeMap<String, String>>, stem: &str) -> BTreeMap<String, String> {
    match passport {
        Some(p) if !p.is_empty() => p.clone(),
        _ => BTreeMap::from([(defaults::PASSPORT_NUMBER_KEY.to_string(), stem.to_string())]),
    }
}

/// Build the cycle records of one table.
///
/// Fails with a `SkipReason` when the table cannot be analysed at all or no
/// segment produced a record; segments without a fill event are dropped.
pub fn build_cycle_records(
    table: &SampleTable,
    source: &str,
    installation: Option<&str>,
    passport: &BTreeMap<String, String>,
    config: &AnalysisConfig,
) -> Result<Vec<CycleRecord>, SkipReason> {
    if table.is_empty() {
        return Err(SkipReason::EmptyTable);
    }

    let channels = CycleChannels::bind(table, &config.channels)?;
    let segments = analysis::segment_by_delimiter(table.index(), channels.form);
    if segments.is_empty() {
        return Err(SkipReason::NoSegments);
    }

    let records: Vec<CycleRecord> = segments
        .iter()
        .filter_map(|&segment| {
            let record = cycle_record(table, &channels, segment, config);
            if record.is_none() {
                debug!(source, segment = %segment, "No fill event or heating start in segment");
            }
            record
        })
        .map(|mut record| {
            record.installation = installation.map(str::to_string);
            record.source = source.to_string();
            record.passport = passport.clone();
            record
        })
        .collect();

    if records.is_empty() {
        return Err(SkipReason::NoValidSegments);
    }
    Ok(records)
}

/// Metrics of one segment, or `None` without a fill or heating start
fn cycle_record(
    table: &SampleTable,
    channels: &CycleChannels<'_>,
    segment: Segment,
    config: &AnalysisConfig,
) -> Option<CycleRecord> {
    let period = config.sampling.period_secs;
    let span = table.span(segment.start, segment.end);
    let index = &table.index()[span.clone()];
    let pyrometer = &channels.pyrometer[span.clone()];
    let form = &channels.form[span.clone()];
    let pairs = ThermocouplePairs {
        left_d: &channels.left_d[span.clone()],
        right_d: &channels.right_d[span.clone()],
        left_t: &channels.left_t[span.clone()],
        right_t: &channels.right_t[span.clone()],
    };

    let fill = analysis::detect_fill(index, pyrometer, &config.cycle.fill)?;
    let heating_start = analysis::heating_start(index, pyrometer)?;
    let fill_position = table.position_of(fill)?;

    let pressure = analysis::pressure_extrema(
        index,
        &channels.pressure[span.clone()],
        Segment::new(heating_start, fill),
    );

    // Holding window runs from the segment start to the fill, inclusive
    let upto_fill = index.partition_point(|&i| i <= fill);
    let holding_pairs = ThermocouplePairs {
        left_d: &pairs.left_d[..upto_fill],
        right_d: &pairs.right_d[..upto_fill],
        left_t: &pairs.left_t[..upto_fill],
        right_t: &pairs.right_t[..upto_fill],
    };

    Some(CycleRecord {
        installation: None,
        source: String::new(),
        segment_start: segment.start,
        segment_end: segment.end,
        fill_index: fill,
        fill_temperature: finite_or_none(channels.pyrometer[fill_position]),
        heating_start,
        heating_minutes: analysis::heating_minutes(heating_start, fill, period),
        min_pressure: pressure.min,
        max_pressure: pressure.max,
        ppf_holding_minutes: analysis::thermocouple_holding_minutes(
            holding_pairs,
            config.holding.thermocouple_threshold,
            period,
        ),
        holding_time: analysis::segment_holding_time(pyrometer, &config.holding, period),
        max_temperature: nan_max(pyrometer),
        thermocouple_max: channels
            .thermocouple
            .and_then(|tp| analysis::thermocouple_max(&tp[span], config.holding.thermocouple_max_valid)),
        returning: analysis::return_temperatures(index, form, pairs, config.retraction.window),
        form_speed: analysis::classify_form_speed(form, &config.form_speed),
        max_form_position: nan_max(form),
        leakage_offset: None,
        leakage_rate: None,
        leakage_source: None,
        passport: BTreeMap::new(),
        fill_row: table.row(fill_position),
    })
}
