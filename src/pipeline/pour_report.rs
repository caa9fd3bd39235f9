//! Pour report builder
//!
//! One record per pour file. The report sheet carries the pyrometer and
//! the PT6 vacuum channel; the optional temperature sheet carries the
//! photo-pyrometer and the T2/T3/T4 thermocouples; the optional passport
//! identifies the furnace.

use std::collections::BTreeMap;

use tracing::debug;

use crate::analysis::{self, stats::finite_or_none, stats::nan_argmax, stats::nan_max};
use crate::config::{AnalysisConfig, PourConfig};
use crate::types::{
    FurnaceKind, PourChannels, PourRecord, SampleTable, Segment, SkipReason, TemperatureSheetChannels,
};

/// Everything read for one pour
#[derive(Debug, Clone)]
pub struct PourSource {
    pub source: String,
    pub heat: String,
    pub report: SampleTable,
    pub temperature: Option<SampleTable>,
    pub passport: Option<BTreeMap<String, String>>,
}

/// Furnace kind and the passport fields kept for it.
///
/// Recording start/end are always kept; leak-check fields only for the
/// standard furnace.
pub fn summarize_passport(
    passport: &BTreeMap<String, String>,
    cfg: &PourConfig,
) -> (FurnaceKind, BTreeMap<String, String>) {
    let kind = match passport.get(&cfg.volume_key) {
        Some(volume) if volume.trim() == cfg.large_furnace_volume => FurnaceKind::Large,
        _ => FurnaceKind::Standard,
    };

    let mut keys: Vec<&String> = vec![&cfg.recording_start_key, &cfg.recording_end_key];
    if kind == FurnaceKind::Standard {
        keys.extend(&cfg.leak_check_keys);
    }

    let kept = keys
        .into_iter()
        .filter_map(|k| passport.get(k).map(|v| (k.clone(), v.clone())))
        .collect();
    (kind, kept)
}

/// Build the record of one pour.
pub fn build_pour_record(input: &PourSource, config: &AnalysisConfig) -> Result<PourRecord, SkipReason> {
    let report = &input.report;
    if report.is_empty() {
        return Err(SkipReason::EmptyTable);
    }
    let period = config.sampling.period_secs;
    let index = report.index();

    let channels = PourChannels::bind(report, &config.channels)?;
    let first_change = analysis::first_temperature_change(
        index,
        channels.pyrometer,
        config.pour.temperature_change_threshold,
    )
    .ok_or(SkipReason::NoTemperatureChange)?;

    let fill = analysis::detect_fill(index, channels.pyrometer, &config.pour.fill);
    debug!(source = %input.source, fill = ?fill, "Fill detection");

    let mut fill_temperature = None;
    let mut full_holding_time = None;
    if let Some(fill) = fill {
        if let Some(peak) = nan_argmax(channels.pyrometer) {
            full_holding_time = analysis::full_holding_time(index[peak], fill, period);
        }
        fill_temperature = report
            .position_of(fill)
            .and_then(|pos| finite_or_none(channels.pyrometer[pos]));
    }

    let pressure_channel = channels.pressure(&config.channels)?;
    let pressure = fill
        .map(|fill| analysis::pressure_extrema(index, pressure_channel, Segment::new(first_change, fill)))
        .unwrap_or_default();

    let mut overheat_temperature = None;
    let mut holding = analysis::HoldingTimes::default();
    let mut companions = BTreeMap::new();
    if let Some(sheet) = &input.temperature {
        let sheet_channels = TemperatureSheetChannels::bind(sheet, &config.channels);
        if let Some(photo) = sheet_channels.photo_pyrometer {
            overheat_temperature = nan_max(photo);
            if let Some(max_value) = overheat_temperature {
                holding = analysis::holding_and_pour_time(
                    sheet.index(),
                    photo,
                    max_value,
                    fill,
                    &config.holding,
                    period,
                );
            }
        }
        if let Some(pos) = fill.and_then(|f| sheet.position_of(f)) {
            for (name, values) in &sheet_channels.companions {
                companions.insert(name.clone(), finite_or_none(values[pos]));
            }
        }
    }

    let (furnace, passport) = match &input.passport {
        Some(raw) => {
            let (kind, kept) = summarize_passport(raw, &config.pour);
            (Some(kind), kept)
        }
        None => (None, BTreeMap::new()),
    };
    let recording_start = passport.get(&config.pour.recording_start_key).cloned();

    Ok(PourRecord {
        heat: input.heat.clone(),
        source: input.source.clone(),
        furnace,
        overheat_temperature,
        fill_index: fill,
        fill_temperature,
        holding_time: holding.holding_time,
        time_to_pour: holding.time_to_pour,
        full_holding_time,
        min_pressure: pressure.min,
        max_pressure: pressure.max,
        companions,
        passport,
        recording_start,
        pour_order: None,
        sample_markers: Vec::new(),
    })
}
