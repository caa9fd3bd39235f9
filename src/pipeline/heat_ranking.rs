//! Pour ordering within a heat and sample-candidate markers

use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use crate::types::{PourRecord, SampleMarker};

const RECORDING_FORMATS: &[&str] = &[
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%d.%m.%y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d-%m-%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Parse a passport recording timestamp, day first.
pub fn parse_recording_start(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    RECORDING_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            ["%d.%m.%Y", "%d/%m/%Y", "%Y-%m-%d"].iter().find_map(|fmt| {
                chrono::NaiveDate::parse_from_str(text, fmt)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
        })
}

/// Assign `pour_order` within each heat and mark sample candidates.
///
/// Pours are ordered by recording start; pours without a parseable start
/// go last, in input order. The last pour of a heat is the probable sample.
/// Pours sharing the heat's lowest fill temperature are marked too when
/// that temperature is below `sample_temperature_max`.
pub fn rank_heats(records: &mut [PourRecord], sample_temperature_max: f64) {
    let mut heats: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, record) in records.iter().enumerate() {
        heats.entry(record.heat.clone()).or_default().push(i);
    }

    for members in heats.values_mut() {
        members.sort_by_key(|&i| {
            let start = records[i].recording_start.as_deref().and_then(parse_recording_start);
            (start.is_none(), start)
        });

        for (order, &i) in members.iter().enumerate() {
            records[i].pour_order = Some(order + 1);
            records[i].sample_markers.clear();
        }
        if let Some(&last) = members.last() {
            records[last].sample_markers.push(SampleMarker::ProbableSample);
        }

        let coolest = members
            .iter()
            .filter_map(|&i| records[i].fill_temperature)
            .reduce(f64::min);
        if let Some(coolest) = coolest.filter(|&t| t < sample_temperature_max) {
            for &i in members.iter() {
                if records[i].fill_temperature == Some(coolest) {
                    records[i].sample_markers.push(SampleMarker::MinFillTemperature);
                }
            }
        }
    }
}
