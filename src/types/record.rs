//! Metric records emitted by the pipelines
//!
//! Field names are the stable output keys; `None` serializes as `null`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Actuation status of the form (mould block) during a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FormStatus {
    #[default]
    #[serde(rename = "Form_OK")]
    Ok,
    #[serde(rename = "Form_Error")]
    Error,
}

impl std::fmt::Display for FormStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormStatus::Ok => write!(f, "Form_OK"),
            FormStatus::Error => write!(f, "Form_Error"),
        }
    }
}

/// Dominant actuation speeds of one cycle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FormSpeed {
    pub speed_form_1: Option<f64>,
    pub speed_form_2: Option<f64>,
    pub form_status: FormStatus,
}

/// Companion D/T readings at the moment the form starts retracting
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ReturnTemperatures {
    pub return_dl: Option<f64>,
    pub return_dr: Option<f64>,
    pub return_tl: Option<f64>,
    pub return_tr: Option<f64>,
}

/// One record per cycle that produced a fill event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleRecord {
    pub installation: Option<String>,
    pub source: String,
    pub segment_start: u64,
    pub segment_end: u64,
    pub fill_index: u64,
    pub fill_temperature: Option<f64>,
    /// First Index where the pyrometer moves within the cycle
    pub heating_start: u64,
    pub heating_minutes: f64,
    pub min_pressure: Option<f64>,
    pub max_pressure: Option<f64>,
    /// Minutes in the holding window with paired D/T readings above threshold
    pub ppf_holding_minutes: f64,
    /// Seconds spent near the cycle's peak pyrometer reading
    pub holding_time: u64,
    pub max_temperature: Option<f64>,
    pub thermocouple_max: Option<f64>,
    #[serde(flatten)]
    pub returning: ReturnTemperatures,
    #[serde(flatten)]
    pub form_speed: FormSpeed,
    pub max_form_position: Option<f64>,
    pub leakage_offset: Option<usize>,
    pub leakage_rate: Option<f64>,
    pub leakage_source: Option<String>,
    pub passport: BTreeMap<String, String>,
    pub fill_row: BTreeMap<String, Option<f64>>,
}

/// Furnace model, derived from the passport chamber volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FurnaceKind {
    #[serde(rename = "UPPF-U")]
    Large,
    #[serde(rename = "UPPF-50")]
    Standard,
}

/// Markers attached to pours that are likely test samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleMarker {
    /// Last pour of its heat
    ProbableSample,
    /// Coolest fill of its heat, below the sample threshold
    MinFillTemperature,
}

/// One record per pour file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PourRecord {
    pub heat: String,
    pub source: String,
    pub furnace: Option<FurnaceKind>,
    /// Peak photo-pyrometer reading of the temperature sheet
    pub overheat_temperature: Option<f64>,
    pub fill_index: Option<u64>,
    pub fill_temperature: Option<f64>,
    /// Seconds in the band below the overheat peak
    pub holding_time: Option<u64>,
    /// Seconds from the last in-band sample to the fill
    pub time_to_pour: Option<u64>,
    /// Seconds from the pyrometer peak to the fill
    pub full_holding_time: Option<u64>,
    /// PT6 extrema between the first temperature change and the fill
    pub min_pressure: Option<f64>,
    pub max_pressure: Option<f64>,
    pub companions: BTreeMap<String, Option<f64>>,
    pub passport: BTreeMap<String, String>,
    pub recording_start: Option<String>,
    pub pour_order: Option<usize>,
    pub sample_markers: Vec<SampleMarker>,
}
