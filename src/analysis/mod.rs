//! Feature extraction over one segment or one whole stream
//!
//! Every function here is pure: row-aligned slices and a config section in,
//! a metric out. Ranges are addressed by Index value, never by position, so
//! the extractors stay correct on tables whose rows were filtered upstream.
//!
//! ## Modules
//!
//! - `segmentation`: cycles from the form delimiter channel
//! - `fill`: pour event detection (strict and continue-scan strategies)
//! - `holding`: holding bands, heating window, thermocouple holding
//! - `pressure`: first temperature change, pressure extrema
//! - `retraction`: form retraction and return temperatures
//! - `form_speed`: actuation speed modes and form status
//! - `leakage`: leak-rate ramps over form-closed pressure

pub mod fill;
pub mod form_speed;
pub mod holding;
pub mod leakage;
pub mod pressure;
pub mod retraction;
pub mod segmentation;
pub mod stats;

pub use fill::detect_fill;
pub use form_speed::classify_form_speed;
pub use holding::{
    full_holding_time, heating_minutes, heating_start, holding_and_pour_time, holding_band,
    segment_holding_time, thermocouple_holding_minutes, thermocouple_max, HoldingTimes,
    ThermocouplePairs,
};
pub use leakage::last_valid_leakage;
pub use pressure::{first_temperature_change, pressure_extrema, PressureExtrema};
pub use retraction::{find_retraction, return_temperatures};
pub use segmentation::segment_by_delimiter;
