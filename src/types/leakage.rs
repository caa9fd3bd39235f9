//! Leak-rate measurement types

use serde::{Deserialize, Serialize};

/// Rate computed from one candidate ramp
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeakageMeasurement {
    /// Samples between the two anchor points
    pub offset: usize,
    /// Pressure delta scaled by the chamber volume coefficient, per sample
    pub rate: f64,
}

/// The current leakage estimate together with the file that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeakageEstimate {
    pub offset: usize,
    pub rate: f64,
    pub source: String,
}

impl LeakageEstimate {
    pub fn from_measurement(measurement: LeakageMeasurement, source: impl Into<String>) -> Self {
        Self {
            offset: measurement.offset,
            rate: measurement.rate,
            source: source.into(),
        }
    }
}
