//! Ordered carry-forward of the leak-rate estimate
//!
//! Each file may supersede the current estimate; every cycle record gets
//! the estimate current after its own file was observed. The tracker is a
//! plain accumulator threaded through the files of one installation, in
//! input order.

use tracing::info;

use crate::types::{CycleRecord, LeakageEstimate, LeakageMeasurement};

#[derive(Debug, Clone, Default)]
pub struct LeakageTracker {
    current: Option<LeakageEstimate>,
}

impl LeakageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in one file's measurement. `None` keeps the previous estimate.
    pub fn observe(&mut self, source: &str, measurement: Option<LeakageMeasurement>) {
        if let Some(m) = measurement {
            info!(source, rate = m.rate, offset = m.offset, "New leakage estimate");
            self.current = Some(LeakageEstimate::from_measurement(m, source));
        }
    }

    pub fn current(&self) -> Option<&LeakageEstimate> {
        self.current.as_ref()
    }

    /// Stamp the current estimate onto records (clearing it when there is none)
    pub fn attach(&self, records: &mut [CycleRecord]) {
        for record in records {
            record.leakage_offset = self.current.as_ref().map(|e| e.offset);
            record.leakage_rate = self.current.as_ref().map(|e| e.rate);
            record.leakage_source = self.current.as_ref().map(|e| e.source.clone());
        }
    }

    /// Forget the estimate, e.g. when moving to another installation
    pub fn reset(&mut self) {
        self.current = None;
    }
}
