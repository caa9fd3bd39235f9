//! furnace-cycles: casting-cycle analysis for vacuum furnace sensor logs
//!
//! Splits continuous 5-second sensor logs into casting cycles and derives
//! per-cycle engineering metrics.
//!
//! ## Architecture
//!
//! - **Types**: sample table over a 1-based Index axis, channel capability
//!   sets, metric records and run log entries
//! - **Config**: tunable thresholds, channel aliases and fill strategies
//! - **Analysis**: pure algorithms (segmentation, fill detection, holding
//!   time, pressure extrema, retraction, form-speed classification,
//!   leak-rate estimation)
//! - **Pipeline**: the cycle report (segmented logs) and the pour report
//!   (one pour per file), plus the ordered leakage carry-forward
//! - **Ingest**: delimited text, passports and heat names

pub mod analysis;
pub mod config;
pub mod ingest;
pub mod pipeline;
pub mod types;

// Re-export configuration
pub use config::{AnalysisConfig, ConfigError, FillStrategy};

// Re-export commonly used types
pub use types::{
    CycleRecord, FormSpeed, FormStatus, FurnaceKind, LeakageEstimate, LeakageMeasurement, PourRecord,
    RunLogEntry, RunStatus, SampleMarker, SampleTable, Segment, SkipReason, TableError,
};

// Re-export pipeline entry points
pub use pipeline::{
    build_cycle_records, build_pour_record, run_cycle_batch, run_installations, run_pour_batch, BatchOutput,
    CycleSource, LeakageTracker, LoadFailure, PourSource,
};
