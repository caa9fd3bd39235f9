//! Processing pipelines
//!
//! ```text
//! cycle logs ──► segment ──► per-cycle metrics ──┐
//!        └────► leak-rate measurement ───────────┴─► ordered carry-forward ──► CycleRecord
//! pour sheets ─► fill / holding / vacuum ──► heat ranking ──► PourRecord
//! ```
//!
//! Per-file work is independent and parallel; anything that depends on file
//! order runs afterwards, sequentially.

mod batch;
mod cycle_report;
mod heat_ranking;
mod leakage_fold;
mod pour_report;

pub use batch::{
    group_by_installation, run_cycle_batch, run_installations, run_pour_batch, BatchOutput, CycleSource, LoadFailure,
};
pub use cycle_report::{build_cycle_records, passport_or_stem};
pub use heat_ranking::{parse_recording_start, rank_heats};
pub use leakage_fold::LeakageTracker;
pub use pour_report::{build_pour_record, summarize_passport, PourSource};
