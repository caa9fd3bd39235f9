//! Shared data structures for casting-cycle analysis
//!
//! - `SampleTable`: the Index axis plus named channels (input)
//! - `Segment`: one process cycle over the Index axis
//! - `CycleChannels` / `PourChannels`: channel capability sets bound once per table
//! - `CycleRecord` / `PourRecord`: per-cycle and per-pour metric records (output)
//! - `LeakageEstimate`: the carried-forward leak-rate measurement
//! - `RunLogEntry`: per-file outcome of a run

mod channels;
mod leakage;
mod record;
mod run_log;
mod segment;
mod table;

pub use channels::*;
pub use leakage::*;
pub use record::*;
pub use run_log::*;
pub use segment::*;
pub use table::*;
