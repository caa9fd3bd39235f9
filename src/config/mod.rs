//! Analysis Configuration Module
//!
//! Every detection threshold is loaded from TOML so plant engineers can tune
//! them without a rebuild.
//!
//! ## Loading Order
//!
//! 1. `--config` on the command line
//! 2. `FURNACE_CONFIG` environment variable (path to TOML file)
//! 3. `furnace_config.toml` in the current working directory
//! 4. Built-in defaults (the reference plant constants)
//!
//! ## Usage
//!
//! ```ignore
//! // In main():
//! config::init(AnalysisConfig::load(None));
//!
//! // Anywhere in the codebase:
//! let drop = config::get().cycle.fill.drop_threshold;
//! ```
//!
//! The analysis functions themselves take their section by reference, so
//! library callers and tests never need the global.

mod analysis_config;
pub mod defaults;
pub mod validation;

pub use analysis_config::*;

use std::sync::OnceLock;

/// Global analysis configuration, initialized once at startup.
static ANALYSIS_CONFIG: OnceLock<AnalysisConfig> = OnceLock::new();

/// Initialize the global analysis configuration.
///
/// Later calls are ignored with a warning.
pub fn init(config: AnalysisConfig) {
    if ANALYSIS_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// Get the global analysis configuration.
///
/// Falls back to built-in defaults when `init()` was never called.
pub fn get() -> &'static AnalysisConfig {
    ANALYSIS_CONFIG.get_or_init(AnalysisConfig::default)
}
