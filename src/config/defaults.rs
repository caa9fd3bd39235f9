//! Process-wide default constants.
//!
//! Detection thresholds live in `AnalysisConfig`; these are the fixed values
//! around it.

// ============================================================================
// Config Discovery
// ============================================================================

/// Environment variable naming an analysis config file.
pub const CONFIG_ENV_VAR: &str = "FURNACE_CONFIG";

/// Config file picked up from the working directory.
pub const LOCAL_CONFIG_FILE: &str = "furnace_config.toml";

// ============================================================================
// Sampling
// ============================================================================

/// Seconds between consecutive log rows.
pub const SAMPLE_PERIOD_SECS: u64 = 5;

// ============================================================================
// Pour Report Layout
// ============================================================================

/// Suffix of the temperature sheet that sits next to a pour report.
pub const TEMPERATURE_SHEET_SUFFIX: &str = "temperature";

/// Suffix of the passport sheet that sits next to a pour report.
pub const PASSPORT_SHEET_SUFFIX: &str = "passport";

/// Passport key recorded when a cycle log has no passport sheet.
pub const PASSPORT_NUMBER_KEY: &str = "passport_number";
