//! Analysis Configuration - every detection constant as a tunable TOML value
//!
//! Each struct implements `Default` with the plant's reference constants, so
//! running without a config file reproduces the reference behaviour.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for one analysis run.
///
/// Load with `AnalysisConfig::load()` which searches:
/// 1. An explicit path (CLI `--config`)
/// 2. `$FURNACE_CONFIG` env var
/// 3. `./furnace_config.toml`
/// 4. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub sampling: SamplingConfig,

    /// Header aliases for each logical channel
    #[serde(default)]
    pub channels: ChannelAliases,

    /// Segmented furnace logs
    #[serde(default)]
    pub cycle: CycleConfig,

    /// Whole-file pour reports
    #[serde(default)]
    pub pour: PourConfig,

    #[serde(default)]
    pub holding: HoldingConfig,

    #[serde(default)]
    pub retraction: RetractionConfig,

    #[serde(default)]
    pub form_speed: FormSpeedConfig,

    #[serde(default)]
    pub leakage: LeakageConfig,
}

impl AnalysisConfig {
    /// Load configuration using the standard search order.
    pub fn load(explicit: Option<&Path>) -> Self {
        if let Some(path) = explicit {
            match Self::load_from_file(path) {
                Ok(config) => {
                    info!(path = %path.display(), "Loaded analysis config");
                    return config;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to load config, falling back");
                }
            }
        }

        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded analysis config from FURNACE_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from FURNACE_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "FURNACE_CONFIG points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from(defaults::LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded analysis config from ./furnace_config.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./furnace_config.toml, using defaults");
                }
            }
        }

        info!("No furnace_config.toml found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document. Unknown keys only warn.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Analysis config saved");
        Ok(())
    }

    /// Validate all parameters for internal consistency.
    ///
    /// Rules:
    /// - Ranges must be ordered (min <= max, low < high)
    /// - Windows and bin counts must be > 0; the median window must be odd
    /// - Divisors and scales must be positive
    /// - Every value must be finite
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if self.sampling.period_secs == 0 {
            errors.push("sampling.period_secs must be > 0".to_string());
        }

        for (name, fill) in [("cycle.fill", &self.cycle.fill), ("pour.fill", &self.pour.fill)] {
            Self::check_positive(fill.drop_threshold, &format!("{name}.drop_threshold"), &mut errors);
            Self::check_ordered(fill.valid_min, fill.valid_max, &format!("{name}.valid"), &mut errors);
            if fill.dip_window == 0 {
                errors.push(format!("{name}.dip_window must be > 0"));
            }
        }

        let h = &self.holding;
        Self::check_positive(h.band_width, "holding.band_width", &mut errors);
        Self::check_ordered(h.high_floor, h.high_cutoff, "holding.high_floor/high_cutoff", &mut errors);

        if self.retraction.window < 2 {
            errors.push("retraction.window must be >= 2".to_string());
        }

        let fs = &self.form_speed;
        if fs.median_window == 0 || fs.median_window % 2 == 0 {
            errors.push(format!(
                "form_speed.median_window ({}) must be odd and > 0",
                fs.median_window
            ));
        }
        Self::check_positive(fs.bin_tolerance, "form_speed.bin_tolerance", &mut errors);
        Self::check_positive(fs.match_tolerance, "form_speed.match_tolerance", &mut errors);
        if !(0.0..=1.0).contains(&fs.min_match_ratio) {
            errors.push(format!(
                "form_speed.min_match_ratio ({:.2}) must be within [0, 1]",
                fs.min_match_ratio
            ));
        }

        let l = &self.leakage;
        Self::check_positive(l.pressure_scale, "leakage.pressure_scale", &mut errors);
        Self::check_positive(l.volume_coefficient, "leakage.volume_coefficient", &mut errors);
        if l.histogram_bins == 0 {
            errors.push("leakage.histogram_bins must be > 0".to_string());
        }
        if l.growth_band_low >= l.growth_band_high {
            errors.push(format!(
                "leakage.growth_band_low ({}) must be < growth_band_high ({})",
                l.growth_band_low, l.growth_band_high
            ));
        }
        if l.target_offset == 0 {
            errors.push("leakage.target_offset must be > 0".to_string());
        }

        let (range_errors, range_warnings) = super::validation::validate_physical_ranges(self);
        errors.extend(range_errors);
        for w in &range_warnings {
            warn!("{}", w);
        }

        // Reject NaN/Inf anywhere (sweep all f64 fields via the value tree)
        if let Ok(tree) = toml::Value::try_from(self) {
            for key in super::validation::non_finite_keys(&tree, "") {
                errors.push(format!("{key} must be a finite number"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_positive(value: f64, name: &str, errors: &mut Vec<String>) {
        if !value.is_finite() || value <= 0.0 {
            errors.push(format!("{name} must be a finite value > 0 (got {value})"));
        }
    }

    fn check_ordered(min: f64, max: f64, name: &str, errors: &mut Vec<String>) {
        // NaN/Inf comparisons silently pass, catch them explicitly
        if !min.is_finite() || !max.is_finite() {
            errors.push(format!("{name}: values must be finite (got min={min}, max={max})"));
            return;
        }
        if max < min {
            errors.push(format!("{name}: max ({max:.3}) must be >= min ({min:.3})"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Sampling
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Seconds between consecutive rows
    #[serde(default = "default_period_secs")]
    pub period_secs: u64,
}

fn default_period_secs() -> u64 {
    defaults::SAMPLE_PERIOD_SECS
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            period_secs: default_period_secs(),
        }
    }
}

// ============================================================================
// Channel Aliases
// ============================================================================

/// Header names accepted for each logical channel, tried in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelAliases {
    #[serde(default = "default_pyrometer")]
    pub pyrometer: Vec<String>,
    #[serde(default = "default_pressure")]
    pub pressure: Vec<String>,
    #[serde(default = "default_form")]
    pub form: Vec<String>,
    #[serde(default = "default_left_d")]
    pub left_d: Vec<String>,
    #[serde(default = "default_right_d")]
    pub right_d: Vec<String>,
    #[serde(default = "default_left_t")]
    pub left_t: Vec<String>,
    #[serde(default = "default_right_t")]
    pub right_t: Vec<String>,
    #[serde(default = "default_thermocouple")]
    pub thermocouple: Vec<String>,
    #[serde(default = "default_pour_pyrometer")]
    pub pour_pyrometer: Vec<String>,
    #[serde(default = "default_pour_pressure")]
    pub pour_pressure: Vec<String>,
    #[serde(default = "default_photo_pyrometer")]
    pub photo_pyrometer: Vec<String>,
    /// Temperature-sheet channels read at the fill Index
    #[serde(default = "default_companions")]
    pub companions: Vec<String>,
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}

fn default_pyrometer() -> Vec<String> {
    owned(&["Piro"])
}
fn default_pressure() -> Vec<String> {
    owned(&["BP2"])
}
fn default_form() -> Vec<String> {
    owned(&["Form"])
}
fn default_left_d() -> Vec<String> {
    owned(&["DL"])
}
fn default_right_d() -> Vec<String> {
    owned(&["DR"])
}
fn default_left_t() -> Vec<String> {
    owned(&["TL"])
}
fn default_right_t() -> Vec<String> {
    owned(&["TR"])
}
fn default_thermocouple() -> Vec<String> {
    owned(&["TP"])
}
fn default_pour_pyrometer() -> Vec<String> {
    owned(&["ПИРОМЕТР", "PYROMETER"])
}
fn default_pour_pressure() -> Vec<String> {
    owned(&["PT6"])
}
fn default_photo_pyrometer() -> Vec<String> {
    owned(&["ФОТОПИРОМЕТР", "PHOTOPYROMETER"])
}
fn default_companions() -> Vec<String> {
    owned(&["ТППФ ВЕРХ (Т2)", "ТППФ НИЗ (Т3)", "ТППФ СР (Т4)"])
}

impl Default for ChannelAliases {
    fn default() -> Self {
        Self {
            pyrometer: default_pyrometer(),
            pressure: default_pressure(),
            form: default_form(),
            left_d: default_left_d(),
            right_d: default_right_d(),
            left_t: default_left_t(),
            right_t: default_right_t(),
            thermocouple: default_thermocouple(),
            pour_pyrometer: default_pour_pyrometer(),
            pour_pressure: default_pour_pressure(),
            photo_pyrometer: default_photo_pyrometer(),
            companions: default_companions(),
        }
    }
}

// ============================================================================
// Fill Detection
// ============================================================================

/// What to do when the first drop-and-dip candidate fails range validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillStrategy {
    /// Report "not found" immediately
    Strict,
    /// Keep scanning for a later candidate
    ContinueScan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillThresholds {
    #[serde(default = "default_fill_strategy")]
    pub strategy: FillStrategy,
    /// Minimum |next - current| that starts a candidate (°C)
    #[serde(default = "default_drop_threshold")]
    pub drop_threshold: f64,
    /// A sample below this must appear in the dip window (°C)
    #[serde(default = "default_dip_threshold")]
    pub dip_threshold: f64,
    /// Samples inspected from the candidate onward, candidate included
    #[serde(default = "default_dip_window")]
    pub dip_window: usize,
    #[serde(default = "default_valid_min")]
    pub valid_min: f64,
    #[serde(default = "default_valid_max")]
    pub valid_max: f64,
}

fn default_fill_strategy() -> FillStrategy {
    FillStrategy::Strict
}
fn default_drop_threshold() -> f64 {
    35.0
}
fn default_dip_threshold() -> f64 {
    1200.0
}
fn default_dip_window() -> usize {
    6
}
fn default_valid_min() -> f64 {
    1350.0
}
fn default_valid_max() -> f64 {
    1700.0
}

impl FillThresholds {
    pub fn with_strategy(strategy: FillStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }
}

impl Default for FillThresholds {
    fn default() -> Self {
        Self {
            strategy: default_fill_strategy(),
            drop_threshold: default_drop_threshold(),
            dip_threshold: default_dip_threshold(),
            dip_window: default_dip_window(),
            valid_min: default_valid_min(),
            valid_max: default_valid_max(),
        }
    }
}

// ============================================================================
// Pipelines
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleConfig {
    #[serde(default = "default_cycle_fill")]
    pub fill: FillThresholds,
}

fn default_cycle_fill() -> FillThresholds {
    FillThresholds::with_strategy(FillStrategy::ContinueScan)
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            fill: default_cycle_fill(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PourConfig {
    #[serde(default)]
    pub fill: FillThresholds,
    /// Delta that marks the start of heating (°C)
    #[serde(default = "default_temperature_change_threshold")]
    pub temperature_change_threshold: f64,
    /// Fill temperatures below this mark a pour as a sample candidate (°C)
    #[serde(default = "default_sample_temperature_max")]
    pub sample_temperature_max: f64,
    #[serde(default = "default_volume_key")]
    pub volume_key: String,
    /// Chamber volume value identifying the large furnace
    #[serde(default = "default_large_furnace_volume")]
    pub large_furnace_volume: String,
    #[serde(default = "default_recording_start_key")]
    pub recording_start_key: String,
    #[serde(default = "default_recording_end_key")]
    pub recording_end_key: String,
    /// Passport fields kept for the standard furnace only
    #[serde(default = "default_leak_check_keys")]
    pub leak_check_keys: Vec<String>,
}

fn default_temperature_change_threshold() -> f64 {
    1.0
}
fn default_sample_temperature_max() -> f64 {
    1500.0
}
fn default_volume_key() -> String {
    "ОБЪЕМ КАМЕРЫ:".to_string()
}
fn default_large_furnace_volume() -> String {
    "3700(Liter)".to_string()
}
fn default_recording_start_key() -> String {
    "НАЧАЛО ЗАПИСИ:".to_string()
}
fn default_recording_end_key() -> String {
    "ЗАВЕРШЕНИЕ ЗАПИСИ:".to_string()
}
fn default_leak_check_keys() -> Vec<String> {
    owned(&[
        "ДАТА ПРОВЕРКИ НАТЕКАНИЯ:",
        "ВАКУУМ В НАЧАЛЕ ИЗМЕРЕНИЯ:",
        "ВАКУУМ В КОНЦЕ ИЗМЕРЕНИЯ:",
        "ВРЕМЯ ИЗМЕРЕНИЯ:",
        "ОБЪЕМ КАМЕРЫ:",
        "УРОВЕНЬ НАТЕКАНИЯ:",
        "МИН. ВАКУУМ ВО ВРЕМЯ ПРОВЕРКИ:",
        "МИН. ВАКУУМ ПЕРЕД ПРОВЕРКОЙ:",
    ])
}

impl Default for PourConfig {
    fn default() -> Self {
        Self {
            fill: FillThresholds::default(),
            temperature_change_threshold: default_temperature_change_threshold(),
            sample_temperature_max: default_sample_temperature_max(),
            volume_key: default_volume_key(),
            large_furnace_volume: default_large_furnace_volume(),
            recording_start_key: default_recording_start_key(),
            recording_end_key: default_recording_end_key(),
            leak_check_keys: default_leak_check_keys(),
        }
    }
}

// ============================================================================
// Holding / Temperature Aggregation
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingConfig {
    /// Band width below the peak when the peak is not above `high_cutoff` (°C)
    #[serde(default = "default_band_width")]
    pub band_width: f64,
    /// Peaks above this use the fixed floor `high_floor` (°C)
    #[serde(default = "default_high_cutoff")]
    pub high_cutoff: f64,
    #[serde(default = "default_high_floor")]
    pub high_floor: f64,
    /// Cutoff and floor of the within-segment variant (°C)
    #[serde(default = "default_segment_high_cutoff")]
    pub segment_high_cutoff: f64,
    /// Paired D/T readings above this count as holding (°C)
    #[serde(default = "default_thermocouple_threshold")]
    pub thermocouple_threshold: f64,
    /// TP readings above this are sensor faults (°C)
    #[serde(default = "default_thermocouple_max_valid")]
    pub thermocouple_max_valid: f64,
}

fn default_band_width() -> f64 {
    20.0
}
fn default_high_cutoff() -> f64 {
    1620.0
}
fn default_high_floor() -> f64 {
    1600.0
}
fn default_segment_high_cutoff() -> f64 {
    1600.0
}
fn default_thermocouple_threshold() -> f64 {
    1500.0
}
fn default_thermocouple_max_valid() -> f64 {
    1700.0
}

impl Default for HoldingConfig {
    fn default() -> Self {
        Self {
            band_width: default_band_width(),
            high_cutoff: default_high_cutoff(),
            high_floor: default_high_floor(),
            segment_high_cutoff: default_segment_high_cutoff(),
            thermocouple_threshold: default_thermocouple_threshold(),
            thermocouple_max_valid: default_thermocouple_max_valid(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetractionConfig {
    /// Strictly decreasing form samples required, the first one included
    #[serde(default = "default_retraction_window")]
    pub window: usize,
}

fn default_retraction_window() -> usize {
    5
}

impl Default for RetractionConfig {
    fn default() -> Self {
        Self {
            window: default_retraction_window(),
        }
    }
}

// ============================================================================
// Form Speed Classifier
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSpeedConfig {
    /// Converts a per-sample difference into an hourly rate (3600 / 5 / 60)
    #[serde(default = "default_rate_scale")]
    pub rate_scale: f64,
    #[serde(default = "default_median_window")]
    pub median_window: usize,
    /// Filtered values blanked at each end
    #[serde(default = "default_edge_trim")]
    pub edge_trim: usize,
    #[serde(default = "default_bin_tolerance")]
    pub bin_tolerance: f64,
    /// Raw speed must be within this of the filtered speed to match
    #[serde(default = "default_match_tolerance")]
    pub match_tolerance: f64,
    #[serde(default = "default_min_match_ratio")]
    pub min_match_ratio: f64,
}

fn default_rate_scale() -> f64 {
    12.0
}
fn default_median_window() -> usize {
    5
}
fn default_edge_trim() -> usize {
    2
}
fn default_bin_tolerance() -> f64 {
    0.1
}
fn default_match_tolerance() -> f64 {
    0.2
}
fn default_min_match_ratio() -> f64 {
    0.8
}

impl Default for FormSpeedConfig {
    fn default() -> Self {
        Self {
            rate_scale: default_rate_scale(),
            median_window: default_median_window(),
            edge_trim: default_edge_trim(),
            bin_tolerance: default_bin_tolerance(),
            match_tolerance: default_match_tolerance(),
            min_match_ratio: default_min_match_ratio(),
        }
    }
}

// ============================================================================
// Leak-Rate Estimator
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeakageConfig {
    /// Raw pressure multiplier before any threshold applies
    #[serde(default = "default_pressure_scale")]
    pub pressure_scale: f64,
    /// Scaled readings above this are excluded
    #[serde(default = "default_pressure_cap")]
    pub pressure_cap: f64,
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
    /// Half-width of the band around the stable value
    #[serde(default = "default_stable_tolerance")]
    pub stable_tolerance: f64,
    /// Per-sample growth band `[low, high)` expected of a leak ramp
    #[serde(default = "default_growth_band_low")]
    pub growth_band_low: f64,
    #[serde(default = "default_growth_band_high")]
    pub growth_band_high: f64,
    /// Samples added on each side of an accepted ramp
    #[serde(default = "default_widen")]
    pub widen: usize,
    /// Measurement length in samples (10 minutes)
    #[serde(default = "default_target_offset")]
    pub target_offset: usize,
    /// Samples skipped after the minimum (1 minute)
    #[serde(default = "default_stabilization_skip")]
    pub stabilization_skip: usize,
    /// Chamber litres per sample tick (4100 / 5)
    #[serde(default = "default_volume_coefficient")]
    pub volume_coefficient: f64,
    #[serde(default = "default_min_valid_offset")]
    pub min_valid_offset: usize,
    /// Ramps shorter than this are not measured
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
}

fn default_pressure_scale() -> f64 {
    1000.0
}
fn default_pressure_cap() -> f64 {
    60.0
}
fn default_histogram_bins() -> usize {
    100
}
fn default_stable_tolerance() -> f64 {
    2.0
}
fn default_growth_band_low() -> f64 {
    0.045
}
fn default_growth_band_high() -> f64 {
    0.2
}
fn default_widen() -> usize {
    5
}
fn default_target_offset() -> usize {
    120
}
fn default_stabilization_skip() -> usize {
    12
}
fn default_volume_coefficient() -> f64 {
    820.0
}
fn default_min_valid_offset() -> usize {
    100
}
fn default_min_samples() -> usize {
    5
}

impl Default for LeakageConfig {
    fn default() -> Self {
        Self {
            pressure_scale: default_pressure_scale(),
            pressure_cap: default_pressure_cap(),
            histogram_bins: default_histogram_bins(),
            stable_tolerance: default_stable_tolerance(),
            growth_band_low: default_growth_band_low(),
            growth_band_high: default_growth_band_high(),
            widen: default_widen(),
            target_offset: default_target_offset(),
            stabilization_skip: default_stabilization_skip(),
            volume_coefficient: default_volume_coefficient(),
            min_valid_offset: default_min_valid_offset(),
            min_samples: default_min_samples(),
        }
    }
}
