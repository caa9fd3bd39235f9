//! Config validation: unknown-key detection with Levenshtein suggestions
//! and physical range checks.
//!
//! Two-pass parse: the raw TOML is first read as a `toml::Value`, its key
//! tree is compared against the known field names, and typos produce
//! "did you mean?" warnings. Serde deserialization follows. Warnings never
//! reject a config.

use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, ", did you mean '{s}'?")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

const FILL_FIELDS: &[&str] = &[
    "strategy",
    "drop_threshold",
    "dip_threshold",
    "dip_window",
    "valid_min",
    "valid_max",
];

/// Returns the complete set of valid dotted key paths for `AnalysisConfig`.
///
/// Kept by hand in step with analysis_config.rs.
pub fn known_config_keys() -> HashSet<String> {
    let sections: &[(&str, &[&str])] = &[
        ("sampling", &["period_secs"]),
        (
            "channels",
            &[
                "pyrometer",
                "pressure",
                "form",
                "left_d",
                "right_d",
                "left_t",
                "right_t",
                "thermocouple",
                "pour_pyrometer",
                "pour_pressure",
                "photo_pyrometer",
                "companions",
            ],
        ),
        ("cycle", &["fill"]),
        ("cycle.fill", FILL_FIELDS),
        (
            "pour",
            &[
                "fill",
                "temperature_change_threshold",
                "sample_temperature_max",
                "volume_key",
                "large_furnace_volume",
                "recording_start_key",
                "recording_end_key",
                "leak_check_keys",
            ],
        ),
        ("pour.fill", FILL_FIELDS),
        (
            "holding",
            &[
                "band_width",
                "high_cutoff",
                "high_floor",
                "segment_high_cutoff",
                "thermocouple_threshold",
                "thermocouple_max_valid",
            ],
        ),
        ("retraction", &["window"]),
        (
            "form_speed",
            &[
                "rate_scale",
                "median_window",
                "edge_trim",
                "bin_tolerance",
                "match_tolerance",
                "min_match_ratio",
            ],
        ),
        (
            "leakage",
            &[
                "pressure_scale",
                "pressure_cap",
                "histogram_bins",
                "stable_tolerance",
                "growth_band_low",
                "growth_band_high",
                "widen",
                "target_offset",
                "stabilization_skip",
                "volume_coefficient",
                "min_valid_offset",
                "min_samples",
            ],
        ),
    ];

    let mut keys = HashSet::new();
    for (section, fields) in sections {
        keys.insert((*section).to_string());
        for field in *fields {
            keys.insert(format!("{section}.{field}"));
        }
    }
    keys
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

/// Dotted paths of every float leaf that is NaN or infinite.
pub fn non_finite_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            match v {
                toml::Value::Float(f) if !f.is_finite() => keys.push(path),
                toml::Value::Table(_) => keys.extend(non_finite_keys(v, &path)),
                _ => {}
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Levenshtein edit distance, counted in chars.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Closest known key within edit distance 3. Ties go to the lexically
/// smallest key so the suggestion does not depend on hash order.
pub fn suggest_correction(unknown: &str, known: &HashSet<String>) -> Option<String> {
    known
        .iter()
        .map(|k| (levenshtein(unknown, k), k))
        .filter(|(dist, _)| *dist <= 3)
        .min()
        .map(|(_, k)| k.clone())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// Only warns. Parse errors are left for serde to report.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(),
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Physical Range Validation
// ============================================================================

/// Validate physical ranges on a parsed `AnalysisConfig`.
///
/// Returns (errors, warnings). Errors are impossible values; warnings are
/// suspicious but usable.
pub fn validate_physical_ranges(
    config: &super::AnalysisConfig,
) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    // Casting temperatures: 0-2500 °C covers every pyrometer we read
    for (name, fill) in [("cycle.fill", &config.cycle.fill), ("pour.fill", &config.pour.fill)] {
        for (field, value) in [
            ("dip_threshold", fill.dip_threshold),
            ("valid_min", fill.valid_min),
            ("valid_max", fill.valid_max),
        ] {
            if !(0.0..=2500.0).contains(&value) {
                errors.push(format!(
                    "{name}.{field} = {value:.1} is outside physical range (0-2500 °C)"
                ));
            }
        }
        if fill.dip_threshold >= fill.valid_min {
            warnings.push(ValidationWarning {
                field: format!("{name}.dip_threshold"),
                message: format!(
                    "{name}.dip_threshold ({:.1}) is not below valid_min ({:.1}), every dip would also be a valid fill",
                    fill.dip_threshold, fill.valid_min
                ),
                suggestion: None,
            });
        }
    }

    let h = &config.holding;
    if h.thermocouple_max_valid <= h.thermocouple_threshold {
        errors.push(format!(
            "holding.thermocouple_max_valid ({:.1}) must be above thermocouple_threshold ({:.1})",
            h.thermocouple_max_valid, h.thermocouple_threshold
        ));
    }

    let l = &config.leakage;
    if l.pressure_cap <= 0.0 {
        errors.push(format!(
            "leakage.pressure_cap = {:.1} must be > 0",
            l.pressure_cap
        ));
    }
    if l.min_valid_offset > l.target_offset {
        warnings.push(ValidationWarning {
            field: "leakage.min_valid_offset".to_string(),
            message: format!(
                "leakage.min_valid_offset ({}) exceeds target_offset ({}), no measurement can be accepted",
                l.min_valid_offset, l.target_offset
            ),
            suggestion: None,
        });
    }

    // Sampling: anything outside 1 s to 10 min is almost certainly a typo
    let period = config.sampling.period_secs;
    if period > 600 {
        warnings.push(ValidationWarning {
            field: "sampling.period_secs".to_string(),
            message: format!("sampling.period_secs = {period} is outside typical range (1-600 s)"),
            suggestion: None,
        });
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("holding", "holding"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("treshold", "threshold"), 1);
    }

    #[test]
    fn test_levenshtein_counts_chars_not_bytes() {
        assert_eq!(levenshtein("ПИРОМЕТР", "ПИРОМЕТП"), 1);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [pour]
            [pour.fill]
            drop_threshold = 35.0
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"pour".to_string()));
        assert!(keys.contains(&"pour.fill".to_string()));
        assert!(keys.contains(&"pour.fill.drop_threshold".to_string()));
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let toml_str = r#"
[leakage]
volume_coeficient = 820.0
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings[0].suggestion.as_deref(),
            Some("leakage.volume_coefficient")
        );
        assert!(warnings[0].to_string().contains("did you mean"));
    }

    #[test]
    fn test_all_valid_keys_produce_zero_warnings() {
        let toml_str = r#"
[sampling]
period_secs = 5

[channels]
pyrometer = ["Piro", "PIRO"]

[cycle.fill]
strategy = "continue_scan"

[leakage]
target_offset = 120
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert!(warnings.is_empty(), "Expected 0 warnings, got: {:?}", warnings);
    }

    #[test]
    fn test_suggest_correction_no_match_for_garbage() {
        let known = known_config_keys();
        assert!(suggest_correction("completely_unrelated_garbage_key_xyz", &known).is_none());
    }

    #[test]
    fn test_default_config_serializes_to_known_keys_only() {
        let text = AnalysisConfig::default().to_toml().unwrap();
        let warnings = validate_unknown_keys(&text);
        assert!(warnings.is_empty(), "Unexpected keys: {:?}", warnings);
    }

    #[test]
    fn test_physical_range_defaults_clean() {
        let (errors, warnings) = validate_physical_ranges(&AnalysisConfig::default());
        assert!(errors.is_empty(), "{:?}", errors);
        assert!(warnings.is_empty(), "{:?}", warnings);
    }

    #[test]
    fn test_fill_temperature_out_of_range() {
        let mut config = AnalysisConfig::default();
        config.pour.fill.valid_max = 9000.0;
        let (errors, _) = validate_physical_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("pour.fill.valid_max")));
    }

    #[test]
    fn test_unreachable_offset_warns() {
        let mut config = AnalysisConfig::default();
        config.leakage.min_valid_offset = 200;
        let (_, warnings) = validate_physical_ranges(&config);
        assert!(warnings.iter().any(|w| w.field == "leakage.min_valid_offset"));
    }

    #[test]
    fn test_non_finite_keys_found() {
        let mut config = AnalysisConfig::default();
        config.leakage.pressure_cap = f64::NAN;
        let tree = toml::Value::try_from(&config).unwrap();
        assert_eq!(non_finite_keys(&tree, ""), vec!["leakage.pressure_cap".to_string()]);
    }
}
