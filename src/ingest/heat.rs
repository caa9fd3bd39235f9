//! Heat (melt) identifiers from folder names
//!
//! Pour folders are named like `H1234 03.04.2024` or `h77-2024-04-03`. The
//! heat is whatever precedes the first real calendar date.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

/// Recognised date shapes with their chrono formats, longest first
const DATE_SHAPES: [(&str, &str); 6] = [
    (r"\b\d{2}\.\d{2}\.\d{4}\b", "%d.%m.%Y"),
    (r"\b\d{4}-\d{2}-\d{2}\b", "%Y-%m-%d"),
    (r"\b\d{2}/\d{2}/\d{4}\b", "%d/%m/%Y"),
    (r"\b\d{2}\.\d{2}\.\d{2}\b", "%d.%m.%y"),
    (r"\b\d{2}-\d{2}-\d{2}\b", "%d-%m-%y"),
    (r"\b\d{2}/\d{2}/\d{2}\b", "%d/%m/%y"),
];

fn date_patterns() -> &'static [(Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        DATE_SHAPES
            .iter()
            .filter_map(|&(pattern, format)| Regex::new(pattern).ok().map(|re| (re, format)))
            .collect()
    })
}

/// Byte offset of the first substring that parses as a calendar date
fn first_date(name: &str) -> Option<usize> {
    date_patterns()
        .iter()
        .flat_map(|(re, format)| {
            re.find_iter(name)
                .filter(|m| NaiveDate::parse_from_str(m.as_str(), format).is_ok())
                .map(|m| m.start())
        })
        .min()
}

/// Heat identifier of a pour folder name.
///
/// The upper-cased text before the first date, trailing punctuation and
/// whitespace stripped. Without a usable prefix, the first alphanumeric
/// token.
pub fn heat_name(folder: &str) -> String {
    if let Some(start) = first_date(folder) {
        let prefix = folder[..start]
            .trim_end_matches(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
            .trim_start();
        if !prefix.is_empty() {
            return prefix.to_uppercase();
        }
    }
    folder
        .split(|c: char| !c.is_alphanumeric())
        .find(|token| !token.is_empty())
        .unwrap_or(folder)
        .to_uppercase()
}
