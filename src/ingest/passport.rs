//! Passport sheets: per-file key/value metadata
//!
//! Two layouts are in circulation: a wide sheet whose header row holds the
//! keys and whose first data row holds the values, and a transposed sheet
//! with one `key,value` pair per line.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::csv_table::{detect_delimiter, split_fields};
use crate::types::TableError;

/// Passport fields, keys trimmed and upper-cased, values trimmed
pub type Passport = BTreeMap<String, String>;

/// Parse passport text in either layout.
pub fn parse_passport(text: &str) -> Passport {
    let lines: Vec<&str> = text
        .lines()
        .map(|l| l.trim_start_matches('\u{feff}'))
        .filter(|l| !l.trim().is_empty())
        .collect();
    let Some(first) = lines.first() else {
        return Passport::new();
    };
    let delimiter = detect_delimiter(first);
    let rows: Vec<Vec<String>> = lines.iter().map(|l| split_fields(l, delimiter)).collect();

    let transposed = rows.len() > 2 && rows.iter().all(|r| r.len() == 2);
    let pairs: Vec<(String, String)> = if transposed {
        rows.into_iter()
            .map(|mut r| {
                let value = r.pop().unwrap_or_default();
                let key = r.pop().unwrap_or_default();
                (key, value)
            })
            .collect()
    } else {
        let values = rows.get(1).cloned().unwrap_or_default();
        rows[0]
            .iter()
            .enumerate()
            .map(|(col, key)| (key.clone(), values.get(col).cloned().unwrap_or_default()))
            .collect()
    };

    pairs
        .into_iter()
        .filter_map(|(key, value)| {
            let key = key.trim().to_uppercase();
            (!key.is_empty()).then(|| (key, value.trim().to_string()))
        })
        .collect()
}

/// Read a passport file
pub fn load_passport(path: &Path) -> Result<Passport, TableError> {
    let text = fs::read_to_string(path).map_err(|source| TableError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(parse_passport(&text))
}
