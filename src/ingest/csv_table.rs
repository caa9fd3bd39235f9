//! Delimited text to `SampleTable`
//!
//! Export files come from different loggers: `;` or `,` separated, comma
//! decimals, padded headers, the odd text cell in a numeric column. All of
//! that is normalised here so the analysis only ever sees numbers or NaN.
//!
//! An `Index` column, when present, becomes the Index axis; otherwise rows
//! are numbered from 1.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::types::{SampleTable, TableError};

/// Header of the explicit Index column
pub const INDEX_COLUMN: &str = "Index";

/// Pick `;` or `,` from the header line, whichever occurs more often
/// outside quotes. Ties go to `,`.
pub fn detect_delimiter(header: &str) -> char {
    let mut in_quotes = false;
    let (mut semicolons, mut commas) = (0usize, 0usize);
    for ch in header.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => semicolons += 1,
            ',' if !in_quotes => commas += 1,
            _ => {}
        }
    }
    if semicolons > commas {
        ';'
    } else {
        ','
    }
}

/// Split one line on `delimiter`, honouring double quotes and `""` escapes
pub fn split_fields(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            c if c == delimiter && !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

/// Numeric cell value. Accepts comma decimals; anything else is NaN.
pub fn parse_number(cell: &str) -> f64 {
    let cell = cell.trim();
    if cell.is_empty() {
        return f64::NAN;
    }
    cell.replace(',', ".").parse().unwrap_or(f64::NAN)
}

/// Trimmed header names, with `_1`, `_2`, ... appended to repeats and
/// blank names replaced by their column number.
fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    raw.into_iter()
        .enumerate()
        .map(|(col, name)| {
            let name = match name.trim() {
                "" => format!("column_{}", col + 1),
                trimmed => trimmed.to_string(),
            };
            let repeats = seen.entry(name.clone()).or_insert(0);
            let unique = if *repeats == 0 { name } else { format!("{name}_{repeats}") };
            *repeats += 1;
            unique
        })
        .collect()
}

/// Read a table from any buffered reader. `label` names the input in errors.
pub fn read_table<R: BufRead>(reader: R, label: &str) -> Result<SampleTable, TableError> {
    let mut lines = reader.lines().enumerate();

    let (delimiter, headers) = loop {
        let Some((_, line)) = lines.next() else {
            return Err(TableError::MissingHeader);
        };
        let line = line.map_err(|source| TableError::Io {
            path: label.to_string(),
            source,
        })?;
        let line = line.trim_start_matches('\u{feff}');
        if line.trim().is_empty() {
            continue;
        }
        let delimiter = detect_delimiter(line);
        break (delimiter, normalize_headers(split_fields(line, delimiter)));
    };

    let index_col = headers.iter().position(|h| h.eq_ignore_ascii_case(INDEX_COLUMN));
    let mut index: Vec<u64> = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];

    for (n, line) in lines {
        let line_no = n + 1;
        let line = line.map_err(|source| TableError::Io {
            path: label.to_string(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }

        let mut fields = split_fields(&line, delimiter);
        // trailing delimiters
        while fields.len() > headers.len() && fields.last().is_some_and(|f| f.trim().is_empty()) {
            fields.pop();
        }
        if fields.len() != headers.len() {
            return Err(TableError::RaggedRow {
                line: line_no,
                expected: headers.len(),
                actual: fields.len(),
            });
        }

        if let Some(col) = index_col {
            let raw = fields[col].trim();
            let value = raw.parse().map_err(|_| TableError::InvalidIndex {
                line: line_no,
                value: raw.to_string(),
            })?;
            index.push(value);
        }
        for (column, field) in columns.iter_mut().zip(&fields) {
            column.push(parse_number(field));
        }
    }

    let rows = columns.first().map_or(0, Vec::len);
    let mut table = match index_col {
        Some(_) => SampleTable::with_index(index)?,
        None => SampleTable::new(rows),
    };
    for (col, (name, values)) in headers.into_iter().zip(columns).enumerate() {
        if Some(col) != index_col {
            table.insert_channel(name, values)?;
        }
    }

    debug!(source = label, rows, delimiter = %delimiter, "Loaded table");
    Ok(table)
}

/// Read a table from a file
pub fn load_table(path: &Path) -> Result<SampleTable, TableError> {
    let file = File::open(path).map_err(|source| TableError::Io {
        path: path.display().to_string(),
        source,
    })?;
    read_table(BufReader::new(file), &path.display().to_string())
}
