//! Sample table: the Index axis plus named numeric channels
//!
//! Every downstream range is addressed by the 1-based `Index` value, never by
//! the physical row position. Once rows are filtered the two diverge, so all
//! range selection goes through a binary search over the verified-monotonic
//! Index column.

use std::collections::BTreeMap;
use std::ops::Range;
use thiserror::Error;

/// Errors raised while assembling a table
#[derive(Debug, Error)]
pub enum TableError {
    #[error("channel '{channel}' has {actual} samples, expected {expected}")]
    RaggedChannel {
        channel: String,
        expected: usize,
        actual: usize,
    },

    #[error("Index must be strictly increasing: {previous} followed by {next}")]
    NonMonotonicIndex { previous: u64, next: u64 },

    #[error("input has no header row")]
    MissingHeader,

    #[error("line {line} has {actual} fields, expected {expected}")]
    RaggedRow {
        line: usize,
        expected: usize,
        actual: usize,
    },

    #[error("line {line}: invalid Index value '{value}'")]
    InvalidIndex { line: usize, value: String },

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Ordered rows with named channels. Missing values are stored as NaN.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleTable {
    index: Vec<u64>,
    channels: BTreeMap<String, Vec<f64>>,
}

impl SampleTable {
    /// Empty table of `len` rows with Index `1..=len`
    pub fn new(len: usize) -> Self {
        Self {
            index: (1..=len as u64).collect(),
            channels: BTreeMap::new(),
        }
    }

    /// Table over an explicit Index column (e.g. after upstream filtering).
    pub fn with_index(index: Vec<u64>) -> Result<Self, TableError> {
        for pair in index.windows(2) {
            if pair[1] <= pair[0] {
                return Err(TableError::NonMonotonicIndex {
                    previous: pair[0],
                    next: pair[1],
                });
            }
        }
        Ok(Self {
            index,
            channels: BTreeMap::new(),
        })
    }

    /// Add or replace a channel. Length must match the Index column.
    pub fn insert_channel(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), TableError> {
        let name = name.into();
        if values.len() != self.index.len() {
            return Err(TableError::RaggedChannel {
                channel: name,
                expected: self.index.len(),
                actual: values.len(),
            });
        }
        self.channels.insert(name, values);
        Ok(())
    }

    /// Builder-style `insert_channel`
    pub fn with_channel(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self, TableError> {
        self.insert_channel(name, values)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &[u64] {
        &self.index
    }

    pub fn channel(&self, name: &str) -> Option<&[f64]> {
        self.channels.get(name).map(Vec::as_slice)
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    /// Resolve the first alias present in the table.
    ///
    /// Header names are compared trimmed and case-insensitively, so `PT6 `
    /// and `pt6` both resolve the alias `PT6`.
    pub fn find_channel<S: AsRef<str>>(&self, aliases: &[S]) -> Option<(&str, &[f64])> {
        aliases.iter().find_map(|alias| {
            let wanted = alias.as_ref().trim().to_uppercase();
            self.channels
                .iter()
                .find(|(name, _)| name.trim().to_uppercase() == wanted)
                .map(|(name, values)| (name.as_str(), values.as_slice()))
        })
    }

    /// Physical row position of an Index value
    pub fn position_of(&self, index: u64) -> Option<usize> {
        self.index.binary_search(&index).ok()
    }

    /// Row positions covering the closed Index interval `[start, end]`
    pub fn span(&self, start: u64, end: u64) -> Range<usize> {
        let lo = self.index.partition_point(|&i| i < start);
        let hi = self.index.partition_point(|&i| i <= end);
        lo..hi.max(lo)
    }

    /// Snapshot of every channel at one row; NaN becomes `None`.
    pub fn row(&self, position: usize) -> BTreeMap<String, Option<f64>> {
        self.channels
            .iter()
            .map(|(name, values)| {
                let value = values.get(position).copied().filter(|v| v.is_finite());
                (name.clone(), value)
            })
            .collect()
    }
}
