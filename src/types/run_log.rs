//! Per-file outcomes of a pipeline run

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a file produced no record. Recorded in the run log, never propagated.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum SkipReason {
    #[error("missing channel '{0}'")]
    MissingChannel(String),

    #[error("channel '{0}' has no numeric data")]
    AllMissingData(String),

    #[error("input table is empty")]
    EmptyTable,

    #[error("no temperature change above threshold")]
    NoTemperatureChange,

    #[error("no form-active segments")]
    NoSegments,

    #[error("no segment produced a fill event")]
    NoValidSegments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Success,
    Skipped,
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Success => write!(f, "success"),
            RunStatus::Skipped => write!(f, "skipped"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One line of the run log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLogEntry {
    pub installation: Option<String>,
    pub source: String,
    pub status: RunStatus,
    pub reason: String,
}

impl RunLogEntry {
    pub fn success(installation: Option<&str>, source: &str, reason: impl Into<String>) -> Self {
        Self {
            installation: installation.map(str::to_string),
            source: source.to_string(),
            status: RunStatus::Success,
            reason: reason.into(),
        }
    }

    pub fn skipped(installation: Option<&str>, source: &str, reason: &SkipReason) -> Self {
        Self {
            installation: installation.map(str::to_string),
            source: source.to_string(),
            status: RunStatus::Skipped,
            reason: reason.to_string(),
        }
    }

    pub fn failed(installation: Option<&str>, source: &str, reason: impl Into<String>) -> Self {
        Self {
            installation: installation.map(str::to_string),
            source: source.to_string(),
            status: RunStatus::Failed,
            reason: reason.into(),
        }
    }
}
