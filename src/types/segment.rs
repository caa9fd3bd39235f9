//! Process-cycle segments over the Index axis

use serde::{Deserialize, Serialize};

/// Closed Index interval `[start, end]` of one casting cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Segment {
    pub start: u64,
    pub end: u64,
}

impl Segment {
    pub const fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    pub const fn contains(&self, index: u64) -> bool {
        self.start <= index && index <= self.end
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}..={}]", self.start, self.end)
    }
}
