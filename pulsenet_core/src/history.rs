use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One processed input cycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FiringRecord {
    pub timestamp: DateTime<Utc>,
    /// Monotonic per-unit cycle index (only counts processed inputs).
    pub cycle: u64,
    pub input: f64,
    pub fired: bool,
}

/// Append-only firing history.
///
/// Storage is never truncated; decision logic reads the tail through
/// [`FiringHistory::recent`] so it stays O(window).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FiringHistory {
    records: Vec<FiringRecord>,
}

impl FiringHistory {
    pub fn new() -> Self {
        Self { records: Vec::new() }
    }

    pub fn push(&mut self, input: f64, fired: bool) {
        let cycle = self.records.len() as u64;
        self.records.push(FiringRecord {
            timestamp: Utc::now(),
            cycle,
            input,
            fired,
        });
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn all(&self) -> &[FiringRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&FiringRecord> {
        self.records.last()
    }

    /// The most recent `n` records, oldest first.
    pub fn recent(&self, n: usize) -> &[FiringRecord] {
        let start = self.records.len().saturating_sub(n);
        &self.records[start..]
    }

    /// True only when at least `n` records exist and none of the last `n` fired.
    pub fn silent_for(&self, n: usize) -> bool {
        self.records.len() >= n && self.recent(n).iter().all(|r| !r.fired)
    }

    /// Firing events over the full history.
    pub fn firing_count(&self) -> usize {
        self.records.iter().filter(|r| r.fired).count()
    }
}
