use std::time::Duration;

use chrono::{DateTime, Utc};

/// Timing id of the bootstrap step creating the target database.
pub const CREATE_DATABASE: &str = "create_database";
/// Timing id of the bootstrap step creating the ledger table.
pub const CREATE_MIGRATIONS_TABLE: &str = "create_migrations_table";

/// How long one operation took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationTiming {
    /// Migration id or one of the reserved bootstrap ids.
    pub id: String,
    pub elapsed: Duration,
    pub completed_at: DateTime<Utc>,
}

impl OperationTiming {
    pub fn new(id: impl Into<String>, elapsed: Duration, completed_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            elapsed,
            completed_at,
        }
    }

    /// Elapsed time in fractional seconds.
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

/// Ordered timings collected during one top-level invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimingReport {
    timings: Vec<OperationTiming>,
}

impl TimingReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, timing: OperationTiming) {
        self.timings.push(timing);
    }

    pub fn len(&self) -> usize {
        self.timings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timings.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OperationTiming> {
        self.timings.iter()
    }

    /// Timing recorded for `id`, if any.
    pub fn get(&self, id: &str) -> Option<&OperationTiming> {
        self.timings.iter().find(|t| t.id == id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.timings.iter().map(|t| t.id.as_str()).collect()
    }

    /// Sum of all elapsed times.
    pub fn total(&self) -> Duration {
        self.timings.iter().map(|t| t.elapsed).sum()
    }

    pub fn into_vec(self) -> Vec<OperationTiming> {
        self.timings
    }
}

impl Extend<OperationTiming> for TimingReport {
    fn extend<T: IntoIterator<Item = OperationTiming>>(&mut self, iter: T) {
        self.timings.extend(iter);
    }
}

impl IntoIterator for TimingReport {
    type Item = OperationTiming;
    type IntoIter = std::vec::IntoIter<OperationTiming>;

    fn into_iter(self) -> Self::IntoIter {
        self.timings.into_iter()
    }
}

impl<'a> IntoIterator for &'a TimingReport {
    type Item = &'a OperationTiming;
    type IntoIter = std::slice::Iter<'a, OperationTiming>;

    fn into_iter(self) -> Self::IntoIter {
        self.timings.iter()
    }
}
