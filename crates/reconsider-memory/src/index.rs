use std::cmp::Ordering;
use std::collections::BTreeSet;

use reconsider_core::{Document, compare_values};
use serde_json::Value;

/// Entry of a secondary index: the indexed value, then the row key as tie-breaker.
#[derive(Debug, Clone)]
struct IndexKey {
    value: Value,
    key: String,
}

impl PartialEq for IndexKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for IndexKey {}

impl PartialOrd for IndexKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndexKey {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_values(&self.value, &other.value).then_with(|| self.key.cmp(&other.key))
    }
}

/// Ordered index over one field of a table. Rows lacking the field index as `null`.
#[derive(Debug, Clone)]
pub(crate) struct SecondaryIndex {
    field: String,
    entries: BTreeSet<IndexKey>,
}

impl SecondaryIndex {
    pub(crate) fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            entries: BTreeSet::new(),
        }
    }

    pub(crate) fn field(&self) -> &str {
        &self.field
    }

    fn entry(&self, key: &str, row: &Document) -> IndexKey {
        IndexKey {
            value: row.get(&self.field).cloned().unwrap_or(Value::Null),
            key: key.to_string(),
        }
    }

    pub(crate) fn insert(&mut self, key: &str, row: &Document) {
        let entry = self.entry(key, row);
        self.entries.insert(entry);
    }

    pub(crate) fn remove(&mut self, key: &str, row: &Document) {
        let entry = self.entry(key, row);
        self.entries.remove(&entry);
    }

    /// Row keys in ascending order of the indexed value.
    pub(crate) fn keys(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }
}
