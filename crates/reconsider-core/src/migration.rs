use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::database::{DbScope, Document};
use crate::error::OperationResult;
use crate::logger::Logger;

/// A named pair of inverse operations.
#[async_trait]
pub trait Migration: Send + Sync {
    /// Forward operation.
    async fn up(&self, db: DbScope<'_>, logger: &dyn Logger) -> OperationResult;

    /// Backward operation, undoing `up`.
    async fn down(&self, db: DbScope<'_>, logger: &dyn Logger) -> OperationResult;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A migration id together with its completion state, before its operations are loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationDescriptor {
    pub id: String,
    /// `None` while pending.
    pub completed: Option<DateTime<Utc>>,
}

impl MigrationDescriptor {
    pub fn pending(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            completed: None,
        }
    }

    pub fn completed(id: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            completed: Some(at),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.completed.is_none()
    }

    /// Attach loaded operations.
    pub fn resolve(self, migration: Arc<dyn Migration>) -> ResolvedMigration {
        ResolvedMigration {
            descriptor: self,
            migration,
        }
    }
}

impl From<LedgerEntry> for MigrationDescriptor {
    fn from(entry: LedgerEntry) -> Self {
        MigrationDescriptor::completed(entry.id, entry.completed)
    }
}

/// A descriptor whose operations were loaded and validated; the only kind the executor runs.
#[derive(Clone)]
pub struct ResolvedMigration {
    descriptor: MigrationDescriptor,
    migration: Arc<dyn Migration>,
}

impl ResolvedMigration {
    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    pub fn completed(&self) -> Option<DateTime<Utc>> {
        self.descriptor.completed
    }

    pub fn descriptor(&self) -> &MigrationDescriptor {
        &self.descriptor
    }

    pub fn migration(&self) -> &Arc<dyn Migration> {
        &self.migration
    }

    /// Invoke the operation for `direction`.
    pub async fn run(
        &self,
        direction: Direction,
        db: DbScope<'_>,
        logger: &dyn Logger,
    ) -> OperationResult {
        match direction {
            Direction::Up => self.migration.up(db, logger).await,
            Direction::Down => self.migration.down(db, logger).await,
        }
    }
}

impl fmt::Debug for ResolvedMigration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedMigration")
            .field("id", &self.descriptor.id)
            .field("completed", &self.descriptor.completed)
            .finish_non_exhaustive()
    }
}

/// One row of the completion ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: String,
    #[serde(with = "timestamp")]
    pub completed: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn new(id: impl Into<String>, completed: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            completed,
        }
    }

    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("id".into(), Value::String(self.id.clone()));
        doc.insert(
            "completed".into(),
            Value::String(timestamp::format(&self.completed)),
        );
        doc
    }

    pub fn from_document(doc: Document) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(doc))
    }
}

/// Fixed-width RFC 3339 timestamps (UTC, microseconds) whose string order is
/// chronological order.
pub mod timestamp {
    use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Current time at the precision the ledger stores.
    pub fn now() -> DateTime<Utc> {
        Utc::now().trunc_subsecs(6)
    }

    pub fn format(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    pub fn parse(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        DateTime::parse_from_rfc3339(text).map(|ts| ts.with_timezone(&Utc))
    }

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn descriptor_states() {
        let pending = MigrationDescriptor::pending("01-create-tables");
        assert!(pending.is_pending());

        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let done = MigrationDescriptor::from(LedgerEntry::new("05-completed", at));
        assert!(!done.is_pending());
        assert_eq!(done.completed, Some(at));
    }

    #[test]
    fn ledger_entry_document_uses_fixed_width_timestamps() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let entry = LedgerEntry::new("01-init", at);

        let doc = entry.to_document();
        assert_eq!(
            Value::Object(doc.clone()),
            json!({"id": "01-init", "completed": "2024-05-01T12:00:00.000000Z"})
        );
        assert_eq!(LedgerEntry::from_document(doc).unwrap(), entry);
    }

    #[test]
    fn ledger_entry_rejects_bad_timestamp() {
        let doc = json!({"id": "x", "completed": "yesterday"})
            .as_object()
            .cloned()
            .unwrap();
        assert!(LedgerEntry::from_document(doc).is_err());
    }

    #[test]
    fn now_is_truncated_to_micros() {
        let ts = timestamp::now();
        assert_eq!(timestamp::parse(&timestamp::format(&ts)).unwrap(), ts);
    }

    #[test]
    fn direction_display() {
        assert_eq!(Direction::Up.to_string(), "up");
        assert_eq!(Direction::Down.to_string(), "down");
    }
}
