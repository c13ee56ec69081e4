use chrono::{DateTime, Utc};
use reconsider_core::{DbScope, DriverError, LedgerEntry, Logger, Order, Query};
use serde_json::Value;

use crate::error::LedgerError;

/// Name of the secondary index over [`COMPLETED_FIELD`].
pub const COMPLETED_INDEX: &str = "completed";
/// Field holding the completion timestamp of a ledger row.
pub const COMPLETED_FIELD: &str = "completed";

/// The table recording which migrations have completed, and when.
///
/// Rows are inserted the moment a forward operation succeeds and deleted the
/// moment a backward one does. Nothing else writes the table.
#[derive(Debug, Clone, Copy)]
pub struct Ledger<'a> {
    db: DbScope<'a>,
    table: &'a str,
}

impl<'a> Ledger<'a> {
    pub fn new(db: DbScope<'a>, table: &'a str) -> Self {
        Self { db, table }
    }

    pub fn table(&self) -> &'a str {
        self.table
    }

    pub async fn exists(&self) -> Result<bool, LedgerError> {
        let tables = self.db.table_list().await?;
        Ok(tables.iter().any(|t| t == self.table))
    }

    /// Create the table and its completion index unless the table is already there.
    ///
    /// Returns whether anything was created. Two processes bootstrapping at
    /// once can both see the table missing; the loser gets a driver error.
    pub async fn ensure_exists(&self, logger: &dyn Logger) -> Result<bool, LedgerError> {
        let table = self.table;
        if self.exists().await? {
            logger.verbose(&format!(
                "⤼ Migrations table {table} already exists, skipping creation."
            ));
            return Ok(false);
        }

        logger.info(&format!("Migrations table {table} does not exist - creating."));
        self.db.table_create(table).await?;
        self.db
            .index_create(table, COMPLETED_INDEX, COMPLETED_FIELD)
            .await?;
        logger.info(&format!("↳ Migrations table {table} created successfully."));
        Ok(true)
    }

    /// Every entry, most recently completed first.
    pub async fn entries(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        let query = Query::new().order_by(COMPLETED_FIELD, Order::Desc);
        self.db
            .query(self.table, &query)
            .await?
            .into_iter()
            .map(|row| LedgerEntry::from_document(row).map_err(|e| LedgerError::Corrupt(e.to_string())))
            .collect()
    }

    /// Completion time of the newest entry, if any.
    pub async fn latest(&self) -> Result<Option<DateTime<Utc>>, LedgerError> {
        let query = Query::new().order_by(COMPLETED_FIELD, Order::Desc).limit(1);
        match self.db.query(self.table, &query).await?.into_iter().next() {
            Some(row) => LedgerEntry::from_document(row)
                .map(|entry| Some(entry.completed))
                .map_err(|e| LedgerError::Corrupt(e.to_string())),
            None => Ok(None),
        }
    }

    pub async fn get(&self, id: &str) -> Result<Option<LedgerEntry>, LedgerError> {
        match self.db.get(self.table, &Value::from(id)).await? {
            Some(row) => LedgerEntry::from_document(row)
                .map(Some)
                .map_err(|e| LedgerError::Corrupt(e.to_string())),
            None => Ok(None),
        }
    }

    pub async fn record_completion(
        &self,
        id: &str,
        completed: DateTime<Utc>,
    ) -> Result<LedgerEntry, LedgerError> {
        let entry = LedgerEntry::new(id, completed);
        match self.db.insert(self.table, vec![entry.to_document()]).await {
            Ok(_) => Ok(entry),
            Err(DriverError::DuplicateKey(..)) => Err(LedgerError::DuplicateEntry(id.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the entry for `id`. A missing entry is reported, not treated as an error.
    pub async fn record_reversion(&self, id: &str, logger: &dyn Logger) -> Result<bool, LedgerError> {
        let removed = self.db.delete(self.table, &Value::from(id)).await?;
        if !removed {
            logger.warn(&format!(
                "Migration {id} was reverted but had no entry in {}.",
                self.table
            ));
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use reconsider_core::{Database, LogLevel, NoopLogger, RecordingLogger};
    use reconsider_memory::MemoryDatabase;

    const TABLE: &str = "_reconsider_migrations";

    async fn store() -> MemoryDatabase {
        let store = MemoryDatabase::new();
        store.create_database("app").await.unwrap();
        store
    }

    fn at(second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, second).unwrap()
    }

    #[tokio::test]
    async fn ensure_exists_creates_table_and_index_once() {
        let store = store().await;
        let ledger = Ledger::new(DbScope::new(&store, "app"), TABLE);
        let logger = RecordingLogger::new();

        assert!(ledger.ensure_exists(&logger).await.unwrap());
        assert!(!ledger.ensure_exists(&logger).await.unwrap());

        assert_eq!(
            store.list_indexes("app", TABLE).await.unwrap(),
            vec![COMPLETED_INDEX]
        );
        assert_eq!(
            logger.messages(LogLevel::Verbose),
            vec![format!(
                "⤼ Migrations table {TABLE} already exists, skipping creation."
            )]
        );
    }

    #[tokio::test]
    async fn entries_are_most_recent_first() {
        let store = store().await;
        let ledger = Ledger::new(DbScope::new(&store, "app"), TABLE);
        ledger.ensure_exists(&NoopLogger).await.unwrap();

        ledger.record_completion("01-create-tables", at(1)).await.unwrap();
        ledger.record_completion("03-insert-data", at(3)).await.unwrap();
        ledger.record_completion("02-other", at(2)).await.unwrap();

        let ids: Vec<_> = ledger
            .entries()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["03-insert-data", "02-other", "01-create-tables"]);
    }

    #[tokio::test]
    async fn duplicate_completion_is_rejected() {
        let store = store().await;
        let ledger = Ledger::new(DbScope::new(&store, "app"), TABLE);
        ledger.ensure_exists(&NoopLogger).await.unwrap();

        let entry = ledger.record_completion("01-a", at(1)).await.unwrap();
        assert_eq!(ledger.get("01-a").await.unwrap(), Some(entry));

        let err = ledger.record_completion("01-a", at(2)).await.unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateEntry(id) if id == "01-a"));
    }

    #[tokio::test]
    async fn reverting_absent_entry_warns() {
        let store = store().await;
        let ledger = Ledger::new(DbScope::new(&store, "app"), TABLE);
        ledger.ensure_exists(&NoopLogger).await.unwrap();
        ledger.record_completion("01-a", at(1)).await.unwrap();

        let logger = RecordingLogger::new();
        assert!(ledger.record_reversion("01-a", &logger).await.unwrap());
        assert!(!ledger.record_reversion("01-a", &logger).await.unwrap());
        assert_eq!(logger.messages(LogLevel::Warn).len(), 1);
        assert!(ledger.get("01-a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_rows_are_reported() {
        let store = store().await;
        let ledger = Ledger::new(DbScope::new(&store, "app"), TABLE);
        ledger.ensure_exists(&NoopLogger).await.unwrap();
        let row = serde_json::json!({"id": "01-a", "completed": "last tuesday"});
        store
            .insert("app", TABLE, vec![row.as_object().cloned().unwrap()])
            .await
            .unwrap();

        assert!(matches!(
            ledger.entries().await.unwrap_err(),
            LedgerError::Corrupt(_)
        ));
    }

    #[tokio::test]
    async fn missing_table_surfaces_driver_error() {
        let store = store().await;
        let ledger = Ledger::new(DbScope::new(&store, "app"), TABLE);
        assert!(!ledger.exists().await.unwrap());
        assert!(matches!(
            ledger.entries().await.unwrap_err(),
            LedgerError::Driver(DriverError::TableNotFound(..))
        ));
    }
}
