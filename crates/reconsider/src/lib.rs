//! Apply and revert migrations against a database, one at a time, recording
//! each completed migration in a ledger table.
//!
//! ```ignore
//! let recon = Reconsider::new(driver, ReconsiderConfig::new("app"), LoggerSetting::Default)?;
//! let report = recon.migrate_up(&[]).await?;
//! for timing in &report {
//!     println!("{}: {:.3}s", timing.id, timing.elapsed_secs());
//! }
//! ```

pub use reconsider_config::{ConfigError, FileFormat, LogLevel, ReconsiderConfig};
pub use reconsider_core::{
    BoxError, ConsoleLogger, Database, DbScope, Direction, Document, DriverError, Filter,
    HelperError, IndexSpec, LedgerEntry, Logger, LoggerSetting, Migration, MigrationDescriptor,
    MigrationLoadError, MigrationScript, MigrationSource, NoopLogger, OperationResult,
    OperationTiming, Order, Query, ResolvedMigration, ScriptAction, ScriptMigration, SourceError,
    TimingReport, TracingLogger, create_index_migration, create_migration,
    create_tables_migration,
};
pub use reconsider_loader::{CodeSource, DirectorySource};
pub use reconsider_runner::{LedgerError, Reconsider, ReconsiderError};

/// Build a [`CodeSource`] from `id => migration` pairs, keeping their order.
///
/// ```ignore
/// let source = migrations! {
///     "01-create-tables" => create_tables_migration(["foo", "bar"])?,
///     "02-index" => create_index_migration(vec![IndexSpec::new("foo", "name")])?,
/// };
/// ```
#[macro_export]
macro_rules! migrations {
    ($($id:expr => $migration:expr),* $(,)?) => {
        $crate::CodeSource::new()$(.register($id, $migration))*
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconsider_memory::MemoryDatabase;
    use std::sync::Arc;

    #[tokio::test]
    async fn macro_registers_in_order() {
        let source = migrations! {
            "01-create-tables" => create_tables_migration(["foo", "bar"]).unwrap(),
            "02-index" => create_index_migration(vec![IndexSpec::new("foo", "name")]).unwrap(),
        };
        assert_eq!(source.ids().collect::<Vec<_>>(), vec!["01-create-tables", "02-index"]);

        let store = Arc::new(MemoryDatabase::new());
        let recon = Reconsider::new(store.clone(), ReconsiderConfig::new("app"), LoggerSetting::Disabled)
            .unwrap()
            .with_source(source);

        let report = recon.migrate_up(&[]).await.unwrap();
        assert_eq!(report.len(), 4);
        assert_eq!(store.list_indexes("app", "foo").await.unwrap(), vec!["name"]);

        recon.migrate_down(&[]).await.unwrap();
        assert_eq!(
            store.list_tables("app").await.unwrap(),
            vec![recon.config().table_name()]
        );
    }

    #[test]
    fn empty_macro_builds_empty_source() {
        let source = migrations! {};
        assert!(source.is_empty());
    }
}
