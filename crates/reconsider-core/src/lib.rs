pub mod action;
pub mod database;
pub mod error;
pub mod helpers;
pub mod logger;
pub mod migration;
pub mod source;
pub mod timing;

pub use action::{MigrationScript, ScriptAction, ScriptMigration};
pub use database::{DbScope, Database, Document, Filter, Order, PRIMARY_KEY, Query, compare_values};
pub use error::{
    BoxError, DriverError, HelperError, MigrationLoadError, OperationResult, SourceError,
};
pub use helpers::{
    FnMigration, IndexSpec, create_index_migration, create_migration, create_tables_migration,
};
pub use logger::{ConsoleLogger, Logger, LoggerSetting, NoopLogger, TracingLogger};
#[cfg(any(test, feature = "test-util"))]
pub use logger::RecordingLogger;
pub use migration::{Direction, LedgerEntry, Migration, MigrationDescriptor, ResolvedMigration, timestamp};
pub use reconsider_config::LogLevel;
pub use source::MigrationSource;
pub use timing::{CREATE_DATABASE, CREATE_MIGRATIONS_TABLE, OperationTiming, TimingReport};
