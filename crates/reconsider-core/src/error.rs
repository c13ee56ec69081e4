use std::path::PathBuf;

use thiserror::Error;

/// Error type produced by migration operations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result of a single forward or backward migration operation.
pub type OperationResult = Result<(), BoxError>;

/// Failures reported by a [`Database`](crate::Database) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    #[error("database not found: {0}")]
    DatabaseNotFound(String),
    #[error("database already exists: {0}")]
    DatabaseExists(String),
    #[error("table not found: {0}.{1}")]
    TableNotFound(String, String),
    #[error("table already exists: {0}.{1}")]
    TableExists(String, String),
    #[error("index not found: {0}.{1}")]
    IndexNotFound(String, String),
    #[error("index already exists: {0}.{1}")]
    IndexExists(String, String),
    #[error("duplicate primary key in {0}: {1}")]
    DuplicateKey(String, String),
    #[error("row in {0} has no primary key")]
    MissingPrimaryKey(String),
    #[error("{0}")]
    Backend(String),
}

/// A migration could not be turned into executable operations.
#[derive(Debug, Error)]
pub enum MigrationLoadError {
    #[error("migration not found: {0}")]
    NotFound(String),
    #[error("read migration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse migration file {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("migration {id} does not define a \"{operation}\" operation")]
    MissingOperation { id: String, operation: &'static str },
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Listing available migrations failed.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("read migrations directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Other(String),
}

/// Argument validation for the canned migration constructors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HelperError {
    #[error("\"create_tables_migration\" expects a non-empty list of table names")]
    EmptyTableList,
    #[error("\"create_index_migration\" expects a non-empty list of index specifications")]
    EmptyIndexList,
    #[error("index specification {0} must name both a table and an index")]
    InvalidIndexSpec(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_includes_context() {
        let e = DriverError::TableNotFound("app".into(), "users".into());
        assert_eq!(e.to_string(), "table not found: app.users");

        let e = MigrationLoadError::MissingOperation {
            id: "01-init".into(),
            operation: "down",
        };
        assert_eq!(
            e.to_string(),
            "migration 01-init does not define a \"down\" operation"
        );

        let e = HelperError::InvalidIndexSpec(2);
        assert_eq!(
            e.to_string(),
            "index specification 2 must name both a table and an index"
        );
    }
}
