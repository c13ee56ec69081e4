use reconsider_config::ConfigError;
use reconsider_core::{BoxError, Direction, DriverError, SourceError};
use thiserror::Error;

/// Failures of the completion ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("migration {0} is already recorded as completed")]
    DuplicateEntry(String),
    #[error("malformed ledger entry: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Driver(#[from] DriverError),
}

#[derive(Debug, Error)]
pub enum ReconsiderError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Driver(#[from] DriverError),
    #[error("at least one of pending or completed migrations must be requested")]
    InvalidQuery,
    #[error("ledger: {0}")]
    Ledger(#[from] LedgerError),
    #[error("list migrations: {0}")]
    Source(#[from] SourceError),
    /// A migration operation failed. Migrations that ran before it stay recorded.
    #[error("migration {id} failed while running {direction}: {source}")]
    Operation {
        id: String,
        direction: Direction,
        #[source]
        source: BoxError,
    },
}

impl ReconsiderError {
    /// Id of the migration whose operation failed, if that is what happened.
    pub fn failed_migration(&self) -> Option<&str> {
        match self {
            ReconsiderError::Operation { id, .. } => Some(id),
            _ => None,
        }
    }
}
