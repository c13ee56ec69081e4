use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no database name set in reconsider config")]
    MissingDatabase,
    #[error("database name in reconsider config is empty")]
    EmptyDatabase,
    #[error("migrations table name in reconsider config is empty")]
    EmptyTableName,
}
