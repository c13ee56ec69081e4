use std::path::{Path, PathBuf};

#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::file_format::FileFormat;
use crate::log_level::LogLevel;

/// Default name of the table recording completed migrations.
pub fn default_table_name() -> String {
    "_reconsider_migrations".to_string()
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("migrations")
}

/// Top-level reconsider configuration.
///
/// Every field except `db` has a default, so a config file only needs to name
/// the target database. Unset fields are filled in at deserialization time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct ReconsiderConfig {
    /// Name of the database migrations run against.
    #[serde(default)]
    pub db: Option<String>,
    /// Table holding one entry per completed migration.
    #[serde(default = "default_table_name")]
    pub table_name: String,
    /// Directory scanned for migration files.
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,
    /// Minimum level written by the default console logger.
    #[serde(default)]
    pub log_level: LogLevel,
    /// Format used when scaffolding new migration files.
    #[serde(default)]
    pub migration_format: FileFormat,
}

impl Default for ReconsiderConfig {
    fn default() -> Self {
        Self {
            db: None,
            table_name: default_table_name(),
            source_dir: default_source_dir(),
            log_level: LogLevel::default(),
            migration_format: FileFormat::default(),
        }
    }
}

impl ReconsiderConfig {
    /// Config targeting `db` with every other field at its default.
    pub fn new(db: impl Into<String>) -> Self {
        Self {
            db: Some(db.into()),
            ..Default::default()
        }
    }

    /// Replace the migrations directory.
    pub fn with_source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source_dir = dir.into();
        self
    }

    /// Replace the ledger table name.
    pub fn with_table_name(mut self, table: impl Into<String>) -> Self {
        self.table_name = table.into();
        self
    }

    /// Target database name, if set.
    pub fn db(&self) -> Option<&str> {
        self.db.as_deref()
    }

    /// Ledger table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Path where migrations are stored.
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    pub fn migration_format(&self) -> FileFormat {
        self.migration_format
    }

    /// Check the fields that have no usable default and return the database name.
    pub fn validate(&self) -> Result<&str, ConfigError> {
        let db = match self.db.as_deref().map(str::trim) {
            None => return Err(ConfigError::MissingDatabase),
            Some("") => return Err(ConfigError::EmptyDatabase),
            Some(db) => db,
        };
        if self.table_name.trim().is_empty() {
            return Err(ConfigError::EmptyTableName);
        }
        Ok(db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_reconsider_config_default() {
        let config = ReconsiderConfig::default();

        assert_eq!(config.db, None);
        assert_eq!(config.table_name, "_reconsider_migrations");
        assert_eq!(config.source_dir, PathBuf::from("migrations"));
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.migration_format, FileFormat::Json);
    }

    #[test]
    fn test_unset_fields_fall_back_to_defaults() {
        let config: ReconsiderConfig = serde_json::from_str(r#"{"db": "app"}"#).unwrap();

        assert_eq!(config.db(), Some("app"));
        assert_eq!(config.table_name(), "_reconsider_migrations");
        assert_eq!(config.source_dir(), Path::new("migrations"));
        assert_eq!(config.log_level(), LogLevel::Info);
    }

    #[test]
    fn test_camel_case_keys() {
        let config: ReconsiderConfig = serde_json::from_str(
            r#"{"db": "app", "tableName": "done", "sourceDir": "db/migrations", "logLevel": "debug", "migrationFormat": "yaml"}"#,
        )
        .unwrap();

        assert_eq!(config.table_name(), "done");
        assert_eq!(config.source_dir(), Path::new("db/migrations"));
        assert_eq!(config.log_level(), LogLevel::Debug);
        assert_eq!(config.migration_format(), FileFormat::Yaml);
    }

    #[test]
    fn test_builder_helpers() {
        let config = ReconsiderConfig::new("app")
            .with_source_dir("elsewhere")
            .with_table_name("ledger");

        assert_eq!(config.validate().unwrap(), "app");
        assert_eq!(config.source_dir(), Path::new("elsewhere"));
        assert_eq!(config.table_name(), "ledger");
    }

    #[rstest]
    #[case::missing(None, "_reconsider_migrations", ConfigError::MissingDatabase)]
    #[case::empty(Some(""), "_reconsider_migrations", ConfigError::EmptyDatabase)]
    #[case::blank(Some("   "), "_reconsider_migrations", ConfigError::EmptyDatabase)]
    #[case::empty_table(Some("app"), "", ConfigError::EmptyTableName)]
    fn test_validate_rejects(
        #[case] db: Option<&str>,
        #[case] table: &str,
        #[case] expected: ConfigError,
    ) {
        let config = ReconsiderConfig {
            db: db.map(String::from),
            table_name: table.to_string(),
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap_err(), expected);
    }
}
