use std::sync::Arc;

use reconsider_config::ReconsiderConfig;
use reconsider_core::{
    Database, DbScope, Direction, Logger, LoggerSetting, MigrationDescriptor, MigrationSource,
    ResolvedMigration, TimingReport,
};
use reconsider_loader::DirectorySource;

use crate::bootstrap::ensure_database_and_ledger;
use crate::error::ReconsiderError;
use crate::executor::Executor;
use crate::ledger::Ledger;
use crate::registry::{Registry, Selection};

/// Applies and reverts migrations against one database.
///
/// Migrations are read from the configured source directory unless another
/// source is installed with [`Reconsider::with_source`].
pub struct Reconsider {
    driver: Arc<dyn Database>,
    config: ReconsiderConfig,
    db: String,
    logger: Arc<dyn Logger>,
    source: Arc<dyn MigrationSource>,
}

impl Reconsider {
    pub fn new(
        driver: Arc<dyn Database>,
        config: ReconsiderConfig,
        logger: impl Into<LoggerSetting>,
    ) -> Result<Self, ReconsiderError> {
        let db = config.validate()?.to_string();
        let logger = logger.into().resolve(config.log_level());
        let source = Arc::new(DirectorySource::from_config(&config));
        Ok(Self {
            driver,
            config,
            db,
            logger,
            source,
        })
    }

    pub fn with_source(mut self, source: impl MigrationSource + 'static) -> Self {
        self.source = Arc::new(source);
        self
    }

    pub fn config(&self) -> &ReconsiderConfig {
        &self.config
    }

    /// Name of the target database.
    pub fn db_name(&self) -> &str {
        &self.db
    }

    pub fn logger(&self) -> &dyn Logger {
        self.logger.as_ref()
    }

    pub fn db(&self) -> DbScope<'_> {
        DbScope::new(self.driver.as_ref(), &self.db)
    }

    pub fn ledger(&self) -> Ledger<'_> {
        Ledger::new(self.db(), self.config.table_name())
    }

    fn registry(&self) -> Registry<'_> {
        Registry::new(self.source.as_ref(), self.ledger())
    }

    /// Create the database and the ledger table if they are missing.
    pub async fn init(&self) -> Result<TimingReport, ReconsiderError> {
        ensure_database_and_ledger(
            self.driver.as_ref(),
            &self.db,
            &self.ledger(),
            self.logger(),
        )
        .await
    }

    /// Resolved migrations matching the flags, minus `exclude`.
    ///
    /// Pending ones come in source order, completed-only in reverse order of
    /// completion. Expects [`init`](Self::init) to have run.
    pub async fn get_migrations(
        &self,
        pending: bool,
        completed: bool,
        exclude: &[&str],
    ) -> Result<Vec<ResolvedMigration>, ReconsiderError> {
        self.registry()
            .resolve_migrations(Selection::new(pending, completed), exclude, self.logger())
            .await
    }

    /// Every known migration with its completion state, without creating anything.
    ///
    /// Ledger entries whose migration has left the source are listed after the
    /// source's own migrations.
    pub async fn status(&self) -> Result<Vec<MigrationDescriptor>, ReconsiderError> {
        if self.is_initialized().await? {
            return self.registry().known().await;
        }
        Ok(self
            .source
            .list()
            .await?
            .into_iter()
            .map(MigrationDescriptor::pending)
            .collect())
    }

    async fn is_initialized(&self) -> Result<bool, ReconsiderError> {
        let databases = self.driver.list_databases().await?;
        if !databases.iter().any(|name| *name == self.db) {
            return Ok(false);
        }
        Ok(self.ledger().exists().await?)
    }

    /// Apply every pending migration not in `exclude`.
    pub async fn migrate_up(&self, exclude: &[&str]) -> Result<TimingReport, ReconsiderError> {
        self.logger.info("↑ Performing database migrations ↑");
        self.migrate(Selection::PENDING, Direction::Up, exclude).await
    }

    /// Revert every completed migration not in `exclude`, most recent first.
    pub async fn migrate_down(&self, exclude: &[&str]) -> Result<TimingReport, ReconsiderError> {
        self.logger.info("↓ Reverting database migrations ↓");
        self.migrate(Selection::COMPLETED, Direction::Down, exclude)
            .await
    }

    async fn migrate(
        &self,
        selection: Selection,
        direction: Direction,
        exclude: &[&str],
    ) -> Result<TimingReport, ReconsiderError> {
        let mut report = self.init().await?;
        let migrations = self
            .registry()
            .resolve_migrations(selection, exclude, self.logger())
            .await?;

        if migrations.is_empty() {
            self.logger.verbose("⤼ No migrations to run.");
            return Ok(report);
        }

        let executor = Executor::new(self.db(), self.ledger(), self.logger());
        report.extend(executor.run(&migrations, direction).await?);
        Ok(report)
    }
}

impl std::fmt::Debug for Reconsider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconsider")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
