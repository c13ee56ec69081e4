use std::time::Instant;

use reconsider_core::{
    CREATE_DATABASE, CREATE_MIGRATIONS_TABLE, Database, Logger, OperationTiming, TimingReport,
    timestamp,
};

use crate::error::ReconsiderError;
use crate::ledger::Ledger;

/// Create the target database and the ledger table when missing.
///
/// The report only holds the steps that actually created something. Both
/// checks are list-then-create, so concurrent bootstraps can race.
pub async fn ensure_database_and_ledger(
    driver: &dyn Database,
    db: &str,
    ledger: &Ledger<'_>,
    logger: &dyn Logger,
) -> Result<TimingReport, ReconsiderError> {
    let mut report = TimingReport::new();

    if driver.list_databases().await?.iter().any(|name| name == db) {
        logger.verbose(&format!("⤼ Database {db} already exists, skipping creation."));
    } else {
        logger.info(&format!("Database {db} does not exist - creating."));
        let start = Instant::now();
        driver.create_database(db).await?;
        report.push(OperationTiming::new(
            CREATE_DATABASE,
            start.elapsed(),
            timestamp::now(),
        ));
        logger.info(&format!("↳ Database {db} created successfully."));
    }

    let start = Instant::now();
    if ledger.ensure_exists(logger).await? {
        report.push(OperationTiming::new(
            CREATE_MIGRATIONS_TABLE,
            start.elapsed(),
            timestamp::now(),
        ));
    }

    Ok(report)
}
