use std::time::Instant;

use chrono::{DateTime, TimeDelta, Utc};
use reconsider_core::{
    DbScope, Direction, Logger, OperationTiming, ResolvedMigration, timestamp,
};

use crate::error::ReconsiderError;
use crate::ledger::Ledger;

/// Runs resolved migrations one at a time and keeps the ledger in step.
pub struct Executor<'a> {
    db: DbScope<'a>,
    ledger: Ledger<'a>,
    logger: &'a dyn Logger,
}

impl<'a> Executor<'a> {
    pub fn new(db: DbScope<'a>, ledger: Ledger<'a>, logger: &'a dyn Logger) -> Self {
        Self { db, ledger, logger }
    }

    /// Run `migrations` in order in `direction`.
    ///
    /// Each success is written to the ledger before the next migration starts.
    /// The first failure stops the batch; migrations that already ran stay
    /// recorded and the failing one is not undone.
    pub async fn run(
        &self,
        migrations: &[ResolvedMigration],
        direction: Direction,
    ) -> Result<Vec<OperationTiming>, ReconsiderError> {
        let mut timings = Vec::with_capacity(migrations.len());
        // New entries must sort after everything already recorded, including
        // an earlier batch that finished within the same microsecond.
        let mut previous: Option<DateTime<Utc>> = match direction {
            Direction::Up if !migrations.is_empty() => self.ledger.latest().await?,
            _ => None,
        };

        for migration in migrations {
            let id = migration.id();
            let start = Instant::now();
            self.logger.info(&format!("{} Running migration {id} ({direction})", arrow(direction)));

            migration
                .run(direction, self.db, self.logger)
                .await
                .map_err(|source| ReconsiderError::Operation {
                    id: id.to_string(),
                    direction,
                    source,
                })?;

            let elapsed = start.elapsed();
            let completed_at = next_timestamp(previous);
            previous = Some(completed_at);

            match direction {
                Direction::Up => {
                    self.ledger.record_completion(id, completed_at).await?;
                }
                Direction::Down => {
                    self.ledger.record_reversion(id, self.logger).await?;
                }
            }

            let timing = OperationTiming::new(id, elapsed, completed_at);
            self.logger.verbose(&format!(
                "↳ Migration {id} finished in {:.3}s",
                timing.elapsed_secs()
            ));
            timings.push(timing);
        }

        Ok(timings)
    }
}

fn arrow(direction: Direction) -> &'static str {
    match direction {
        Direction::Up => "↑",
        Direction::Down => "↓",
    }
}

/// The current time, pushed past `previous` when the clock has not moved.
fn next_timestamp(previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = timestamp::now();
    match previous {
        Some(previous) if now <= previous => previous + TimeDelta::microseconds(1),
        _ => now,
    }
}
