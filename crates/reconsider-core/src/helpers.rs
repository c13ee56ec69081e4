//! Constructors for common migrations.

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::action::{ScriptAction, ScriptMigration};
use crate::database::DbScope;
use crate::error::{HelperError, OperationResult};
use crate::logger::Logger;
use crate::migration::Migration;

/// Boxed operation accepted by [`create_migration`].
pub type OperationFn = Box<
    dyn for<'a> Fn(DbScope<'a>, &'a dyn Logger) -> BoxFuture<'a, OperationResult> + Send + Sync,
>;

/// A migration backed by two closures.
pub struct FnMigration {
    up: OperationFn,
    down: OperationFn,
}

#[async_trait]
impl Migration for FnMigration {
    async fn up(&self, db: DbScope<'_>, logger: &dyn Logger) -> OperationResult {
        (self.up)(db, logger).await
    }

    async fn down(&self, db: DbScope<'_>, logger: &dyn Logger) -> OperationResult {
        (self.down)(db, logger).await
    }
}

/// Build a migration from a forward and a backward closure.
///
/// ```ignore
/// let migration = create_migration(
///     |db, _logger| Box::pin(async move {
///         db.table_create("users").await?;
///         Ok::<(), BoxError>(())
///     }),
///     |db, _logger| Box::pin(async move {
///         db.table_drop("users").await?;
///         Ok::<(), BoxError>(())
///     }),
/// );
/// ```
pub fn create_migration<U, D>(up: U, down: D) -> FnMigration
where
    U: for<'a> Fn(DbScope<'a>, &'a dyn Logger) -> BoxFuture<'a, OperationResult>
        + Send
        + Sync
        + 'static,
    D: for<'a> Fn(DbScope<'a>, &'a dyn Logger) -> BoxFuture<'a, OperationResult>
        + Send
        + Sync
        + 'static,
{
    FnMigration {
        up: Box::new(up),
        down: Box::new(down),
    }
}

/// Creates the tables on the way up and drops them on the way down.
pub fn create_tables_migration<I, S>(tables: I) -> Result<ScriptMigration, HelperError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let tables: Vec<String> = tables.into_iter().map(Into::into).collect();
    if tables.is_empty() {
        return Err(HelperError::EmptyTableList);
    }

    let up = tables
        .iter()
        .map(|table| ScriptAction::CreateTable {
            table: table.clone(),
        })
        .collect();
    let down = tables
        .into_iter()
        .map(|table| ScriptAction::DropTable { table })
        .collect();
    Ok(ScriptMigration::new(up, down))
}

/// A secondary index to create in [`create_index_migration`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub table: String,
    pub index: String,
    /// Indexed field; defaults to the index name.
    pub field: Option<String>,
}

impl IndexSpec {
    pub fn new(table: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            index: index.into(),
            field: None,
        }
    }

    pub fn on_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// Creates the indices on the way up and drops them on the way down.
pub fn create_index_migration(indices: Vec<IndexSpec>) -> Result<ScriptMigration, HelperError> {
    if indices.is_empty() {
        return Err(HelperError::EmptyIndexList);
    }
    if let Some(position) = indices
        .iter()
        .position(|spec| spec.table.is_empty() || spec.index.is_empty())
    {
        return Err(HelperError::InvalidIndexSpec(position));
    }

    let down = indices
        .iter()
        .map(|spec| ScriptAction::DropIndex {
            table: spec.table.clone(),
            index: spec.index.clone(),
        })
        .collect();
    let up = indices
        .into_iter()
        .map(|spec| ScriptAction::CreateIndex {
            table: spec.table,
            index: spec.index,
            field: spec.field,
        })
        .collect();
    Ok(ScriptMigration::new(up, down))
}
