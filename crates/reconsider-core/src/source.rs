use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{MigrationLoadError, SourceError};
use crate::migration::Migration;

/// Where migrations come from.
#[async_trait]
pub trait MigrationSource: Send + Sync {
    /// Ids of every available migration, in application order.
    async fn list(&self) -> Result<Vec<String>, SourceError>;

    /// Load the operations for `id`.
    async fn load(&self, id: &str) -> Result<Arc<dyn Migration>, MigrationLoadError>;
}
