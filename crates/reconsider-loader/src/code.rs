use std::sync::Arc;

use async_trait::async_trait;
use reconsider_core::{Migration, MigrationLoadError, MigrationSource, SourceError};

/// Migrations compiled into the binary and registered by id.
///
/// Ids are listed in registration order. Registering an id twice replaces the
/// earlier migration without moving it.
#[derive(Clone, Default)]
pub struct CodeSource {
    migrations: Vec<(String, Arc<dyn Migration>)>,
}

impl CodeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(self, id: impl Into<String>, migration: impl Migration + 'static) -> Self {
        self.register_arc(id, Arc::new(migration))
    }

    pub fn register_arc(mut self, id: impl Into<String>, migration: Arc<dyn Migration>) -> Self {
        let id = id.into();
        match self.migrations.iter_mut().find(|(existing, _)| *existing == id) {
            Some(slot) => slot.1 = migration,
            None => self.migrations.push((id, migration)),
        }
        self
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.migrations.iter().map(|(id, _)| id.as_str())
    }
}

impl std::fmt::Debug for CodeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.ids()).finish()
    }
}

#[async_trait]
impl MigrationSource for CodeSource {
    async fn list(&self) -> Result<Vec<String>, SourceError> {
        Ok(self.ids().map(str::to_string).collect())
    }

    async fn load(&self, id: &str) -> Result<Arc<dyn Migration>, MigrationLoadError> {
        self.migrations
            .iter()
            .find(|(candidate, _)| candidate == id)
            .map(|(_, migration)| Arc::clone(migration))
            .ok_or_else(|| MigrationLoadError::NotFound(id.to_string()))
    }
}
