use std::collections::HashMap;

use reconsider_core::{
    LedgerEntry, Logger, MigrationDescriptor, MigrationSource, ResolvedMigration,
};

use crate::error::ReconsiderError;
use crate::ledger::Ledger;

/// Which migrations to select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub pending: bool,
    pub completed: bool,
}

impl Selection {
    pub const PENDING: Selection = Selection {
        pending: true,
        completed: false,
    };
    pub const COMPLETED: Selection = Selection {
        pending: false,
        completed: true,
    };
    pub const ALL: Selection = Selection {
        pending: true,
        completed: true,
    };

    pub fn new(pending: bool, completed: bool) -> Self {
        Self { pending, completed }
    }
}

/// Cross-references the available migrations with the ledger.
pub struct Registry<'a> {
    source: &'a dyn MigrationSource,
    ledger: Ledger<'a>,
}

impl<'a> Registry<'a> {
    pub fn new(source: &'a dyn MigrationSource, ledger: Ledger<'a>) -> Self {
        Self { source, ledger }
    }

    /// Descriptors matching `selection`, minus `exclude`.
    ///
    /// Completed-only selections come straight from the ledger, most recent
    /// first, so entries whose migration file is gone are still returned.
    /// Anything else follows the source listing order.
    pub async fn classify(
        &self,
        selection: Selection,
        exclude: &[&str],
    ) -> Result<Vec<MigrationDescriptor>, ReconsiderError> {
        if !selection.pending && !selection.completed {
            return Err(ReconsiderError::InvalidQuery);
        }

        let entries = self.ledger.entries().await?;
        let mut descriptors: Vec<MigrationDescriptor> = if !selection.pending {
            entries.into_iter().map(MigrationDescriptor::from).collect()
        } else {
            let mut completed: HashMap<_, _> = entries
                .into_iter()
                .map(|entry| (entry.id.clone(), entry))
                .collect();
            self.source
                .list()
                .await?
                .into_iter()
                .map(|id| match completed.remove(&id) {
                    Some(entry) => MigrationDescriptor::from(entry),
                    None => MigrationDescriptor::pending(id),
                })
                .filter(|descriptor| selection.completed || descriptor.is_pending())
                .collect()
        };

        descriptors.retain(|descriptor| !exclude.contains(&descriptor.id.as_str()));
        Ok(descriptors)
    }

    /// Every migration the source lists, followed by ledger entries whose
    /// migration is no longer in the source, most recent first.
    pub async fn known(&self) -> Result<Vec<MigrationDescriptor>, ReconsiderError> {
        let entries = self.ledger.entries().await?;
        let mut completed: HashMap<&str, &LedgerEntry> = entries
            .iter()
            .map(|entry| (entry.id.as_str(), entry))
            .collect();

        let mut descriptors: Vec<MigrationDescriptor> = self
            .source
            .list()
            .await?
            .into_iter()
            .map(|id| match completed.remove(id.as_str()) {
                Some(entry) => MigrationDescriptor::from(entry.clone()),
                None => MigrationDescriptor::pending(id),
            })
            .collect();
        descriptors.extend(
            entries
                .iter()
                .filter(|entry| completed.contains_key(entry.id.as_str()))
                .cloned()
                .map(MigrationDescriptor::from),
        );
        Ok(descriptors)
    }

    /// Load operations for each descriptor. Ones that fail to load are logged and dropped.
    pub async fn resolve(
        &self,
        descriptors: Vec<MigrationDescriptor>,
        logger: &dyn Logger,
    ) -> Vec<ResolvedMigration> {
        let mut resolved = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            match self.source.load(&descriptor.id).await {
                Ok(migration) => resolved.push(descriptor.resolve(migration)),
                Err(e) => logger.warn(&format!("Skipping migration {}: {e}", descriptor.id)),
            }
        }
        resolved
    }

    pub async fn resolve_migrations(
        &self,
        selection: Selection,
        exclude: &[&str],
        logger: &dyn Logger,
    ) -> Result<Vec<ResolvedMigration>, ReconsiderError> {
        let descriptors = self.classify(selection, exclude).await?;
        Ok(self.resolve(descriptors, logger).await)
    }
}
