use async_trait::async_trait;
#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::database::{DbScope, Document};
use crate::error::{DriverError, MigrationLoadError, OperationResult};
use crate::logger::Logger;
use crate::migration::Migration;

/// One declarative step of a migration script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptAction {
    CreateTable {
        table: String,
    },
    DropTable {
        table: String,
    },
    CreateIndex {
        table: String,
        index: String,
        /// Indexed field; defaults to the index name.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        field: Option<String>,
    },
    DropIndex {
        table: String,
        index: String,
    },
    Insert {
        table: String,
        rows: Vec<Document>,
    },
    /// Delete rows by primary key.
    Delete {
        table: String,
        ids: Vec<Value>,
    },
}

impl ScriptAction {
    pub async fn apply(&self, db: DbScope<'_>, logger: &dyn Logger) -> Result<(), DriverError> {
        match self {
            ScriptAction::CreateTable { table } => {
                logger.verbose(&format!("Creating table {table}"));
                db.table_create(table).await
            }
            ScriptAction::DropTable { table } => {
                logger.verbose(&format!("Dropping table {table}"));
                db.table_drop(table).await
            }
            ScriptAction::CreateIndex {
                table,
                index,
                field,
            } => {
                logger.verbose(&format!("Creating index \"{index}\" in table \"{table}\""));
                db.index_create(table, index, field.as_deref().unwrap_or(index))
                    .await
            }
            ScriptAction::DropIndex { table, index } => {
                logger.verbose(&format!("Dropping index {table}.{index}"));
                db.index_drop(table, index).await
            }
            ScriptAction::Insert { table, rows } => {
                logger.debug(&format!("Inserting {} rows into {table}", rows.len()));
                db.insert(table, rows.clone()).await.map(|_| ())
            }
            ScriptAction::Delete { table, ids } => {
                let list = ids
                    .iter()
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                logger.debug(&format!("Removing ids {list} from table {table}"));
                db.delete_many(table, ids).await.map(|_| ())
            }
        }
    }
}

/// Contents of a migration file.
///
/// Both operation lists are optional at parse time so a file missing one can
/// be reported instead of failing to deserialize.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct MigrationScript {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub up: Option<Vec<ScriptAction>>,
    pub down: Option<Vec<ScriptAction>>,
}

impl MigrationScript {
    /// Empty template used when scaffolding a new migration file.
    pub fn template(comment: Option<String>) -> Self {
        Self {
            comment,
            up: Some(Vec::new()),
            down: Some(Vec::new()),
        }
    }

    /// Validate that both operations are present.
    pub fn into_migration(self, id: &str) -> Result<ScriptMigration, MigrationLoadError> {
        let missing = |operation| MigrationLoadError::MissingOperation {
            id: id.to_string(),
            operation,
        };
        let up = self.up.ok_or_else(|| missing("up"))?;
        let down = self.down.ok_or_else(|| missing("down"))?;
        Ok(ScriptMigration { up, down })
    }
}

/// A migration made of declarative actions, applied in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptMigration {
    pub up: Vec<ScriptAction>,
    pub down: Vec<ScriptAction>,
}

impl ScriptMigration {
    pub fn new(up: Vec<ScriptAction>, down: Vec<ScriptAction>) -> Self {
        Self { up, down }
    }

    async fn apply_all(
        actions: &[ScriptAction],
        db: DbScope<'_>,
        logger: &dyn Logger,
    ) -> OperationResult {
        for action in actions {
            action.apply(db, logger).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Migration for ScriptMigration {
    async fn up(&self, db: DbScope<'_>, logger: &dyn Logger) -> OperationResult {
        Self::apply_all(&self.up, db, logger).await
    }

    async fn down(&self, db: DbScope<'_>, logger: &dyn Logger) -> OperationResult {
        Self::apply_all(&self.down, db, logger).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_tagged_actions() {
        let script: MigrationScript = serde_json::from_value(json!({
            "comment": "seed",
            "up": [
                {"type": "create_table", "table": "foo"},
                {"type": "create_index", "table": "foo", "index": "by_name", "field": "name"},
                {"type": "insert", "table": "foo", "rows": [{"id": 1}, {"id": 2}]}
            ],
            "down": [
                {"type": "delete", "table": "foo", "ids": [1, 2]},
                {"type": "drop_table", "table": "foo"}
            ]
        }))
        .unwrap();

        let migration = script.into_migration("02-seed").unwrap();
        assert_eq!(migration.up.len(), 3);
        assert_eq!(
            migration.up[1],
            ScriptAction::CreateIndex {
                table: "foo".into(),
                index: "by_name".into(),
                field: Some("name".into()),
            }
        );
        assert_eq!(
            migration.down[0],
            ScriptAction::Delete {
                table: "foo".into(),
                ids: vec![json!(1), json!(2)],
            }
        );
    }

    #[test]
    fn missing_operation_is_reported() {
        let script: MigrationScript =
            serde_json::from_value(json!({"up": [{"type": "create_table", "table": "x"}]}))
                .unwrap();

        let err = script.into_migration("02-invalid").unwrap_err();
        assert!(matches!(
            err,
            MigrationLoadError::MissingOperation { ref id, operation: "down" } if id == "02-invalid"
        ));
    }

    #[test]
    fn null_operation_counts_as_missing() {
        let script: MigrationScript =
            serde_json::from_value(json!({"up": null, "down": []})).unwrap();
        assert!(script.into_migration("x").is_err());
    }

    #[test]
    fn template_round_trips() {
        let template = MigrationScript::template(Some("add users".into()));
        let text = serde_json::to_string(&template).unwrap();
        assert_eq!(text, r#"{"comment":"add users","up":[],"down":[]}"#);
        assert!(template.into_migration("0001-add-users").is_ok());
    }
}
