use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use reconsider_core::{
    Database, Document, DriverError, Order, PRIMARY_KEY, Query, compare_values,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;
use crate::index::SecondaryIndex;

/// Canonical row key: the JSON text of the primary key, so `1` and `"1"` differ.
fn row_key(value: &Value) -> String {
    value.to_string()
}

#[derive(Debug, Clone, Default)]
struct Table {
    rows: BTreeMap<String, Document>,
    indexes: BTreeMap<String, SecondaryIndex>,
}

impl Table {
    fn insert_row(&mut self, key: String, row: Document) {
        for index in self.indexes.values_mut() {
            index.insert(&key, &row);
        }
        self.rows.insert(key, row);
    }

    fn remove_row(&mut self, key: &str) -> bool {
        match self.rows.remove(key) {
            Some(row) => {
                for index in self.indexes.values_mut() {
                    index.remove(key, &row);
                }
                true
            }
            None => false,
        }
    }

    fn select(&self, query: &Query) -> Vec<Document> {
        let matches = |row: &&Document| query.filter.as_ref().is_none_or(|f| f.matches(row));

        let mut rows: Vec<&Document> = match &query.order_by {
            Some((field, order)) => {
                match self.indexes.values().find(|index| index.field() == field) {
                    Some(index) => {
                        let keys: Box<dyn Iterator<Item = &str>> = match order {
                            Order::Asc => Box::new(index.keys()),
                            Order::Desc => Box::new(index.keys().rev()),
                        };
                        keys.filter_map(|key| self.rows.get(key))
                            .filter(matches)
                            .collect()
                    }
                    None => {
                        let mut rows: Vec<&Document> = self.rows.values().filter(matches).collect();
                        let null = Value::Null;
                        rows.sort_by(|a, b| {
                            let ord = compare_values(
                                a.get(field).unwrap_or(&null),
                                b.get(field).unwrap_or(&null),
                            );
                            match order {
                                Order::Asc => ord,
                                Order::Desc => ord.reverse(),
                            }
                        });
                        rows
                    }
                }
            }
            None => self.rows.values().filter(matches).collect(),
        };

        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        rows.into_iter().cloned().collect()
    }
}

type Tables = BTreeMap<String, Table>;

/// Serializable image of a [`MemoryDatabase`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub databases: BTreeMap<String, BTreeMap<String, TableSnapshot>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    /// Index name to indexed field.
    #[serde(default)]
    pub indexes: BTreeMap<String, String>,
    #[serde(default)]
    pub rows: Vec<Document>,
}

/// Document database held in process memory.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    databases: Mutex<BTreeMap<String, Tables>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, Tables>>, DriverError> {
        self.databases
            .lock()
            .map_err(|_| DriverError::Backend("memory store lock poisoned".into()))
    }

    fn with_tables<T>(
        &self,
        db: &str,
        f: impl FnOnce(&mut Tables) -> Result<T, DriverError>,
    ) -> Result<T, DriverError> {
        let mut databases = self.lock()?;
        let tables = databases
            .get_mut(db)
            .ok_or_else(|| DriverError::DatabaseNotFound(db.to_string()))?;
        f(tables)
    }

    fn with_table<T>(
        &self,
        db: &str,
        table: &str,
        f: impl FnOnce(&mut Table) -> Result<T, DriverError>,
    ) -> Result<T, DriverError> {
        self.with_tables(db, |tables| {
            let t = tables
                .get_mut(table)
                .ok_or_else(|| DriverError::TableNotFound(db.to_string(), table.to_string()))?;
            f(t)
        })
    }

    /// Rebuild a store, including its indexes, from a snapshot.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let databases = snapshot
            .databases
            .into_iter()
            .map(|(db, tables)| {
                let tables = tables
                    .into_iter()
                    .map(|(name, image)| {
                        let mut table = Table {
                            rows: BTreeMap::new(),
                            indexes: image
                                .indexes
                                .into_iter()
                                .map(|(index, field)| (index, SecondaryIndex::new(field)))
                                .collect(),
                        };
                        for row in image.rows {
                            if let Some(key) = row.get(PRIMARY_KEY).map(row_key) {
                                table.insert_row(key, row);
                            }
                        }
                        (name, table)
                    })
                    .collect();
                (db, tables)
            })
            .collect();
        Self {
            databases: Mutex::new(databases),
        }
    }

    pub fn snapshot(&self) -> Result<Snapshot, StoreError> {
        let databases = self.databases.lock().map_err(|_| StoreError::Poisoned)?;
        let databases = databases
            .iter()
            .map(|(db, tables)| {
                let tables = tables
                    .iter()
                    .map(|(name, table)| {
                        let image = TableSnapshot {
                            indexes: table
                                .indexes
                                .iter()
                                .map(|(index, si)| (index.clone(), si.field().to_string()))
                                .collect(),
                            rows: table.rows.values().cloned().collect(),
                        };
                        (name.clone(), image)
                    })
                    .collect();
                (db.clone(), tables)
            })
            .collect();
        Ok(Snapshot { databases })
    }

    /// Load a store from a JSON snapshot file; a missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = fs::read_to_string(path).map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot: Snapshot =
            serde_json::from_str(&content).map_err(|source| StoreError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Write the current contents as a JSON snapshot file.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(&self.snapshot()?)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, text).map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn list_databases(&self) -> Result<Vec<String>, DriverError> {
        Ok(self.lock()?.keys().cloned().collect())
    }

    async fn create_database(&self, name: &str) -> Result<(), DriverError> {
        let mut databases = self.lock()?;
        if databases.contains_key(name) {
            return Err(DriverError::DatabaseExists(name.to_string()));
        }
        databases.insert(name.to_string(), Tables::new());
        Ok(())
    }

    async fn drop_database(&self, name: &str) -> Result<(), DriverError> {
        self.lock()?
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| DriverError::DatabaseNotFound(name.to_string()))
    }

    async fn list_tables(&self, db: &str) -> Result<Vec<String>, DriverError> {
        self.with_tables(db, |tables| Ok(tables.keys().cloned().collect()))
    }

    async fn create_table(&self, db: &str, table: &str) -> Result<(), DriverError> {
        self.with_tables(db, |tables| {
            if tables.contains_key(table) {
                return Err(DriverError::TableExists(db.to_string(), table.to_string()));
            }
            tables.insert(table.to_string(), Table::default());
            Ok(())
        })
    }

    async fn drop_table(&self, db: &str, table: &str) -> Result<(), DriverError> {
        self.with_tables(db, |tables| {
            tables
                .remove(table)
                .map(|_| ())
                .ok_or_else(|| DriverError::TableNotFound(db.to_string(), table.to_string()))
        })
    }

    async fn list_indexes(&self, db: &str, table: &str) -> Result<Vec<String>, DriverError> {
        self.with_table(db, table, |t| Ok(t.indexes.keys().cloned().collect()))
    }

    async fn create_index(
        &self,
        db: &str,
        table: &str,
        index: &str,
        field: &str,
    ) -> Result<(), DriverError> {
        self.with_table(db, table, |t| {
            if t.indexes.contains_key(index) {
                return Err(DriverError::IndexExists(table.to_string(), index.to_string()));
            }
            let mut secondary = SecondaryIndex::new(field);
            for (key, row) in &t.rows {
                secondary.insert(key, row);
            }
            t.indexes.insert(index.to_string(), secondary);
            Ok(())
        })
    }

    async fn drop_index(&self, db: &str, table: &str, index: &str) -> Result<(), DriverError> {
        self.with_table(db, table, |t| {
            t.indexes
                .remove(index)
                .map(|_| ())
                .ok_or_else(|| DriverError::IndexNotFound(table.to_string(), index.to_string()))
        })
    }

    async fn insert(
        &self,
        db: &str,
        table: &str,
        rows: Vec<Document>,
    ) -> Result<usize, DriverError> {
        self.with_table(db, table, |t| {
            let mut keyed = Vec::with_capacity(rows.len());
            for row in rows {
                let key = row
                    .get(PRIMARY_KEY)
                    .map(row_key)
                    .ok_or_else(|| DriverError::MissingPrimaryKey(table.to_string()))?;
                if t.rows.contains_key(&key) || keyed.iter().any(|(k, _)| k == &key) {
                    return Err(DriverError::DuplicateKey(table.to_string(), key));
                }
                keyed.push((key, row));
            }
            let inserted = keyed.len();
            for (key, row) in keyed {
                t.insert_row(key, row);
            }
            Ok(inserted)
        })
    }

    async fn get(
        &self,
        db: &str,
        table: &str,
        key: &Value,
    ) -> Result<Option<Document>, DriverError> {
        self.with_table(db, table, |t| Ok(t.rows.get(&row_key(key)).cloned()))
    }

    async fn query(
        &self,
        db: &str,
        table: &str,
        query: &Query,
    ) -> Result<Vec<Document>, DriverError> {
        self.with_table(db, table, |t| Ok(t.select(query)))
    }

    async fn delete(&self, db: &str, table: &str, key: &Value) -> Result<bool, DriverError> {
        self.with_table(db, table, |t| Ok(t.remove_row(&row_key(key))))
    }

    async fn delete_many(
        &self,
        db: &str,
        table: &str,
        keys: &[Value],
    ) -> Result<usize, DriverError> {
        self.with_table(db, table, |t| {
            Ok(keys
                .iter()
                .filter(|key| t.remove_row(&row_key(key)))
                .count())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconsider_core::{DbScope, Filter};
    use rstest::rstest;
    use serde_json::json;
    use tempfile::tempdir;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    async fn store_with_table() -> MemoryDatabase {
        let store = MemoryDatabase::new();
        store.create_database("app").await.unwrap();
        store.create_table("app", "items").await.unwrap();
        store
    }

    fn ids(rows: &[Document]) -> Vec<Value> {
        rows.iter().map(|r| r["id"].clone()).collect()
    }

    #[tokio::test]
    async fn databases_and_tables_are_created_once() {
        let store = MemoryDatabase::new();
        store.create_database("app").await.unwrap();
        assert_eq!(
            store.create_database("app").await.unwrap_err(),
            DriverError::DatabaseExists("app".into())
        );
        assert_eq!(store.list_databases().await.unwrap(), vec!["app"]);

        store.create_table("app", "foo").await.unwrap();
        assert_eq!(
            store.create_table("app", "foo").await.unwrap_err(),
            DriverError::TableExists("app".into(), "foo".into())
        );
        assert_eq!(
            store.list_tables("missing").await.unwrap_err(),
            DriverError::DatabaseNotFound("missing".into())
        );

        store.drop_table("app", "foo").await.unwrap();
        assert!(store.list_tables("app").await.unwrap().is_empty());
        store.drop_database("app").await.unwrap();
        assert!(store.list_databases().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn insert_rejects_duplicates_atomically() {
        let store = store_with_table().await;
        store
            .insert("app", "items", vec![doc(json!({"id": 1}))])
            .await
            .unwrap();

        let err = store
            .insert(
                "app",
                "items",
                vec![doc(json!({"id": 2})), doc(json!({"id": 1}))],
            )
            .await
            .unwrap_err();
        assert_eq!(err, DriverError::DuplicateKey("items".into(), "1".into()));
        assert!(store.get("app", "items", &json!(2)).await.unwrap().is_none());

        let err = store
            .insert("app", "items", vec![doc(json!({"name": "x"}))])
            .await
            .unwrap_err();
        assert_eq!(err, DriverError::MissingPrimaryKey("items".into()));
    }

    #[tokio::test]
    async fn number_and_string_keys_are_distinct() {
        let store = store_with_table().await;
        store
            .insert(
                "app",
                "items",
                vec![doc(json!({"id": 1})), doc(json!({"id": "1"}))],
            )
            .await
            .unwrap();
        assert!(store.delete("app", "items", &json!("1")).await.unwrap());
        assert!(store.get("app", "items", &json!(1)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn query_uses_index_order() {
        let store = store_with_table().await;
        store
            .create_index("app", "items", "by_rank", "rank")
            .await
            .unwrap();
        store
            .insert(
                "app",
                "items",
                vec![
                    doc(json!({"id": "a", "rank": 3})),
                    doc(json!({"id": "b", "rank": 1})),
                    doc(json!({"id": "c", "rank": 2})),
                ],
            )
            .await
            .unwrap();

        let desc = store
            .query("app", "items", &Query::new().order_by("rank", Order::Desc))
            .await
            .unwrap();
        assert_eq!(ids(&desc), vec![json!("a"), json!("c"), json!("b")]);

        store.delete("app", "items", &json!("a")).await.unwrap();
        let asc = store
            .query("app", "items", &Query::new().order_by("rank", Order::Asc).limit(1))
            .await
            .unwrap();
        assert_eq!(ids(&asc), vec![json!("b")]);
    }

    #[rstest]
    #[case::greater_desc(Filter::Gt("size".into(), json!(5)), Order::Desc, &[2, 3])]
    #[case::less_asc(Filter::Lt("size".into(), json!(9)), Order::Asc, &[1, 3])]
    #[case::not_equal(Filter::Ne("size".into(), json!(7)), Order::Asc, &[1, 2])]
    #[case::one_of(Filter::In("id".into(), vec![json!(1), json!(3)]), Order::Desc, &[3, 1])]
    #[case::negated(Filter::Not(Box::new(Filter::Eq("size".into(), json!(9)))), Order::Desc, &[3, 1])]
    #[case::both(
        Filter::And(vec![Filter::Gt("size".into(), json!(4)), Filter::Lt("size".into(), json!(8))]),
        Order::Asc,
        &[1, 3]
    )]
    #[tokio::test]
    async fn query_sorts_and_filters_without_index(
        #[case] filter: Filter,
        #[case] order: Order,
        #[case] expected: &[i64],
    ) {
        let store = store_with_table().await;
        store
            .insert(
                "app",
                "items",
                vec![
                    doc(json!({"id": 1, "size": 5})),
                    doc(json!({"id": 2, "size": 9})),
                    doc(json!({"id": 3, "size": 7})),
                ],
            )
            .await
            .unwrap();

        let rows = store
            .query(
                "app",
                "items",
                &Query::new().filter(filter).order_by("size", order),
            )
            .await
            .unwrap();
        let expected: Vec<Value> = expected.iter().map(|id| json!(id)).collect();
        assert_eq!(ids(&rows), expected);
    }

    #[rstest]
    #[case::desc(Order::Desc, None, &["a", "c", "b"])]
    #[case::asc(Order::Asc, None, &["b", "c", "a"])]
    #[case::asc_limited(Order::Asc, Some(2), &["b", "c"])]
    #[tokio::test]
    async fn indexed_query_follows_order(
        #[case] order: Order,
        #[case] limit: Option<usize>,
        #[case] expected: &[&str],
    ) {
        let store = store_with_table().await;
        store
            .create_index("app", "items", "by_rank", "rank")
            .await
            .unwrap();
        store
            .insert(
                "app",
                "items",
                vec![
                    doc(json!({"id": "a", "rank": 3})),
                    doc(json!({"id": "b", "rank": 1})),
                    doc(json!({"id": "c", "rank": 2})),
                ],
            )
            .await
            .unwrap();

        let mut query = Query::new().order_by("rank", order);
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        let rows = store.query("app", "items", &query).await.unwrap();
        let expected: Vec<Value> = expected.iter().map(|id| json!(id)).collect();
        assert_eq!(ids(&rows), expected);
    }

    #[tokio::test]
    async fn index_lifecycle() {
        let store = store_with_table().await;
        store
            .create_index("app", "items", "by_name", "name")
            .await
            .unwrap();
        assert_eq!(
            store
                .create_index("app", "items", "by_name", "name")
                .await
                .unwrap_err(),
            DriverError::IndexExists("items".into(), "by_name".into())
        );
        assert_eq!(
            store.list_indexes("app", "items").await.unwrap(),
            vec!["by_name"]
        );
        store.drop_index("app", "items", "by_name").await.unwrap();
        assert!(store.drop_index("app", "items", "by_name").await.is_err());
    }

    #[tokio::test]
    async fn delete_many_counts_removed_rows() {
        let store = store_with_table().await;
        let scope = DbScope::new(&store, "app");
        scope
            .insert(
                "items",
                vec![
                    doc(json!({"id": "yes"})),
                    doc(json!({"id": "no"})),
                    doc(json!({"id": "whut"})),
                ],
            )
            .await
            .unwrap();

        let removed = scope
            .delete_many("items", &[json!("yes"), json!("whut"), json!("never")])
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(scope.count("items").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn snapshot_round_trip_rebuilds_indexes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let store = store_with_table().await;
        store
            .create_index("app", "items", "by_rank", "rank")
            .await
            .unwrap();
        store
            .insert(
                "app",
                "items",
                vec![doc(json!({"id": 1, "rank": 2})), doc(json!({"id": 2, "rank": 1}))],
            )
            .await
            .unwrap();
        store.save(&path).unwrap();

        let restored = MemoryDatabase::load(&path).unwrap();
        assert_eq!(restored.snapshot().unwrap(), store.snapshot().unwrap());
        let rows = restored
            .query("app", "items", &Query::new().order_by("rank", Order::Asc))
            .await
            .unwrap();
        assert_eq!(ids(&rows), vec![json!(2), json!(1)]);
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = MemoryDatabase::load(&dir.path().join("absent.json")).unwrap();
        assert!(store.snapshot().unwrap().databases.is_empty());
    }
}
