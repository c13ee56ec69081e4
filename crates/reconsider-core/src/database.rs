use std::cmp::Ordering;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::DriverError;

/// A row: a JSON object whose primary key lives under [`PRIMARY_KEY`].
pub type Document = serde_json::Map<String, Value>;

/// Field holding every row's primary key.
pub const PRIMARY_KEY: &str = "id";

/// Row predicate understood by every driver.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    Ne(String, Value),
    Gt(String, Value),
    Lt(String, Value),
    In(String, Vec<Value>),
    And(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    pub fn is_in(field: impl Into<String>, values: impl IntoIterator<Item = Value>) -> Self {
        Filter::In(field.into(), values.into_iter().collect())
    }

    /// Evaluate the predicate against a row. A missing field compares as `null`.
    pub fn matches(&self, doc: &Document) -> bool {
        let field = |name: &str| doc.get(name).unwrap_or(&Value::Null);
        match self {
            Filter::Eq(name, value) => compare_values(field(name), value) == Ordering::Equal,
            Filter::Ne(name, value) => compare_values(field(name), value) != Ordering::Equal,
            Filter::Gt(name, value) => compare_values(field(name), value) == Ordering::Greater,
            Filter::Lt(name, value) => compare_values(field(name), value) == Ordering::Less,
            Filter::In(name, values) => {
                let actual = field(name);
                values
                    .iter()
                    .any(|v| compare_values(actual, v) == Ordering::Equal)
            }
            Filter::And(filters) => filters.iter().all(|f| f.matches(doc)),
            Filter::Not(inner) => !inner.matches(doc),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

/// Row selection for [`Database::query`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Option<Filter>,
    pub order_by: Option<(String, Order)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, order: Order) -> Self {
        self.order_by = Some((field.into(), order));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Total order over JSON values used for sorting and comparisons.
///
/// Values of different kinds order as null < bool < number < string < array < object.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => {
                let x = x.as_f64().unwrap_or(f64::NAN);
                let y = y.as_f64().unwrap_or(f64::NAN);
                x.total_cmp(&y)
            }
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (l, r) in x.iter().zip(y.iter()) {
                let ord = compare_values(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(_), Value::Object(_)) => a.to_string().cmp(&b.to_string()),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// The capability surface reconsider needs from a document database.
///
/// Every method is a round-trip to the store. Implementations decide how
/// secondary indexes back `order_by`; callers only rely on the result order.
#[async_trait]
pub trait Database: Send + Sync {
    async fn list_databases(&self) -> Result<Vec<String>, DriverError>;

    async fn create_database(&self, name: &str) -> Result<(), DriverError>;

    async fn drop_database(&self, name: &str) -> Result<(), DriverError>;

    async fn list_tables(&self, db: &str) -> Result<Vec<String>, DriverError>;

    async fn create_table(&self, db: &str, table: &str) -> Result<(), DriverError>;

    async fn drop_table(&self, db: &str, table: &str) -> Result<(), DriverError>;

    async fn list_indexes(&self, db: &str, table: &str) -> Result<Vec<String>, DriverError>;

    /// Create a secondary index named `index` over `field`.
    async fn create_index(
        &self,
        db: &str,
        table: &str,
        index: &str,
        field: &str,
    ) -> Result<(), DriverError>;

    async fn drop_index(&self, db: &str, table: &str, index: &str) -> Result<(), DriverError>;

    /// Insert rows, failing on the first duplicate primary key. Returns the number inserted.
    async fn insert(&self, db: &str, table: &str, rows: Vec<Document>)
    -> Result<usize, DriverError>;

    async fn get(&self, db: &str, table: &str, key: &Value)
    -> Result<Option<Document>, DriverError>;

    async fn query(&self, db: &str, table: &str, query: &Query)
    -> Result<Vec<Document>, DriverError>;

    /// Delete by primary key. Returns whether a row was removed.
    async fn delete(&self, db: &str, table: &str, key: &Value) -> Result<bool, DriverError>;

    /// Delete every row whose key is in `keys`. Returns the number removed.
    async fn delete_many(&self, db: &str, table: &str, keys: &[Value])
    -> Result<usize, DriverError>;
}

/// A driver bound to one database; this is the handle migrations receive.
#[derive(Clone, Copy)]
pub struct DbScope<'a> {
    driver: &'a dyn Database,
    name: &'a str,
}

impl<'a> DbScope<'a> {
    pub fn new(driver: &'a dyn Database, name: &'a str) -> Self {
        Self { driver, name }
    }

    /// Name of the bound database.
    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn driver(&self) -> &'a dyn Database {
        self.driver
    }

    pub async fn table_list(&self) -> Result<Vec<String>, DriverError> {
        self.driver.list_tables(self.name).await
    }

    pub async fn table_create(&self, table: &str) -> Result<(), DriverError> {
        self.driver.create_table(self.name, table).await
    }

    pub async fn table_drop(&self, table: &str) -> Result<(), DriverError> {
        self.driver.drop_table(self.name, table).await
    }

    pub async fn index_list(&self, table: &str) -> Result<Vec<String>, DriverError> {
        self.driver.list_indexes(self.name, table).await
    }

    pub async fn index_create(
        &self,
        table: &str,
        index: &str,
        field: &str,
    ) -> Result<(), DriverError> {
        self.driver.create_index(self.name, table, index, field).await
    }

    pub async fn index_drop(&self, table: &str, index: &str) -> Result<(), DriverError> {
        self.driver.drop_index(self.name, table, index).await
    }

    pub async fn insert(&self, table: &str, rows: Vec<Document>) -> Result<usize, DriverError> {
        self.driver.insert(self.name, table, rows).await
    }

    pub async fn get(&self, table: &str, key: &Value) -> Result<Option<Document>, DriverError> {
        self.driver.get(self.name, table, key).await
    }

    pub async fn query(&self, table: &str, query: &Query) -> Result<Vec<Document>, DriverError> {
        self.driver.query(self.name, table, query).await
    }

    /// Number of rows in `table`.
    pub async fn count(&self, table: &str) -> Result<usize, DriverError> {
        Ok(self.query(table, &Query::new()).await?.len())
    }

    pub async fn delete(&self, table: &str, key: &Value) -> Result<bool, DriverError> {
        self.driver.delete(self.name, table, key).await
    }

    pub async fn delete_many(&self, table: &str, keys: &[Value]) -> Result<usize, DriverError> {
        self.driver.delete_many(self.name, table, keys).await
    }
}

impl std::fmt::Debug for DbScope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbScope").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[rstest]
    #[case(json!(null), json!(false), Ordering::Less)]
    #[case(json!(1), json!(2), Ordering::Less)]
    #[case(json!(2.5), json!(2), Ordering::Greater)]
    #[case(json!("b"), json!("a"), Ordering::Greater)]
    #[case(json!(10), json!("1"), Ordering::Less)]
    #[case(json!([1, 2]), json!([1, 2, 0]), Ordering::Less)]
    #[case(json!("2024-01-01T00:00:00.000000Z"), json!("2024-01-01T00:00:00.000001Z"), Ordering::Less)]
    fn compare_values_orders(#[case] a: Value, #[case] b: Value, #[case] expected: Ordering) {
        assert_eq!(compare_values(&a, &b), expected);
    }

    #[test]
    fn filter_matches_rows() {
        let row = doc(json!({"id": 3, "name": "baz", "size": 10}));

        assert!(Filter::eq("name", "baz").matches(&row));
        assert!(!Filter::eq("name", "bar").matches(&row));
        assert!(Filter::is_in("id", vec![json!(1), json!(3)]).matches(&row));
        assert!(Filter::Gt("size".into(), json!(5)).matches(&row));
        assert!(Filter::Lt("size".into(), json!(50)).matches(&row));
        assert!(Filter::Not(Box::new(Filter::eq("id", 4))).matches(&row));
        assert!(
            Filter::And(vec![Filter::eq("id", 3), Filter::Ne("name".into(), json!("x"))])
                .matches(&row)
        );
    }

    #[test]
    fn filter_treats_missing_fields_as_null() {
        let row = doc(json!({"id": 1}));
        assert!(Filter::Eq("missing".into(), Value::Null).matches(&row));
        assert!(!Filter::eq("missing", 1).matches(&row));
    }

    #[test]
    fn query_builder_sets_fields() {
        let query = Query::new()
            .filter(Filter::eq("id", 1))
            .order_by("completed", Order::Desc)
            .limit(5);

        assert_eq!(query.order_by, Some(("completed".to_string(), Order::Desc)));
        assert_eq!(query.limit, Some(5));
        assert!(query.filter.is_some());
    }
}
