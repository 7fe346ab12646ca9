//! PostgreSQL execution port over an sqlx pool.

use crate::config::DbConfig;
use crate::error::OrmError;
use crate::port::{ExecutionPort, Row};
use crate::sql::{prepare_query, returning_id, PgBindValue};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Last generated id per physical table name, shared by clones of a port.
#[derive(Clone, Debug, Default)]
pub struct InsertIds {
    by_table: Arc<Mutex<HashMap<String, i64>>>,
}

impl InsertIds {
    /// Record the id an INSERT returned; `None` forgets any earlier id so a
    /// stale one is never reported for this table.
    pub fn record(&self, table: String, id: Option<i64>) {
        let mut by_table = self.lock();
        match id {
            Some(id) => {
                by_table.insert(table, id);
            }
            None => {
                by_table.remove(&table);
            }
        }
    }

    pub fn last(&self, table: &str) -> Result<i64, OrmError> {
        self.lock()
            .get(table)
            .copied()
            .ok_or_else(|| OrmError::NoInsertId {
                table: table.to_string(),
            })
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, i64>> {
        self.by_table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Runs mapper statements on PostgreSQL: resolves `*PREFIX*`, numbers `?`
/// placeholders and decodes rows into JSON values.
///
/// INSERTs without a RETURNING clause get `RETURNING id` appended, and the
/// returned id is kept per table for [`ExecutionPort::last_insert_id`]. Raw
/// inserts into tables without an `id` column must bring their own RETURNING.
#[derive(Clone)]
pub struct PgExecutionPort {
    pool: PgPool,
    table_prefix: String,
    insert_ids: InsertIds,
}

impl PgExecutionPort {
    pub fn new(pool: PgPool, table_prefix: impl Into<String>) -> Self {
        PgExecutionPort {
            pool,
            table_prefix: table_prefix.into(),
            insert_ids: InsertIds::default(),
        }
    }

    /// Open a pool from `config`.
    pub async fn connect(config: &DbConfig) -> Result<Self, OrmError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;
        Ok(Self::new(pool, config.table_prefix.clone()))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    /// Physical table name for a logical `*PREFIX*name`.
    pub fn resolve_table(&self, table: &str) -> String {
        prepare_query(table, &self.table_prefix)
    }
}

#[async_trait]
impl ExecutionPort for PgExecutionPort {
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, OrmError> {
        let prepared = prepare_query(sql, &self.table_prefix);
        let returning = returning_id(&prepared);
        let statement = returning
            .as_ref()
            .map(|(_, s)| s.as_str())
            .unwrap_or(prepared.as_str());
        tracing::debug!(sql = %statement, params = ?params, "query");
        let mut query = sqlx::query(statement);
        for p in params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let rows = query.fetch_all(&self.pool).await?;
        let Some((table, _)) = returning else {
            return Ok(rows.iter().map(row_to_map).collect());
        };
        let id = rows.first().and_then(|r| cell_to_value(r, "id").as_i64());
        self.insert_ids.record(table, id);
        Ok(Vec::new())
    }

    /// Id returned by the last INSERT this port ran against `table`. The id is
    /// read from the INSERT itself, so it is correct whichever pooled
    /// connection served the statement.
    async fn last_insert_id(&self, table: &str) -> Result<i64, OrmError> {
        self.insert_ids.last(&self.resolve_table(table))
    }
}

fn row_to_map(row: &PgRow) -> Row {
    use sqlx::Column;
    use sqlx::Row as _;
    let mut map = Row::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    map
}

fn cell_to_value(row: &PgRow, name: &str) -> Value {
    use sqlx::Row as _;
    if let Ok(Some(n)) = row.try_get::<Option<i16>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f32>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n as f64) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(u)) = row.try_get::<Option<uuid::Uuid>, _>(name) {
        return Value::String(u.to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(name) {
        return Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(name) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<serde_json::Value>, _>(name) {
        return j;
    }
    Value::Null
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_ids_are_kept_per_table() {
        let ids = InsertIds::default();
        ids.record("oc_notes".into(), Some(3));
        ids.record("oc_tags".into(), Some(8));
        ids.record("oc_notes".into(), Some(4));
        assert_eq!(ids.last("oc_notes").unwrap(), 4);
        assert_eq!(ids.last("oc_tags").unwrap(), 8);
    }

    #[test]
    fn missing_or_forgotten_id_is_an_error() {
        let ids = InsertIds::default();
        assert!(matches!(ids.last("oc_notes"), Err(OrmError::NoInsertId { .. })));
        ids.record("oc_notes".into(), Some(3));
        ids.record("oc_notes".into(), None);
        assert!(matches!(ids.last("oc_notes"), Err(OrmError::NoInsertId { table }) if table == "oc_notes"));
    }

    #[test]
    fn clones_share_recorded_ids() {
        let ids = InsertIds::default();
        let shared = ids.clone();
        ids.record("oc_notes".into(), Some(11));
        assert_eq!(shared.last("oc_notes").unwrap(), 11);
    }
}
