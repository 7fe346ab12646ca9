//! Generic CRUD for one table: rows to entities, dirty entities to statements.

use crate::case::property_to_column;
use crate::entity::Entity;
use crate::error::{OrmError, OrmResult};
use crate::port::{ExecutionPort, Row, TABLE_PREFIX_PLACEHOLDER};
use crate::sql::{delete, insert, update};
use serde_json::Value;
use std::sync::Arc;

/// Turns a row into an entity. Defaults to [`Entity::from_row`].
pub type EntityFactory<E> = Arc<dyn Fn(&Row) -> OrmResult<E> + Send + Sync>;

/// CRUD executor bound to a logical table and an entity factory.
///
/// Every call issues one statement through the port (inserts add a
/// last-insert-id lookup) and keeps no state between calls.
pub struct Mapper<E> {
    port: Arc<dyn ExecutionPort>,
    table_name: String,
    factory: EntityFactory<E>,
}

impl<E> Clone for Mapper<E> {
    fn clone(&self) -> Self {
        Mapper {
            port: Arc::clone(&self.port),
            table_name: self.table_name.clone(),
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<E: Entity> Mapper<E> {
    /// Bind to `table` (without prefix), mapping rows with `E::from_row`.
    pub fn new(port: Arc<dyn ExecutionPort>, table: &str) -> Self {
        Self::with_factory(port, table, E::from_row)
    }

    pub fn with_factory<F>(port: Arc<dyn ExecutionPort>, table: &str, factory: F) -> Self
    where
        F: Fn(&Row) -> OrmResult<E> + Send + Sync + 'static,
    {
        Mapper {
            port,
            table_name: format!("{}{}", TABLE_PREFIX_PLACEHOLDER, table),
            factory: Arc::new(factory),
        }
    }

    /// Logical table name, e.g. `*PREFIX*notes`.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Exactly one row or `DoesNotExist` / `MultipleObjectsReturned`.
    pub async fn find_one_query(&self, sql: &str, params: &[Value]) -> OrmResult<Row> {
        let mut rows = self.port.execute(sql, params).await?;
        if rows.len() > 1 {
            return Err(OrmError::MultipleObjectsReturned {
                sql: sql.to_string(),
                count: rows.len(),
            });
        }
        rows.pop().ok_or_else(|| OrmError::DoesNotExist {
            sql: sql.to_string(),
        })
    }

    /// [`Mapper::find_one_query`] mapped through the entity factory.
    pub async fn find_entity(&self, sql: &str, params: &[Value]) -> OrmResult<E> {
        let row = self.find_one_query(sql, params).await?;
        self.map_row_to_entity(&row)
    }

    /// All rows as returned; an empty result is not an error.
    pub async fn find_all_query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        self.port.execute(sql, params).await
    }

    pub async fn find_entities(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<E>> {
        let rows = self.find_all_query(sql, params).await?;
        rows.iter().map(|row| self.map_row_to_entity(row)).collect()
    }

    pub fn map_row_to_entity(&self, row: &Row) -> OrmResult<E> {
        (self.factory)(row)
    }

    /// Insert the dirty fields (except `id`) and store the generated id on the
    /// entity. The dirty set is left as it was.
    pub async fn insert(&self, mut entity: E) -> OrmResult<E> {
        let fields = dirty_columns(&entity);
        let q = insert(&self.table_name, &fields);
        self.port.execute(&q.sql, &q.params).await?;
        let id = self.port.last_insert_id(&self.table_name).await?;
        tracing::debug!(table = %self.table_name, id, "inserted");
        entity.assign_id(id);
        Ok(entity)
    }

    /// Write the dirty fields (except `id`) of a persisted entity. The id is
    /// bound as assigned; only an unset or null id is rejected.
    pub async fn update(&self, entity: &E) -> OrmResult<()> {
        let id = entity.id_value().ok_or_else(|| {
            OrmError::InvalidArgument("entity has no id, cannot update".into())
        })?;
        let fields = dirty_columns(entity);
        if fields.is_empty() {
            tracing::debug!(table = %self.table_name, id = %id, "no updated fields, skipping update");
            return Ok(());
        }
        let q = update(&self.table_name, &fields, id);
        self.port.execute(&q.sql, &q.params).await?;
        Ok(())
    }

    pub async fn delete(&self, entity: &E) -> OrmResult<()> {
        let id = entity.id_value().ok_or_else(|| {
            OrmError::InvalidArgument("entity has no id, cannot delete".into())
        })?;
        self.delete_query(&self.table_name, id).await
    }

    /// Delete the row with `id` from `table` (a logical name, prefix placeholder included).
    pub async fn delete_query(&self, table: &str, id: &Value) -> OrmResult<()> {
        let q = delete(table, id);
        self.port.execute(&q.sql, &q.params).await?;
        Ok(())
    }
}

/// (column, value) for each dirty field except `id`, in the order the fields became dirty.
fn dirty_columns<E: Entity>(entity: &E) -> Vec<(String, Value)> {
    let descriptor = E::descriptor();
    entity
        .updated_fields()
        .iter()
        .filter(|property| property.as_str() != "id")
        .map(|property| {
            let column = descriptor
                .field(property)
                .map(|f| f.column().to_string())
                .unwrap_or_else(|| property_to_column(property));
            let value = entity.state().value(property).cloned().unwrap_or(Value::Null);
            (column, value)
        })
        .collect()
}
