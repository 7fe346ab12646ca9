//! The statement execution capability the mapper is built on.

use crate::error::OrmError;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// One result row keyed by column name.
pub type Row = Map<String, Value>;

/// Placeholder in table names that a port replaces with its physical table prefix.
pub const TABLE_PREFIX_PLACEHOLDER: &str = "*PREFIX*";

/// Executes parameterized statements. SQL uses positional `?` placeholders and
/// table names may carry [`TABLE_PREFIX_PLACEHOLDER`]; both are the port's to resolve.
#[async_trait]
pub trait ExecutionPort: Send + Sync {
    /// Run one statement and return every row it produced (none for writes).
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, OrmError>;

    /// Identifier generated by the last insert into `table`.
    async fn last_insert_id(&self, table: &str) -> Result<i64, OrmError>;
}
