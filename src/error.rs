//! Typed errors for entities, the mapper and execution ports.

use crate::entity::FieldType;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrmError {
    #[error("{0} is not a valid attribute")]
    UnknownAttribute(String),
    #[error("{0} does not exist")]
    UnsupportedOperation(String),
    #[error("no matching entry found for query: {sql}")]
    DoesNotExist { sql: String },
    #[error("expected one result, got {count} for query: {sql}")]
    MultipleObjectsReturned { sql: String, count: usize },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("cannot coerce {value} to {kind} for field {field}")]
    Coercion {
        field: String,
        kind: FieldType,
        value: Value,
    },
    #[error("no insert id recorded for table {table}")]
    NoInsertId { table: String },
    #[error("config: {0}")]
    Config(String),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
    #[error(transparent)]
    Execution(Box<dyn std::error::Error + Send + Sync>),
}

impl OrmError {
    /// Wrap a failure raised by a non-sqlx execution port, keeping it as the source.
    pub fn execution(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        OrmError::Execution(Box::new(err))
    }

    /// True for the two single-result cardinality failures.
    pub fn is_cardinality(&self) -> bool {
        matches!(
            self,
            OrmError::DoesNotExist { .. } | OrmError::MultipleObjectsReturned { .. }
        )
    }
}

pub type OrmResult<T> = Result<T, OrmError>;
