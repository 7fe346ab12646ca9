//! Scripted execution port for exercising mappers without a database.
//!
//! Each expected statement is matched in order against what the mapper runs;
//! a mismatch or an unscripted call fails the port call with [`ScriptError`].

use crate::error::OrmError;
use crate::port::{ExecutionPort, Row};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScriptError {
    #[error("unexpected statement {sql} with params {params:?}; expected {expected}")]
    UnexpectedStatement {
        sql: String,
        params: Vec<Value>,
        expected: String,
    },
    #[error("unexpected last insert id lookup for {table}; expected {expected}")]
    UnexpectedInsertIdLookup { table: String, expected: String },
}

#[derive(Clone, Debug)]
enum Expectation {
    Statement {
        sql: String,
        params: Vec<Value>,
        rows: Vec<Row>,
    },
    InsertId {
        table: String,
        id: i64,
    },
}

impl Expectation {
    fn describe(&self) -> String {
        match self {
            Expectation::Statement { sql, params, .. } => format!("{} with params {:?}", sql, params),
            Expectation::InsertId { table, .. } => format!("last insert id of {}", table),
        }
    }
}

#[derive(Default)]
struct Script {
    expected: VecDeque<Expectation>,
    executed: Vec<(String, Vec<Value>)>,
    insert_id_lookups: Vec<String>,
}

#[derive(Default)]
pub struct ScriptedPort {
    script: Mutex<Script>,
}

impl ScriptedPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expect `sql` with `params` next and answer it with `rows`.
    pub fn expect_query(&self, sql: &str, params: Vec<Value>, rows: Vec<Row>) -> &Self {
        self.lock().expected.push_back(Expectation::Statement {
            sql: sql.to_string(),
            params,
            rows,
        });
        self
    }

    /// Expect a write statement that returns no rows.
    pub fn expect_statement(&self, sql: &str, params: Vec<Value>) -> &Self {
        self.expect_query(sql, params, Vec::new())
    }

    /// Expect a last-insert-id lookup for `table` and answer it with `id`.
    pub fn expect_insert_id(&self, table: &str, id: i64) -> &Self {
        self.lock().expected.push_back(Expectation::InsertId {
            table: table.to_string(),
            id,
        });
        self
    }

    /// Every statement executed so far, in order.
    pub fn executed(&self) -> Vec<(String, Vec<Value>)> {
        self.lock().executed.clone()
    }

    pub fn insert_id_lookups(&self) -> Vec<String> {
        self.lock().insert_id_lookups.clone()
    }

    /// True when every scripted expectation has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.lock().expected.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ExecutionPort for ScriptedPort {
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, OrmError> {
        let mut script = self.lock();
        script.executed.push((sql.to_string(), params.to_vec()));
        match script.expected.pop_front() {
            Some(Expectation::Statement {
                sql: want_sql,
                params: want_params,
                rows,
            }) if want_sql == sql && want_params.as_slice() == params => Ok(rows),
            other => Err(OrmError::execution(ScriptError::UnexpectedStatement {
                sql: sql.to_string(),
                params: params.to_vec(),
                expected: other
                    .map(|e| e.describe())
                    .unwrap_or_else(|| "nothing".into()),
            })),
        }
    }

    async fn last_insert_id(&self, table: &str) -> Result<i64, OrmError> {
        let mut script = self.lock();
        script.insert_id_lookups.push(table.to_string());
        match script.expected.pop_front() {
            Some(Expectation::InsertId { table: want, id }) if want == table => Ok(id),
            other => Err(OrmError::execution(ScriptError::UnexpectedInsertIdLookup {
                table: table.to_string(),
                expected: other
                    .map(|e| e.describe())
                    .unwrap_or_else(|| "nothing".into()),
            })),
        }
    }
}
