//! Connection settings for the PostgreSQL execution port, read from the environment.

use crate::error::OrmError;
use serde::Serialize;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/app";
pub const DEFAULT_TABLE_PREFIX: &str = "oc_";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DbConfig {
    pub database_url: String,
    /// Physical prefix substituted for `*PREFIX*` in table names.
    pub table_prefix: String,
    pub max_connections: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        DbConfig {
            database_url: DEFAULT_DATABASE_URL.into(),
            table_prefix: DEFAULT_TABLE_PREFIX.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl DbConfig {
    /// From env `DATABASE_URL`, `TABLE_PREFIX` and `DB_MAX_CONNECTIONS`, with defaults.
    pub fn from_env() -> Result<Self, OrmError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`DbConfig::from_env`] over an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, OrmError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = DbConfig::default();
        let max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => {
                let n: u32 = raw.trim().parse().map_err(|_| {
                    OrmError::Config(format!("DB_MAX_CONNECTIONS must be a positive integer, got '{}'", raw))
                })?;
                if n == 0 {
                    return Err(OrmError::Config("DB_MAX_CONNECTIONS must be at least 1".into()));
                }
                n
            }
            None => defaults.max_connections,
        };
        Ok(DbConfig {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            table_prefix: lookup("TABLE_PREFIX").unwrap_or(defaults.table_prefix),
            max_connections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = DbConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, DbConfig::default());
    }

    #[test]
    fn reads_every_key() {
        let config = DbConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/notes"),
            ("TABLE_PREFIX", "app_"),
            ("DB_MAX_CONNECTIONS", "12"),
        ]))
        .unwrap();
        assert_eq!(config.database_url, "postgres://db/notes");
        assert_eq!(config.table_prefix, "app_");
        assert_eq!(config.max_connections, 12);
    }

    #[test]
    fn rejects_bad_pool_size() {
        assert!(matches!(
            DbConfig::from_lookup(lookup(&[("DB_MAX_CONNECTIONS", "many")])),
            Err(OrmError::Config(_))
        ));
        assert!(DbConfig::from_lookup(lookup(&[("DB_MAX_CONNECTIONS", "0")])).is_err());
    }
}
