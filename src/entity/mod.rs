//! Change-tracked row objects.
//!
//! A concrete entity is a struct holding an [`EntityState`] plus a static
//! [`EntityDescriptor`] listing its attributes. The [`entity!`](crate::entity!)
//! macro generates both.

mod descriptor;
mod macros;

pub use descriptor::*;

use crate::case::{column_to_property, lower_first, upper_first};
use crate::error::{OrmError, OrmResult};
use crate::port::Row;
use indexmap::IndexSet;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Attribute values and dirty set of one entity instance.
///
/// Equality ignores the order in which fields became dirty.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntityState {
    values: HashMap<String, Value>,
    /// Row columns with no declared property; kept as loaded, never dirty.
    extras: HashMap<String, Value>,
    updated: IndexSet<String>,
}

impl EntityState {
    /// Current value of a declared property, `None` when never assigned.
    pub fn value(&self, property: &str) -> Option<&Value> {
        self.values.get(property)
    }

    pub fn extras(&self) -> &HashMap<String, Value> {
        &self.extras
    }

    fn assign(&mut self, property: &str, value: Value) {
        self.values.insert(property.to_string(), value);
    }
}

/// A single-row domain object with name-based attribute access and dirty tracking.
pub trait Entity: Default + Send + Sync + 'static {
    /// Declared fields of this type. Built once; `id` is always present.
    fn descriptor() -> &'static EntityDescriptor;

    fn state(&self) -> &EntityState;

    fn state_mut(&mut self) -> &mut EntityState;

    /// Build an instance from a storage row. Nothing is marked dirty.
    fn from_row(row: &Row) -> OrmResult<Self> {
        let mut entity = Self::default();
        entity.load_row(row)?;
        Ok(entity)
    }

    /// Build an instance through the setter path: every key becomes dirty and
    /// undeclared keys fail with `UnknownAttribute`.
    fn from_params<I, K, V>(params: I) -> OrmResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut entity = Self::default();
        for (key, value) in params {
            let method = format!("set{}", upper_first(key.as_ref()));
            entity.invoke(&method, vec![value.into()])?;
        }
        Ok(entity)
    }

    /// Copy a row onto this instance, coercing typed fields. Bypasses dirty tracking.
    ///
    /// Columns without a declared property are kept in [`EntityState::extras`]
    /// under their property name but are not attributes: `get`/`set` and the
    /// `getX`/`setX` calls still reject them, and they are never written back.
    fn load_row(&mut self, row: &Row) -> OrmResult<&mut Self> {
        let descriptor = Self::descriptor();
        for (column, value) in row {
            let property = column_to_property(column);
            let value = match descriptor.kind(&property) {
                Some(kind) if !value.is_null() => kind.coerce(&property, value.clone())?,
                _ => value.clone(),
            };
            let state = self.state_mut();
            if descriptor.is_declared(&property) {
                state.assign(&property, value);
            } else {
                state.extras.insert(property, value);
            }
        }
        Ok(self)
    }

    /// Read a declared attribute; `Null` when unset.
    fn get(&self, attr: &str) -> OrmResult<Value> {
        if !Self::descriptor().is_declared(attr) {
            return Err(OrmError::UnknownAttribute(attr.to_string()));
        }
        Ok(self.state().value(attr).cloned().unwrap_or(Value::Null))
    }

    /// Assign a declared attribute as-is and mark it dirty.
    fn set(&mut self, attr: &str, value: impl Into<Value>) -> OrmResult<()> {
        if !Self::descriptor().is_declared(attr) {
            return Err(OrmError::UnknownAttribute(attr.to_string()));
        }
        self.mark_field_updated(attr);
        self.state_mut().assign(attr, value.into());
        Ok(())
    }

    /// Dispatch a `setX`/`getX` call by name. Setters return `None`, getters
    /// the current value; a setter without arguments assigns `Null`.
    fn invoke(&mut self, method: &str, args: Vec<Value>) -> OrmResult<Option<Value>> {
        if let Some(rest) = method.strip_prefix("set") {
            let value = args.into_iter().next().unwrap_or(Value::Null);
            self.set(&lower_first(rest), value)?;
            Ok(None)
        } else if let Some(rest) = method.strip_prefix("get") {
            self.get(&lower_first(rest)).map(Some)
        } else {
            Err(OrmError::UnsupportedOperation(method.to_string()))
        }
    }

    /// The id as an integer; `None` when unset or not an integer (see [`Entity::id_value`]).
    fn id(&self) -> Option<i64> {
        self.state().value("id").and_then(Value::as_i64)
    }

    /// The id exactly as assigned, `None` only when unset or `Null`.
    fn id_value(&self) -> Option<&Value> {
        self.state().value("id").filter(|v| !v.is_null())
    }

    /// Setter for `id`; marks it dirty like any other setter.
    fn set_id(&mut self, id: i64) {
        self.mark_field_updated("id");
        self.state_mut().assign("id", Value::from(id));
    }

    /// Store an id obtained from storage without touching the dirty set.
    fn assign_id(&mut self, id: i64) {
        self.state_mut().assign("id", Value::from(id));
    }

    fn mark_field_updated(&mut self, attr: &str) {
        self.state_mut().updated.insert(attr.to_string());
    }

    /// Attributes assigned through setters since construction or the last reset,
    /// in assignment order.
    fn updated_fields(&self) -> &IndexSet<String> {
        &self.state().updated
    }

    fn reset_updated_fields(&mut self) {
        self.state_mut().updated.clear();
    }

    /// Lowercased, dash-separated form of an attribute's value. Not unique.
    fn slugify(&self, attr: &str) -> OrmResult<String> {
        let value = match self.get(attr)? {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        };
        Ok(slug(&value))
    }
}

fn slug(value: &str) -> String {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    let separator =
        SEPARATOR.get_or_init(|| Regex::new(r"[^A-Za-z0-9]+").expect("slug pattern is valid"));
    separator
        .replace_all(value, "-")
        .to_lowercase()
        .trim_matches('-')
        .to_string()
}
