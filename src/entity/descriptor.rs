//! Per-type field registry: declared properties, their columns and coercion kinds.

use crate::case::property_to_column;
use crate::error::OrmError;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::HashMap;
use std::fmt;

/// Primitive kinds a row value can be coerced to when loaded from storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Integer,
    String,
    Boolean,
    Float,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Integer => "integer",
            FieldType::String => "string",
            FieldType::Boolean => "boolean",
            FieldType::Float => "float",
        };
        f.write_str(name)
    }
}

impl FieldType {
    /// Convert `value` to this kind. Null passes through; anything without an
    /// exact conversion (e.g. "abc" as integer, 1.5 as integer, arrays) is a
    /// `Coercion` error naming `field`.
    pub fn coerce(self, field: &str, value: Value) -> Result<Value, OrmError> {
        let coerced = match (self, &value) {
            (_, Value::Null) => Some(Value::Null),
            (FieldType::Integer, Value::Number(n)) => integer_from_number(n).map(Value::from),
            (FieldType::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),
            (FieldType::Integer, Value::Bool(b)) => Some(Value::from(i64::from(*b))),
            (FieldType::Float, Value::Number(n)) => n.as_f64().and_then(Number::from_f64).map(Value::Number),
            (FieldType::Float, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),
            (FieldType::Float, Value::Bool(b)) => {
                Number::from_f64(if *b { 1.0 } else { 0.0 }).map(Value::Number)
            }
            (FieldType::String, Value::String(_)) => Some(value.clone()),
            (FieldType::String, Value::Number(n)) => Some(Value::String(n.to_string())),
            (FieldType::String, Value::Bool(b)) => Some(Value::String(b.to_string())),
            (FieldType::Boolean, Value::Bool(_)) => Some(value.clone()),
            (FieldType::Boolean, Value::Number(n)) => n.as_f64().map(|f| Value::Bool(f != 0.0)),
            (FieldType::Boolean, Value::String(s)) => parse_bool(s).map(Value::Bool),
            _ => None,
        };
        coerced.ok_or_else(|| OrmError::Coercion {
            field: field.to_string(),
            kind: self,
            value,
        })
    }
}

fn integer_from_number(n: &Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    let f = n.as_f64()?;
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "y" | "yes" | "on" => Some(true),
        "0" | "f" | "false" | "n" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// One declared attribute of an entity type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    property: String,
    column: String,
    kind: Option<FieldType>,
}

impl FieldDescriptor {
    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn kind(&self) -> Option<FieldType> {
        self.kind
    }
}

/// Field registry of one entity type. Built once per type and shared.
#[derive(Clone, Debug)]
pub struct EntityDescriptor {
    name: &'static str,
    fields: Vec<FieldDescriptor>,
    by_property: HashMap<String, usize>,
}

impl EntityDescriptor {
    /// Start a registry for `name`. `id` is always declared as an integer field.
    pub fn builder(name: &'static str) -> EntityDescriptorBuilder {
        EntityDescriptorBuilder {
            name,
            fields: Vec::new(),
        }
        .add_type("id", FieldType::Integer)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared fields in declaration order, `id` first.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, property: &str) -> Option<&FieldDescriptor> {
        self.by_property.get(property).map(|&i| &self.fields[i])
    }

    pub fn is_declared(&self, property: &str) -> bool {
        self.by_property.contains_key(property)
    }

    pub fn kind(&self, property: &str) -> Option<FieldType> {
        self.field(property).and_then(FieldDescriptor::kind)
    }
}

pub struct EntityDescriptorBuilder {
    name: &'static str,
    fields: Vec<FieldDescriptor>,
}

impl EntityDescriptorBuilder {
    /// Declare an untyped attribute. Declaring the same property twice is a no-op.
    pub fn field(self, property: &str) -> Self {
        self.declare(property, None)
    }

    /// Register a coercion kind for `property`, declaring it if needed.
    pub fn add_type(self, property: &str, kind: FieldType) -> Self {
        self.declare(property, Some(kind))
    }

    /// Declare `property` with an optional kind in one step.
    pub fn declare(mut self, property: &str, kind: Option<FieldType>) -> Self {
        if let Some(existing) = self.fields.iter_mut().find(|f| f.property == property) {
            if kind.is_some() {
                existing.kind = kind;
            }
            return self;
        }
        self.fields.push(FieldDescriptor {
            property: property.to_string(),
            column: property_to_column(property),
            kind,
        });
        self
    }

    pub fn build(self) -> EntityDescriptor {
        let by_property = self
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.property.clone(), i))
            .collect();
        EntityDescriptor {
            name: self.name,
            fields: self.fields,
            by_property,
        }
    }
}
