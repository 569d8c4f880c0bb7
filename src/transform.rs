//! Value transforms between storage and domain form: objectify, scalarize, replicate.
//!
//! Each transform consults a per-entity, per-column override before the built-in behavior.

use crate::cache;
use crate::schema::{ColumnType, Schema};
use crate::value::{Date, Time, Timestamp, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

/// Override for one column: `(entity_type, column, value) -> value`.
pub type TransformHandler = Arc<dyn Fn(&str, &str, Value) -> Value + Send + Sync>;

type Overrides = HashMap<String, HashMap<String, TransformHandler>>;

fn lookup<'a>(overrides: &'a Overrides, entity_type: &str, column: &str) -> Option<&'a TransformHandler> {
    overrides.get(entity_type).and_then(|columns| columns.get(column))
}

fn column_key(entity_type: &str, column: &str) -> String {
    format!("{}::{}", entity_type, column)
}

#[derive(Default)]
pub struct TransformPipeline {
    objectify: Overrides,
    scalarize: Overrides,
    replicate: Overrides,
    /// `entity::column` pairs known to need no objectification.
    never_objectified: RwLock<HashSet<String>>,
}

impl TransformPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_objectify(
        &mut self,
        entity_type: impl Into<String>,
        column: impl Into<String>,
        handler: TransformHandler,
    ) {
        self.objectify
            .entry(entity_type.into())
            .or_default()
            .insert(column.into(), handler);
        cache::get_mut(&mut self.never_objectified).clear();
    }

    pub fn register_scalarize(
        &mut self,
        entity_type: impl Into<String>,
        column: impl Into<String>,
        handler: TransformHandler,
    ) {
        self.scalarize
            .entry(entity_type.into())
            .or_default()
            .insert(column.into(), handler);
    }

    pub fn register_replicate(
        &mut self,
        entity_type: impl Into<String>,
        column: impl Into<String>,
        handler: TransformHandler,
    ) {
        self.replicate
            .entry(entity_type.into())
            .or_default()
            .insert(column.into(), handler);
        cache::get_mut(&mut self.never_objectified).clear();
    }

    /// Storage value -> domain value. Date, time and timestamp columns become `Value::Date` etc.
    /// A value that does not parse is returned unchanged.
    pub fn objectify(
        &self,
        schema: &dyn Schema,
        table: &str,
        entity_type: &str,
        column: &str,
        value: Value,
    ) -> Value {
        let key = column_key(entity_type, column);
        if cache::read(&self.never_objectified).contains(&key) {
            return value;
        }

        if let Some(handler) = lookup(&self.objectify, entity_type, column) {
            return handler(entity_type, column, value);
        }

        let parsed = match schema.column_type(table, column) {
            Some(ColumnType::Date) if !value.is_null() => Date::parse(&value).map(Value::Date),
            Some(ColumnType::Time) if !value.is_null() => Time::parse(&value).map(Value::Time),
            Some(ColumnType::Timestamp) if !value.is_null() => Timestamp::parse(&value).map(Value::Timestamp),
            Some(ColumnType::Date | ColumnType::Time | ColumnType::Timestamp) => return value,
            _ => {
                tracing::debug!(column = %key, "column never objectified");
                cache::write(&self.never_objectified).insert(key);
                return value;
            }
        };

        match parsed {
            Ok(objectified) => objectified,
            Err(e) => {
                tracing::debug!(column = %key, error = %e, "keeping raw value");
                value
            }
        }
    }

    /// Domain value -> storage value. Object values become text.
    pub fn scalarize(&self, entity_type: &str, column: &str, value: Value) -> Value {
        if let Some(handler) = lookup(&self.scalarize, entity_type, column) {
            return handler(entity_type, column, value);
        }
        match value {
            Value::Date(d) => Value::Text(d.to_string()),
            Value::Time(t) => Value::Text(t.to_string()),
            Value::Timestamp(ts) => Value::Text(ts.to_string()),
            Value::Json(serde_json::Value::String(s)) => Value::Text(s),
            Value::Json(other) => Value::Text(other.to_string()),
            scalar => scalar,
        }
    }

    /// Independent copy of a value; object values share no state with the original.
    pub fn replicate(&self, entity_type: &str, column: &str, value: &Value) -> Value {
        if let Some(handler) = lookup(&self.replicate, entity_type, column) {
            return handler(entity_type, column, value.clone());
        }
        value.clone()
    }

    pub fn reset(&mut self) {
        self.objectify.clear();
        self.scalarize.clear();
        self.replicate.clear();
        cache::get_mut(&mut self.never_objectified).clear();
    }
}
