//! Schema introspection contract, per-database schema registry and route resolution.

mod relationship;
mod routes;

pub use relationship::{Relationship, RelationshipFilter, RelationshipKind, Relationships};
pub use routes::{route_name_from_relationship, RouteResolver, Routes};

use crate::error::OrmError;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Declared storage type of a column, as far as value transforms care.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Boolean,
    Text,
    Date,
    Time,
    Timestamp,
    Json,
    Blob,
    Other(String),
}

impl ColumnType {
    /// Map a SQL type name to a column type, e.g. "timestamptz" -> Timestamp, "varchar" -> Text.
    pub fn from_type_name(name: &str) -> ColumnType {
        let lower = name.trim().to_lowercase();
        if lower == "timestamptz"
            || lower == "datetime"
            || lower == "timestamp"
            || lower.starts_with("timestamp ")
            || lower.starts_with("timestamp(")
        {
            ColumnType::Timestamp
        } else if lower == "date" {
            ColumnType::Date
        } else if lower == "time" || lower == "timetz" || lower.starts_with("time ") || lower.starts_with("time(") {
            ColumnType::Time
        } else if lower.starts_with("bool") {
            ColumnType::Boolean
        } else if lower == "json" || lower == "jsonb" {
            ColumnType::Json
        } else if lower == "blob" || lower == "bytea" || lower.contains("binary") {
            ColumnType::Blob
        } else if lower == "interval" {
            ColumnType::Other(lower)
        } else if lower.contains("serial") || lower.starts_with("int") || lower.ends_with("int") {
            ColumnType::Integer
        } else if ["float", "double", "real", "numeric", "decimal"]
            .iter()
            .any(|t| lower.starts_with(t))
        {
            ColumnType::Float
        } else if lower.contains("char") || lower == "text" || lower == "uuid" {
            ColumnType::Text
        } else {
            ColumnType::Other(lower)
        }
    }
}

/// Read-only view of a database schema. Implementations may query a live database; the registry
/// never mutates them and assumes their answers are stable for the life of the process.
pub trait Schema: Send + Sync {
    fn tables(&self) -> BTreeSet<String>;
    fn relationships(&self, table: &str) -> Relationships;
    fn column_type(&self, table: &str, column: &str) -> Option<ColumnType>;
}

/// A schema attached under a database name, with its own route cache.
pub struct AttachedSchema {
    schema: Arc<dyn Schema>,
    routes: RouteResolver,
}

impl AttachedSchema {
    pub fn schema(&self) -> &dyn Schema {
        self.schema.as_ref()
    }

    pub fn routes(&self) -> &RouteResolver {
        &self.routes
    }
}

#[derive(Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, AttachedSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        SchemaRegistry {
            schemas: HashMap::new(),
        }
    }

    /// Attach (or replace) the schema for a database name. Replacing drops the old route cache.
    pub fn attach(&mut self, database: impl Into<String>, schema: Arc<dyn Schema>) {
        let database = database.into();
        tracing::info!(database = %database, "attached schema");
        self.schemas.insert(
            database,
            AttachedSchema {
                schema,
                routes: RouteResolver::new(),
            },
        );
    }

    pub fn retrieve(&self, database: &str) -> Result<&AttachedSchema, OrmError> {
        self.schemas.get(database).ok_or_else(|| OrmError::UnknownDatabase {
            database: database.to_string(),
            attached: self.database_names().join(", "),
        })
    }

    pub fn database_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.schemas.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn reset(&mut self) {
        self.schemas.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Empty;

    impl Schema for Empty {
        fn tables(&self) -> BTreeSet<String> {
            BTreeSet::new()
        }
        fn relationships(&self, _table: &str) -> Relationships {
            Relationships::default()
        }
        fn column_type(&self, _table: &str, _column: &str) -> Option<ColumnType> {
            None
        }
    }

    #[test]
    fn test_column_type_from_type_name() {
        assert_eq!(ColumnType::from_type_name("timestamptz"), ColumnType::Timestamp);
        assert_eq!(ColumnType::from_type_name("TIMESTAMP WITH TIME ZONE"), ColumnType::Timestamp);
        assert_eq!(ColumnType::from_type_name("date"), ColumnType::Date);
        assert_eq!(ColumnType::from_type_name("time"), ColumnType::Time);
        assert_eq!(ColumnType::from_type_name("bigserial"), ColumnType::Integer);
        assert_eq!(ColumnType::from_type_name("varchar(255)"), ColumnType::Text);
        assert_eq!(ColumnType::from_type_name("numeric(10,2)"), ColumnType::Float);
        assert_eq!(ColumnType::from_type_name("boolean"), ColumnType::Boolean);
        assert_eq!(ColumnType::from_type_name("interval"), ColumnType::Other("interval".into()));
    }

    #[test]
    fn test_retrieve_unknown_database_lists_attached() {
        let mut registry = SchemaRegistry::new();
        registry.attach("default", Arc::new(Empty));
        registry.attach("audit", Arc::new(Empty));
        assert!(registry.retrieve("default").is_ok());
        let err = registry.retrieve("reporting").err().unwrap();
        assert_eq!(err.code(), "unknown_database");
        assert!(err.to_string().contains("audit, default"));
        registry.reset();
        assert!(registry.retrieve("default").is_err());
    }
}
