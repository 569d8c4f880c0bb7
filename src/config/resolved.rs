//! Resolved schema: config validated and flattened into a `Schema` the route resolver can query.

use crate::schema::{ColumnType, Relationships, Schema};
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Clone, Debug, Default)]
pub struct TableInfo {
    pub primary_key: Vec<String>,
    pub columns: BTreeMap<String, ColumnType>,
}

/// In-memory schema built from a `SchemaConfig`.
#[derive(Clone, Debug, Default)]
pub struct StaticSchema {
    pub(crate) tables: BTreeMap<String, TableInfo>,
    pub(crate) relationships: HashMap<String, Relationships>,
}

impl StaticSchema {
    pub fn table(&self, name: &str) -> Option<&TableInfo> {
        self.tables.get(name)
    }

    pub fn primary_key(&self, table: &str) -> &[String] {
        self.tables
            .get(table)
            .map(|t| t.primary_key.as_slice())
            .unwrap_or(&[])
    }
}

impl Schema for StaticSchema {
    fn tables(&self) -> BTreeSet<String> {
        self.tables.keys().cloned().collect()
    }

    fn relationships(&self, table: &str) -> Relationships {
        self.relationships.get(table).cloned().unwrap_or_default()
    }

    fn column_type(&self, table: &str, column: &str) -> Option<ColumnType> {
        self.tables.get(table)?.columns.get(column).cloned()
    }
}
