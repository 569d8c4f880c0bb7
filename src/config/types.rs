//! Raw schema config types matching the JSON layout.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SchemaConfig {
    pub tables: Vec<TableConfig>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyConfig>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryKeyConfig {
    Single(String),
    Composite(Vec<String>),
}

impl PrimaryKeyConfig {
    pub fn columns(&self) -> Vec<&str> {
        match self {
            PrimaryKeyConfig::Single(s) => vec![s.as_str()],
            PrimaryKeyConfig::Composite(v) => v.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TableConfig {
    pub name: String,
    pub primary_key: PrimaryKeyConfig,
    #[serde(default)]
    pub columns: Vec<ColumnConfig>,
}

impl TableConfig {
    pub fn column(&self, name: &str) -> Option<&ColumnConfig> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// `"timestamp"` or `{"name": "timestamp", "params": [3]}`. Type parameters do not affect the column type.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnTypeConfig {
    Simple(String),
    Parameterized { name: String },
}

impl ColumnTypeConfig {
    pub fn name(&self) -> &str {
        match self {
            ColumnTypeConfig::Simple(s) => s.as_str(),
            ColumnTypeConfig::Parameterized { name } => name.as_str(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: ColumnTypeConfig,
    #[serde(default)]
    pub unique: bool,
}

/// `table.column` references `related_table.related_column`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ForeignKeyConfig {
    pub table: String,
    pub column: String,
    pub related_table: String,
    pub related_column: String,
}
