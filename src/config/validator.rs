//! Schema config validation: duplicate names and referential integrity.

use crate::config::{SchemaConfig, TableConfig};
use crate::error::ConfigError;
use std::collections::{HashMap, HashSet};

pub fn validate(config: &SchemaConfig) -> Result<(), ConfigError> {
    let mut tables: HashMap<&str, &TableConfig> = HashMap::new();
    for t in &config.tables {
        if tables.insert(t.name.as_str(), t).is_some() {
            return Err(ConfigError::DuplicateTable(t.name.clone()));
        }

        let mut names = HashSet::new();
        for c in &t.columns {
            if !names.insert(c.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate column {}.{}",
                    t.name, c.name
                )));
            }
            if c.type_.name().trim().is_empty() {
                return Err(ConfigError::InvalidColumnType {
                    table: t.name.clone(),
                    column: c.name.clone(),
                    type_name: c.type_.name().to_string(),
                });
            }
        }

        let pk = t.primary_key.columns();
        if pk.is_empty() {
            return Err(ConfigError::Validation(format!("table {} has no primary key", t.name)));
        }
        for col in pk {
            if !names.contains(col) {
                return Err(ConfigError::MissingReference {
                    kind: "primary key column",
                    id: format!("{}.{}", t.name, col),
                });
            }
        }
    }

    for fk in &config.foreign_keys {
        for (table, column) in [(&fk.table, &fk.column), (&fk.related_table, &fk.related_column)] {
            let t = tables.get(table.as_str()).ok_or_else(|| ConfigError::MissingReference {
                kind: "table",
                id: table.clone(),
            })?;
            if t.column(column).is_none() {
                return Err(ConfigError::MissingReference {
                    kind: "column",
                    id: format!("{}.{}", table, column),
                });
            }
        }
    }

    Ok(())
}
