//! Load schema config from JSON and resolve it into a `StaticSchema`.

use crate::config::resolved::{StaticSchema, TableInfo};
use crate::config::types::*;
use crate::config::validate;
use crate::error::ConfigError;
use crate::schema::{ColumnType, Relationship, RelationshipKind};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Build the resolved schema from config (validates first).
///
/// Each foreign key yields many-to-one on the owning table and one-to-many on the referenced table,
/// both one-to-one when the FK column is unique. A table whose primary key is exactly two FK columns
/// is a join table and additionally yields many-to-many between the two referenced tables.
pub fn resolve(config: &SchemaConfig) -> Result<StaticSchema, ConfigError> {
    validate(config)?;

    let tables_by_name: HashMap<&str, &TableConfig> = config.tables.iter().map(|t| (t.name.as_str(), t)).collect();

    let mut schema = StaticSchema::default();
    for t in &config.tables {
        let columns = t
            .columns
            .iter()
            .map(|c| (c.name.clone(), ColumnType::from_type_name(c.type_.name())))
            .collect();
        schema.tables.insert(
            t.name.clone(),
            TableInfo {
                primary_key: t.primary_key.columns().into_iter().map(String::from).collect(),
                columns,
            },
        );
    }

    for fk in &config.foreign_keys {
        let unique = tables_by_name
            .get(fk.table.as_str())
            .map(|t| is_unique_column(t, &fk.column))
            .unwrap_or(false);
        let (owning, referenced) = if unique {
            (RelationshipKind::OneToOne, RelationshipKind::OneToOne)
        } else {
            (RelationshipKind::ManyToOne, RelationshipKind::OneToMany)
        };
        push(
            &mut schema,
            Relationship {
                kind: owning,
                table: fk.table.clone(),
                column: fk.column.clone(),
                related_table: fk.related_table.clone(),
                related_column: fk.related_column.clone(),
                join_table: None,
                join_column: None,
                join_related_column: None,
            },
        );
        push(
            &mut schema,
            Relationship {
                kind: referenced,
                table: fk.related_table.clone(),
                column: fk.related_column.clone(),
                related_table: fk.table.clone(),
                related_column: fk.column.clone(),
                join_table: None,
                join_column: None,
                join_related_column: None,
            },
        );
    }

    for t in &config.tables {
        let Some((left, right)) = join_table_keys(t, &config.foreign_keys) else {
            continue;
        };
        tracing::debug!(table = %t.name, "join table");
        for (ours, theirs) in [(left, right), (right, left)] {
            push(
                &mut schema,
                Relationship {
                    kind: RelationshipKind::ManyToMany,
                    table: ours.related_table.clone(),
                    column: ours.related_column.clone(),
                    related_table: theirs.related_table.clone(),
                    related_column: theirs.related_column.clone(),
                    join_table: Some(t.name.clone()),
                    join_column: Some(ours.column.clone()),
                    join_related_column: Some(theirs.column.clone()),
                },
            );
        }
    }

    Ok(schema)
}

fn push(schema: &mut StaticSchema, relationship: Relationship) {
    schema
        .relationships
        .entry(relationship.table.clone())
        .or_default()
        .push(relationship);
}

/// A column is unique when flagged so or when it is the whole primary key.
fn is_unique_column(table: &TableConfig, column: &str) -> bool {
    table.column(column).map(|c| c.unique).unwrap_or(false) || table.primary_key.columns() == [column]
}

/// The two foreign keys forming a join table's primary key, if the table is one.
fn join_table_keys<'a>(
    table: &TableConfig,
    foreign_keys: &'a [ForeignKeyConfig],
) -> Option<(&'a ForeignKeyConfig, &'a ForeignKeyConfig)> {
    let pk = table.primary_key.columns();
    if pk.len() != 2 {
        return None;
    }
    let fk_for = |column: &str| {
        foreign_keys
            .iter()
            .find(|fk| fk.table == table.name && fk.column == column)
    };
    let left = fk_for(pk[0])?;
    let right = fk_for(pk[1])?;
    let distinct: HashSet<&str> = [left.column.as_str(), right.column.as_str()].into_iter().collect();
    (distinct.len() == 2).then_some((left, right))
}

pub fn load_schema_from_str(json: &str) -> Result<StaticSchema, ConfigError> {
    let config: SchemaConfig = serde_json::from_str(json).map_err(|e| ConfigError::Load(e.to_string()))?;
    resolve(&config)
}

pub fn load_schema_from_path(path: impl AsRef<Path>) -> Result<StaticSchema, ConfigError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    load_schema_from_str(&json)
}
