//! Entity type <-> table naming, database bindings and human-readable display names.
//!
//! Unbound entity types derive their table as `underscorize(pluralize(name))` and tables derive their
//! entity type as `camelize(singularize(table))`. A derived name is stored on first use, so it stays
//! fixed for the lifetime of the resolver.

use crate::cache;
use crate::grammar::{EnglishGrammar, Grammar};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Default database name for entity types without an explicit binding.
pub const DEFAULT_DATABASE: &str = "default";

/// Optional localization hook applied to every display name read.
pub trait Translator: Send + Sync {
    /// `template` has `%` escaped as `%%`.
    fn translate(&self, template: &str) -> String;
}

/// Strip a `::` namespace: "app::models::User" -> "User".
pub fn strip_namespace(entity_type: &str) -> &str {
    entity_type.rsplit("::").next().unwrap_or(entity_type)
}

#[derive(Default, Debug)]
struct TableBindings {
    by_entity: HashMap<String, String>,
    by_table: HashMap<String, String>,
}

pub struct NamingResolver {
    grammar: Arc<dyn Grammar>,
    translator: Option<Arc<dyn Translator>>,
    default_database: String,
    tables: RwLock<TableBindings>,
    databases: HashMap<String, String>,
    record_names: RwLock<HashMap<String, String>>,
    column_names: RwLock<HashMap<String, HashMap<String, String>>>,
    related_entity_types: RwLock<HashMap<(String, String), String>>,
}

impl Default for NamingResolver {
    fn default() -> Self {
        Self::new(Arc::new(EnglishGrammar))
    }
}

impl NamingResolver {
    pub fn new(grammar: Arc<dyn Grammar>) -> Self {
        NamingResolver {
            grammar,
            translator: None,
            default_database: DEFAULT_DATABASE.to_string(),
            tables: RwLock::new(TableBindings::default()),
            databases: HashMap::new(),
            record_names: RwLock::new(HashMap::new()),
            column_names: RwLock::new(HashMap::new()),
            related_entity_types: RwLock::new(HashMap::new()),
        }
    }

    pub fn grammar(&self) -> &dyn Grammar {
        self.grammar.as_ref()
    }

    pub fn set_translator(&mut self, translator: Option<Arc<dyn Translator>>) {
        self.translator = translator;
    }

    pub fn set_default_database(&mut self, database: impl Into<String>) {
        self.default_database = database.into();
    }

    /// Table for an entity type. Derives and stores the table name the first time an unbound type is seen.
    pub fn table_for(&self, entity_type: &str) -> String {
        if let Some(table) = cache::read(&self.tables).by_entity.get(entity_type) {
            return table.clone();
        }
        let derived = self
            .grammar
            .underscorize(&self.grammar.pluralize(strip_namespace(entity_type)));
        let mut bindings = cache::write(&self.tables);
        let table = bindings
            .by_entity
            .entry(entity_type.to_string())
            .or_insert(derived)
            .clone();
        bindings
            .by_table
            .entry(table.clone())
            .or_insert_with(|| entity_type.to_string());
        tracing::debug!(entity_type = %entity_type, table = %table, "derived table name");
        table
    }

    /// Entity type for a table. Derives and registers the entity type when no binding points at the table.
    /// A derived entity type never replaces that entity type's existing table binding.
    pub fn entity_type_for(&self, table: &str) -> String {
        if let Some(entity_type) = cache::read(&self.tables).by_table.get(table) {
            return entity_type.clone();
        }
        let derived = self.grammar.camelize(&self.grammar.singularize(table), true);
        let mut bindings = cache::write(&self.tables);
        let entity_type = bindings
            .by_table
            .entry(table.to_string())
            .or_insert(derived)
            .clone();
        bindings
            .by_entity
            .entry(entity_type.clone())
            .or_insert_with(|| table.to_string());
        tracing::debug!(table = %table, entity_type = %entity_type, "derived entity type");
        entity_type
    }

    /// Explicit entity type -> table mapping, last write wins. A table belongs to one entity type at a time,
    /// so any previous owner of `table` loses its binding.
    pub fn bind_table(&mut self, entity_type: impl Into<String>, table: impl Into<String>) {
        let entity_type = entity_type.into();
        let table = table.into();
        let bindings = cache::get_mut(&mut self.tables);
        if let Some(old_table) = bindings.by_entity.remove(&entity_type) {
            if bindings.by_table.get(&old_table) == Some(&entity_type) {
                bindings.by_table.remove(&old_table);
            }
        }
        if let Some(previous_owner) = bindings.by_table.insert(table.clone(), entity_type.clone()) {
            if previous_owner != entity_type && bindings.by_entity.get(&previous_owner) == Some(&table) {
                bindings.by_entity.remove(&previous_owner);
            }
        }
        tracing::debug!(entity_type = %entity_type, table = %table, "bound table");
        bindings.by_entity.insert(entity_type, table);
    }

    pub fn bind_database(&mut self, entity_type: impl Into<String>, database: impl Into<String>) {
        self.databases.insert(entity_type.into(), database.into());
    }

    pub fn database_for(&self, entity_type: &str) -> String {
        self.databases
            .get(entity_type)
            .cloned()
            .unwrap_or_else(|| self.default_database.clone())
    }

    /// Whether the entity type has a table binding, explicit or already derived.
    pub fn is_mapped_to_table(&self, entity_type: &str) -> bool {
        cache::read(&self.tables).by_entity.contains_key(entity_type)
    }

    pub fn override_display_name(&mut self, entity_type: impl Into<String>, name: impl Into<String>) {
        cache::get_mut(&mut self.record_names).insert(entity_type.into(), name.into());
    }

    pub fn override_column_display_name(
        &mut self,
        entity_type: impl Into<String>,
        column: impl Into<String>,
        name: impl Into<String>,
    ) {
        cache::get_mut(&mut self.column_names)
            .entry(entity_type.into())
            .or_default()
            .insert(column.into(), name.into());
    }

    /// Human name of a record, e.g. "Blog Post" for `app::BlogPost`.
    pub fn display_name_for(&self, entity_type: &str) -> String {
        let cached = cache::read(&self.record_names).get(entity_type).cloned();
        let name = match cached {
            Some(name) => name,
            None => {
                let name = self.grammar.humanize(strip_namespace(entity_type));
                cache::write(&self.record_names)
                    .entry(entity_type.to_string())
                    .or_insert(name)
                    .clone()
            }
        };
        self.compose(&name)
    }

    /// Human name of a column, e.g. "First Name" for `first_name`.
    pub fn column_display_name_for(&self, entity_type: &str, column: &str) -> String {
        let cached = cache::read(&self.column_names)
            .get(entity_type)
            .and_then(|columns| columns.get(column))
            .cloned();
        let name = match cached {
            Some(name) => name,
            None => {
                let name = self.grammar.humanize(column);
                cache::write(&self.column_names)
                    .entry(entity_type.to_string())
                    .or_default()
                    .entry(column.to_string())
                    .or_insert(name)
                    .clone()
            }
        };
        self.compose(&name)
    }

    /// Qualifies `related` with the namespace of `entity_type` when it has none of its own.
    /// "app::models::User" + "Group" -> "app::models::Group"
    pub fn related_entity_type(&self, entity_type: &str, related: &str) -> String {
        let key = (entity_type.to_string(), related.to_string());
        if let Some(qualified) = cache::read(&self.related_entity_types).get(&key) {
            return qualified.clone();
        }
        let qualified = match entity_type.rfind("::") {
            Some(pos) if !related.contains("::") => format!("{}::{}", &entity_type[..pos], related),
            _ => related.to_string(),
        };
        cache::write(&self.related_entity_types).insert(key, qualified.clone());
        qualified
    }

    /// Drops every binding and override. The grammar and translator are kept.
    pub fn reset(&mut self) {
        *cache::get_mut(&mut self.tables) = TableBindings::default();
        self.default_database = DEFAULT_DATABASE.to_string();
        self.databases.clear();
        cache::get_mut(&mut self.record_names).clear();
        cache::get_mut(&mut self.column_names).clear();
        cache::get_mut(&mut self.related_entity_types).clear();
    }

    fn compose(&self, name: &str) -> String {
        match &self.translator {
            Some(translator) => translator.translate(&name.replace('%', "%%")),
            None => name.to_string(),
        }
    }
}
