//! The metadata registry: one context object owning naming, schemas, routes, hooks, dispatch and transforms.
//!
//! Register everything during bootstrap through `&mut self`, then share the registry (e.g. in an `Arc`)
//! for resolution, which only needs `&self`.

use crate::config::RegistryConfig;
use crate::dispatch::{MethodDispatcher, RecordSetDispatcher};
use crate::error::OrmError;
use crate::grammar::{EnglishGrammar, Grammar};
use crate::hooks::{HookRegistry, IntrospectionRegistry};
use crate::naming::{NamingResolver, Translator};
use crate::schema::{Relationship, RelationshipFilter, Routes, Schema, SchemaRegistry};
use crate::transform::TransformPipeline;
use crate::value::Value;
use std::sync::Arc;

pub struct MetadataRegistry {
    naming: NamingResolver,
    schemas: SchemaRegistry,
    hooks: HookRegistry,
    introspection: IntrospectionRegistry,
    methods: MethodDispatcher,
    record_set_methods: RecordSetDispatcher,
    transforms: TransformPipeline,
}

impl Default for MetadataRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::with_grammar(Arc::new(EnglishGrammar))
    }

    pub fn with_grammar(grammar: Arc<dyn Grammar>) -> Self {
        MetadataRegistry {
            naming: NamingResolver::new(grammar),
            schemas: SchemaRegistry::new(),
            hooks: HookRegistry::new(),
            introspection: IntrospectionRegistry::new(),
            methods: MethodDispatcher::new(),
            record_set_methods: RecordSetDispatcher::new(),
            transforms: TransformPipeline::new(),
        }
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.naming.set_translator(Some(translator));
        self
    }

    /// A registry with the config's naming overrides applied.
    pub fn from_config(config: &RegistryConfig) -> Self {
        let mut registry = Self::new();
        registry.apply_config(config);
        registry
    }

    /// Applies naming overrides from config. Overriding an existing table binding is logged.
    pub fn apply_config(&mut self, config: &RegistryConfig) {
        self.naming.set_default_database(config.default_database.clone());
        for (entity_type, table) in &config.tables {
            if self.naming.is_mapped_to_table(entity_type) {
                tracing::warn!(entity_type = %entity_type, table = %table, "config overrides existing table binding");
            }
            self.naming.bind_table(entity_type.clone(), table.clone());
        }
        for (entity_type, database) in &config.databases {
            self.naming.bind_database(entity_type.clone(), database.clone());
        }
        for (entity_type, name) in &config.display_names {
            self.naming.override_display_name(entity_type.clone(), name.clone());
        }
        for (entity_type, columns) in &config.column_display_names {
            for (column, name) in columns {
                self.naming
                    .override_column_display_name(entity_type.clone(), column.clone(), name.clone());
            }
        }
        tracing::debug!(
            tables = config.tables.len(),
            databases = config.databases.len(),
            "applied registry config"
        );
    }

    pub fn naming(&self) -> &NamingResolver {
        &self.naming
    }

    pub fn naming_mut(&mut self) -> &mut NamingResolver {
        &mut self.naming
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut HookRegistry {
        &mut self.hooks
    }

    pub fn introspection(&self) -> &IntrospectionRegistry {
        &self.introspection
    }

    pub fn introspection_mut(&mut self) -> &mut IntrospectionRegistry {
        &mut self.introspection
    }

    pub fn methods(&self) -> &MethodDispatcher {
        &self.methods
    }

    pub fn methods_mut(&mut self) -> &mut MethodDispatcher {
        &mut self.methods
    }

    pub fn record_set_methods(&self) -> &RecordSetDispatcher {
        &self.record_set_methods
    }

    pub fn record_set_methods_mut(&mut self) -> &mut RecordSetDispatcher {
        &mut self.record_set_methods
    }

    pub fn transforms(&self) -> &TransformPipeline {
        &self.transforms
    }

    pub fn transforms_mut(&mut self) -> &mut TransformPipeline {
        &mut self.transforms
    }

    /// Attach the schema for a database name; re-attaching replaces the schema and its route cache.
    pub fn attach_schema(&mut self, database: impl Into<String>, schema: Arc<dyn Schema>) {
        self.schemas.attach(database, schema);
    }

    pub fn database_names(&self) -> Vec<String> {
        self.schemas.database_names()
    }

    /// The schema attached for the entity type's database.
    pub fn schema_for(&self, entity_type: &str) -> Result<&dyn Schema, OrmError> {
        let database = self.naming.database_for(entity_type);
        Ok(self.schemas.retrieve(&database)?.schema())
    }

    pub fn routes_between(
        &self,
        database: &str,
        table: &str,
        related_table: &str,
        filter: RelationshipFilter,
    ) -> Result<Arc<Routes>, OrmError> {
        let attached = self.schemas.retrieve(database)?;
        attached
            .routes()
            .routes_between(attached.schema(), table, related_table, filter)
    }

    pub fn resolve_route_name(
        &self,
        database: &str,
        table: &str,
        related_table: &str,
        preselected: Option<&str>,
        filter: RelationshipFilter,
    ) -> Result<String, OrmError> {
        let attached = self.schemas.retrieve(database)?;
        attached
            .routes()
            .resolve_route_name(attached.schema(), table, related_table, preselected, filter)
    }

    pub fn route(
        &self,
        database: &str,
        table: &str,
        related_table: &str,
        preselected: Option<&str>,
        filter: RelationshipFilter,
    ) -> Result<Relationship, OrmError> {
        let attached = self.schemas.retrieve(database)?;
        attached
            .routes()
            .route(attached.schema(), table, related_table, preselected, filter)
    }

    pub fn is_one_to_one(
        &self,
        database: &str,
        table: &str,
        related_table: &str,
        route: Option<&str>,
    ) -> Result<bool, OrmError> {
        let attached = self.schemas.retrieve(database)?;
        attached
            .routes()
            .is_one_to_one(attached.schema(), table, related_table, route)
    }

    /// Storage -> domain value for a column of the entity's table.
    pub fn objectify(&self, entity_type: &str, column: &str, value: Value) -> Result<Value, OrmError> {
        let table = self.naming.table_for(entity_type);
        let schema = self.schema_for(entity_type)?;
        Ok(self.transforms.objectify(schema, &table, entity_type, column, value))
    }

    pub fn scalarize(&self, entity_type: &str, column: &str, value: Value) -> Value {
        self.transforms.scalarize(entity_type, column, value)
    }

    pub fn replicate(&self, entity_type: &str, column: &str, value: &Value) -> Value {
        self.transforms.replicate(entity_type, column, value)
    }

    /// Fails unless the entity type's table exists in the schema of its database.
    pub fn ensure_entity_table(&self, entity_type: &str) -> Result<(), OrmError> {
        let table = self.naming.table_for(entity_type);
        let database = self.naming.database_for(entity_type);
        let schema = self.schemas.retrieve(&database)?.schema();
        if schema.tables().contains(&table) {
            return Ok(());
        }
        Err(OrmError::UnmappedEntity {
            entity_type: entity_type.to_string(),
            table,
            database,
        })
    }

    /// Drops every registration, override, cache and attached schema.
    pub fn reset(&mut self) {
        self.naming.reset();
        self.schemas.reset();
        self.hooks.reset();
        self.introspection.reset();
        self.methods.reset();
        self.record_set_methods.reset();
        self.transforms.reset();
        tracing::info!("metadata registry reset");
    }
}
