//! Entity metadata engine: maps entity types to tables, resolves relationship routes between tables,
//! and hosts the hook, method-dispatch and value-transform registries record types build on.

mod cache;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod grammar;
pub mod hooks;
pub mod naming;
pub mod registry;
pub mod schema;
pub mod transform;
pub mod value;

pub use config::{
    load_registry_config_from_path, load_schema_from_path, load_schema_from_str, resolve, RegistryConfig,
    SchemaConfig, StaticSchema,
};
pub use dispatch::{candidate_patterns, parse_method, MethodDispatcher, MethodHandler, RecordSetDispatcher, RecordSetHandler};
pub use error::{ConfigError, HandlerError, OrmError, ValidationError};
pub use grammar::{EnglishGrammar, Grammar};
pub use hooks::{Hook, HookContext, HookHandler, HookParameter, HookRegistry, IntrospectionRegistry, Record, WILDCARD};
pub use naming::{NamingResolver, Translator, DEFAULT_DATABASE};
pub use registry::MetadataRegistry;
pub use schema::{ColumnType, Relationship, RelationshipFilter, RelationshipKind, Relationships, RouteResolver, Routes, Schema};
pub use transform::{TransformHandler, TransformPipeline};
pub use value::{Date, Time, Timestamp, Value};
