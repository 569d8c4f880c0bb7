//! Example consumer: bootstraps an entity-metadata registry from JSON files and resolves a few routes.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! Paths come from `SCHEMA_PATH` and `REGISTRY_CONFIG` (a `.env` file is honored).

use entity_metadata::{
    load_registry_config_from_path, load_schema_from_path, Hook, HookContext, MetadataRegistry, OrmError, Record,
    RelationshipFilter, Value,
};
use std::any::Any;
use std::sync::Arc;

struct Book;

impl Record for Book {
    fn entity_type(&self) -> &str {
        "Book"
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("entity_metadata=debug,example_consumer=info")),
        )
        .init();

    let schema_path = std::env::var("SCHEMA_PATH").unwrap_or_else(|_| "example_consumer/config/schema.json".into());
    let config_path =
        std::env::var("REGISTRY_CONFIG").unwrap_or_else(|_| "example_consumer/config/registry.json".into());

    let config = load_registry_config_from_path(&config_path)?;
    let schema = load_schema_from_path(&schema_path)?;

    let mut registry = MetadataRegistry::from_config(&config);
    registry.attach_schema(config.default_database.clone(), Arc::new(schema));
    registry.hooks_mut().register(
        "*",
        Hook::PreStore,
        Arc::new(|record, ctx| {
            tracing::info!(entity_type = record.entity_type(), "storing");
            Ok(ctx)
        }),
    );
    let registry = Arc::new(registry);

    let database = registry.naming().database_for("Book");
    let books = registry.naming().table_for("Book");
    let people = registry.naming().table_for("Person");
    registry.ensure_entity_table("Book")?;

    match registry.resolve_route_name(&database, &books, &people, None, RelationshipFilter::ToOne) {
        Ok(route) => tracing::info!(route = %route, "route"),
        Err(e @ OrmError::AmbiguousRoute { .. }) => tracing::info!(error = %e, "pick a route"),
        Err(e) => return Err(e.into()),
    }
    let author = registry.route(&database, &books, &people, Some("author_id"), RelationshipFilter::ToOne)?;
    tracing::info!(column = %author.column, related_column = %author.related_column, "author route");

    let tags = registry.route(&database, &books, "tags", None, RelationshipFilter::ToMany)?;
    tracing::info!(join_table = ?tags.join_table, "tag route");

    let published = registry.objectify("Book", "published_at", Value::from("2024-06-01T09:30:00Z"))?;
    tracing::info!(
        column = %registry.naming().column_display_name_for("Book", "published_at"),
        value = %published.to_json(),
        "objectified"
    );
    tracing::info!(name = %registry.naming().display_name_for("Person"), "person display name");

    registry.hooks().invoke(&Book, Hook::PreStore, HookContext::new())?;
    Ok(())
}
