//! End-to-end behavior of a registry bootstrapped from JSON schema config.

use entity_metadata::{
    load_schema_from_str, ColumnType, Hook, HookContext, HookHandler, MetadataRegistry, Record, RelationshipFilter,
    Relationships, Schema, StaticSchema, Value, WILDCARD,
};
use std::any::Any;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const LIBRARY: &str = r#"{
    "tables": [
        {"name": "person", "primary_key": "id", "columns": [
            {"name": "id", "type": "serial"},
            {"name": "name", "type": "text"}
        ]},
        {"name": "book", "primary_key": "id", "columns": [
            {"name": "id", "type": "serial"},
            {"name": "author_id", "type": "int"},
            {"name": "editor_id", "type": "int"},
            {"name": "released_on", "type": "date"},
            {"name": "title", "type": "text"}
        ]}
    ],
    "foreign_keys": [
        {"table": "book", "column": "author_id", "related_table": "person", "related_column": "id"},
        {"table": "book", "column": "editor_id", "related_table": "person", "related_column": "id"}
    ]
}"#;

/// Delegates to a static schema and counts relationship lookups.
struct Counting {
    inner: StaticSchema,
    relationship_calls: AtomicUsize,
}

impl Schema for Counting {
    fn tables(&self) -> BTreeSet<String> {
        self.inner.tables()
    }
    fn relationships(&self, table: &str) -> Relationships {
        self.relationship_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.relationships(table)
    }
    fn column_type(&self, table: &str, column: &str) -> Option<ColumnType> {
        self.inner.column_type(table, column)
    }
}

fn library() -> (MetadataRegistry, Arc<Counting>) {
    let schema = Arc::new(Counting {
        inner: load_schema_from_str(LIBRARY).unwrap(),
        relationship_calls: AtomicUsize::new(0),
    });
    let mut registry = MetadataRegistry::new();
    registry.naming_mut().bind_table("Book", "book");
    registry.naming_mut().bind_table("Person", "person");
    registry.attach_schema("default", Arc::clone(&schema) as Arc<dyn Schema>);
    (registry, schema)
}

struct Book;

impl Record for Book {
    fn entity_type(&self) -> &str {
        "Book"
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[test]
fn derived_table_names_round_trip() {
    let registry = MetadataRegistry::new();
    let naming = registry.naming();
    for entity_type in ["BlogPost", "Person", "Category", "app::models::UserGroup", "Status"] {
        let table = naming.table_for(entity_type);
        let back = naming.entity_type_for(&table);
        assert_eq!(naming.table_for(&back), table, "{} -> {} -> {}", entity_type, table, back);
    }
}

#[test]
fn routes_between_queries_schema_once() {
    let (registry, schema) = library();
    let first = registry
        .routes_between("default", "book", "person", RelationshipFilter::ToOne)
        .unwrap();
    let second = registry
        .routes_between("default", "book", "person", RelationshipFilter::ToOne)
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(schema.relationship_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn ambiguous_route_lists_every_candidate() {
    let (registry, _) = library();
    let many_to_one: RelationshipFilter = "many-to-one".parse().unwrap();

    let err = registry
        .resolve_route_name("default", "book", "person", None, many_to_one)
        .unwrap_err();
    assert_eq!(err.code(), "ambiguous_route");
    let msg = err.to_string();
    assert!(msg.contains("author_id") && msg.contains("editor_id"), "{}", msg);

    let route = registry
        .resolve_route_name("default", "book", "person", Some("editor_id"), many_to_one)
        .unwrap();
    assert_eq!(route, "editor_id");
}

#[test]
fn invalid_filter_names_allowed_set() {
    let err = "sideways".parse::<RelationshipFilter>().unwrap_err();
    assert_eq!(err.code(), "invalid_relationship_filter");
    assert!(err.to_string().contains("*-to-many"));
}

#[test]
fn wildcard_hooks_run_before_entity_hooks() {
    let (mut registry, _) = library();
    let order = Arc::new(Mutex::new(Vec::new()));
    let tag = |name: &'static str| -> HookHandler {
        let order = Arc::clone(&order);
        Arc::new(move |_, ctx| {
            order.lock().unwrap().push(name);
            Ok(ctx)
        })
    };
    registry.hooks_mut().register("Book", Hook::PreStore, tag("B"));
    registry
        .hooks_mut()
        .register_named(WILDCARD, "pre::store()", tag("A"))
        .unwrap();

    registry.hooks().invoke(&Book, Hook::PreStore, HookContext::new()).unwrap();
    assert_eq!(*order.lock().unwrap(), vec!["A", "B"]);
}

#[test]
fn dispatch_memo_is_invalidated_by_registration() {
    let (mut registry, _) = library();
    let getter: entity_metadata::MethodHandler = Arc::new(|_, _, _, _| Ok(Value::Null));
    registry.methods_mut().register("Book", "get*", Arc::clone(&getter));

    let found = registry.methods().resolve_method("Book", "getName").unwrap().unwrap();
    assert!(Arc::ptr_eq(&found, &getter));
    assert!(registry.methods().resolve_method("Book", "setName").unwrap().is_none());
    assert!(registry.methods().resolve_method("Person", "archive").unwrap().is_none());

    registry
        .methods_mut()
        .register(WILDCARD, "archive", Arc::new(|_, _, _, _| Ok(Value::Bool(true))));
    assert!(registry.methods().resolve_method("Person", "archive").unwrap().is_some());
}

#[test]
fn objectify_date_column() {
    let (registry, _) = library();
    let raw = Value::from("the spring of 2020");
    assert_eq!(registry.objectify("Book", "released_on", raw.clone()).unwrap(), raw);
    assert!(matches!(
        registry.objectify("Book", "released_on", Value::from("2020-04-01")).unwrap(),
        Value::Date(_)
    ));
    assert_eq!(registry.objectify("Book", "released_on", Value::Null).unwrap(), Value::Null);
    assert_eq!(
        registry.objectify("Book", "title", Value::from("Dune")).unwrap(),
        Value::from("Dune")
    );
}

#[test]
fn reset_reverts_overrides() {
    let (mut registry, _) = library();
    registry.naming_mut().override_display_name("Book", "Volume");
    registry.naming_mut().override_column_display_name("Book", "author_id", "Writer");
    assert_eq!(registry.naming().display_name_for("Book"), "Volume");

    registry.reset();
    assert_eq!(registry.naming().display_name_for("Book"), "Book");
    assert_eq!(registry.naming().column_display_name_for("Book", "author_id"), "Author ID");
    assert_eq!(registry.naming().table_for("Book"), "books");
    assert!(registry.database_names().is_empty());
    assert!(!registry.hooks().is_registered("Book", Hook::PreStore, None));
}
