//! Typed errors. Programmer errors carry the offending input and every valid alternative.

use thiserror::Error;

/// Error returned by user-supplied hook, method and record-set handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing reference: {kind} '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("duplicate table: {0}")]
    DuplicateTable(String),
    #[error("invalid column type '{type_name}' for {table}.{column}")]
    InvalidColumnType {
        table: String,
        column: String,
        type_name: String,
    },
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

/// Recoverable failure constructing a domain value from a raw scalar.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid {kind} value: {input}")]
pub struct ValidationError {
    pub kind: &'static str,
    pub input: String,
}

#[derive(Error, Debug)]
pub enum OrmError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("The relationship type specified, {filter}, is invalid. Must be one of: {valid}.")]
    InvalidRelationshipFilter { filter: String, valid: String },
    #[error("The hook specified, {hook}, should be one of: {valid}.")]
    InvalidHook { hook: String, valid: String },
    #[error("The related table specified, {table}, does not exist in the database")]
    UnknownTable { table: String },
    #[error("The route specified, {route}, is not a valid route between {table} and {related_table}. Must be one of: {valid}.")]
    InvalidRoute {
        route: String,
        table: String,
        related_table: String,
        valid: String,
    },
    #[error("There is more than one route for the{filter}relationship between {table} and {related_table}. Please specify one of the following: {routes}.")]
    AmbiguousRoute {
        filter: String,
        table: String,
        related_table: String,
        routes: String,
    },
    #[error("The table {table} is not in a{filter}relationship with the table {related_table}")]
    NotRelated {
        table: String,
        related_table: String,
        filter: String,
    },
    #[error("Invalid method, {method}(), called")]
    InvalidMethod { method: String },
    #[error("No schema is attached for the database {database}. Attached databases: {attached}.")]
    UnknownDatabase { database: String, attached: String },
    #[error("The entity type specified, {entity_type}, does not correspond to a table in the {database} database (expected table {table})")]
    UnmappedEntity {
        entity_type: String,
        table: String,
        database: String,
    },
    #[error("{site} handler failed for {entity_type}: {source}")]
    Handler {
        site: String,
        entity_type: String,
        #[source]
        source: HandlerError,
    },
}

impl OrmError {
    /// Stable machine-readable code, e.g. for logging or test assertions.
    pub fn code(&self) -> &'static str {
        match self {
            OrmError::Config(_) => "config_error",
            OrmError::InvalidRelationshipFilter { .. } => "invalid_relationship_filter",
            OrmError::InvalidHook { .. } => "invalid_hook",
            OrmError::UnknownTable { .. } => "unknown_table",
            OrmError::InvalidRoute { .. } => "invalid_route",
            OrmError::AmbiguousRoute { .. } => "ambiguous_route",
            OrmError::NotRelated { .. } => "not_related",
            OrmError::InvalidMethod { .. } => "invalid_method",
            OrmError::UnknownDatabase { .. } => "unknown_database",
            OrmError::UnmappedEntity { .. } => "unmapped_entity",
            OrmError::Handler { .. } => "handler_error",
        }
    }

    /// Everything except handler failures is misuse of the registry by the caller.
    pub fn is_programmer_error(&self) -> bool {
        !matches!(self, OrmError::Handler { .. })
    }
}

/// Renders a relationship filter for message templates: a blank for no filter, ` {filter} ` otherwise.
pub(crate) fn filter_phrase(filter: &str) -> String {
    if filter.is_empty() {
        " ".to_string()
    } else {
        format!(" {} ", filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguous_route_message_lists_routes() {
        let err = OrmError::AmbiguousRoute {
            filter: filter_phrase("many-to-one"),
            table: "books".into(),
            related_table: "people".into(),
            routes: "author_id, editor_id".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("many-to-one relationship"));
        assert!(msg.contains("author_id, editor_id"));
        assert_eq!(err.code(), "ambiguous_route");
        assert!(err.is_programmer_error());
    }

    #[test]
    fn test_not_related_without_filter() {
        let err = OrmError::NotRelated {
            table: "books".into(),
            related_table: "tags".into(),
            filter: filter_phrase(""),
        };
        assert_eq!(
            err.to_string(),
            "The table books is not in a relationship with the table tags"
        );
    }

    #[test]
    fn test_handler_error_is_not_programmer_error() {
        let err = OrmError::Handler {
            site: "pre::store()".into(),
            entity_type: "Book".into(),
            source: "boom".into(),
        };
        assert!(!err.is_programmer_error());
        assert_eq!(err.code(), "handler_error");
        assert_eq!(err.to_string(), "pre::store() handler failed for Book: boom");
    }
}
