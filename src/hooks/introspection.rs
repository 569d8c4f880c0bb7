//! Column-metadata and method-signature modifiers used when a record type describes itself.

use super::WILDCARD;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Descriptive metadata for one column, e.g. `type`, `not_null`, `max_length`, `valid_values`.
pub type ColumnMetadata = BTreeMap<String, serde_json::Value>;

/// Method name -> human-readable signature.
pub type Signatures = BTreeMap<String, String>;

pub type InspectHandler = Arc<dyn Fn(&str, &str, &mut ColumnMetadata) + Send + Sync>;
pub type ReflectHandler = Arc<dyn Fn(&str, &mut Signatures, bool) + Send + Sync>;

#[derive(Default)]
pub struct IntrospectionRegistry {
    inspect: HashMap<String, HashMap<String, Vec<InspectHandler>>>,
    reflect: HashMap<String, Vec<ReflectHandler>>,
}

impl IntrospectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_inspect(&mut self, entity_type: impl Into<String>, column: impl Into<String>, handler: InspectHandler) {
        self.inspect
            .entry(entity_type.into())
            .or_default()
            .entry(column.into())
            .or_default()
            .push(handler);
    }

    pub fn inspect(&self, entity_type: &str, column: &str, metadata: &mut ColumnMetadata) {
        let Some(handlers) = self.inspect.get(entity_type).and_then(|c| c.get(column)) else {
            return;
        };
        for handler in handlers {
            handler(entity_type, column, metadata);
        }
    }

    /// Registering the same handler twice for one entity type is a no-op.
    pub fn register_reflect(&mut self, entity_type: impl Into<String>, handler: ReflectHandler) {
        let handlers = self.reflect.entry(entity_type.into()).or_default();
        let ptr = Arc::as_ptr(&handler) as *const ();
        if handlers.iter().any(|h| Arc::as_ptr(h) as *const () == ptr) {
            return;
        }
        handlers.push(handler);
    }

    pub fn reflect(&self, entity_type: &str, signatures: &mut Signatures, include_doc_comments: bool) {
        let wildcard = self.reflect.get(WILDCARD).into_iter().flatten();
        let concrete = self.reflect.get(entity_type).into_iter().flatten();
        for handler in wildcard.chain(concrete) {
            handler(entity_type, signatures, include_doc_comments);
        }
    }

    pub fn reset(&mut self) {
        self.inspect.clear();
        self.reflect.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_inspect_handlers_modify_metadata_in_order() {
        let mut registry = IntrospectionRegistry::new();
        registry.register_inspect(
            "User",
            "email",
            Arc::new(|_, _, meta: &mut ColumnMetadata| {
                meta.insert("feature".into(), serde_json::json!("email"));
            }),
        );
        registry.register_inspect(
            "User",
            "email",
            Arc::new(|_, column, meta: &mut ColumnMetadata| {
                let feature = meta.get("feature").cloned().unwrap_or_default();
                meta.insert("label".into(), serde_json::json!(format!("{}:{}", column, feature)));
            }),
        );

        let mut meta = ColumnMetadata::new();
        registry.inspect("User", "email", &mut meta);
        assert_eq!(meta.get("label"), Some(&serde_json::json!("email:\"email\"")));

        let mut untouched = ColumnMetadata::new();
        registry.inspect("User", "name", &mut untouched);
        assert!(untouched.is_empty());
    }

    #[test]
    fn test_reflect_runs_wildcard_first_and_ignores_duplicates() {
        let mut registry = IntrospectionRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let add_generic: ReflectHandler = Arc::new(move |_, sigs: &mut Signatures, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            sigs.insert("prepare".into(), "public function prepare($column)".into());
        });
        registry.register_reflect(WILDCARD, Arc::clone(&add_generic));
        registry.register_reflect(WILDCARD, Arc::clone(&add_generic));
        registry.register_reflect(
            "User",
            Arc::new(|_, sigs: &mut Signatures, docs| {
                let wildcard_ran = sigs.contains_key("prepare");
                sigs.insert("sendWelcome".into(), format!("docs={} after_wildcard={}", docs, wildcard_ran));
            }),
        );

        let mut sigs = Signatures::new();
        registry.reflect("User", &mut sigs, true);
        assert_eq!(sigs.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(sigs["sendWelcome"], "docs=true after_wildcard=true");

        registry.reset();
        let mut sigs = Signatures::new();
        registry.reflect("User", &mut sigs, false);
        assert!(sigs.is_empty());
    }
}
