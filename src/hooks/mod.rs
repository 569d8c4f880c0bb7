//! Lifecycle hook registry. Handlers registered for `"*"` run for every entity type.

mod hook;
mod introspection;

pub use hook::Hook;
pub use introspection::{ColumnMetadata, InspectHandler, IntrospectionRegistry, ReflectHandler, Signatures};

use crate::error::{HandlerError, OrmError};
use crate::value::Value;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Entity type matching every entity in hook, dispatch and reflect tables.
pub const WILDCARD: &str = "*";

/// A record handed to hook and method handlers. `as_any` lets handlers downcast to the concrete type.
pub trait Record {
    fn entity_type(&self) -> &str;
    fn as_any(&self) -> &dyn Any;
}

/// Hook-specific extra argument.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum HookParameter {
    #[default]
    None,
    /// Messages collected by `pre::validate()` / `post::validate()`.
    ValidationMessages(Vec<String>),
    /// Nesting depth for the replicate hooks.
    ReplicationLevel(u32),
}

/// Mutable record state threaded through a hook chain. Each handler takes it by value and
/// returns the (possibly modified) context for the next one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HookContext {
    pub values: HashMap<String, Value>,
    pub old_values: HashMap<String, Vec<Value>>,
    pub related_records: HashMap<String, serde_json::Value>,
    pub cache: HashMap<String, serde_json::Value>,
    pub parameter: HookParameter,
}

impl HookContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parameter(mut self, parameter: HookParameter) -> Self {
        self.parameter = parameter;
        self
    }
}

pub type HookHandler = Arc<dyn Fn(&dyn Record, HookContext) -> Result<HookContext, HandlerError> + Send + Sync>;

fn same_handler(a: &HookHandler, b: &HookHandler) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

#[derive(Default)]
pub struct HookRegistry {
    handlers: HashMap<String, HashMap<Hook, Vec<HookHandler>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler; handlers for one entity and hook run in registration order.
    pub fn register(&mut self, entity_type: impl Into<String>, hook: Hook, handler: HookHandler) {
        let entity_type = entity_type.into();
        tracing::debug!(entity_type = %entity_type, hook = %hook, "registered hook handler");
        self.handlers
            .entry(entity_type)
            .or_default()
            .entry(hook)
            .or_default()
            .push(handler);
    }

    /// Like `register`, with the hook given by its string form, e.g. `"pre::store()"`.
    pub fn register_named(
        &mut self,
        entity_type: impl Into<String>,
        hook: &str,
        handler: HookHandler,
    ) -> Result<(), OrmError> {
        let hook: Hook = hook.parse()?;
        self.register(entity_type, hook, handler);
        Ok(())
    }

    fn handlers_for(&self, entity_type: &str, hook: Hook) -> &[HookHandler] {
        self.handlers
            .get(entity_type)
            .and_then(|hooks| hooks.get(&hook))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Runs wildcard handlers, then the record's own, threading `context` through each.
    /// The first failing handler stops the chain.
    pub fn invoke(&self, record: &dyn Record, hook: Hook, context: HookContext) -> Result<HookContext, OrmError> {
        let entity_type = record.entity_type();
        let wildcard = self.handlers_for(WILDCARD, hook);
        let concrete = self.handlers_for(entity_type, hook);
        if wildcard.is_empty() && concrete.is_empty() {
            return Ok(context);
        }

        wildcard
            .iter()
            .chain(concrete)
            .try_fold(context, |context, handler| {
                handler(record, context).map_err(|source| OrmError::Handler {
                    site: hook.as_str().to_string(),
                    entity_type: entity_type.to_string(),
                    source,
                })
            })
    }

    /// Whether any handler (or this specific one) is registered for the entity type or `"*"`.
    pub fn is_registered(&self, entity_type: &str, hook: Hook, handler: Option<&HookHandler>) -> bool {
        let mut candidates = self
            .handlers_for(entity_type, hook)
            .iter()
            .chain(self.handlers_for(WILDCARD, hook));
        match handler {
            None => candidates.next().is_some(),
            Some(handler) => candidates.any(|h| same_handler(h, handler)),
        }
    }

    pub fn reset(&mut self) {
        self.handlers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct User;

    impl Record for User {
        fn entity_type(&self) -> &str {
            "User"
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, tag: &'static str) -> HookHandler {
        let log = Arc::clone(log);
        Arc::new(move |_, ctx| {
            log.lock().unwrap().push(tag);
            Ok(ctx)
        })
    }

    #[test]
    fn test_wildcard_handlers_run_first() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut hooks = HookRegistry::new();
        hooks.register("User", Hook::PreStore, recorder(&log, "user-1"));
        hooks.register(WILDCARD, Hook::PreStore, recorder(&log, "any"));
        hooks.register("User", Hook::PreStore, recorder(&log, "user-2"));
        hooks.register("Group", Hook::PreStore, recorder(&log, "group"));

        hooks.invoke(&User, Hook::PreStore, HookContext::new()).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["any", "user-1", "user-2"]);
    }

    #[test]
    fn test_context_threads_through_handlers() {
        let mut hooks = HookRegistry::new();
        hooks.register(
            "User",
            Hook::PostValidate,
            Arc::new(|_, mut ctx: HookContext| {
                if let HookParameter::ValidationMessages(messages) = &mut ctx.parameter {
                    messages.push("Name: Please enter a value".to_string());
                }
                Ok(ctx)
            }),
        );
        hooks.register(
            "User",
            Hook::PostValidate,
            Arc::new(|record, mut ctx: HookContext| {
                assert!(record.as_any().downcast_ref::<User>().is_some());
                ctx.values.insert("seen".into(), Value::Bool(true));
                Ok(ctx)
            }),
        );

        let ctx = HookContext::new().with_parameter(HookParameter::ValidationMessages(Vec::new()));
        let ctx = hooks.invoke(&User, Hook::PostValidate, ctx).unwrap();
        assert_eq!(
            ctx.parameter,
            HookParameter::ValidationMessages(vec!["Name: Please enter a value".to_string()])
        );
        assert_eq!(ctx.values.get("seen"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_handler_failure_stops_chain() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut hooks = HookRegistry::new();
        hooks.register("User", Hook::PreDelete, Arc::new(|_, _| Err("locked".into())));
        hooks.register("User", Hook::PreDelete, recorder(&log, "after"));

        let err = hooks.invoke(&User, Hook::PreDelete, HookContext::new()).unwrap_err();
        assert_eq!(err.code(), "handler_error");
        assert!(!err.is_programmer_error());
        assert_eq!(err.to_string(), "pre::delete() handler failed for User: locked");
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_invoke_without_handlers_returns_context() {
        let hooks = HookRegistry::new();
        let mut ctx = HookContext::new();
        ctx.cache.insert("k".into(), serde_json::json!(1));
        let out = hooks.invoke(&User, Hook::PostConstruct, ctx.clone()).unwrap();
        assert_eq!(out, ctx);
    }

    #[test]
    fn test_is_registered_checks_identity_and_wildcard() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let handler = recorder(&log, "a");
        let other = recorder(&log, "b");
        let mut hooks = HookRegistry::new();
        assert!(!hooks.is_registered("User", Hook::PostStore, None));

        hooks.register(WILDCARD, Hook::PostStore, Arc::clone(&handler));
        assert!(hooks.is_registered("User", Hook::PostStore, None));
        assert!(hooks.is_registered("User", Hook::PostStore, Some(&handler)));
        assert!(!hooks.is_registered("User", Hook::PostStore, Some(&other)));
        assert!(!hooks.is_registered("User", Hook::PreStore, None));

        hooks.reset();
        assert!(!hooks.is_registered("User", Hook::PostStore, None));
    }

    #[test]
    fn test_register_named_rejects_unknown_hook() {
        let mut hooks = HookRegistry::new();
        let err = hooks
            .register_named("User", "pre::save()", Arc::new(|_, ctx| Ok(ctx)))
            .unwrap_err();
        assert_eq!(err.code(), "invalid_hook");
        hooks
            .register_named("User", "pre::store()", Arc::new(|_, ctx| Ok(ctx)))
            .unwrap();
        assert!(hooks.is_registered("User", Hook::PreStore, None));
    }
}
