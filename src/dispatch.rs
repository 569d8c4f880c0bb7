//! Virtual-method dispatch for records and record sets.
//!
//! A method pattern is either an exact method name (`getName`) or an action wildcard (`get*`)
//! matching every `get` + subject method. Lookup order for a record method:
//! `(T, method)`, `("*", method)`, then, when the method has a subject, `(T, action*)`, `("*", action*)`.

use crate::cache;
use crate::error::{HandlerError, OrmError};
use crate::hooks::{HookContext, Record, WILDCARD};
use crate::value::Value;
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, RwLock};

static METHOD_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([a-z]+)(.*)$").unwrap());

/// Handler for a record method: `(record, record state, method, args) -> return value`.
pub type MethodHandler =
    Arc<dyn Fn(&dyn Record, &mut HookContext, &str, &[Value]) -> Result<Value, HandlerError> + Send + Sync>;

/// Handler for a record-set method: `(entity type, records, method, args) -> return value`.
pub type RecordSetHandler =
    Arc<dyn Fn(&str, &[&dyn Record], &str, &[Value]) -> Result<Value, HandlerError> + Send + Sync>;

/// Splits `getName` into `("get", "Name")`. Fails when the name does not start with a lowercase letter.
pub fn parse_method(method: &str) -> Result<(String, String), OrmError> {
    let caps = METHOD_NAME.captures(method).ok_or_else(|| OrmError::InvalidMethod {
        method: method.to_string(),
    })?;
    Ok((caps[1].to_string(), caps[2].to_string()))
}

/// Only names with an uppercase letter or digit carry a subject worth wildcard matching.
fn has_subject(method: &str) -> bool {
    method.chars().any(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// Ordered `(entity_type, pattern)` pairs to try for a method. `action` is the parsed action,
/// present only when the method has a subject.
pub fn candidate_patterns(entity_type: &str, method: &str, action: Option<&str>) -> Vec<(String, String)> {
    let mut candidates = vec![
        (entity_type.to_string(), method.to_string()),
        (WILDCARD.to_string(), method.to_string()),
    ];
    if let Some(action) = action {
        let pattern = format!("{}*", action);
        candidates.push((entity_type.to_string(), pattern.clone()));
        candidates.push((WILDCARD.to_string(), pattern));
    }
    candidates
}

/// Memoizes `parse_method` per method name.
#[derive(Default)]
struct MethodParser {
    parsed: RwLock<HashMap<String, (String, String)>>,
}

impl MethodParser {
    fn action(&self, method: &str) -> Result<Option<String>, OrmError> {
        if !has_subject(method) {
            return Ok(None);
        }
        if let Some((action, _)) = cache::read(&self.parsed).get(method) {
            return Ok(Some(action.clone()));
        }
        let parsed = parse_method(method)?;
        let action = parsed.0.clone();
        cache::write(&self.parsed).insert(method.to_string(), parsed);
        Ok(Some(action))
    }
}

#[derive(Clone)]
enum Resolution {
    Found(MethodHandler),
    Absent,
}

#[derive(Default)]
pub struct MethodDispatcher {
    handlers: HashMap<String, HashMap<String, MethodHandler>>,
    resolved: RwLock<HashMap<String, Resolution>>,
    parser: MethodParser,
}

impl MethodDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `pattern` for the entity type (or `"*"`). Any registration invalidates every memoized lookup.
    pub fn register(&mut self, entity_type: impl Into<String>, pattern: impl Into<String>, handler: MethodHandler) {
        let entity_type = entity_type.into();
        let pattern = pattern.into();
        tracing::debug!(entity_type = %entity_type, pattern = %pattern, "registered record method");
        self.handlers.entry(entity_type).or_default().insert(pattern, handler);
        cache::get_mut(&mut self.resolved).clear();
    }

    pub fn resolve_method(&self, entity_type: &str, method: &str) -> Result<Option<MethodHandler>, OrmError> {
        let key = format!("{}::{}", entity_type, method);
        if let Some(resolution) = cache::read(&self.resolved).get(&key) {
            return Ok(match resolution {
                Resolution::Found(handler) => Some(Arc::clone(handler)),
                Resolution::Absent => None,
            });
        }

        let action = self.parser.action(method)?;
        let found = candidate_patterns(entity_type, method, action.as_deref())
            .into_iter()
            .find_map(|(entity, pattern)| {
                self.handlers
                    .get(&entity)
                    .and_then(|patterns| patterns.get(&pattern))
                    .cloned()
            });
        tracing::debug!(method = %key, found = found.is_some(), "resolved record method");

        let resolution = match &found {
            Some(handler) => Resolution::Found(Arc::clone(handler)),
            None => Resolution::Absent,
        };
        cache::write(&self.resolved).insert(key, resolution);
        Ok(found)
    }

    /// Resolves and runs the handler for `method`; `Ok(None)` when nothing is registered.
    pub fn call(
        &self,
        record: &dyn Record,
        context: &mut HookContext,
        method: &str,
        args: &[Value],
    ) -> Result<Option<Value>, OrmError> {
        let entity_type = record.entity_type();
        let Some(handler) = self.resolve_method(entity_type, method)? else {
            return Ok(None);
        };
        handler(record, context, method, args)
            .map(Some)
            .map_err(|source| OrmError::Handler {
                site: format!("{}()", method),
                entity_type: entity_type.to_string(),
                source,
            })
    }

    pub fn reset(&mut self) {
        self.handlers.clear();
        cache::get_mut(&mut self.resolved).clear();
        cache::get_mut(&mut self.parser.parsed).clear();
    }
}

/// Single-level dispatch for record sets: exact name, then `action*`. Not memoized.
#[derive(Default)]
pub struct RecordSetDispatcher {
    handlers: HashMap<String, RecordSetHandler>,
    parser: MethodParser,
}

impl RecordSetDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, pattern: impl Into<String>, handler: RecordSetHandler) {
        let pattern = pattern.into();
        tracing::debug!(pattern = %pattern, "registered record set method");
        self.handlers.insert(pattern, handler);
    }

    pub fn resolve(&self, method: &str) -> Result<Option<RecordSetHandler>, OrmError> {
        if let Some(handler) = self.handlers.get(method) {
            return Ok(Some(Arc::clone(handler)));
        }
        let Some(action) = self.parser.action(method)? else {
            return Ok(None);
        };
        Ok(self.handlers.get(&format!("{}*", action)).cloned())
    }

    pub fn call(
        &self,
        entity_type: &str,
        records: &[&dyn Record],
        method: &str,
        args: &[Value],
    ) -> Result<Option<Value>, OrmError> {
        let Some(handler) = self.resolve(method)? else {
            return Ok(None);
        };
        handler(entity_type, records, method, args)
            .map(Some)
            .map_err(|source| OrmError::Handler {
                site: format!("{}()", method),
                entity_type: entity_type.to_string(),
                source,
            })
    }

    pub fn reset(&mut self) {
        self.handlers.clear();
        cache::get_mut(&mut self.parser.parsed).clear();
    }
}
