//! Route resolution: which foreign-key paths connect two tables, and which one a caller means.
//!
//! Several foreign keys can connect the same pair of tables (a book's `author_id` and `editor_id`
//! both pointing at `person`). Each path is a route, named by the column that identifies it, and a
//! caller must name one whenever more than one matches.

use crate::cache;
use crate::error::{filter_phrase, OrmError};
use crate::schema::{Relationship, RelationshipFilter, RelationshipKind, Schema};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

/// Route name -> relationship.
pub type Routes = BTreeMap<String, Relationship>;

/// The name a relationship is addressed by: the join table for many-to-many, the related
/// column for one-to-many, our own column otherwise.
pub fn route_name_from_relationship(kind: RelationshipKind, relationship: &Relationship) -> String {
    match (kind, &relationship.join_table) {
        (_, Some(join_table)) => join_table.clone(),
        (RelationshipKind::OneToMany, None) => relationship.related_column.clone(),
        _ => relationship.column.clone(),
    }
}

fn route_list(routes: &Routes) -> String {
    routes.keys().cloned().collect::<Vec<_>>().join(", ")
}

/// Computes and caches route sets for one schema. Entries are never invalidated except by `reset`.
#[derive(Default)]
pub struct RouteResolver {
    cache: RwLock<HashMap<String, Arc<Routes>>>,
}

impl RouteResolver {
    pub fn new() -> Self {
        RouteResolver {
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// All routes from `table` to `related_table` whose kind passes `filter`.
    pub fn routes_between(
        &self,
        schema: &dyn Schema,
        table: &str,
        related_table: &str,
        filter: RelationshipFilter,
    ) -> Result<Arc<Routes>, OrmError> {
        let key = format!("{}::{}::{}", table, related_table, filter);
        if let Some(routes) = cache::read(&self.cache).get(&key) {
            return Ok(Arc::clone(routes));
        }

        if !schema.tables().contains(related_table) {
            return Err(OrmError::UnknownTable {
                table: related_table.to_string(),
            });
        }

        let mut routes = Routes::new();
        for (kind, relationship) in schema.relationships(table).iter() {
            if !filter.matches(kind) || relationship.related_table != related_table {
                continue;
            }
            let name = route_name_from_relationship(kind, relationship);
            if routes.contains_key(&name) {
                tracing::warn!(key = %key, route = %name, "duplicate route name, keeping the first");
                continue;
            }
            routes.insert(name, relationship.clone());
        }
        tracing::debug!(key = %key, routes = routes.len(), "computed routes");

        let routes = Arc::new(routes);
        cache::write(&self.cache).insert(key, Arc::clone(&routes));
        Ok(routes)
    }

    /// The route to use between two tables: `preselected` if it is valid, otherwise the only route.
    pub fn resolve_route_name(
        &self,
        schema: &dyn Schema,
        table: &str,
        related_table: &str,
        preselected: Option<&str>,
        filter: RelationshipFilter,
    ) -> Result<String, OrmError> {
        let routes = self.routes_between(schema, table, related_table, filter)?;

        if let Some(route) = preselected.filter(|r| !r.is_empty()) {
            if routes.contains_key(route) {
                return Ok(route.to_string());
            }
            return Err(OrmError::InvalidRoute {
                route: route.to_string(),
                table: table.to_string(),
                related_table: related_table.to_string(),
                valid: route_list(&routes),
            });
        }

        let mut names = routes.keys();
        match (names.next(), names.next()) {
            (Some(only), None) => Ok(only.clone()),
            (None, _) => Err(OrmError::NotRelated {
                table: table.to_string(),
                related_table: related_table.to_string(),
                filter: filter_phrase(filter.as_str()),
            }),
            (Some(_), Some(_)) => Err(OrmError::AmbiguousRoute {
                filter: filter_phrase(filter.as_str()),
                table: table.to_string(),
                related_table: related_table.to_string(),
                routes: route_list(&routes),
            }),
        }
    }

    /// The relationship behind a route, resolving the default route when none is preselected.
    pub fn route(
        &self,
        schema: &dyn Schema,
        table: &str,
        related_table: &str,
        preselected: Option<&str>,
        filter: RelationshipFilter,
    ) -> Result<Relationship, OrmError> {
        let name = self.resolve_route_name(schema, table, related_table, preselected, filter)?;
        let routes = self.routes_between(schema, table, related_table, filter)?;
        routes.get(&name).cloned().ok_or_else(|| OrmError::InvalidRoute {
            route: name,
            table: table.to_string(),
            related_table: related_table.to_string(),
            valid: route_list(&routes),
        })
    }

    /// Whether `table` is one-to-one with `related_table`, over `route` if given.
    ///
    /// `route` is compared against one-to-one route names (the owning column). A route that is not a
    /// one-to-one route yields `false`. Without a route, more than one one-to-one route is ambiguous.
    pub fn is_one_to_one(
        &self,
        schema: &dyn Schema,
        table: &str,
        related_table: &str,
        route: Option<&str>,
    ) -> Result<bool, OrmError> {
        let filter = RelationshipFilter::Exact(RelationshipKind::OneToOne);
        let routes = self.routes_between(schema, table, related_table, filter)?;
        match route {
            None if routes.len() > 1 => Err(OrmError::AmbiguousRoute {
                filter: filter_phrase(filter.as_str()),
                table: table.to_string(),
                related_table: related_table.to_string(),
                routes: route_list(&routes),
            }),
            None => Ok(!routes.is_empty()),
            Some(route) => Ok(routes.contains_key(route)),
        }
    }

    pub fn reset(&mut self) {
        cache::get_mut(&mut self.cache).clear();
    }
}
