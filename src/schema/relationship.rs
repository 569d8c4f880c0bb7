//! Relationship descriptors as reported by a schema, and the relationship-type filters used to select routes.

use crate::error::OrmError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RelationshipKind {
    #[serde(rename = "one-to-one")]
    OneToOne,
    #[serde(rename = "many-to-one")]
    ManyToOne,
    #[serde(rename = "one-to-many")]
    OneToMany,
    #[serde(rename = "many-to-many")]
    ManyToMany,
}

impl RelationshipKind {
    pub const ALL: [RelationshipKind; 4] = [
        RelationshipKind::OneToOne,
        RelationshipKind::ManyToOne,
        RelationshipKind::OneToMany,
        RelationshipKind::ManyToMany,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::OneToOne => "one-to-one",
            RelationshipKind::ManyToOne => "many-to-one",
            RelationshipKind::OneToMany => "one-to-many",
            RelationshipKind::ManyToMany => "many-to-many",
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One foreign-key path from `table` to `related_table`.
///
/// - many-to-one / one-to-one (owning side): `column` is our FK, `related_column` the referenced key.
/// - one-to-many / one-to-one (referenced side): `column` is our key, `related_column` their FK.
/// - many-to-many: `column` is our key, `related_column` theirs, and `join_table` holds
///   `join_column` (-> us) and `join_related_column` (-> them).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub kind: RelationshipKind,
    pub table: String,
    pub column: String,
    pub related_table: String,
    pub related_column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_related_column: Option<String>,
}

/// All relationships of one table, grouped by kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Relationships {
    pub one_to_one: Vec<Relationship>,
    pub many_to_one: Vec<Relationship>,
    pub one_to_many: Vec<Relationship>,
    pub many_to_many: Vec<Relationship>,
}

impl Relationships {
    pub fn of_kind(&self, kind: RelationshipKind) -> &[Relationship] {
        match kind {
            RelationshipKind::OneToOne => &self.one_to_one,
            RelationshipKind::ManyToOne => &self.many_to_one,
            RelationshipKind::OneToMany => &self.one_to_many,
            RelationshipKind::ManyToMany => &self.many_to_many,
        }
    }

    pub fn push(&mut self, relationship: Relationship) {
        match relationship.kind {
            RelationshipKind::OneToOne => self.one_to_one.push(relationship),
            RelationshipKind::ManyToOne => self.many_to_one.push(relationship),
            RelationshipKind::OneToMany => self.one_to_many.push(relationship),
            RelationshipKind::ManyToMany => self.many_to_many.push(relationship),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (RelationshipKind, &Relationship)> {
        RelationshipKind::ALL
            .into_iter()
            .flat_map(move |kind| self.of_kind(kind).iter().map(move |r| (kind, r)))
    }

    pub fn is_empty(&self) -> bool {
        RelationshipKind::ALL.iter().all(|k| self.of_kind(*k).is_empty())
    }
}

/// Relationship-type filter for route lookups. `Any` is the absent filter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RelationshipFilter {
    #[default]
    Any,
    /// `*-to-many`
    ToMany,
    /// `*-to-one`
    ToOne,
    /// `!many-to-one`
    NotManyToOne,
    Exact(RelationshipKind),
}

const VALID_FILTERS: &[&str] = &[
    "{null}",
    "*-to-many",
    "*-to-one",
    "!many-to-one",
    "many-to-many",
    "many-to-one",
    "one-to-many",
    "one-to-one",
];

impl RelationshipFilter {
    /// `None` is the absent filter.
    pub fn from_option(filter: Option<&str>) -> Result<Self, OrmError> {
        match filter {
            None => Ok(RelationshipFilter::Any),
            Some(s) => s.parse(),
        }
    }

    /// Cache-key and message form; the absent filter renders as "".
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipFilter::Any => "",
            RelationshipFilter::ToMany => "*-to-many",
            RelationshipFilter::ToOne => "*-to-one",
            RelationshipFilter::NotManyToOne => "!many-to-one",
            RelationshipFilter::Exact(kind) => kind.as_str(),
        }
    }

    pub fn matches(&self, kind: RelationshipKind) -> bool {
        match self {
            RelationshipFilter::Any => true,
            RelationshipFilter::ToMany => kind.as_str().contains("to-many"),
            RelationshipFilter::ToOne => kind.as_str().contains("to-one"),
            RelationshipFilter::NotManyToOne => kind != RelationshipKind::ManyToOne,
            RelationshipFilter::Exact(k) => *k == kind,
        }
    }
}

impl FromStr for RelationshipFilter {
    type Err = OrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "*-to-many" => RelationshipFilter::ToMany,
            "*-to-one" => RelationshipFilter::ToOne,
            "!many-to-one" => RelationshipFilter::NotManyToOne,
            "many-to-many" => RelationshipFilter::Exact(RelationshipKind::ManyToMany),
            "many-to-one" => RelationshipFilter::Exact(RelationshipKind::ManyToOne),
            "one-to-many" => RelationshipFilter::Exact(RelationshipKind::OneToMany),
            "one-to-one" => RelationshipFilter::Exact(RelationshipKind::OneToOne),
            _ => {
                return Err(OrmError::InvalidRelationshipFilter {
                    filter: s.to_string(),
                    valid: VALID_FILTERS.join(", "),
                })
            }
        })
    }
}

impl From<RelationshipKind> for RelationshipFilter {
    fn from(kind: RelationshipKind) -> Self {
        RelationshipFilter::Exact(kind)
    }
}

impl fmt::Display for RelationshipFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_matching() {
        use RelationshipKind::*;
        let to_many = RelationshipFilter::ToMany;
        assert!(to_many.matches(OneToMany) && to_many.matches(ManyToMany));
        assert!(!to_many.matches(ManyToOne) && !to_many.matches(OneToOne));

        let to_one = RelationshipFilter::ToOne;
        assert!(to_one.matches(OneToOne) && to_one.matches(ManyToOne));
        assert!(!to_one.matches(OneToMany));

        let not_many_to_one = RelationshipFilter::NotManyToOne;
        assert!(!not_many_to_one.matches(ManyToOne));
        assert!(not_many_to_one.matches(OneToOne) && not_many_to_one.matches(ManyToMany));

        assert!(RelationshipFilter::Any.matches(ManyToMany));
        assert!(RelationshipFilter::Exact(OneToMany).matches(OneToMany));
        assert!(!RelationshipFilter::Exact(OneToMany).matches(ManyToMany));
    }

    #[test]
    fn test_invalid_filter_lists_allowed_set() {
        let err = "many-to-few".parse::<RelationshipFilter>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("many-to-few"));
        for valid in VALID_FILTERS {
            assert!(msg.contains(valid), "missing {} in {}", valid, msg);
        }
    }

    #[test]
    fn test_filter_round_trips_through_str() {
        for s in &VALID_FILTERS[1..] {
            let filter: RelationshipFilter = s.parse().unwrap();
            assert_eq!(filter.as_str(), *s);
        }
        assert_eq!(RelationshipFilter::from_option(None).unwrap(), RelationshipFilter::Any);
    }
}
