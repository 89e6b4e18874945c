use serde::{Deserialize, Serialize};

use super::rule::{Rule, RuleSet};

/// Name/value identity assertion presented with a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub name: String,
    pub value: String,
}

impl Credential {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Named physical or logical placement of an enforcer or a policy scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
}

impl Location {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// An assembled request: the conjunction of its properties plus the
/// credential presenting it. Built fresh per evaluation, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub name: RuleSet,
    pub identified_by: Credential,
}

impl Resource {
    /// Compose request properties into a resource.
    ///
    /// Every property must be matchable, so the list folds with AND. Returns
    /// `None` when no properties are given; a request asserting nothing must
    /// not match everything.
    pub fn assemble(properties: &[Rule], identified_by: Credential) -> Option<Self> {
        let mut rules = properties.iter().cloned();
        let first = RuleSet::leaf(rules.next()?);
        let name = rules.fold(first, |tree, rule| tree.and(RuleSet::leaf(rule)));
        Some(Self {
            name,
            identified_by,
        })
    }
}
