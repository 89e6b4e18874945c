//! Rules and the boolean expression trees built from them.
//!
//! A [`Rule`] asserts a single property of a request; a [`RuleSet`] combines
//! rules into an expression tree that is evaluated against the property tree
//! of an assembled resource.

use serde::{Deserialize, Serialize};

/// Leaf predicate: a named request property and the exact value it must carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Property the rule constrains, e.g. `protocol` or `dest_port`.
    pub property: String,

    /// Value the property must equal. No wildcards.
    pub value: String,
}

impl Rule {
    /// Create a new rule.
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }
}

/// Boolean expression tree over [`Rule`] leaves.
///
/// Trees are built with [`RuleSet::leaf`] and the [`and`](RuleSet::and) /
/// [`or`](RuleSet::or) combinators; chaining combinators left to right
/// produces a left-leaning tree. Evaluation short-circuits and has no side
/// effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSet {
    /// A single rule.
    Leaf(Rule),

    /// Both subtrees must hold.
    And(Box<RuleSet>, Box<RuleSet>),

    /// At least one subtree must hold.
    Or(Box<RuleSet>, Box<RuleSet>),
}

impl RuleSet {
    /// Wrap a single rule.
    pub fn leaf(rule: Rule) -> Self {
        Self::Leaf(rule)
    }

    /// Conjunction of this tree and another.
    pub fn and(self, other: RuleSet) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    /// Disjunction of this tree and another.
    pub fn or(self, other: RuleSet) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    /// Whether this tree holds over the given request tree.
    ///
    /// A leaf holds when the request carries its exact property/value pair.
    pub fn matches(&self, request: &RuleSet) -> bool {
        match self {
            Self::Leaf(rule) => request.contains(rule),
            Self::And(left, right) => left.matches(request) && right.matches(request),
            Self::Or(left, right) => left.matches(request) || right.matches(request),
        }
    }

    /// Whether any leaf of this tree is exactly the given rule.
    pub fn contains(&self, rule: &Rule) -> bool {
        match self {
            Self::Leaf(own) => own == rule,
            Self::And(left, right) | Self::Or(left, right) => {
                left.contains(rule) || right.contains(rule)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(rules: &[Rule]) -> RuleSet {
        let mut iter = rules.iter().cloned();
        let first = RuleSet::leaf(iter.next().unwrap());
        iter.fold(first, |tree, rule| tree.and(RuleSet::leaf(rule)))
    }

    #[test]
    fn test_leaf_matches_exact_pair() {
        let tree = RuleSet::leaf(Rule::new("protocol", "tcp"));
        assert!(tree.matches(&request(&[Rule::new("protocol", "tcp")])));
        assert!(!tree.matches(&request(&[Rule::new("protocol", "udp")])));
        assert!(!tree.matches(&request(&[Rule::new("proto", "tcp")])));
    }

    #[test]
    fn test_and_requires_both() {
        let tree = RuleSet::leaf(Rule::new("protocol", "tcp")).and(RuleSet::leaf(Rule::new(
            "dest_port",
            "443",
        )));
        assert!(tree.matches(&request(&[
            Rule::new("protocol", "tcp"),
            Rule::new("dest_port", "443"),
        ])));
        assert!(!tree.matches(&request(&[Rule::new("protocol", "tcp")])));
    }

    #[test]
    fn test_and_is_order_independent() {
        let tree = RuleSet::leaf(Rule::new("a", "1")).and(RuleSet::leaf(Rule::new("b", "2")));
        let forwards = request(&[Rule::new("a", "1"), Rule::new("b", "2")]);
        let backwards = request(&[Rule::new("b", "2"), Rule::new("a", "1")]);
        assert!(tree.matches(&forwards));
        assert!(tree.matches(&backwards));
    }

    #[test]
    fn test_or_requires_either() {
        let tree = RuleSet::leaf(Rule::new("protocol", "tcp")).or(RuleSet::leaf(Rule::new(
            "protocol",
            "udp",
        )));
        assert!(tree.matches(&request(&[Rule::new("protocol", "udp")])));
        assert!(tree.matches(&request(&[Rule::new("protocol", "tcp")])));
        assert!(!tree.matches(&request(&[Rule::new("protocol", "icmp")])));
    }

    #[test]
    fn test_combinators_lean_left() {
        let built = RuleSet::leaf(Rule::new("a", "1"))
            .and(RuleSet::leaf(Rule::new("b", "2")))
            .and(RuleSet::leaf(Rule::new("c", "3")));
        let expected = RuleSet::And(
            Box::new(RuleSet::And(
                Box::new(RuleSet::leaf(Rule::new("a", "1"))),
                Box::new(RuleSet::leaf(Rule::new("b", "2"))),
            )),
            Box::new(RuleSet::leaf(Rule::new("c", "3"))),
        );
        assert_eq!(built, expected);
    }

    #[test]
    fn test_nested_composition() {
        // (protocol == tcp AND dest_port == 443) OR protocol == icmp
        let tree = RuleSet::leaf(Rule::new("protocol", "tcp"))
            .and(RuleSet::leaf(Rule::new("dest_port", "443")))
            .or(RuleSet::leaf(Rule::new("protocol", "icmp")));
        assert!(tree.matches(&request(&[Rule::new("protocol", "icmp")])));
        assert!(tree.matches(&request(&[
            Rule::new("protocol", "tcp"),
            Rule::new("dest_port", "443"),
        ])));
        assert!(!tree.matches(&request(&[Rule::new("protocol", "tcp")])));
    }
}
