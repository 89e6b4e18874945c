//! Versioned policy bundles and the matching engine.
//!
//! A [`PolicyBundle`] is the unit of distribution: an ordered collection of
//! [`Policy`] entries replaced wholesale on every apply. Order fixes match
//! precedence, so evaluation is deterministic for a given bundle, instant
//! and location.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::resource::{Location, Resource};
use super::rule::RuleSet;

/// Plugin-addressed configuration payload carried by a policy.
///
/// The blob is opaque to the enforcer; only the addressed plugin interprets
/// it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyContent {
    pub plugin_id: String,
    pub blob: Vec<u8>,
}

impl PolicyContent {
    pub fn new(plugin_id: impl Into<String>, blob: impl Into<Vec<u8>>) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            blob: blob.into(),
        }
    }
}

/// Half-open validity window `[start, end)`. An absent end means the policy
/// stays active indefinitely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    /// Window open from `start` onwards.
    pub fn starting(start: DateTime<Utc>) -> Self {
        Self { start, end: None }
    }

    /// Window covering `[start, end)`.
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    /// Whether the instant falls inside the window.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && self.end.map_or(true, |end| at < end)
    }
}

/// Explicit verdict a policy may render when its rules hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    Allow,
    Deny,
}

/// Atomic unit of policy: match criteria plus what holding them means.
///
/// A policy without an [`Effect`] matches without rendering a verdict; a
/// policy without contents is evaluated for answering only and never pushed
/// to a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Unique within a bundle.
    pub uuid: Uuid,

    pub description: String,

    /// Match criteria evaluated against the assembled request.
    pub rules: RuleSet,

    /// Validity window; outside it the policy never participates.
    pub window: TimeWindow,

    /// Optional scope: a scoped policy applies only at that location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,

    /// Optional explicit verdict.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<Effect>,

    /// Plugin-addressed payloads.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contents: Vec<PolicyContent>,
}

impl Policy {
    /// New policy active from now on, with no verdict, scope or contents.
    pub fn new(description: impl Into<String>, rules: RuleSet) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            description: description.into(),
            rules,
            window: TimeWindow::starting(Utc::now()),
            location: None,
            effect: None,
            contents: Vec::new(),
        }
    }

    /// Replace the validity window.
    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = window;
        self
    }

    /// Scope the policy to a location.
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Attach an explicit verdict.
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effect = Some(effect);
        self
    }

    /// Append a plugin payload.
    pub fn with_content(mut self, content: PolicyContent) -> Self {
        self.contents.push(content);
        self
    }

    /// Whether the policy participates in matching at the given instant and
    /// place. Evaluation at an unknown location cannot satisfy a scoped
    /// policy.
    pub fn applicable(&self, at: DateTime<Utc>, location: Option<&Location>) -> bool {
        if !self.window.contains(at) {
            return false;
        }
        match (&self.location, location) {
            (None, _) => true,
            (Some(scope), Some(here)) => scope == here,
            (Some(_), None) => false,
        }
    }

    /// Whether any of the policy's contents are addressed to the plugin.
    pub fn targets_plugin(&self, plugin_id: &str) -> bool {
        self.contents.iter().any(|c| c.plugin_id == plugin_id)
    }
}

/// Result of evaluating a resource against a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Some applicable policy matched the resource.
    pub valid: bool,

    /// A matching policy rendered an explicit verdict.
    pub accept: bool,

    /// That verdict was a permit.
    pub allow: bool,
}

impl MatchOutcome {
    /// Request-level predicate: permitted when some policy matched and no
    /// explicit verdict denied. An indeterminate outcome is not permitted.
    pub fn permitted(&self) -> bool {
        self.valid && (!self.accept || self.allow)
    }
}

/// Ordered, versioned collection of policies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyBundle {
    /// Monotonic bundle version assigned by the control plane.
    pub version: u64,

    pub description: String,

    pub policies: Vec<Policy>,
}

impl PolicyBundle {
    pub fn new(version: u64, description: impl Into<String>) -> Self {
        Self {
            version,
            description: description.into(),
            policies: Vec::new(),
        }
    }

    /// Append a policy, after any already present.
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policies.push(policy);
        self
    }

    /// Evaluate a resource at an instant and (optionally known) location.
    ///
    /// Policies are scanned in bundle order. The first applicable policy
    /// whose rules hold establishes validity; the first such policy carrying
    /// an explicit effect decides the verdict and ends the scan. Matches
    /// without an effect never shadow a later verdict.
    pub fn match_resource(
        &self,
        resource: &Resource,
        at: DateTime<Utc>,
        location: Option<&Location>,
    ) -> MatchOutcome {
        let mut valid = false;
        for policy in &self.policies {
            if !policy.applicable(at, location) || !policy.rules.matches(&resource.name) {
                continue;
            }
            valid = true;
            if let Some(effect) = policy.effect {
                return MatchOutcome {
                    valid: true,
                    accept: true,
                    allow: effect == Effect::Allow,
                };
            }
        }
        MatchOutcome {
            valid,
            accept: false,
            allow: false,
        }
    }

    /// Policies satisfying the predicate, in bundle order.
    pub fn filter<P>(&self, predicate: P) -> Vec<&Policy>
    where
        P: Fn(&Policy) -> bool,
    {
        self.policies.iter().filter(|p| predicate(p)).collect()
    }
}
