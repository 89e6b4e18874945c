//! Policy data model: rules, resources, and versioned policy bundles,
//! plus the matching engine that evaluates requests against them.

mod bundle;
mod resource;
mod rule;

pub use bundle::{Effect, MatchOutcome, Policy, PolicyBundle, PolicyContent, TimeWindow};
pub use resource::{Credential, Location, Resource};
pub use rule::{Rule, RuleSet};
