pub mod enforcer;
pub mod policy;
pub mod store;

pub use enforcer::{
    Enforcer, Plugin, PluginError, PluginLoader, PolicyEvent, PolicyEventHandler,
    StaticPluginLoader,
};
pub use policy::{
    Credential, Effect, Location, MatchOutcome, Policy, PolicyBundle, PolicyContent, Resource,
    Rule, RuleSet, TimeWindow,
};
pub use store::{FileRepository, MemoryRepository, PolicyRepository, StoreError};
