//! The enforcement point façade: request answering, bundle apply/fetch, and
//! the plugin and handler registries that keep distributed enforcement state
//! consistent with the authoritative policy bundle.

mod engine;
mod events;
mod loader;
mod plugin;

pub use engine::Enforcer;
pub use events::{PolicyEvent, PolicyEventHandler};
pub use loader::{PluginLoader, StaticPluginLoader};
pub use plugin::{Plugin, PluginError};
