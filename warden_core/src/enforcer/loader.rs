use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::plugin::{Plugin, PluginError};

/// Capability for acquiring plugin instances by id, so deployments can swap
/// how plugin code reaches the process without touching the enforcer.
pub trait PluginLoader: Send + Sync {
    /// Produce the plugin registered under `id`.
    fn load(&self, id: &str) -> Result<Arc<dyn Plugin>, PluginError>;

    /// Release the plugin registered under `id`.
    fn unload(&self, id: &str) -> Result<(), PluginError>;
}

/// Loader over a table of statically linked plugins.
#[derive(Default)]
pub struct StaticPluginLoader {
    plugins: HashMap<String, Arc<dyn Plugin>>,
}

impl StaticPluginLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plugin to the table, keyed by its own id.
    pub fn with_plugin(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.plugins.insert(plugin.id().to_string(), plugin);
        self
    }
}

impl PluginLoader for StaticPluginLoader {
    fn load(&self, id: &str) -> Result<Arc<dyn Plugin>, PluginError> {
        debug!("Loading plugin {}", id);
        self.plugins
            .get(id)
            .cloned()
            .ok_or_else(|| PluginError::NotFound(id.to_string()))
    }

    fn unload(&self, id: &str) -> Result<(), PluginError> {
        // Statically linked code cannot be released.
        debug!("Unload of plugin {} is a no-op", id);
        Ok(())
    }
}
