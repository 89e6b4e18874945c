use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use super::events::{PolicyEvent, PolicyEventHandler};
use super::plugin::Plugin;
use crate::policy::{Credential, Location, PolicyBundle, Resource, Rule};
use crate::store::PolicyRepository;

const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(5);

/// A registered plugin and its lifecycle state.
struct LoadedPlugin {
    plugin: Arc<dyn Plugin>,
    enabled: bool,
}

/// The enforcement point: answers requests against the authoritative policy
/// bundle and keeps registered plugins and event handlers consistent with it.
///
/// All state sits behind interior locks, so one `Enforcer` serves concurrent
/// callers through an `Arc`. Infrastructure failures never escape as errors;
/// they are logged and folded into the boolean results, denying by default.
pub struct Enforcer {
    repository: Arc<dyn PolicyRepository>,
    location: Location,
    credential: Credential,
    io_timeout: Duration,
    plugins: RwLock<HashMap<String, LoadedPlugin>>,
    handlers: RwLock<HashMap<String, Arc<dyn PolicyEventHandler>>>,
    // Serializes lifecycle transitions so their fetch-push-flip sequences
    // never interleave. Registry locks are only taken briefly inside a
    // transition and never across repository I/O.
    lifecycle: Mutex<()>,
}

impl Enforcer {
    /// Create an enforcer bound to a repository, evaluating at `location`
    /// and identifying itself with `credential`.
    pub fn new(
        repository: Arc<dyn PolicyRepository>,
        location: Location,
        credential: Credential,
    ) -> Self {
        Self {
            repository,
            location,
            credential,
            io_timeout: DEFAULT_IO_TIMEOUT,
            plugins: RwLock::new(HashMap::new()),
            handlers: RwLock::new(HashMap::new()),
            lifecycle: Mutex::new(()),
        }
    }

    /// Replace the bound on repository I/O (default 5s). A repository that
    /// does not answer within the bound counts as failed.
    pub fn with_io_timeout(mut self, io_timeout: Duration) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    /// The location this enforcer evaluates at.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// The credential this enforcer presents as its own identity.
    pub fn service_credential(&self) -> &Credential {
        &self.credential
    }

    /// Answer whether the request described by `properties` and presented by
    /// `credential` is permitted under the current bundle.
    ///
    /// Fails closed: an empty property list, an unreachable bundle and an
    /// indeterminate match all deny.
    pub async fn answer(&self, properties: &[Rule], credential: &Credential) -> bool {
        let resource = match Resource::assemble(properties, credential.clone()) {
            Some(resource) => resource,
            None => {
                warn!("Refusing to answer a request without properties");
                return false;
            }
        };

        let bundle = match self.fetch().await {
            Some(bundle) => bundle,
            None => return false,
        };

        let outcome = bundle.match_resource(&resource, Utc::now(), Some(&self.location));
        debug!(
            "Answered request from {}: valid={} accept={} allow={}",
            resource.identified_by.name, outcome.valid, outcome.accept, outcome.allow
        );
        outcome.permitted()
    }

    /// The current bundle, or `None` when the repository fails, times out or
    /// holds nothing. Failures are absorbed here so callers stay on the
    /// boolean contract.
    pub async fn fetch(&self) -> Option<PolicyBundle> {
        match timeout(self.io_timeout, self.repository.get()).await {
            Ok(Ok(bundle)) => Some(bundle),
            Ok(Err(e)) => {
                error!("Failed to fetch policy bundle: {}", e);
                None
            }
            Err(_) => {
                error!(
                    "Policy repository did not answer within {:?}",
                    self.io_timeout
                );
                None
            }
        }
    }

    /// Persist a new bundle and notify every registered handler of the
    /// outcome. Returns whether the bundle was persisted.
    pub async fn apply(&self, bundle: &PolicyBundle) -> bool {
        match timeout(self.io_timeout, self.repository.save(bundle)).await {
            Ok(Ok(())) => {
                info!("Applied policy bundle version {}", bundle.version);
                self.notify(PolicyEvent::Apply, bundle, "");
                true
            }
            Ok(Err(e)) => {
                error!("Failed to apply policy bundle: {}", e);
                self.notify(PolicyEvent::ApplyError, bundle, &e.to_string());
                false
            }
            Err(_) => {
                error!(
                    "Policy repository did not answer within {:?}",
                    self.io_timeout
                );
                self.notify(PolicyEvent::ApplyError, bundle, "policy repository timed out");
                false
            }
        }
    }

    /// Register a handler under a caller-chosen id. Returns false when the
    /// id is taken.
    pub fn register_handler(
        &self,
        id: impl Into<String>,
        handler: Arc<dyn PolicyEventHandler>,
    ) -> bool {
        let id = id.into();
        let mut handlers = self.handlers.write();
        if handlers.contains_key(&id) {
            warn!("Handler {} is already registered", id);
            return false;
        }
        debug!("Registering handler {}", id);
        handlers.insert(id, handler);
        true
    }

    /// Remove a handler; unknown ids are ignored.
    pub fn unregister_handler(&self, id: &str) {
        debug!("Unregistering handler {}", id);
        self.handlers.write().remove(id);
    }

    fn notify(&self, event: PolicyEvent, bundle: &PolicyBundle, details: &str) {
        // Snapshot so no lock is held while handlers run.
        let handlers: Vec<Arc<dyn PolicyEventHandler>> =
            self.handlers.read().values().cloned().collect();
        debug!("Notifying {} handlers of {}", handlers.len(), event);
        for handler in handlers {
            handler.handle(event, bundle.version, &bundle.description, details);
        }
    }

    /// Register a plugin and immediately enable it. Returns false when the
    /// id is taken (nothing changes) or when enabling could not fetch the
    /// bundle (the plugin stays registered but disabled).
    pub async fn register_plugin(&self, plugin: Arc<dyn Plugin>) -> bool {
        let _transition = self.lifecycle.lock().await;
        let id = plugin.id().to_string();
        {
            let mut plugins = self.plugins.write();
            if plugins.contains_key(&id) {
                warn!("Plugin {} is already registered", id);
                return false;
            }
            info!("Registering plugin {}", id);
            plugins.insert(
                id.clone(),
                LoadedPlugin {
                    plugin,
                    enabled: false,
                },
            );
        }
        self.enable_locked(&id).await
    }

    /// Disable and remove a plugin. Returns whether it was registered; a
    /// failed disable is logged and does not block removal.
    pub async fn unregister_plugin(&self, plugin: &dyn Plugin) -> bool {
        let _transition = self.lifecycle.lock().await;
        let id = plugin.id();
        if !self.disable_locked(id).await {
            warn!(
                "Could not withdraw policies from plugin {} before unregistering",
                id
            );
        }
        info!("Unregistering plugin {}", id);
        self.plugins.write().remove(id).is_some()
    }

    /// Enable a registered plugin, pushing every policy payload currently
    /// addressed to it. Returns false when the plugin is unknown, already
    /// enabled or the bundle cannot be fetched.
    pub async fn enable(&self, id: &str) -> bool {
        let _transition = self.lifecycle.lock().await;
        self.enable_locked(id).await
    }

    /// Disable a registered plugin, withdrawing every policy addressed to
    /// it. Returns false when the plugin is unknown, already disabled or the
    /// bundle cannot be fetched.
    pub async fn disable(&self, id: &str) -> bool {
        let _transition = self.lifecycle.lock().await;
        self.disable_locked(id).await
    }

    /// Ids of all registered plugins, enabled or not, in no particular order.
    pub fn plugins(&self) -> Vec<String> {
        self.plugins.read().keys().cloned().collect()
    }

    async fn enable_locked(&self, id: &str) -> bool {
        let plugin = {
            let plugins = self.plugins.read();
            match plugins.get(id) {
                None => {
                    warn!("Cannot enable unknown plugin {}", id);
                    return false;
                }
                Some(loaded) if loaded.enabled => {
                    warn!("Plugin {} is already enabled", id);
                    return false;
                }
                Some(loaded) => Arc::clone(&loaded.plugin),
            }
        };

        let bundle = match self.fetch().await {
            Some(bundle) => bundle,
            None => {
                warn!("Leaving plugin {} disabled: no policy bundle", id);
                return false;
            }
        };

        // Push only windows open right now; a payload outside its window
        // must not configure a backend.
        let now = Utc::now();
        for policy in bundle.filter(|p| p.targets_plugin(id) && p.window.contains(now)) {
            for content in policy.contents.iter().filter(|c| c.plugin_id == id) {
                if let Err(e) = plugin.apply(&policy.uuid, &content.blob) {
                    warn!("Plugin {} rejected policy {}: {}", id, policy.uuid, e);
                }
            }
        }

        if let Some(loaded) = self.plugins.write().get_mut(id) {
            loaded.enabled = true;
        }
        info!("Enabled plugin {}", id);
        true
    }

    async fn disable_locked(&self, id: &str) -> bool {
        let plugin = {
            let plugins = self.plugins.read();
            match plugins.get(id) {
                None => {
                    warn!("Cannot disable unknown plugin {}", id);
                    return false;
                }
                Some(loaded) if !loaded.enabled => {
                    warn!("Plugin {} is already disabled", id);
                    return false;
                }
                Some(loaded) => Arc::clone(&loaded.plugin),
            }
        };

        let bundle = match self.fetch().await {
            Some(bundle) => bundle,
            None => {
                warn!("Leaving plugin {} enabled: no policy bundle", id);
                return false;
            }
        };

        // Withdraw regardless of the window: one may have closed while the
        // plugin was enabled, and removes are idempotent by contract.
        for policy in bundle.filter(|p| p.targets_plugin(id)) {
            if let Err(e) = plugin.remove(&policy.uuid) {
                warn!("Plugin {} failed to remove policy {}: {}", id, policy.uuid, e);
            }
        }

        if let Some(loaded) = self.plugins.write().get_mut(id) {
            loaded.enabled = false;
        }
        info!("Disabled plugin {}", id);
        true
    }
}
