use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Plugin not found: {0}")]
    NotFound(String),

    #[error("Plugin rejected policy: {0}")]
    Rejected(String),
}

/// Enforcement backend capability: a firewall, proxy or similar component
/// that turns opaque policy payloads into its own configuration.
///
/// Exactly one instance per id is registered with an enforcer at a time.
pub trait Plugin: Send + Sync {
    /// Stable identifier; policy contents address plugins by it.
    fn id(&self) -> &str;

    /// Apply the payload of the given policy. Applying the same policy twice
    /// must be harmless.
    fn apply(&self, policy: &Uuid, blob: &[u8]) -> Result<(), PluginError>;

    /// Withdraw a previously applied policy. Removing a policy that was
    /// never applied must succeed.
    fn remove(&self, policy: &Uuid) -> Result<(), PluginError>;
}
