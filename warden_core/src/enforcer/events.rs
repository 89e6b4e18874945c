use std::fmt;

use serde::{Deserialize, Serialize};

/// Kinds of bundle mutations reported to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyEvent {
    /// A new bundle was persisted.
    Apply,

    /// Persisting a new bundle failed.
    ApplyError,
}

impl fmt::Display for PolicyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Apply => write!(f, "apply"),
            Self::ApplyError => write!(f, "apply_error"),
        }
    }
}

/// Subscriber notified of every bundle mutation attempt.
///
/// Handlers run synchronously inside [`Enforcer::apply`](super::Enforcer::apply)
/// and should return promptly.
pub trait PolicyEventHandler: Send + Sync {
    /// `details` carries the error text on [`PolicyEvent::ApplyError`] and is
    /// empty otherwise.
    fn handle(&self, event: PolicyEvent, version: u64, description: &str, details: &str);
}
