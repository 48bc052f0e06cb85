//! Shared map collaborator
//!
//! The replicated string→string map a Caucus synchronizes against. Network
//! propagation lives behind this trait; a Caucus only sees the local replica
//! and its change feed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use ulid::Ulid;

/// Handle returned by [`SharedMap::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ListenerId(pub Ulid);

impl ListenerId {
    /// Generate new listener ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Change feed event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapEvent {
    /// A key was set or deleted
    ValueChanged {
        /// Affected key
        key: String,
        /// Value held before this change, if any
        previous_value: Option<String>,
        /// Write originated from the listener's own replica
        local: bool,
    },

    /// Every key was removed
    Cleared {
        /// Clear originated from the listener's own replica
        local: bool,
    },
}

impl MapEvent {
    /// Whether the event originated locally
    #[inline]
    #[must_use]
    pub fn is_local(&self) -> bool {
        match self {
            Self::ValueChanged { local, .. } | Self::Cleared { local } => *local,
        }
    }
}

/// Receiver of change feed events
pub trait MapListener: Send + Sync {
    /// Handle one change
    fn on_event(&self, event: &MapEvent);
}

impl<F> MapListener for F
where
    F: Fn(&MapEvent) + Send + Sync,
{
    fn on_event(&self, event: &MapEvent) {
        self(event);
    }
}

/// Replicated key-value map
///
/// # Contract
/// - Writes are visible to `has`/`get` on the same replica immediately
/// - Every write, local or remote, produces one event per subscriber, delivered
///   after the write lands and outside any internal lock, so a listener may
///   write back into the map
/// - Per-key last-writer-wins
pub trait SharedMap: Send + Sync {
    /// Check if key is present
    fn has(&self, key: &str) -> bool;

    /// Current value at key
    fn get(&self, key: &str) -> Option<String>;

    /// Write value at key
    fn set(&self, key: &str, value: String);

    /// Delete key, returning whether it was present
    fn delete(&self, key: &str) -> bool;

    /// Visit every entry in map order
    ///
    /// Visits a snapshot taken at call time.
    fn for_each(&self, visit: &mut dyn FnMut(&str, &str));

    /// Remove every key
    fn clear(&self);

    /// Number of keys
    fn len(&self) -> usize;

    /// Check if map is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register a change feed listener
    fn subscribe(&self, listener: Arc<dyn MapListener>) -> ListenerId;

    /// Remove a change feed listener
    fn unsubscribe(&self, id: ListenerId) -> bool;
}
