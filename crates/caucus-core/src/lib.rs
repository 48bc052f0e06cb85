//! Caucus Synchronization Engine
//!
//! Keeps a typed, ordered, queryable in-process view consistent with an
//! eventually-consistent shared key-value map, and routes fine-grained
//! change events to observers.
//!
//! # Core Concepts
//!
//! - [`SharedMap`]: Replicated string→string map with a change feed
//! - [`InMemorySharedMap`]: In-process replicas over shared storage
//! - [`OrderedView`]: Memoized sorted view with a dirty flag and in-place maintenance
//! - [`Caucus<T>`]: Typed cache with point mutation, reconciliation and notifications
//! - [`KickTimer`]: Single-shot startup refresh
//!
//! # Architecture
//!
//! ```text
//! Caucus<T> ──flatten──► SharedMap ──change feed──► Caucus<T>::handle_event
//!     ▲                                                   │
//!     └── current_as_array ◄── OrderedView ◄──────────────┤
//!                                                         ▼
//!                                        Notifier ──► observers
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use caucus_core::{Caucus, InMemorySharedMap, MEMBER_ADDED};
//! use std::sync::Arc;
//!
//! let map = Arc::new(InMemorySharedMap::new());
//! let caucus: Caucus<Message> = Caucus::with_defaults(map, registry, Some(by_sent_at()));
//!
//! caucus.observe(MEMBER_ADDED, Arc::new(|_, n: &MemberNotification| {
//!     println!("new message {:?}", n.payload());
//! }));
//!
//! caucus.add("m1", &message)?;
//! let conversation = caucus.current_as_array()?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod caucus;
pub mod config;
pub mod error;
pub mod kick;
pub mod memory;
pub mod shared_map;
pub mod view;

// Re-exports for convenience
pub use caucus::{
    Caucus, MemberNotification, SynchReport, MEMBER_ADDED, MEMBER_CHANGED, MEMBER_REMOVED,
};
pub use config::CaucusConfig;
pub use error::{CaucusError, CaucusResult};
pub use kick::KickTimer;
pub use memory::InMemorySharedMap;
pub use shared_map::{ListenerId, MapEvent, MapListener, SharedMap};
pub use view::{Comparator, OrderedView};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with a Caucus
    pub use crate::caucus::{Caucus, MemberNotification, MEMBER_ADDED, MEMBER_CHANGED, MEMBER_REMOVED};
    pub use crate::config::CaucusConfig;
    pub use crate::error::{CaucusError, CaucusResult};
    pub use crate::shared_map::SharedMap;
    pub use caucus_notify::{Interest, Observer};
    pub use caucus_stream::{Streamable, StreamableType, TypeRegistry};
}
