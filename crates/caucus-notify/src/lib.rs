//! Caucus Notification System
//!
//! Topic-keyed publish/subscribe used to route fine-grained change events
//! to interested observers.
//!
//! # Core Concepts
//!
//! - [`Interest`]: Value-typed notification topic
//! - [`Notification`] / [`NotificationFor<T>`]: Event values carrying an interest
//!   and an optional typed payload
//! - [`Observer`]: Callback receiving `(interest, notification)` pairs
//! - [`Notifier`]: Registry of observer bindings with exact-interest dispatch
//!
//! # Example
//!
//! ```rust
//! use caucus_notify::{Interest, Notifier, NotificationFor};
//! use std::sync::Arc;
//!
//! let notifier: Notifier<NotificationFor<String>> = Notifier::new();
//! let added = Interest::new("memberAdded");
//!
//! let id = notifier.add_observer(
//!     added.clone(),
//!     Arc::new(|_: &Interest, n: &NotificationFor<String>| {
//!         println!("added {:?}", n.payload());
//!     }),
//! );
//!
//! let delivered = notifier.notify_observers(
//!     &added,
//!     &NotificationFor::new(added.clone(), "k1".to_string()),
//! );
//! assert_eq!(delivered, 1);
//! assert!(notifier.remove_observer(id));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod interest;
mod notification;
mod notifier;

pub use interest::Interest;
pub use notification::{Notification, NotificationFor};
pub use notifier::{Notifier, Observer, SubscriptionId};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
