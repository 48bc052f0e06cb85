//! Caucus Chat Payloads
//!
//! Concrete payload types stored in Caucus shared maps, and the
//! conversation view built from them.
//!
//! - [`Message`]: One chat message, ordered by send time
//! - [`Persona`]: A conversation participant
//! - [`ChatKind`]: Exhaustive list of registered payload kinds
//! - [`Conversation`]: `Caucus<Message>` keyed by message ID

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod conversation;
pub mod kind;
pub mod message;
pub mod persona;

pub use conversation::{by_sent_at, Conversation};
pub use kind::{chat_registry, ChatKind};
pub use message::Message;
pub use persona::Persona;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
