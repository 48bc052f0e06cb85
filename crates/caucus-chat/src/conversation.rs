//! Shared conversation view
//!
//! A [`Conversation`] is a `Caucus<Message>` keyed by message ID and ordered
//! by send time.

use crate::message::Message;
use caucus_core::{Caucus, CaucusConfig, CaucusResult, Comparator, SharedMap};
use caucus_stream::TypeRegistry;
use std::sync::Arc;

/// Ascending send time, ties broken by message ID
#[must_use]
pub fn by_sent_at() -> Comparator<Message> {
    Arc::new(|a: &Message, b: &Message| {
        a.sent_at()
            .cmp(&b.sent_at())
            .then_with(|| a.id().cmp(b.id()))
    })
}

/// Ordered messages over one shared map
#[derive(Debug, Clone)]
pub struct Conversation {
    caucus: Caucus<Message>,
}

impl Conversation {
    /// Bind to `map`
    #[must_use]
    pub fn new(map: Arc<dyn SharedMap>, registry: Arc<TypeRegistry>, config: CaucusConfig) -> Self {
        Self {
            caucus: Caucus::new(map, registry, Some(by_sent_at()), config),
        }
    }

    /// Post a new message
    ///
    /// # Errors
    /// Propagates Caucus write failures
    pub fn post(&self, message: &Message) -> CaucusResult<()> {
        tracing::debug!(id = message.id(), author = message.author(), "posting message");
        self.caucus.add(message.id(), message)
    }

    /// Replace a message's content, keeping its ID and send time
    ///
    /// # Errors
    /// Propagates Caucus write failures
    pub fn edit(&self, message: &Message) -> CaucusResult<()> {
        self.caucus.amend(message.id(), message)
    }

    /// Remove a message
    ///
    /// # Errors
    /// Propagates Caucus write failures
    pub fn retract(&self, id: &str) -> CaucusResult<bool> {
        self.caucus.remove(id)
    }

    /// Messages in send order
    ///
    /// # Errors
    /// Propagates resurrection failures
    pub fn messages(&self) -> CaucusResult<Vec<Message>> {
        self.caucus.current_as_array()
    }

    /// Underlying Caucus
    #[inline]
    #[must_use]
    pub fn caucus(&self) -> &Caucus<Message> {
        &self.caucus
    }
}
