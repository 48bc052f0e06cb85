//! Chat messages

use caucus_stream::{StreamError, StreamResult, Streamable, StreamableType};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One message in a shared conversation
///
/// `sent_at` is held at millisecond precision, matching its wire form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    id: String,
    author: String,
    text: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    sent_at: DateTime<Utc>,
    #[serde(default)]
    edited: bool,
}

impl Message {
    /// Create message with a fresh ID
    #[must_use]
    pub fn new(author: impl Into<String>, text: impl Into<String>, sent_at: DateTime<Utc>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), author, text, sent_at)
    }

    /// Create message with an explicit ID
    #[must_use]
    pub fn with_id(
        id: impl Into<String>,
        author: impl Into<String>,
        text: impl Into<String>,
        sent_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            author: author.into(),
            text: text.into(),
            sent_at: sent_at.trunc_subsecs(3),
            edited: false,
        }
    }

    /// Copy with replaced text, marked as edited
    #[must_use]
    pub fn edit(&self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            edited: true,
            ..self.clone()
        }
    }

    /// Message ID, also its key in the shared map
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Author name
    #[inline]
    #[must_use]
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Message body
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Send time (millisecond precision)
    #[inline]
    #[must_use]
    pub fn sent_at(&self) -> DateTime<Utc> {
        self.sent_at
    }

    /// Whether the text was edited after posting
    #[inline]
    #[must_use]
    pub fn is_edited(&self) -> bool {
        self.edited
    }
}

impl Streamable for Message {
    fn stream_out(&self) -> StreamResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn stream_in(&mut self, data: &str) -> StreamResult<()> {
        let message: Message = serde_json::from_str(data)?;
        if message.id.is_empty() {
            return Err(StreamError::invalid_field("id", "message id must not be empty"));
        }
        *self = message;
        Ok(())
    }
}

impl StreamableType for Message {
    const TYPE_NAME: &'static str = "Message";
}
