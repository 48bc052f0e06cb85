//! Conversation participants

use caucus_stream::{StreamResult, Streamable, StreamableType};
use serde::{Deserialize, Serialize};

/// Participant shown next to messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    /// Display name, also its key in the shared map
    pub name: String,
    /// Optional icon reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Whether the participant is an automated assistant
    #[serde(default)]
    pub is_bot: bool,
}

impl Persona {
    /// Human participant
    #[must_use]
    pub fn human(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon: None,
            is_bot: false,
        }
    }

    /// Automated participant
    #[must_use]
    pub fn bot(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon: None,
            is_bot: true,
        }
    }

    /// With icon
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

impl Streamable for Persona {
    fn stream_out(&self) -> StreamResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn stream_in(&mut self, data: &str) -> StreamResult<()> {
        *self = serde_json::from_str(data)?;
        Ok(())
    }
}

impl StreamableType for Persona {
    const TYPE_NAME: &'static str = "Persona";
}
