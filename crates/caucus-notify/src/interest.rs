//! Notification topics
//!
//! Provides [`Interest`], the value-typed key observers subscribe to.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Value-typed notification topic
///
/// Equality is by topic string. The default instance is the null interest
/// (empty topic), which no well-known topic ever equals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Interest {
    topic: Cow<'static, str>,
}

impl Interest {
    /// The null interest
    pub const NULL: Interest = Interest::from_static("");

    /// Create interest for topic
    #[inline]
    #[must_use]
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: Cow::Owned(topic.into()),
        }
    }

    /// Create interest from a static topic, usable in `const` items
    #[inline]
    #[must_use]
    pub const fn from_static(topic: &'static str) -> Self {
        Self {
            topic: Cow::Borrowed(topic),
        }
    }

    /// Topic string
    #[inline]
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Check if this is the null interest
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.topic.is_empty()
    }

    /// Copy another interest's topic into this instance
    ///
    /// Reuses the existing allocation when both topics are owned.
    #[inline]
    pub fn assign(&mut self, other: &Interest) {
        self.topic.clone_from(&other.topic);
    }
}

impl fmt::Display for Interest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("<null>")
        } else {
            f.write_str(&self.topic)
        }
    }
}

impl From<&str> for Interest {
    fn from(topic: &str) -> Self {
        Self::new(topic)
    }
}

impl From<String> for Interest {
    fn from(topic: String) -> Self {
        Self::new(topic)
    }
}
