//! Registered payload kinds
//!
//! Every concrete type this crate stores in a shared map is listed in
//! [`ChatKind`]. Registration goes through an exhaustive `match`, so adding
//! a kind without registering it does not compile.

use crate::message::Message;
use crate::persona::Persona;
use caucus_stream::{RegistryError, StreamableType, TypeRegistry};
use std::fmt;
use std::sync::Arc;

/// Concrete payload kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatKind {
    /// [`Message`]
    Message,
    /// [`Persona`]
    Persona,
}

impl ChatKind {
    /// Every kind, in registration order
    pub const ALL: [ChatKind; 2] = [ChatKind::Message, ChatKind::Persona];

    /// Wire type name
    #[must_use]
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Message => Message::TYPE_NAME,
            Self::Persona => Persona::TYPE_NAME,
        }
    }

    /// Kind for a wire type name
    #[must_use]
    pub fn from_type_name(type_name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.type_name() == type_name)
    }

    /// Register this kind
    ///
    /// # Errors
    /// Returns [`RegistryError::DuplicateType`] if already registered
    pub fn register(self, registry: &mut TypeRegistry) -> Result<(), RegistryError> {
        match self {
            Self::Message => registry.register_unique::<Message>()?,
            Self::Persona => registry.register_unique::<Persona>()?,
        };
        Ok(())
    }

    /// Register every kind
    ///
    /// # Errors
    /// Returns [`RegistryError::DuplicateType`] if any kind is already registered
    pub fn register_all(registry: &mut TypeRegistry) -> Result<(), RegistryError> {
        for kind in Self::ALL {
            kind.register(registry)?;
        }
        Ok(())
    }
}

impl fmt::Display for ChatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Registry holding every chat kind, ready to share
///
/// # Errors
/// Propagates registration failures
pub fn chat_registry() -> Result<Arc<TypeRegistry>, RegistryError> {
    let mut registry = TypeRegistry::new();
    ChatKind::register_all(&mut registry)?;
    Ok(Arc::new(registry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    #[test]
    fn registers_every_kind_once() {
        let registry = chat_registry().unwrap();
        assert_eq!(registry.type_names(), vec!["Message", "Persona"]);
    }

    #[test]
    fn register_all_twice_fails() {
        let mut registry = TypeRegistry::new();
        ChatKind::register_all(&mut registry).unwrap();
        assert!(matches!(
            ChatKind::register_all(&mut registry),
            Err(RegistryError::DuplicateType { .. })
        ));
    }

    #[test]
    fn type_name_lookup() {
        assert_eq!(ChatKind::from_type_name("Persona"), Some(ChatKind::Persona));
        assert_eq!(ChatKind::from_type_name("Ghost"), None);
        assert_eq!(ChatKind::Message.to_string(), "Message");
    }

    #[test]
    fn resurrect_picks_kind_from_envelope() {
        let registry = chat_registry().unwrap();
        let flat = registry.flatten(&Persona::bot("helper")).unwrap();

        let value = registry.resurrect(&flat).unwrap();
        assert_eq!(ChatKind::from_type_name(value.type_name()), Some(ChatKind::Persona));
    }

    proptest! {
        #[test]
        fn prop_message_roundtrip(
            author in "[a-z]{1,12}",
            text in ".{0,64}",
            millis in 0i64..4_000_000_000_000,
        ) {
            let registry = chat_registry().unwrap();
            let sent_at = chrono::DateTime::<Utc>::from_timestamp_millis(millis).unwrap();
            let message = Message::new(author, text, sent_at);

            let back: Message = registry.resurrect_as(&registry.flatten(&message).unwrap()).unwrap();
            prop_assert_eq!(back, message);
        }

        #[test]
        fn prop_persona_roundtrip(name in "[A-Za-z ]{1,20}", icon in proptest::option::of("[a-z]{1,8}\\.png"), is_bot in any::<bool>()) {
            let registry = chat_registry().unwrap();
            let persona = Persona { name, icon, is_bot };

            let back: Persona = registry.resurrect_as(&registry.flatten(&persona).unwrap()).unwrap();
            prop_assert_eq!(back, persona);
        }
    }
}
