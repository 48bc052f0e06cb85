//! Type registry for dynamic streamables
//!
//! Provides [`TypeRegistry`], an explicit object built once at startup and
//! shared with every component that flattens or resurrects payloads.

use crate::envelope::Envelope;
use crate::error::RegistryError;
use crate::streamable::{DynamicStreamable, StreamableType};
use std::fmt;

/// Zero-argument constructor producing a default instance
pub type Factory = fn() -> Box<dyn DynamicStreamable>;

/// Registered `(type name, factory)` pair
#[derive(Clone, Copy)]
pub struct RegistryEntry {
    type_name: &'static str,
    factory: Factory,
}

impl RegistryEntry {
    /// Registered type name
    #[inline]
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Build a fresh default instance
    #[inline]
    #[must_use]
    pub fn create(&self) -> Box<dyn DynamicStreamable> {
        (self.factory)()
    }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

fn default_factory<T: StreamableType>() -> Box<dyn DynamicStreamable> {
    Box::new(T::default())
}

/// Registry of streamable types
///
/// Entries are append-only and looked up by linear scan in registration
/// order. If a name is registered twice, lookups keep resolving to the first
/// entry.
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    entries: Vec<RegistryEntry>,
}

impl TypeRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register concrete type `T` under `T::TYPE_NAME`
    pub fn register<T: StreamableType>(&mut self) -> &mut Self {
        self.register_factory(T::TYPE_NAME, default_factory::<T>)
    }

    /// Register `T`, rejecting a name that is already taken
    ///
    /// # Errors
    /// Returns [`RegistryError::DuplicateType`] if `T::TYPE_NAME` exists
    pub fn register_unique<T: StreamableType>(&mut self) -> Result<&mut Self, RegistryError> {
        if self.contains(T::TYPE_NAME) {
            return Err(RegistryError::DuplicateType {
                type_name: T::TYPE_NAME.to_string(),
            });
        }
        Ok(self.register::<T>())
    }

    /// Register an explicit factory under `type_name`
    pub fn register_factory(&mut self, type_name: &'static str, factory: Factory) -> &mut Self {
        if self.contains(type_name) {
            tracing::warn!(type_name, "type name registered twice; first entry wins");
        }
        self.entries.push(RegistryEntry { type_name, factory });
        self
    }

    /// Check if type name is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.lookup(type_name).is_some()
    }

    /// Find first entry registered under `type_name`
    #[must_use]
    pub fn lookup(&self, type_name: &str) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| e.type_name == type_name)
    }

    /// Construct a default instance of the named type
    ///
    /// # Errors
    /// Returns [`RegistryError::UnknownType`] if the name is not registered
    pub fn create(&self, type_name: &str) -> Result<Box<dyn DynamicStreamable>, RegistryError> {
        self.lookup(type_name)
            .map(RegistryEntry::create)
            .ok_or_else(|| RegistryError::unknown_type(type_name))
    }

    /// Serialize a value into a type-tagged envelope string
    ///
    /// # Errors
    /// Returns error if the value fails to stream out
    pub fn flatten<T: DynamicStreamable + ?Sized>(&self, value: &T) -> Result<String, RegistryError> {
        Ok(Envelope::wrap(value)?.encode()?)
    }

    /// Rebuild a value of whatever type the envelope names
    ///
    /// # Errors
    /// - [`RegistryError::Stream`] if the envelope or payload is malformed
    /// - [`RegistryError::UnknownType`] if the type name is not registered
    pub fn resurrect(&self, envelope: &str) -> Result<Box<dyn DynamicStreamable>, RegistryError> {
        let envelope = Envelope::decode(envelope)?;
        let mut value = self.create(&envelope.type_name)?;
        value.stream_in(&envelope.data)?;
        Ok(value)
    }

    /// Rebuild a value and downcast it to `T`
    ///
    /// # Errors
    /// As [`resurrect`](Self::resurrect), plus [`RegistryError::TypeMismatch`]
    /// if the envelope names a type other than `T`
    pub fn resurrect_as<T: StreamableType>(&self, envelope: &str) -> Result<T, RegistryError> {
        let value = self.resurrect(envelope)?;
        let actual = value.type_name();
        value
            .into_any()
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| RegistryError::TypeMismatch {
                expected: T::TYPE_NAME.to_string(),
                actual: actual.to_string(),
            })
    }

    /// Registered type names in registration order
    #[must_use]
    pub fn type_names(&self) -> Vec<&'static str> {
        self.entries.iter().map(RegistryEntry::type_name).collect()
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
