//! Streamable Contracts
//!
//! Defines how a payload writes its own fields to a string and reads them
//! back, and how a payload reports the stable type name used to recover its
//! concrete type from an [`Envelope`](crate::Envelope).

use crate::error::StreamResult;
use std::any::Any;
use std::fmt::Debug;

/// Field-level serialization contract
///
/// # Contract
/// - `stream_in(stream_out(v))` on a default instance yields a value equal
///   to `v`, modulo type-specific normalization (e.g. timestamp truncation)
/// - `stream_in` overwrites every field it reads
pub trait Streamable {
    /// Serialize own fields
    ///
    /// # Errors
    /// Returns error if a field cannot be represented
    fn stream_out(&self) -> StreamResult<String>;

    /// Populate own fields from serialized form
    ///
    /// # Errors
    /// Returns error if `data` is malformed or violates a field rule
    fn stream_in(&mut self, data: &str) -> StreamResult<()>;
}

/// Object-safe streamable whose concrete type is recoverable by name
///
/// Implemented automatically for every [`StreamableType`].
pub trait DynamicStreamable: Streamable + Any + Send + Sync + Debug {
    /// Stable type name written into envelopes
    fn type_name(&self) -> &'static str;

    /// Borrow as [`Any`] for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Convert into boxed [`Any`] for owned downcasting
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
}

/// Concrete streamable type that can be registered
///
/// `TYPE_NAME` must stay stable across versions; previously persisted
/// envelopes are looked up by it.
///
/// # Example
/// ```rust,ignore
/// #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// pub struct Persona { name: String }
///
/// impl Streamable for Persona {
///     fn stream_out(&self) -> StreamResult<String> {
///         Ok(serde_json::to_string(self)?)
///     }
///
///     fn stream_in(&mut self, data: &str) -> StreamResult<()> {
///         *self = serde_json::from_str(data)?;
///         Ok(())
///     }
/// }
///
/// impl StreamableType for Persona {
///     const TYPE_NAME: &'static str = "Persona";
/// }
/// ```
pub trait StreamableType: Streamable + Default + Clone + Send + Sync + Debug + 'static {
    /// Unique, stable type name
    const TYPE_NAME: &'static str;
}

impl<T: StreamableType> DynamicStreamable for T {
    #[inline]
    fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StreamError;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Counter {
        value: u32,
    }

    impl Streamable for Counter {
        fn stream_out(&self) -> StreamResult<String> {
            Ok(self.value.to_string())
        }

        fn stream_in(&mut self, data: &str) -> StreamResult<()> {
            self.value = data
                .parse()
                .map_err(|_| StreamError::invalid_field("value", data))?;
            Ok(())
        }
    }

    impl StreamableType for Counter {
        const TYPE_NAME: &'static str = "Counter";
    }

    #[test]
    fn blanket_dynamic_impl_reports_type_name() {
        let boxed: Box<dyn DynamicStreamable> = Box::new(Counter { value: 3 });
        assert_eq!(boxed.type_name(), "Counter");
        assert_eq!(boxed.as_any().downcast_ref::<Counter>(), Some(&Counter { value: 3 }));
    }

    #[test]
    fn into_any_downcasts_owned() {
        let boxed: Box<dyn DynamicStreamable> = Box::new(Counter { value: 9 });
        let counter = boxed.into_any().downcast::<Counter>().unwrap();
        assert_eq!(counter.value, 9);
    }

    #[test]
    fn stream_in_rejects_bad_field() {
        let mut counter = Counter::default();
        let err = counter.stream_in("nine").unwrap_err();
        assert!(matches!(err, StreamError::InvalidField { .. }));
    }
}
