//! Notification values
//!
//! A notification lives only for the duration of a dispatch call. Observers
//! that need the data afterwards copy it out.

use crate::interest::Interest;

/// Event value referencing exactly one [`Interest`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notification {
    interest: Interest,
}

impl Notification {
    /// Create notification for interest
    #[inline]
    #[must_use]
    pub fn new(interest: Interest) -> Self {
        Self { interest }
    }

    /// Interest this notification was raised for
    #[inline]
    #[must_use]
    pub fn interest(&self) -> &Interest {
        &self.interest
    }
}

/// Notification carrying an optional typed payload
///
/// Equality compares the interest and the payload by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationFor<T> {
    interest: Interest,
    payload: Option<T>,
}

impl<T> NotificationFor<T> {
    /// Create notification with payload
    #[inline]
    #[must_use]
    pub fn new(interest: Interest, payload: T) -> Self {
        Self {
            interest,
            payload: Some(payload),
        }
    }

    /// Create notification without payload
    #[inline]
    #[must_use]
    pub fn empty(interest: Interest) -> Self {
        Self {
            interest,
            payload: None,
        }
    }

    /// Interest this notification was raised for
    #[inline]
    #[must_use]
    pub fn interest(&self) -> &Interest {
        &self.interest
    }

    /// Payload, if any
    #[inline]
    #[must_use]
    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    /// Consume into payload
    #[inline]
    #[must_use]
    pub fn into_payload(self) -> Option<T> {
        self.payload
    }
}

impl<T> Default for NotificationFor<T> {
    fn default() -> Self {
        Self::empty(Interest::default())
    }
}

impl<T> From<NotificationFor<T>> for Notification {
    fn from(value: NotificationFor<T>) -> Self {
        Notification::new(value.interest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_notification_has_null_interest() {
        assert!(Notification::default().interest().is_null());

        let typed: NotificationFor<String> = NotificationFor::default();
        assert!(typed.interest().is_null());
        assert!(typed.payload().is_none());
    }

    #[test]
    fn equality_includes_payload() {
        let interest = Interest::new("memberChanged");
        let a = NotificationFor::new(interest.clone(), "k1".to_string());
        let b = NotificationFor::new(interest.clone(), "k1".to_string());
        let c = NotificationFor::new(interest.clone(), "k2".to_string());
        let d = NotificationFor::<String>::empty(interest);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn typed_converts_to_plain() {
        let typed = NotificationFor::new(Interest::new("memberAdded"), 7u32);
        let plain: Notification = typed.into();
        assert_eq!(plain, Notification::new(Interest::new("memberAdded")));
    }
}
