//! Observer registry and dispatch
//!
//! Provides [`Notifier`], which holds `(observer, interest)` bindings and
//! delivers notifications to every binding whose interest matches exactly.

use crate::interest::Interest;
use crate::notification::Notification;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use ulid::Ulid;

/// Opaque handle returned by [`Notifier::add_observer`]
///
/// Required to remove the binding again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub Ulid);

impl SubscriptionId {
    /// Generate new subscription ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Receiver of notifications
///
/// Implemented for any `Fn(&Interest, &N)` closure.
pub trait Observer<N>: Send + Sync {
    /// Handle a notification raised for `interest`
    fn notify(&self, interest: &Interest, notification: &N);
}

impl<N, F> Observer<N> for F
where
    F: Fn(&Interest, &N) + Send + Sync,
{
    fn notify(&self, interest: &Interest, notification: &N) {
        self(interest, notification);
    }
}

struct Binding<N> {
    id: SubscriptionId,
    interest: Interest,
    observer: Arc<dyn Observer<N>>,
}

impl<N> Clone for Binding<N> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            interest: self.interest.clone(),
            observer: Arc::clone(&self.observer),
        }
    }
}

/// Publish/subscribe hub
///
/// Bindings are kept in registration order and dispatch follows that order.
/// Dispatch works on a snapshot of the bindings, so an observer may add or
/// remove bindings while being notified; those changes take effect from the
/// next dispatch on.
pub struct Notifier<N = Notification> {
    bindings: Mutex<Vec<Binding<N>>>,
    isolate_panics: bool,
}

impl<N: 'static> Notifier<N> {
    /// Create empty notifier that isolates observer panics
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_panic_isolation(true)
    }

    /// Create empty notifier
    ///
    /// With `isolate_panics` set, a panicking observer is logged and the
    /// remaining observers still receive the notification.
    #[inline]
    #[must_use]
    pub fn with_panic_isolation(isolate_panics: bool) -> Self {
        Self {
            bindings: Mutex::new(Vec::new()),
            isolate_panics,
        }
    }

    /// Bind `observer` to `interest`
    ///
    /// If the same observer is already bound to an equal interest, the
    /// existing handle is returned and nothing is inserted.
    pub fn add_observer(&self, interest: Interest, observer: Arc<dyn Observer<N>>) -> SubscriptionId {
        let mut bindings = self.bindings.lock();

        if let Some(existing) = bindings
            .iter()
            .find(|b| b.interest == interest && same_observer(&b.observer, &observer))
        {
            return existing.id;
        }

        let id = SubscriptionId::new();
        tracing::trace!(subscription = %id, interest = %interest, "observer added");
        bindings.push(Binding {
            id,
            interest,
            observer,
        });
        id
    }

    /// Remove binding by handle
    ///
    /// Returns whether a binding was removed.
    pub fn remove_observer(&self, id: SubscriptionId) -> bool {
        let mut bindings = self.bindings.lock();
        match bindings.iter().position(|b| b.id == id) {
            Some(index) => {
                bindings.remove(index);
                tracing::trace!(subscription = %id, "observer removed");
                true
            }
            None => false,
        }
    }

    /// Remove every binding
    pub fn remove_all_observers(&self) {
        self.bindings.lock().clear();
    }

    /// Number of bindings
    #[inline]
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.bindings.lock().len()
    }

    /// Check if there are no bindings
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.lock().is_empty()
    }

    /// Deliver `notification` to every observer bound to `interest`
    ///
    /// Returns the number of observers that handled it without panicking.
    pub fn notify_observers(&self, interest: &Interest, notification: &N) -> usize {
        let targets: Vec<Binding<N>> = self
            .bindings
            .lock()
            .iter()
            .filter(|b| &b.interest == interest)
            .cloned()
            .collect();

        let mut delivered = 0;
        for binding in targets {
            if !self.isolate_panics {
                binding.observer.notify(interest, notification);
                delivered += 1;
                continue;
            }

            let outcome = catch_unwind(AssertUnwindSafe(|| {
                binding.observer.notify(interest, notification);
            }));
            match outcome {
                Ok(()) => delivered += 1,
                Err(_) => tracing::error!(
                    subscription = %binding.id,
                    interest = %interest,
                    "observer panicked during dispatch"
                ),
            }
        }
        delivered
    }
}

impl<N: 'static> Default for Notifier<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> fmt::Debug for Notifier<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bindings = self.bindings.lock();
        f.debug_struct("Notifier")
            .field(
                "bindings",
                &bindings
                    .iter()
                    .map(|b| (b.id, b.interest.clone()))
                    .collect::<Vec<_>>(),
            )
            .field("isolate_panics", &self.isolate_panics)
            .finish()
    }
}

// Compare data pointers only; vtable pointers may differ across codegen units.
fn same_observer<N>(a: &Arc<dyn Observer<N>>, b: &Arc<dyn Observer<N>>) -> bool {
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}
