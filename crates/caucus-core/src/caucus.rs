//! Synchronized ordered cache
//!
//! A [`Caucus`] wraps one [`SharedMap`] and presents it as a typed,
//! optionally ordered collection with change notifications.
//!
//! # Data flow
//!
//! ```text
//! add/amend/remove ──► SharedMap ──► change feed ──► handle_event
//!                                        ▲                │
//!                           remote peers ┘                ├─► OrderedView (invalidate / in-place)
//!                                                         └─► Notifier (memberAdded / Changed / Removed)
//! ```
//!
//! Every change event is processed, whether it is the echo of a local write
//! or a remote peer's write. Resurrection and view maintenance are
//! idempotent, so handling an echo of something already applied is a no-op
//! in effect.

use crate::config::CaucusConfig;
use crate::error::{CaucusError, CaucusResult};
use crate::kick::KickTimer;
use crate::shared_map::{ListenerId, MapEvent, SharedMap};
use crate::view::{Comparator, OrderedView};
use caucus_notify::{Interest, NotificationFor, Notifier, Observer, SubscriptionId};
use caucus_stream::{StreamableType, TypeRegistry};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Raised when a key appears
pub const MEMBER_ADDED: Interest = Interest::from_static("memberAdded");

/// Raised when a present key's value is replaced
pub const MEMBER_CHANGED: Interest = Interest::from_static("memberChanged");

/// Raised when a key disappears; no key means every entry was removed
pub const MEMBER_REMOVED: Interest = Interest::from_static("memberRemoved");

/// Notification raised by a Caucus; the payload is the affected key
pub type MemberNotification = NotificationFor<String>;

/// Outcome of [`Caucus::synch_from`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SynchReport {
    /// Keys deleted because the authoritative map lacks them
    pub removed: usize,
    /// Keys written because they were absent
    pub added: usize,
    /// Keys rewritten because their serialized form differed
    pub amended: usize,
    /// Keys left alone because they already matched
    pub unchanged: usize,
}

impl SynchReport {
    /// Check if reconciliation wrote nothing
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.removed == 0 && self.added == 0 && self.amended == 0
    }
}

struct CaucusInner<T> {
    map: Arc<dyn SharedMap>,
    registry: Arc<TypeRegistry>,
    view: Mutex<OrderedView<T>>,
    notifier: Notifier<MemberNotification>,
    config: CaucusConfig,
    listener: Mutex<Option<ListenerId>>,
    kick: Mutex<Option<KickTimer>>,
    connected: AtomicBool,
}

/// Typed, ordered, observable cache over a shared map
///
/// Cloning yields another handle to the same cache.
pub struct Caucus<T: StreamableType> {
    inner: Arc<CaucusInner<T>>,
}

impl<T: StreamableType> Clone for Caucus<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: StreamableType> Caucus<T> {
    /// Bind to `map` and subscribe to its change feed
    ///
    /// With a comparator, [`current_as_array`](Self::current_as_array) is
    /// sorted by it; without one it follows map order.
    #[must_use]
    pub fn new(
        map: Arc<dyn SharedMap>,
        registry: Arc<TypeRegistry>,
        comparator: Option<Comparator<T>>,
        config: CaucusConfig,
    ) -> Self {
        let inner = Arc::new(CaucusInner {
            map,
            registry,
            view: Mutex::new(OrderedView::new(comparator)),
            notifier: Notifier::with_panic_isolation(config.isolate_observer_panics),
            config,
            listener: Mutex::new(None),
            kick: Mutex::new(None),
            connected: AtomicBool::new(true),
        });

        let weak: Weak<CaucusInner<T>> = Arc::downgrade(&inner);
        let id = inner.map.subscribe(Arc::new(move |event: &MapEvent| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_event(event);
            }
        }));
        *inner.listener.lock() = Some(id);

        tracing::debug!(type_name = T::TYPE_NAME, "caucus connected");
        Self { inner }
    }

    /// Bind with default configuration
    #[must_use]
    pub fn with_defaults(
        map: Arc<dyn SharedMap>,
        registry: Arc<TypeRegistry>,
        comparator: Option<Comparator<T>>,
    ) -> Self {
        Self::new(map, registry, comparator, CaucusConfig::default())
    }

    /// Check membership against the shared map
    #[inline]
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.inner.map.has(key)
    }

    /// Number of keys in the shared map
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.map.len()
    }

    /// Check if the shared map is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.map.is_empty()
    }

    /// Write a new entry
    ///
    /// # Errors
    /// Returns error if disconnected or the value fails to flatten
    pub fn add(&self, key: &str, value: &T) -> CaucusResult<()> {
        self.ensure_connected()?;
        let flat = self.inner.registry.flatten(value)?;
        self.inner.map.set(key, flat);
        self.inner.view.lock().invalidate();
        Ok(())
    }

    /// Replace the value of an entry, keeping its key
    ///
    /// Keeps the ordered view clean when the stored value still sorts to
    /// the entry's current position; otherwise the view is invalidated. The
    /// view holds the value as read back from its serialized form, not
    /// `value` itself.
    ///
    /// # Errors
    /// Returns error if disconnected, or the value fails to flatten or to
    /// resurrect from its serialized form
    pub fn amend(&self, key: &str, value: &T) -> CaucusResult<()> {
        self.ensure_connected()?;
        let flat = self.inner.registry.flatten(value)?;
        let stored = self.inner.registry.resurrect_as::<T>(&flat)?;
        self.inner.map.set(key, flat);
        self.inner.maintain_in_place(key, stored);
        Ok(())
    }

    /// Delete an entry
    ///
    /// Returns whether the key was present.
    ///
    /// # Errors
    /// Returns error if disconnected
    pub fn remove(&self, key: &str) -> CaucusResult<bool> {
        self.ensure_connected()?;
        let removed = self.inner.map.delete(key);
        if removed {
            self.inner.view.lock().invalidate();
        }
        Ok(removed)
    }

    /// Delete every entry
    ///
    /// Observers of [`MEMBER_REMOVED`] receive one notification without a key.
    ///
    /// # Errors
    /// Returns error if disconnected
    pub fn remove_all(&self) -> CaucusResult<()> {
        self.ensure_connected()?;
        self.inner.map.clear();
        self.inner.view.lock().clear();
        Ok(())
    }

    /// Resurrect the value at `key`
    ///
    /// # Errors
    /// - [`CaucusError::NotFound`] if the key is absent
    /// - [`CaucusError::Registry`] if the stored value cannot be resurrected as `T`
    pub fn get(&self, key: &str) -> CaucusResult<T> {
        let raw = self
            .inner
            .map
            .get(key)
            .ok_or_else(|| CaucusError::not_found(key))?;
        Ok(self.inner.registry.resurrect_as::<T>(&raw)?)
    }

    /// Resurrect every entry into a fresh key→value map in map order
    ///
    /// Always scans the whole shared map.
    ///
    /// # Errors
    /// Returns the first resurrection failure
    pub fn current(&self) -> CaucusResult<IndexMap<String, T>> {
        Ok(self.inner.load_all()?.into_iter().collect())
    }

    /// Values in comparator order (or map order without a comparator)
    ///
    /// Served from the ordered view; rebuilt only when the view is dirty.
    /// Once disconnected, every call scans the map and nothing is cached.
    ///
    /// # Errors
    /// Returns the first resurrection failure; the view stays dirty
    pub fn current_as_array(&self) -> CaucusResult<Vec<T>> {
        self.inner
            .read_ordered(|entries| entries.iter().map(|(_, value)| value.clone()).collect())
    }

    /// Keys in the same order as [`current_as_array`](Self::current_as_array)
    ///
    /// # Errors
    /// As [`current_as_array`](Self::current_as_array)
    pub fn current_keys(&self) -> CaucusResult<Vec<String>> {
        self.inner
            .read_ordered(|entries| entries.iter().map(|(key, _)| key.clone()).collect())
    }

    /// Reconcile the shared map with `authoritative`
    ///
    /// Deletes keys `authoritative` lacks, then adds missing keys and amends
    /// keys whose serialized form differs. Keys that already match are not
    /// written, so a second call with the same map writes nothing.
    ///
    /// # Errors
    /// Returns error if disconnected or a value fails to flatten
    pub fn synch_from(&self, authoritative: &IndexMap<String, T>) -> CaucusResult<SynchReport> {
        self.ensure_connected()?;
        let mut report = SynchReport::default();

        let mut stale = Vec::new();
        self.inner.map.for_each(&mut |key: &str, _: &str| {
            if !authoritative.contains_key(key) {
                stale.push(key.to_string());
            }
        });
        for key in &stale {
            if self.inner.map.delete(key) {
                report.removed += 1;
            }
        }

        for (key, value) in authoritative {
            let flat = self.inner.registry.flatten(value)?;
            match self.inner.map.get(key) {
                None => {
                    self.inner.map.set(key, flat);
                    report.added += 1;
                }
                Some(existing) if existing != flat => {
                    self.inner.map.set(key, flat);
                    report.amended += 1;
                }
                Some(_) => report.unchanged += 1,
            }
        }

        self.inner.view.lock().invalidate();
        tracing::debug!(
            removed = report.removed,
            added = report.added,
            amended = report.amended,
            unchanged = report.unchanged,
            "caucus synchronized"
        );
        Ok(report)
    }

    /// Bind an observer to one of the member interests
    pub fn observe(
        &self,
        interest: Interest,
        observer: Arc<dyn Observer<MemberNotification>>,
    ) -> SubscriptionId {
        self.inner.notifier.add_observer(interest, observer)
    }

    /// Remove an observer binding
    pub fn unobserve(&self, id: SubscriptionId) -> bool {
        self.inner.notifier.remove_observer(id)
    }

    /// Notifier raising this Caucus's member notifications
    #[inline]
    #[must_use]
    pub fn notifier(&self) -> &Notifier<MemberNotification> {
        &self.inner.notifier
    }

    /// Start the single-shot startup refresh
    ///
    /// After the configured delay the ordered view is invalidated and
    /// [`MEMBER_CHANGED`] is raised without a key. Scheduling again replaces
    /// the pending timer.
    ///
    /// # Errors
    /// Returns error if disconnected or outside a tokio runtime
    pub fn schedule_kick(&self) -> CaucusResult<()> {
        self.ensure_connected()?;
        let weak = Arc::downgrade(&self.inner);
        let timer = KickTimer::spawn(self.inner.config.kick_delay(), move || {
            if let Some(inner) = weak.upgrade() {
                inner.kick();
            }
        })?;
        *self.inner.kick.lock() = Some(timer);
        Ok(())
    }

    /// Stop reacting to the shared map
    ///
    /// Unsubscribes from the change feed, cancels the startup refresh and
    /// drops every observer. Writes fail with [`CaucusError::Disconnected`]
    /// afterwards; ordered reads scan the map on every call.
    pub fn disconnect(&self) {
        if !self.inner.connected.swap(false, Ordering::SeqCst) {
            return;
        }
        let listener = self.inner.listener.lock().take();
        if let Some(id) = listener {
            self.inner.map.unsubscribe(id);
        }
        if let Some(timer) = self.inner.kick.lock().take() {
            timer.cancel();
        }
        self.inner.notifier.remove_all_observers();
        self.inner.view.lock().clear();
        tracing::debug!(type_name = T::TYPE_NAME, "caucus disconnected");
    }

    /// Check if still bound to the shared map
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    /// Check if the next ordered read will rebuild
    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.inner.view.lock().is_dirty()
    }

    /// Number of ordered view rebuilds so far
    #[inline]
    #[must_use]
    pub fn rebuild_count(&self) -> u64 {
        self.inner.view.lock().rebuild_count()
    }

    /// Registry used to flatten and resurrect values
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.inner.registry
    }

    fn ensure_connected(&self) -> CaucusResult<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(CaucusError::Disconnected)
        }
    }
}

impl<T: StreamableType> fmt::Debug for Caucus<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Caucus")
            .field("type_name", &T::TYPE_NAME)
            .field("view", &*self.inner.view.lock())
            .field("notifier", &self.inner.notifier)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl<T: StreamableType> CaucusInner<T> {
    fn load_all(&self) -> CaucusResult<Vec<(String, T)>> {
        let mut entries = Vec::with_capacity(self.map.len());
        let mut failure = None;
        self.map.for_each(&mut |key: &str, raw: &str| {
            if failure.is_some() {
                return;
            }
            match self.registry.resurrect_as::<T>(raw) {
                Ok(value) => entries.push((key.to_string(), value)),
                Err(err) => failure = Some(err),
            }
        });
        match failure {
            Some(err) => Err(err.into()),
            None => Ok(entries),
        }
    }

    // Without the change feed nothing can dirty the view again, so a
    // disconnected Caucus never caches
    fn read_ordered<R>(&self, read: impl FnOnce(&[(String, T)]) -> R) -> CaucusResult<R> {
        let mut view = self.view.lock();
        if !self.connected.load(Ordering::SeqCst) {
            let entries = view.arrange(self.load_all()?);
            return Ok(read(&entries));
        }
        let entries = view.get_or_rebuild(|| self.load_all())?;
        Ok(read(entries))
    }

    fn maintain_in_place(&self, key: &str, value: T) {
        let mut view = self.view.lock();
        if view.replace_in_place(key, value).is_none() {
            view.invalidate();
        }
    }

    fn handle_event(&self, event: &MapEvent) {
        match event {
            MapEvent::Cleared { local } => {
                tracing::trace!(local, "caucus saw clear");
                self.view.lock().clear();
                self.raise(&MEMBER_REMOVED, None);
            }
            MapEvent::ValueChanged {
                key,
                previous_value,
                local,
            } => {
                let had_previous = previous_value.is_some();
                match (had_previous, self.map.get(key)) {
                    (false, Some(raw)) => {
                        tracing::trace!(key = %key, local, bytes = raw.len(), "member added");
                        self.view.lock().invalidate();
                        self.raise(&MEMBER_ADDED, Some(key));
                    }
                    (true, Some(raw)) => {
                        tracing::trace!(key = %key, local, "member changed");
                        match self.resurrect_entry(key, &raw) {
                            Some(value) => self.maintain_in_place(key, value),
                            None => self.view.lock().invalidate(),
                        }
                        self.raise(&MEMBER_CHANGED, Some(key));
                    }
                    (true, None) => {
                        tracing::trace!(key = %key, local, "member removed");
                        self.view.lock().invalidate();
                        self.raise(&MEMBER_REMOVED, Some(key));
                    }
                    (false, None) => {
                        tracing::trace!(key = %key, local, "change for absent key ignored");
                    }
                }
            }
        }
    }

    fn resurrect_entry(&self, key: &str, raw: &str) -> Option<T> {
        match self.registry.resurrect_as::<T>(raw) {
            Ok(value) => Some(value),
            Err(err) if self.config.isolate_entry_failures => {
                tracing::error!(key, error = %err, "failed to resurrect entry; skipping");
                None
            }
            Err(err) => panic!("failed to resurrect entry '{key}': {err}"),
        }
    }

    fn kick(&self) {
        if !self.connected.load(Ordering::SeqCst) {
            return;
        }
        tracing::debug!(type_name = T::TYPE_NAME, "startup kick fired");
        self.view.lock().invalidate();
        self.raise(&MEMBER_CHANGED, None);
    }

    fn raise(&self, interest: &Interest, key: Option<&str>) {
        let notification = match key {
            Some(key) => MemberNotification::new(interest.clone(), key.to_string()),
            None => MemberNotification::empty(interest.clone()),
        };
        self.notifier.notify_observers(interest, &notification);
    }
}

impl<T> Drop for CaucusInner<T> {
    fn drop(&mut self) {
        if let Some(id) = self.listener.get_mut().take() {
            self.map.unsubscribe(id);
        }
    }
}
