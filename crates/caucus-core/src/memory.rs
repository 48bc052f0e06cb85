//! In-process shared map
//!
//! Provides [`InMemorySharedMap`], a [`SharedMap`] whose replicas share one
//! storage. Used to run several peers inside one process and in tests.

use crate::shared_map::{ListenerId, MapEvent, MapListener, SharedMap};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

type ReplicaId = u64;

struct Subscriber {
    id: ListenerId,
    replica: ReplicaId,
    listener: Arc<dyn MapListener>,
}

#[derive(Default)]
struct Storage {
    entries: Mutex<IndexMap<String, String>>,
    subscribers: Mutex<Vec<Subscriber>>,
    scans: AtomicUsize,
    next_replica: AtomicU64,
}

/// Replica handle over shared in-memory storage
///
/// Entries keep first-insertion order. Every replica sees every write
/// immediately; events are flagged `local` for subscribers of the writing
/// replica.
pub struct InMemorySharedMap {
    storage: Arc<Storage>,
    replica: ReplicaId,
}

impl InMemorySharedMap {
    /// Create map with fresh storage
    #[must_use]
    pub fn new() -> Self {
        let storage = Arc::new(Storage::default());
        let replica = storage.next_replica.fetch_add(1, Ordering::Relaxed);
        Self { storage, replica }
    }

    /// Create another replica over the same storage
    #[must_use]
    pub fn replica(&self) -> Self {
        let replica = self.storage.next_replica.fetch_add(1, Ordering::Relaxed);
        Self {
            storage: Arc::clone(&self.storage),
            replica,
        }
    }

    /// Number of full scans performed through any replica
    #[inline]
    #[must_use]
    pub fn scan_count(&self) -> usize {
        self.storage.scans.load(Ordering::Relaxed)
    }

    /// Number of change feed subscribers across replicas
    #[inline]
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.storage.subscribers.lock().len()
    }

    fn emit(&self, make: impl Fn(bool) -> MapEvent) {
        let targets: Vec<(ReplicaId, Arc<dyn MapListener>)> = self
            .storage
            .subscribers
            .lock()
            .iter()
            .map(|s| (s.replica, Arc::clone(&s.listener)))
            .collect();

        for (replica, listener) in targets {
            listener.on_event(&make(replica == self.replica));
        }
    }
}

impl Default for InMemorySharedMap {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InMemorySharedMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemorySharedMap")
            .field("replica", &self.replica)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl SharedMap for InMemorySharedMap {
    fn has(&self, key: &str) -> bool {
        self.storage.entries.lock().contains_key(key)
    }

    fn get(&self, key: &str) -> Option<String> {
        self.storage.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        let previous_value = self.storage.entries.lock().insert(key.to_string(), value);
        tracing::trace!(key, replica = self.replica, "shared map set");
        self.emit(|local| MapEvent::ValueChanged {
            key: key.to_string(),
            previous_value: previous_value.clone(),
            local,
        });
    }

    fn delete(&self, key: &str) -> bool {
        let previous_value = self.storage.entries.lock().shift_remove(key);
        let Some(previous_value) = previous_value else {
            return false;
        };
        tracing::trace!(key, replica = self.replica, "shared map delete");
        self.emit(|local| MapEvent::ValueChanged {
            key: key.to_string(),
            previous_value: Some(previous_value.clone()),
            local,
        });
        true
    }

    fn for_each(&self, visit: &mut dyn FnMut(&str, &str)) {
        self.storage.scans.fetch_add(1, Ordering::Relaxed);
        let snapshot: Vec<(String, String)> = self
            .storage
            .entries
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (key, value) in &snapshot {
            visit(key, value);
        }
    }

    fn clear(&self) {
        self.storage.entries.lock().clear();
        tracing::trace!(replica = self.replica, "shared map cleared");
        self.emit(|local| MapEvent::Cleared { local });
    }

    fn len(&self) -> usize {
        self.storage.entries.lock().len()
    }

    fn subscribe(&self, listener: Arc<dyn MapListener>) -> ListenerId {
        let id = ListenerId::new();
        self.storage.subscribers.lock().push(Subscriber {
            id,
            replica: self.replica,
            listener,
        });
        id
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut subscribers = self.storage.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        subscribers.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(map: &InMemorySharedMap) -> Arc<Mutex<Vec<MapEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        map.subscribe(Arc::new(move |e: &MapEvent| sink.lock().push(e.clone())));
        events
    }

    #[test]
    fn set_get_delete() {
        let map = InMemorySharedMap::new();
        map.set("a", "1".to_string());

        assert!(map.has("a"));
        assert_eq!(map.get("a").as_deref(), Some("1"));
        assert_eq!(map.len(), 1);

        assert!(map.delete("a"));
        assert!(!map.delete("a"));
        assert!(map.is_empty());
    }

    #[test]
    fn events_carry_previous_value() {
        let map = InMemorySharedMap::new();
        let events = recorder(&map);

        map.set("a", "1".to_string());
        map.set("a", "2".to_string());
        map.delete("a");

        let events = events.lock();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            MapEvent::ValueChanged {
                key: "a".to_string(),
                previous_value: None,
                local: true
            }
        );
        assert_eq!(
            events[1],
            MapEvent::ValueChanged {
                key: "a".to_string(),
                previous_value: Some("1".to_string()),
                local: true
            }
        );
        assert_eq!(
            events[2],
            MapEvent::ValueChanged {
                key: "a".to_string(),
                previous_value: Some("2".to_string()),
                local: true
            }
        );
    }

    #[test]
    fn replicas_share_storage_and_flag_origin() {
        let left = InMemorySharedMap::new();
        let right = left.replica();
        let left_events = recorder(&left);
        let right_events = recorder(&right);

        right.set("k", "v".to_string());

        assert_eq!(left.get("k").as_deref(), Some("v"));
        assert!(!left_events.lock()[0].is_local());
        assert!(right_events.lock()[0].is_local());
    }

    #[test]
    fn for_each_keeps_insertion_order_and_counts_scans() {
        let map = InMemorySharedMap::new();
        for key in ["c", "a", "b"] {
            map.set(key, key.to_uppercase());
        }
        map.set("c", "C2".to_string());

        let mut seen = Vec::new();
        map.for_each(&mut |k: &str, v: &str| seen.push(format!("{k}={v}")));

        assert_eq!(seen, vec!["c=C2", "a=A", "b=B"]);
        assert_eq!(map.scan_count(), 1);
    }

    #[test]
    fn clear_emits_single_event() {
        let map = InMemorySharedMap::new();
        map.set("a", "1".to_string());
        map.set("b", "2".to_string());
        let events = recorder(&map);

        map.clear();

        assert!(map.is_empty());
        assert_eq!(*events.lock(), vec![MapEvent::Cleared { local: true }]);
    }

    #[test]
    fn listener_may_write_back() {
        let map = Arc::new(InMemorySharedMap::new());
        let writer = Arc::clone(&map);
        map.subscribe(Arc::new(move |e: &MapEvent| {
            if let MapEvent::ValueChanged { key, .. } = e {
                if key == "ping" {
                    writer.set("pong", "1".to_string());
                }
            }
        }));

        map.set("ping", "1".to_string());
        assert!(map.has("pong"));
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let map = InMemorySharedMap::new();
        let events = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&events);
        let id = map.subscribe(Arc::new(move |_: &MapEvent| *sink.lock() += 1));

        map.set("a", "1".to_string());
        assert!(map.unsubscribe(id));
        assert!(!map.unsubscribe(id));
        map.set("b", "2".to_string());

        assert_eq!(*events.lock(), 1);
        assert_eq!(map.subscriber_count(), 0);
    }
}
