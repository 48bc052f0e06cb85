//! Memoized ordered view
//!
//! [`OrderedView`] owns the cache/invalidate contract for a Caucus's sorted
//! sequence: which operations dirty it, when it rebuilds, and the in-place
//! maintenance path for amends that keep their sort position.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Sort order for cached values
pub type Comparator<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// Cached `(key, value)` sequence guarded by a dirty flag
///
/// # Invariants
/// - When clean, `entries` holds exactly what the last successful rebuild
///   produced plus any in-place replacements since
/// - A failed rebuild leaves the view dirty
/// - In-place replacement never inserts or moves an entry
pub struct OrderedView<T> {
    entries: Vec<(String, T)>,
    dirty: bool,
    comparator: Option<Comparator<T>>,
    rebuilds: u64,
}

impl<T> OrderedView<T> {
    /// Create dirty, empty view
    #[inline]
    #[must_use]
    pub fn new(comparator: Option<Comparator<T>>) -> Self {
        Self {
            entries: Vec::new(),
            dirty: true,
            comparator,
            rebuilds: 0,
        }
    }

    /// Check if the next read must rebuild
    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark stale
    #[inline]
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Drop cached entries and mark stale
    #[inline]
    pub fn clear(&mut self) {
        self.entries.clear();
        self.dirty = true;
    }

    /// Whether a comparator is configured
    #[inline]
    #[must_use]
    pub fn is_ordered(&self) -> bool {
        self.comparator.is_some()
    }

    /// Number of completed rebuilds
    #[inline]
    #[must_use]
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    /// Return cached entries, rebuilding first if dirty
    ///
    /// `load` supplies the unsorted entries; they are sorted by the
    /// comparator if one is configured, otherwise kept in load order.
    ///
    /// # Errors
    /// Propagates the error from `load`; the view stays dirty
    pub fn get_or_rebuild<E, F>(&mut self, load: F) -> Result<&[(String, T)], E>
    where
        F: FnOnce() -> Result<Vec<(String, T)>, E>,
    {
        if self.dirty {
            let entries = load()?;
            self.entries = self.arrange(entries);
            self.dirty = false;
            self.rebuilds += 1;
            tracing::debug!(entries = self.entries.len(), rebuilds = self.rebuilds, "ordered view rebuilt");
        }
        Ok(&self.entries)
    }

    /// Sort `entries` by this view's comparator without caching them
    #[must_use]
    pub fn arrange(&self, mut entries: Vec<(String, T)>) -> Vec<(String, T)> {
        if let Some(cmp) = &self.comparator {
            entries.sort_by(|a, b| cmp(&a.1, &b.1));
        }
        entries
    }

    /// Replace the value stored under `key` without re-sorting
    ///
    /// Binary-searches for `value`'s sort position and replaces the entry
    /// with the same key among those comparing equal to it. Returns the
    /// index on success. Returns `None` when the view is dirty, unordered,
    /// or the key is not at that position; the caller must then invalidate.
    pub fn replace_in_place(&mut self, key: &str, value: T) -> Option<usize> {
        if self.dirty {
            return None;
        }
        let cmp = self.comparator.as_ref()?;
        let hit = self
            .entries
            .binary_search_by(|(_, probe)| cmp(probe, &value))
            .ok()?;

        let mut lo = hit;
        while lo > 0 && cmp(&self.entries[lo - 1].1, &value) == Ordering::Equal {
            lo -= 1;
        }
        let mut hi = hit;
        while hi + 1 < self.entries.len() && cmp(&self.entries[hi + 1].1, &value) == Ordering::Equal {
            hi += 1;
        }

        let index = (lo..=hi).find(|&i| self.entries[i].0 == key)?;
        self.entries[index].1 = value;
        Some(index)
    }
}

impl<T> fmt::Debug for OrderedView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderedView")
            .field("len", &self.entries.len())
            .field("dirty", &self.dirty)
            .field("ordered", &self.comparator.is_some())
            .field("rebuilds", &self.rebuilds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn by_value() -> Option<Comparator<u32>> {
        Some(Arc::new(|a: &u32, b: &u32| a.cmp(b)))
    }

    fn load(pairs: &[(&str, u32)]) -> Result<Vec<(String, u32)>, ()> {
        Ok(pairs.iter().map(|(k, v)| ((*k).to_string(), *v)).collect())
    }

    #[test]
    fn starts_dirty_and_rebuilds_once() {
        let mut view = OrderedView::new(by_value());
        assert!(view.is_dirty());

        let entries = view.get_or_rebuild(|| load(&[("b", 2), ("a", 1)])).unwrap();
        assert_eq!(entries[0].0, "a");
        assert!(!view.is_dirty());

        // Clean view never calls the loader
        let again = view
            .get_or_rebuild(|| -> Result<Vec<(String, u32)>, ()> { panic!("must not reload") })
            .unwrap();
        assert_eq!(again.len(), 2);
        assert_eq!(view.rebuild_count(), 1);
    }

    #[test]
    fn unordered_keeps_load_order() {
        let mut view: OrderedView<u32> = OrderedView::new(None);
        let entries = view.get_or_rebuild(|| load(&[("z", 9), ("a", 1)])).unwrap();
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn failed_rebuild_stays_dirty() {
        let mut view = OrderedView::new(by_value());
        let result = view.get_or_rebuild(|| Err::<Vec<(String, u32)>, _>("boom"));

        assert_eq!(result.unwrap_err(), "boom");
        assert!(view.is_dirty());
        assert_eq!(view.rebuild_count(), 0);
    }

    #[test]
    fn invalidate_forces_rebuild() {
        let mut view = OrderedView::new(by_value());
        view.get_or_rebuild(|| load(&[("a", 1)])).unwrap();
        view.invalidate();

        let entries = view.get_or_rebuild(|| load(&[("a", 1), ("b", 0)])).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(view.rebuild_count(), 2);
    }

    #[test]
    fn replace_in_place_hits_matching_key() {
        let mut view = OrderedView::new(by_value());
        view.get_or_rebuild(|| load(&[("a", 10), ("b", 20), ("c", 30)])).unwrap();

        assert_eq!(view.replace_in_place("b", 20), Some(1));
        assert!(!view.is_dirty());
    }

    #[test]
    fn replace_in_place_scans_equal_run_for_key() {
        let mut view = OrderedView::new(by_value());
        view.get_or_rebuild(|| load(&[("a", 5), ("b", 5), ("c", 5), ("d", 7)])).unwrap();

        assert_eq!(view.replace_in_place("c", 5), Some(2));
        assert_eq!(view.replace_in_place("a", 5), Some(0));
    }

    #[test]
    fn replace_in_place_misses_moved_entry() {
        let mut view = OrderedView::new(by_value());
        view.get_or_rebuild(|| load(&[("a", 10), ("b", 20), ("c", 30)])).unwrap();

        // "b" now sorts between a and c at a value not present: no exact hit
        assert_eq!(view.replace_in_place("b", 25), None);
        // Lands on c's position but the key differs
        assert_eq!(view.replace_in_place("b", 30), None);
    }

    #[test]
    fn replace_in_place_refuses_when_dirty_or_unordered() {
        let mut view = OrderedView::new(by_value());
        assert_eq!(view.replace_in_place("a", 1), None);

        let mut unordered: OrderedView<u32> = OrderedView::new(None);
        unordered.get_or_rebuild(|| load(&[("a", 1)])).unwrap();
        assert_eq!(unordered.replace_in_place("a", 1), None);
    }

    #[test]
    fn arrange_sorts_without_caching() {
        let view = OrderedView::new(by_value());
        let arranged = view.arrange(load(&[("b", 2), ("a", 1)]).unwrap());

        assert_eq!(arranged[0].0, "a");
        assert!(view.is_dirty());
        assert_eq!(view.rebuild_count(), 0);
    }

    #[test]
    fn clear_empties_and_dirties() {
        let mut view = OrderedView::new(by_value());
        view.get_or_rebuild(|| load(&[("a", 1)])).unwrap();
        view.clear();

        assert!(view.is_dirty());
        assert!(view.get_or_rebuild(|| load(&[])).unwrap().is_empty());
    }
}
