//! # Reference Collection
//!
//! Free list for exactly one poolable type.

use parking_lot::Mutex;
use std::collections::VecDeque;

use super::Reference;

/// Snapshot of a single collection's counters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceCollectionInfo {
    /// Name of the pooled type.
    pub type_name: &'static str,
    /// Values sitting in the free list.
    pub unused_count: usize,
    /// Values handed out and not yet released.
    pub using_count: usize,
    /// Total `acquire` calls.
    pub acquire_count: u64,
    /// Total `release` calls.
    pub release_count: u64,
    /// Total values pre-populated through `add`.
    pub add_count: u64,
    /// Total values discarded through `remove` / `remove_all`.
    pub remove_count: u64,
    /// Acquisitions that found the free list empty and had to construct.
    pub created_count: u64,
}

/// Mutable state guarded by the collection lock.
struct CollectionState<T> {
    free: VecDeque<T>,
    using_count: usize,
    acquire_count: u64,
    release_count: u64,
    add_count: u64,
    remove_count: u64,
    created_count: u64,
}

/// Thread-safe free list of one poolable type.
///
/// Every value in the queue has already been cleared. Values are moved in
/// and out, so the same value can never sit in the queue twice.
///
/// # Thread Safety
///
/// All operations serialize on this collection's own lock. `T::default()`,
/// `T::clear()` and `Drop` of discarded values run outside the lock.
pub struct ReferenceCollection<T: Reference> {
    state: Mutex<CollectionState<T>>,
}

impl<T: Reference> ReferenceCollection<T> {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CollectionState {
                free: VecDeque::new(),
                using_count: 0,
                acquire_count: 0,
                release_count: 0,
                add_count: 0,
                remove_count: 0,
                created_count: 0,
            }),
        }
    }

    /// Takes a value from the free list, or constructs a fresh default.
    ///
    /// Never fails. Callers must treat the value as blank application state
    /// and populate it themselves.
    pub fn acquire(&self) -> T {
        let recycled = {
            let mut state = self.state.lock();
            state.acquire_count += 1;
            state.using_count += 1;
            let recycled = state.free.pop_front();
            if recycled.is_none() {
                state.created_count += 1;
            }
            recycled
        };

        recycled.unwrap_or_default()
    }

    /// Clears `value` and pushes it onto the free list.
    pub fn release(&self, mut value: T) {
        value.clear();

        let mut state = self.state.lock();
        state.release_count += 1;
        state.using_count = state.using_count.saturating_sub(1);
        state.free.push_back(value);
    }

    /// Pre-populates the free list with `count` fresh defaults.
    pub fn add(&self, count: usize) {
        if count == 0 {
            return;
        }

        let fresh: Vec<T> = (0..count).map(|_| T::default()).collect();

        let mut state = self.state.lock();
        state.add_count += count as u64;
        state.free.extend(fresh);
    }

    /// Discards up to `count` queued values.
    ///
    /// Returns the number actually discarded.
    pub fn remove(&self, count: usize) -> usize {
        let discarded: Vec<T> = {
            let mut state = self.state.lock();
            let n = count.min(state.free.len());
            state.remove_count += n as u64;
            state.free.drain(..n).collect()
        };

        discarded.len()
    }

    /// Empties the free list.
    pub fn remove_all(&self) {
        let discarded = {
            let mut state = self.state.lock();
            state.remove_count += state.free.len() as u64;
            std::mem::take(&mut state.free)
        };
        drop(discarded);
    }

    /// Number of values waiting in the free list.
    #[must_use]
    pub fn unused_count(&self) -> usize {
        self.state.lock().free.len()
    }

    /// Returns a snapshot of this collection's counters.
    #[must_use]
    pub fn info(&self) -> ReferenceCollectionInfo {
        let state = self.state.lock();
        ReferenceCollectionInfo {
            type_name: std::any::type_name::<T>(),
            unused_count: state.free.len(),
            using_count: state.using_count,
            acquire_count: state.acquire_count,
            release_count: state.release_count,
            add_count: state.add_count,
            remove_count: state.remove_count,
            created_count: state.created_count,
        }
    }
}

impl<T: Reference> Default for ReferenceCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default, Debug, PartialEq)]
    struct Payload {
        id: u32,
        bytes: Vec<u8>,
    }

    impl Reference for Payload {
        fn clear(&mut self) {
            self.id = 0;
            self.bytes.clear();
        }
    }

    #[test]
    fn test_release_then_acquire_yields_cleared_value() {
        let collection: ReferenceCollection<Payload> = ReferenceCollection::new();

        let mut payload = collection.acquire();
        payload.id = 7;
        payload.bytes.extend_from_slice(&[1, 2, 3]);
        collection.release(payload);

        let recycled = collection.acquire();
        assert_eq!(recycled, Payload::default());
        // Capacity survived the clear
        assert!(recycled.bytes.capacity() >= 3);
    }

    #[test]
    fn test_warm_pool_does_not_construct() {
        let collection: ReferenceCollection<Payload> = ReferenceCollection::new();
        collection.add(4);

        let held: Vec<Payload> = (0..6).map(|_| collection.acquire()).collect();
        assert_eq!(held.len(), 6);

        let info = collection.info();
        assert_eq!(info.created_count, 2);
        assert_eq!(info.using_count, 6);
        assert_eq!(info.unused_count, 0);
    }

    #[test]
    fn test_remove_is_bounded_by_queue_length() {
        let collection: ReferenceCollection<Payload> = ReferenceCollection::new();
        collection.add(3);

        assert_eq!(collection.remove(2), 2);
        assert_eq!(collection.remove(10), 1);
        assert_eq!(collection.unused_count(), 0);
        assert_eq!(collection.info().remove_count, 3);
    }

    #[test]
    fn test_remove_all_empties_free_list() {
        let collection: ReferenceCollection<Payload> = ReferenceCollection::new();
        collection.add(5);
        collection.release(Payload::default());

        collection.remove_all();

        let info = collection.info();
        assert_eq!(info.unused_count, 0);
        assert_eq!(info.remove_count, 6);
    }
}
