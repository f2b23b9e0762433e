//! # Reference Pool Registry
//!
//! Routes typed acquire/release calls to the collection for that type.

use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use super::{Reference, ReferenceCollection, ReferenceCollectionInfo};

/// Type-erased view of a collection, used for teardown and reporting.
trait ErasedCollection: Send + Sync {
    fn remove_all(&self);
    fn info(&self) -> ReferenceCollectionInfo;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Reference> ErasedCollection for ReferenceCollection<T> {
    fn remove_all(&self) {
        ReferenceCollection::remove_all(self);
    }

    fn info(&self) -> ReferenceCollectionInfo {
        ReferenceCollection::info(self)
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Registry of per-type free lists.
///
/// This is a context object, not a global. Construct one at startup, share
/// it as `Arc<ReferencePool>` with every subsystem that recycles payloads,
/// and call [`ReferencePool::clear_all`] once at shutdown.
///
/// # Thread Safety
///
/// `acquire` and `release` may be called from any thread. The type map is
/// read-locked for lookup and write-locked only when a type is registered
/// for the first time. The collection itself is used after the map lock is
/// dropped, so `Reference::clear` may safely re-enter the pool.
///
/// # Example
///
/// ```rust,ignore
/// let pool = ReferencePool::new();
/// pool.add::<HitEvent>(64); // warm up before the match starts
///
/// let mut event = pool.acquire::<HitEvent>();
/// event.target = entity;
/// dispatch(&event);
/// pool.release(event);
/// ```
#[derive(Default)]
pub struct ReferencePool {
    collections: RwLock<HashMap<TypeId, Arc<dyn ErasedCollection>>>,
}

impl ReferencePool {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collection for `T`, creating it on first use.
    #[must_use]
    pub fn collection<T: Reference>(&self) -> Arc<ReferenceCollection<T>> {
        let key = TypeId::of::<T>();

        let existing = self.collections.read().get(&key).cloned();
        let erased = if let Some(erased) = existing {
            erased
        } else {
            let mut collections = self.collections.write();
            Arc::clone(collections.entry(key).or_insert_with(|| {
                tracing::trace!("reference collection created for {}", std::any::type_name::<T>());
                Arc::new(ReferenceCollection::<T>::new()) as Arc<dyn ErasedCollection>
            }))
        };

        match erased.into_any().downcast::<ReferenceCollection<T>>() {
            Ok(collection) => collection,
            Err(_) => unreachable!("reference collection keyed under a foreign TypeId"),
        }
    }

    /// Takes a `T` from its free list, or constructs a fresh default.
    #[inline]
    #[must_use]
    pub fn acquire<T: Reference>(&self) -> T {
        self.collection::<T>().acquire()
    }

    /// Clears `value` and returns it to the free list for `T`.
    #[inline]
    pub fn release<T: Reference>(&self, value: T) {
        self.collection::<T>().release(value);
    }

    /// Pre-populates the free list for `T` with `count` fresh defaults.
    pub fn add<T: Reference>(&self, count: usize) {
        self.collection::<T>().add(count);
    }

    /// Discards up to `count` queued values of `T`.
    ///
    /// Returns the number actually discarded.
    pub fn remove<T: Reference>(&self, count: usize) -> usize {
        self.collection::<T>().remove(count)
    }

    /// Empties the free list for `T`.
    pub fn remove_all<T: Reference>(&self) {
        self.collection::<T>().remove_all();
    }

    /// Number of types with a registered collection.
    #[must_use]
    pub fn count(&self) -> usize {
        self.collections.read().len()
    }

    /// Snapshots every collection, sorted by type name.
    #[must_use]
    pub fn infos(&self) -> Vec<ReferenceCollectionInfo> {
        let mut infos: Vec<_> = self.collections.read().values().map(|c| c.info()).collect();
        infos.sort_by(|a, b| a.type_name.cmp(b.type_name));
        infos
    }

    /// Empties every collection and forgets every type.
    ///
    /// Values still held by callers stay valid. Releasing them afterwards
    /// lazily recreates the collection.
    pub fn clear_all(&self) {
        let collections = std::mem::take(&mut *self.collections.write());
        for collection in collections.values() {
            collection.remove_all();
        }
        tracing::debug!("reference pool cleared ({} collections)", collections.len());
    }
}

impl std::fmt::Debug for ReferencePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferencePool")
            .field("collections", &self.count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct MoveCommand {
        entity: u32,
        speed: f32,
    }

    impl Reference for MoveCommand {}

    #[derive(Default)]
    struct ChatLine {
        text: String,
    }

    impl Reference for ChatLine {
        fn clear(&mut self) {
            self.text.clear();
        }
    }

    #[test]
    fn test_acquire_after_release_is_reset() {
        let pool = ReferencePool::new();

        let mut cmd = pool.acquire::<MoveCommand>();
        cmd.entity = 42;
        cmd.speed = 3.5;
        pool.release(cmd);

        let cmd = pool.acquire::<MoveCommand>();
        assert_eq!(cmd.entity, 0);
        assert!(cmd.speed.abs() < f32::EPSILON);
    }

    #[test]
    fn test_one_collection_per_type() {
        let pool = ReferencePool::new();

        let a = pool.collection::<MoveCommand>();
        let b = pool.collection::<MoveCommand>();
        assert!(Arc::ptr_eq(&a, &b));

        pool.release(ChatLine::default());
        assert_eq!(pool.count(), 2);
    }

    #[test]
    fn test_types_do_not_share_free_lists() {
        let pool = ReferencePool::new();
        pool.add::<ChatLine>(3);

        assert_eq!(pool.collection::<ChatLine>().unused_count(), 3);
        assert_eq!(pool.collection::<MoveCommand>().unused_count(), 0);
    }

    #[test]
    fn test_clear_all_drops_every_collection() {
        let pool = ReferencePool::new();
        pool.add::<ChatLine>(2);
        pool.add::<MoveCommand>(2);

        pool.clear_all();
        assert_eq!(pool.count(), 0);
        assert!(pool.infos().is_empty());

        // Lazily recreated, empty
        let line = pool.acquire::<ChatLine>();
        assert!(line.text.is_empty());
        assert_eq!(pool.count(), 1);
    }

    #[test]
    fn test_infos_sorted_by_type_name() {
        let pool = ReferencePool::new();
        pool.add::<MoveCommand>(1);
        pool.add::<ChatLine>(1);
        assert_eq!(pool.remove::<ChatLine>(5), 1);

        let infos = pool.infos();
        assert_eq!(infos.len(), 2);
        assert!(infos[0].type_name <= infos[1].type_name);
    }
}
