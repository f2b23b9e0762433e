//! # Object Pool Manager
//!
//! One object pool per resource type, ticked once per frame.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::entry::PoolResource;
use super::pool::{ObjectPool, ObjectPoolInfo};
use crate::clock::{Clock, SystemClock};
use crate::config::{ObjectPoolConfig, ObjectPoolSettings};
use crate::error::{PoolError, PoolResult};
use crate::reference::ReferencePool;

/// Type-erased view of an `ObjectPool<R>`, used for broadcasts.
trait ManagedPool: Any + Send {
    fn update(&mut self, elapsed: Duration, real_elapsed: Duration);
    fn release(&mut self) -> usize;
    fn release_all_unused(&mut self) -> usize;
    fn shutdown(&mut self);
    fn count(&self) -> usize;
    fn info(&self) -> ObjectPoolInfo;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<R: PoolResource> ManagedPool for ObjectPool<R> {
    fn update(&mut self, elapsed: Duration, real_elapsed: Duration) {
        ObjectPool::update(self, elapsed, real_elapsed);
    }

    fn release(&mut self) -> usize {
        ObjectPool::release(self)
    }

    fn release_all_unused(&mut self) -> usize {
        ObjectPool::release_all_unused(self)
    }

    fn shutdown(&mut self) {
        ObjectPool::shutdown(self);
    }

    fn count(&self) -> usize {
        ObjectPool::count(self)
    }

    fn info(&self) -> ObjectPoolInfo {
        ObjectPool::info(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Registry of object pools keyed by resource type.
///
/// Like [`ReferencePool`], this is a context object owned by the module
/// that drives the frame, not a global.
///
/// ## Frame Integration
///
/// ```text
/// Frame N:
///   logic tick ──> spawn / unspawn through get::<R>()
///   pool tick  ──> manager.update(elapsed, real_elapsed)
///                    └─ every pool: accumulate, evict expired on interval
/// Shutdown:
///   manager.shutdown()
///     └─ every pool ─> every entry ─> on_release ─> entry struct recycled
/// ```
///
/// # Thread Safety
///
/// `Send` but not `Sync`. Mutation takes `&mut self`; wrap in a mutex if
/// several threads must spawn.
pub struct ObjectPoolManager {
    pools: HashMap<TypeId, Box<dyn ManagedPool>>,
    references: Arc<ReferencePool>,
    clock: Arc<dyn Clock>,
}

impl ObjectPoolManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new(references: Arc<ReferencePool>, clock: Arc<dyn Clock>) -> Self {
        Self {
            pools: HashMap::new(),
            references,
            clock,
        }
    }

    /// Creates an empty manager driven by the wall clock.
    #[must_use]
    pub fn with_system_clock(references: Arc<ReferencePool>) -> Self {
        Self::new(references, Arc::new(SystemClock))
    }

    /// The reference pool released entries are recycled into.
    #[must_use]
    pub fn references(&self) -> &Arc<ReferencePool> {
        &self.references
    }

    /// The clock shared by every pool.
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Number of pools.
    #[must_use]
    pub fn count(&self) -> usize {
        self.pools.len()
    }

    /// Total entries across every pool.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.pools.values().map(|p| p.count()).sum()
    }

    /// Creates the pool for `R`.
    ///
    /// # Errors
    ///
    /// [`PoolError::DuplicatePool`] if a pool for `R` already exists. The
    /// existing pool is left untouched.
    pub fn create<R: PoolResource>(
        &mut self,
        capacity: usize,
        expire_time: Option<Duration>,
        allow_multi_spawn: bool,
    ) -> PoolResult<&mut ObjectPool<R>> {
        self.create_with_settings(ObjectPoolSettings::new(
            capacity,
            expire_time,
            allow_multi_spawn,
        ))
    }

    /// Creates the pool for `R` from a config file entry.
    ///
    /// # Errors
    ///
    /// [`PoolError::InvalidConfig`] if the config is invalid,
    /// [`PoolError::DuplicatePool`] if a pool for `R` already exists.
    pub fn create_from_config<R: PoolResource>(
        &mut self,
        config: &ObjectPoolConfig,
    ) -> PoolResult<&mut ObjectPool<R>> {
        let settings = config.settings()?;
        self.create_with_settings(settings)
    }

    /// Creates the pool for `R` from validated settings.
    ///
    /// # Errors
    ///
    /// [`PoolError::DuplicatePool`] if a pool for `R` already exists.
    pub fn create_with_settings<R: PoolResource>(
        &mut self,
        settings: ObjectPoolSettings,
    ) -> PoolResult<&mut ObjectPool<R>> {
        let type_name = std::any::type_name::<R>();

        let slot = match self.pools.entry(TypeId::of::<R>()) {
            std::collections::hash_map::Entry::Occupied(_) => {
                tracing::warn!("object pool for {} already exists", type_name);
                return Err(PoolError::DuplicatePool { type_name });
            }
            std::collections::hash_map::Entry::Vacant(slot) => slot,
        };

        tracing::debug!(
            "object pool created for {} (capacity {}, expire {:?}, multi-spawn {})",
            type_name,
            settings.capacity,
            settings.expire_time,
            settings.allow_multi_spawn
        );

        let pool = ObjectPool::<R>::new(
            settings,
            Arc::clone(&self.clock),
            Arc::clone(&self.references),
        );
        Ok(downcast_mut(slot.insert(Box::new(pool)).as_mut()))
    }

    /// Whether a pool for `R` exists.
    #[must_use]
    pub fn has<R: PoolResource>(&self) -> bool {
        self.pools.contains_key(&TypeId::of::<R>())
    }

    /// The pool for `R`, if created.
    #[must_use]
    pub fn get<R: PoolResource>(&mut self) -> Option<&mut ObjectPool<R>> {
        self.pools
            .get_mut(&TypeId::of::<R>())
            .map(|pool| downcast_mut(pool.as_mut()))
    }

    /// Read-only access to the pool for `R`, if created.
    #[must_use]
    pub fn get_ref<R: PoolResource>(&self) -> Option<&ObjectPool<R>> {
        self.pools
            .get(&TypeId::of::<R>())
            .and_then(|pool| pool.as_any().downcast_ref::<ObjectPool<R>>())
    }

    /// Shuts down the pool for `R` and removes it.
    ///
    /// Returns `false` if no such pool exists.
    pub fn destroy<R: PoolResource>(&mut self) -> bool {
        let Some(mut pool) = self.pools.remove(&TypeId::of::<R>()) else {
            return false;
        };

        pool.shutdown();
        tracing::debug!("object pool destroyed for {}", std::any::type_name::<R>());
        true
    }

    /// Capacity-triggered eviction pass on every pool.
    ///
    /// Returns the total number of entries released.
    pub fn release(&mut self) -> usize {
        self.pools.values_mut().map(|p| p.release()).sum()
    }

    /// Releases every idle, unlocked entry in every pool.
    ///
    /// Returns the total number of entries released.
    pub fn release_all_unused(&mut self) -> usize {
        self.pools.values_mut().map(|p| p.release_all_unused()).sum()
    }

    /// Forwards the frame tick to every pool.
    pub fn update(&mut self, elapsed: Duration, real_elapsed: Duration) {
        for pool in self.pools.values_mut() {
            pool.update(elapsed, real_elapsed);
        }
    }

    /// Snapshots every pool, sorted by type name.
    #[must_use]
    pub fn infos(&self) -> Vec<ObjectPoolInfo> {
        let mut infos: Vec<_> = self.pools.values().map(|p| p.info()).collect();
        infos.sort_by(|a, b| a.type_name.cmp(b.type_name));
        infos
    }

    /// Shuts down every pool and clears the registry.
    pub fn shutdown(&mut self) {
        let pool_count = self.pools.len();
        let entry_count = self.entry_count();

        for (_, mut pool) in self.pools.drain() {
            pool.shutdown();
        }

        tracing::info!(
            "object pool manager shut down ({} pools, {} entries released)",
            pool_count,
            entry_count
        );
    }
}

impl Drop for ObjectPoolManager {
    fn drop(&mut self) {
        if !self.pools.is_empty() {
            self.shutdown();
        }
    }
}

impl std::fmt::Debug for ObjectPoolManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectPoolManager")
            .field("pools", &self.pools.len())
            .field("entries", &self.entry_count())
            .finish()
    }
}

/// Recovers the concrete pool type. The map key guarantees the match.
fn downcast_mut<R: PoolResource>(pool: &mut dyn ManagedPool) -> &mut ObjectPool<R> {
    match pool.as_any_mut().downcast_mut::<ObjectPool<R>>() {
        Some(pool) => pool,
        None => unreachable!("object pool keyed under a foreign TypeId"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Bullet {
        id: u32,
        released: Arc<AtomicUsize>,
    }

    impl PoolResource for Bullet {
        type Handle = u32;

        fn handle(&self) -> u32 {
            self.id
        }

        fn on_release(self, _is_shutdown: bool) {
            self.released.fetch_add(1, Ordering::Relaxed);
        }
    }

    struct Voice {
        channel: u8,
        released: Arc<AtomicUsize>,
    }

    impl PoolResource for Voice {
        type Handle = u8;

        fn handle(&self) -> u8 {
            self.channel
        }

        fn on_release(self, _is_shutdown: bool) {
            self.released.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn manager() -> (ObjectPoolManager, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let manager = ObjectPoolManager::new(
            Arc::new(ReferencePool::new()),
            Arc::clone(&clock) as Arc<dyn Clock>,
        );
        (manager, clock)
    }

    #[test]
    fn test_create_get_destroy() {
        let (mut manager, _) = manager();
        assert!(manager.get::<Bullet>().is_none());

        assert!(manager.create::<Bullet>(8, None, false).is_ok());
        assert!(manager.has::<Bullet>());
        assert!(!manager.has::<Voice>());
        assert_eq!(manager.get_ref::<Bullet>().map(ObjectPool::capacity), Some(8));

        assert!(manager.destroy::<Bullet>());
        assert!(!manager.destroy::<Bullet>());
        assert_eq!(manager.count(), 0);
    }

    #[test]
    fn test_duplicate_create_is_rejected_without_change() {
        let (mut manager, _) = manager();
        assert!(manager.create::<Bullet>(8, None, false).is_ok());

        let err = manager.create::<Bullet>(1, None, true).unwrap_err();
        assert!(matches!(err, PoolError::DuplicatePool { .. }));

        let pool = manager.get::<Bullet>().unwrap();
        assert_eq!(pool.capacity(), 8);
        assert!(!pool.allow_multi_spawn());
    }

    #[test]
    fn test_update_forwards_to_every_pool() {
        let (mut manager, clock) = manager();
        let released = Arc::new(AtomicUsize::new(0));
        let expire = Some(Duration::from_secs(1));

        let bullets = manager.create::<Bullet>(0, expire, false).unwrap();
        bullets.set_capacity(10);
        let entry = bullets.create_entry(
            "9mm",
            Bullet {
                id: 1,
                released: Arc::clone(&released),
            },
        );
        bullets.register(entry, false).unwrap();
        bullets.set_auto_release_interval(expire);

        let voices = manager.create::<Voice>(10, expire, false).unwrap();
        let entry = voices.create_entry(
            "step",
            Voice {
                channel: 3,
                released: Arc::clone(&released),
            },
        );
        voices.register(entry, false).unwrap();

        // Bullets are over capacity once capacity drops back to 0
        manager.get::<Bullet>().unwrap().set_capacity(0);
        clock.advance(Duration::from_secs(2));
        manager.update(Duration::from_secs(2), Duration::from_secs(2));

        // Only the over-capacity pool evicts; the voice pool is within capacity
        assert_eq!(released.load(Ordering::Relaxed), 1);
        assert_eq!(manager.entry_count(), 1);
    }

    #[test]
    fn test_shutdown_releases_everything() {
        let (mut manager, _) = manager();
        let released = Arc::new(AtomicUsize::new(0));

        let bullets = manager.create::<Bullet>(usize::MAX, None, false).unwrap();
        for id in 0..3 {
            let entry = bullets.create_entry(
                "slug",
                Bullet {
                    id,
                    released: Arc::clone(&released),
                },
            );
            bullets.register(entry, id == 0).unwrap();
        }

        manager.shutdown();
        assert_eq!(manager.count(), 0);
        assert_eq!(manager.entry_count(), 0);
        assert_eq!(released.load(Ordering::Relaxed), 3);

        drop(manager);
        assert_eq!(released.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_infos_sorted_by_type_name() {
        let (mut manager, _) = manager();
        assert!(manager.create::<Voice>(4, None, true).is_ok());
        assert!(manager.create::<Bullet>(4, None, false).is_ok());

        let infos = manager.infos();
        assert_eq!(infos.len(), 2);
        assert!(infos[0].type_name <= infos[1].type_name);
    }

    #[test]
    fn test_manager_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<ObjectPoolManager>();
    }

    #[test]
    fn test_update_from_tick_thread() {
        let (mut manager, clock) = manager();
        let released = Arc::new(AtomicUsize::new(0));

        let bullets = manager
            .create::<Bullet>(0, Some(Duration::from_secs(1)), false)
            .unwrap();
        let entry = bullets.create_entry(
            "slug",
            Bullet {
                id: 7,
                released: Arc::clone(&released),
            },
        );
        bullets.register(entry, false).unwrap();
        clock.advance(Duration::from_secs(2));

        let shared = Arc::new(parking_lot::Mutex::new(manager));
        let tick = Arc::clone(&shared);
        std::thread::spawn(move || {
            tick.lock()
                .update(Duration::from_secs(2), Duration::from_secs(2));
        })
        .join()
        .unwrap();

        assert_eq!(released.load(Ordering::Relaxed), 1);
        assert_eq!(shared.lock().entry_count(), 0);
    }
}
