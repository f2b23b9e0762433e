//! # Object Pool
//!
//! Single-type collection of named resources with capacity, expiry and
//! multi-spawn policy.
//!
//! ## Eviction Pass
//!
//! ```text
//!   budget     = explicit count, or max(0, len - capacity)
//!   candidates = entries with spawn_count == 0 && !locked   (insertion order)
//!   evict      = candidates where now - last_use_time >= expire_time,
//!                first `budget` of them
//! ```
//!
//! Capacity is the trigger, expiry is the filter. An entry that has not
//! expired is never evicted by a pass, however far the pool is over
//! capacity. A pool with no expire time therefore never shrinks on its own;
//! use [`ObjectPool::release_all_unused`] for hard resets.
//!
//! ## Thread Safety
//!
//! NOT thread-safe by design. Every mutation takes `&mut self` and is
//! expected to run on the logic tick, like the rest of the frame.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::entry::{PoolEntry, PoolEntryInfo, PoolResource};
use crate::clock::Clock;
use crate::config::ObjectPoolSettings;
use crate::error::{PoolError, PoolResult};
use crate::reference::ReferencePool;

/// Snapshot of a pool's configuration and occupancy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectPoolInfo {
    /// Name of the pooled resource type.
    pub type_name: &'static str,
    /// Registered entries.
    pub count: usize,
    /// Entries that are idle and unlocked.
    pub can_release_count: usize,
    /// Soft ceiling.
    pub capacity: usize,
    /// Idle time after which an entry may be evicted. `None` = never.
    pub expire_time: Option<Duration>,
    /// Whether an in-use entry may be spawned again.
    pub allow_multi_spawn: bool,
    /// Interval of the periodic eviction pass. `None` = never.
    pub auto_release_interval: Option<Duration>,
}

/// Pool of identity-bearing resources of type `R`.
///
/// # Example
///
/// ```rust,ignore
/// let pool = manager.get::<Projectile>().expect("pool created at startup");
///
/// let handle = match pool.spawn("fireball") {
///     Some(entry) => entry.handle().expect("registered entries carry a resource"),
///     None => {
///         let projectile = scene.instantiate("fireball");
///         let handle = projectile.handle();
///         let entry = pool.create_entry("fireball", projectile);
///         pool.register(entry, true)?;
///         handle
///     }
/// };
///
/// // ...later, when the fireball hits something
/// pool.unspawn(handle)?;
/// ```
pub struct ObjectPool<R: PoolResource> {
    /// Insertion-ordered entries. Order decides eviction precedence.
    entries: Vec<PoolEntry<R>>,
    capacity: usize,
    expire_time: Option<Duration>,
    allow_multi_spawn: bool,
    auto_release_interval: Option<Duration>,
    /// Real time accumulated since the last eviction pass.
    auto_release_elapsed: Duration,
    clock: Arc<dyn Clock>,
    references: Arc<ReferencePool>,
}

impl<R: PoolResource> ObjectPool<R> {
    /// Creates an empty pool.
    #[must_use]
    pub fn new(
        settings: ObjectPoolSettings,
        clock: Arc<dyn Clock>,
        references: Arc<ReferencePool>,
    ) -> Self {
        Self {
            entries: Vec::new(),
            capacity: settings.capacity,
            expire_time: settings.expire_time,
            allow_multi_spawn: settings.allow_multi_spawn,
            auto_release_interval: settings.auto_release_interval,
            auto_release_elapsed: Duration::ZERO,
            clock,
            references,
        }
    }

    /// Name of the pooled resource type.
    #[inline]
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        std::any::type_name::<R>()
    }

    /// Registered entries.
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Entries that are idle and unlocked.
    #[must_use]
    pub fn can_release_count(&self) -> usize {
        self.entries.iter().filter(|e| Self::releasable(e)).count()
    }

    /// Soft ceiling on the number of entries.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Changes the capacity and runs an eviction pass immediately.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.release();
    }

    /// Idle time after which an entry may be evicted.
    #[inline]
    #[must_use]
    pub fn expire_time(&self) -> Option<Duration> {
        self.expire_time
    }

    /// Changes the expire time and runs an eviction pass immediately.
    pub fn set_expire_time(&mut self, expire_time: Option<Duration>) {
        self.expire_time = expire_time;
        self.release();
    }

    /// Whether an in-use entry may be spawned again.
    #[inline]
    #[must_use]
    pub fn allow_multi_spawn(&self) -> bool {
        self.allow_multi_spawn
    }

    /// Interval of the periodic eviction pass.
    #[inline]
    #[must_use]
    pub fn auto_release_interval(&self) -> Option<Duration> {
        self.auto_release_interval
    }

    /// Changes the periodic eviction interval. Takes effect on the next tick.
    pub fn set_auto_release_interval(&mut self, interval: Option<Duration>) {
        self.auto_release_interval = interval;
    }

    /// Builds an idle entry, reusing a recycled entry struct when available.
    #[must_use]
    pub fn create_entry(&self, name: &str, resource: R) -> PoolEntry<R> {
        let mut entry = self.references.acquire::<PoolEntry<R>>();
        entry.fill(name, resource, self.clock.now());
        entry
    }

    /// Adds an entry to the pool, then runs an eviction pass.
    ///
    /// With `already_spawned`, the entry starts in use but its spawn hook
    /// is NOT run; the resource is presumed active already.
    ///
    /// # Errors
    ///
    /// - [`PoolError::NullEntry`] if the entry carries no resource
    /// - [`PoolError::DuplicateHandle`] if the handle is already tracked
    pub fn register(
        &mut self,
        mut entry: PoolEntry<R>,
        already_spawned: bool,
    ) -> PoolResult<()> {
        let Some(handle) = entry.handle() else {
            tracing::warn!("empty entry registered into {} pool", self.type_name());
            self.references.release(entry);
            return Err(PoolError::NullEntry {
                type_name: self.type_name(),
            });
        };

        if self.position(handle).is_some() {
            tracing::warn!(
                "duplicate handle {:?} registered into {} pool",
                handle,
                self.type_name()
            );
            entry.discard(&self.references);
            return Err(PoolError::DuplicateHandle(format!("{handle:?}")));
        }

        if already_spawned {
            entry.mark_spawned(self.clock.now());
        }
        self.entries.push(entry);

        self.release();
        Ok(())
    }

    /// Whether [`ObjectPool::spawn`] would find an entry for `name`.
    #[must_use]
    pub fn can_spawn(&self, name: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.name() == name && (self.allow_multi_spawn || !e.in_use()))
    }

    /// Spawns the first entry named `name` that is idle, or any entry named
    /// `name` when multi-spawn is allowed.
    ///
    /// `None` means the caller must create the resource and register it.
    pub fn spawn(&mut self, name: &str) -> Option<&mut PoolEntry<R>> {
        let now = self.clock.now();
        let allow_multi_spawn = self.allow_multi_spawn;

        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.name() == name && (allow_multi_spawn || !e.in_use()))?;

        tracing::trace!("spawn '{}' ({:?})", name, entry.handle());
        Some(entry.spawn(now))
    }

    /// Unspawns the entry owning `handle`, then runs an eviction pass.
    ///
    /// # Errors
    ///
    /// [`PoolError::UnknownHandle`] if the pool does not own `handle`.
    /// Pool state is left untouched.
    ///
    /// # Panics
    ///
    /// Panics if the entry is not in use.
    pub fn unspawn(&mut self, handle: R::Handle) -> PoolResult<()> {
        let now = self.clock.now();
        let Some(index) = self.position(handle) else {
            return Err(self.unknown(handle));
        };

        tracing::trace!("unspawn {:?}", handle);
        self.entries[index].unspawn(now);

        self.release();
        Ok(())
    }

    /// Protects (or unprotects) an entry from eviction.
    ///
    /// # Errors
    ///
    /// [`PoolError::UnknownHandle`] if the pool does not own `handle`.
    pub fn set_locked(&mut self, handle: R::Handle, locked: bool) -> PoolResult<()> {
        let Some(index) = self.position(handle) else {
            return Err(self.unknown(handle));
        };

        self.entries[index].set_locked(locked);
        Ok(())
    }

    /// Looks up the entry owning `handle`.
    #[must_use]
    pub fn entry(&self, handle: R::Handle) -> Option<&PoolEntry<R>> {
        self.entries.iter().find(|e| e.handle() == Some(handle))
    }

    /// Snapshots every entry, in insertion order.
    #[must_use]
    pub fn entry_infos(&self) -> Vec<PoolEntryInfo> {
        self.entries.iter().map(PoolEntry::info).collect()
    }

    /// Snapshot of this pool.
    #[must_use]
    pub fn info(&self) -> ObjectPoolInfo {
        ObjectPoolInfo {
            type_name: self.type_name(),
            count: self.count(),
            can_release_count: self.can_release_count(),
            capacity: self.capacity,
            expire_time: self.expire_time,
            allow_multi_spawn: self.allow_multi_spawn,
            auto_release_interval: self.auto_release_interval,
        }
    }

    /// Capacity-triggered eviction pass.
    ///
    /// Returns the number of entries released.
    pub fn release(&mut self) -> usize {
        let budget = self.entries.len().saturating_sub(self.capacity);
        self.release_count(budget)
    }

    /// Eviction pass with an explicit budget.
    ///
    /// Releases at most `count` idle, unlocked, expired entries, oldest
    /// registration first. Always resets the auto-release accumulator.
    ///
    /// Returns the number of entries released.
    pub fn release_count(&mut self, count: usize) -> usize {
        self.auto_release_elapsed = Duration::ZERO;

        let Some(expire_time) = self.expire_time else {
            return 0;
        };
        if count == 0 {
            return 0;
        }

        let now = self.clock.now();
        let mut budget = count;
        let mut released = 0;
        let mut index = 0;

        while budget > 0 && index < self.entries.len() {
            let entry = &self.entries[index];
            if Self::releasable(entry) && Self::expired(entry, now, expire_time) {
                let entry = self.entries.remove(index);
                entry.release(false, &self.references);
                budget -= 1;
                released += 1;
            } else {
                index += 1;
            }
        }

        if released > 0 {
            tracing::debug!(
                "{} pool released {} expired entries ({} left)",
                self.type_name(),
                released,
                self.entries.len()
            );
        }
        released
    }

    /// Releases one specific entry.
    ///
    /// Returns `Ok(false)` and keeps the entry if it is in use or locked.
    ///
    /// # Errors
    ///
    /// [`PoolError::UnknownHandle`] if the pool does not own `handle`.
    pub fn release_object(&mut self, handle: R::Handle) -> PoolResult<bool> {
        let Some(index) = self.position(handle) else {
            return Err(self.unknown(handle));
        };

        if !Self::releasable(&self.entries[index]) {
            return Ok(false);
        }

        let entry = self.entries.remove(index);
        entry.release(false, &self.references);
        Ok(true)
    }

    /// Releases every idle, unlocked entry regardless of expiry.
    ///
    /// Used for hard resets such as leaving a scene. Returns the number of
    /// entries released.
    pub fn release_all_unused(&mut self) -> usize {
        self.auto_release_elapsed = Duration::ZERO;

        let mut released = 0;
        let mut index = 0;
        while index < self.entries.len() {
            if Self::releasable(&self.entries[index]) {
                let entry = self.entries.remove(index);
                entry.release(false, &self.references);
                released += 1;
            } else {
                index += 1;
            }
        }

        if released > 0 {
            tracing::debug!(
                "{} pool released {} unused entries ({} left)",
                self.type_name(),
                released,
                self.entries.len()
            );
        }
        released
    }

    /// Per-frame tick.
    ///
    /// Accumulates `real_elapsed` and runs a capacity-triggered eviction
    /// pass once the auto-release interval is reached.
    pub fn update(&mut self, _elapsed: Duration, real_elapsed: Duration) {
        self.auto_release_elapsed = self.auto_release_elapsed.saturating_add(real_elapsed);

        if let Some(interval) = self.auto_release_interval {
            if self.auto_release_elapsed >= interval {
                self.release();
            }
        }
    }

    /// Releases every entry, spawned or not.
    pub fn shutdown(&mut self) {
        if self.entries.is_empty() {
            return;
        }

        let count = self.entries.len();
        for entry in self.entries.drain(..) {
            entry.release(true, &self.references);
        }
        tracing::debug!(
            "{} pool shut down ({} entries released)",
            self.type_name(),
            count
        );
    }

    fn position(&self, handle: R::Handle) -> Option<usize> {
        self.entries.iter().position(|e| e.handle() == Some(handle))
    }

    fn unknown(&self, handle: R::Handle) -> PoolError {
        tracing::warn!(
            "handle {:?} is not owned by the {} pool",
            handle,
            self.type_name()
        );
        PoolError::UnknownHandle(format!("{handle:?}"))
    }

    #[inline]
    fn releasable(entry: &PoolEntry<R>) -> bool {
        !entry.in_use() && !entry.is_locked()
    }

    #[inline]
    fn expired(entry: &PoolEntry<R>, now: Instant, expire_time: Duration) -> bool {
        now.saturating_duration_since(entry.last_use_time()) >= expire_time
    }
}

impl<R: PoolResource> Drop for ObjectPool<R> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<R: PoolResource> std::fmt::Debug for ObjectPool<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectPool")
            .field("type_name", &self.type_name())
            .field("count", &self.entries.len())
            .field("capacity", &self.capacity)
            .field("expire_time", &self.expire_time)
            .field("allow_multi_spawn", &self.allow_multi_spawn)
            .finish()
    }
}
