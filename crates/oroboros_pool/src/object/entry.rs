//! # Pool Entry
//!
//! One tracked instance of a named, identity-bearing resource.
//!
//! ```text
//!            spawn()                    spawn()  (multi-spawn only)
//!   ┌──────┐ ───────> ┌───────────────┐ ───────┐
//!   │ Idle │          │ InUse (n ≥ 1) │ <──────┘
//!   └──────┘ <─────── └───────────────┘
//!      │     unspawn() (n == 1)
//!      │ release()
//!      ▼
//!   on_release(resource) + entry struct back to the ReferencePool
//! ```

use std::fmt::Debug;
use std::hash::Hash;
use std::time::Instant;

use crate::reference::{Reference, ReferencePool};

/// Capability every object-pooled resource provides.
///
/// The resource owns its external handle (a spawned visual instance, an
/// audio voice, a network proxy). The pool only tracks usage and decides
/// when to let it go.
///
/// # Example
///
/// ```rust,ignore
/// struct Projectile {
///     instance: InstanceId,
///     scene: Arc<SceneManager>,
/// }
///
/// impl PoolResource for Projectile {
///     type Handle = InstanceId;
///
///     fn handle(&self) -> InstanceId { self.instance }
///     fn on_spawn(&mut self) { self.scene.set_visible(self.instance, true); }
///     fn on_unspawn(&mut self) { self.scene.set_visible(self.instance, false); }
///     fn on_release(self, _is_shutdown: bool) { self.scene.destroy(self.instance); }
/// }
/// ```
pub trait PoolResource: Send + 'static {
    /// Identity of the external resource. Used to find the entry on unspawn.
    type Handle: Copy + Eq + Hash + Debug + Send + 'static;

    /// Returns the identity of the wrapped external resource.
    fn handle(&self) -> Self::Handle;

    /// Called every time the entry is spawned.
    fn on_spawn(&mut self) {}

    /// Called every time the entry is unspawned, before the count drops.
    fn on_unspawn(&mut self) {}

    /// Disposes the external resource. Called exactly once per resource.
    ///
    /// `is_shutdown` is true when the owning pool is being torn down.
    fn on_release(self, is_shutdown: bool);
}

/// A named resource plus its usage bookkeeping.
///
/// Entries are themselves [`Reference`]s: once released, the blank struct
/// goes back to the [`ReferencePool`] so the name buffer is reused by the
/// next registration.
pub struct PoolEntry<R: PoolResource> {
    /// Logical name used for spawn lookup. Not unique.
    name: String,
    /// The wrapped resource. `None` only for a blank entry.
    resource: Option<R>,
    /// Last spawn or unspawn.
    last_use_time: Instant,
    /// Outstanding spawns. In use while non-zero.
    spawn_count: u32,
    /// Locked entries are never evicted.
    locked: bool,
}

impl<R: PoolResource> PoolEntry<R> {
    /// Creates an idle entry wrapping `resource`.
    #[must_use]
    pub fn new(name: impl Into<String>, resource: R, now: Instant) -> Self {
        Self {
            name: name.into(),
            resource: Some(resource),
            last_use_time: now,
            spawn_count: 0,
            locked: false,
        }
    }

    /// Fills a blank (recycled) entry.
    pub(crate) fn fill(&mut self, name: &str, resource: R, now: Instant) {
        self.name.clear();
        self.name.push_str(name);
        self.resource = Some(resource);
        self.last_use_time = now;
        self.spawn_count = 0;
        self.locked = false;
    }

    /// Logical name of this entry.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The wrapped resource, if any.
    #[inline]
    #[must_use]
    pub fn resource(&self) -> Option<&R> {
        self.resource.as_ref()
    }

    /// Mutable access to the wrapped resource, if any.
    #[inline]
    pub fn resource_mut(&mut self) -> Option<&mut R> {
        self.resource.as_mut()
    }

    /// Identity of the wrapped resource, if any.
    #[inline]
    #[must_use]
    pub fn handle(&self) -> Option<R::Handle> {
        self.resource.as_ref().map(PoolResource::handle)
    }

    /// Time of the last spawn or unspawn.
    #[inline]
    #[must_use]
    pub fn last_use_time(&self) -> Instant {
        self.last_use_time
    }

    /// Outstanding spawns.
    #[inline]
    #[must_use]
    pub fn spawn_count(&self) -> u32 {
        self.spawn_count
    }

    /// Whether at least one spawn is outstanding.
    #[inline]
    #[must_use]
    pub fn in_use(&self) -> bool {
        self.spawn_count > 0
    }

    /// Whether the entry is protected from eviction.
    #[inline]
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub(crate) fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Marks a resource that was already active when it was registered.
    ///
    /// Does NOT run the spawn hook.
    pub(crate) fn mark_spawned(&mut self, now: Instant) {
        self.spawn_count += 1;
        self.last_use_time = now;
    }

    /// Idle/InUse → InUse. Runs the spawn hook.
    pub fn spawn(&mut self, now: Instant) -> &mut Self {
        self.spawn_count += 1;
        self.last_use_time = now;
        if let Some(resource) = self.resource.as_mut() {
            resource.on_spawn();
        }
        self
    }

    /// InUse → InUse/Idle. Runs the unspawn hook before the count drops.
    ///
    /// # Panics
    ///
    /// Panics if the entry is not in use. Unbalanced unspawns are a logic
    /// error in the caller and must not underflow silently.
    pub fn unspawn(&mut self, now: Instant) {
        assert!(
            self.spawn_count > 0,
            "unspawn of '{}' with spawn count 0",
            self.name
        );

        if let Some(resource) = self.resource.as_mut() {
            resource.on_unspawn();
        }
        self.last_use_time = now;
        self.spawn_count -= 1;
    }

    /// Disposes the resource and returns the blank entry to `references`.
    ///
    /// Only valid for idle entries, except during shutdown.
    ///
    /// # Panics
    ///
    /// Panics if the entry is in use and `is_shutdown` is false.
    pub fn release(mut self, is_shutdown: bool, references: &ReferencePool) {
        assert!(
            is_shutdown || !self.in_use(),
            "release of '{}' while spawned",
            self.name
        );

        if let Some(resource) = self.resource.take() {
            resource.on_release(is_shutdown);
        }
        references.release(self);
    }

    /// Drops the resource without its release hook and returns the blank
    /// entry to `references`.
    pub(crate) fn discard(mut self, references: &ReferencePool) {
        self.resource = None;
        references.release(self);
    }

    /// Snapshot of this entry for debug overlays.
    #[must_use]
    pub fn info(&self) -> PoolEntryInfo {
        PoolEntryInfo {
            name: self.name.clone(),
            locked: self.locked,
            in_use: self.in_use(),
            spawn_count: self.spawn_count,
            last_use_time: self.last_use_time,
        }
    }
}

impl<R: PoolResource> Default for PoolEntry<R> {
    fn default() -> Self {
        Self {
            name: String::new(),
            resource: None,
            last_use_time: Instant::now(),
            spawn_count: 0,
            locked: false,
        }
    }
}

impl<R: PoolResource> Reference for PoolEntry<R> {
    fn clear(&mut self) {
        self.name.clear();
        self.resource = None;
        self.spawn_count = 0;
        self.locked = false;
    }
}

impl<R: PoolResource> Debug for PoolEntry<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolEntry")
            .field("name", &self.name)
            .field("handle", &self.handle())
            .field("spawn_count", &self.spawn_count)
            .field("locked", &self.locked)
            .finish()
    }
}

/// Snapshot of a single entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolEntryInfo {
    /// Logical name.
    pub name: String,
    /// Protected from eviction.
    pub locked: bool,
    /// At least one spawn outstanding.
    pub in_use: bool,
    /// Outstanding spawns.
    pub spawn_count: u32,
    /// Last spawn or unspawn.
    pub last_use_time: Instant,
}
