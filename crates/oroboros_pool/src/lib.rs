//! # OROBOROS Pool
//!
//! Two-tier object reuse for the game loop:
//! - **Reference pool** - thread-safe per-type free lists for transient
//!   payloads (events, commands)
//! - **Object pool** - named, identity-bearing resources with spawn
//!   tracking, capacity limits and time-based eviction
//!
//! ## Architecture Rules
//!
//! 1. **No allocation churn in hot path** - values are recycled, not dropped
//! 2. **Per-type contention** - reference collections never share a lock
//! 3. **Eviction between ticks** - pools only shrink on explicit calls or
//!    on the periodic tick from the game loop
//! 4. **No globals** - registries are context objects with explicit teardown
//!
//! ## Example
//!
//! ```rust,ignore
//! use oroboros_pool::{ObjectPoolManager, ReferencePool};
//!
//! let references = Arc::new(ReferencePool::new());
//! let mut pools = ObjectPoolManager::with_system_clock(Arc::clone(&references));
//! pools.create::<Projectile>(256, Some(Duration::from_secs(30)), false)?;
//!
//! // Game loop
//! loop {
//!     let mut hit = references.acquire::<HitEvent>();
//!     // ...
//!     references.release(hit);
//!
//!     pools.update(frame_time, real_frame_time);
//! }
//!
//! pools.shutdown();
//! references.clear_all();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod clock;
pub mod config;
pub mod error;
pub mod object;
pub mod reference;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ObjectPoolConfig, ObjectPoolSettings, PoolingConfig};
pub use error::{PoolError, PoolResult};
pub use object::{
    ObjectPool, ObjectPoolInfo, ObjectPoolManager, PoolEntry, PoolEntryInfo, PoolResource,
};
pub use reference::{Reference, ReferenceCollection, ReferenceCollectionInfo, ReferencePool};
