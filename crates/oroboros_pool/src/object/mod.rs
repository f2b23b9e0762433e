//! # Object Pool
//!
//! Recycling for heavier, identity-bearing resources: spawned scene
//! instances, audio voices, UI panels. Each wraps an external handle that
//! is expensive to create and destroy.
//!
//! ## Design Philosophy
//!
//! - Spawn/unspawn is bookkeeping only - the resource stays alive
//! - Eviction happens between ticks, never in the middle of a frame
//! - An entry in use is never evicted
//! - Released entry structs are themselves recycled through the
//!   [`ReferencePool`](crate::reference::ReferencePool)

mod entry;
mod manager;
mod pool;

pub use entry::{PoolEntry, PoolEntryInfo, PoolResource};
pub use manager::ObjectPoolManager;
pub use pool::{ObjectPool, ObjectPoolInfo};
