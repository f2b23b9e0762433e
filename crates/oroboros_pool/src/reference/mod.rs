//! # Reference Pool
//!
//! Per-type free lists for short-lived payloads (events, commands, scratch
//! buffers) that would otherwise be allocated and dropped every frame.
//!
//! ## Architecture
//!
//! ```text
//!   Thread 1 ──┐                 ┌──> [ReferenceCollection<HitEvent>]  (own lock)
//!   Thread 2 ──┼──> ReferencePool├──> [ReferenceCollection<MoveCmd>]   (own lock)
//!   Thread N ──┘   (TypeId map)  └──> [ReferenceCollection<PoolEntry>] (own lock)
//! ```
//!
//! The type map is only write-locked when a type is seen for the first time.
//! After that, contention is per type, never global.

mod collection;
mod pool;

pub use collection::{ReferenceCollection, ReferenceCollectionInfo};
pub use pool::ReferencePool;

/// A value that can be recycled through the reference pool.
///
/// `clear` must put the value back into a state indistinguishable from
/// `Default::default()` as far as callers are concerned. The default
/// implementation simply overwrites the value. Override it to keep heap
/// capacity around, which is the whole point of pooling a `Vec`-backed type.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Default)]
/// struct DamageEvent {
///     target: u32,
///     amount: u32,
///     tags: Vec<u8>,
/// }
///
/// impl Reference for DamageEvent {
///     fn clear(&mut self) {
///         self.target = 0;
///         self.amount = 0;
///         self.tags.clear(); // keep the allocation
///     }
/// }
/// ```
pub trait Reference: Default + Send + 'static {
    /// Resets the value to its clean default state.
    fn clear(&mut self) {
        *self = Self::default();
    }
}
