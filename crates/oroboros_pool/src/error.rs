//! # Pool Error Types
//!
//! All errors that can occur in the pooling system.
//!
//! Reference pool operations never fail. Object pool misuse is reported
//! here so bugs in calling code show up in testing instead of vanishing
//! into silent no-ops. "Not found" is NOT an error - `spawn` and `get`
//! return `Option`.

use thiserror::Error;

/// Errors that can occur in the pooling system.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// A pool for this resource type already exists.
    #[error("object pool already exists for {type_name}")]
    DuplicatePool {
        /// Resource type of the rejected pool.
        type_name: &'static str,
    },

    /// Tried to register an entry that carries no resource.
    #[error("cannot register an empty entry into the {type_name} pool")]
    NullEntry {
        /// Resource type of the pool.
        type_name: &'static str,
    },

    /// Tried to register a handle the pool already tracks.
    #[error("handle already registered: {0}")]
    DuplicateHandle(String),

    /// The pool does not own this handle.
    #[error("handle not owned by this pool: {0}")]
    UnknownHandle(String),

    /// Invalid configuration (negative capacity, negative expiry, bad TOML).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;
