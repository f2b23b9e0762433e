//! # Pool Configuration
//!
//! Object pool settings, optionally loaded from TOML at startup.
//!
//! ```toml
//! [pools.projectile]
//! capacity = 256
//! expire_secs = 30.0
//! allow_multi_spawn = false
//!
//! [pools.ui_panel]
//! capacity = 16
//! # no expire_secs: panels are never trimmed automatically
//! ```
//!
//! The file format is signed on purpose: a designer typing `capacity = -1`
//! gets a clear error instead of a wrapped integer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::error::{PoolError, PoolResult};

/// Validated settings for one object pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObjectPoolSettings {
    /// Soft ceiling on the number of entries.
    pub capacity: usize,
    /// Idle time after which an entry may be evicted. `None` = never.
    pub expire_time: Option<Duration>,
    /// Whether an in-use entry may be spawned again.
    pub allow_multi_spawn: bool,
    /// Interval of the periodic eviction pass. `None` = never.
    pub auto_release_interval: Option<Duration>,
}

impl ObjectPoolSettings {
    /// Creates settings whose auto-release interval equals the expire time.
    #[must_use]
    pub const fn new(
        capacity: usize,
        expire_time: Option<Duration>,
        allow_multi_spawn: bool,
    ) -> Self {
        Self {
            capacity,
            expire_time,
            allow_multi_spawn,
            auto_release_interval: expire_time,
        }
    }

    /// Overrides the auto-release interval.
    #[must_use]
    pub const fn with_auto_release_interval(self, interval: Option<Duration>) -> Self {
        Self {
            auto_release_interval: interval,
            ..self
        }
    }
}

impl Default for ObjectPoolSettings {
    /// Unbounded capacity, no expiry, single spawn.
    fn default() -> Self {
        Self::new(usize::MAX, None, false)
    }
}

/// Raw, unvalidated pool settings as written in a config file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ObjectPoolConfig {
    /// Soft ceiling. Missing = unbounded.
    pub capacity: Option<i64>,
    /// Expire time in seconds. Missing or `inf` = never.
    pub expire_secs: Option<f64>,
    /// Whether an in-use entry may be spawned again.
    pub allow_multi_spawn: bool,
    /// Auto-release interval in seconds. Missing = same as `expire_secs`.
    pub auto_release_interval_secs: Option<f64>,
}

impl ObjectPoolConfig {
    /// Validates the raw values.
    ///
    /// # Errors
    ///
    /// [`PoolError::InvalidConfig`] for negative capacity, or negative /
    /// NaN durations.
    pub fn settings(&self) -> PoolResult<ObjectPoolSettings> {
        let capacity = match self.capacity {
            None => usize::MAX,
            Some(raw) => usize::try_from(raw).map_err(|_| {
                PoolError::InvalidConfig(format!("capacity must not be negative, got {raw}"))
            })?,
        };

        let expire_time = match self.expire_secs {
            None => None,
            Some(secs) => seconds("expire_secs", secs)?,
        };

        let auto_release_interval = match self.auto_release_interval_secs {
            None => expire_time,
            Some(secs) => seconds("auto_release_interval_secs", secs)?,
        };

        Ok(ObjectPoolSettings {
            capacity,
            expire_time,
            allow_multi_spawn: self.allow_multi_spawn,
            auto_release_interval,
        })
    }
}

/// Converts a seconds value, mapping positive infinity to "never".
fn seconds(field: &str, secs: f64) -> PoolResult<Option<Duration>> {
    if secs.is_infinite() && secs.is_sign_positive() {
        return Ok(None);
    }

    Duration::try_from_secs_f64(secs)
        .map(Some)
        .map_err(|e| PoolError::InvalidConfig(format!("{field} = {secs}: {e}")))
}

/// A table of named pool configs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolingConfig {
    /// Pool configs keyed by pool name.
    pub pools: BTreeMap<String, ObjectPoolConfig>,
}

impl PoolingConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`PoolError::InvalidConfig`] if the document does not parse or any
    /// pool has invalid values.
    pub fn from_toml_str(source: &str) -> PoolResult<Self> {
        let config: Self = toml::from_str(source)
            .map_err(|e| PoolError::InvalidConfig(format!("failed to parse pool config: {e}")))?;

        for (name, pool) in &config.pools {
            pool.settings().map_err(|e| match e {
                PoolError::InvalidConfig(msg) => {
                    PoolError::InvalidConfig(format!("pool '{name}': {msg}"))
                }
                other => other,
            })?;
        }
        Ok(config)
    }

    /// Reads and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`PoolError::InvalidConfig`] if the file cannot be read or is invalid.
    pub fn load(path: impl AsRef<Path>) -> PoolResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            PoolError::InvalidConfig(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&source)
    }

    /// Looks up a pool by name.
    #[must_use]
    pub fn pool(&self, name: &str) -> Option<&ObjectPoolConfig> {
        self.pools.get(name)
    }
}
