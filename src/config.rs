//! Cache configuration.
//!
//! All tunables consumed by the block, store, and planner live here. Every
//! numeric field must be strictly positive; violations are reported at
//! validation time, never clamped at use time.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const ONE_KB: u64 = 1024;
const ONE_MB: u64 = 1024 * 1024;

const DEFAULT_MAX_MEMORY_BYTES: u64 = u64::MAX;
const DEFAULT_STORE_CAPACITY: usize = 50;
const DEFAULT_BLOCK_SIZE_BYTES: u64 = 8 * ONE_MB;
const DEFAULT_READ_AHEAD_BYTES: u64 = 64 * ONE_KB;
const DEFAULT_MAX_RANGE_SIZE_BYTES: u64 = 8 * ONE_MB;
const DEFAULT_PART_SIZE_BYTES: u64 = 8 * ONE_MB;
const DEFAULT_SEQUENTIAL_PREFETCH_BASE: f64 = 2.0;
const DEFAULT_SEQUENTIAL_PREFETCH_SPEED: f64 = 1.0;

/// Error naming the configuration field that failed validation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("`{field}` must be positive")]
    NotPositive { field: &'static str },
}

/// Validated, immutable cache tunables.
///
/// Memory is bounded by `store_capacity × max_range_size_bytes`, not by a
/// global allocator; `max_memory_bytes` documents the budget the caller
/// planned for and is checked against that product when a manager is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Memory budget for all resident blocks, in bytes.
    #[serde(rename = "aal.maxmemory")]
    pub max_memory_bytes: u64,

    /// Store capacity, in blocks.
    #[serde(rename = "metadatastore.capacity")]
    pub store_capacity: usize,

    /// Default block size, in bytes.
    #[serde(rename = "blocksizebytes")]
    pub block_size_bytes: u64,

    /// Initial prefetch length, in bytes.
    #[serde(rename = "readaheadbytes")]
    pub read_ahead_bytes: u64,

    /// Largest single range fetched from the object store, in bytes.
    #[serde(rename = "maxrangesizebytes")]
    pub max_range_size_bytes: u64,

    /// Part size used when splitting up logical reads, in bytes.
    #[serde(rename = "partsizebytes")]
    pub part_size_bytes: u64,

    /// Base of the sequential prefetch geometric progression. A base of 2.0
    /// doubles the fetch length per contiguous request; a base <= 1.0
    /// freezes growth.
    #[serde(rename = "sequentialprefetch.base")]
    pub sequential_prefetch_base: f64,

    /// Exponent scale controlling how quickly successive steps compound.
    #[serde(rename = "sequentialprefetch.speed")]
    pub sequential_prefetch_speed: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_memory_bytes: DEFAULT_MAX_MEMORY_BYTES,
            store_capacity: DEFAULT_STORE_CAPACITY,
            block_size_bytes: DEFAULT_BLOCK_SIZE_BYTES,
            read_ahead_bytes: DEFAULT_READ_AHEAD_BYTES,
            max_range_size_bytes: DEFAULT_MAX_RANGE_SIZE_BYTES,
            part_size_bytes: DEFAULT_PART_SIZE_BYTES,
            sequential_prefetch_base: DEFAULT_SEQUENTIAL_PREFETCH_BASE,
            sequential_prefetch_speed: DEFAULT_SEQUENTIAL_PREFETCH_SPEED,
        }
    }
}

impl CacheConfig {
    /// Check that every field is strictly positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive_u64(value: u64, field: &'static str) -> Result<(), ConfigError> {
            if value == 0 {
                return Err(ConfigError::NotPositive { field });
            }
            Ok(())
        }

        positive_u64(self.max_memory_bytes, "max_memory_bytes")?;
        if self.store_capacity == 0 {
            return Err(ConfigError::NotPositive {
                field: "store_capacity",
            });
        }
        positive_u64(self.block_size_bytes, "block_size_bytes")?;
        positive_u64(self.read_ahead_bytes, "read_ahead_bytes")?;
        positive_u64(self.max_range_size_bytes, "max_range_size_bytes")?;
        positive_u64(self.part_size_bytes, "part_size_bytes")?;
        if self.sequential_prefetch_base <= 0.0 {
            return Err(ConfigError::NotPositive {
                field: "sequential_prefetch_base",
            });
        }
        if self.sequential_prefetch_speed <= 0.0 {
            return Err(ConfigError::NotPositive {
                field: "sequential_prefetch_speed",
            });
        }
        Ok(())
    }

    /// Load configuration from a JSON file, falling back to defaults when
    /// the file does not exist. Missing fields take their default values;
    /// the result is validated before being returned.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config = if path.exists() {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            serde_json::from_str(&data)
                .with_context(|| format!("parsing config file {}", path.display()))?
        } else {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = CacheConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.store_capacity, 50);
        assert_eq!(config.read_ahead_bytes, 64 * ONE_KB);
        assert_eq!(config.max_range_size_bytes, 8 * ONE_MB);
        assert_eq!(config.sequential_prefetch_base, 2.0);
    }

    #[test]
    fn test_each_field_must_be_positive() {
        let cases: Vec<(CacheConfig, &str)> = vec![
            (
                CacheConfig {
                    max_memory_bytes: 0,
                    ..Default::default()
                },
                "max_memory_bytes",
            ),
            (
                CacheConfig {
                    store_capacity: 0,
                    ..Default::default()
                },
                "store_capacity",
            ),
            (
                CacheConfig {
                    block_size_bytes: 0,
                    ..Default::default()
                },
                "block_size_bytes",
            ),
            (
                CacheConfig {
                    read_ahead_bytes: 0,
                    ..Default::default()
                },
                "read_ahead_bytes",
            ),
            (
                CacheConfig {
                    max_range_size_bytes: 0,
                    ..Default::default()
                },
                "max_range_size_bytes",
            ),
            (
                CacheConfig {
                    part_size_bytes: 0,
                    ..Default::default()
                },
                "part_size_bytes",
            ),
            (
                CacheConfig {
                    sequential_prefetch_base: 0.0,
                    ..Default::default()
                },
                "sequential_prefetch_base",
            ),
            (
                CacheConfig {
                    sequential_prefetch_speed: -1.0,
                    ..Default::default()
                },
                "sequential_prefetch_speed",
            ),
        ];

        for (config, field) in cases {
            assert_eq!(
                config.validate(),
                Err(ConfigError::NotPositive { field }),
                "expected `{field}` to fail validation"
            );
        }
    }

    #[test]
    fn test_load_from_json_uses_wire_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"readaheadbytes": 1024, "sequentialprefetch.base": 3.0}"#,
        )
        .unwrap();

        let config = CacheConfig::load(&path).unwrap();
        assert_eq!(config.read_ahead_bytes, 1024);
        assert_eq!(config.sequential_prefetch_base, 3.0);
        // Unspecified fields keep their defaults.
        assert_eq!(config.store_capacity, 50);
    }

    #[test]
    fn test_load_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CacheConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, CacheConfig::default());
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"metadatastore.capacity": 0}"#).unwrap();

        assert!(CacheConfig::load(&path).is_err());
    }
}
