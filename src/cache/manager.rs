//! Read facade over the block store, planner, and object client.
//!
//! One manager serves one logical stream over one remote object. It is the
//! single writer for its store: a read at a position not covered by a
//! resident block plans a prefetch range, fetches and fills a new block, and
//! admits it (evicting FIFO once the store is full).

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::cache::block::{Block, BlockError};
use crate::cache::planner::{PlannerState, PrefetchPlanner};
use crate::cache::store::{BlockStore, StoreError};
use crate::client::{ClientError, ObjectClient};
use crate::config::{CacheConfig, ConfigError};

/// Errors surfaced by the read facade.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("position {pos} is beyond the object end (size {size})")]
    PositionOutOfRange { pos: u64, size: u64 },

    #[error(transparent)]
    Block(#[from] BlockError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Hit/miss counters for one manager.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Reads served from a resident block.
    pub hits: u64,
    /// Reads that triggered a fetch.
    pub misses: u64,
}

/// Seekable random-access reads over one remote object, backed by the block
/// cache.
pub struct BlockManager {
    client: Arc<dyn ObjectClient>,
    store: BlockStore,
    planner: PrefetchPlanner,
    planner_state: PlannerState,
    object_size: u64,
    stats: CacheStats,
}

impl BlockManager {
    /// Build a manager for an object of known size.
    ///
    /// Validates the configuration eagerly; a zero or negative tunable fails
    /// here, never at read time.
    pub fn new(
        client: Arc<dyn ObjectClient>,
        object_size: u64,
        config: &CacheConfig,
    ) -> Result<Self, CacheError> {
        config.validate()?;

        let worst_case = (config.store_capacity as u64).saturating_mul(config.max_range_size_bytes);
        if worst_case > config.max_memory_bytes {
            warn!(
                store_capacity = config.store_capacity,
                max_range_size_bytes = config.max_range_size_bytes,
                max_memory_bytes = config.max_memory_bytes,
                "worst-case resident block memory exceeds the configured budget"
            );
        }

        Ok(Self {
            client,
            store: BlockStore::new(config.store_capacity)?,
            planner: PrefetchPlanner::new(config),
            planner_state: PlannerState::default(),
            object_size,
            stats: CacheStats::default(),
        })
    }

    /// Build a manager, resolving the object size from the client.
    pub async fn open(
        client: Arc<dyn ObjectClient>,
        config: &CacheConfig,
    ) -> Result<Self, CacheError> {
        let object_size = client.object_size().await?;
        Self::new(client, object_size, config)
    }

    /// Total size of the object being read, in bytes.
    pub fn object_size(&self) -> u64 {
        self.object_size
    }

    /// Hit/miss counters.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Number of blocks evicted so far.
    pub fn evictions(&self) -> u64 {
        self.store.evictions()
    }

    /// Read the byte at object position `pos`.
    ///
    /// Served from a resident block when possible; otherwise plans a
    /// prefetch range, fetches and fills a block, and admits it. A failed
    /// fetch surfaces from this call and leaves already-resident blocks
    /// usable.
    pub async fn read_byte_at(&mut self, pos: u64) -> Result<u8, CacheError> {
        if pos >= self.object_size {
            return Err(CacheError::PositionOutOfRange {
                pos,
                size: self.object_size,
            });
        }

        if let Some(block) = self.store.find(pos) {
            trace!(pos, range = %block.range(), "cache hit");
            self.stats.hits += 1;
            return Ok(block.read_byte_at(pos)?);
        }

        self.stats.misses += 1;
        let block = self.fetch_block(pos).await?;
        let byte = block.read_byte_at(pos)?;
        self.store.add(block);
        Ok(byte)
    }

    /// Read bytes starting at `pos` into `buf`, up to the end of the
    /// covering block. Returns the number of bytes read (at least 1 for a
    /// non-empty `buf` and in-range `pos`).
    pub async fn read_from(&mut self, pos: u64, buf: &mut [u8]) -> Result<usize, CacheError> {
        if pos >= self.object_size {
            return Err(CacheError::PositionOutOfRange {
                pos,
                size: self.object_size,
            });
        }
        if buf.is_empty() {
            return Ok(0);
        }

        if let Some(block) = self.store.find(pos) {
            trace!(pos, range = %block.range(), "cache hit");
            self.stats.hits += 1;
            return Ok(block.read_from(pos, buf)?);
        }

        self.stats.misses += 1;
        let block = self.fetch_block(pos).await?;
        let n = block.read_from(pos, buf)?;
        self.store.add(block);
        Ok(n)
    }

    /// Tear down the cache, closing every resident block.
    pub fn close(&mut self) {
        self.store.close();
    }

    async fn fetch_block(&mut self, pos: u64) -> Result<Block, CacheError> {
        let range = self
            .planner
            .plan(&mut self.planner_state, pos, self.object_size);
        debug!(pos, range = %range, length = range.size(), "fetching block");

        let fetch = self.client.fetch_range(range);
        let mut block = Block::new(range, fetch)?;
        block.fill().await?;
        Ok(block)
    }
}

impl std::fmt::Debug for BlockManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockManager")
            .field("object_size", &self.object_size)
            .field("resident", &self.store.len())
            .field("capacity", &self.store.capacity())
            .field("stats", &self.stats)
            .finish()
    }
}
