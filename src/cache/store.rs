//! Fixed-capacity FIFO block store.
//!
//! Resident blocks are evicted strictly in insertion order, not by recency
//! of access. That keeps the memory bound predictable for sequential and
//! semi-sequential prefetching workloads, where the oldest block is also the
//! least likely to be read again.
//!
//! The store performs no internal locking: all methods take `&mut self`, so
//! callers serialize access per logical stream by construction.

use thiserror::Error;
use tracing::debug;

use crate::cache::block::Block;

/// Errors surfaced by store construction.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    #[error("block store capacity must be positive")]
    InvalidCapacity,
}

/// A bounded, insertion-ordered collection of resident blocks.
///
/// Holds at most `capacity` blocks. Once full, each `add` closes the block
/// in the oldest slot and reuses that slot, cycling through slots in
/// insertion order.
#[derive(Debug)]
pub struct BlockStore {
    slots: Vec<Block>,
    capacity: usize,
    oldest: usize,
    evictions: u64,
}

impl BlockStore {
    /// Create a store holding at most `capacity` blocks.
    pub fn new(capacity: usize) -> Result<Self, StoreError> {
        if capacity == 0 {
            return Err(StoreError::InvalidCapacity);
        }
        Ok(Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            oldest: 0,
            evictions: 0,
        })
    }

    /// Admit a block, evicting and closing the oldest resident block when
    /// the store is full.
    pub fn add(&mut self, block: Block) {
        if self.slots.len() < self.capacity {
            self.slots.push(block);
        } else {
            let evicted = &mut self.slots[self.oldest];
            debug!(
                evicted = %evicted.range(),
                admitted = %block.range(),
                "evicting oldest block"
            );
            evicted.close();
            self.slots[self.oldest] = block;
            self.oldest = (self.oldest + 1) % self.capacity;
            self.evictions += 1;
        }
    }

    /// Find the resident block covering object position `pos`.
    pub fn find(&self, pos: u64) -> Option<&Block> {
        self.slots.iter().find(|block| block.contains(pos))
    }

    /// Iterate over the currently resident blocks.
    ///
    /// The borrow pins the store for the iterator's lifetime, so the
    /// snapshot cannot observe concurrent mutation.
    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.slots.iter()
    }

    /// Number of resident blocks.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the store holds no blocks.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Maximum number of resident blocks.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of blocks evicted over the store's lifetime.
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Close every resident block and empty the store.
    pub fn close(&mut self) {
        for block in &mut self.slots {
            block.close();
        }
        self.slots.clear();
        self.oldest = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::block::BlockState;
    use crate::client::{ObjectContent, PendingFetch};
    use crate::range::ByteRange;
    use std::io::Cursor;

    async fn filled_block(start: u64, end: u64) -> Block {
        let range = ByteRange::new(start, end).unwrap();
        let data = vec![0u8; range.size() as usize];
        let fetch: PendingFetch = Box::pin(async move { Ok(ObjectContent::new(Cursor::new(data))) });
        let mut block = Block::new(range, fetch).unwrap();
        block.fill().await.unwrap();
        block
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(BlockStore::new(0).unwrap_err(), StoreError::InvalidCapacity);
    }

    #[tokio::test]
    async fn test_add_below_capacity_appends() {
        let mut store = BlockStore::new(3).unwrap();
        store.add(filled_block(0, 9).await);
        store.add(filled_block(10, 19).await);

        assert_eq!(store.len(), 2);
        assert_eq!(store.evictions(), 0);
        assert!(store.find(5).is_some());
        assert!(store.find(15).is_some());
        assert!(store.find(25).is_none());
    }

    #[tokio::test]
    async fn test_eviction_is_fifo() {
        let mut store = BlockStore::new(2).unwrap();
        store.add(filled_block(0, 9).await);
        store.add(filled_block(10, 19).await);
        store.add(filled_block(20, 29).await);

        // Oldest ([0,9]) evicted; [10,19] and [20,29] resident.
        assert_eq!(store.len(), 2);
        assert_eq!(store.evictions(), 1);
        assert!(store.find(5).is_none());
        assert!(store.find(15).is_some());
        assert!(store.find(25).is_some());
    }

    #[tokio::test]
    async fn test_eviction_cursor_wraps() {
        let mut store = BlockStore::new(2).unwrap();
        for i in 0..5u64 {
            store.add(filled_block(i * 10, i * 10 + 9).await);
        }

        // After 5 adds into capacity 2, the last 2 remain.
        assert_eq!(store.len(), 2);
        assert_eq!(store.evictions(), 3);
        assert!(store.find(35).is_some());
        assert!(store.find(45).is_some());
        assert!(store.find(25).is_none());
    }

    #[tokio::test]
    async fn test_close_closes_every_block() {
        let mut store = BlockStore::new(4).unwrap();
        store.add(filled_block(0, 9).await);
        store.add(filled_block(10, 19).await);

        store.close();
        assert!(store.is_empty());
        assert!(store.find(5).is_none());
    }

    #[tokio::test]
    async fn test_evicting_unfilled_block_does_not_block() {
        let mut store = BlockStore::new(1).unwrap();

        // A block whose fetch never resolves; eviction must still complete.
        let range = ByteRange::new(0, 9).unwrap();
        let fetch: PendingFetch = Box::pin(futures::future::pending());
        store.add(Block::new(range, fetch).unwrap());

        store.add(filled_block(10, 19).await);
        assert_eq!(store.len(), 1);
        assert_eq!(store.evictions(), 1);
        assert_eq!(store.find(15).unwrap().state(), BlockState::Filled);
    }

    #[tokio::test]
    async fn test_snapshot_iteration_is_restartable() {
        let mut store = BlockStore::new(3).unwrap();
        store.add(filled_block(0, 9).await);
        store.add(filled_block(10, 19).await);

        let first: Vec<_> = store.iter().map(|b| b.range()).collect();
        let second: Vec<_> = store.iter().map(|b| b.range()).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }
}
