//! Cached byte-range blocks.
//!
//! A block owns one fixed-size buffer for one [`ByteRange`] of the remote
//! object. It is created bound to a pending fetch and is not readable until
//! [`Block::fill`] has drained the fetched stream into the buffer. Blocks are
//! the unit of residency in the store — they are admitted, evicted, and
//! closed as whole units.

use bytes::BytesMut;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::client::{ClientError, PendingFetch};
use crate::range::ByteRange;

/// Chunk size used when draining the fetched stream into the buffer.
const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Lifecycle state of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    /// Created, fetch not yet drained. Not readable.
    Filling,
    /// Buffer holds all `range.size()` bytes. Readable.
    Filled,
    /// The fetch or the drain failed. Never readable.
    Failed,
    /// Torn down; buffer released, any in-flight fetch aborted.
    Closed,
}

/// Errors surfaced by block construction, filling, and reads.
#[derive(Error, Debug)]
pub enum BlockError {
    #[error("block of {requested} bytes exceeds addressable memory")]
    Capacity { requested: u64 },

    #[error("unexpected end of stream: {missing} bytes missing")]
    Truncated { missing: u64 },

    #[error("position {pos} is outside block range {range}")]
    OutOfRange { pos: u64, range: ByteRange },

    #[error("block is not readable in state {state:?}")]
    NotReadable { state: BlockState },

    #[error("fetch failed: {0}")]
    Fetch(#[from] ClientError),

    #[error("I/O error while filling block: {0}")]
    Io(#[from] std::io::Error),
}

/// One cached byte range and its backing buffer.
///
/// The buffer is allocated once at construction, sized exactly to the range,
/// and never resized. Filling happens exactly once via [`Block::fill`];
/// a zero-progress read before the buffer is full is treated as end-of-data
/// and reported as [`BlockError::Truncated`], so a partially filled block is
/// never served as complete.
pub struct Block {
    range: ByteRange,
    buffer: BytesMut,
    fetch: Option<PendingFetch>,
    state: BlockState,
}

impl Block {
    /// Create a block bound to a pending fetch for `range`.
    ///
    /// Allocates the backing buffer up front. Fails with
    /// [`BlockError::Capacity`] when the range is larger than this process
    /// can buffer; callers bound range sizes via `max_range_size_bytes`.
    pub fn new(range: ByteRange, fetch: PendingFetch) -> Result<Self, BlockError> {
        let size = usize::try_from(range.size()).map_err(|_| BlockError::Capacity {
            requested: range.size(),
        })?;

        Ok(Self {
            range,
            buffer: BytesMut::with_capacity(size),
            fetch: Some(fetch),
            state: BlockState::Filling,
        })
    }

    /// The byte range this block covers.
    pub fn range(&self) -> ByteRange {
        self.range
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BlockState {
        self.state
    }

    /// Whether `pos` falls inside this block's range.
    pub fn contains(&self, pos: u64) -> bool {
        self.range.contains(pos)
    }

    /// Resolve the fetch and drain its stream into the buffer.
    ///
    /// Suspends until the fetch resolves and exactly `range.size()` bytes
    /// have been copied. The stream is released as soon as draining finishes,
    /// success or failure. Calling `fill` on an already filled block is a
    /// no-op; a failed or closed block cannot be refilled.
    pub async fn fill(&mut self) -> Result<(), BlockError> {
        match self.state {
            BlockState::Filled => return Ok(()),
            BlockState::Failed | BlockState::Closed => {
                return Err(BlockError::NotReadable { state: self.state })
            }
            BlockState::Filling => {}
        }

        let fetch = match self.fetch.take() {
            Some(fetch) => fetch,
            None => return Err(BlockError::NotReadable { state: self.state }),
        };

        let content = match fetch.await {
            Ok(content) => content,
            Err(err) => {
                self.state = BlockState::Failed;
                return Err(BlockError::Fetch(err));
            }
        };

        let mut stream = content.into_stream();
        let mut chunk = vec![0u8; READ_CHUNK_SIZE];
        // The allocator may round the buffer's capacity up; the fill target
        // is the range size, exactly.
        let total = self.range.size() as usize;

        while self.buffer.len() < total {
            let remaining = total - self.buffer.len();
            let want = remaining.min(READ_CHUNK_SIZE);

            let n = match stream.read(&mut chunk[..want]).await {
                Ok(n) => n,
                Err(err) => {
                    self.state = BlockState::Failed;
                    return Err(BlockError::Io(err));
                }
            };

            // A zero-byte read before the buffer is full means the stream
            // ended early; a half-filled block is unsafe to serve reads from.
            if n == 0 {
                self.state = BlockState::Failed;
                return Err(BlockError::Truncated {
                    missing: remaining as u64,
                });
            }

            self.buffer.extend_from_slice(&chunk[..n]);
        }

        self.state = BlockState::Filled;
        Ok(())
    }

    /// Read the byte at object position `pos`.
    ///
    /// `pos` must fall within this block's range, and the block must be
    /// filled.
    pub fn read_byte_at(&self, pos: u64) -> Result<u8, BlockError> {
        if !self.range.contains(pos) {
            return Err(BlockError::OutOfRange {
                pos,
                range: self.range,
            });
        }
        if self.state != BlockState::Filled {
            return Err(BlockError::NotReadable { state: self.state });
        }
        Ok(self.buffer[(pos - self.range.start()) as usize])
    }

    /// Copy bytes starting at object position `pos` into `dst`.
    ///
    /// Copies at most up to this block's end; returns the number of bytes
    /// copied (at least 1 for an in-range `pos` and non-empty `dst`).
    pub fn read_from(&self, pos: u64, dst: &mut [u8]) -> Result<usize, BlockError> {
        if !self.range.contains(pos) {
            return Err(BlockError::OutOfRange {
                pos,
                range: self.range,
            });
        }
        if self.state != BlockState::Filled {
            return Err(BlockError::NotReadable { state: self.state });
        }

        let offset = (pos - self.range.start()) as usize;
        let available = self.buffer.len() - offset;
        let n = dst.len().min(available);
        dst[..n].copy_from_slice(&self.buffer[offset..offset + n]);
        Ok(n)
    }

    /// Tear the block down: abort any in-flight fetch and release the buffer.
    ///
    /// Idempotent. Dropping the pending fetch handle cancels the underlying
    /// request, so closing an unfilled block does not wait out the network
    /// operation.
    pub fn close(&mut self) {
        if self.state == BlockState::Closed {
            return;
        }
        if self.fetch.take().is_some() {
            debug!(range = %self.range, "aborted in-flight fetch while closing block");
        }
        self.buffer = BytesMut::new();
        self.state = BlockState::Closed;
    }
}

impl std::fmt::Debug for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Block")
            .field("range", &self.range)
            .field("state", &self.state)
            .field("buffered", &self.buffer.len())
            .finish()
    }
}
