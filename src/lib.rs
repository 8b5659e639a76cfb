//! range-cache: block cache and prefetch sizing for remote object range reads.
//!
//! Random-access reads against an object store (S3-style range GETs) are slow
//! when issued per byte range. This crate caches fixed-size byte-range blocks
//! in memory and sizes the next prefetched range geometrically when the
//! access pattern is sequential:
//!
//! - [`range`]: the `ByteRange` value type used throughout
//! - [`client`]: the object-store boundary (`ObjectClient`, `PendingFetch`)
//! - [`cache`]: blocks, the FIFO eviction store, the prefetch planner, and
//!   the `BlockManager` read facade
//! - [`config`]: validated tunables shared by the cache components

pub mod cache;
pub mod client;
pub mod config;
pub mod range;

pub use cache::manager::{BlockManager, CacheError};
pub use config::CacheConfig;
pub use range::ByteRange;
