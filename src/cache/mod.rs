//! Block cache and prefetch sizing.
//!
//! This module contains the core cache data structures and algorithms:
//! - [`block`]: one fetched byte range backed by an in-memory buffer
//! - [`store`]: fixed-capacity FIFO eviction store for resident blocks
//! - [`planner`]: geometric growth policy for sequential prefetch sizing
//! - [`manager`]: the read facade tying store, planner, and client together

pub mod block;
pub mod manager;
pub mod planner;
pub mod store;
