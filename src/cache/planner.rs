//! Prefetch sizing: geometric growth for sequential access.
//!
//! The planner turns "the reader now needs byte `pos`" into the byte range
//! to request from the object store. Contiguous requests grow the fetch
//! length geometrically, modelling accelerating read-ahead for genuinely
//! sequential scans; any non-contiguous jump resets the length to the
//! configured read-ahead.
//!
//! Growth state lives in an explicit [`PlannerState`] owned by the caller,
//! one per logical stream, so independent streams sharing a planner never
//! cross-talk.

use crate::config::CacheConfig;
use crate::range::ByteRange;

/// Per-stream prefetch growth state.
#[derive(Debug, Clone, Default)]
pub struct PlannerState {
    /// Last byte offset delivered to this stream, if any.
    last_range_end: Option<u64>,
    /// Length of the most recently planned range.
    current_length: u64,
    /// Number of consecutive contiguous requests since the last reset.
    sequential_steps: u32,
}

impl PlannerState {
    /// Length of the most recently planned range, 0 before the first plan.
    pub fn current_length(&self) -> u64 {
        self.current_length
    }

    /// Consecutive contiguous requests since the last reset.
    pub fn sequential_steps(&self) -> u32 {
        self.sequential_steps
    }
}

/// Computes the size of the next prefetched range.
#[derive(Debug, Clone)]
pub struct PrefetchPlanner {
    read_ahead_bytes: u64,
    max_range_size_bytes: u64,
    base: f64,
    speed: f64,
}

impl PrefetchPlanner {
    /// Build a planner from validated configuration.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            read_ahead_bytes: config.read_ahead_bytes,
            max_range_size_bytes: config.max_range_size_bytes,
            base: config.sequential_prefetch_base,
            speed: config.sequential_prefetch_speed,
        }
    }

    /// Plan the range to fetch for a read at `pos`.
    ///
    /// `pos` must lie within the object (`pos < object_size`); the caller
    /// checks this before planning. The returned range starts at `pos`, is
    /// never empty, never exceeds `max_range_size_bytes`, and never extends
    /// past the object's last byte.
    ///
    /// A request contiguous with the previously planned range grows the
    /// length to `read_ahead × base^(speed × steps)`; anything else resets
    /// the progression.
    pub fn plan(&self, state: &mut PlannerState, pos: u64, object_size: u64) -> ByteRange {
        let sequential = matches!(state.last_range_end, Some(end) if pos == end + 1);

        let length = if sequential {
            state.sequential_steps += 1;
            let grown = self.read_ahead_bytes as f64
                * self.base.powf(self.speed * f64::from(state.sequential_steps));
            // min() in f64 space also absorbs overflow to infinity.
            grown.min(self.max_range_size_bytes as f64) as u64
        } else {
            state.sequential_steps = 0;
            self.read_ahead_bytes.min(self.max_range_size_bytes)
        };
        let length = length.max(1);

        let last_byte = object_size.saturating_sub(1);
        let end = pos.saturating_add(length - 1).min(last_byte);

        state.current_length = length;
        state.last_range_end = Some(end);

        // pos <= end holds because pos < object_size and length >= 1.
        ByteRange::new(pos, end).unwrap_or_else(|_| unreachable!("planner produced start > end"))
    }
}
