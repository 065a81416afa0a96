//! # Per-shard usage counters with sticky saturation latches.
//!
//! A [`ShardTable`] holds one [`ShardCounter`] per shard of a resource. Every counter
//! is a single atomic state word, so callers landing on different shards never
//! touch the same cache line.
//!
//! ## State word
//! ```text
//!  63   62 ............................................ 0
//! ┌────┬─────────────────────────────────────────────────┐
//! │full│                    count                        │
//! └────┴─────────────────────────────────────────────────┘
//! ```
//!
//! ## Latch semantics
//! ```text
//! reserve():  CAS loop on the state word
//!               full? ──yes──► refuse (state untouched)
//!               │no
//!               ▼
//!             count' = count + 1, full' = count >= limit   (this unit is still admitted)
//!
//! release():  CAS loop on the state word
//!             count' = count - 1 (saturating)
//!             count' < limit ──► full' = false
//! ```
//!
//! ## Rules
//! - The latch is set by the same CAS that performs the increment which trips it, so
//!   no reserve can slip in between the check and the latch.
//! - `full` is sticky: it is not re-derived from `count` on `reserve`.
//! - The unit that trips the limit is admitted, so a shard never holds more than
//!   `limit + 1` units, whatever the contention.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::affinity::Affinity;

const FULL: u64 = 1 << 63;
const COUNT: u64 = FULL - 1;

/// Usage counter and saturation latch for a single shard.
#[derive(Debug, Default)]
pub struct ShardCounter {
    state: AtomicU64,
}

impl ShardCounter {
    /// Creates an empty, unlatched counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tries to reserve one unit of capacity.
    ///
    /// Returns `false` without mutating anything when the latch is set.
    /// Otherwise increments `count`, latches when the increment pushed `count` past
    /// `limit`, and returns `true`.
    #[inline]
    pub fn try_reserve(&self, limit: u64) -> bool {
        self.state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |s| {
                if s & FULL != 0 {
                    return None;
                }
                let count = s & COUNT;
                let full = if count >= limit { FULL } else { 0 };
                Some((count + 1) | full)
            })
            .is_ok()
    }

    /// Returns one unit of capacity and clears the latch once below `limit`.
    #[inline]
    pub fn release(&self, limit: u64) {
        let _ = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |s| {
                let count = (s & COUNT).saturating_sub(1);
                let full = if count < limit { 0 } else { s & FULL };
                Some(count | full)
            });
    }

    /// Current number of admitted, not yet released units.
    #[inline]
    pub fn count(&self) -> u64 {
        self.state.load(Ordering::Acquire) & COUNT
    }

    /// Whether the saturation latch is set.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.state.load(Ordering::Acquire) & FULL != 0
    }
}

/// Fixed-size table of shard counters for one resource.
#[derive(Debug)]
pub struct ShardTable {
    limit: u64,
    width: NonZeroUsize,
    shards: Box<[ShardCounter]>,
}

impl ShardTable {
    /// Creates `width` empty counters sharing the per-shard `limit`.
    pub fn new(width: NonZeroUsize, limit: u64) -> Self {
        let shards = (0..width.get()).map(|_| ShardCounter::new()).collect();
        Self {
            limit,
            width,
            shards,
        }
    }

    /// Per-shard limit (`total_limit / width`).
    #[inline]
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Number of shards (always at least one).
    #[inline]
    pub fn width(&self) -> NonZeroUsize {
        self.width
    }

    /// Preferred shard of a caller with the given affinity.
    #[inline]
    pub fn preferred(&self, affinity: Affinity) -> usize {
        affinity.shard(self.width)
    }

    /// Tries to reserve capacity on shard `index`.
    #[inline]
    pub fn try_reserve(&self, index: usize) -> bool {
        self.shards[index].try_reserve(self.limit)
    }

    /// Returns capacity to shard `index`.
    #[inline]
    pub fn release(&self, index: usize) {
        self.shards[index].release(self.limit)
    }

    /// Borrow the counter for shard `index`.
    #[inline]
    pub fn shard(&self, index: usize) -> &ShardCounter {
        &self.shards[index]
    }

    /// Sum of all shard counters (racy snapshot, for monitoring).
    pub fn in_flight(&self) -> u64 {
        self.shards.iter().map(ShardCounter::count).sum()
    }
}
