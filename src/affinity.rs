//! # Caller affinity hints.
//!
//! An [`Affinity`] identifies the calling execution context so that repeated calls
//! from the same OS thread keep landing on the same shard. Each thread draws a
//! process-unique id from a global counter the first time it asks, then keeps it in a
//! thread-local for the rest of its life. Under a multi-threaded tokio runtime this
//! maps worker threads onto shards round-robin.

use std::cell::Cell;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_THREAD_HINT: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static THREAD_HINT: Cell<Option<u64>> = const { Cell::new(None) };
}

/// Integer hint used to pick a caller's preferred shard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Affinity(pub u64);

impl Affinity {
    /// Hint for the current OS thread (stable for the thread's lifetime).
    pub fn current() -> Self {
        let id = THREAD_HINT.with(|slot| match slot.get() {
            Some(id) => id,
            None => {
                let id = NEXT_THREAD_HINT.fetch_add(1, Ordering::Relaxed);
                slot.set(Some(id));
                id
            }
        });
        Affinity(id)
    }

    /// Preferred shard for this hint on a resource of `width` shards.
    #[inline]
    pub fn shard(self, width: NonZeroUsize) -> usize {
        (self.0 % width.get() as u64) as usize
    }
}

impl From<u64> for Affinity {
    fn from(v: u64) -> Self {
        Affinity(v)
    }
}
