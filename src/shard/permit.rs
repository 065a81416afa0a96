//! # Admission permit.
//!
//! A [`Permit`] is the worker-side half of an admission: it travels with the bounded
//! message into the worker's mailbox and returns the unit of capacity to its shard
//! when the work completes. Completion is signaled by [`Permit::release`] or simply by
//! dropping the permit, so a handler that panics or a message that is never delivered
//! still frees its slot.

use std::fmt;
use std::sync::Arc;

use super::ShardTable;

/// One unit of admitted capacity on a specific shard.
#[must_use = "dropping a permit releases its capacity immediately"]
pub struct Permit {
    table: Arc<ShardTable>,
    shard: usize,
}

impl Permit {
    pub(crate) fn new(table: Arc<ShardTable>, shard: usize) -> Self {
        Self { table, shard }
    }

    /// Shard index this permit was admitted on.
    #[inline]
    pub fn shard(&self) -> usize {
        self.shard
    }

    /// Marks the unit of work as complete and returns its capacity.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for Permit {
    fn drop(&mut self) {
        self.table.release(self.shard);
    }
}

impl fmt::Debug for Permit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Permit").field("shard", &self.shard).finish()
    }
}
