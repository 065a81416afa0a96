//! Per-shard storage used by `save`.
//!
//! Each shard owns one [`ShardStore`]; callers append to the store of their preferred
//! shard and the shard's worker drains it on its own schedule. Because callers with
//! distinct affinity hints hit distinct stores, the mutex is almost never contended.

use parking_lot::Mutex;

/// Append-only buffer owned by one shard.
#[derive(Debug)]
pub struct ShardStore<T> {
    items: Mutex<Vec<T>>,
}

impl<T> ShardStore<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
        }
    }

    /// Appends one item.
    #[inline]
    pub fn push(&self, item: T) {
        self.items.lock().push(item);
    }

    /// Takes every buffered item, leaving the store empty.
    pub fn drain(&self) -> Vec<T> {
        std::mem::take(&mut *self.items.lock())
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl<T> Default for ShardStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_the_store_in_insertion_order() {
        let store = ShardStore::new();
        store.push("a");
        store.push("b");
        assert_eq!(store.len(), 2);
        assert_eq!(store.drain(), vec!["a", "b"]);
        assert!(store.is_empty());
        assert!(store.drain().is_empty());
    }
}
