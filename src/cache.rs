//! Fixed-capacity, insertion-ordered block cache.
//!
//! Eviction is FIFO: the oldest inserted block leaves first and lookups never
//! refresh order. The head block is never stored, since it is the one block
//! whose confirmations and next hash are still changing.

use crate::types::Block;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

pub const DEFAULT_CAPACITY: usize = 10240;

#[derive(Debug)]
pub struct BlockCache {
    capacity: usize,
    order: VecDeque<u64>,
    entries: HashMap<u64, Arc<Block>>,
    head: Option<u64>,
}

impl Default for BlockCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl BlockCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity.min(1024)),
            entries: HashMap::new(),
            head: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, index: u64) -> bool {
        self.entries.contains_key(&index)
    }

    pub fn get(&self, index: u64) -> Option<Arc<Block>> {
        self.entries.get(&index).cloned()
    }

    /// Record the current head index and drop anything at or above it.
    pub fn set_head(&mut self, head: u64) {
        self.head = Some(head);
        self.order.retain(|&i| i < head);
        self.entries.retain(|&i, _| i < head);
    }

    /// Store `block` under `index`. Returns false when the index is the head
    /// (or beyond it), when it is already cached, or when capacity is zero.
    pub fn put(&mut self, index: u64, block: Arc<Block>) -> bool {
        if self.head.is_some_and(|head| index >= head) {
            return false;
        }
        if self.capacity == 0 || self.entries.contains_key(&index) {
            return false;
        }
        if self.entries.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.order.push_back(index);
        self.entries.insert(index, block);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(index: u64) -> Arc<Block> {
        Arc::new(Block {
            index,
            hash: format!("0x{index:064x}"),
            ..Default::default()
        })
    }

    #[test]
    fn test_capacity_two_evicts_first() {
        let mut cache = BlockCache::new(2);
        assert!(cache.put(1, block(1)));
        assert!(cache.put(2, block(2)));
        assert!(cache.put(3, block(3)));

        assert!(cache.get(1).is_none());
        assert_eq!(cache.get(2).unwrap().index, 2);
        assert_eq!(cache.get(3).unwrap().index, 3);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_overflow_by_one_keeps_capacity() {
        for capacity in [1usize, 3, 17, 64] {
            let mut cache = BlockCache::new(capacity);
            for i in 0..=capacity as u64 {
                cache.put(i, block(i));
            }
            assert_eq!(cache.len(), capacity);
            assert!(!cache.contains(0));
            for i in 1..=capacity as u64 {
                assert!(cache.contains(i), "capacity {capacity}: {i} missing");
            }
        }
    }

    #[test]
    fn test_head_is_never_cached() {
        for head in [0u64, 1, 99, 10_000] {
            let mut cache = BlockCache::new(8);
            cache.set_head(head);
            assert!(!cache.put(head, block(head)));
            assert!(cache.get(head).is_none());
        }
    }

    #[test]
    fn test_moving_head_back_drops_entries() {
        let mut cache = BlockCache::new(8);
        cache.set_head(10);
        for i in 5..10 {
            cache.put(i, block(i));
        }
        cache.set_head(7);
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(5) && cache.contains(6));
        assert!(!cache.contains(7));

        // order stays consistent with entries after the purge
        for i in 0..5 {
            cache.put(i, block(i));
        }
        assert_eq!(cache.len(), 7);
        cache.put(100, block(100));
        assert_eq!(cache.len(), 7);
    }

    #[test]
    fn test_reput_does_not_duplicate() {
        let mut cache = BlockCache::new(2);
        cache.put(1, block(1));
        assert!(!cache.put(1, block(1)));
        cache.put(2, block(2));
        assert_eq!(cache.len(), 2);

        // 1 is still the oldest, re-put did not move it
        cache.put(3, block(3));
        assert!(!cache.contains(1));
        assert!(cache.contains(2));
    }

    #[test]
    fn test_get_does_not_refresh_order() {
        let mut cache = BlockCache::new(2);
        cache.put(1, block(1));
        cache.put(2, block(2));
        assert!(cache.get(1).is_some());
        cache.put(3, block(3));
        assert!(cache.get(1).is_none());
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let mut cache = BlockCache::new(0);
        assert!(!cache.put(1, block(1)));
        assert!(cache.is_empty());
    }
}
