//! Insertion Order Module
//!
//! Tracks write order for FIFO eviction.

use std::collections::BTreeMap;

// == Insertion Order ==
/// Tracks keys by the sequence number of their latest write.
///
/// Keys are stored in a BTreeMap keyed by write sequence:
/// - First = oldest write (next eviction candidate)
/// - Last = most recent write
///
/// Reads never touch the order. Rewriting a key moves it to the back.
#[derive(Debug)]
pub struct InsertionOrder<K> {
    /// Keys by write sequence
    order: BTreeMap<u64, K>,
    /// Next sequence number to hand out
    next_seq: u64,
}

impl<K> Default for InsertionOrder<K> {
    fn default() -> Self {
        Self {
            order: BTreeMap::new(),
            next_seq: 0,
        }
    }
}

impl<K: Clone> InsertionOrder<K> {
    // == Constructor ==
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Write ==
    /// Records a write of `key` and returns its new sequence number.
    ///
    /// Pass the key's previous sequence number when overwriting so the stale
    /// position is dropped.
    pub fn record_write(&mut self, key: &K, previous: Option<u64>) -> u64 {
        if let Some(seq) = previous {
            self.order.remove(&seq);
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, key.clone());
        seq
    }

    // == Remove ==
    /// Forgets the position with sequence number `seq`.
    pub fn remove(&mut self, seq: u64) {
        self.order.remove(&seq);
    }

    // == Pop Oldest ==
    /// Returns and removes the key with the oldest write.
    ///
    /// Returns None if tracker is empty.
    pub fn pop_oldest(&mut self) -> Option<K> {
        self.order.pop_first().map(|(_, key)| key)
    }

    // == Peek Oldest ==
    /// Returns the key with the oldest write without removing it.
    #[allow(dead_code)]
    pub fn peek_oldest(&self) -> Option<&K> {
        self.order.first_key_value().map(|(_, key)| key)
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.order.clear();
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
