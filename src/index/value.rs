//! Value Index
//!
//! Maps exact text or attribute values to the positions of the nodes that
//! carry them. Values longer than the configured maximum are not indexed.

use rayon::prelude::*;
use std::collections::HashMap;

/// Value -> node positions (ascending)
#[derive(Debug, Default)]
pub struct ValueIndex {
    entries: HashMap<Vec<u8>, Vec<u32>>,
    max_len: usize,
    /// Values skipped for exceeding `max_len`
    skipped: usize,
}

impl ValueIndex {
    /// Create an index that keeps values up to `max_len` bytes
    pub fn new(max_len: usize) -> Self {
        Self {
            entries: HashMap::new(),
            max_len,
            skipped: 0,
        }
    }

    /// Record `value` at node `pre`
    pub(crate) fn add(&mut self, value: &[u8], pre: u32) {
        if value.len() > self.max_len {
            self.skipped += 1;
            return;
        }
        match self.entries.get_mut(value) {
            Some(pres) => pres.push(pre),
            None => {
                self.entries.insert(value.to_vec(), vec![pre]);
            }
        }
    }

    /// Sort and compact the posting lists
    pub(crate) fn finish(&mut self) {
        self.entries.par_iter_mut().for_each(|(_, pres)| {
            pres.sort_unstable();
            pres.dedup();
            pres.shrink_to_fit();
        });
    }

    /// Positions of the nodes whose value equals `value`
    pub fn lookup(&self, value: &[u8]) -> &[u32] {
        self.entries.get(value).map(Vec::as_slice).unwrap_or_default()
    }

    /// Check whether a value of this length can be answered by the index
    pub fn covers(&self, value: &[u8]) -> bool {
        value.len() <= self.max_len
    }

    /// Number of distinct values
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of values that were too long to index
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}
