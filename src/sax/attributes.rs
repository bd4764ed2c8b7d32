//! Reusable Attribute Buffer
//!
//! Ordered name/value list filled once per element-start event. Names and
//! values live in one flat byte buffer referenced by offsets, so refilling
//! the buffer for the next element reuses the same allocations.
//!
//! The buffer is handed to a `Builder` by shared reference for the duration
//! of one call; anything the builder keeps must be copied out.

use std::ops::Range;

/// Offsets of one attribute inside the flat buffer
#[derive(Debug, Clone)]
struct Entry {
    name: Range<usize>,
    value: Range<usize>,
}

/// Reusable ordered attribute list
#[derive(Debug, Default)]
pub struct AttributeBuffer {
    /// Flat storage of all names and values
    data: Vec<u8>,
    /// One entry per attribute, in insertion order
    entries: Vec<Entry>,
}

impl AttributeBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self {
            data: Vec::with_capacity(256),
            entries: Vec::with_capacity(8), // Most elements have < 8 attrs
        }
    }

    /// Remove all attributes, keeping the allocations
    pub fn reset(&mut self) {
        self.data.clear();
        self.entries.clear();
    }

    /// Append an attribute. Duplicate names are kept in order.
    pub fn add(&mut self, name: &[u8], value: &[u8]) {
        let name_start = self.data.len();
        self.data.extend_from_slice(name);
        let value_start = self.data.len();
        self.data.extend_from_slice(value);
        self.entries.push(Entry {
            name: name_start..value_start,
            value: value_start..self.data.len(),
        });
    }

    /// Number of attributes
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the buffer holds no attributes
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the attribute at `index` as (name, value)
    pub fn get(&self, index: usize) -> Option<(&[u8], &[u8])> {
        self.entries
            .get(index)
            .map(|e| (&self.data[e.name.clone()], &self.data[e.value.clone()]))
    }

    /// Iterate over (name, value) pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> + '_ {
        self.entries
            .iter()
            .map(|e| (&self.data[e.name.clone()], &self.data[e.value.clone()]))
    }

    /// Copy the attributes out as owned pairs
    pub fn to_vec(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.iter().map(|(n, v)| (n.to_vec(), v.to_vec())).collect()
    }
}
