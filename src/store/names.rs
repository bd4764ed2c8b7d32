//! Name Interning Pool
//!
//! Deduplicated storage for element names, attribute names, namespace
//! prefixes and URIs. All strings live in one flat buffer; an id is an
//! index into the entry table. Id 0 is reserved for the empty string.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};

/// Interning pool: id -> (offset, len) into a shared buffer
#[derive(Debug)]
pub struct NamePool {
    /// (offset, len) for each id
    entries: Vec<(u32, u32)>,
    /// Interned bytes
    data: Vec<u8>,
    /// Hash of content -> ids with that hash (handles rare collisions)
    hash_index: HashMap<u64, Vec<u32>>,
}

impl NamePool {
    /// Create a pool holding only the empty string
    pub fn new() -> Self {
        let mut pool = NamePool {
            entries: Vec::with_capacity(256),
            data: Vec::with_capacity(4096),
            hash_index: HashMap::new(),
        };
        pool.entries.push((0, 0));
        pool
    }

    #[inline]
    fn compute_hash(s: &[u8]) -> u64 {
        let mut hasher = DefaultHasher::new();
        s.hash(&mut hasher);
        hasher.finish()
    }

    /// Intern a string, returning its id
    pub fn intern(&mut self, s: &[u8]) -> u32 {
        if s.is_empty() {
            return 0;
        }
        let hash = Self::compute_hash(s);
        if let Some(ids) = self.hash_index.get(&hash) {
            for &id in ids {
                if self.get(id) == s {
                    return id;
                }
            }
        }

        let offset = self.data.len() as u32;
        self.data.extend_from_slice(s);
        let id = self.entries.len() as u32;
        self.entries.push((offset, s.len() as u32));
        self.hash_index.entry(hash).or_default().push(id);
        id
    }

    /// Id of an already interned string
    pub fn lookup(&self, s: &[u8]) -> Option<u32> {
        if s.is_empty() {
            return Some(0);
        }
        self.hash_index
            .get(&Self::compute_hash(s))?
            .iter()
            .copied()
            .find(|&id| self.get(id) == s)
    }

    /// Resolve an id. Unknown ids resolve to the empty string.
    #[inline]
    pub fn get(&self, id: u32) -> &[u8] {
        match self.entries.get(id as usize) {
            Some(&(offset, len)) => &self.data[offset as usize..(offset + len) as usize],
            None => b"",
        }
    }

    /// Number of distinct strings (the empty string included)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if only the empty string is present
    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    /// Bytes of interned string data
    pub fn data_len(&self) -> usize {
        self.data.len() + self.entries.len() * std::mem::size_of::<(u32, u32)>()
    }

    /// Release excess capacity once building is done
    pub fn shrink_to_fit(&mut self) {
        self.entries.shrink_to_fit();
        self.data.shrink_to_fit();
    }
}

impl Default for NamePool {
    fn default() -> Self {
        Self::new()
    }
}
