//! Full-Text Index
//!
//! Inverted index from normalized tokens to postings (text node position
//! plus token position inside that node). Posting lists are sorted by
//! (pre, pos), so a scan yields nodes in document order.
//!
//! The fuzzy variant additionally keeps the sorted vocabulary and answers
//! approximate lookups by edit distance. Fuzzy results are merged lists
//! and are cached (LRU) since queries tend to repeat terms.

use super::tokenizer;
use lru::LruCache;
use rayon::prelude::*;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::ops::Deref;
use std::sync::{Arc, Mutex, PoisonError};

/// Number of fuzzy lookups kept in the cache
const FUZZY_CACHE_SIZE: usize = 64;

/// One occurrence of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Posting {
    /// Text node position
    pub pre: u32,
    /// Token position inside the node
    pub pos: u32,
}

/// Posting list borrowed from the index or shared from the fuzzy cache
#[derive(Debug, Clone)]
pub enum Postings<'a> {
    Borrowed(&'a [Posting]),
    Shared(Arc<[Posting]>),
}

impl Deref for Postings<'_> {
    type Target = [Posting];

    fn deref(&self) -> &[Posting] {
        match self {
            Postings::Borrowed(p) => p,
            Postings::Shared(p) => p,
        }
    }
}

/// Token -> postings
#[derive(Debug)]
pub struct FtIndex {
    tokens: HashMap<String, Vec<Posting>>,
    fuzzy: bool,
    /// Sorted distinct tokens (fuzzy variant only)
    vocabulary: Vec<String>,
    cache: Mutex<LruCache<(String, usize), Arc<[Posting]>>>,
    /// Text nodes indexed
    nodes: usize,
}

impl FtIndex {
    /// Create an empty index, with the fuzzy variant if requested
    pub fn new(fuzzy: bool) -> Self {
        let capacity = NonZeroUsize::new(FUZZY_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN);
        Self {
            tokens: HashMap::new(),
            fuzzy,
            vocabulary: Vec::new(),
            cache: Mutex::new(LruCache::new(capacity)),
            nodes: 0,
        }
    }

    /// Index the tokens of the text node at `pre`
    pub(crate) fn add(&mut self, pre: u32, text: &[u8]) {
        let mut any = false;
        for (pos, token) in tokenizer::tokenize_bytes(text).into_iter().enumerate() {
            any = true;
            self.tokens.entry(token).or_default().push(Posting {
                pre,
                pos: pos as u32,
            });
        }
        if any {
            self.nodes += 1;
        }
    }

    /// Sort posting lists; build the vocabulary for fuzzy lookups
    pub(crate) fn finish(&mut self) {
        self.tokens.par_iter_mut().for_each(|(_, postings)| {
            postings.sort_unstable();
            postings.dedup();
            postings.shrink_to_fit();
        });
        if self.fuzzy {
            self.vocabulary = self.tokens.keys().cloned().collect();
            self.vocabulary.par_sort_unstable();
        }
    }

    /// Whether the fuzzy variant is available
    pub fn is_fuzzy(&self) -> bool {
        self.fuzzy
    }

    /// Number of distinct tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of text nodes that contributed tokens
    pub fn node_count(&self) -> usize {
        self.nodes
    }

    /// Exact postings of a normalized token
    pub fn postings(&self, token: &str) -> Postings<'_> {
        Postings::Borrowed(self.tokens.get(token).map(Vec::as_slice).unwrap_or_default())
    }

    /// Postings of all tokens within `errors` edits of `token`
    ///
    /// Without an explicit error count, one error per four characters is
    /// allowed (at least one). Returns None if the index has no fuzzy variant.
    pub fn fuzzy_postings(&self, token: &str, errors: Option<usize>) -> Option<Postings<'_>> {
        if !self.fuzzy {
            return None;
        }
        let k = errors.unwrap_or_else(|| default_errors(token));
        let key = (token.to_owned(), k);

        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(hit) = cache.get(&key) {
            return Some(Postings::Shared(Arc::clone(hit)));
        }

        let len = token.chars().count();
        let mut merged: Vec<Posting> = self
            .vocabulary
            .iter()
            .filter(|candidate| candidate.chars().count().abs_diff(len) <= k)
            .filter(|candidate| within_distance(token, candidate, k))
            .filter_map(|candidate| self.tokens.get(candidate.as_str()))
            .flatten()
            .copied()
            .collect();
        merged.sort_unstable();
        merged.dedup();

        let shared: Arc<[Posting]> = merged.into();
        cache.put(key, Arc::clone(&shared));
        tracing::trace!(token, errors = k, hits = shared.len(), "fuzzy lookup");
        Some(Postings::Shared(shared))
    }
}

/// Default number of tolerated edits for a token
pub fn default_errors(token: &str) -> usize {
    (token.chars().count() / 4).max(1)
}

/// Check whether the Levenshtein distance of `a` and `b` is at most `k`
fn within_distance(a: &str, b: &str, k: usize) -> bool {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
            row_min = row_min.min(curr[j + 1]);
        }
        if row_min > k {
            return false;
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()] <= k
}
