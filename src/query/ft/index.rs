//! Index-backed match iterator: walks the postings of one token

use super::{FtIter, FtMatch, FtNodeItem};
use crate::data::Database;
use crate::error::QueryError;
use crate::index::Postings;
use crate::store::{NodeKind, NodeStore};

/// Matches of a single token, one item per text node, in document order
#[derive(Debug)]
pub struct FtIndexIter<'a> {
    store: &'a NodeStore,
    postings: Postings<'a>,
    /// Next posting to read
    next: usize,
}

impl<'a> FtIndexIter<'a> {
    /// Look up a normalized token, exactly or by edit distance
    pub fn new(db: &'a Database, token: &str, fuzzy: bool) -> Result<Self, QueryError> {
        let ft = db.ft_index(fuzzy)?;
        let postings = if fuzzy {
            ft.fuzzy_postings(token, None)
                .ok_or(QueryError::MissingIndex("fuzzy full-text"))?
        } else {
            ft.postings(token)
        };
        Ok(Self {
            store: db.store(),
            postings,
            next: 0,
        })
    }

    /// Number of postings not yet consumed
    pub fn remaining(&self) -> usize {
        self.postings.len() - self.next
    }
}

impl FtIter for FtIndexIter<'_> {
    fn next(&mut self) -> Result<Option<FtNodeItem>, QueryError> {
        let Some(first) = self.postings.get(self.next) else {
            return Ok(None);
        };
        let pre = first.pre;
        match self.store.kind(pre) {
            Some(NodeKind::Text) => {}
            Some(kind) => {
                return Err(QueryError::CorruptIndex(format!(
                    "posting for node {} points to a {:?} node",
                    pre, kind
                )))
            }
            None => {
                return Err(QueryError::CorruptIndex(format!(
                    "posting for node {} beyond store size {}",
                    pre,
                    self.store.len()
                )))
            }
        }

        let positions: Vec<u32> = self.postings[self.next..]
            .iter()
            .take_while(|p| p.pre == pre)
            .map(|p| p.pos)
            .collect();
        self.next += positions.len();

        let score = positions.len() as f64;
        Ok(Some(FtNodeItem {
            pre,
            matches: FtMatch {
                not: false,
                positions,
                score,
            },
        }))
    }
}
