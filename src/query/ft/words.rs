//! Conjunction of token iterators
//!
//! A node matches when every token occurs in it. The children are advanced
//! in lockstep (leapfrog): whichever child is behind the largest current
//! position is pulled until it catches up, so no child is read further than
//! needed for the next hit.

use super::{FtIndexIter, FtIter, FtMatch, FtNodeItem};
use crate::error::QueryError;

/// Nodes containing all tokens
#[derive(Debug)]
pub struct FtWordsIter<'a> {
    children: Vec<FtIndexIter<'a>>,
    /// Current item per child (None before the first pull)
    heads: Vec<Option<FtNodeItem>>,
    done: bool,
}

impl<'a> FtWordsIter<'a> {
    pub fn new(children: Vec<FtIndexIter<'a>>) -> Self {
        let heads = vec![None; children.len()];
        Self {
            done: children.is_empty(),
            children,
            heads,
        }
    }

    /// Pull child `i` until its head is at or past `target`
    fn advance(&mut self, i: usize, target: u32) -> Result<bool, QueryError> {
        loop {
            if let Some(head) = &self.heads[i] {
                if head.pre >= target {
                    return Ok(true);
                }
            }
            match self.children[i].next()? {
                Some(item) => self.heads[i] = Some(item),
                None => return Ok(false),
            }
        }
    }
}

impl FtIter for FtWordsIter<'_> {
    fn next(&mut self) -> Result<Option<FtNodeItem>, QueryError> {
        if self.done {
            return Ok(None);
        }
        let mut target = 0;
        loop {
            let mut aligned = true;
            for i in 0..self.children.len() {
                if !self.advance(i, target)? {
                    self.done = true;
                    return Ok(None);
                }
                let pre = self.heads[i].as_ref().map_or(target, |h| h.pre);
                if pre > target {
                    target = pre;
                    // Children before `i` are now behind
                    aligned &= i == 0;
                }
            }
            if aligned {
                break;
            }
        }

        // All heads sit on `target`: merge and consume them
        let mut merged = FtMatch::default();
        for head in &mut self.heads {
            if let Some(item) = head.take() {
                merged.positions.extend(item.matches.positions);
                merged.score += item.matches.score;
            }
        }
        merged.positions.sort_unstable();
        merged.positions.dedup();
        Ok(Some(FtNodeItem {
            pre: target,
            matches: merged,
        }))
    }
}
