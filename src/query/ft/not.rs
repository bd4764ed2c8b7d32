//! Negation Combinator
//!
//! Flips the polarity of every match its child produces. One call to
//! `next()` pulls exactly one item from the child; nothing is buffered.
//!
//! This is not set complement: only nodes the child enumerated are
//! returned. Deciding what a negated match means is left to whoever
//! consumes the annotated items.

use super::{FtIter, FtNodeItem};
use crate::error::QueryError;

/// Polarity-flipping wrapper around one child iterator
#[derive(Debug)]
pub struct FtNotIter<I> {
    child: I,
}

impl<I: FtIter> FtNotIter<I> {
    pub fn new(child: I) -> Self {
        Self { child }
    }

    /// Unwrap the child iterator
    pub fn into_inner(self) -> I {
        self.child
    }
}

impl<I: FtIter> FtIter for FtNotIter<I> {
    fn next(&mut self) -> Result<Option<FtNodeItem>, QueryError> {
        Ok(self.child.next()?.map(|mut item| {
            item.matches.not = !item.matches.not;
            item
        }))
    }
}
