//! Full-Text Match Iteration
//!
//! Full-text expressions evaluate to lazy, forward-only sequences of
//! `FtNodeItem`s. Every combinator pulls from its children on demand:
//!
//! ```text
//! FtExpr::Not ──> FtNotIter ──> FtWordsIter ──> FtIndexIter (token 1)
//!                                          └──> FtIndexIter (token 2)
//! ```
//!
//! An item is moved out of `next()`; nothing keeps a second handle to it,
//! so a combinator may modify the item it received before passing it on.

mod index;
mod not;
mod words;

pub use index::FtIndexIter;
pub use not::FtNotIter;
pub use words::FtWordsIter;

use crate::data::Database;
use crate::error::QueryError;
use crate::index::tokenizer;

/// Match annotation of a full-text hit
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FtMatch {
    /// Polarity: set when the match is to be read as negated
    pub not: bool,
    /// Token positions inside the node, ascending
    pub positions: Vec<u32>,
    /// Relevance (number of matched token occurrences)
    pub score: f64,
}

/// A node matched by a full-text expression
#[derive(Debug, Clone, PartialEq)]
pub struct FtNodeItem {
    /// Position of the matched text node
    pub pre: u32,
    pub matches: FtMatch,
}

/// Pull iterator over full-text matches
///
/// `Ok(None)` ends the sequence. An error ends it as well; calling
/// `next()` again afterwards is unspecified.
pub trait FtIter {
    /// Produce the next match, or None when exhausted
    fn next(&mut self) -> Result<Option<FtNodeItem>, QueryError>;

    /// Drain the iterator
    fn collect_all(mut self) -> Result<Vec<FtNodeItem>, QueryError>
    where
        Self: Sized,
    {
        let mut items = Vec::new();
        while let Some(item) = self.next()? {
            items.push(item);
        }
        Ok(items)
    }
}

impl<I: FtIter + ?Sized> FtIter for Box<I> {
    fn next(&mut self) -> Result<Option<FtNodeItem>, QueryError> {
        (**self).next()
    }
}

/// Iterator over nothing
#[derive(Debug, Default)]
pub struct FtEmptyIter;

impl FtIter for FtEmptyIter {
    fn next(&mut self) -> Result<Option<FtNodeItem>, QueryError> {
        Ok(None)
    }
}

/// Full-text expression tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FtExpr {
    /// All tokens of `text` occur in the same text node
    Words { text: String, fuzzy: bool },
    /// Polarity flip of the inner expression's matches
    Not(Box<FtExpr>),
}

impl FtExpr {
    /// Exact word search
    pub fn words(text: impl Into<String>) -> Self {
        FtExpr::Words {
            text: text.into(),
            fuzzy: false,
        }
    }

    /// Fuzzy word search
    pub fn fuzzy(text: impl Into<String>) -> Self {
        FtExpr::Words {
            text: text.into(),
            fuzzy: true,
        }
    }

    /// Negate this expression
    pub fn negate(self) -> Self {
        FtExpr::Not(Box::new(self))
    }

    /// Create a fresh iterator over the matches of this expression
    ///
    /// Index availability is checked here, before anything is pulled.
    pub fn iter<'a>(&self, db: &'a Database) -> Result<Box<dyn FtIter + 'a>, QueryError> {
        match self {
            FtExpr::Words { text, fuzzy } => {
                // A repeated token adds no constraint
                let mut tokens: Vec<String> = Vec::new();
                for token in tokenizer::tokenize(text) {
                    if !tokens.contains(&token) {
                        tokens.push(token);
                    }
                }
                let mut iters = tokens
                    .iter()
                    .map(|token| FtIndexIter::new(db, token, *fuzzy))
                    .collect::<Result<Vec<_>, _>>()?;
                if iters.is_empty() {
                    // Nothing to search for; still fail on a missing index
                    db.ft_index(*fuzzy)?;
                    return Ok(Box::new(FtEmptyIter));
                }
                if iters.len() == 1 {
                    if let Some(single) = iters.pop() {
                        return Ok(Box::new(single));
                    }
                }
                Ok(Box::new(FtWordsIter::new(iters)))
            }
            FtExpr::Not(inner) => Ok(Box::new(FtNotIter::new(inner.iter(db)?))),
        }
    }
}
