//! Query Evaluation
//!
//! Only the full-text part of evaluation lives here: expressions are
//! compiled into pull iterators over the full-text index.

pub mod ft;

pub use ft::{FtExpr, FtIter, FtMatch, FtNodeItem};
