//! Error Types
//!
//! Three error domains meet in this crate:
//! - `BuildError`: persistence/structure failures raised by a `Builder`
//! - `ParseError`: parser-domain failures reported to the push parser driver
//! - `QueryError`: failures while pulling full-text matches from an index
//!
//! The event adapter translates builder failures into the parser domain
//! through `From<BuildError> for ParseError`, keeping the builder error as
//! the `source()` so nothing of the diagnostic chain is lost.

use std::io;

/// Result type for parsing and ingestion
pub type Result<T, E = ParseError> = std::result::Result<T, E>;

/// Failure raised by a `Builder` while committing nodes
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Persistence failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The call sequence violated the node nesting contract
    #[error("invalid document structure: {0}")]
    Structure(String),
}

impl BuildError {
    /// Create a new structure error
    pub fn structure<S: Into<String>>(msg: S) -> Self {
        BuildError::Structure(msg.into())
    }
}

/// Parser-domain error reported to whoever drives the push parser
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Malformed markup
    #[error("syntax error at byte {position}: {message}")]
    Syntax { message: String, position: usize },

    /// Entity reference could not be expanded
    #[error("entity error: {0}")]
    Entity(String),

    /// Character data could not be decoded
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Event order violated the callback contract
    #[error("unexpected event: {0}")]
    Event(String),

    /// A forwarded builder call failed; ingestion is aborted
    #[error("{0}")]
    Build(#[source] BuildError),

    /// The input could not be read
    #[error("cannot read input: {0}")]
    Io(#[from] io::Error),
}

impl ParseError {
    /// Create a new syntax error at the given input position
    pub fn syntax<S: Into<String>>(msg: S, position: usize) -> Self {
        ParseError::Syntax {
            message: msg.into(),
            position,
        }
    }

    /// Create a new event-order error
    pub fn event<S: Into<String>>(msg: S) -> Self {
        ParseError::Event(msg.into())
    }

    /// The builder failure behind this error, if any
    pub fn build_error(&self) -> Option<&BuildError> {
        match self {
            ParseError::Build(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BuildError> for ParseError {
    fn from(err: BuildError) -> Self {
        ParseError::Build(err)
    }
}

/// Failure while evaluating a full-text expression against the indexes
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The required index was never built
    #[error("no {0} index available")]
    MissingIndex(&'static str),

    /// Updates invalidated the indexes after they were built
    #[error("indexes are out of date")]
    Stale,

    /// A posting referenced something the store does not contain
    #[error("corrupt index: {0}")]
    CorruptIndex(String),
}
