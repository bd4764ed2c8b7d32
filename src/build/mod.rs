//! Builder Contract
//!
//! A `Builder` commits nodes to a store, one call per node, in strict
//! pre-order nesting. The event adapter is the only caller during
//! ingestion; it guarantees that text arrives as one call per text node and
//! that namespace declarations precede the element they belong to.
//!
//! ## Implementations
//!
//! - `MemBuilder`: in-memory node store plus secondary indexes

pub mod memory;
pub mod namespace;
#[cfg(test)]
pub(crate) mod recording;

pub use memory::MemBuilder;

use crate::error::BuildError;
use crate::sax::attributes::AttributeBuffer;

/// Result type for builder calls
pub type BuildResult<T = ()> = Result<T, BuildError>;

/// Receiver of normalized node events
///
/// Persistence failures are reported as `BuildError::Io`, violations of
/// the nesting contract as `BuildError::Structure`.
pub trait Builder {
    /// Open the document node
    fn start_doc(&mut self, name: &[u8]) -> BuildResult;

    /// Close the document node
    fn end_doc(&mut self) -> BuildResult;

    /// Open an element
    ///
    /// The attribute buffer is only valid for the duration of the call;
    /// implementations copy whatever they keep.
    fn start_elem(&mut self, name: &[u8], atts: &AttributeBuffer) -> BuildResult;

    /// Close the innermost open element
    fn end_elem(&mut self, name: &[u8]) -> BuildResult;

    /// Add a text node. `raw` marks content that must not be normalized.
    fn text(&mut self, content: &[u8], raw: bool) -> BuildResult;

    /// Add a comment node
    fn comment(&mut self, content: &[u8]) -> BuildResult;

    /// Add a processing instruction node (`target` and data joined by a space)
    fn pi(&mut self, content: &[u8]) -> BuildResult;

    /// Register a namespace declared on the next element
    fn start_ns(&mut self, prefix: &[u8], uri: &[u8]) -> BuildResult;
}

impl<B: Builder + ?Sized> Builder for &mut B {
    fn start_doc(&mut self, name: &[u8]) -> BuildResult {
        (**self).start_doc(name)
    }

    fn end_doc(&mut self) -> BuildResult {
        (**self).end_doc()
    }

    fn start_elem(&mut self, name: &[u8], atts: &AttributeBuffer) -> BuildResult {
        (**self).start_elem(name, atts)
    }

    fn end_elem(&mut self, name: &[u8]) -> BuildResult {
        (**self).end_elem(name)
    }

    fn text(&mut self, content: &[u8], raw: bool) -> BuildResult {
        (**self).text(content, raw)
    }

    fn comment(&mut self, content: &[u8]) -> BuildResult {
        (**self).comment(content)
    }

    fn pi(&mut self, content: &[u8]) -> BuildResult {
        (**self).pi(content)
    }

    fn start_ns(&mut self, prefix: &[u8], uri: &[u8]) -> BuildResult {
        (**self).start_ns(prefix, uri)
    }
}
