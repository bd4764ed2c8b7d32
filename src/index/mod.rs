//! Secondary Indexes
//!
//! Built alongside the node store while a document is ingested:
//!
//! ```text
//! MemBuilder ──> IndexBuilders ──finish()──> Indexes
//!                ├── PathSummary   distinct paths with counts
//!                ├── ValueIndex    text values -> text nodes
//!                ├── ValueIndex    attribute values -> attribute nodes
//!                └── FtIndex       tokens -> postings (optionally fuzzy)
//! ```
//!
//! Which indexes exist is decided by `IndexConfig` when the build starts
//! and recorded in the database metadata.

pub mod fulltext;
pub mod path;
pub mod tokenizer;
pub mod value;

pub use fulltext::{FtIndex, Posting, Postings};
pub use path::{PathNode, PathSummary};
pub use value::ValueIndex;

use crate::config::IndexConfig;
use crate::store::NodeKind;

/// Index builders fed by the node builder
#[derive(Debug)]
pub struct IndexBuilders {
    path: Option<PathSummary>,
    text: Option<ValueIndex>,
    attr: Option<ValueIndex>,
    ft: Option<FtIndex>,
}

impl IndexBuilders {
    /// Create the builders enabled in `config`
    pub fn new(config: &IndexConfig) -> Self {
        Self {
            path: config.path.then(PathSummary::new),
            text: config.text.then(|| ValueIndex::new(config.max_value_len)),
            attr: config.attr.then(|| ValueIndex::new(config.max_value_len)),
            ft: config.ft.then(|| FtIndex::new(config.fuzzy)),
        }
    }

    /// An element was opened
    pub fn open_element(&mut self, name: &[u8]) {
        if let Some(path) = &mut self.path {
            path.open(name);
        }
    }

    /// The current element was closed
    pub fn close_element(&mut self) {
        if let Some(path) = &mut self.path {
            path.close();
        }
    }

    /// An attribute node was committed
    pub fn attribute(&mut self, pre: u32, name: &[u8], value: &[u8]) {
        if let Some(path) = &mut self.path {
            path.leaf(NodeKind::Attribute, name);
        }
        if let Some(attr) = &mut self.attr {
            attr.add(value, pre);
        }
    }

    /// A text node was committed
    pub fn text(&mut self, pre: u32, value: &[u8]) {
        if let Some(path) = &mut self.path {
            path.leaf(NodeKind::Text, b"");
        }
        if let Some(text) = &mut self.text {
            text.add(value, pre);
        }
        if let Some(ft) = &mut self.ft {
            ft.add(pre, value);
        }
    }

    /// A comment or processing instruction was committed
    pub fn other(&mut self, kind: NodeKind) {
        if let Some(path) = &mut self.path {
            path.leaf(kind, b"");
        }
    }

    /// Finalize all posting lists
    pub fn finish(self) -> Indexes {
        let IndexBuilders {
            mut path,
            mut text,
            mut attr,
            mut ft,
        } = self;

        rayon::join(
            || {
                if let Some(path) = &mut path {
                    path.finish();
                }
                if let Some(text) = &mut text {
                    text.finish();
                }
            },
            || {
                rayon::join(
                    || {
                        if let Some(attr) = &mut attr {
                            attr.finish();
                        }
                    },
                    || {
                        if let Some(ft) = &mut ft {
                            ft.finish();
                        }
                    },
                )
            },
        );

        Indexes {
            path,
            text,
            attr,
            ft,
        }
    }
}

/// Finalized, read-only indexes of a database
#[derive(Debug, Default)]
pub struct Indexes {
    pub path: Option<PathSummary>,
    pub text: Option<ValueIndex>,
    pub attr: Option<ValueIndex>,
    pub ft: Option<FtIndex>,
}

impl Indexes {
    /// One-line summary for logging
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(path) = &self.path {
            parts.push(format!("paths={}", path.len()));
        }
        if let Some(text) = &self.text {
            parts.push(format!("texts={}", text.len()));
        }
        if let Some(attr) = &self.attr {
            parts.push(format!("attributes={}", attr.len()));
        }
        if let Some(ft) = &self.ft {
            parts.push(format!(
                "tokens={}{}",
                ft.len(),
                if ft.is_fuzzy() { " (fuzzy)" } else { "" }
            ));
        }
        if parts.is_empty() {
            "none".to_owned()
        } else {
            parts.join(" ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_configured_indexes_built() {
        let config = IndexConfig::none().with_full_text(true, false);
        let mut builders = IndexBuilders::new(&config);
        builders.open_element(b"r");
        builders.attribute(2, b"id", b"x");
        builders.text(3, b"hello world");
        builders.close_element();
        let indexes = builders.finish();

        assert!(indexes.path.is_none());
        assert!(indexes.text.is_none());
        assert!(indexes.attr.is_none());
        let ft = indexes.ft.as_ref().unwrap();
        assert_eq!(ft.postings("world").len(), 1);
        assert_eq!(indexes.summary(), "tokens=2");
    }

    #[test]
    fn test_all_indexes_fed() {
        let mut builders = IndexBuilders::new(&IndexConfig::all());
        builders.open_element(b"r");
        builders.attribute(2, b"id", b"x");
        builders.text(3, b"v");
        builders.other(NodeKind::Comment);
        builders.close_element();
        let indexes = builders.finish();

        assert_eq!(indexes.attr.as_ref().unwrap().lookup(b"x"), &[2]);
        assert_eq!(indexes.text.as_ref().unwrap().lookup(b"v"), &[3]);
        let path = indexes.path.as_ref().unwrap();
        assert_eq!(path.lookup("/r/@id").map(|n| n.count), Some(1));
        assert!(path.lookup("/r/comment()").is_some());
        assert!(indexes.ft.as_ref().unwrap().is_fuzzy());
    }
}
