//! Node Table Entries
//!
//! Compact fixed-size records, one per committed node, addressed by
//! pre-order position. String content lives outside the record: names and
//! URIs in the name pool, values in the store's flat value buffer.

/// Sentinel value for "no node"
pub const NO_NODE: u32 = u32::MAX;

/// Kind of a stored node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
}

impl NodeKind {
    /// Kinds that carry a string value of their own
    #[inline]
    pub fn has_value(self) -> bool {
        !matches!(self, NodeKind::Element)
    }
}

/// One stored node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    /// Parent position (NO_NODE for the document node)
    pub parent: u32,
    /// Distance from the document node
    pub depth: u32,
    /// Number of attributes (elements only)
    pub attr_count: u32,
    /// Subtree extent: this node, its attributes and all descendants
    pub size: u32,
    /// Name id (elements and attributes)
    pub name: u32,
    /// Namespace URI id (elements and attributes, 0 if none)
    pub uri: u32,
    /// Value location in the value buffer
    pub value_start: u32,
    pub value_len: u32,
}

impl Node {
    /// Create a node with the given kind, parent and depth
    #[inline]
    pub fn new(kind: NodeKind, parent: u32, depth: u32) -> Self {
        Self {
            kind,
            parent,
            depth,
            attr_count: 0,
            size: 1,
            name: 0,
            uri: 0,
            value_start: 0,
            value_len: 0,
        }
    }

    /// Builder-style setter for name and namespace
    #[inline]
    pub fn with_name(mut self, name: u32, uri: u32) -> Self {
        self.name = name;
        self.uri = uri;
        self
    }

    /// Builder-style setter for the value location
    #[inline]
    pub fn with_value(mut self, start: u32, len: u32) -> Self {
        self.value_start = start;
        self.value_len = len;
        self
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        self.kind == NodeKind::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_size() {
        assert!(std::mem::size_of::<Node>() <= 40);
    }

    #[test]
    fn test_builders() {
        let node = Node::new(NodeKind::Attribute, 1, 2)
            .with_name(3, 4)
            .with_value(10, 5);
        assert_eq!((node.name, node.uri), (3, 4));
        assert_eq!((node.value_start, node.value_len), (10, 5));
        assert_eq!(node.size, 1);
        assert!(!node.is_element());
        assert!(NodeKind::Text.has_value());
        assert!(!NodeKind::Element.has_value());
    }
}
