//! Node Store
//!
//! Flat pre-order table of committed nodes. A node's descendants occupy the
//! positions `pre + 1 .. pre + size`; an element's attributes come first in
//! that range, immediately after the element itself.
//!
//! Memory layout:
//! - `nodes`: one fixed-size `Node` per position
//! - `values`: flat buffer holding every text, comment, PI, attribute value
//!   and the document name
//! - `names`: interned names, prefixes and URIs
//! - `namespaces`: declarations attached to elements, sorted by position

pub mod names;
pub mod node;

pub use names::NamePool;
pub use node::{Node, NodeKind, NO_NODE};

use crate::error::BuildError;
use std::borrow::Cow;

/// Convert a table length into a stored position or offset
pub(crate) fn to_u32(n: usize, what: &str) -> Result<u32, BuildError> {
    u32::try_from(n)
        .map_err(|_| BuildError::structure(format!("{} exceeds {} entries", what, u32::MAX)))
}

/// A namespace declared on an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NsDecl {
    /// Element position
    pub pre: u32,
    /// Prefix id (0 for the default namespace)
    pub prefix: u32,
    /// URI id
    pub uri: u32,
}

/// Pre-order node table
#[derive(Debug, Default)]
pub struct NodeStore {
    nodes: Vec<Node>,
    values: Vec<u8>,
    names: NamePool,
    namespaces: Vec<NsDecl>,
}

impl NodeStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            nodes: Vec::with_capacity(256),
            values: Vec::with_capacity(4096),
            names: NamePool::new(),
            namespaces: Vec::new(),
        }
    }

    /// Append a node, returning its position
    #[inline]
    pub(crate) fn push(&mut self, node: Node) -> Result<u32, BuildError> {
        let pre = to_u32(self.nodes.len(), "node table")?;
        self.nodes.push(node);
        Ok(pre)
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, pre: u32) -> Option<&mut Node> {
        self.nodes.get_mut(pre as usize)
    }

    /// Copy a value into the value buffer, returning (start, len)
    pub(crate) fn add_value(&mut self, value: &[u8]) -> Result<(u32, u32), BuildError> {
        let start = to_u32(self.values.len(), "value buffer")?;
        let end = to_u32(self.values.len() + value.len(), "value buffer")?;
        self.values.extend_from_slice(value);
        Ok((start, end - start))
    }

    pub(crate) fn names_mut(&mut self) -> &mut NamePool {
        &mut self.names
    }

    pub(crate) fn add_namespace(&mut self, pre: u32, prefix: u32, uri: u32) {
        self.namespaces.push(NsDecl { pre, prefix, uri });
    }

    /// Release over-allocated capacity
    pub(crate) fn shrink_to_fit(&mut self) {
        self.nodes.shrink_to_fit();
        self.values.shrink_to_fit();
        self.names.shrink_to_fit();
        self.namespaces.shrink_to_fit();
    }

    /// Number of stored nodes
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get a node by position
    #[inline]
    pub fn node(&self, pre: u32) -> Option<&Node> {
        self.nodes.get(pre as usize)
    }

    /// Kind of the node at `pre`
    #[inline]
    pub fn kind(&self, pre: u32) -> Option<NodeKind> {
        self.node(pre).map(|n| n.kind)
    }

    /// The name pool
    pub fn names(&self) -> &NamePool {
        &self.names
    }

    /// Qualified name of an element or attribute (empty for other kinds)
    pub fn name(&self, pre: u32) -> &[u8] {
        self.node(pre).map_or(&b""[..], |n| self.names.get(n.name))
    }

    /// Namespace URI of an element or attribute (empty if none)
    pub fn uri(&self, pre: u32) -> &[u8] {
        self.node(pre).map_or(&b""[..], |n| self.names.get(n.uri))
    }

    /// Own value of a non-element node (the name for the document node)
    pub fn value(&self, pre: u32) -> &[u8] {
        match self.node(pre) {
            Some(n) if n.kind.has_value() => {
                let start = n.value_start as usize;
                &self.values[start..start + n.value_len as usize]
            }
            _ => b"",
        }
    }

    /// Parent position, None for the document node
    pub fn parent(&self, pre: u32) -> Option<u32> {
        self.node(pre)
            .map(|n| n.parent)
            .filter(|&parent| parent != NO_NODE)
    }

    /// Iterate over the child positions of `pre` (attributes excluded)
    pub fn children(&self, pre: u32) -> Children<'_> {
        let (next, end) = match self.node(pre) {
            Some(n) => (pre + 1 + n.attr_count, pre + n.size),
            None => (0, 0),
        };
        Children {
            store: self,
            next,
            end,
        }
    }

    /// Attribute positions of an element
    pub fn attributes(&self, pre: u32) -> std::ops::Range<u32> {
        match self.node(pre) {
            Some(n) if n.is_element() => pre + 1..pre + 1 + n.attr_count,
            _ => 0..0,
        }
    }

    /// Value of the attribute with the given qualified name
    pub fn attribute(&self, pre: u32, name: &[u8]) -> Option<&[u8]> {
        self.attributes(pre)
            .find(|&a| self.name(a) == name)
            .map(|a| self.value(a))
    }

    /// String value: concatenated descendant text for documents and
    /// elements, the own value for everything else
    pub fn string_value(&self, pre: u32) -> Cow<'_, [u8]> {
        let Some(node) = self.node(pre) else {
            return Cow::Borrowed(b"");
        };
        match node.kind {
            NodeKind::Document | NodeKind::Element => {
                let end = pre + node.size;
                let mut texts = (pre + 1..end).filter(|&p| self.nodes[p as usize].is_text());
                match (texts.next(), texts.next()) {
                    (None, _) => Cow::Borrowed(b""),
                    (Some(only), None) => Cow::Borrowed(self.value(only)),
                    (Some(first), Some(second)) => {
                        let mut out = self.value(first).to_vec();
                        out.extend_from_slice(self.value(second));
                        for p in texts {
                            out.extend_from_slice(self.value(p));
                        }
                        Cow::Owned(out)
                    }
                }
            }
            _ => Cow::Borrowed(self.value(pre)),
        }
    }

    /// Namespaces declared on the element at `pre`, as (prefix, uri)
    pub fn namespaces(&self, pre: u32) -> impl Iterator<Item = (&[u8], &[u8])> + '_ {
        let start = self.namespaces.partition_point(|ns| ns.pre < pre);
        self.namespaces[start..]
            .iter()
            .take_while(move |ns| ns.pre == pre)
            .map(|ns| (self.names.get(ns.prefix), self.names.get(ns.uri)))
    }

    /// Approximate heap footprint in bytes
    pub fn memory_size(&self) -> usize {
        self.nodes.len() * std::mem::size_of::<Node>()
            + self.values.len()
            + self.names.data_len()
            + self.namespaces.len() * std::mem::size_of::<NsDecl>()
    }

    /// Number of namespace declarations in the document
    pub fn namespace_count(&self) -> usize {
        self.namespaces.len()
    }
}

/// Iterator over the children of a node
pub struct Children<'a> {
    store: &'a NodeStore,
    next: u32,
    end: u32,
}

impl Iterator for Children<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.next >= self.end {
            return None;
        }
        let pre = self.next;
        let size = self.store.node(pre)?.size.max(1);
        self.next = pre + size;
        Some(pre)
    }
}
