//! Namespace Scopes
//!
//! Stack of in-scope prefix bindings while elements are committed. A
//! binding lives as long as the element that declared it; the `xml` prefix
//! is always bound.

use crate::store::NamePool;

/// The namespace bound to the `xml` prefix
pub const XML_URI: &[u8] = b"http://www.w3.org/XML/1998/namespace";

/// Namespace binding (prefix -> URI) declared at some depth
#[derive(Debug, Clone, Copy)]
struct Binding {
    prefix: u32,
    uri: u32,
    depth: usize,
}

/// Stack-based prefix resolver working on interned ids
#[derive(Debug)]
pub struct NamespaceScope {
    bindings: Vec<Binding>,
    xml_prefix: u32,
}

impl NamespaceScope {
    /// Create a scope with the `xml` prefix pre-bound
    pub fn new(names: &mut NamePool) -> Self {
        let xml_prefix = names.intern(b"xml");
        let xml_uri = names.intern(XML_URI);
        Self {
            bindings: vec![Binding {
                prefix: xml_prefix,
                uri: xml_uri,
                depth: 0,
            }],
            xml_prefix,
        }
    }

    /// Bind `prefix` (0 for the default namespace) at `depth`
    ///
    /// Returns false for attempts to rebind `xml`, which are ignored.
    pub fn declare(&mut self, prefix: u32, uri: u32, depth: usize) -> bool {
        if prefix == self.xml_prefix {
            return false;
        }
        self.bindings.push(Binding { prefix, uri, depth });
        true
    }

    /// Drop every binding declared at `depth` or deeper
    pub fn leave(&mut self, depth: usize) {
        while self.bindings.last().is_some_and(|b| b.depth >= depth && b.depth > 0) {
            self.bindings.pop();
        }
    }

    /// Bindings declared exactly at `depth`, in declaration order
    pub fn declared_at(&self, depth: usize) -> Vec<(u32, u32)> {
        self.bindings
            .iter()
            .filter(|b| b.depth == depth && depth > 0)
            .map(|b| (b.prefix, b.uri))
            .collect()
    }

    /// Resolve a prefix id to a URI id; the empty URI id (0) means unbound
    /// for the default namespace
    pub fn resolve(&self, prefix: u32) -> Option<u32> {
        self.bindings
            .iter()
            .rev()
            .find(|b| b.prefix == prefix)
            .map(|b| b.uri)
    }

    /// Number of bindings currently in scope (including shadowed ones)
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xml_prefix_bound() {
        let mut names = NamePool::new();
        let scope = NamespaceScope::new(&mut names);
        let xml = names.intern(b"xml");
        assert_eq!(scope.resolve(xml).map(|u| names.get(u)), Some(XML_URI));
    }

    #[test]
    fn test_xml_prefix_not_rebound() {
        let mut names = NamePool::new();
        let mut scope = NamespaceScope::new(&mut names);
        let xml = names.intern(b"xml");
        let other = names.intern(b"urn:other");
        assert!(!scope.declare(xml, other, 1));
        assert_eq!(scope.len(), 1);
    }

    #[test]
    fn test_shadow_and_leave() {
        let mut names = NamePool::new();
        let mut scope = NamespaceScope::new(&mut names);
        let ns = names.intern(b"ns");
        let uri1 = names.intern(b"urn:one");
        let uri2 = names.intern(b"urn:two");

        scope.declare(ns, uri1, 1);
        scope.declare(ns, uri2, 2);
        assert_eq!(scope.resolve(ns), Some(uri2));

        scope.leave(2);
        assert_eq!(scope.resolve(ns), Some(uri1));
        scope.leave(1);
        assert_eq!(scope.resolve(ns), None);
        assert_eq!(scope.len(), 1);
    }
}
