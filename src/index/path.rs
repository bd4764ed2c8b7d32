//! Path Summary
//!
//! Condensed tree of all distinct root-to-node paths in a document. Each
//! path node counts how many document nodes share its path, so the summary
//! answers "how many `/site/people/person/@id` are there" without touching
//! the node store.

use crate::store::NodeKind;

/// One distinct path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathNode {
    /// Name of the last step (empty for text, comment and document steps)
    pub name: Vec<u8>,
    pub kind: NodeKind,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    /// Number of document nodes on this path
    pub count: usize,
    pub depth: usize,
}

/// Path summary with the cursor used while building
#[derive(Debug)]
pub struct PathSummary {
    nodes: Vec<PathNode>,
    /// Open element path nodes during building (index 0 is the root)
    stack: Vec<usize>,
}

impl PathSummary {
    /// Create a summary holding only the document root
    pub fn new() -> Self {
        Self {
            nodes: vec![PathNode {
                name: Vec::new(),
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
                count: 1,
                depth: 0,
            }],
            stack: vec![0],
        }
    }

    /// Count a node below the current path, returning its path node
    fn child(&mut self, kind: NodeKind, name: &[u8]) -> usize {
        let parent = self.stack.last().copied().unwrap_or(0);
        let existing = self.nodes[parent]
            .children
            .iter()
            .copied()
            .find(|&c| self.nodes[c].kind == kind && self.nodes[c].name == name);

        let id = match existing {
            Some(id) => id,
            None => {
                let id = self.nodes.len();
                let depth = self.nodes[parent].depth + 1;
                self.nodes.push(PathNode {
                    name: name.to_vec(),
                    kind,
                    parent: Some(parent),
                    children: Vec::new(),
                    count: 0,
                    depth,
                });
                self.nodes[parent].children.push(id);
                id
            }
        };
        self.nodes[id].count += 1;
        id
    }

    /// Enter an element
    pub(crate) fn open(&mut self, name: &[u8]) {
        let id = self.child(NodeKind::Element, name);
        self.stack.push(id);
    }

    /// Leave the current element
    pub(crate) fn close(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    /// Count a leaf node (attribute, text, comment, PI) at the current path
    pub(crate) fn leaf(&mut self, kind: NodeKind, name: &[u8]) {
        self.child(kind, name);
    }

    pub(crate) fn finish(&mut self) {
        self.stack.truncate(1);
        self.stack.shrink_to_fit();
    }

    /// Number of distinct paths (the root included)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Get a path node by id
    pub fn get(&self, id: usize) -> Option<&PathNode> {
        self.nodes.get(id)
    }

    /// Look up an absolute path such as `/r/item/@id` or `/r/text()`
    pub fn lookup(&self, path: &str) -> Option<&PathNode> {
        let mut current = 0;
        for step in path.split('/').filter(|s| !s.is_empty()) {
            let (kind, name) = match step {
                "text()" => (NodeKind::Text, ""),
                "comment()" => (NodeKind::Comment, ""),
                "processing-instruction()" => (NodeKind::ProcessingInstruction, ""),
                _ => match step.strip_prefix('@') {
                    Some(attr) => (NodeKind::Attribute, attr),
                    None => (NodeKind::Element, step),
                },
            };
            current = self.nodes[current].children.iter().copied().find(|&c| {
                self.nodes[c].kind == kind && self.nodes[c].name == name.as_bytes()
            })?;
        }
        self.nodes.get(current)
    }

    /// Total number of elements with the given name, at any path
    pub fn count_named(&self, name: &[u8]) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Element && n.name == name)
            .map(|n| n.count)
            .sum()
    }

    /// Deepest path in the summary
    pub fn height(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }
}

impl Default for PathSummary {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// <r><item id="1">a</item><item id="2"/><other/></r>
    fn sample() -> PathSummary {
        let mut paths = PathSummary::new();
        paths.open(b"r");
        paths.open(b"item");
        paths.leaf(NodeKind::Attribute, b"id");
        paths.leaf(NodeKind::Text, b"");
        paths.close();
        paths.open(b"item");
        paths.leaf(NodeKind::Attribute, b"id");
        paths.close();
        paths.open(b"other");
        paths.close();
        paths.close();
        paths.finish();
        paths
    }

    #[test]
    fn test_distinct_paths_counted() {
        let paths = sample();
        assert_eq!(paths.len(), 6);
        assert_eq!(paths.lookup("/r/item").map(|n| n.count), Some(2));
        assert_eq!(paths.lookup("/r/item/@id").map(|n| n.count), Some(2));
        assert_eq!(paths.lookup("/r/item/text()").map(|n| n.count), Some(1));
        assert_eq!(paths.lookup("/r/other").map(|n| n.depth), Some(2));
        assert!(paths.lookup("/r/missing").is_none());
    }

    #[test]
    fn test_count_named_and_height() {
        let paths = sample();
        assert_eq!(paths.count_named(b"item"), 2);
        assert_eq!(paths.count_named(b"id"), 0);
        assert_eq!(paths.height(), 3);
    }

    #[test]
    fn test_root_lookup() {
        let paths = PathSummary::new();
        assert!(paths.is_empty());
        assert_eq!(paths.lookup("/").map(|n| n.kind), Some(NodeKind::Document));
    }
}
