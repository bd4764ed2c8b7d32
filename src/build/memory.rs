//! In-Memory Builder
//!
//! Commits nodes to a `NodeStore` in pre-order and feeds the index
//! builders as it goes. Sizes are patched when an element closes, since
//! the extent of a subtree is only known at its end.
//!
//! Namespaces registered through `start_ns` attach to the next element;
//! element and attribute prefixes are resolved against the bindings in
//! scope at that element.

use super::namespace::NamespaceScope;
use super::{BuildResult, Builder};
use crate::config::IndexConfig;
use crate::core::attributes::split_name;
use crate::data::{Database, MetaData};
use crate::error::BuildError;
use crate::index::IndexBuilders;
use crate::sax::attributes::AttributeBuffer;
use crate::store::{to_u32, Node, NodeKind, NodeStore, NO_NODE};

/// Builder state for constructing a `Database` in memory
///
/// The stack holds open positions only; children are found later through
/// node sizes, so no child lists are kept while building.
pub struct MemBuilder {
    store: NodeStore,
    indexes: IndexBuilders,
    config: IndexConfig,
    meta: MetaData,
    /// Skip whitespace-only text nodes
    chop: bool,
    /// Open positions; index 0 is the document node
    stack: Vec<u32>,
    scope: NamespaceScope,
    /// (prefix id, uri id) registered for the next element
    pending_ns: Vec<(u32, u32)>,
    started: bool,
    finished: bool,
    height: usize,
    elements: usize,
}

impl MemBuilder {
    /// Create a builder populating the indexes enabled in `config`
    pub fn new(config: &IndexConfig) -> Self {
        let mut store = NodeStore::new();
        let scope = NamespaceScope::new(store.names_mut());
        Self {
            store,
            indexes: IndexBuilders::new(config),
            config: *config,
            meta: MetaData::default(),
            chop: false,
            stack: Vec::with_capacity(32),
            scope,
            pending_ns: Vec::new(),
            started: false,
            finished: false,
            height: 0,
            elements: 0,
        }
    }

    /// Drop whitespace-only text nodes
    pub fn with_chop(mut self, chop: bool) -> Self {
        self.chop = chop;
        self
    }

    /// Metadata that will be published with the database
    pub fn meta_mut(&mut self) -> &mut MetaData {
        &mut self.meta
    }

    /// Number of elements committed so far
    pub fn elements(&self) -> usize {
        self.elements
    }

    /// Number of nodes committed so far
    pub fn size(&self) -> usize {
        self.store.len()
    }

    /// Current parent position
    fn parent(&self) -> BuildResult<u32> {
        if !self.started {
            return Err(BuildError::structure("node before document start"));
        }
        if self.finished {
            return Err(BuildError::structure("node after document end"));
        }
        self.stack
            .last()
            .copied()
            .ok_or_else(|| BuildError::structure("no open node"))
    }

    /// Append a leaf node below the current parent
    fn leaf(&mut self, kind: NodeKind, content: &[u8]) -> BuildResult<u32> {
        let parent = self.parent()?;
        let depth = self.stack.len();
        let (start, len) = self.store.add_value(content)?;
        let pre = self
            .store
            .push(Node::new(kind, parent, to_u32(depth, "depth")?).with_value(start, len))?;
        self.height = self.height.max(depth);
        Ok(pre)
    }

    /// Resolve the namespace of a qualified name; unprefixed attributes
    /// are in no namespace
    fn resolve(&self, name: &[u8], attribute: bool) -> BuildResult<u32> {
        match split_name(name) {
            (Some(prefix), _) => {
                let uri = self
                    .store
                    .names()
                    .lookup(prefix)
                    .and_then(|id| self.scope.resolve(id));
                uri.ok_or_else(|| {
                    BuildError::structure(format!(
                        "namespace prefix '{}' is not declared",
                        String::from_utf8_lossy(prefix)
                    ))
                })
            }
            (None, _) if attribute => Ok(0),
            (None, _) => Ok(self.scope.resolve(0).unwrap_or(0)),
        }
    }

    /// Publish the database; only valid after `end_doc`
    pub fn finish(mut self) -> Result<Database, BuildError> {
        if !self.finished {
            return Err(BuildError::structure("document was not finished"));
        }
        self.store.shrink_to_fit();
        let indexes = self.indexes.finish();

        let mut meta = self.meta;
        meta.size = self.store.len();
        meta.height = self.height;
        meta.ndocs = 1;
        meta.chop = self.chop;
        meta.db_size = self.store.memory_size() as u64;
        meta.time = chrono::Utc::now().timestamp_millis();
        meta.path_index = self.config.path;
        meta.text_index = self.config.text;
        meta.attr_index = self.config.attr;
        meta.ft_index = self.config.ft;
        meta.ft_fuzzy = self.config.ft && self.config.fuzzy;
        meta.stale_index = false;

        tracing::info!(
            name = %meta.name,
            nodes = meta.size,
            elements = self.elements,
            height = meta.height,
            indexes = %indexes.summary(),
            "database built"
        );
        Ok(Database::new(self.store, indexes, meta))
    }
}

impl Builder for MemBuilder {
    fn start_doc(&mut self, name: &[u8]) -> BuildResult {
        if self.started {
            return Err(BuildError::structure("document already started"));
        }
        self.started = true;
        let (start, len) = self.store.add_value(name)?;
        let pre = self
            .store
            .push(Node::new(NodeKind::Document, NO_NODE, 0).with_value(start, len))?;
        self.stack.push(pre);
        if self.meta.name.is_empty() {
            self.meta.name = String::from_utf8_lossy(name).into_owned();
        }
        Ok(())
    }

    fn end_doc(&mut self) -> BuildResult {
        self.parent()?;
        if self.stack.len() > 1 {
            return Err(BuildError::structure(format!(
                "document ends with {} unclosed element(s)",
                self.stack.len() - 1
            )));
        }
        if !self.pending_ns.is_empty() {
            return Err(BuildError::structure(
                "namespace declared without a following element",
            ));
        }
        let size = to_u32(self.store.len(), "node table")?;
        if let Some(doc) = self.store.node_mut(0) {
            doc.size = size;
        }
        self.stack.clear();
        self.finished = true;
        Ok(())
    }

    fn start_elem(&mut self, name: &[u8], atts: &AttributeBuffer) -> BuildResult {
        let parent = self.parent()?;
        let depth = self.stack.len();

        // Bindings declared on this element are in scope for its own name
        for (prefix, uri) in self.pending_ns.drain(..) {
            self.scope.declare(prefix, uri, depth);
        }
        let uri = self.resolve(name, false)?;
        let name_id = self.store.names_mut().intern(name);
        let level = to_u32(depth, "depth")?;
        let mut node = Node::new(NodeKind::Element, parent, level).with_name(name_id, uri);
        node.attr_count = to_u32(atts.len(), "attribute list")?;
        let pre = self.store.push(node)?;

        self.indexes.open_element(name);
        for (prefix, uri) in self.scope.declared_at(depth) {
            self.store.add_namespace(pre, prefix, uri);
        }

        for (att_name, value) in atts.iter() {
            let uri = self.resolve(att_name, true)?;
            let name_id = self.store.names_mut().intern(att_name);
            let (start, len) = self.store.add_value(value)?;
            let apre = self.store.push(
                Node::new(NodeKind::Attribute, pre, level + 1)
                    .with_name(name_id, uri)
                    .with_value(start, len),
            )?;
            self.indexes.attribute(apre, att_name, value);
            self.height = self.height.max(depth + 1);
        }

        self.stack.push(pre);
        self.height = self.height.max(depth);
        self.elements += 1;
        Ok(())
    }

    fn end_elem(&mut self, name: &[u8]) -> BuildResult {
        self.parent()?;
        if self.stack.len() < 2 {
            return Err(BuildError::structure(format!(
                "end of element '{}' without open element",
                String::from_utf8_lossy(name)
            )));
        }
        let depth = self.stack.len() - 1;
        let pre = self.stack[depth];
        if self.store.name(pre) != name {
            return Err(BuildError::structure(format!(
                "end tag '{}' does not match open element '{}'",
                String::from_utf8_lossy(name),
                String::from_utf8_lossy(self.store.name(pre))
            )));
        }

        let size = to_u32(self.store.len(), "node table")? - pre;
        if let Some(node) = self.store.node_mut(pre) {
            node.size = size;
        }
        self.stack.pop();
        self.scope.leave(depth);
        self.indexes.close_element();
        Ok(())
    }

    fn text(&mut self, content: &[u8], raw: bool) -> BuildResult {
        if content.is_empty() {
            return Ok(());
        }
        let whitespace = content.iter().all(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'));
        // Whitespace outside the root element never forms a text node
        if whitespace && ((self.chop && !raw) || self.stack.len() == 1) {
            self.parent()?;
            return Ok(());
        }
        let pre = self.leaf(NodeKind::Text, content)?;
        self.indexes.text(pre, content);
        Ok(())
    }

    fn comment(&mut self, content: &[u8]) -> BuildResult {
        self.leaf(NodeKind::Comment, content)?;
        self.indexes.other(NodeKind::Comment);
        Ok(())
    }

    fn pi(&mut self, content: &[u8]) -> BuildResult {
        self.leaf(NodeKind::ProcessingInstruction, content)?;
        self.indexes.other(NodeKind::ProcessingInstruction);
        Ok(())
    }

    fn start_ns(&mut self, prefix: &[u8], uri: &[u8]) -> BuildResult {
        self.parent()?;
        let names = self.store.names_mut();
        let prefix = names.intern(prefix);
        let uri = names.intern(uri);
        self.pending_ns.push((prefix, uri));
        Ok(())
    }
}
