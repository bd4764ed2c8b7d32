//! Database
//!
//! A finished, immutable database: the node store, its secondary indexes
//! and the metadata describing both. Produced by `MemBuilder::finish`;
//! queries borrow it shared.

pub mod meta;

pub use meta::MetaData;

use crate::error::QueryError;
use crate::index::{FtIndex, Indexes, PathSummary};
use crate::query::ft::{FtExpr, FtIter, FtNodeItem};
use crate::store::NodeStore;

/// Node store, indexes and metadata of one database
#[derive(Debug)]
pub struct Database {
    store: NodeStore,
    indexes: Indexes,
    meta: MetaData,
}

impl Database {
    pub(crate) fn new(store: NodeStore, indexes: Indexes, meta: MetaData) -> Self {
        Self {
            store,
            indexes,
            meta,
        }
    }

    /// The node store
    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    /// The secondary indexes (check `meta()` before trusting them)
    pub fn indexes(&self) -> &Indexes {
        &self.indexes
    }

    /// The metadata descriptor
    pub fn meta(&self) -> &MetaData {
        &self.meta
    }

    /// Mark all indexes as out of date
    pub fn invalidate_indexes(&mut self) {
        if !self.meta.stale_index {
            tracing::debug!(name = %self.meta.name, "indexes invalidated");
        }
        self.meta.stale_index = true;
    }

    /// The full-text index, if it exists and is up to date
    pub fn ft_index(&self, fuzzy: bool) -> Result<&FtIndex, QueryError> {
        if self.meta.stale_index {
            return Err(QueryError::Stale);
        }
        let ft = self
            .indexes
            .ft
            .as_ref()
            .filter(|_| self.meta.ft_index)
            .ok_or(QueryError::MissingIndex("full-text"))?;
        if fuzzy && !(self.meta.ft_fuzzy && ft.is_fuzzy()) {
            return Err(QueryError::MissingIndex("fuzzy full-text"));
        }
        Ok(ft)
    }

    /// The path summary, if it exists and is up to date
    pub fn path_summary(&self) -> Result<&PathSummary, QueryError> {
        if self.meta.stale_index {
            return Err(QueryError::Stale);
        }
        self.indexes
            .path
            .as_ref()
            .filter(|_| self.meta.path_index)
            .ok_or(QueryError::MissingIndex("path"))
    }

    /// Text nodes whose content equals `value`
    pub fn text_lookup(&self, value: &[u8]) -> Result<&[u32], QueryError> {
        if self.meta.stale_index {
            return Err(QueryError::Stale);
        }
        self.indexes
            .text
            .as_ref()
            .filter(|index| self.meta.text_index && index.covers(value))
            .map(|index| index.lookup(value))
            .ok_or(QueryError::MissingIndex("text"))
    }

    /// Attribute nodes whose value equals `value`
    pub fn attr_lookup(&self, value: &[u8]) -> Result<&[u32], QueryError> {
        if self.meta.stale_index {
            return Err(QueryError::Stale);
        }
        self.indexes
            .attr
            .as_ref()
            .filter(|index| self.meta.attr_index && index.covers(value))
            .map(|index| index.lookup(value))
            .ok_or(QueryError::MissingIndex("attribute"))
    }

    /// Evaluate a full-text expression to completion
    pub fn ft_search(&self, expr: &FtExpr) -> Result<Vec<FtNodeItem>, QueryError> {
        expr.iter(self)?.collect_all()
    }

    /// Human-readable database report
    pub fn info(&self) -> String {
        self.meta.info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IndexConfig, ParserConfig};

    fn ingest(doc: &[u8], config: &IndexConfig) -> Database {
        crate::ingest("db", doc, &ParserConfig::default(), config).unwrap()
    }

    #[test]
    fn test_missing_indexes() {
        let db = ingest(b"<r a='x'>v</r>", &IndexConfig::none());
        assert!(matches!(db.path_summary(), Err(QueryError::MissingIndex("path"))));
        assert!(matches!(db.text_lookup(b"v"), Err(QueryError::MissingIndex("text"))));
        assert!(matches!(db.attr_lookup(b"x"), Err(QueryError::MissingIndex("attribute"))));
        assert!(matches!(db.ft_index(false), Err(QueryError::MissingIndex("full-text"))));

        let ft = ingest(b"<r>v</r>", &IndexConfig::none().with_full_text(true, false));
        assert!(ft.ft_index(false).is_ok());
        assert!(matches!(
            ft.ft_index(true),
            Err(QueryError::MissingIndex("fuzzy full-text"))
        ));
    }

    #[test]
    fn test_long_values_not_covered() {
        let long = "x".repeat(crate::config::DEFAULT_MAX_VALUE_LENGTH + 1);
        let doc = format!("<r><a>{}</a><b>short</b></r>", long);
        let db = ingest(doc.as_bytes(), &IndexConfig::new());
        assert_eq!(db.text_lookup(b"short").unwrap().len(), 1);
        assert!(db.text_lookup(b"nothing").unwrap().is_empty());
        assert!(matches!(
            db.text_lookup(long.as_bytes()),
            Err(QueryError::MissingIndex("text"))
        ));
    }

    #[test]
    fn test_invalidate_makes_every_index_stale() {
        let mut db = ingest(b"<r a='x'>v</r>", &IndexConfig::all());
        assert!(db.meta().has_fuzzy_index());
        db.invalidate_indexes();
        db.invalidate_indexes();

        assert!(matches!(db.path_summary(), Err(QueryError::Stale)));
        assert!(matches!(db.attr_lookup(b"x"), Err(QueryError::Stale)));
        assert!(matches!(db.ft_index(false), Err(QueryError::Stale)));
        assert!(!db.meta().has_ft_index());
        assert!(db.indexes().ft.is_some());
    }

    #[test]
    fn test_info_mentions_name_and_size() {
        let db = ingest(b"<r><c/></r>", &IndexConfig::new());
        let info = db.info();
        assert!(info.contains(" Name: db\n"), "{}", info);
        assert!(info.contains(" Nodes: 3\n"), "{}", info);
    }
}
