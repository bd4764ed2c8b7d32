//! Parser and Index Configuration
//!
//! Explicit configuration values handed to the parser, the event adapter and
//! the builder at construction time. Nothing here is process-global.

/// Entity expansion limit used unless configured otherwise.
///
/// Large legitimate documents expand far more entities than conservative
/// parser defaults permit, so the default is effectively unbounded.
pub const DEFAULT_ENTITY_EXPANSION_LIMIT: usize = 536_870_912;

/// Chunk size used when `ingest` feeds an in-memory document to the parser
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Settings for the push parser and the event adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// Maximum number of entity references expanded per document
    pub entity_expansion_limit: usize,
    /// Expand entity references (otherwise they pass through as text)
    pub entities: bool,
    /// Drop whitespace-only text nodes
    pub chop: bool,
    /// Size of the chunks `ingest` feeds to the parser
    pub chunk_size: usize,
}

impl ParserConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self {
            entity_expansion_limit: DEFAULT_ENTITY_EXPANSION_LIMIT,
            entities: true,
            chop: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Set the entity expansion limit
    pub fn with_entity_expansion_limit(mut self, limit: usize) -> Self {
        self.entity_expansion_limit = limit;
        self
    }

    /// Enable or disable entity expansion
    pub fn with_entities(mut self, entities: bool) -> Self {
        self.entities = entities;
        self
    }

    /// Enable or disable whitespace chopping
    pub fn with_chop(mut self, chop: bool) -> Self {
        self.chop = chop;
        self
    }

    /// Set the feed chunk size (clamped to at least one byte)
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Maximum length of a text or attribute value entered in the value indexes
pub const DEFAULT_MAX_VALUE_LENGTH: usize = 256;

/// Which secondary indexes the builder populates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexConfig {
    /// Path summary
    pub path: bool,
    /// Text value index
    pub text: bool,
    /// Attribute value index
    pub attr: bool,
    /// Full-text index
    pub ft: bool,
    /// Fuzzy lookups on the full-text index (requires `ft`)
    pub fuzzy: bool,
    /// Values longer than this are not entered in the value indexes
    pub max_value_len: usize,
}

impl IndexConfig {
    /// Path, text and attribute indexes; no full-text index
    pub fn new() -> Self {
        Self {
            path: true,
            text: true,
            attr: true,
            ft: false,
            fuzzy: false,
            max_value_len: DEFAULT_MAX_VALUE_LENGTH,
        }
    }

    /// Every index, including the fuzzy full-text variant
    pub fn all() -> Self {
        Self {
            ft: true,
            fuzzy: true,
            ..Self::new()
        }
    }

    /// No secondary indexes at all
    pub fn none() -> Self {
        Self {
            path: false,
            text: false,
            attr: false,
            ft: false,
            fuzzy: false,
            max_value_len: DEFAULT_MAX_VALUE_LENGTH,
        }
    }

    /// Enable or disable the full-text index
    pub fn with_full_text(mut self, ft: bool, fuzzy: bool) -> Self {
        self.ft = ft;
        self.fuzzy = ft && fuzzy;
        self
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limit_is_unbounded_in_practice() {
        let config = ParserConfig::default();
        assert_eq!(config.entity_expansion_limit, 536_870_912);
        assert!(config.entities);
    }

    #[test]
    fn test_fuzzy_requires_full_text() {
        let config = IndexConfig::new().with_full_text(false, true);
        assert!(!config.fuzzy);

        let config = IndexConfig::new().with_full_text(true, true);
        assert!(config.ft && config.fuzzy);
    }

    #[test]
    fn test_chunk_size_clamped() {
        assert_eq!(ParserConfig::new().with_chunk_size(0).chunk_size, 1);
    }
}
