//! XmlBase - embedded XML database core
//!
//! Ingestion pipeline:
//!
//! ```text
//! bytes --to_utf8--> PushParser --SaxHandler--> SaxAdapter --Builder--> MemBuilder
//!                                                                          |
//!                                      Database { NodeStore, Indexes, MetaData }
//! ```
//!
//! Queries run against the finished `Database`; full-text expressions are
//! evaluated by pull iterators over the full-text index (see `query::ft`).

pub mod build;
pub mod config;
pub mod core;
pub mod data;
pub mod error;
pub mod index;
pub mod query;
pub mod sax;
pub mod store;

pub use build::{Builder, MemBuilder};
pub use config::{IndexConfig, ParserConfig};
pub use core::PushParser;
pub use data::{Database, MetaData};
pub use error::{BuildError, ParseError, QueryError, Result};
pub use query::{FtExpr, FtIter, FtMatch, FtNodeItem};
pub use sax::{SaxAdapter, SaxHandler};
pub use store::{NodeKind, NodeStore};

use crate::core::encoding::{to_utf8, XmlEncoding};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::time::Instant;

/// Parse an in-memory document into a new database called `name`
pub fn ingest(
    name: &str,
    input: &[u8],
    parser: &ParserConfig,
    index: &IndexConfig,
) -> Result<Database> {
    let (utf8, encoding) = to_utf8(input)?;
    let mut ingest = Ingest::new(name, "", input.len() as u64, parser, index);
    for chunk in utf8.chunks(parser.chunk_size.max(1)) {
        ingest.feed(chunk)?;
    }
    ingest.finish(encoding)
}

/// Parse a document file into a new database named after the file
///
/// UTF-8 input is streamed in `chunk_size` pieces; UTF-16 input is read
/// completely and converted first.
pub fn ingest_file(
    path: impl AsRef<Path>,
    parser: &ParserConfig,
    index: &IndexConfig,
) -> Result<Database> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut file = File::open(path)?;
    let file_size = file.metadata()?.len();

    // The first read is large enough to hold any byte order mark
    let mut buf = vec![0; parser.chunk_size.max(4)];
    let len = read_full(&mut file, &mut buf)?;
    let encoding = XmlEncoding::detect(&buf[..len]);
    let source = path.to_string_lossy();
    let mut ingest = Ingest::new(&name, &source, file_size, parser, index);

    if encoding != XmlEncoding::Utf8 {
        buf.truncate(len);
        file.read_to_end(&mut buf)?;
        let (utf8, _) = to_utf8(&buf)?;
        for chunk in utf8.chunks(parser.chunk_size.max(1)) {
            ingest.feed(chunk)?;
        }
        return ingest.finish(encoding);
    }

    let (head, _) = to_utf8(&buf[..len])?;
    ingest.feed(&head)?;
    buf.truncate(parser.chunk_size.max(1));
    loop {
        let len = read_full(&mut file, &mut buf)?;
        if len == 0 {
            break;
        }
        ingest.feed(&buf[..len])?;
    }
    ingest.finish(encoding)
}

/// Fill `buf` as far as the reader allows
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// One running ingestion
struct Ingest {
    adapter: SaxAdapter<MemBuilder>,
    parser: PushParser,
    started: Instant,
}

impl Ingest {
    fn new(
        name: &str,
        source: &str,
        file_size: u64,
        parser: &ParserConfig,
        index: &IndexConfig,
    ) -> Self {
        let mut builder = MemBuilder::new(index).with_chop(parser.chop);
        let meta = builder.meta_mut();
        *meta = MetaData::new(name);
        meta.source = source.to_owned();
        meta.file_size = file_size;
        meta.entity = parser.entities;

        Self {
            adapter: SaxAdapter::new(builder, name),
            parser: PushParser::new(parser),
            started: Instant::now(),
        }
    }

    fn feed(&mut self, chunk: &[u8]) -> Result<()> {
        self.parser.feed(chunk, &mut self.adapter)
    }

    fn finish(mut self, encoding: XmlEncoding) -> Result<Database> {
        self.parser.finish(&mut self.adapter)?;
        let mut builder = self.adapter.into_builder();
        builder.meta_mut().encoding = self
            .parser
            .encoding()
            .unwrap_or_else(|| encoding.name())
            .to_owned();
        let db = builder.finish()?;
        tracing::info!(
            name = %db.meta().name,
            nodes = db.meta().size,
            entities = self.parser.expanded_entities(),
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "database created"
        );
        Ok(db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DOC: &str = "<?xml version=\"1.0\"?>\n\
        <!DOCTYPE lib [<!ENTITY pub \"Acme Press\"><!-- internal -->]>\n\
        <lib xmlns:d=\"urn:dc\">\n\
          <book id=\"b1\"><d:title>Rust in Depth</d:title><by>&pub;</by></book>\n\
          <book id=\"b2\"><d:title>Deep Rust Waters</d:title><!--note--></book>\n\
        </lib>";

    fn ft_config() -> IndexConfig {
        IndexConfig::new().with_full_text(true, true)
    }

    #[test]
    fn test_ingest_builds_store_and_indexes() {
        let db = ingest("lib", DOC.as_bytes(), &ParserConfig::default(), &ft_config()).unwrap();
        let store = db.store();

        assert_eq!(store.kind(0), Some(NodeKind::Document));
        assert_eq!(store.name(1), b"lib");
        assert_eq!(store.namespaces(1).count(), 1);
        assert_eq!(db.meta().name, "lib");
        assert_eq!(db.meta().size, store.len());
        assert!(db.meta().entity);

        let attr = db.attr_lookup(b"b2").unwrap();
        assert_eq!(attr.len(), 1);
        assert_eq!(store.name(attr[0]), b"id");

        let by = db.text_lookup(b"Acme Press").unwrap();
        assert_eq!(by.len(), 1);
        assert_eq!(store.name(store.parent(by[0]).unwrap()), b"by");

        let paths = db.path_summary().unwrap();
        assert_eq!(paths.lookup("/lib/book/d:title").map(|n| n.count), Some(2));
        assert_eq!(paths.lookup("/lib/book/comment()").map(|n| n.count), Some(1));
    }

    #[test]
    fn test_dtd_comment_not_stored() {
        let db = ingest("lib", DOC.as_bytes(), &ParserConfig::default(), &IndexConfig::none())
            .unwrap();
        let store = db.store();
        let comments: Vec<_> = (0..store.len() as u32)
            .filter(|&pre| store.kind(pre) == Some(NodeKind::Comment))
            .map(|pre| store.value(pre).to_vec())
            .collect();
        assert_eq!(comments, vec![b"note".to_vec()]);
    }

    #[test]
    fn test_chunk_size_does_not_change_result() {
        let whole = ingest("lib", DOC.as_bytes(), &ParserConfig::default(), &ft_config()).unwrap();
        for size in [1, 2, 3, 7, 64] {
            let config = ParserConfig::default().with_chunk_size(size);
            let db = ingest("lib", DOC.as_bytes(), &config, &ft_config()).unwrap();
            assert_eq!(db.store().len(), whole.store().len(), "chunk size {}", size);
            assert_eq!(db.store().string_value(0), whole.store().string_value(0));
        }
    }

    #[test]
    fn test_chop_disabled_keeps_whitespace() {
        let chopped = ingest("lib", DOC.as_bytes(), &ParserConfig::default(), &IndexConfig::none())
            .unwrap();
        let config = ParserConfig::default().with_chop(false);
        let kept = ingest("lib", DOC.as_bytes(), &config, &IndexConfig::none()).unwrap();
        assert!(kept.store().len() > chopped.store().len());
        assert!(!kept.meta().chop);
    }

    #[test]
    fn test_full_text_negation() {
        let db = ingest("lib", DOC.as_bytes(), &ParserConfig::default(), &ft_config()).unwrap();

        let hits = db.ft_search(&FtExpr::words("rust")).unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|item| !item.matches.not));

        let negated = db.ft_search(&FtExpr::words("rust").negate()).unwrap();
        let pres: Vec<_> = negated.iter().map(|item| item.pre).collect();
        assert_eq!(pres, hits.iter().map(|item| item.pre).collect::<Vec<_>>());
        assert!(negated.iter().all(|item| item.matches.not));

        let fuzzy = db.ft_search(&FtExpr::fuzzy("watters")).unwrap();
        assert_eq!(fuzzy.len(), 1);
    }

    #[test]
    fn test_query_errors() {
        let mut db = ingest("lib", DOC.as_bytes(), &ParserConfig::default(), &IndexConfig::new())
            .unwrap();
        assert!(matches!(
            db.ft_search(&FtExpr::words("waters")),
            Err(QueryError::MissingIndex(_))
        ));
        db.invalidate_indexes();
        assert!(matches!(db.text_lookup(b"Deep Rust Waters"), Err(QueryError::Stale)));
        assert!(db.info().contains("Indexes are out of date"));
    }

    #[test]
    fn test_entities_disabled_keeps_references() {
        let config = ParserConfig::default().with_entities(false);
        let db = ingest("lib", DOC.as_bytes(), &config, &IndexConfig::new()).unwrap();
        assert_eq!(db.text_lookup(b"&pub;").unwrap().len(), 1);
        assert!(!db.meta().entity);
    }

    #[test]
    fn test_builder_error_aborts_ingest() {
        let err = ingest(
            "bad",
            b"<r><x:a/></r>",
            &ParserConfig::default(),
            &IndexConfig::none(),
        )
        .unwrap_err();
        assert!(matches!(err.build_error(), Some(BuildError::Structure(_))));
    }

    #[test]
    fn test_syntax_error_aborts_ingest() {
        let err = ingest("bad", b"<r>", &ParserConfig::default(), &IndexConfig::none())
            .unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn test_utf16_input() {
        let mut input = vec![0xFF, 0xFE];
        for unit in "<r>é</r>".encode_utf16() {
            input.extend_from_slice(&unit.to_le_bytes());
        }
        let db = ingest("u16", &input, &ParserConfig::default(), &IndexConfig::none()).unwrap();
        assert_eq!(db.store().string_value(1).as_ref(), "é".as_bytes());
        assert_eq!(db.meta().encoding, "UTF-16LE");
        assert_eq!(db.meta().file_size, input.len() as u64);
    }

    #[test]
    fn test_line_ends_stored_normalized() {
        let input = b"<r x=\"a\r\nb\"><![CDATA[a\r\nb]]></r>";
        let db = ingest("crlf", input, &ParserConfig::default(), &IndexConfig::none()).unwrap();
        assert_eq!(db.store().attribute(1, b"x"), Some(&b"a b"[..]));
        assert_eq!(db.store().string_value(1).as_ref(), b"a\nb");
    }

    #[test]
    fn test_ingest_file() {
        let mut file = tempfile::Builder::new().suffix(".xml").tempfile().unwrap();
        file.write_all(DOC.as_bytes()).unwrap();
        file.flush().unwrap();

        let config = ParserConfig::default().with_chunk_size(5);
        let db = ingest_file(file.path(), &config, &IndexConfig::new()).unwrap();
        assert_eq!(db.meta().file_size, DOC.len() as u64);
        assert_eq!(db.meta().source, file.path().to_string_lossy());
        assert_eq!(db.attr_lookup(b"b1").unwrap().len(), 1);
    }

    #[test]
    fn test_missing_file() {
        let err = ingest_file(
            "/nonexistent/doc.xml",
            &ParserConfig::default(),
            &IndexConfig::none(),
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::Io(_)));
    }
}
