//! Event Adapter
//!
//! Sits between a push parser and a `Builder`, turning erratically chunked
//! parser callbacks into one builder call per node, in document order.
//!
//! ## Flush discipline
//!
//! Character data and namespace declarations are buffered. Every
//! structural event except document start first flushes:
//!
//! ```text
//! pending text       --> Builder::text      (exactly one call, if any)
//! pending namespaces --> Builder::start_ns  (one call per pair, in order)
//! structural event   --> Builder::start_elem / end_elem / comment / pi / end_doc
//! ```
//!
//! Text goes first so it closes the previous sibling region before the
//! declarations that belong to the next element are registered.
//!
//! Comments and processing instructions reported between `start_dtd` and
//! `end_dtd` never reach the builder.

use super::attributes::AttributeBuffer;
use super::handler::{CharData, SaxHandler};
use super::text::TextAccumulator;
use crate::build::Builder;
use crate::core::attributes::Attribute;
use crate::error::{ParseError, Result};

/// Adapter from push parser callbacks to builder calls
pub struct SaxAdapter<B: Builder> {
    /// Builder reference
    builder: B,
    /// Document name passed to `Builder::start_doc`
    name: Vec<u8>,
    /// Reusable attribute list for element starts
    atts: AttributeBuffer,
    /// Text node being assembled
    text: TextAccumulator,
    /// Namespaces declared since the last flush
    namespaces: Vec<(Vec<u8>, Vec<u8>)>,
    /// Inside the DOCTYPE declaration
    dtd: bool,
    /// Document started / ended
    started: bool,
    ended: bool,
    /// Open elements
    depth: usize,
    /// Elements forwarded so far
    nodes: usize,
    /// Comments and PIs suppressed inside the DTD
    dropped: usize,
}

impl<B: Builder> SaxAdapter<B> {
    /// Create an adapter feeding `builder` with a document called `name`
    pub fn new(builder: B, name: impl Into<Vec<u8>>) -> Self {
        Self {
            builder,
            name: name.into(),
            atts: AttributeBuffer::new(),
            text: TextAccumulator::new(),
            namespaces: Vec::new(),
            dtd: false,
            started: false,
            ended: false,
            depth: 0,
            nodes: 0,
            dropped: 0,
        }
    }

    /// The wrapped builder
    pub fn builder(&self) -> &B {
        &self.builder
    }

    /// Consume the adapter, returning the builder
    pub fn into_builder(self) -> B {
        self.builder
    }

    /// Number of elements forwarded to the builder
    pub fn nodes(&self) -> usize {
        self.nodes
    }

    /// Check whether the adapter is currently inside a DOCTYPE declaration
    pub fn in_dtd(&self) -> bool {
        self.dtd
    }

    /// Forward pending text, then pending namespace declarations
    fn flush(&mut self) -> Result<()> {
        if !self.text.is_empty() {
            self.text.ensure_complete()?;
            tracing::trace!(len = self.text.as_bytes().len(), "flushing text node");
            self.builder.text(self.text.as_bytes(), false)?;
            self.text.clear();
        }
        for (prefix, uri) in self.namespaces.drain(..) {
            self.builder.start_ns(&prefix, &uri)?;
        }
        Ok(())
    }

    fn ensure_open(&self, event: &str) -> Result<()> {
        if !self.started {
            return Err(ParseError::event(format!("{} before document start", event)));
        }
        if self.ended {
            return Err(ParseError::event(format!("{} after document end", event)));
        }
        Ok(())
    }
}

impl<B: Builder> SaxHandler for SaxAdapter<B> {
    fn start_document(&mut self) -> Result<()> {
        if self.started {
            return Err(ParseError::event("document started twice"));
        }
        self.started = true;
        tracing::debug!(name = %String::from_utf8_lossy(&self.name), "document start");
        self.builder.start_doc(&self.name)?;
        Ok(())
    }

    fn end_document(&mut self) -> Result<()> {
        self.ensure_open("document end")?;
        if self.depth != 0 {
            return Err(ParseError::event(format!(
                "document ended with {} open element(s)",
                self.depth
            )));
        }
        self.flush()?;
        self.builder.end_doc()?;
        self.ended = true;
        if self.dropped > 0 {
            tracing::warn!(dropped = self.dropped, "ignored comments/PIs inside the DTD");
        }
        tracing::debug!(elements = self.nodes, "document end");
        Ok(())
    }

    fn start_element(&mut self, name: &[u8], attrs: &[Attribute<'_>]) -> Result<()> {
        self.ensure_open("element start")?;
        self.flush()?;
        self.atts.reset();
        for attr in attrs {
            self.atts.add(attr.name, &attr.value);
        }
        self.builder.start_elem(name, &self.atts)?;
        self.depth += 1;
        self.nodes += 1;
        Ok(())
    }

    fn end_element(&mut self, name: &[u8]) -> Result<()> {
        self.ensure_open("element end")?;
        if self.depth == 0 {
            return Err(ParseError::event(format!(
                "end of element {} without matching start",
                String::from_utf8_lossy(name)
            )));
        }
        self.flush()?;
        self.builder.end_elem(name)?;
        self.depth -= 1;
        Ok(())
    }

    fn characters(&mut self, chunk: CharData<'_>) -> Result<()> {
        self.ensure_open("character data")?;
        self.text.push(chunk)
    }

    fn comment(&mut self, text: &[u8]) -> Result<()> {
        if self.dtd {
            self.dropped += 1;
            return Ok(());
        }
        self.ensure_open("comment")?;
        self.flush()?;
        self.builder.comment(text)?;
        Ok(())
    }

    fn processing_instruction(&mut self, target: &[u8], data: &[u8]) -> Result<()> {
        if self.dtd {
            self.dropped += 1;
            return Ok(());
        }
        self.ensure_open("processing instruction")?;
        self.flush()?;
        let mut content = Vec::with_capacity(target.len() + 1 + data.len());
        content.extend_from_slice(target);
        content.push(b' ');
        content.extend_from_slice(data);
        self.builder.pi(&content)?;
        Ok(())
    }

    fn start_prefix_mapping(&mut self, prefix: &[u8], uri: &[u8]) -> Result<()> {
        self.ensure_open("namespace declaration")?;
        self.namespaces.push((prefix.to_vec(), uri.to_vec()));
        Ok(())
    }

    fn start_dtd(
        &mut self,
        _name: &[u8],
        _public_id: Option<&[u8]>,
        _system_id: Option<&[u8]>,
    ) -> Result<()> {
        self.dtd = true;
        Ok(())
    }

    fn end_dtd(&mut self) -> Result<()> {
        self.dtd = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::recording::{Call, RecordingBuilder};
    use crate::error::BuildError;

    fn adapter() -> SaxAdapter<RecordingBuilder> {
        SaxAdapter::new(RecordingBuilder::new(), "doc")
    }

    fn text(s: &str) -> Call {
        Call::Text(s.as_bytes().to_vec())
    }

    #[test]
    fn test_scenario_text_coalescing() {
        let mut a = adapter();
        a.start_document().unwrap();
        a.start_element(b"a", &[]).unwrap();
        a.characters("ab".into()).unwrap();
        a.characters("cd".into()).unwrap();
        a.end_element(b"a").unwrap();
        a.end_document().unwrap();

        assert_eq!(
            a.builder().calls,
            vec![
                Call::start_doc("doc"),
                Call::start_elem("a", &[]),
                text("abcd"),
                Call::end_elem("a"),
                Call::EndDoc,
            ]
        );
    }

    #[test]
    fn test_scenario_namespace_before_element() {
        let mut a = adapter();
        a.start_document().unwrap();
        a.start_prefix_mapping(b"x", b"urn:x").unwrap();
        a.start_element(b"a", &[]).unwrap();

        assert_eq!(
            a.builder().calls[1..],
            [Call::start_ns("x", "urn:x"), Call::start_elem("a", &[])]
        );
    }

    #[test]
    fn test_scenario_dtd_suppression() {
        let mut a = adapter();
        a.start_document().unwrap();
        a.start_dtd(b"r", None, None).unwrap();
        a.comment(b"hidden").unwrap();
        a.processing_instruction(b"pi", b"hidden").unwrap();
        a.end_dtd().unwrap();
        a.comment(b"visible").unwrap();

        let comments: Vec<_> = a
            .builder()
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Comment(_) | Call::Pi(_)))
            .collect();
        assert_eq!(comments, vec![&Call::Comment(b"visible".to_vec())]);
    }

    #[test]
    fn test_text_flushed_before_namespaces() {
        let mut a = adapter();
        a.start_document().unwrap();
        a.start_element(b"r", &[]).unwrap();
        a.characters("t".into()).unwrap();
        a.start_prefix_mapping(b"p", b"urn:p").unwrap();
        a.start_prefix_mapping(b"q", b"urn:q").unwrap();
        a.start_element(b"p:e", &[]).unwrap();

        assert_eq!(
            a.builder().calls[2..],
            [
                text("t"),
                Call::start_ns("p", "urn:p"),
                Call::start_ns("q", "urn:q"),
                Call::start_elem("p:e", &[]),
            ]
        );
    }

    #[test]
    fn test_attributes_in_source_order() {
        let mut a = adapter();
        a.start_document().unwrap();
        a.start_element(
            b"e",
            &[
                Attribute::new(b"b", &b"1"[..]),
                Attribute::new(b"a", &b"2"[..]),
                Attribute::new(b"b", &b"3"[..]),
            ],
        )
        .unwrap();
        a.start_element(b"f", &[Attribute::new(b"z", &b"9"[..])]).unwrap();

        assert_eq!(
            a.builder().calls[1..],
            [
                Call::start_elem("e", &[("b", "1"), ("a", "2"), ("b", "3")]),
                Call::start_elem("f", &[("z", "9")]),
            ]
        );
    }

    #[test]
    fn test_pi_content_joined() {
        let mut a = adapter();
        a.start_document().unwrap();
        a.processing_instruction(b"target", b"some data").unwrap();
        assert_eq!(a.builder().calls[1], Call::Pi(b"target some data".to_vec()));
    }

    #[test]
    fn test_empty_text_not_forwarded() {
        let mut a = adapter();
        a.start_document().unwrap();
        a.start_element(b"a", &[]).unwrap();
        a.characters("".into()).unwrap();
        a.end_element(b"a").unwrap();
        assert!(!a.builder().calls.iter().any(|c| matches!(c, Call::Text(_))));
    }

    #[test]
    fn test_split_code_point_across_chunks() {
        let bytes = "€".as_bytes();
        let mut a = adapter();
        a.start_document().unwrap();
        a.start_element(b"a", &[]).unwrap();
        a.characters(CharData::Utf8(&bytes[..1])).unwrap();
        a.characters(CharData::Utf8(&bytes[1..])).unwrap();
        a.end_element(b"a").unwrap();
        assert_eq!(a.builder().calls[2], text("€"));
    }

    #[test]
    fn test_incomplete_code_point_fails_at_flush() {
        let mut a = adapter();
        a.start_document().unwrap();
        a.start_element(b"a", &[]).unwrap();
        a.characters(CharData::Utf16(&[0xD83D])).unwrap();
        assert!(matches!(a.end_element(b"a"), Err(ParseError::Encoding(_))));
    }

    #[test]
    fn test_builder_failure_translated() {
        let mut a = SaxAdapter::new(RecordingBuilder::failing_at(1), "doc");
        a.start_document().unwrap();
        let err = a.start_element(b"a", &[]).unwrap_err();
        assert!(matches!(err.build_error(), Some(BuildError::Io(_))));
        assert_eq!(err.to_string(), "I/O error: injected failure");
    }

    #[test]
    fn test_event_order_enforced() {
        let mut a = adapter();
        assert!(a.start_element(b"a", &[]).is_err());
        a.start_document().unwrap();
        assert!(a.start_document().is_err());
        assert!(a.end_element(b"a").is_err());
        a.start_element(b"a", &[]).unwrap();
        assert!(a.end_document().is_err());
        a.end_element(b"a").unwrap();
        a.end_document().unwrap();
        assert!(a.comment(b"late").is_err());
        assert_eq!(a.nodes(), 1);
    }
}
