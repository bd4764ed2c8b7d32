//! SAX Collector
//!
//! Implements `SaxHandler` by recording owned events, so a parse can be
//! inspected afterwards or replayed into another handler.

use super::handler::{CharData, SaxHandler};
use crate::core::attributes::Attribute;
use crate::error::{ParseError, Result};

/// An owned SAX event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaxEvent {
    StartDocument,
    EndDocument,
    /// Element name and attributes in source order
    StartElement(Vec<u8>, Vec<(Vec<u8>, Vec<u8>)>),
    EndElement(Vec<u8>),
    /// One `characters` call
    Text(Vec<u8>),
    Comment(Vec<u8>),
    /// Target and data
    Pi(Vec<u8>, Vec<u8>),
    /// Prefix and URI
    PrefixMapping(Vec<u8>, Vec<u8>),
    StartDtd(Vec<u8>),
    EndDtd,
}

impl SaxEvent {
    /// Element start with string attributes
    pub fn start(name: &str, attrs: &[(&str, &str)]) -> Self {
        SaxEvent::StartElement(
            name.as_bytes().to_vec(),
            attrs
                .iter()
                .map(|(n, v)| (n.as_bytes().to_vec(), v.as_bytes().to_vec()))
                .collect(),
        )
    }

    pub fn end(name: &str) -> Self {
        SaxEvent::EndElement(name.as_bytes().to_vec())
    }

    pub fn text(text: &str) -> Self {
        SaxEvent::Text(text.as_bytes().to_vec())
    }

    /// Check if this is a start element event
    #[inline]
    pub fn is_start_element(&self) -> bool {
        matches!(self, SaxEvent::StartElement(..))
    }

    /// Check if this is a text event
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self, SaxEvent::Text(_))
    }
}

/// Collector that gathers SAX events during parsing
#[derive(Debug, Default)]
pub struct SaxCollector {
    /// Collected events
    pub events: Vec<SaxEvent>,
}

impl SaxCollector {
    /// Create a new collector
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(256),
        }
    }

    /// Get number of collected events
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Events with adjacent text events merged
    ///
    /// The result does not depend on how the input was chunked.
    pub fn coalesced(&self) -> Vec<SaxEvent> {
        let mut out: Vec<SaxEvent> = Vec::with_capacity(self.events.len());
        for event in &self.events {
            match (out.last_mut(), event) {
                (Some(SaxEvent::Text(prev)), SaxEvent::Text(next)) => prev.extend_from_slice(next),
                _ => out.push(event.clone()),
            }
        }
        out
    }

    /// Send the collected events to another handler
    pub fn replay<H: SaxHandler>(&self, handler: &mut H) -> Result<()> {
        self.replay_split(handler, usize::MAX)
    }

    /// Like `replay`, but deliver text in pieces of at most `max` bytes
    ///
    /// Pieces may end inside a multi-byte UTF-8 sequence.
    pub fn replay_split<H: SaxHandler>(&self, handler: &mut H, max: usize) -> Result<()> {
        let max = max.max(1);
        for event in &self.events {
            match event {
                SaxEvent::StartDocument => handler.start_document()?,
                SaxEvent::EndDocument => handler.end_document()?,
                SaxEvent::StartElement(name, attrs) => {
                    let attrs: Vec<Attribute<'_>> = attrs
                        .iter()
                        .map(|(n, v)| Attribute::new(n, v.as_slice()))
                        .collect();
                    handler.start_element(name, &attrs)?;
                }
                SaxEvent::EndElement(name) => handler.end_element(name)?,
                SaxEvent::Text(text) => {
                    for piece in text.chunks(max) {
                        handler.characters(CharData::Utf8(piece))?;
                    }
                }
                SaxEvent::Comment(text) => handler.comment(text)?,
                SaxEvent::Pi(target, data) => handler.processing_instruction(target, data)?,
                SaxEvent::PrefixMapping(prefix, uri) => handler.start_prefix_mapping(prefix, uri)?,
                SaxEvent::StartDtd(name) => handler.start_dtd(name, None, None)?,
                SaxEvent::EndDtd => handler.end_dtd()?,
            }
        }
        Ok(())
    }
}

impl SaxHandler for SaxCollector {
    fn start_document(&mut self) -> Result<()> {
        self.events.push(SaxEvent::StartDocument);
        Ok(())
    }

    fn end_document(&mut self) -> Result<()> {
        self.events.push(SaxEvent::EndDocument);
        Ok(())
    }

    fn start_element(&mut self, name: &[u8], attrs: &[Attribute<'_>]) -> Result<()> {
        let attrs = attrs
            .iter()
            .map(|a| (a.name.to_vec(), a.value.to_vec()))
            .collect();
        self.events.push(SaxEvent::StartElement(name.to_vec(), attrs));
        Ok(())
    }

    fn end_element(&mut self, name: &[u8]) -> Result<()> {
        self.events.push(SaxEvent::EndElement(name.to_vec()));
        Ok(())
    }

    fn characters(&mut self, chunk: CharData<'_>) -> Result<()> {
        if chunk.is_empty() {
            return Ok(());
        }
        let bytes = match chunk {
            CharData::Utf8(bytes) => bytes.to_vec(),
            CharData::Utf16(units) => String::from_utf16(units)
                .map_err(|_| ParseError::Encoding("unpaired surrogate in text".to_owned()))?
                .into_bytes(),
        };
        self.events.push(SaxEvent::Text(bytes));
        Ok(())
    }

    fn comment(&mut self, text: &[u8]) -> Result<()> {
        self.events.push(SaxEvent::Comment(text.to_vec()));
        Ok(())
    }

    fn processing_instruction(&mut self, target: &[u8], data: &[u8]) -> Result<()> {
        self.events.push(SaxEvent::Pi(target.to_vec(), data.to_vec()));
        Ok(())
    }

    fn start_prefix_mapping(&mut self, prefix: &[u8], uri: &[u8]) -> Result<()> {
        self.events
            .push(SaxEvent::PrefixMapping(prefix.to_vec(), uri.to_vec()));
        Ok(())
    }

    fn start_dtd(
        &mut self,
        name: &[u8],
        _public_id: Option<&[u8]>,
        _system_id: Option<&[u8]>,
    ) -> Result<()> {
        self.events.push(SaxEvent::StartDtd(name.to_vec()));
        Ok(())
    }

    fn end_dtd(&mut self) -> Result<()> {
        self.events.push(SaxEvent::EndDtd);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::recording::{Call, RecordingBuilder};
    use crate::sax::adapter::SaxAdapter;

    fn sample() -> SaxCollector {
        let mut c = SaxCollector::new();
        c.start_document().unwrap();
        c.start_element(b"a", &[Attribute::new(b"k", &b"v"[..])]).unwrap();
        c.characters("h€".into()).unwrap();
        c.characters("llo".into()).unwrap();
        c.end_element(b"a").unwrap();
        c.end_document().unwrap();
        c
    }

    #[test]
    fn test_coalesced_merges_text() {
        let events = sample().coalesced();
        assert_eq!(events.len(), 5);
        assert_eq!(events[2], SaxEvent::text("h€llo"));
        assert!(events[1].is_start_element());
    }

    #[test]
    fn test_empty_characters_ignored() {
        let mut c = SaxCollector::new();
        c.characters("".into()).unwrap();
        assert_eq!(c.event_count(), 0);
    }

    #[test]
    fn test_replay_split_into_adapter() {
        // One-byte pieces split the euro sign; the adapter still forwards one text node
        let mut adapter = SaxAdapter::new(RecordingBuilder::new(), "doc");
        sample().replay_split(&mut adapter, 1).unwrap();
        assert_eq!(
            adapter.builder().texts(),
            vec!["h€llo".to_owned()]
        );
        assert_eq!(adapter.builder().calls[1], Call::start_elem("a", &[("k", "v")]));
    }
}
