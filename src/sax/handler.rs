//! Push Parser Callback Interface
//!
//! The fixed capability set every push-based XML source drives: document,
//! element, character data, comment, processing instruction, namespace
//! declaration and DTD bracket events. Consumers depend on this trait only,
//! never on a concrete parser.

use crate::core::attributes::Attribute;
use crate::error::Result;

/// A chunk of character data as delivered by a push source
///
/// Chunk boundaries are arbitrary: a multi-unit code point may be split
/// across two consecutive chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharData<'a> {
    /// UTF-8 code units
    Utf8(&'a [u8]),
    /// UTF-16 code units
    Utf16(&'a [u16]),
}

impl CharData<'_> {
    /// Check if the chunk carries no code units
    pub fn is_empty(&self) -> bool {
        match self {
            CharData::Utf8(bytes) => bytes.is_empty(),
            CharData::Utf16(units) => units.is_empty(),
        }
    }
}

impl<'a> From<&'a str> for CharData<'a> {
    fn from(s: &'a str) -> Self {
        CharData::Utf8(s.as_bytes())
    }
}

/// Trait for receiving push parser events
///
/// Every callback may fail; a failure aborts the current parse.
pub trait SaxHandler {
    /// Called once before any other event
    fn start_document(&mut self) -> Result<()>;

    /// Called once after all other events
    fn end_document(&mut self) -> Result<()>;

    /// Called when an element starts
    ///
    /// # Arguments
    /// * `name` - Qualified element name
    /// * `attrs` - Attributes in source order, namespace declarations excluded
    fn start_element(&mut self, name: &[u8], attrs: &[Attribute<'_>]) -> Result<()>;

    /// Called when an element ends
    fn end_element(&mut self, name: &[u8]) -> Result<()>;

    /// Called for character data, any number of times between two other events
    fn characters(&mut self, chunk: CharData<'_>) -> Result<()>;

    /// Called for comments (content excluding `<!--` and `-->`)
    fn comment(&mut self, text: &[u8]) -> Result<()>;

    /// Called for processing instructions
    fn processing_instruction(&mut self, target: &[u8], data: &[u8]) -> Result<()>;

    /// Called for each namespace declared on the next element, before its start
    fn start_prefix_mapping(&mut self, prefix: &[u8], uri: &[u8]) -> Result<()>;

    /// Called when a DOCTYPE declaration starts (optional, default does nothing)
    fn start_dtd(
        &mut self,
        _name: &[u8],
        _public_id: Option<&[u8]>,
        _system_id: Option<&[u8]>,
    ) -> Result<()> {
        Ok(())
    }

    /// Called when a DOCTYPE declaration ends (optional, default does nothing)
    fn end_dtd(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<H: SaxHandler + ?Sized> SaxHandler for &mut H {
    fn start_document(&mut self) -> Result<()> {
        (**self).start_document()
    }

    fn end_document(&mut self) -> Result<()> {
        (**self).end_document()
    }

    fn start_element(&mut self, name: &[u8], attrs: &[Attribute<'_>]) -> Result<()> {
        (**self).start_element(name, attrs)
    }

    fn end_element(&mut self, name: &[u8]) -> Result<()> {
        (**self).end_element(name)
    }

    fn characters(&mut self, chunk: CharData<'_>) -> Result<()> {
        (**self).characters(chunk)
    }

    fn comment(&mut self, text: &[u8]) -> Result<()> {
        (**self).comment(text)
    }

    fn processing_instruction(&mut self, target: &[u8], data: &[u8]) -> Result<()> {
        (**self).processing_instruction(target, data)
    }

    fn start_prefix_mapping(&mut self, prefix: &[u8], uri: &[u8]) -> Result<()> {
        (**self).start_prefix_mapping(prefix, uri)
    }

    fn start_dtd(
        &mut self,
        name: &[u8],
        public_id: Option<&[u8]>,
        system_id: Option<&[u8]>,
    ) -> Result<()> {
        (**self).start_dtd(name, public_id, system_id)
    }

    fn end_dtd(&mut self) -> Result<()> {
        (**self).end_dtd()
    }
}
