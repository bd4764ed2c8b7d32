//! Push Parser
//!
//! Incremental XML parser driven by byte chunks of any size. Complete
//! constructs are reported to a `SaxHandler` as soon as they are in the
//! buffer; an incomplete construct at the end of a chunk stays buffered
//! until the next `feed`.
//!
//! ## Chunking
//!
//! Character data is reported as it arrives, so one text node may reach
//! the handler as several `characters` calls, and a chunk boundary may
//! split a multi-byte UTF-8 sequence between two calls. Entity references
//! are reported as separate calls carrying their replacement text.
//!
//! ## Namespaces
//!
//! `xmlns` and `xmlns:p` attributes are reported through
//! `start_prefix_mapping` immediately before their element's start and are
//! not part of the element's attribute list.

use super::attributes::{is_name_char, is_name_start_char, parse_attributes};
use super::dtd::{find_doctype_end, parse_doctype, DtdItem};
use super::entities::EntityExpander;
use crate::config::ParserConfig;
use crate::error::{ParseError, Result};
use crate::sax::handler::{CharData, SaxHandler};
use memchr::{memchr, memchr2, memmem};

/// Where in the document the parser is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// Before the root element
    Prolog,
    /// Inside the root element
    Content,
    /// After the root element
    Epilog,
}

/// Openings of the `<!` constructs
const MARKUP_DECLS: [&[u8]; 3] = [b"<!--", b"<![CDATA[", b"<!DOCTYPE"];

/// Outcome of scanning one construct
enum Step {
    /// Construct handled; continue at this buffer position
    Advance(usize),
    /// Input ends inside a construct starting at this position
    Wait(usize),
}

/// Incremental XML parser
pub struct PushParser {
    /// Unconsumed input
    buffer: Vec<u8>,
    /// Absolute input position of `buffer[0]`
    base: usize,
    stage: Stage,
    started: bool,
    finished: bool,
    /// Names of open elements
    open: Vec<Vec<u8>>,
    entities: EntityExpander,
    seen_doctype: bool,
    /// Encoding named in the XML declaration
    encoding: Option<String>,
    /// Replacement text of the current entity reference
    scratch: Vec<u8>,
}

impl PushParser {
    /// Create a parser with the given configuration
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            buffer: Vec::with_capacity(config.chunk_size.min(1 << 20)),
            base: 0,
            stage: Stage::Prolog,
            started: false,
            finished: false,
            open: Vec::with_capacity(32),
            entities: EntityExpander::new(config.entity_expansion_limit)
                .with_passthrough(!config.entities),
            seen_doctype: false,
            encoding: None,
            scratch: Vec::new(),
        }
    }

    /// Encoding declared in the XML declaration, if any
    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    /// Number of input bytes consumed so far
    pub fn position(&self) -> usize {
        self.base
    }

    /// Number of currently open elements
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Entity references expanded so far
    pub fn expanded_entities(&self) -> usize {
        self.entities.expanded()
    }

    /// Feed the next chunk of input
    pub fn feed<H: SaxHandler>(&mut self, chunk: &[u8], handler: &mut H) -> Result<()> {
        if self.finished {
            return Err(ParseError::event("input fed after finish"));
        }
        if !self.started {
            self.started = true;
            handler.start_document()?;
        }
        self.buffer.extend_from_slice(chunk);
        self.process(handler, false)
    }

    /// Signal the end of input
    pub fn finish<H: SaxHandler>(&mut self, handler: &mut H) -> Result<()> {
        if self.finished {
            return Err(ParseError::event("parser already finished"));
        }
        if !self.started {
            self.started = true;
            handler.start_document()?;
        }
        self.process(handler, true)?;
        if let Some(name) = self.open.last() {
            return Err(ParseError::syntax(
                format!("element '{}' is not closed", String::from_utf8_lossy(name)),
                self.base,
            ));
        }
        if self.stage != Stage::Epilog {
            return Err(ParseError::syntax("document has no root element", self.base));
        }
        self.finished = true;
        handler.end_document()
    }

    /// Scan the buffer and drop what was consumed
    fn process<H: SaxHandler>(&mut self, handler: &mut H, last: bool) -> Result<()> {
        let buf = std::mem::take(&mut self.buffer);
        let scanned = self.scan(&buf, handler, last);
        self.buffer = buf;
        let consumed = scanned?;
        if last && consumed < self.buffer.len() {
            return Err(ParseError::syntax(
                "unexpected end of input",
                self.base + consumed,
            ));
        }
        self.buffer.drain(..consumed);
        self.base += consumed;
        Ok(())
    }

    fn scan<H: SaxHandler>(&mut self, buf: &[u8], handler: &mut H, last: bool) -> Result<usize> {
        let mut pos = 0;
        while pos < buf.len() {
            let step = if buf[pos] == b'<' {
                self.scan_markup(buf, pos, handler, last)?
            } else {
                self.scan_text(buf, pos, handler, last)?
            };
            match step {
                Step::Advance(next) => pos = next,
                Step::Wait(at) => return Ok(at),
            }
        }
        Ok(pos)
    }

    // ========================================================================
    // Character data
    // ========================================================================

    fn scan_text<H: SaxHandler>(
        &mut self,
        buf: &[u8],
        pos: usize,
        handler: &mut H,
        last: bool,
    ) -> Result<Step> {
        let end = memchr2(b'<', b'&', &buf[pos..]).map_or(buf.len(), |i| pos + i);

        if end > pos {
            let mut text_end = end;
            // A trailing CR may be the first half of a CRLF pair
            if end == buf.len() && !last && buf[end - 1] == b'\r' {
                text_end -= 1;
            }
            if text_end > pos {
                self.characters(&buf[pos..text_end], pos, handler)?;
            }
            if text_end < end {
                return Ok(Step::Wait(text_end));
            }
        }

        if end < buf.len() && buf[end] == b'&' {
            return self.scan_reference(buf, end, handler, last);
        }
        Ok(Step::Advance(end))
    }

    /// Report raw character data, normalizing line ends
    fn characters<H: SaxHandler>(&mut self, text: &[u8], pos: usize, handler: &mut H) -> Result<()> {
        if self.stage != Stage::Content {
            if let Some(i) = text.iter().position(|b| !is_whitespace(*b)) {
                return Err(ParseError::syntax(
                    "text is not allowed outside the root element",
                    self.base + pos + i,
                ));
            }
            return Ok(());
        }
        self.emit_text(text, handler)
    }

    /// Forward character data with CRLF and lone CR turned into LF
    fn emit_text<H: SaxHandler>(&mut self, text: &[u8], handler: &mut H) -> Result<()> {
        if memchr(b'\r', text).is_none() {
            return handler.characters(CharData::Utf8(text));
        }
        self.scratch.clear();
        let mut iter = text.iter().copied().peekable();
        while let Some(b) = iter.next() {
            if b == b'\r' {
                self.scratch.push(b'\n');
                if iter.peek() == Some(&b'\n') {
                    iter.next();
                }
            } else {
                self.scratch.push(b);
            }
        }
        handler.characters(CharData::Utf8(&self.scratch))
    }

    fn scan_reference<H: SaxHandler>(
        &mut self,
        buf: &[u8],
        pos: usize,
        handler: &mut H,
        last: bool,
    ) -> Result<Step> {
        let Some(semi) = memchr(b';', &buf[pos..]) else {
            return self.incomplete(pos, last, "unterminated entity reference");
        };
        let name = &buf[pos + 1..pos + semi];
        let valid = match name.split_first() {
            Some((b'#', rest)) => !rest.is_empty() && rest.iter().all(u8::is_ascii_alphanumeric),
            Some((&first, rest)) => is_name_start_char(first) && rest.iter().all(|&b| is_name_char(b)),
            None => false,
        };
        if !valid {
            return Err(ParseError::syntax("malformed entity reference", self.base + pos));
        }
        if self.stage != Stage::Content {
            return Err(ParseError::syntax(
                "entity reference outside the root element",
                self.base + pos,
            ));
        }

        self.scratch.clear();
        self.entities.expand_reference(name, &mut self.scratch)?;
        handler.characters(CharData::Utf8(&self.scratch))?;
        Ok(Step::Advance(pos + semi + 1))
    }

    // ========================================================================
    // Markup
    // ========================================================================

    fn scan_markup<H: SaxHandler>(
        &mut self,
        buf: &[u8],
        pos: usize,
        handler: &mut H,
        last: bool,
    ) -> Result<Step> {
        let rest = &buf[pos..];
        if rest.len() < 2 {
            return self.incomplete(pos, last, "unexpected end of input in markup");
        }
        match rest[1] {
            b'/' => self.scan_end_tag(buf, pos, handler, last),
            b'?' => self.scan_pi(buf, pos, handler, last),
            b'!' => {
                for prefix in MARKUP_DECLS {
                    if rest.len() < prefix.len() && prefix.starts_with(rest) {
                        return self.incomplete(pos, last, "unexpected end of input in markup");
                    }
                }
                if rest.starts_with(b"<!--") {
                    self.scan_comment(buf, pos, handler, last)
                } else if rest.starts_with(b"<![CDATA[") {
                    self.scan_cdata(buf, pos, handler, last)
                } else if rest.starts_with(b"<!DOCTYPE") {
                    self.scan_doctype(buf, pos, handler, last)
                } else {
                    Err(ParseError::syntax("unknown markup declaration", self.base + pos))
                }
            }
            c if is_name_start_char(c) => self.scan_start_tag(buf, pos, handler, last),
            _ => Err(ParseError::syntax("invalid character after '<'", self.base + pos + 1)),
        }
    }

    fn scan_start_tag<H: SaxHandler>(
        &mut self,
        buf: &[u8],
        pos: usize,
        handler: &mut H,
        last: bool,
    ) -> Result<Step> {
        let Some(gt) = find_tag_end(buf, pos + 1) else {
            return self.incomplete(pos, last, "unterminated start tag");
        };
        match self.stage {
            Stage::Prolog => self.stage = Stage::Content,
            Stage::Content => {}
            Stage::Epilog => {
                return Err(ParseError::syntax(
                    "only one root element is allowed",
                    self.base + pos,
                ))
            }
        }

        let mut tag = &buf[pos + 1..gt];
        let empty = tag.last() == Some(&b'/');
        if empty {
            tag = &tag[..tag.len() - 1];
        }
        let name_len = tag.iter().take_while(|&&b| is_name_char(b)).count();
        let name = &tag[..name_len];
        let offset = self.base + pos + 1 + name_len;
        let mut attrs = parse_attributes(&tag[name_len..], offset, &mut self.entities)?;

        for (i, attr) in attrs.iter().enumerate() {
            if attrs[..i].iter().any(|a| a.name == attr.name) {
                return Err(ParseError::syntax(
                    format!(
                        "attribute '{}' specified twice",
                        String::from_utf8_lossy(attr.name)
                    ),
                    offset,
                ));
            }
        }
        for attr in &attrs {
            if let Some(prefix) = attr.declared_prefix() {
                handler.start_prefix_mapping(prefix, &attr.value)?;
            }
        }
        attrs.retain(|a| a.declared_prefix().is_none());

        handler.start_element(name, &attrs)?;
        if empty {
            handler.end_element(name)?;
            if self.open.is_empty() {
                self.stage = Stage::Epilog;
            }
        } else {
            self.open.push(name.to_vec());
        }
        Ok(Step::Advance(gt + 1))
    }

    fn scan_end_tag<H: SaxHandler>(
        &mut self,
        buf: &[u8],
        pos: usize,
        handler: &mut H,
        last: bool,
    ) -> Result<Step> {
        let Some(gt) = memchr(b'>', &buf[pos..]).map(|i| pos + i) else {
            return self.incomplete(pos, last, "unterminated end tag");
        };
        let name = trim_end(&buf[pos + 2..gt]);
        match self.open.pop() {
            Some(open) if open == name => {}
            Some(open) => {
                return Err(ParseError::syntax(
                    format!(
                        "end tag '{}' does not match start tag '{}'",
                        String::from_utf8_lossy(name),
                        String::from_utf8_lossy(&open)
                    ),
                    self.base + pos,
                ))
            }
            None => {
                return Err(ParseError::syntax(
                    format!("unexpected end tag '{}'", String::from_utf8_lossy(name)),
                    self.base + pos,
                ))
            }
        }
        handler.end_element(name)?;
        if self.open.is_empty() {
            self.stage = Stage::Epilog;
        }
        Ok(Step::Advance(gt + 1))
    }

    fn scan_pi<H: SaxHandler>(
        &mut self,
        buf: &[u8],
        pos: usize,
        handler: &mut H,
        last: bool,
    ) -> Result<Step> {
        let Some(end) = memmem::find(&buf[pos + 2..], b"?>").map(|i| pos + 2 + i) else {
            return self.incomplete(pos, last, "unterminated processing instruction");
        };
        let body = &buf[pos + 2..end];
        let target_len = body.iter().take_while(|&&b| is_name_char(b)).count();
        let target = &body[..target_len];
        if target.is_empty() || !is_name_start_char(target[0]) {
            return Err(ParseError::syntax(
                "invalid processing instruction target",
                self.base + pos + 2,
            ));
        }
        let data = trim_start(&body[target_len..]);

        if target.eq_ignore_ascii_case(b"xml") {
            if self.base + pos != 0 {
                return Err(ParseError::syntax(
                    "XML declaration is only allowed at the start of the document",
                    self.base + pos,
                ));
            }
            self.xml_declaration(data, pos)?;
        } else {
            handler.processing_instruction(target, data)?;
        }
        Ok(Step::Advance(end + 2))
    }

    /// Record the declared encoding
    fn xml_declaration(&mut self, data: &[u8], pos: usize) -> Result<()> {
        let Some(at) = memmem::find(data, b"encoding") else {
            return Ok(());
        };
        let rest = trim_start(&data[at + 8..]);
        let rest = rest
            .strip_prefix(b"=")
            .map(trim_start)
            .ok_or_else(|| ParseError::syntax("malformed XML declaration", self.base + pos))?;
        let quote = rest.first().copied().filter(|&q| q == b'"' || q == b'\'');
        let value = quote
            .and_then(|q| memchr(q, &rest[1..]).map(|len| &rest[1..1 + len]))
            .ok_or_else(|| ParseError::syntax("malformed XML declaration", self.base + pos))?;

        let name = String::from_utf8_lossy(value).to_ascii_uppercase();
        if !matches!(
            name.as_str(),
            "UTF-8" | "UTF8" | "US-ASCII" | "ASCII" | "UTF-16" | "UTF-16LE" | "UTF-16BE"
        ) {
            return Err(ParseError::Encoding(format!("unsupported encoding '{}'", name)));
        }
        self.encoding = Some(name);
        Ok(())
    }

    fn scan_comment<H: SaxHandler>(
        &mut self,
        buf: &[u8],
        pos: usize,
        handler: &mut H,
        last: bool,
    ) -> Result<Step> {
        let Some(end) = memmem::find(&buf[pos + 4..], b"-->").map(|i| pos + 4 + i) else {
            return self.incomplete(pos, last, "unterminated comment");
        };
        let content = &buf[pos + 4..end];
        if memmem::find(content, b"--").is_some() || content.last() == Some(&b'-') {
            return Err(ParseError::syntax(
                "'--' is not allowed inside a comment",
                self.base + pos,
            ));
        }
        handler.comment(content)?;
        Ok(Step::Advance(end + 3))
    }

    fn scan_cdata<H: SaxHandler>(
        &mut self,
        buf: &[u8],
        pos: usize,
        handler: &mut H,
        last: bool,
    ) -> Result<Step> {
        if self.stage != Stage::Content {
            return Err(ParseError::syntax(
                "CDATA section outside the root element",
                self.base + pos,
            ));
        }
        let Some(end) = memmem::find(&buf[pos + 9..], b"]]>").map(|i| pos + 9 + i) else {
            return self.incomplete(pos, last, "unterminated CDATA section");
        };
        self.emit_text(&buf[pos + 9..end], handler)?;
        Ok(Step::Advance(end + 3))
    }

    fn scan_doctype<H: SaxHandler>(
        &mut self,
        buf: &[u8],
        pos: usize,
        handler: &mut H,
        last: bool,
    ) -> Result<Step> {
        if self.stage != Stage::Prolog || self.seen_doctype {
            return Err(ParseError::syntax(
                "DOCTYPE is only allowed once, before the root element",
                self.base + pos,
            ));
        }
        let Some(end) = find_doctype_end(buf, pos) else {
            return self.incomplete(pos, last, "unterminated DOCTYPE declaration");
        };
        self.seen_doctype = true;

        let doctype = parse_doctype(&buf[pos + 9..end], self.base + pos + 9)?;
        handler.start_dtd(doctype.name, doctype.public_id, doctype.system_id)?;
        for item in &doctype.items {
            match *item {
                DtdItem::Entity { name, value } => self.entities.declare(name, value),
                DtdItem::Comment(text) => handler.comment(text)?,
                DtdItem::ProcessingInstruction { target, data } => {
                    handler.processing_instruction(target, data)?
                }
            }
        }
        handler.end_dtd()?;
        Ok(Step::Advance(end + 1))
    }

    /// Wait for more input, or fail if there is none
    fn incomplete(&self, pos: usize, last: bool, message: &str) -> Result<Step> {
        if last {
            Err(ParseError::syntax(message, self.base + pos))
        } else {
            Ok(Step::Wait(pos))
        }
    }
}

/// Find the `>` closing a start tag, skipping quoted attribute values
fn find_tag_end(buf: &[u8], from: usize) -> Option<usize> {
    let mut pos = from;
    while pos < buf.len() {
        let i = pos + memchr::memchr3(b'>', b'"', b'\'', &buf[pos..])?;
        match buf[i] {
            b'>' => return Some(i),
            quote => pos = i + 1 + memchr(quote, &buf[i + 1..])? + 1,
        }
    }
    None
}

#[inline]
fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

fn trim_start(s: &[u8]) -> &[u8] {
    let start = s.iter().take_while(|&&b| is_whitespace(b)).count();
    &s[start..]
}

fn trim_end(s: &[u8]) -> &[u8] {
    let trailing = s.iter().rev().take_while(|&&b| is_whitespace(b)).count();
    &s[..s.len() - trailing]
}
