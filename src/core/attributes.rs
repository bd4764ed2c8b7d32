//! XML Attribute Parsing
//!
//! Parses XML attributes from tag content, expanding entity references in
//! values and normalizing literal whitespace characters to spaces.

use super::entities::EntityExpander;
use crate::error::{ParseError, Result};
use memchr::memchr;
use std::borrow::Cow;

/// A parsed XML attribute as reported by the parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute<'a> {
    /// Attribute name (may include namespace prefix)
    pub name: &'a [u8],
    /// Attribute value (entities expanded)
    pub value: Cow<'a, [u8]>,
}

impl<'a> Attribute<'a> {
    /// Create a new attribute
    pub fn new(name: &'a [u8], value: impl Into<Cow<'a, [u8]>>) -> Self {
        Attribute {
            name,
            value: value.into(),
        }
    }

    /// Namespace prefix (before colon), if any
    pub fn prefix(&self) -> Option<&'a [u8]> {
        split_name(self.name).0
    }

    /// Local name (after colon)
    pub fn local_name(&self) -> &'a [u8] {
        split_name(self.name).1
    }

    /// The prefix this attribute binds if it is a namespace declaration
    ///
    /// `xmlns="..."` binds the empty prefix, `xmlns:p="..."` binds `p`.
    pub fn declared_prefix(&self) -> Option<&'a [u8]> {
        match self.name {
            b"xmlns" => Some(b""),
            name => name.strip_prefix(b"xmlns:"),
        }
    }
}

/// Split a name into prefix and local name at the colon
pub fn split_name(name: &[u8]) -> (Option<&[u8]>, &[u8]) {
    if let Some(colon_pos) = memchr(b':', name) {
        (Some(&name[..colon_pos]), &name[colon_pos + 1..])
    } else {
        (None, name)
    }
}

/// Parse attributes from raw tag content (after the element name)
///
/// `offset` is the absolute input position of `input`, used for errors.
pub fn parse_attributes<'a>(
    input: &'a [u8],
    offset: usize,
    entities: &mut EntityExpander,
) -> Result<Vec<Attribute<'a>>> {
    let mut attrs = Vec::new();
    let mut pos = 0;

    loop {
        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }
        if pos >= input.len() {
            return Ok(attrs);
        }

        let name_start = pos;
        if !is_name_start_char(input[pos]) {
            return Err(ParseError::syntax(
                "attribute name must start with letter, underscore, or colon",
                offset + pos,
            ));
        }
        while pos < input.len() && is_name_char(input[pos]) {
            pos += 1;
        }
        let name = &input[name_start..pos];

        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }
        if input.get(pos) != Some(&b'=') {
            return Err(ParseError::syntax(
                format!("expected '=' after attribute {}", String::from_utf8_lossy(name)),
                offset + pos,
            ));
        }
        pos += 1;
        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }

        let quote = match input.get(pos) {
            Some(&q) if q == b'"' || q == b'\'' => q,
            _ => {
                return Err(ParseError::syntax(
                    "attribute value must be quoted",
                    offset + pos,
                ))
            }
        };
        pos += 1;
        let value_start = pos;
        let value_len = memchr(quote, &input[pos..]).ok_or_else(|| {
            ParseError::syntax("unterminated attribute value", offset + value_start)
        })?;
        let raw = &input[value_start..value_start + value_len];
        pos = value_start + value_len + 1;

        if raw.contains(&b'<') {
            return Err(ParseError::syntax(
                "'<' not allowed in attribute value",
                offset + value_start,
            ));
        }

        let value = match normalize_whitespace(raw) {
            Cow::Borrowed(raw) => entities.decode(raw)?,
            Cow::Owned(normalized) => Cow::Owned(entities.decode(&normalized)?.into_owned()),
        };
        attrs.push(Attribute { name, value });
    }
}

/// Replace literal tabs and line ends with spaces; CRLF counts as one line end
fn normalize_whitespace(raw: &[u8]) -> Cow<'_, [u8]> {
    if !raw.iter().any(|&b| matches!(b, b'\t' | b'\n' | b'\r')) {
        return Cow::Borrowed(raw);
    }
    let mut out = Vec::with_capacity(raw.len());
    let mut iter = raw.iter().copied().peekable();
    while let Some(b) = iter.next() {
        match b {
            b'\r' => {
                out.push(b' ');
                if iter.peek() == Some(&b'\n') {
                    iter.next();
                }
            }
            b'\t' | b'\n' => out.push(b' '),
            _ => out.push(b),
        }
    }
    Cow::Owned(out)
}

#[inline]
fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

/// Check if byte is valid XML name start character
#[inline]
pub fn is_name_start_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

/// Check if byte is valid XML name character
#[inline]
pub fn is_name_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.' | b':') || b >= 0x80
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &[u8]) -> Result<Vec<Attribute<'_>>> {
        parse_attributes(input, 0, &mut EntityExpander::default())
    }

    #[test]
    fn test_source_order_and_duplicates_kept() {
        let attrs = parse(b" b=\"2\" a='1' b=\"3\"").unwrap();
        let pairs: Vec<_> = attrs.iter().map(|a| (a.name, a.value.as_ref())).collect();
        assert_eq!(
            pairs,
            vec![(&b"b"[..], &b"2"[..]), (&b"a"[..], &b"1"[..]), (&b"b"[..], &b"3"[..])]
        );
    }

    #[test]
    fn test_entities_and_whitespace() {
        let attrs = parse(b"v=\"a&amp;b\tc\"").unwrap();
        assert_eq!(attrs[0].value.as_ref(), b"a&b c");
    }

    #[test]
    fn test_line_ends_become_one_space() {
        let attrs = parse(b"x=\"a\r\nb\" y=\"c\rd\ne\"").unwrap();
        assert_eq!(attrs[0].value.as_ref(), b"a b");
        assert_eq!(attrs[1].value.as_ref(), b"c d e");
    }

    #[test]
    fn test_namespace_declarations() {
        let attrs = parse(b"xmlns=\"urn:d\" xmlns:x=\"urn:x\" x:y=\"1\"").unwrap();
        assert_eq!(attrs[0].declared_prefix(), Some(&b""[..]));
        assert_eq!(attrs[1].declared_prefix(), Some(&b"x"[..]));
        assert_eq!(attrs[2].declared_prefix(), None);
        assert_eq!(attrs[2].prefix(), Some(&b"x"[..]));
        assert_eq!(attrs[2].local_name(), b"y");
    }

    #[test]
    fn test_malformed() {
        assert!(parse(b"a").is_err());
        assert!(parse(b"a=1").is_err());
        assert!(parse(b"a=\"1").is_err());
        assert!(parse(b"a=\"<\"").is_err());
    }
}
