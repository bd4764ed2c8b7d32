//! DOCTYPE Declaration Parsing
//!
//! Splits a DOCTYPE declaration into its name, external identifiers and the
//! items of its internal subset. Only what ingestion needs is kept:
//! internal general entities (for expansion) plus the comments and
//! processing instructions the subset contains, so the push parser can
//! report them inside the DTD bracket like any SAX source would.

use super::attributes::{is_name_char, is_name_start_char};
use crate::error::{ParseError, Result};
use memchr::memmem;

/// A parsed DOCTYPE declaration
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Doctype<'a> {
    /// Root element name
    pub name: &'a [u8],
    /// PUBLIC identifier, if any
    pub public_id: Option<&'a [u8]>,
    /// SYSTEM identifier, if any
    pub system_id: Option<&'a [u8]>,
    /// Items of the internal subset, in document order
    pub items: Vec<DtdItem<'a>>,
}

/// One item of the internal subset
#[derive(Debug, PartialEq, Eq)]
pub enum DtdItem<'a> {
    /// `<!ENTITY name "value">`
    Entity { name: &'a [u8], value: &'a [u8] },
    /// `<!-- ... -->`
    Comment(&'a [u8]),
    /// `<?target data?>`
    ProcessingInstruction { target: &'a [u8], data: &'a [u8] },
}

/// Find the `>` closing a DOCTYPE that starts at `from` (at its `<`)
///
/// Quotes, the internal subset brackets and comments inside the subset are
/// skipped. Returns None if the declaration is not complete yet.
pub fn find_doctype_end(buf: &[u8], from: usize) -> Option<usize> {
    let mut pos = from + 2;
    let mut depth = 0usize;
    let mut quote = None;

    while pos < buf.len() {
        let c = buf[pos];
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                b'"' | b'\'' => quote = Some(c),
                b'[' => depth += 1,
                b']' => depth = depth.saturating_sub(1),
                b'<' if buf[pos..].starts_with(b"<!--") => {
                    let end = memmem::find(&buf[pos + 4..], b"-->")?;
                    pos += 4 + end + 2;
                }
                b'>' if depth == 0 => return Some(pos),
                _ => {}
            },
        }
        pos += 1;
    }
    None
}

/// Parse DOCTYPE content (between `<!DOCTYPE` and the closing `>`)
///
/// `offset` is the absolute input position of `content`, used for errors.
pub fn parse_doctype(content: &[u8], offset: usize) -> Result<Doctype<'_>> {
    let mut pos = skip_ws(content, 0);
    let name = read_name(content, &mut pos)
        .ok_or_else(|| ParseError::syntax("DOCTYPE requires a name", offset + pos))?;
    let mut doctype = Doctype {
        name,
        ..Doctype::default()
    };

    pos = skip_ws(content, pos);
    if content[pos..].starts_with(b"PUBLIC") {
        pos += 6;
        doctype.public_id = Some(read_quoted(content, &mut pos, offset)?);
        doctype.system_id = Some(read_quoted(content, &mut pos, offset)?);
    } else if content[pos..].starts_with(b"SYSTEM") {
        pos += 6;
        doctype.system_id = Some(read_quoted(content, &mut pos, offset)?);
    }

    pos = skip_ws(content, pos);
    if content.get(pos) == Some(&b'[') {
        let end = content
            .iter()
            .rposition(|&b| b == b']')
            .filter(|&end| end > pos)
            .ok_or_else(|| ParseError::syntax("unterminated internal subset", offset + pos))?;
        doctype.items = parse_internal_subset(&content[pos + 1..end], offset + pos + 1)?;
    }

    Ok(doctype)
}

/// Parse the declarations of an internal subset
fn parse_internal_subset(subset: &[u8], offset: usize) -> Result<Vec<DtdItem<'_>>> {
    let mut items = Vec::new();
    let mut pos = 0;

    while pos < subset.len() {
        pos = skip_ws(subset, pos);
        let rest = &subset[pos..];
        if rest.is_empty() {
            break;
        }

        if rest.starts_with(b"<!--") {
            let end = memmem::find(&rest[4..], b"-->")
                .ok_or_else(|| ParseError::syntax("unterminated comment", offset + pos))?;
            items.push(DtdItem::Comment(&rest[4..4 + end]));
            pos += 4 + end + 3;
        } else if rest.starts_with(b"<?") {
            let end = memmem::find(rest, b"?>").ok_or_else(|| {
                ParseError::syntax("unterminated processing instruction", offset + pos)
            })?;
            let body = &rest[2..end];
            let mut p = 0;
            let target = read_name(body, &mut p).ok_or_else(|| {
                ParseError::syntax("invalid processing instruction target", offset + pos)
            })?;
            let data = &body[skip_ws(body, p)..];
            items.push(DtdItem::ProcessingInstruction { target, data });
            pos += end + 2;
        } else if rest.starts_with(b"<!ENTITY") {
            let end = find_decl_end(rest)
                .ok_or_else(|| ParseError::syntax("unterminated ENTITY declaration", offset + pos))?;
            if let Some(item) = parse_entity_decl(&rest[8..end], offset + pos)? {
                items.push(item);
            }
            pos += end + 1;
        } else if rest.starts_with(b"<!") {
            // ELEMENT, ATTLIST and NOTATION declarations carry nothing we keep
            let end = find_decl_end(rest)
                .ok_or_else(|| ParseError::syntax("unterminated declaration", offset + pos))?;
            pos += end + 1;
        } else if rest[0] == b'%' {
            // Parameter entity reference
            pos += memchr::memchr(b';', rest).map_or(rest.len(), |semi| semi + 1);
        } else {
            return Err(ParseError::syntax(
                "unexpected content in internal subset",
                offset + pos,
            ));
        }
    }

    Ok(items)
}

/// Parse the body of an ENTITY declaration (after `<!ENTITY`)
///
/// Parameter entities and external entities yield None.
fn parse_entity_decl(body: &[u8], offset: usize) -> Result<Option<DtdItem<'_>>> {
    let mut pos = skip_ws(body, 0);
    if body.get(pos) == Some(&b'%') {
        return Ok(None);
    }
    let name = read_name(body, &mut pos)
        .ok_or_else(|| ParseError::syntax("ENTITY requires a name", offset + pos))?;
    pos = skip_ws(body, pos);
    match body.get(pos) {
        Some(b'"') | Some(b'\'') => {
            let value = read_quoted(body, &mut pos, offset)?;
            Ok(Some(DtdItem::Entity { name, value }))
        }
        _ => Ok(None),
    }
}

/// Find the `>` ending a markup declaration, skipping quoted literals
fn find_decl_end(decl: &[u8]) -> Option<usize> {
    let mut quote = None;
    for (i, &c) in decl.iter().enumerate() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == b'"' || c == b'\'' => quote = Some(c),
            None if c == b'>' => return Some(i),
            None => {}
        }
    }
    None
}

fn read_quoted<'a>(input: &'a [u8], pos: &mut usize, offset: usize) -> Result<&'a [u8]> {
    *pos = skip_ws(input, *pos);
    let quote = match input.get(*pos) {
        Some(&q) if q == b'"' || q == b'\'' => q,
        _ => return Err(ParseError::syntax("expected quoted literal", offset + *pos)),
    };
    let start = *pos + 1;
    let len = memchr::memchr(quote, &input[start..])
        .ok_or_else(|| ParseError::syntax("unterminated literal", offset + start))?;
    *pos = start + len + 1;
    Ok(&input[start..start + len])
}

fn read_name<'a>(input: &'a [u8], pos: &mut usize) -> Option<&'a [u8]> {
    let start = *pos;
    if !input.get(start).copied().is_some_and(is_name_start_char) {
        return None;
    }
    let mut end = start + 1;
    while end < input.len() && is_name_char(input[end]) {
        end += 1;
    }
    *pos = end;
    Some(&input[start..end])
}

fn skip_ws(input: &[u8], mut pos: usize) -> usize {
    while pos < input.len() && matches!(input[pos], b' ' | b'\t' | b'\n' | b'\r') {
        pos += 1;
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_end_skips_subset_and_quotes() {
        let input = b"<!DOCTYPE a [<!ENTITY e \"x>y\"><!-- ]> -->]><a/>";
        let end = find_doctype_end(input, 0).unwrap();
        assert_eq!(&input[end + 1..], b"<a/>");
    }

    #[test]
    fn test_find_end_incomplete() {
        assert_eq!(find_doctype_end(b"<!DOCTYPE a [<!ENTITY", 0), None);
    }

    #[test]
    fn test_external_ids() {
        let dt = parse_doctype(b" html PUBLIC \"-//W3C\" 'x.dtd'", 0).unwrap();
        assert_eq!(dt.name, b"html");
        assert_eq!(dt.public_id, Some(&b"-//W3C"[..]));
        assert_eq!(dt.system_id, Some(&b"x.dtd"[..]));
        assert!(dt.items.is_empty());
    }

    #[test]
    fn test_internal_subset_items() {
        let dt = parse_doctype(
            b" r [\n<!ELEMENT r ANY>\n<!-- hidden -->\n<?pi data?>\n<!ENTITY e 'v'>\n<!ENTITY % p 'q'>\n%p;\n]",
            0,
        )
        .unwrap();
        assert_eq!(
            dt.items,
            vec![
                DtdItem::Comment(b" hidden "),
                DtdItem::ProcessingInstruction { target: b"pi", data: b"data" },
                DtdItem::Entity { name: b"e", value: b"v" },
            ]
        );
    }

    #[test]
    fn test_missing_name() {
        assert!(parse_doctype(b" [", 0).is_err());
    }
}
