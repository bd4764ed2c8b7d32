//! XML Entity Expansion
//!
//! Handles expansion of entity references:
//! - Built-in entities: &lt; &gt; &amp; &quot; &apos;
//! - Numeric character references: &#123; &#x7B;
//! - Internal general entities declared in the DTD internal subset
//!
//! Every expanded reference counts against the configured expansion limit.
//! Uses Cow for zero-copy when no references are present.

use crate::error::{ParseError, Result};
use memchr::memchr;
use std::borrow::Cow;
use std::collections::HashMap;

/// Nesting depth at which declared entities are assumed to recurse
const MAX_NESTING: usize = 64;

/// Expands entity references with a per-document expansion budget
#[derive(Debug)]
pub struct EntityExpander {
    /// Internal general entities: name -> replacement text
    declared: HashMap<Vec<u8>, Vec<u8>>,
    /// References expanded so far
    expanded: usize,
    /// Maximum number of expansions
    limit: usize,
    /// Keep references to declared entities as literal text
    passthrough: bool,
}

impl EntityExpander {
    /// Create an expander with the given expansion limit
    pub fn new(limit: usize) -> Self {
        Self {
            declared: HashMap::new(),
            expanded: 0,
            limit,
            passthrough: false,
        }
    }

    /// Leave references to DTD-declared entities unexpanded
    ///
    /// Predefined entities and character references are still decoded.
    pub fn with_passthrough(mut self, passthrough: bool) -> Self {
        self.passthrough = passthrough;
        self
    }

    /// Declare an internal general entity. The first declaration wins.
    pub fn declare(&mut self, name: &[u8], value: &[u8]) {
        self.declared
            .entry(name.to_vec())
            .or_insert_with(|| value.to_vec());
    }

    /// Check whether an entity has been declared
    pub fn is_declared(&self, name: &[u8]) -> bool {
        self.declared.contains_key(name)
    }

    /// Number of references expanded so far
    pub fn expanded(&self) -> usize {
        self.expanded
    }

    /// Expand a single reference (without `&` and `;`) into `out`
    ///
    /// Fails for undeclared entities, invalid character references and
    /// when the expansion limit is exhausted.
    pub fn expand_reference(&mut self, entity: &[u8], out: &mut Vec<u8>) -> Result<()> {
        self.expand_nested(entity, out, 0)
    }

    fn expand_nested(&mut self, entity: &[u8], out: &mut Vec<u8>, depth: usize) -> Result<()> {
        if self.passthrough && !entity.starts_with(b"#") && predefined(entity).is_none() {
            out.push(b'&');
            out.extend_from_slice(entity);
            out.push(b';');
            return Ok(());
        }

        self.expanded += 1;
        if self.expanded > self.limit {
            return Err(ParseError::Entity(format!(
                "entity expansion limit of {} exceeded",
                self.limit
            )));
        }

        if let Some(rest) = entity.strip_prefix(b"#") {
            let c = decode_char_ref(rest).ok_or_else(|| {
                ParseError::Entity(format!(
                    "invalid character reference '&{};'",
                    String::from_utf8_lossy(entity)
                ))
            })?;
            let mut utf8 = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
            return Ok(());
        }

        if let Some(text) = predefined(entity) {
            out.extend_from_slice(text);
            return Ok(());
        }

        if depth >= MAX_NESTING {
            return Err(ParseError::Entity(format!(
                "entity '{}' references itself",
                String::from_utf8_lossy(entity)
            )));
        }

        let value = match self.declared.get(entity) {
            Some(value) => value.clone(),
            None => {
                return Err(ParseError::Entity(format!(
                    "undeclared entity '{}'",
                    String::from_utf8_lossy(entity)
                )))
            }
        };
        self.expand_text(&value, out, depth + 1)
    }

    /// Expand every reference in `input`, appending the result to `out`
    fn expand_text(&mut self, input: &[u8], out: &mut Vec<u8>, depth: usize) -> Result<()> {
        let mut pos = 0;
        while let Some(amp) = memchr(b'&', &input[pos..]) {
            out.extend_from_slice(&input[pos..pos + amp]);
            pos += amp;
            match memchr(b';', &input[pos..]) {
                Some(semi) => {
                    self.expand_nested(&input[pos + 1..pos + semi], out, depth)?;
                    pos += semi + 1;
                }
                None => {
                    // No semicolon found, keep the ampersand
                    out.push(b'&');
                    pos += 1;
                }
            }
        }
        out.extend_from_slice(&input[pos..]);
        Ok(())
    }

    /// Decode attribute or text content, handling entity references
    ///
    /// Returns Borrowed if no references are present (zero-copy).
    pub fn decode<'a>(&mut self, input: &'a [u8]) -> Result<Cow<'a, [u8]>> {
        if memchr(b'&', input).is_none() {
            return Ok(Cow::Borrowed(input));
        }
        let mut out = Vec::with_capacity(input.len());
        self.expand_text(input, &mut out, 0)?;
        Ok(Cow::Owned(out))
    }
}

impl Default for EntityExpander {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_ENTITY_EXPANSION_LIMIT)
    }
}

/// Replacement text of the five predefined entities
pub fn predefined(entity: &[u8]) -> Option<&'static [u8]> {
    match entity {
        b"lt" => Some(b"<"),
        b"gt" => Some(b">"),
        b"amp" => Some(b"&"),
        b"quot" => Some(b"\""),
        b"apos" => Some(b"'"),
        _ => None,
    }
}

/// Decode a numeric character reference (after the `#`)
fn decode_char_ref(entity: &[u8]) -> Option<char> {
    if entity.is_empty() {
        return None;
    }

    let codepoint = if entity[0] == b'x' || entity[0] == b'X' {
        // Hexadecimal: &#xHHHH;
        let hex = std::str::from_utf8(&entity[1..]).ok()?;
        u32::from_str_radix(hex, 16).ok()?
    } else {
        // Decimal: &#DDDD;
        let dec = std::str::from_utf8(entity).ok()?;
        dec.parse::<u32>().ok()?
    };

    if !is_valid_xml_char(codepoint) {
        return None;
    }
    char::from_u32(codepoint)
}

/// Check if a code point is a valid XML 1.0 Char
/// Char ::= #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]
#[inline]
pub fn is_valid_xml_char(codepoint: u32) -> bool {
    matches!(codepoint,
        0x9 | 0xA | 0xD |
        0x20..=0xD7FF |
        0xE000..=0xFFFD |
        0x10000..=0x10FFFF
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(expander: &mut EntityExpander, input: &[u8]) -> Vec<u8> {
        expander.decode(input).unwrap().into_owned()
    }

    #[test]
    fn test_no_entities() {
        let mut expander = EntityExpander::default();
        let result = expander.decode(b"Hello, World!").unwrap();
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(expander.expanded(), 0);
    }

    #[test]
    fn test_basic_entities() {
        let mut expander = EntityExpander::default();
        let result = expand(&mut expander, b"&lt;hello&gt; &amp; &quot;world&quot;");
        assert_eq!(result, b"<hello> & \"world\"");
        assert_eq!(expander.expanded(), 5);
    }

    #[test]
    fn test_numeric_references() {
        let mut expander = EntityExpander::default();
        assert_eq!(expand(&mut expander, b"&#65;&#x42;&#X43;"), b"ABC");
        assert_eq!(expand(&mut expander, b"&#x1F600;"), "😀".as_bytes());
    }

    #[test]
    fn test_invalid_char_ref() {
        let mut expander = EntityExpander::default();
        assert!(matches!(
            expander.decode(b"&#0;"),
            Err(ParseError::Entity(_))
        ));
    }

    #[test]
    fn test_declared_entities_nest() {
        let mut expander = EntityExpander::default();
        expander.declare(b"name", b"Ac");
        expander.declare(b"full", b"&name;me &amp; co");
        expander.declare(b"name", b"ignored");
        assert_eq!(expand(&mut expander, b"[&full;]"), b"[Acme & co]");
    }

    #[test]
    fn test_undeclared_entity() {
        let mut expander = EntityExpander::default();
        let err = expander.decode(b"&unknown;").unwrap_err();
        assert_eq!(err.to_string(), "entity error: undeclared entity 'unknown'");
    }

    #[test]
    fn test_recursive_entity() {
        let mut expander = EntityExpander::default();
        expander.declare(b"a", b"&b;");
        expander.declare(b"b", b"&a;");
        assert!(expander.decode(b"&a;").is_err());
    }

    #[test]
    fn test_passthrough_keeps_references() {
        let mut expander = EntityExpander::default().with_passthrough(true);
        expander.declare(b"name", b"Ac");
        assert_eq!(expand(&mut expander, b"&name;X &amp; &unknown; &#65;"), b"&name;X & &unknown; A");
    }

    #[test]
    fn test_expansion_limit() {
        let mut expander = EntityExpander::new(3);
        expander.declare(b"lol", b"&amp;&amp;&amp;");
        let err = expander.decode(b"&lol;").unwrap_err();
        assert!(err.to_string().contains("limit of 3"));
    }
}
