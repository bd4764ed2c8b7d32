//! XML Encoding Detection and Conversion
//!
//! Detects UTF-16 input from its byte order mark (or the `<` pattern of an
//! unmarked document) and converts it to UTF-8 before parsing. UTF-8 input
//! is passed through without copying, minus its BOM.

use crate::error::{ParseError, Result};
use std::borrow::Cow;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Encoding of raw XML input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl XmlEncoding {
    /// Detect encoding from byte order mark or initial bytes
    pub fn detect(input: &[u8]) -> Self {
        match input {
            [0xFF, 0xFE, ..] | [b'<', 0x00, ..] => XmlEncoding::Utf16Le,
            [0xFE, 0xFF, ..] | [0x00, b'<', ..] => XmlEncoding::Utf16Be,
            _ => XmlEncoding::Utf8,
        }
    }

    /// Canonical encoding name
    pub fn name(self) -> &'static str {
        match self {
            XmlEncoding::Utf8 => "UTF-8",
            XmlEncoding::Utf16Le => "UTF-16LE",
            XmlEncoding::Utf16Be => "UTF-16BE",
        }
    }
}

/// Convert input to UTF-8, returning the detected source encoding
///
/// Invalid UTF-16 is an encoding error; UTF-8 is validated by the parser
/// as character data is reported.
pub fn to_utf8(input: &[u8]) -> Result<(Cow<'_, [u8]>, XmlEncoding)> {
    let encoding = XmlEncoding::detect(input);
    let converted = match encoding {
        XmlEncoding::Utf8 => Cow::Borrowed(input.strip_prefix(UTF8_BOM).unwrap_or(input)),
        XmlEncoding::Utf16Le => Cow::Owned(decode_utf16(input, [0xFF, 0xFE], u16::from_le_bytes)?),
        XmlEncoding::Utf16Be => Cow::Owned(decode_utf16(input, [0xFE, 0xFF], u16::from_be_bytes)?),
    };
    Ok((converted, encoding))
}

fn decode_utf16(input: &[u8], bom: [u8; 2], unit: fn([u8; 2]) -> u16) -> Result<Vec<u8>> {
    let bytes = input.strip_prefix(&bom[..]).unwrap_or(input);
    if bytes.len() % 2 != 0 {
        return Err(ParseError::Encoding(
            "UTF-16 input has an odd number of bytes".into(),
        ));
    }

    let mut out = Vec::with_capacity(bytes.len());
    let units = bytes.chunks_exact(2).map(|c| unit([c[0], c[1]]));
    let mut utf8 = [0u8; 4];
    for c in char::decode_utf16(units) {
        let c = c.map_err(|e| {
            ParseError::Encoding(format!(
                "unpaired UTF-16 surrogate 0x{:04X}",
                e.unpaired_surrogate()
            ))
        })?;
        out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }
    Ok(out)
}
