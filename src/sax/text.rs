//! Pending Text Accumulator
//!
//! Collects the character chunks of the text node currently being
//! assembled. Chunks arrive as UTF-8 or UTF-16 code units with arbitrary
//! boundaries; a code point split across two chunks is held back until its
//! remaining units arrive, so the accumulated text is always whole code
//! points encoded as UTF-8.

use crate::error::{ParseError, Result};
use crate::sax::handler::CharData;

/// A code point whose remaining code units have not arrived yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Partial {
    None,
    /// Leading bytes of a UTF-8 sequence and how many are present
    Utf8 { bytes: [u8; 4], len: u8 },
    /// A UTF-16 high surrogate waiting for its low half
    Utf16(u16),
}

/// Code-point aware text buffer
#[derive(Debug)]
pub struct TextAccumulator {
    /// Complete UTF-8 text
    text: Vec<u8>,
    partial: Partial,
}

impl TextAccumulator {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self {
            text: Vec::with_capacity(1024),
            partial: Partial::None,
        }
    }

    /// Append a chunk of character data
    pub fn push(&mut self, chunk: CharData<'_>) -> Result<()> {
        match chunk {
            CharData::Utf8(bytes) => self.push_utf8(bytes),
            CharData::Utf16(units) => self.push_utf16(units),
        }
    }

    fn push_utf8(&mut self, mut bytes: &[u8]) -> Result<()> {
        match self.partial {
            Partial::None => {}
            Partial::Utf8 { bytes: mut head, len } => {
                let len = len as usize;
                let need = utf8_width(head[0]) - len;
                let take = need.min(bytes.len());
                head[len..len + take].copy_from_slice(&bytes[..take]);
                bytes = &bytes[take..];

                let len = len + take;
                if take < need {
                    self.partial = Partial::Utf8 { bytes: head, len: len as u8 };
                    return Ok(());
                }
                let s = std::str::from_utf8(&head[..len])
                    .map_err(|_| ParseError::Encoding("invalid UTF-8 sequence".into()))?;
                self.text.extend_from_slice(s.as_bytes());
                self.partial = Partial::None;
            }
            Partial::Utf16(_) => {
                return Err(ParseError::Encoding(
                    "UTF-8 data after unpaired UTF-16 surrogate".into(),
                ))
            }
        }

        match std::str::from_utf8(bytes) {
            Ok(s) => self.text.extend_from_slice(s.as_bytes()),
            Err(e) => {
                let valid = e.valid_up_to();
                self.text.extend_from_slice(&bytes[..valid]);
                if e.error_len().is_some() {
                    return Err(ParseError::Encoding("invalid UTF-8 sequence".into()));
                }
                // Truncated sequence at the end of the chunk
                let tail = &bytes[valid..];
                let mut head = [0u8; 4];
                head[..tail.len()].copy_from_slice(tail);
                self.partial = Partial::Utf8 {
                    bytes: head,
                    len: tail.len() as u8,
                };
            }
        }
        Ok(())
    }

    fn push_utf16(&mut self, units: &[u16]) -> Result<()> {
        if units.is_empty() {
            return Ok(());
        }
        let pending = match self.partial {
            Partial::None => None,
            Partial::Utf16(high) => Some(high),
            Partial::Utf8 { .. } => {
                return Err(ParseError::Encoding(
                    "UTF-16 data after incomplete UTF-8 sequence".into(),
                ))
            }
        };
        self.partial = Partial::None;

        // Hold back a trailing high surrogate until its low half arrives
        let (units, trailing) = match units.split_last() {
            Some((&last, rest)) if is_high_surrogate(last) => (rest, Some(last)),
            _ => (units, None),
        };

        let mut utf8 = [0u8; 4];
        for c in char::decode_utf16(pending.into_iter().chain(units.iter().copied())) {
            let c = c.map_err(|e| {
                ParseError::Encoding(format!(
                    "unpaired UTF-16 surrogate 0x{:04X}",
                    e.unpaired_surrogate()
                ))
            })?;
            self.text
                .extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
        }

        if let Some(high) = trailing {
            self.partial = Partial::Utf16(high);
        }
        Ok(())
    }

    /// Check if no text (complete or partial) has been accumulated
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.partial == Partial::None
    }

    /// The complete text accumulated so far
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.text
    }

    /// Fail if a code point is still waiting for code units
    pub fn ensure_complete(&self) -> Result<()> {
        match self.partial {
            Partial::None => Ok(()),
            Partial::Utf8 { .. } => Err(ParseError::Encoding(
                "text ends with an incomplete UTF-8 sequence".into(),
            )),
            Partial::Utf16(high) => Err(ParseError::Encoding(format!(
                "text ends with unpaired UTF-16 surrogate 0x{:04X}",
                high
            ))),
        }
    }

    /// Reset to empty, keeping the allocation
    pub fn clear(&mut self) {
        self.text.clear();
        self.partial = Partial::None;
    }
}

impl Default for TextAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Width of a UTF-8 sequence given its leading byte
#[inline]
fn utf8_width(lead: u8) -> usize {
    match lead {
        0xF0..=0xF7 => 4,
        0xE0..=0xEF => 3,
        0xC0..=0xDF => 2,
        _ => 1,
    }
}

#[inline]
fn is_high_surrogate(unit: u16) -> bool {
    (0xD800..=0xDBFF).contains(&unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    #[test]
    fn test_concatenates_chunks() {
        let mut acc = TextAccumulator::new();
        acc.push("ab".into()).unwrap();
        acc.push("cd".into()).unwrap();
        assert_eq!(acc.as_bytes(), b"abcd");
    }

    #[test]
    fn test_utf8_split_in_every_position() {
        let text = "a€😀b";
        let bytes = text.as_bytes();
        for split in 0..=bytes.len() {
            let mut acc = TextAccumulator::new();
            acc.push(CharData::Utf8(&bytes[..split])).unwrap();
            acc.push(CharData::Utf8(&bytes[split..])).unwrap();
            acc.ensure_complete().unwrap();
            assert_eq!(acc.as_bytes(), bytes, "split at {}", split);
        }
    }

    #[test]
    fn test_utf8_one_byte_at_a_time() {
        let bytes = "😀".as_bytes();
        let mut acc = TextAccumulator::new();
        for b in bytes {
            acc.push(CharData::Utf8(std::slice::from_ref(b))).unwrap();
        }
        acc.ensure_complete().unwrap();
        assert_eq!(acc.as_bytes(), bytes);
    }

    #[test]
    fn test_utf16_surrogate_pair_split() {
        let units = utf16("x😀y");
        let mut acc = TextAccumulator::new();
        acc.push(CharData::Utf16(&units[..2])).unwrap();
        assert!(acc.ensure_complete().is_err());
        acc.push(CharData::Utf16(&units[2..])).unwrap();
        acc.ensure_complete().unwrap();
        assert_eq!(acc.as_bytes(), "x😀y".as_bytes());
    }

    #[test]
    fn test_utf16_unpaired_surrogate() {
        let mut acc = TextAccumulator::new();
        assert!(acc.push(CharData::Utf16(&[0xDC00, 0x41])).is_err());

        let mut acc = TextAccumulator::new();
        acc.push(CharData::Utf16(&[0xD800])).unwrap();
        assert!(acc.push(CharData::Utf16(&[0x41])).is_err());
    }

    #[test]
    fn test_invalid_utf8() {
        let mut acc = TextAccumulator::new();
        assert!(acc.push(CharData::Utf8(&[b'a', 0xFF, b'b'])).is_err());
    }

    #[test]
    fn test_clear_resets_partial() {
        let mut acc = TextAccumulator::new();
        acc.push(CharData::Utf8(&[0xE2, 0x82])).unwrap();
        assert!(!acc.is_empty());
        acc.clear();
        assert!(acc.is_empty());
        acc.ensure_complete().unwrap();
    }
}
