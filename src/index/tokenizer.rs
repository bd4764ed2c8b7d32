//! Full-Text Tokenizer
//!
//! Splits text into word tokens on Unicode word boundaries (UAX #29) and
//! case-folds them. Indexing and query evaluation share this tokenizer, so
//! a query word matches exactly the tokens the index recorded for it.

use unicode_segmentation::UnicodeSegmentation;

/// Tokens longer than this (in bytes) are truncated at a char boundary
pub const MAX_TOKEN_LENGTH: usize = 256;

/// Iterate over the normalized tokens of `text`
///
/// The position of a token is its index in this sequence.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.unicode_words().map(normalize)
}

/// Tokenize raw node content, replacing invalid UTF-8
pub fn tokenize_bytes(text: &[u8]) -> Vec<String> {
    tokenize(&String::from_utf8_lossy(text)).collect()
}

fn normalize(word: &str) -> String {
    let mut token = word.to_lowercase();
    if token.len() > MAX_TOKEN_LENGTH {
        let mut end = MAX_TOKEN_LENGTH;
        while !token.is_char_boundary(end) {
            end -= 1;
        }
        token.truncate(end);
    }
    token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_and_case() {
        let tokens: Vec<_> = tokenize("Hello, World! It's 2024.").collect();
        assert_eq!(tokens, vec!["hello", "world", "it's", "2024"]);
    }

    #[test]
    fn test_unicode() {
        let tokens: Vec<_> = tokenize("Grüße aus Zürich").collect();
        assert_eq!(tokens, vec!["grüße", "aus", "zürich"]);
    }

    #[test]
    fn test_punctuation_only() {
        assert_eq!(tokenize(" -- ... ").count(), 0);
    }

    #[test]
    fn test_long_token_truncated() {
        let long = "é".repeat(200);
        let tokens = tokenize_bytes(long.as_bytes());
        assert!(tokens[0].len() <= MAX_TOKEN_LENGTH);
        assert!(tokens[0].chars().all(|c| c == 'é'));
    }
}
