//! Identifier-aware tokenizer shared by the in-memory sparse index and the
//! dedup stage's shingling.

use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, Default)]
pub struct CodeTokenizer;

impl CodeTokenizer {
    pub fn new() -> Self {
        Self
    }

    fn split_camel_case(s: &str) -> Vec<String> {
        let mut result = Vec::new();
        let mut current = String::new();
        let chars: Vec<char> = s.chars().collect();

        for i in 0..chars.len() {
            let ch = chars[i];
            let should_split = if i > 0 {
                let prev = chars[i - 1];
                (prev.is_lowercase() && ch.is_uppercase())
                    || (i + 1 < chars.len()
                        && prev.is_uppercase()
                        && ch.is_uppercase()
                        && chars[i + 1].is_lowercase())
            } else {
                false
            };

            if should_split && !current.is_empty() {
                result.push(current.clone());
                current.clear();
            }
            current.push(ch);
        }

        if !current.is_empty() {
            result.push(current);
        }
        result
    }
}

impl bm25::Tokenizer for CodeTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        for word in text.unicode_words() {
            for part in word.split('_') {
                if part.is_empty() {
                    continue;
                }
                for subpart in Self::split_camel_case(part) {
                    if !subpart.is_empty() {
                        tokens.push(subpart.to_lowercase());
                    }
                }
            }
        }
        tokens
    }
}

/// Standalone tokenize helper, used outside the `bm25::Tokenizer` trait
/// boundary (e.g. by the dedup stage).
pub fn tokenize(text: &str) -> Vec<String> {
    bm25::Tokenizer::tokenize(&CodeTokenizer, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_splits_into_words() {
        assert_eq!(tokenize("get_user_name"), vec!["get", "user", "name"]);
    }

    #[test]
    fn camel_case_splits_into_words() {
        assert_eq!(tokenize("getUserName"), vec!["get", "user", "name"]);
    }

    #[test]
    fn uppercase_acronym_splits_correctly() {
        assert_eq!(tokenize("HTTPResponse"), vec!["http", "response"]);
    }

    #[test]
    fn empty_input_yields_no_tokens() {
        assert!(tokenize("").is_empty());
    }
}
