//! Text analysis shared by every engine.
//!
//! Text is split on any non-alphanumeric character and lowercased. This is
//! the same pipeline as Tantivy's `SimpleTokenizer → LowerCaser`, so the
//! database and Tantivy engines agree on what a term is.

use std::collections::HashMap;

/// Split text into lowercase alphanumeric tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Tokenize a query, dropping repeated terms but keeping first-seen order.
pub fn query_terms(text: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for token in tokenize(text) {
        if !terms.contains(&token) {
            terms.push(token);
        }
    }
    terms
}

/// Term frequencies of a piece of text.
pub fn term_frequencies(text: &str) -> HashMap<String, u32> {
    let mut freqs = HashMap::new();
    for token in tokenize(text) {
        *freqs.entry(token).or_insert(0) += 1;
    }
    freqs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lowercases_and_splits() {
        assert_eq!(tokenize("Hello, World!"), vec!["hello", "world"]);
        assert_eq!(tokenize("  multi   space "), vec!["multi", "space"]);
    }

    #[test]
    fn test_tokenize_blank() {
        assert!(tokenize("").is_empty());
        assert!(tokenize(" \t ").is_empty());
        assert!(tokenize("!?*").is_empty());
    }

    #[test]
    fn test_tokenize_unicode() {
        assert_eq!(tokenize("Café Ünïcode"), vec!["café", "ünïcode"]);
    }

    #[test]
    fn test_query_terms_dedup() {
        assert_eq!(query_terms("hello HELLO world"), vec!["hello", "world"]);
    }

    #[test]
    fn test_term_frequencies() {
        let freqs = term_frequencies("a b a");
        assert_eq!(freqs.get("a"), Some(&2));
        assert_eq!(freqs.get("b"), Some(&1));
    }
}
