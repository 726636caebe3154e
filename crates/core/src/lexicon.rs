//! Keyword extraction used for relevance checks and echo clauses.

use std::collections::HashSet;

/// Common English function words and pronouns that never count as keywords.
const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "if", "then", "else", "for", "to", "of", "in", "on",
    "at", "by", "with", "from", "as", "is", "are", "was", "were", "be", "been", "being", "it",
    "this", "that", "these", "those", "i", "you", "he", "she", "we", "they", "me", "him", "her",
    "us", "them", "my", "your", "his", "our", "their", "mine", "yours", "ours", "theirs", "do",
    "does", "did", "doing", "have", "has", "had", "having", "so", "not", "no", "yes", "just",
    "like",
];

const MIN_TOKEN_LEN: usize = 3;

fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

/// Splits `text` into normalized keywords.
///
/// Input is lower-cased and every character outside `[a-z0-9]` or whitespace
/// becomes a separator. Tokens shorter than three characters and stop words
/// are dropped. Each keyword appears once, in order of first occurrence, so
/// callers can echo the earliest keywords back to the user.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    let mut seen = HashSet::new();
    normalized
        .split_whitespace()
        .filter(|w| w.len() >= MIN_TOKEN_LEN && !is_stop_word(w))
        .filter(|w| seen.insert(*w))
        .map(str::to_string)
        .collect()
}

/// The keywords of `text` as a set, for overlap checks.
pub fn keyword_set(text: &str) -> HashSet<String> {
    tokenize(text).into_iter().collect()
}

/// Up to `limit` leading keywords of `text`.
pub fn salient(text: &str, limit: usize) -> Vec<String> {
    let mut tokens = tokenize(text);
    tokens.truncate(limit);
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_strips_punctuation_and_stop_words() {
        assert_eq!(tokenize("The Quick, Brown Fox!!"), vec!["quick", "brown", "fox"]);
    }

    #[test]
    fn test_tokenize_drops_short_tokens() {
        assert_eq!(tokenize("go to an ox pen"), vec!["pen"]);
    }

    #[test]
    fn test_tokenize_splits_on_apostrophes() {
        // "let's" breaks into "let" and a one-letter fragment.
        assert_eq!(tokenize("let's talk"), vec!["let", "talk"]);
    }

    #[test]
    fn test_tokenize_deduplicates_in_first_seen_order() {
        assert_eq!(
            tokenize("budget review, BUDGET numbers, review"),
            vec!["budget", "review", "numbers"]
        );
    }

    #[test]
    fn test_tokenize_keeps_digits_and_drops_non_ascii() {
        assert_eq!(tokenize("Q3 2024 café"), vec!["2024", "caf"]);
    }

    #[test]
    fn test_tokenize_empty_and_stop_word_only_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ").is_empty());
        assert!(tokenize("you and them, like, have been").is_empty());
    }

    #[test]
    fn test_keyword_set_and_salient() {
        let set = keyword_set("Rust ownership and borrowing");
        assert!(set.contains("rust"));
        assert!(set.contains("ownership"));
        assert!(set.contains("borrowing"));
        assert_eq!(set.len(), 3);

        assert_eq!(salient("alpha beta gamma delta", 2), vec!["alpha", "beta"]);
        assert_eq!(salient("alpha", 3), vec!["alpha"]);
    }
}
