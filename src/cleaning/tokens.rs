//! Relevant-word counting for titles and bodies.

use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

/// Count the words in `text` that are purely alphabetic and, once
/// lower-cased, are not stop words.
pub fn count_relevant_tokens(text: &str, stop_words: &HashSet<String>) -> u64 {
    text.unicode_words()
        .filter(|token| token.chars().all(char::is_alphabetic))
        .map(str::to_lowercase)
        .filter(|token| !stop_words.contains(token))
        .count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaning::stopwords::Language;

    fn spanish() -> HashSet<String> {
        Language::Spanish
            .stop_words()
            .iter()
            .map(|w| w.to_string())
            .collect()
    }

    #[test]
    fn test_counts_skip_stop_words_case_insensitively() {
        // "El", "de" and "la" are stop words.
        assert_eq!(count_relevant_tokens("El gato de la casa", &spanish()), 2);
    }

    #[test]
    fn test_counts_skip_non_alphabetic_tokens() {
        assert_eq!(
            count_relevant_tokens("Elecciones 2024: votos, 3x y participación", &spanish()),
            3
        );
    }

    #[test]
    fn test_empty_text_counts_zero() {
        assert_eq!(count_relevant_tokens("", &spanish()), 0);
        assert_eq!(count_relevant_tokens("  ... !!", &spanish()), 0);
    }

    #[test]
    fn test_swapping_stop_words() {
        let english: HashSet<String> = Language::English
            .stop_words()
            .iter()
            .map(|w| w.to_string())
            .collect();
        assert_eq!(count_relevant_tokens("The cat and the hat", &english), 2);
        assert_eq!(count_relevant_tokens("The cat and the hat", &HashSet::new()), 5);
    }
}
