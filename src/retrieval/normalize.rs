//! Text normalization shared by indexing and querying.
//!
//! Lowercasing uses Unicode case mapping only, so results do not depend on
//! the process locale.

/// Lowercases `text` and removes every character that is neither a word
/// character (letter, digit, underscore) nor whitespace.
///
/// Whitespace is kept as-is; callers split on it.
pub fn normalize(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| is_word_char(*c) || c.is_whitespace())
        .collect()
}

/// Normalizes `text` and splits it into non-empty tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// A whitespace-separated word of a query along with its normalized form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryWord<'a> {
    /// The word as written in the query.
    pub original: &'a str,
    /// The normalized token used for matching.
    pub token: String,
}

/// Splits a query into words, dropping words that normalize to nothing.
pub fn query_words(query: &str) -> Vec<QueryWord<'_>> {
    query
        .split_whitespace()
        .filter_map(|original| {
            let token = normalize(original);
            if token.is_empty() {
                None
            } else {
                Some(QueryWord { original, token })
            }
        })
        .collect()
}

/// Letters, digits and underscore.
///
/// Letters follow the Unicode `Alphabetic` property, which also covers
/// combining vowel signs such as Devanagari U+093E. Unlike a regex `\w`
/// class, which matches general categories `L*` and `N*` only, those signs
/// are kept. Plain combining accents like U+0301 are not alphabetic and are
/// removed either way.
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_strips_punctuation() {
        assert_eq!(normalize("Saya, suka MAKAN!"), "saya suka makan");
    }

    #[test]
    fn keeps_digits_underscores_and_whitespace() {
        assert_eq!(normalize("Tahun 2024_a\tb\nc"), "tahun 2024_a\tb\nc");
    }

    #[test]
    fn keeps_non_ascii_letters() {
        assert_eq!(normalize("Über Café—ÉTÉ"), "über caféété");
    }

    #[test]
    fn keeps_combining_vowel_signs() {
        assert_eq!(normalize("\u{915}\u{93e}!"), "\u{915}\u{93e}");
        assert_eq!(tokenize("Cafe\u{301}."), vec!["cafe"]);
    }

    #[test]
    fn punctuation_only_is_empty() {
        assert_eq!(normalize("!!! ... ?"), "  ");
        assert!(tokenize("!!! ... ?").is_empty());
    }

    #[test]
    fn joins_words_split_by_punctuation() {
        assert_eq!(tokenize("anak-anak"), vec!["anakanak"]);
    }

    #[test]
    fn tokenize_splits_on_any_whitespace() {
        assert_eq!(tokenize("  a \t b\n\nc "), vec!["a", "b", "c"]);
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize("Dia berkata: \"Pergi!\"");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn query_words_keep_original_spelling() {
        let words = query_words("Saya suka, makan !!!");
        let pairs: Vec<_> = words.iter().map(|w| (w.original, w.token.as_str())).collect();
        assert_eq!(
            pairs,
            vec![("Saya", "saya"), ("suka,", "suka"), ("makan", "makan")]
        );
    }

    #[test]
    fn query_words_agree_with_tokenize() {
        let text = "Rumah-rumah itu, BESAR sekali!";
        let tokens: Vec<String> = query_words(text).into_iter().map(|w| w.token).collect();
        assert_eq!(tokens, tokenize(text));
    }
}
