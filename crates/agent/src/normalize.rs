//! Message normalizer
//!
//! Every classifier sees the same normalized view of the inbound text:
//! lowercase, Unicode NFD with combining marks removed, trimmed. Pure and
//! total.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalize inbound text for classification
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// True if the text contains any of the given keywords
pub fn contains_any(text: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| text.contains(k.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_diacritics() {
        assert_eq!(normalize("Preço"), "preco");
        assert_eq!(normalize("  TÁ CARO  "), "ta caro");
        assert_eq!(normalize("cartão"), "cartao");
    }

    #[test]
    fn test_normalize_is_total() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn test_normalize_keeps_punctuation_and_emoji() {
        assert_eq!(normalize("como assim?"), "como assim?");
        assert_eq!(normalize("Oi 🙂"), "oi 🙂");
    }

    #[test]
    fn test_contains_any() {
        let keywords = vec!["quanto".to_string(), "custa".to_string()];
        assert!(contains_any("quanto custa?", &keywords));
        assert!(contains_any("e quanto sai?", &keywords));
        assert!(!contains_any("oi, tudo bem?", &keywords));
    }
}
