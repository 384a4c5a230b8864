//! Text normalization: raw document text into comparable tokens.
//!
//! Segmentation follows Unicode word boundaries, so it is lexical and locale
//! insensitive. Every unit is folded (case, diacritics, punctuation) and may
//! be stemmed; units that fold to nothing are dropped. Retained tokens keep
//! the byte range of their unit in the raw text so matches can be reported
//! against the source.

use rust_stemmers::{Algorithm, Stemmer};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

use crate::models::{Language, NormalizeOptions, Token};
use crate::stopwords::is_stop_word;

/// Normalize raw text into an ordered token sequence.
///
/// Pure function of its inputs: the same text and options always give the
/// same tokens and offsets.
pub fn normalize(raw: &str, options: &NormalizeOptions) -> Vec<Token> {
    let stemmer = options
        .stem
        .then(|| Stemmer::create(stemmer_algorithm(options.language)));

    raw.split_word_bound_indices()
        .filter_map(|(offset, unit)| {
            if options.remove_stop_words && is_stop_word(&surface_form(unit), options.language) {
                return None;
            }

            let folded = fold_unit(unit, options);
            if folded.is_empty() {
                return None;
            }

            let text = match &stemmer {
                Some(stemmer) => stemmer.stem(&folded).into_owned(),
                None => folded,
            };

            Some(Token {
                text,
                start: offset,
                end: offset + unit.len(),
            })
        })
        .collect()
}

/// Lowercased alphanumeric form with diacritics intact, used for stop words.
fn surface_form(unit: &str) -> String {
    unit.chars()
        .filter(|ch| ch.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn fold_unit(unit: &str, options: &NormalizeOptions) -> String {
    let mut out = String::with_capacity(unit.len());
    let mut push = |ch: char| {
        if options.lowercase {
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    };

    if options.strip_diacritics {
        for ch in unit.nfd() {
            if ch.is_alphanumeric() && !is_combining_mark(ch) {
                push(ch);
            }
        }
    } else {
        for ch in unit.chars() {
            if ch.is_alphanumeric() || is_combining_mark(ch) {
                push(ch);
            }
        }
    }

    out
}

fn stemmer_algorithm(language: Language) -> Algorithm {
    match language {
        Language::English => Algorithm::English,
        Language::German => Algorithm::German,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_empty_text() {
        assert!(normalize("", &NormalizeOptions::default()).is_empty());
        assert!(normalize("  ... !! \n", &NormalizeOptions::default()).is_empty());
    }

    #[test]
    fn test_lowercase_and_punctuation() {
        let tokens = normalize("Hello, World! It's fine.", &NormalizeOptions::default());
        assert_eq!(texts(&tokens), vec!["hello", "world", "its", "fine"]);
    }

    #[test]
    fn test_offsets_point_at_source() {
        let raw = "  The quick,  brown fox.";
        let tokens = normalize(raw, &NormalizeOptions::default());
        assert_eq!(tokens.len(), 4);
        for token in &tokens {
            let source = &raw[token.start..token.end];
            assert_eq!(source.to_lowercase(), token.text);
        }
        assert_eq!(&raw[tokens[1].start..tokens[1].end], "quick");
        assert_eq!(&raw[tokens[3].start..tokens[3].end], "fox");
    }

    #[test]
    fn test_strip_diacritics() {
        let raw = "Café naïve Über";
        let tokens = normalize(raw, &NormalizeOptions::default());
        assert_eq!(texts(&tokens), vec!["cafe", "naive", "uber"]);
        assert_eq!(&raw[tokens[0].start..tokens[0].end], "Café");
        assert_eq!(&raw[tokens[2].start..tokens[2].end], "Über");

        let keep = NormalizeOptions {
            strip_diacritics: false,
            ..Default::default()
        };
        let tokens = normalize(raw, &keep);
        assert_eq!(texts(&tokens), vec!["café", "naïve", "über"]);
    }

    #[test]
    fn test_no_lowercase() {
        let options = NormalizeOptions {
            lowercase: false,
            ..Default::default()
        };
        let tokens = normalize("Mixed CASE", &options);
        assert_eq!(texts(&tokens), vec!["Mixed", "CASE"]);
    }

    #[test]
    fn test_stop_words_removed() {
        let options = NormalizeOptions {
            remove_stop_words: true,
            ..Default::default()
        };
        let raw = "The cat sat on the mat";
        let tokens = normalize(raw, &options);
        assert_eq!(texts(&tokens), vec!["cat", "sat", "mat"]);
        assert_eq!(&raw[tokens[2].start..tokens[2].end], "mat");
    }

    #[test]
    fn test_german_stop_words_checked_before_folding() {
        let options = NormalizeOptions {
            remove_stop_words: true,
            language: Language::German,
            ..Default::default()
        };
        let tokens = normalize("Für die Prüfung", &options);
        assert_eq!(texts(&tokens), vec!["prufung"]);
    }

    #[test]
    fn test_stemming() {
        let options = NormalizeOptions {
            stem: true,
            ..Default::default()
        };
        let a = normalize("connected connecting connection", &options);
        assert_eq!(texts(&a), vec!["connect", "connect", "connect"]);
    }

    #[test]
    fn test_idempotent() {
        let raw = "Plagiarism, in short: copying, without credit!";
        let options = NormalizeOptions::default();
        assert_eq!(normalize(raw, &options), normalize(raw, &options));
    }
}
