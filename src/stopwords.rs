//! Stop word lists used when `remove_stop_words` is enabled.
//!
//! Lists are sorted so lookups can binary search.

use crate::models::Language;

pub const ENGLISH: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself",
    "just", "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on",
    "once", "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same",
    "she", "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

pub const GERMAN: &[&str] = &[
    "aber", "alle", "allem", "allen", "aller", "alles", "als", "also", "am", "an", "ander",
    "andere", "anderem", "anderen", "anderer", "anderes", "auch", "auf", "aus", "bei", "bin",
    "bis", "bist", "da", "damit", "dann", "das", "dass", "dem", "den", "denn", "der", "des",
    "dich", "die", "dies", "diese", "diesem", "diesen", "dieser", "dieses", "dir", "doch",
    "dort", "du", "durch", "ein", "eine", "einem", "einen", "einer", "eines", "er", "es",
    "etwas", "euch", "euer", "eure", "für", "gegen", "hab", "habe", "haben", "hat", "hatte",
    "hier", "hin", "hinter", "ich", "ihm", "ihn", "ihnen", "ihr", "ihre", "im", "in", "ist",
    "ja", "jede", "jedem", "jeden", "jeder", "jedes", "jene", "jetzt", "kann", "kein", "keine",
    "können", "machen", "man", "manche", "mein", "meine", "mich", "mir", "mit", "muss",
    "musste", "nach", "nicht", "nichts", "noch", "nun", "nur", "ob", "oder", "ohne", "sehr",
    "sein", "seine", "sich", "sie", "sind", "so", "solche", "soll", "sollte", "sondern",
    "sonst", "um", "und", "uns", "unser", "unter", "viel", "vom", "von", "vor", "war", "waren",
    "was", "weg", "weil", "weiter", "welche", "wenn", "werde", "werden", "wie", "wieder",
    "will", "wir", "wird", "wo", "wollen", "zu", "zum", "zur", "zwar", "zwischen", "über",
];

/// Returns true if the lowercase surface form is a stop word in `language`.
pub fn is_stop_word(word: &str, language: Language) -> bool {
    let list = match language {
        Language::English => ENGLISH,
        Language::German => GERMAN,
    };
    list.binary_search(&word).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_are_sorted() {
        assert!(ENGLISH.windows(2).all(|w| w[0] < w[1]));
        assert!(GERMAN.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_lookup() {
        assert!(is_stop_word("the", Language::English));
        assert!(!is_stop_word("plagiarism", Language::English));
        assert!(is_stop_word("für", Language::German));
        assert!(!is_stop_word("the", Language::German));
    }
}
