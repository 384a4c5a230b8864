//! Seed generation: shared fingerprints between two documents.

use tracing::trace;

use crate::fingerprint::FingerprintIndex;
use crate::models::{Document, Seed, Token};

/// Emit a seed for every window of `doc_a` whose hash also occurs in `doc_b`.
///
/// With `verify` set, windows whose hashes collide but whose tokens differ
/// are dropped. Masked (common-document) hashes never seed. Output is sorted
/// by `(start_a, start_b)`.
pub fn generate_seeds(
    doc_a: &Document,
    doc_b: &Document,
    index: &FingerprintIndex,
    verify: bool,
) -> Vec<Seed> {
    if doc_a.id == doc_b.id {
        return Vec::new();
    }

    let k = index.window_size();
    let mut seeds = Vec::new();
    let mut collisions = 0usize;

    for fp in index.fingerprints_of(doc_a.id) {
        if index.is_masked(fp.hash) {
            continue;
        }

        let occurrences = index.occurrences_of(fp.hash);
        // Postings are ordered by document, so B's run is contiguous
        let first = occurrences.partition_point(|o| o.doc < doc_b.id);

        for occ in occurrences[first..]
            .iter()
            .take_while(|o| o.doc == doc_b.id)
        {
            if verify && !windows_equal(&doc_a.tokens, fp.start, &doc_b.tokens, occ.start, k) {
                collisions += 1;
                continue;
            }
            seeds.push(Seed {
                doc_a: doc_a.id,
                start_a: fp.start,
                doc_b: doc_b.id,
                start_b: occ.start,
                len: k,
            });
        }
    }

    if collisions > 0 {
        trace!(
            doc_a = doc_a.id,
            doc_b = doc_b.id,
            collisions,
            "dropped colliding seeds"
        );
    }

    seeds.sort_unstable_by_key(|s| (s.start_a, s.start_b));
    seeds
}

fn windows_equal(a: &[Token], start_a: usize, b: &[Token], start_b: usize, k: usize) -> bool {
    match (a.get(start_a..start_a + k), b.get(start_b..start_b + k)) {
        (Some(wa), Some(wb)) => wa.iter().zip(wb).all(|(x, y)| x.text == y.text),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocId, NormalizeOptions};
    use crate::normalize::normalize;

    fn doc(id: DocId, text: &str) -> Document {
        Document {
            id,
            name: format!("doc{}", id),
            text: text.to_string(),
            tokens: normalize(text, &NormalizeOptions::default()),
        }
    }

    #[test]
    fn test_self_pair_has_no_seeds() {
        let docs = vec![doc(0, "the quick brown fox jumps")];
        let index = FingerprintIndex::build(&docs, 3);
        assert!(generate_seeds(&docs[0], &docs[0], &index, true).is_empty());
    }

    #[test]
    fn test_seeds_for_shared_passage() {
        let docs = vec![
            doc(0, "intro the quick brown fox jumps"),
            doc(1, "the quick brown fox jumps outro"),
        ];
        let index = FingerprintIndex::build(&docs, 3);
        let seeds = generate_seeds(&docs[0], &docs[1], &index, true);
        let starts: Vec<(usize, usize)> = seeds.iter().map(|s| (s.start_a, s.start_b)).collect();
        assert_eq!(starts, vec![(1, 0), (2, 1), (3, 2)]);
        assert!(seeds.iter().all(|s| s.len == 3 && s.doc_a == 0 && s.doc_b == 1));
    }

    #[test]
    fn test_repeated_windows_pair_with_every_occurrence() {
        let docs = vec![
            doc(0, "red green blue"),
            doc(1, "red green blue and red green blue"),
        ];
        let index = FingerprintIndex::build(&docs, 3);
        let seeds = generate_seeds(&docs[0], &docs[1], &index, true);
        let starts: Vec<(usize, usize)> = seeds.iter().map(|s| (s.start_a, s.start_b)).collect();
        assert_eq!(starts, vec![(0, 0), (0, 4)]);
    }

    #[test]
    fn test_short_document_never_seeds() {
        let docs = vec![doc(0, "brown fox"), doc(1, "the quick brown fox jumps")];
        let index = FingerprintIndex::build(&docs, 3);
        assert!(generate_seeds(&docs[0], &docs[1], &index, true).is_empty());
        assert!(generate_seeds(&docs[1], &docs[0], &index, true).is_empty());
    }

    #[test]
    fn test_windows_equal() {
        let a = normalize("one two three four", &NormalizeOptions::default());
        let b = normalize("two three four five", &NormalizeOptions::default());
        assert!(windows_equal(&a, 1, &b, 0, 3));
        assert!(!windows_equal(&a, 0, &b, 0, 3));
        assert!(!windows_equal(&a, 2, &b, 0, 3)); // runs off the end of A
    }
}
