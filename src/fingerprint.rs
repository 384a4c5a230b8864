//! Window fingerprinting and the corpus-wide fingerprint index.
//!
//! Every run of `k` consecutive tokens is hashed (step 1) and recorded as
//! an occurrence. The index is built once per run and only read afterwards,
//! so pair workers share it by reference without locking.

use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use xxhash_rust::xxh3::xxh3_64_with_seed;

use crate::models::{DocId, Document, Fingerprint, Occurrence, Token};

const TOKEN_HASH_SEED: u64 = 0x9e37_79b9_7f4a_7c15;

/// Polynomial base for the rolling window hash.
const BASE: u64 = 1_000_003;

/// Hash every `k`-token window of a token sequence, in O(n).
///
/// The hash is order sensitive. Sequences shorter than `k` give no
/// fingerprints.
pub fn fingerprint_tokens(tokens: &[Token], k: usize) -> Vec<Fingerprint> {
    let n = tokens.len();
    if k == 0 || n < k {
        return Vec::new();
    }

    let token_hashes: Vec<u64> = tokens
        .iter()
        .map(|t| xxh3_64_with_seed(t.text.as_bytes(), TOKEN_HASH_SEED))
        .collect();

    // base^(k-1), used to drop the oldest token from the window
    let mut base_km1 = 1u64;
    for _ in 1..k {
        base_km1 = base_km1.wrapping_mul(BASE);
    }

    let mut out = Vec::with_capacity(n - k + 1);
    let mut h = 0u64;
    for &value in token_hashes.iter().take(k) {
        h = h.wrapping_mul(BASE).wrapping_add(value);
    }
    out.push(Fingerprint { hash: h, start: 0 });

    for (i, (&old, &new)) in token_hashes
        .iter()
        .zip(token_hashes.iter().skip(k))
        .enumerate()
    {
        h = h.wrapping_sub(old.wrapping_mul(base_km1));
        h = h.wrapping_mul(BASE).wrapping_add(new);
        out.push(Fingerprint {
            hash: h,
            start: i + 1,
        });
    }

    out
}

/// Inverted index from window hash to every occurrence in the corpus.
#[derive(Debug, Clone, Default)]
pub struct FingerprintIndex {
    window_size: usize,
    postings: HashMap<u64, Vec<Occurrence>>,
    doc_fingerprints: Vec<Vec<Fingerprint>>,
    masked: HashSet<u64>,
}

impl FingerprintIndex {
    /// Build the index over `documents`, whose ids must equal their position.
    pub fn build(documents: &[Document], window_size: usize) -> Self {
        Self::build_with_common(documents, &[], window_size)
    }

    /// Build the index and mask every hash that appears in a common
    /// document (assignment template, quoted task text).
    ///
    /// Fingerprinting runs per document in parallel; the merge into the
    /// shared table is single-threaded.
    pub fn build_with_common(
        documents: &[Document],
        common: &[Document],
        window_size: usize,
    ) -> Self {
        debug_assert!(documents.iter().enumerate().all(|(i, d)| d.id == i));

        let doc_fingerprints: Vec<Vec<Fingerprint>> = documents
            .par_iter()
            .map(|doc| fingerprint_tokens(&doc.tokens, window_size))
            .collect();

        let masked: HashSet<u64> = common
            .par_iter()
            .flat_map_iter(|doc| {
                fingerprint_tokens(&doc.tokens, window_size)
                    .into_iter()
                    .map(|fp| fp.hash)
            })
            .collect();

        let mut postings: HashMap<u64, Vec<Occurrence>> = HashMap::new();
        for (doc, fingerprints) in doc_fingerprints.iter().enumerate() {
            for fp in fingerprints {
                postings.entry(fp.hash).or_default().push(Occurrence {
                    doc,
                    start: fp.start,
                });
            }
        }

        FingerprintIndex {
            window_size,
            postings,
            doc_fingerprints,
            masked,
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Occurrences of a hash, ordered by (document, start).
    pub fn occurrences_of(&self, hash: u64) -> &[Occurrence] {
        self.postings.get(&hash).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Fingerprints of one document in token order.
    pub fn fingerprints_of(&self, doc: DocId) -> &[Fingerprint] {
        self.doc_fingerprints
            .get(doc)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// True if the hash also occurs in a common document.
    pub fn is_masked(&self, hash: u64) -> bool {
        self.masked.contains(&hash)
    }

    pub fn document_count(&self) -> usize {
        self.doc_fingerprints.len()
    }

    pub fn total_fingerprints(&self) -> usize {
        self.doc_fingerprints.iter().map(Vec::len).sum()
    }

    pub fn distinct_hashes(&self) -> usize {
        self.postings.len()
    }

    pub fn masked_hashes(&self) -> usize {
        self.masked.len()
    }

    /// Unordered document pairs sharing at least one unmasked fingerprint,
    /// sorted, with the smaller id first.
    pub fn candidate_pairs(&self) -> Vec<(DocId, DocId)> {
        let mut pairs: HashSet<(DocId, DocId)> = HashSet::new();
        let mut docs: Vec<DocId> = Vec::new();

        for (hash, occurrences) in &self.postings {
            if occurrences.len() < 2 || self.is_masked(*hash) {
                continue;
            }
            docs.clear();
            docs.extend(occurrences.iter().map(|o| o.doc));
            docs.dedup(); // occurrences are grouped by document
            for (i, &a) in docs.iter().enumerate() {
                for &b in &docs[i + 1..] {
                    pairs.insert((a, b));
                }
            }
        }

        let mut pairs: Vec<(DocId, DocId)> = pairs.into_iter().collect();
        pairs.sort_unstable();
        pairs
    }
}

/// Every unordered pair of `n` documents (brute force mode).
pub fn all_pairs(n: usize) -> Vec<(DocId, DocId)> {
    let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for a in 0..n {
        for b in a + 1..n {
            pairs.push((a, b));
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NormalizeOptions;
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
    fn test_fingerprints_too_short() {
        let d = doc(0, "only three words");
        assert!(fingerprint_tokens(&d.tokens, 4).is_empty());
        assert!(fingerprint_tokens(&d.tokens, 0).is_empty());
    }

    #[test]
    fn test_fingerprint_count_and_starts() {
        let d = doc(0, "a b c d e f g");
        let fps = fingerprint_tokens(&d.tokens, 3);
        assert_eq!(fps.len(), 5); // 7 - 3 + 1
        for (i, fp) in fps.iter().enumerate() {
            assert_eq!(fp.start, i);
        }
    }

    #[test]
    fn test_rolling_hash_matches_direct_hash() {
        let a = doc(0, "x y the quick brown fox");
        let b = doc(1, "the quick brown fox");
        let fps_a = fingerprint_tokens(&a.tokens, 4);
        let fps_b = fingerprint_tokens(&b.tokens, 4);
        assert_eq!(fps_a[2].hash, fps_b[0].hash);
    }

    #[test]
    fn test_hash_is_order_sensitive() {
        let a = doc(0, "one two three");
        let b = doc(1, "three two one");
        let fa = fingerprint_tokens(&a.tokens, 3);
        let fb = fingerprint_tokens(&b.tokens, 3);
        assert_ne!(fa[0].hash, fb[0].hash);
    }

    #[test]
    fn test_index_occurrences() {
        let docs = vec![
            doc(0, "alpha beta gamma delta"),
            doc(1, "zeta alpha beta gamma"),
            doc(2, "alpha beta gamma alpha beta gamma"),
        ];
        let index = FingerprintIndex::build(&docs, 3);
        let hash = index.fingerprints_of(0)[0].hash;
        let occ = index.occurrences_of(hash);
        assert_eq!(
            occ,
            &[
                Occurrence { doc: 0, start: 0 },
                Occurrence { doc: 1, start: 1 },
                Occurrence { doc: 2, start: 0 },
                Occurrence { doc: 2, start: 3 },
            ]
        );
        assert!(index.occurrences_of(12345).is_empty());
        assert_eq!(index.total_fingerprints(), 2 + 2 + 4);
    }

    #[test]
    fn test_every_occurrence_is_a_real_window() {
        let docs = vec![doc(0, "a b c d e f"), doc(1, "c d e f g")];
        let index = FingerprintIndex::build(&docs, 3);
        for d in &docs {
            for fp in index.fingerprints_of(d.id) {
                for occ in index.occurrences_of(fp.hash) {
                    let window: Vec<&str> = docs[occ.doc].tokens[occ.start..occ.start + 3]
                        .iter()
                        .map(|t| t.text.as_str())
                        .collect();
                    let own: Vec<&str> = d.tokens[fp.start..fp.start + 3]
                        .iter()
                        .map(|t| t.text.as_str())
                        .collect();
                    assert_eq!(window, own);
                }
            }
        }
    }

    #[test]
    fn test_candidate_pairs() {
        let docs = vec![
            doc(0, "alpha beta gamma delta"),
            doc(1, "unrelated words only here"),
            doc(2, "say alpha beta gamma"),
        ];
        let index = FingerprintIndex::build(&docs, 3);
        assert_eq!(index.candidate_pairs(), vec![(0, 2)]);
    }

    #[test]
    fn test_common_documents_mask_hashes() {
        let docs = vec![
            doc(0, "answer the following question carefully please"),
            doc(1, "answer the following question with care"),
        ];
        let common = vec![doc(0, "answer the following question")];
        let index = FingerprintIndex::build_with_common(&docs, &common, 3);
        assert_eq!(index.masked_hashes(), 2);
        assert!(index.candidate_pairs().is_empty());

        let unmasked = FingerprintIndex::build(&docs, 3);
        assert_eq!(unmasked.candidate_pairs(), vec![(0, 1)]);
    }

    #[test]
    fn test_all_pairs() {
        assert!(all_pairs(1).is_empty());
        assert_eq!(all_pairs(3), vec![(0, 1), (0, 2), (1, 2)]);
    }
}
