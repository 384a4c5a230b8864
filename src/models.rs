//! Data structures for the plagscan detection pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::merge::{covered_length, merge_ranges};

/// Index of a document within a normalized corpus.
pub type DocId = usize;

/// A normalized unit of text with its byte range in the raw document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub start: usize, // byte offset (inclusive)
    pub end: usize,   // byte offset (exclusive)
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        self.text.as_str()
    }
}

/// A document after normalization.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: DocId,
    pub name: String,
    pub text: String,
    pub tokens: Vec<Token>,
}

impl Document {
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Byte range in the raw text covered by a token span.
    pub fn byte_range(&self, span: Span) -> (usize, usize) {
        if span.is_empty() {
            return (0, 0);
        }
        match (self.tokens.get(span.start), self.tokens.get(span.end - 1)) {
            (Some(first), Some(last)) => (first.start, last.end),
            _ => (0, 0),
        }
    }

    /// Release normalized token texts, keeping offsets for reporting.
    pub fn drop_token_text(&mut self) {
        for token in &mut self.tokens {
            token.text = String::new();
        }
    }
}

/// An undecoded-or-decoded document as handed over by the loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDocument {
    pub name: String,
    pub text: String,
}

/// A document the run could not use, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedDocument {
    pub name: String,
    pub reason: String,
}

/// Hash of a `k`-token window, anchored at its first token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub hash: u64,
    pub start: usize,
}

/// Posting entry in the fingerprint index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Occurrence {
    pub doc: DocId,
    pub start: usize,
}

/// A pair of equal token windows, one in each document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Seed {
    pub doc_a: DocId,
    pub start_a: usize,
    pub doc_b: DocId,
    pub start_b: usize,
    pub len: usize,
}

impl Seed {
    pub fn end_a(&self) -> usize {
        self.start_a + self.len
    }

    pub fn end_b(&self) -> usize {
        self.start_b + self.len
    }

    /// Offset between the two documents' positions.
    pub fn diagonal(&self) -> i64 {
        self.start_b as i64 - self.start_a as i64
    }

    pub fn swapped(&self) -> Seed {
        Seed {
            doc_a: self.doc_b,
            start_a: self.start_b,
            doc_b: self.doc_a,
            start_b: self.start_a,
            len: self.len,
        }
    }
}

/// Half-open range of token indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// A gap-tolerant alignment between a span of A and a span of B.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub doc_a: DocId,
    pub doc_b: DocId,
    pub span_a: Span,
    pub span_b: Span,
    pub seeds: Vec<Seed>,
    pub covered_a: usize, // tokens of span_a covered by seed windows
    pub covered_b: usize,
}

impl Fragment {
    /// Build a fragment from its constituent seeds. Seeds must be non-empty
    /// and belong to the same document pair.
    pub fn from_seeds(mut seeds: Vec<Seed>) -> Self {
        seeds.sort_unstable_by_key(|s| (s.start_a, s.start_b));
        seeds.dedup();

        let doc_a = seeds.first().map(|s| s.doc_a).unwrap_or_default();
        let doc_b = seeds.first().map(|s| s.doc_b).unwrap_or_default();

        let span_a = Span::new(
            seeds.iter().map(|s| s.start_a).min().unwrap_or(0),
            seeds.iter().map(Seed::end_a).max().unwrap_or(0),
        );
        let span_b = Span::new(
            seeds.iter().map(|s| s.start_b).min().unwrap_or(0),
            seeds.iter().map(Seed::end_b).max().unwrap_or(0),
        );

        let covered_a = covered_length(seeds.iter().map(|s| (s.start_a, s.end_a())));
        let covered_b = covered_length(seeds.iter().map(|s| (s.start_b, s.end_b())));

        Fragment {
            doc_a,
            doc_b,
            span_a,
            span_b,
            seeds,
            covered_a,
            covered_b,
        }
    }

    /// Covered token length used for thresholds: the smaller of the two sides.
    pub fn covered_len(&self) -> usize {
        self.covered_a.min(self.covered_b)
    }

    /// Seed windows in A merged into disjoint ranges.
    pub fn covered_ranges_a(&self) -> Vec<(usize, usize)> {
        disjoint_ranges(self.seeds.iter().map(|s| (s.start_a, s.end_a())))
    }

    pub fn covered_ranges_b(&self) -> Vec<(usize, usize)> {
        disjoint_ranges(self.seeds.iter().map(|s| (s.start_b, s.end_b())))
    }

    /// Fraction of the longer span actually covered by seeds.
    pub fn coverage(&self) -> f32 {
        let span = self.span_a.len().max(self.span_b.len());
        if span == 0 {
            0.0
        } else {
            self.covered_len() as f32 / span as f32
        }
    }

    pub fn swapped(&self) -> Fragment {
        Fragment::from_seeds(self.seeds.iter().map(Seed::swapped).collect())
    }
}

fn disjoint_ranges<I>(ranges: I) -> Vec<(usize, usize)>
where
    I: IntoIterator<Item = (usize, usize)>,
{
    let mut ranges: Vec<(usize, usize)> = ranges.into_iter().collect();
    ranges.sort_unstable();
    merge_ranges(&ranges)
}

/// How closely a match reproduces its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// Both spans fully covered and of equal length
    Verbatim,
    /// Gaps, insertions or substitutions inside the spans
    Modified,
}

/// Reconstructed text for a passage with context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassageText {
    pub before: String,  // Context before match
    pub matched: String, // The matched text
    pub after: String,   // Context after match
}

impl PassageText {
    /// Slice `text` at a byte range, adding up to `context_chars` characters
    /// on either side. Ranges must lie on char boundaries.
    pub fn extract(text: &str, range: (usize, usize), context_chars: usize) -> Self {
        let (start, end) = (range.0.min(text.len()), range.1.min(text.len()));
        if start >= end {
            return PassageText {
                before: String::new(),
                matched: String::new(),
                after: String::new(),
            };
        }

        let before_start = text[..start]
            .char_indices()
            .rev()
            .nth(context_chars.saturating_sub(1))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let after_end = text[end..]
            .char_indices()
            .nth(context_chars)
            .map(|(i, _)| end + i)
            .unwrap_or(text.len());

        PassageText {
            before: if context_chars == 0 {
                String::new()
            } else {
                text[before_start..start].to_string()
            },
            matched: text[start..end].to_string(),
            after: text[end..after_end].to_string(),
        }
    }
}

/// A scored fragment that passed the configured thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: u64,
    pub doc_a: DocId,
    pub doc_b: DocId,
    pub name_a: String,
    pub name_b: String,
    pub span_a: Span,
    pub span_b: Span,
    pub bytes_a: (usize, usize), // byte range in document A's raw text
    pub bytes_b: (usize, usize),
    pub covered_len: usize,
    #[serde(default)]
    pub covered_ranges_a: Vec<(usize, usize)>, // merged seed windows in A
    #[serde(default)]
    pub covered_ranges_b: Vec<(usize, usize)>,
    pub seed_count: usize,
    pub score: f32,
    pub kind: MatchKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_a: Option<PassageText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_b: Option<PassageText>,
}

impl Match {
    pub fn swapped(self) -> Match {
        Match {
            id: self.id,
            doc_a: self.doc_b,
            doc_b: self.doc_a,
            name_a: self.name_b,
            name_b: self.name_a,
            span_a: self.span_b,
            span_b: self.span_a,
            bytes_a: self.bytes_b,
            bytes_b: self.bytes_a,
            covered_len: self.covered_len,
            covered_ranges_a: self.covered_ranges_b,
            covered_ranges_b: self.covered_ranges_a,
            seed_count: self.seed_count,
            score: self.score,
            kind: self.kind,
            text_a: self.text_b,
            text_b: self.text_a,
        }
    }
}

/// Denominator used to turn covered length into a ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthNormalization {
    /// Shorter document's token count
    Min,
    /// Longer document's token count
    Max,
    /// Mean of both documents' token counts
    Average,
    /// The fragment's own spans in both documents
    #[default]
    Combined,
}

/// Language used for stemming and stop words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    German,
}

/// Normalizer options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    pub lowercase: bool,
    pub strip_diacritics: bool,
    pub stem: bool,
    pub remove_stop_words: bool,
    pub language: Language,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            lowercase: true,
            strip_diacritics: true,
            stem: false,
            remove_stop_words: false,
            language: Language::English,
        }
    }
}

/// Configuration errors, raised before any work starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParamsError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Comparison parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonParams {
    pub window_size: usize,         // k, tokens per fingerprint
    pub gap_tolerance: usize,       // max drift in tokens while extending
    pub min_fragment_length: usize, // min covered tokens to keep a fragment
    pub min_similarity: f32,        // score threshold to keep a match
    pub length_normalization: LengthNormalization,
    pub verify_seeds: bool,    // compare token texts to rule out collisions
    pub brute_force: bool,     // compare every pair instead of pairs sharing a fingerprint
    pub keep_token_text: bool, // keep token texts after indexing
    pub normalize: NormalizeOptions,
}

impl Default for ComparisonParams {
    fn default() -> Self {
        Self {
            window_size: 5,
            gap_tolerance: 3,
            min_fragment_length: 8,
            min_similarity: 0.5,
            length_normalization: LengthNormalization::Combined,
            verify_seeds: true,
            brute_force: false,
            keep_token_text: true,
            normalize: NormalizeOptions::default(),
        }
    }
}

impl ComparisonParams {
    /// Parse parameters from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ParamsError> {
        let params: ComparisonParams = serde_json::from_str(json)
            .map_err(|e| ParamsError::InvalidConfiguration(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.window_size == 0 {
            return Err(ParamsError::InvalidConfiguration(
                "window_size must be >= 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_similarity) {
            return Err(ParamsError::InvalidConfiguration(format!(
                "min_similarity must be within [0, 1], got {}",
                self.min_similarity
            )));
        }
        if self.verify_seeds && !self.keep_token_text {
            return Err(ParamsError::InvalidConfiguration(
                "verify_seeds requires keep_token_text".into(),
            ));
        }
        Ok(())
    }
}

/// Per-pair aggregate over all matches of a document pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairReport {
    pub doc_a: DocId,
    pub doc_b: DocId,
    pub name_a: String,
    pub name_b: String,
    pub match_count: usize,
    pub covered_a: usize, // union of seed-covered tokens in A
    pub covered_b: usize,
    pub similarity: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub document_count: usize,
    pub common_document_count: usize,
    pub skipped: Vec<SkippedDocument>,
    pub total_tokens: usize,
    pub candidate_pairs: usize,
    pub pairs_compared: usize,
    pub suspicious_pairs: usize,
    pub match_count: usize,
    pub partial: bool, // cancelled before every candidate pair was compared
}

/// Full detection result
#[derive(Debug, Serialize, Deserialize)]
pub struct DetectionResult {
    pub version: String,
    pub parameters: ComparisonParams,
    pub summary: RunSummary,
    pub pairs: Vec<PairReport>,
    pub matches: Vec<Match>,
}

/// Corpus statistics
#[derive(Debug, Clone, Serialize)]
pub struct CorpusStats {
    pub document_count: usize,
    pub common_document_count: usize,
    pub skipped_count: usize,
    pub total_tokens: usize,
    pub total_fingerprints: usize,
    pub distinct_hashes: usize,
    pub masked_hashes: usize,
    pub candidate_pairs: usize,
}
