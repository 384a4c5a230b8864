//! plagscan: pairwise plagiarism detection library
//!
//! Finds passages shared between documents of a collection, tolerating
//! small edits such as inserted, deleted or substituted words. Documents are
//! normalized into token sequences, every `k`-token window is fingerprinted
//! into a corpus-wide index, shared windows become seeds, and seeds are
//! extended into gap-tolerant fragments that are scored and ranked.
//!
//! # Example
//!
//! ```no_run
//! use plagscan::prelude::*;
//! use std::path::Path;
//!
//! let params = ComparisonParams::default();
//! let corpus = Corpus::load_dir(Path::new("submissions"), false).unwrap();
//!
//! let result = detect(&corpus, &params, false).unwrap();
//! for pair in &result.pairs {
//!     println!("{} <-> {}: {:.2}", pair.name_a, pair.name_b, pair.similarity);
//! }
//! ```
//!
//! # Comparing Two Texts
//!
//! ```
//! use plagscan::prelude::*;
//!
//! let params = ComparisonParams {
//!     window_size: 4,
//!     gap_tolerance: 0,
//!     min_fragment_length: 4,
//!     ..Default::default()
//! };
//! let text = "the quick brown fox jumps over the lazy dog";
//! let matches = compare_documents("a", text, "b", text, &params).unwrap();
//!
//! assert_eq!(matches.len(), 1);
//! assert_eq!(matches[0].covered_len, 9);
//! ```

pub mod compare;
pub mod corpus;
pub mod extend;
pub mod fingerprint;
pub mod merge;
pub mod models;
pub mod normalize;
pub mod output;
pub mod score;
pub mod seed;
pub mod stopwords;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::compare::{
        attach_text, compare_documents, compare_pair, corpus_stats, detect, detect_with_cancel,
        find_fragments, prepare_documents,
    };
    pub use crate::corpus::{Corpus, CorpusError};
    pub use crate::extend::extend;
    pub use crate::fingerprint::{all_pairs, fingerprint_tokens, FingerprintIndex};
    pub use crate::merge::{covered_length, merge_overlapping_fragments, merge_ranges};
    pub use crate::models::{
        ComparisonParams, CorpusStats, DetectionResult, DocId, Document, Fingerprint, Fragment,
        Language, LengthNormalization, Match, MatchKind, NormalizeOptions, Occurrence,
        PairReport, ParamsError, PassageText, RawDocument, RunSummary, Seed, SkippedDocument,
        Span, Token,
    };
    pub use crate::normalize::normalize;
    pub use crate::output::{
        format_match, format_pair, print_matches, print_stats, print_summary, write_csv,
        write_csv_file, write_json, write_json_file, OutputError,
    };
    pub use crate::score::{
        fragment_score, pair_report, pair_similarity, rank_matches, rank_pairs, score_fragment,
    };
    pub use crate::seed::generate_seeds;
}

// Re-export commonly used types at the crate root
pub use models::{ComparisonParams, DetectionResult, Fragment, Match, ParamsError};
