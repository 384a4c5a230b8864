//! Scoring, threshold filtering and ranking of fragments.

use std::cmp::Ordering;

use crate::merge::covered_length;
use crate::models::{
    ComparisonParams, Document, Fragment, LengthNormalization, Match, MatchKind, PairReport,
};

/// Similarity of a fragment as a ratio in [0, 1].
///
/// `Min`, `Max` and `Average` divide the covered length by the respective
/// document lengths; `Combined` divides covered tokens on both sides by the
/// fragment's own spans.
pub fn fragment_score(
    fragment: &Fragment,
    len_a: usize,
    len_b: usize,
    normalization: LengthNormalization,
) -> f32 {
    let ratio = match normalization {
        LengthNormalization::Combined => ratio(
            (fragment.covered_a + fragment.covered_b) as f32,
            (fragment.span_a.len() + fragment.span_b.len()) as f32,
        ),
        other => ratio(
            fragment.covered_len() as f32,
            document_norm(len_a, len_b, other),
        ),
    };
    ratio.clamp(0.0, 1.0)
}

/// Score a fragment and promote it to a match if it passes both thresholds.
pub fn score_fragment(
    fragment: &Fragment,
    doc_a: &Document,
    doc_b: &Document,
    params: &ComparisonParams,
) -> Option<Match> {
    if fragment.covered_len() < params.min_fragment_length {
        return None;
    }

    let score = fragment_score(
        fragment,
        doc_a.token_count(),
        doc_b.token_count(),
        params.length_normalization,
    );
    if score < params.min_similarity {
        return None;
    }

    let kind = if fragment.covered_a == fragment.span_a.len()
        && fragment.covered_b == fragment.span_b.len()
        && fragment.span_a.len() == fragment.span_b.len()
    {
        MatchKind::Verbatim
    } else {
        MatchKind::Modified
    };

    Some(Match {
        id: 0,
        doc_a: doc_a.id,
        doc_b: doc_b.id,
        name_a: doc_a.name.clone(),
        name_b: doc_b.name.clone(),
        span_a: fragment.span_a,
        span_b: fragment.span_b,
        bytes_a: doc_a.byte_range(fragment.span_a),
        bytes_b: doc_b.byte_range(fragment.span_b),
        covered_len: fragment.covered_len(),
        covered_ranges_a: fragment.covered_ranges_a(),
        covered_ranges_b: fragment.covered_ranges_b(),
        seed_count: fragment.seeds.len(),
        score,
        kind,
        text_a: None,
        text_b: None,
    })
}

/// Overall similarity of a document pair from its matches. Tokens covered
/// by more than one match are counted once.
pub fn pair_similarity(
    matches: &[Match],
    len_a: usize,
    len_b: usize,
    normalization: LengthNormalization,
) -> f32 {
    let (covered_a, covered_b) = pair_coverage(matches);
    let ratio = match normalization {
        LengthNormalization::Combined => {
            ratio((covered_a + covered_b) as f32, (len_a + len_b) as f32)
        }
        other => ratio(
            covered_a.min(covered_b) as f32,
            document_norm(len_a, len_b, other),
        ),
    };
    ratio.clamp(0.0, 1.0)
}

/// Tokens covered by seed windows across all matches, in A and in B.
///
/// Uncovered gaps inside a match span do not count, so a pair never covers
/// more tokens than its matches do together.
pub fn pair_coverage(matches: &[Match]) -> (usize, usize) {
    (
        covered_length(matches.iter().flat_map(|m| m.covered_ranges_a.iter().copied())),
        covered_length(matches.iter().flat_map(|m| m.covered_ranges_b.iter().copied())),
    )
}

/// Build the report for one document pair.
pub fn pair_report(
    matches: &[Match],
    doc_a: &Document,
    doc_b: &Document,
    normalization: LengthNormalization,
) -> PairReport {
    let (covered_a, covered_b) = pair_coverage(matches);
    PairReport {
        doc_a: doc_a.id,
        doc_b: doc_b.id,
        name_a: doc_a.name.clone(),
        name_b: doc_b.name.clone(),
        match_count: matches.len(),
        covered_a,
        covered_b,
        similarity: pair_similarity(
            matches,
            doc_a.token_count(),
            doc_b.token_count(),
            normalization,
        ),
    }
}

/// Sort matches by descending score, then by document pair and position.
pub fn rank_matches(matches: &mut [Match]) {
    matches.sort_by(|a, b| {
        cmp_desc(a.score, b.score)
            .then_with(|| (a.doc_a, a.doc_b).cmp(&(b.doc_a, b.doc_b)))
            .then_with(|| (a.span_a, a.span_b).cmp(&(b.span_a, b.span_b)))
    });
}

/// Sort pair reports by descending similarity, then by document pair.
pub fn rank_pairs(pairs: &mut [PairReport]) {
    pairs.sort_by(|a, b| {
        cmp_desc(a.similarity, b.similarity)
            .then_with(|| (a.doc_a, a.doc_b).cmp(&(b.doc_a, b.doc_b)))
    });
}

fn cmp_desc(a: f32, b: f32) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

fn document_norm(len_a: usize, len_b: usize, normalization: LengthNormalization) -> f32 {
    match normalization {
        LengthNormalization::Min => len_a.min(len_b) as f32,
        LengthNormalization::Max => len_a.max(len_b) as f32,
        LengthNormalization::Average | LengthNormalization::Combined => {
            (len_a + len_b) as f32 / 2.0
        }
    }
}

#[inline]
fn ratio(numerator: f32, denominator: f32) -> f32 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}
