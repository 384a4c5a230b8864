//! Pairwise comparison orchestration.
//!
//! This module coordinates the full detection pipeline over a corpus:
//! normalization, indexing, seeding, extension, scoring and ranking.

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{debug, info};

use crate::corpus::Corpus;
use crate::extend::extend;
use crate::fingerprint::{all_pairs, FingerprintIndex};
use crate::models::*;
use crate::normalize::normalize;
use crate::score::{pair_report, rank_matches, rank_pairs, score_fragment};
use crate::seed::generate_seeds;

/// Normalize raw documents in parallel. Ids are positions in `raw`.
pub fn prepare_documents(raw: &[RawDocument], options: &NormalizeOptions) -> Vec<Document> {
    raw.par_iter()
        .enumerate()
        .map(|(id, doc)| Document {
            id,
            name: doc.name.clone(),
            text: doc.text.clone(),
            tokens: normalize(&doc.text, options),
        })
        .collect()
}

/// Fragments shared by two documents.
///
/// The pair is always processed with the lower id as A, so calling with the
/// arguments reversed gives the same fragments with the sides swapped.
pub fn find_fragments(
    doc_a: &Document,
    doc_b: &Document,
    index: &FingerprintIndex,
    params: &ComparisonParams,
) -> Vec<Fragment> {
    if doc_a.id > doc_b.id {
        let mut fragments: Vec<Fragment> = find_fragments(doc_b, doc_a, index, params)
            .iter()
            .map(Fragment::swapped)
            .collect();
        fragments.sort_by_key(|f| (f.span_a.start, f.span_b.start));
        return fragments;
    }

    let seeds = generate_seeds(doc_a, doc_b, index, params.verify_seeds);
    let seed_count = seeds.len();
    let mut fragments = extend(seeds, params.gap_tolerance, params.min_fragment_length);

    // Unverified seeds may be collisions: a lone one is not evidence
    if !params.verify_seeds {
        fragments.retain(|f| f.seeds.len() >= 2);
    }

    debug!(
        doc_a = doc_a.id,
        doc_b = doc_b.id,
        seeds = seed_count,
        fragments = fragments.len(),
        "extended pair"
    );
    fragments
}

/// Scored matches between two documents, sorted by position in A.
pub fn compare_pair(
    doc_a: &Document,
    doc_b: &Document,
    index: &FingerprintIndex,
    params: &ComparisonParams,
) -> Vec<Match> {
    if doc_a.id > doc_b.id {
        let mut matches: Vec<Match> = compare_pair(doc_b, doc_a, index, params)
            .into_iter()
            .map(Match::swapped)
            .collect();
        matches.sort_by_key(|m| (m.span_a, m.span_b));
        return matches;
    }

    find_fragments(doc_a, doc_b, index, params)
        .iter()
        .filter_map(|f| score_fragment(f, doc_a, doc_b, params))
        .collect()
}

/// Compare two texts directly, without a corpus.
pub fn compare_documents(
    name_a: &str,
    text_a: &str,
    name_b: &str,
    text_b: &str,
    params: &ComparisonParams,
) -> Result<Vec<Match>, ParamsError> {
    params.validate()?;

    let raw = [
        RawDocument {
            name: name_a.to_string(),
            text: text_a.to_string(),
        },
        RawDocument {
            name: name_b.to_string(),
            text: text_b.to_string(),
        },
    ];
    let documents = prepare_documents(&raw, &params.normalize);
    let index = FingerprintIndex::build(&documents, params.window_size);

    let mut matches = compare_pair(&documents[0], &documents[1], &index, params);
    for (i, m) in matches.iter_mut().enumerate() {
        m.id = i as u64 + 1;
    }
    Ok(matches)
}

/// Run detection over a whole corpus.
pub fn detect(
    corpus: &Corpus,
    params: &ComparisonParams,
    show_progress: bool,
) -> Result<DetectionResult, ParamsError> {
    detect_with_cancel(corpus, params, show_progress, &AtomicBool::new(false))
}

/// Run detection, checking `cancel` before each document pair.
///
/// Once `cancel` is set no further pairs start; pairs already running
/// finish. The result then covers only the completed pairs and is marked
/// partial.
pub fn detect_with_cancel(
    corpus: &Corpus,
    params: &ComparisonParams,
    show_progress: bool,
    cancel: &AtomicBool,
) -> Result<DetectionResult, ParamsError> {
    params.validate()?;

    info!(
        documents = corpus.len(),
        common = corpus.common.len(),
        "normalizing documents"
    );
    let mut documents = prepare_documents(&corpus.documents, &params.normalize);
    let common = prepare_documents(&corpus.common, &params.normalize);
    let total_tokens: usize = documents.iter().map(Document::token_count).sum();

    info!(window_size = params.window_size, "building fingerprint index");
    let index = FingerprintIndex::build_with_common(&documents, &common, params.window_size);
    drop(common);
    info!(
        fingerprints = index.total_fingerprints(),
        distinct = index.distinct_hashes(),
        masked = index.masked_hashes(),
        "index built"
    );

    if !params.keep_token_text {
        documents.par_iter_mut().for_each(Document::drop_token_text);
    }

    let pairs = if params.brute_force {
        all_pairs(documents.len())
    } else {
        index.candidate_pairs()
    };
    info!(
        pairs = pairs.len(),
        brute_force = params.brute_force,
        "comparing document pairs"
    );

    let progress = if show_progress {
        let pb = ProgressBar::new(pairs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let compared = AtomicUsize::new(0);
    let results: Vec<(PairReport, Vec<Match>)> = pairs
        .par_iter()
        .filter_map(|&(a, b)| {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }

            let (doc_a, doc_b) = (&documents[a], &documents[b]);
            let matches = compare_pair(doc_a, doc_b, &index, params);
            compared.fetch_add(1, Ordering::Relaxed);

            if let Some(ref pb) = progress {
                pb.inc(1);
            }

            if matches.is_empty() {
                return None;
            }
            let report = pair_report(&matches, doc_a, doc_b, params.length_normalization);
            Some((report, matches))
        })
        .collect();

    let pairs_compared = compared.into_inner();
    let partial = pairs_compared < pairs.len();

    if let Some(pb) = progress {
        if partial {
            pb.abandon_with_message("Cancelled");
        } else {
            pb.finish_with_message("Done");
        }
    }

    let (mut reports, matches): (Vec<PairReport>, Vec<Vec<Match>>) = results.into_iter().unzip();
    let mut matches: Vec<Match> = matches.into_iter().flatten().collect();

    rank_matches(&mut matches);
    for (i, m) in matches.iter_mut().enumerate() {
        m.id = i as u64 + 1;
    }
    rank_pairs(&mut reports);

    info!(
        pairs_compared,
        suspicious_pairs = reports.len(),
        matches = matches.len(),
        partial,
        "detection finished"
    );

    let summary = RunSummary {
        document_count: documents.len(),
        common_document_count: corpus.common.len(),
        skipped: corpus.unavailable.clone(),
        total_tokens,
        candidate_pairs: pairs.len(),
        pairs_compared,
        suspicious_pairs: reports.len(),
        match_count: matches.len(),
        partial,
    };

    Ok(DetectionResult {
        version: env!("CARGO_PKG_VERSION").to_string(),
        parameters: params.clone(),
        summary,
        pairs: reports,
        matches,
    })
}

/// Fill in matched passages with `context_chars` characters of context.
pub fn attach_text(result: &mut DetectionResult, corpus: &Corpus, context_chars: usize) {
    for m in &mut result.matches {
        if let (Some(a), Some(b)) = (corpus.documents.get(m.doc_a), corpus.documents.get(m.doc_b)) {
            m.text_a = Some(PassageText::extract(&a.text, m.bytes_a, context_chars));
            m.text_b = Some(PassageText::extract(&b.text, m.bytes_b, context_chars));
        }
    }
}

/// Statistics about a corpus and its fingerprint index, without comparing.
pub fn corpus_stats(corpus: &Corpus, params: &ComparisonParams) -> Result<CorpusStats, ParamsError> {
    params.validate()?;

    let documents = prepare_documents(&corpus.documents, &params.normalize);
    let common = prepare_documents(&corpus.common, &params.normalize);
    let index = FingerprintIndex::build_with_common(&documents, &common, params.window_size);

    Ok(CorpusStats {
        document_count: documents.len(),
        common_document_count: common.len(),
        skipped_count: corpus.unavailable.len(),
        total_tokens: documents.iter().map(Document::token_count).sum(),
        total_fingerprints: index.total_fingerprints(),
        distinct_hashes: index.distinct_hashes(),
        masked_hashes: index.masked_hashes(),
        candidate_pairs: index.candidate_pairs().len(),
    })
}
