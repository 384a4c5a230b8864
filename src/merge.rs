//! Merge overlapping fragments and range unions.
//!
//! Extension can close two fragments that still share tokens on both
//! sides (for example when repeated text opens parallel clusters). Those are
//! merged here so no token range is counted twice.

use crate::models::Fragment;

/// Merge fragments of one document pair that overlap in both A and B.
///
/// Output is sorted by span start in A, then in B.
pub fn merge_overlapping_fragments(mut fragments: Vec<Fragment>) -> Vec<Fragment> {
    if fragments.len() <= 1 {
        return fragments;
    }

    fragments.sort_by_key(|f| (f.doc_a, f.doc_b, f.span_a.start, f.span_b.start));

    let mut merged: Vec<Fragment> = Vec::with_capacity(fragments.len());

    for fragment in fragments {
        // Merging can widen a span enough to reach an earlier entry, so look
        // at every retained fragment of the pair, not only the last one.
        let mut current = fragment;
        while let Some(pos) = merged.iter().position(|m| fragments_overlap(m, &current)) {
            let existing = merged.remove(pos);
            current = merge_two_fragments(existing, current);
        }
        merged.push(current);
    }

    merged.sort_by_key(|f| (f.doc_a, f.doc_b, f.span_a.start, f.span_b.start));
    merged
}

/// Check if two fragments overlap in both documents.
fn fragments_overlap(a: &Fragment, b: &Fragment) -> bool {
    a.doc_a == b.doc_a
        && a.doc_b == b.doc_b
        && a.span_a.overlaps(&b.span_a)
        && a.span_b.overlaps(&b.span_b)
}

fn merge_two_fragments(a: Fragment, b: Fragment) -> Fragment {
    let mut seeds = a.seeds;
    seeds.extend(b.seeds);
    Fragment::from_seeds(seeds)
}

/// Number of positions covered by a set of half-open ranges.
pub fn covered_length<I>(ranges: I) -> usize
where
    I: IntoIterator<Item = (usize, usize)>,
{
    let mut ranges: Vec<(usize, usize)> = ranges.into_iter().filter(|(s, e)| s < e).collect();
    ranges.sort_unstable();
    merge_ranges(&ranges).iter().map(|(s, e)| e - s).sum()
}

/// Merge sorted ranges into non-overlapping ranges.
pub fn merge_ranges(ranges: &[(usize, usize)]) -> Vec<(usize, usize)> {
    if ranges.is_empty() {
        return Vec::new();
    }

    let mut merged: Vec<(usize, usize)> = Vec::new();
    let mut current = ranges[0];

    for &(start, end) in &ranges[1..] {
        if start <= current.1 {
            // Overlapping or touching - extend current range
            current.1 = current.1.max(end);
        } else {
            merged.push(current);
            current = (start, end);
        }
    }
    merged.push(current);

    merged
}
