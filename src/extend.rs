//! Cluster extension: seeds into gap-tolerant fragments.
//!
//! Seeds are scanned once in `(start_a, start_b)` order while an explicit
//! list of active clusters is maintained. A seed reaches a cluster when some
//! seed of that cluster lies within `gap_tolerance` of it in both documents
//! and on a diagonal at most `gap_tolerance` away. The seed joins the reached
//! cluster with the closest diagonal and bridges every other cluster it
//! reaches into that one; a seed reaching nothing opens a new cluster. A
//! cluster closes as soon as the scan moves past the point where any later
//! seed could still reach it.
//!
//! Reach between two seeds only grows with `gap_tolerance`, so a fragment
//! found at one tolerance is contained in a fragment found at any larger
//! tolerance.

use crate::merge::merge_overlapping_fragments;
use crate::models::{Fragment, Seed};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClusterState {
    Open,
    Closed,
}

/// Active-list entry built up during the scan.
#[derive(Debug, Clone)]
struct Cluster {
    state: ClusterState,
    end_a: usize,
    // Sorted by (start_a, start_b). Seeds of one pair share the window
    // length, so this is also end order.
    seeds: Vec<Seed>,
}

impl Cluster {
    fn open(seed: Seed) -> Self {
        Cluster {
            state: ClusterState::Open,
            end_a: seed.end_a(),
            seeds: vec![seed],
        }
    }

    /// Smallest diagonal drift to a seed of this cluster that reaches `seed`.
    fn drift_if_accepts(&self, seed: &Seed, gap_tolerance: usize) -> Option<u64> {
        if self.state != ClusterState::Open {
            return None;
        }
        let mut best: Option<u64> = None;
        for member in self.seeds.iter().rev() {
            if member.end_a().saturating_add(gap_tolerance) < seed.start_a {
                break;
            }
            if let Some(drift) = reach(member, seed, gap_tolerance) {
                best = Some(best.map_or(drift, |b| b.min(drift)));
                if drift == 0 {
                    break;
                }
            }
        }
        best
    }

    fn push(&mut self, seed: Seed) {
        self.end_a = self.end_a.max(seed.end_a());
        self.seeds.push(seed);
    }

    fn absorb(&mut self, seeds: Vec<Seed>) {
        if seeds.is_empty() {
            return;
        }
        self.seeds.extend(seeds);
        self.seeds.sort_unstable_by_key(|s| (s.start_a, s.start_b));
        self.end_a = self.seeds.iter().map(Seed::end_a).fold(self.end_a, usize::max);
    }

    /// No later seed (start_a >= position) can reach this cluster.
    fn is_stale(&self, position: usize, gap_tolerance: usize) -> bool {
        self.end_a.saturating_add(gap_tolerance) < position
    }
}

/// Diagonal drift between two seeds if they lie within `gap_tolerance` of
/// each other in both documents. Symmetric in its arguments.
fn reach(x: &Seed, y: &Seed, gap_tolerance: usize) -> Option<u64> {
    let drift = x.diagonal().abs_diff(y.diagonal());
    let near = |x_start: usize, x_end: usize, y_start: usize, y_end: usize| {
        y_start <= x_end.saturating_add(gap_tolerance)
            && x_start <= y_end.saturating_add(gap_tolerance)
    };
    let reaches = drift <= gap_tolerance as u64
        && near(x.start_a, x.end_a(), y.start_a, y.end_a())
        && near(x.start_b, x.end_b(), y.start_b, y.end_b());
    reaches.then_some(drift)
}

/// Extend seeds of one document pair into fragments.
///
/// Fragments whose covered length is below `min_fragment_length` are
/// dropped. Returned fragments never overlap in both documents and are
/// sorted by span start in A, then B.
pub fn extend(seeds: Vec<Seed>, gap_tolerance: usize, min_fragment_length: usize) -> Vec<Fragment> {
    if seeds.is_empty() {
        return Vec::new();
    }

    let fragments: Vec<Fragment> = scan(seeds, gap_tolerance)
        .into_iter()
        .map(|c| Fragment::from_seeds(c.seeds))
        .collect();

    merge_overlapping_fragments(fragments)
        .into_iter()
        .filter(|f| f.covered_len() >= min_fragment_length)
        .collect()
}

/// Single sorted pass assigning every seed to a cluster. All returned
/// clusters are closed.
fn scan(mut seeds: Vec<Seed>, gap_tolerance: usize) -> Vec<Cluster> {
    seeds.sort_unstable_by_key(|s| (s.start_a, s.start_b));

    let mut active: Vec<Cluster> = Vec::new();
    let mut closed: Vec<Cluster> = Vec::new();

    for seed in seeds {
        for cluster in active.iter_mut() {
            if cluster.is_stale(seed.start_a, gap_tolerance) {
                cluster.state = ClusterState::Closed;
            }
        }
        let (still_open, done): (Vec<Cluster>, Vec<Cluster>) = active
            .into_iter()
            .partition(|c| c.state == ClusterState::Open);
        active = still_open;
        closed.extend(done);

        // Closest diagonal wins; ties go to the earliest opened cluster
        let mut reached: Vec<(u64, usize)> = active
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.drift_if_accepts(&seed, gap_tolerance).map(|d| (d, i)))
            .collect();
        reached.sort_unstable();

        match reached.split_first() {
            Some((&(_, keep), others)) => {
                let mut bridged = Vec::new();
                for &(_, i) in others {
                    bridged.append(&mut active[i].seeds);
                }
                active[keep].push(seed);
                active[keep].absorb(bridged);
                active.retain(|c| !c.seeds.is_empty());
            }
            None => active.push(Cluster::open(seed)),
        }
    }

    closed.extend(active.into_iter().map(|mut c| {
        c.state = ClusterState::Closed;
        c
    }));
    closed
}
