//! Reusable live-edge samples for path-based spread estimation.
//!
//! Evaluators that probe many candidate seed sets per round (CELF most of
//! all) would otherwise re-simulate the same single-seed cascades thousands
//! of times. [`SampleManager`] caches per-seed reachable sets keyed by trial
//! index; each entry's RNG stream is derived from `(cache seed, seed node,
//! trial index)`, so a cache entry is identical no matter when or in what
//! order it is materialized.
//!
//! Invalidation is explicit: strategies call [`SampleManager::reset`] once
//! posteriors have shifted enough to matter. The cache also resets itself if
//! queried under a different [`SampleKind`] than it was filled with.

use std::collections::{BTreeMap, VecDeque};

use crate::graph::{Graph, NodeId, SeedSet};
use crate::influence::SampleKind;
use crate::sampler::SpreadSampler;
use crate::stable_hash::trial_seed;

/// Default bound on distinct seed nodes kept in the cache.
pub const DEFAULT_SEED_CAPACITY: usize = 10_000;

/// Process-wide (per-strategy) cache of per-seed reachable sets.
#[derive(Debug, Clone)]
pub struct SampleManager {
    seed: u64,
    capacity: usize,
    kind: Option<SampleKind>,
    entries: BTreeMap<NodeId, Vec<SeedSet>>,
    lru: VecDeque<NodeId>,
}

impl SampleManager {
    /// Cache with the default capacity; `seed` fixes every derived RNG
    /// stream.
    pub fn new(seed: u64) -> Self {
        Self::with_capacity(seed, DEFAULT_SEED_CAPACITY)
    }

    pub fn with_capacity(seed: u64, capacity: usize) -> Self {
        Self {
            seed,
            capacity: capacity.max(1),
            kind: None,
            entries: BTreeMap::new(),
            lru: VecDeque::new(),
        }
    }

    /// Number of seed nodes currently cached.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all cached samples. Call after posterior updates.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.kind = None;
    }

    /// The reachable set of `seed_node` in live-edge trial `trial`.
    ///
    /// A miss runs one forward IC trial with a deterministic derived RNG; a
    /// hit returns the cached set. Touching a seed refreshes its LRU slot;
    /// the least-recently used seed is evicted when the capacity bound is
    /// exceeded.
    pub fn reachable(
        &mut self,
        graph: &Graph,
        kind: SampleKind,
        seed_node: NodeId,
        trial: usize,
    ) -> &SeedSet {
        if self.kind != Some(kind) {
            self.reset();
            self.kind = Some(kind);
        }

        if !self.entries.contains_key(&seed_node) && self.entries.len() >= self.capacity {
            if let Some(evicted) = self.lru.pop_front() {
                self.entries.remove(&evicted);
            }
        }
        self.touch(seed_node);

        let seed = self.seed;
        let samples = self.entries.entry(seed_node).or_default();
        while samples.len() <= trial {
            let t = samples.len();
            let rng_seed = trial_seed(seed, seed_node, t as u64);
            samples.push(SpreadSampler::reachable_once(graph, seed_node, kind, rng_seed));
        }
        &samples[trial]
    }

    fn touch(&mut self, seed_node: NodeId) {
        if let Some(pos) = self.lru.iter().position(|&n| n == seed_node) {
            self.lru.remove(pos);
        }
        self.lru.push_back(seed_node);
    }
}

/// Spread estimator over memoized live-edge samples.
///
/// Where [`SpreadSampler`] answers "how far does this exact set spread", the
/// path sampler answers "how many nodes does this candidate set reach per
/// trial", reusing per-seed reachability across the many candidate sets an
/// evaluator probes within one round.
#[derive(Debug, Clone, Copy)]
pub struct PathSampler {
    kind: SampleKind,
    trials: usize,
}

impl PathSampler {
    pub fn new(kind: SampleKind, trials: usize) -> Self {
        Self {
            kind,
            trials: trials.max(1),
        }
    }

    pub fn kind(&self) -> SampleKind {
        self.kind
    }

    pub fn trials(&self) -> usize {
        self.trials
    }

    /// Estimated spread of `seeds`: mean over trials of the size of the
    /// union of per-seed reachable sets, minus nodes already activated.
    pub fn spread<I>(
        &self,
        graph: &Graph,
        samples: &mut SampleManager,
        activated: &SeedSet,
        seeds: I,
    ) -> f64
    where
        I: IntoIterator<Item = NodeId> + Clone,
    {
        let mut total = 0usize;
        for trial in 0..self.trials {
            let mut reached = SeedSet::new();
            for s in seeds.clone() {
                reached.extend(samples.reachable(graph, self.kind, s, trial).iter().copied());
            }
            total += reached.iter().filter(|n| !activated.contains(*n)).count();
        }
        total as f64 / self.trials as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::influence::InfluenceModel;

    fn line_graph() -> Graph {
        let mut g = Graph::new();
        g.add_edge(0, 1, InfluenceModel::point(1.0));
        g.add_edge(1, 2, InfluenceModel::point(1.0));
        g
    }

    #[test]
    fn cache_entries_are_call_order_independent() {
        let g = line_graph();
        let mut a = SampleManager::new(11);
        let mut b = SampleManager::new(11);
        // Fill in different orders.
        let a2 = a.reachable(&g, SampleKind::Mean, 0, 2).clone();
        let _ = b.reachable(&g, SampleKind::Mean, 1, 0);
        let b2 = b.reachable(&g, SampleKind::Mean, 0, 2).clone();
        assert_eq!(a2, b2);
    }

    #[test]
    fn kind_change_resets_the_cache() {
        let g = line_graph();
        let mut m = SampleManager::new(0);
        let _ = m.reachable(&g, SampleKind::Mean, 0, 0);
        assert_eq!(m.len(), 1);
        let _ = m.reachable(&g, SampleKind::Upper, 1, 0);
        assert_eq!(m.len(), 1, "mean-kind entry should have been dropped");
    }

    #[test]
    fn lru_evicts_the_coldest_seed() {
        let g = line_graph();
        let mut m = SampleManager::with_capacity(0, 2);
        let _ = m.reachable(&g, SampleKind::Mean, 0, 0);
        let _ = m.reachable(&g, SampleKind::Mean, 1, 0);
        let _ = m.reachable(&g, SampleKind::Mean, 0, 0); // refresh 0
        let _ = m.reachable(&g, SampleKind::Mean, 2, 0); // evicts 1
        assert_eq!(m.len(), 2);
        assert!(m.entries.contains_key(&0));
        assert!(m.entries.contains_key(&2));
    }

    #[test]
    fn path_spread_unions_per_seed_reach() {
        let g = line_graph();
        let mut m = SampleManager::new(3);
        let ps = PathSampler::new(SampleKind::Mean, 4);
        let spread = ps.spread(&g, &mut m, &SeedSet::new(), [0u64]);
        assert_eq!(spread, 3.0);
        // Overlapping seeds do not double count.
        let spread2 = ps.spread(&g, &mut m, &SeedSet::new(), [0u64, 1u64]);
        assert_eq!(spread2, 3.0);
    }

    #[test]
    fn activated_nodes_are_excluded_from_spread() {
        let g = line_graph();
        let mut m = SampleManager::new(3);
        let ps = PathSampler::new(SampleKind::Mean, 2);
        let spread = ps.spread(&g, &mut m, &SeedSet::from([2]), [0u64]);
        assert_eq!(spread, 2.0);
    }
}
