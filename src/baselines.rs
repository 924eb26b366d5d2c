//! Degree and random baselines.
//!
//! These are the cheap reference points the online strategies are measured
//! against: uniform random seeds, top-k out-degree, and the Chen-Wang-Yang
//! single-discount heuristic.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::evaluator::Evaluator;
use crate::graph::{Graph, NodeId, SeedSet};
use crate::samples::{PathSampler, SampleManager};

/// Uniform random k-subset of the non-activated nodes.
#[derive(Debug, Clone)]
pub struct RandomEvaluator {
    rng: StdRng,
}

impl RandomEvaluator {
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator for RandomEvaluator {
    fn select(
        &mut self,
        graph: &Graph,
        _sampler: &PathSampler,
        _samples: &mut SampleManager,
        activated: &SeedSet,
        k: usize,
    ) -> SeedSet {
        let mut candidates: Vec<NodeId> =
            graph.nodes().filter(|n| !activated.contains(n)).collect();
        let take = k.min(candidates.len());
        let (picked, _) = candidates.partial_shuffle(&mut self.rng, take);
        picked.iter().copied().collect()
    }
}

/// Top-k nodes by out-degree; ties go to the smaller id.
#[derive(Debug, Clone, Copy, Default)]
pub struct HighestDegreeEvaluator;

impl HighestDegreeEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl Evaluator for HighestDegreeEvaluator {
    fn select(
        &mut self,
        graph: &Graph,
        _sampler: &PathSampler,
        _samples: &mut SampleManager,
        activated: &SeedSet,
        k: usize,
    ) -> SeedSet {
        let mut ranked: Vec<(usize, NodeId)> = graph
            .nodes()
            .filter(|n| !activated.contains(n))
            .map(|n| (graph.out_degree(n), n))
            .collect();
        ranked.sort_by_key(|&(deg, id)| (Reverse(deg), id));
        ranked.into_iter().take(k).map(|(_, id)| id).collect()
    }
}

/// Single-discount degree heuristic: after each pick, every out-neighbour of
/// the picked node has its effective degree reduced by one, since one of its
/// potential targets is now expected to be reached anyway.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscountDegreeEvaluator;

impl DiscountDegreeEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl Evaluator for DiscountDegreeEvaluator {
    fn select(
        &mut self,
        graph: &Graph,
        _sampler: &PathSampler,
        _samples: &mut SampleManager,
        activated: &SeedSet,
        k: usize,
    ) -> SeedSet {
        let mut degree: BTreeMap<NodeId, i64> = graph
            .nodes()
            .filter(|n| !activated.contains(n))
            .map(|n| (n, graph.out_degree(n) as i64))
            .collect();

        let mut chosen = SeedSet::new();
        for _ in 0..k {
            let Some((&best, _)) = degree
                .iter()
                .filter(|(n, _)| !chosen.contains(*n))
                .max_by_key(|&(&n, &d)| (d, Reverse(n)))
            else {
                break;
            };
            chosen.insert(best);
            for arc in graph.neighbours(best) {
                if let Some(d) = degree.get_mut(&arc.target) {
                    *d -= 1;
                }
            }
        }
        chosen
    }
}
