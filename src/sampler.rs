//! Forward simulation of Independent-Cascade diffusion.
//!
//! One trial is a frontier BFS: every live node attempts each outgoing arc
//! exactly once, a fired arc activates its target into the next frontier, and
//! the trial stops when no new activations occur. The sampler aggregates over
//! trials: a spread estimate, the union of activated nodes, and per-arc
//! trial/hit counts for posterior updates.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::graph::{Graph, NodeId, SeedSet};
use crate::influence::SampleKind;

/// Per-arc counts over one batch of trials: how often the source was live
/// (`trials`) and how often the arc fired given that (`hits`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArcTrials {
    pub trials: u64,
    pub hits: u64,
}

/// Aggregate outcome of a batch of IC trials.
#[derive(Debug, Clone, Default)]
pub struct CascadeOutcome {
    /// Mean number of nodes activated per trial (seeds included, prior
    /// activations excluded).
    pub mean_spread: f64,
    /// Union of nodes activated in any trial.
    pub activated: SeedSet,
    /// Per-arc trial/hit counts, keyed `(source, target)`.
    pub arc_trials: BTreeMap<(NodeId, NodeId), ArcTrials>,
}

/// Timing summary of a whole-graph single-seed sampling pass.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BenchmarkReport {
    pub node_count: usize,
    pub edge_count: usize,
    pub total_secs: f64,
    /// Wall-clock milliseconds spent per trial per node.
    pub per_sample_per_node_ms: f64,
}

/// Monte-Carlo spread sampler with its own RNG.
#[derive(Debug, Clone)]
pub struct SpreadSampler {
    kind: SampleKind,
    rng: StdRng,
}

impl SpreadSampler {
    /// Deterministic by default (seed 0).
    pub fn new(kind: SampleKind) -> Self {
        Self::with_seed(kind, 0)
    }

    pub fn with_seed(kind: SampleKind, seed: u64) -> Self {
        Self {
            kind,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn kind(&self) -> SampleKind {
        self.kind
    }

    /// Run `trials` independent diffusions from `seeds`.
    ///
    /// Nodes in `prior` count as already activated: they contribute no
    /// spread, cannot be re-activated, and do not attempt their arcs. Seeds
    /// that are themselves in `prior` are skipped the same way.
    pub fn sample(
        &mut self,
        graph: &Graph,
        prior: &SeedSet,
        seeds: &SeedSet,
        trials: u64,
    ) -> CascadeOutcome {
        let mut outcome = CascadeOutcome::default();
        if trials == 0 || seeds.is_empty() {
            return outcome;
        }

        let mut total_spread = 0u64;
        for _ in 0..trials {
            let mut active: SeedSet = SeedSet::new();
            let mut frontier: Vec<NodeId> = Vec::new();
            for &s in seeds {
                if !prior.contains(&s) && active.insert(s) {
                    frontier.push(s);
                }
            }

            while let Some(u) = frontier.pop() {
                for arc in graph.neighbours(u) {
                    let counts = outcome.arc_trials.entry((u, arc.target)).or_default();
                    counts.trials += 1;
                    if arc.influence.attempt(self.kind, &mut self.rng) {
                        counts.hits += 1;
                        if !prior.contains(&arc.target) && active.insert(arc.target) {
                            frontier.push(arc.target);
                        }
                    }
                }
            }

            total_spread += active.len() as u64;
            outcome.activated.append(&mut active);
        }

        outcome.mean_spread = total_spread as f64 / trials as f64;
        outcome
    }

    /// Time `trials` single-seed diffusions from every node of `graph`.
    ///
    /// This is the measurement behind the benchmark operating mode; it is a
    /// library function so the reported numbers are testable without going
    /// through stdout.
    pub fn benchmark_single_seeds(
        graph: &Graph,
        trials: u64,
        seed: u64,
    ) -> BenchmarkReport {
        let mut sampler = SpreadSampler::with_seed(SampleKind::Mean, seed);
        let activated = SeedSet::new();
        let trials = trials.max(1);
        let start = std::time::Instant::now();
        for node in graph.nodes() {
            let seeds = SeedSet::from([node]);
            let _ = sampler.sample(graph, &activated, &seeds, trials);
        }
        let total_secs = start.elapsed().as_secs_f64();
        let nodes = graph.node_count().max(1);
        BenchmarkReport {
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            total_secs,
            per_sample_per_node_ms: total_secs * 1000.0 / nodes as f64 / trials as f64,
        }
    }

    /// One live-edge trial from a single seed, as a reachable set.
    ///
    /// Used by the sample cache to materialize per-seed reachability under a
    /// dedicated RNG stream, so entries do not depend on call order.
    pub fn reachable_once(graph: &Graph, seed: NodeId, kind: SampleKind, rng_seed: u64) -> SeedSet {
        let mut rng = StdRng::seed_from_u64(rng_seed);
        let mut reach = SeedSet::new();
        if !graph.contains(seed) {
            return reach;
        }
        reach.insert(seed);
        let mut frontier = vec![seed];
        while let Some(u) = frontier.pop() {
            for arc in graph.neighbours(u) {
                if arc.influence.attempt(kind, &mut rng) && reach.insert(arc.target) {
                    frontier.push(arc.target);
                }
            }
        }
        reach
    }
}
