//! TIM: two-phase influence maximization over reverse-reachable sketches
//! (Tang, Xiao, Shi).
//!
//! Phase one samples θ reverse-reachable sets; phase two runs greedy maximum
//! coverage over them. θ is sized so the coverage solution is a
//! (1 - 1/e - ε)-approximation with probability at least `1 - n^(-ℓ)`, using
//! the paper's KPT* estimation to avoid the worst-case sketch count.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::evaluator::Evaluator;
use crate::graph::{Graph, NodeId, SeedSet};
use crate::influence::{InfluenceModel, SampleKind};
use crate::samples::{PathSampler, SampleManager};

type ReverseIndex = BTreeMap<NodeId, Vec<(NodeId, InfluenceModel)>>;

/// Approximation knobs for TIM.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimConfig {
    /// Approximation slack ε of the (1 - 1/e - ε) guarantee.
    pub epsilon: f64,
    /// Failure exponent ℓ: the guarantee holds with probability 1 - n^(-ℓ).
    pub ell: f64,
    /// Hard ceiling on generated sketches, so degenerate inputs (tiny KPT,
    /// tiny ε) cannot allocate without bound.
    pub max_sketches: usize,
}

impl Default for TimConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.2,
            ell: 1.0,
            max_sketches: 1_000_000,
        }
    }
}

/// Reverse-reachable sketch evaluator.
#[derive(Debug, Clone)]
pub struct TimEvaluator {
    cfg: TimConfig,
    rng: StdRng,
}

impl TimEvaluator {
    pub fn new(cfg: TimConfig) -> Self {
        Self::with_seed(cfg, 0)
    }

    pub fn with_seed(cfg: TimConfig, seed: u64) -> Self {
        Self {
            cfg,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// One reverse-reachable set: reverse BFS from `root`, traversing each
    /// in-edge with its sampled activation probability.
    fn rr_set(&mut self, rev: &ReverseIndex, kind: SampleKind, root: NodeId) -> Vec<NodeId> {
        let mut set = vec![root];
        let mut seen = SeedSet::from([root]);
        let mut frontier = vec![root];
        while let Some(v) = frontier.pop() {
            let Some(in_arcs) = rev.get(&v) else {
                continue;
            };
            for (u, inf) in in_arcs {
                if inf.attempt(kind, &mut self.rng) && seen.insert(*u) {
                    set.push(*u);
                    frontier.push(*u);
                }
            }
        }
        set
    }

    /// KPT* estimation (TIM Algorithm 2): iterative halving over RR-set
    /// widths. Returns a lower bound on the expected spread of the optimal
    /// size-k set, floored at 1.
    fn kpt_estimate(
        &mut self,
        nodes: &[NodeId],
        rev: &ReverseIndex,
        kind: SampleKind,
        m: usize,
        k: usize,
    ) -> f64 {
        let n = nodes.len() as f64;
        if n <= 1.0 || m == 0 {
            return 1.0;
        }
        let log2n = n.log2().max(1.0);
        let rounds = log2n as usize;
        for i in 1..=rounds {
            let ci = ((6.0 * self.cfg.ell * n.ln() + 6.0 * log2n.ln()) * 2f64.powi(i as i32))
                .ceil() as usize;
            let ci = ci.clamp(1, self.cfg.max_sketches);
            let mut sum = 0.0;
            for _ in 0..ci {
                let root = nodes[self.rng.random_range(0..nodes.len())];
                let rr = self.rr_set(rev, kind, root);
                let width: usize = rr
                    .iter()
                    .map(|v| rev.get(v).map(Vec::len).unwrap_or(0))
                    .sum();
                let frac = width as f64 / m as f64;
                sum += 1.0 - (1.0 - frac).powi(k as i32);
            }
            if sum / ci as f64 > 0.5f64.powi(i as i32) {
                return (n * sum / (2.0 * ci as f64)).max(1.0);
            }
        }
        1.0
    }

    /// Sketch count θ = (8 + 2ε) n (ℓ ln n + ln C(n,k) + ln 2) / (ε² KPT).
    fn sketch_count(&self, n: usize, k: usize, kpt: f64) -> usize {
        let nf = n as f64;
        let eps = self.cfg.epsilon.clamp(1e-3, 1.0);
        let ln_binom: f64 = (0..k.min(n))
            .map(|i| ((nf - i as f64) / (i as f64 + 1.0)).ln())
            .sum();
        let lambda =
            (8.0 + 2.0 * eps) * nf * (self.cfg.ell * nf.ln().max(1.0) + ln_binom + 2f64.ln());
        let theta = lambda / (eps * eps * kpt.max(1.0));
        (theta.ceil() as usize).clamp(1, self.cfg.max_sketches)
    }
}

impl Evaluator for TimEvaluator {
    fn select(
        &mut self,
        graph: &Graph,
        sampler: &PathSampler,
        _samples: &mut SampleManager,
        activated: &SeedSet,
        k: usize,
    ) -> SeedSet {
        let nodes: Vec<NodeId> = graph.nodes().collect();
        if nodes.is_empty() || k == 0 {
            return SeedSet::new();
        }
        let rev = graph.reverse_index();
        let kind = sampler.kind();

        let kpt = self.kpt_estimate(&nodes, &rev, kind, graph.edge_count(), k);
        let theta = self.sketch_count(nodes.len(), k, kpt);

        // Phase 1: sketches, plus the node -> sketch occurrence lists the
        // coverage phase walks.
        let mut occurrences: BTreeMap<NodeId, Vec<usize>> = BTreeMap::new();
        let mut sketches: Vec<Vec<NodeId>> = Vec::with_capacity(theta);
        for idx in 0..theta {
            let root = nodes[self.rng.random_range(0..nodes.len())];
            let rr = self.rr_set(&rev, kind, root);
            for &v in &rr {
                occurrences.entry(v).or_default().push(idx);
            }
            sketches.push(rr);
        }

        // Phase 2: greedy maximum coverage. Activated nodes stay inside the
        // sketches (they still witness influence); they are only barred from
        // being selected.
        let mut covered = vec![false; sketches.len()];
        let mut chosen = SeedSet::new();
        while chosen.len() < k {
            let best = nodes
                .iter()
                .copied()
                .filter(|v| !activated.contains(v) && !chosen.contains(v))
                .map(|v| {
                    let count = occurrences
                        .get(&v)
                        .map(|ids| ids.iter().filter(|&&i| !covered[i]).count())
                        .unwrap_or(0);
                    (count, Reverse(v))
                })
                .max();
            let Some((_, Reverse(pick))) = best else {
                break;
            };
            chosen.insert(pick);
            if let Some(ids) = occurrences.get(&pick) {
                for &i in ids {
                    covered[i] = true;
                }
            }
        }
        chosen
    }
}
