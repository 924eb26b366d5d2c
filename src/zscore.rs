//! Z-score (UCB-style) arbitration over a pool of evaluators.
//!
//! Each evaluator's most recent spread is standardized against the pooled
//! spread history; the pick is the evaluator with the highest standardized
//! score plus an exploration bonus that shrinks with use. The first pass is
//! round-robin so every evaluator has at least one observation.

use crate::evaluator::Evaluator;
use crate::graph::{Graph, SeedSet};
use crate::influence::SampleKind;
use crate::sampler::SpreadSampler;
use crate::samples::{PathSampler, SampleManager};
use crate::strategy::{observe_round, seconds_since, CachePolicy, RoundReport, Strategy};

/// Knobs for [`ZScoresStrategy`].
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ZScoresConfig {
    /// Monte-Carlo trials per selection and per replay.
    pub trials: u64,
    /// Whether observed trials update the posteriors.
    pub update: bool,
    /// Edge reading used for selection.
    pub kind: SampleKind,
    pub cache: CachePolicy,
    pub seed: u64,
}

impl Default for ZScoresConfig {
    fn default() -> Self {
        Self {
            trials: 100,
            update: true,
            kind: SampleKind::Mean,
            cache: CachePolicy::default(),
            seed: 0,
        }
    }
}

/// One pooled evaluator and its observed spreads.
struct PoolEntry {
    name: String,
    evaluator: Box<dyn Evaluator>,
    spreads: Vec<f64>,
}

/// UCB-style strategy over an evaluator pool.
pub struct ZScoresStrategy {
    model: Graph,
    real: Graph,
    pool: Vec<PoolEntry>,
    cfg: ZScoresConfig,
    samples: SampleManager,
    replay: SpreadSampler,
    activated: SeedSet,
}

impl ZScoresStrategy {
    /// `pool` must be non-empty; its order fixes the round-robin first pass.
    pub fn new(
        model: Graph,
        real: Graph,
        pool: Vec<(String, Box<dyn Evaluator>)>,
        cfg: ZScoresConfig,
    ) -> Self {
        Self {
            model,
            real,
            pool: pool
                .into_iter()
                .map(|(name, evaluator)| PoolEntry {
                    name,
                    evaluator,
                    spreads: Vec::new(),
                })
                .collect(),
            samples: SampleManager::new(cfg.seed),
            replay: SpreadSampler::with_seed(SampleKind::Mean, cfg.seed ^ 0x5EED),
            activated: SeedSet::new(),
            cfg,
        }
    }

    pub fn model(&self) -> &Graph {
        &self.model
    }

    /// Pick the next evaluator index for `round`.
    fn choose(&self, round: u32) -> usize {
        if (round as usize) < self.pool.len() {
            return round as usize;
        }
        let pooled: Vec<f64> = self
            .pool
            .iter()
            .flat_map(|e| e.spreads.iter().copied())
            .collect();
        let n = pooled.len() as f64;
        let mean = pooled.iter().sum::<f64>() / n;
        let var = pooled.iter().map(|s| (s - mean) * (s - mean)).sum::<f64>() / n;
        let std = var.sqrt();
        let t = (round + 1) as f64;

        let mut best = 0usize;
        let mut best_score = f64::NEG_INFINITY;
        for (i, entry) in self.pool.iter().enumerate() {
            let last = entry.spreads.last().copied().unwrap_or(0.0);
            let z = if std > 0.0 { (last - mean) / std } else { 0.0 };
            let uses = entry.spreads.len().max(1) as f64;
            let score = z + (2.0 * t.ln() / uses).sqrt();
            if score > best_score {
                best_score = score;
                best = i;
            }
        }
        best
    }
}

impl Strategy for ZScoresStrategy {
    fn perform(&mut self, budget: u32, k: usize) -> Vec<RoundReport> {
        if self.pool.is_empty() {
            return Vec::new();
        }
        let mut reports = Vec::with_capacity(budget as usize);
        for round in 0..budget {
            let start = std::time::Instant::now();
            let idx = self.choose(round);
            let sampler = PathSampler::new(self.cfg.kind, self.cfg.trials as usize);
            let entry = &mut self.pool[idx];
            let seeds =
                entry
                    .evaluator
                    .select(&self.model, &sampler, &mut self.samples, &self.activated, k);
            if seeds.is_empty() {
                break;
            }

            let (spread, posterior) = observe_round(
                &self.real,
                &mut self.model,
                &mut self.replay,
                &mut self.activated,
                &seeds,
                self.cfg.trials,
                self.cfg.update,
            );
            self.pool[idx].spreads.push(spread);
            if self.cfg.cache.should_reset(round, posterior.is_some()) {
                self.samples.reset();
            }

            let partial = seeds.len() < k;
            reports.push(RoundReport {
                round,
                choice: self.pool[idx].name.clone(),
                seeds: seeds.iter().copied().collect(),
                spread,
                elapsed_s: seconds_since(start),
                posterior,
            });
            if partial {
                break;
            }
        }
        reports
    }
}
