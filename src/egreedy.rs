//! ε-greedy arbitration between an exploit and an explore evaluator.
//!
//! With probability ε the round runs the explore evaluator under an
//! optimistic edge reading (upper confidence by default); otherwise the
//! exploit evaluator runs under the posterior mean. Both paths replay on the
//! ground-truth graph and feed the same posterior update.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::evaluator::Evaluator;
use crate::graph::{Graph, SeedSet};
use crate::influence::SampleKind;
use crate::sampler::SpreadSampler;
use crate::samples::{PathSampler, SampleManager};
use crate::strategy::{observe_round, seconds_since, CachePolicy, RoundReport, Strategy};

/// Knobs for [`EpsilonGreedyStrategy`].
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EpsilonGreedyConfig {
    /// Exploration probability in `[0, 1]`.
    pub epsilon: f64,
    /// Monte-Carlo trials per selection and per replay.
    pub trials: u64,
    /// Whether observed trials update the posteriors.
    pub update: bool,
    /// Edge reading for the exploit branch.
    pub exploit_kind: SampleKind,
    /// Edge reading for the explore branch.
    pub explore_kind: SampleKind,
    pub cache: CachePolicy,
    /// Seed for the branch coin, the sample cache, and the replay sampler.
    pub seed: u64,
}

impl Default for EpsilonGreedyConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.1,
            trials: 1000,
            update: true,
            exploit_kind: SampleKind::Mean,
            explore_kind: SampleKind::Upper,
            cache: CachePolicy::default(),
            seed: 0,
        }
    }
}

/// ε-greedy strategy over a model graph (Beta) and a ground-truth graph
/// (Point).
pub struct EpsilonGreedyStrategy {
    model: Graph,
    real: Graph,
    explore: Box<dyn Evaluator>,
    exploit: Box<dyn Evaluator>,
    cfg: EpsilonGreedyConfig,
    samples: SampleManager,
    replay: SpreadSampler,
    activated: SeedSet,
    rng: StdRng,
}

impl EpsilonGreedyStrategy {
    pub fn new(
        model: Graph,
        real: Graph,
        explore: Box<dyn Evaluator>,
        exploit: Box<dyn Evaluator>,
        cfg: EpsilonGreedyConfig,
    ) -> Self {
        Self {
            model,
            real,
            explore,
            exploit,
            samples: SampleManager::new(cfg.seed),
            replay: SpreadSampler::with_seed(SampleKind::Mean, cfg.seed ^ 0x5EED),
            activated: SeedSet::new(),
            rng: StdRng::seed_from_u64(cfg.seed),
            cfg,
        }
    }

    /// Pure-exploration construction: ε = 1 with the same evaluator on both
    /// branches (the `explore` operating mode).
    pub fn pure_exploration(
        model: Graph,
        real: Graph,
        explore: Box<dyn Evaluator>,
        exploit: Box<dyn Evaluator>,
        mut cfg: EpsilonGreedyConfig,
    ) -> Self {
        cfg.epsilon = 1.0;
        cfg.exploit_kind = cfg.explore_kind;
        Self::new(model, real, explore, exploit, cfg)
    }

    pub fn model(&self) -> &Graph {
        &self.model
    }

    pub fn activated(&self) -> &SeedSet {
        &self.activated
    }
}

impl Strategy for EpsilonGreedyStrategy {
    fn perform(&mut self, budget: u32, k: usize) -> Vec<RoundReport> {
        let eps = self.cfg.epsilon.clamp(0.0, 1.0);
        let mut reports = Vec::with_capacity(budget as usize);
        for round in 0..budget {
            let start = std::time::Instant::now();
            let exploring = self.rng.random::<f64>() < eps;
            let (kind, label) = if exploring {
                (self.cfg.explore_kind, "explore")
            } else {
                (self.cfg.exploit_kind, "exploit")
            };
            let sampler = PathSampler::new(kind, self.cfg.trials as usize);
            let evaluator = if exploring {
                &mut self.explore
            } else {
                &mut self.exploit
            };
            let seeds = evaluator.select(&self.model, &sampler, &mut self.samples, &self.activated, k);
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
            if self.cfg.cache.should_reset(round, posterior.is_some()) {
                self.samples.reset();
            }

            let partial = seeds.len() < k;
            reports.push(RoundReport {
                round,
                choice: label.to_string(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::EvaluatorKind;
    use crate::influence::InfluenceModel;

    fn star(leaves: u64, p: f64) -> (Graph, Graph) {
        let mut real = Graph::new();
        let mut model = Graph::new();
        for leaf in 1..=leaves {
            real.add_edge(0, leaf, InfluenceModel::point(p));
            model.add_edge(0, leaf, InfluenceModel::beta(1.0, 1.0, p));
        }
        model.set_prior(1.0, 1.0);
        (model, real)
    }

    fn strategy(epsilon: f64, update: bool, seed: u64) -> EpsilonGreedyStrategy {
        let (model, real) = star(10, 0.5);
        EpsilonGreedyStrategy::new(
            model,
            real,
            EvaluatorKind::Random.build(seed),
            EvaluatorKind::Celf.build(seed),
            EpsilonGreedyConfig {
                epsilon,
                trials: 20,
                update,
                seed,
                ..EpsilonGreedyConfig::default()
            },
        )
    }

    #[test]
    fn epsilon_zero_always_exploits() {
        let mut s = strategy(0.0, true, 1);
        let reports = s.perform(3, 1);
        assert!(reports.iter().all(|r| r.choice == "exploit"));
    }

    #[test]
    fn epsilon_one_always_explores() {
        let mut s = strategy(1.0, true, 1);
        let reports = s.perform(3, 1);
        assert!(reports.iter().all(|r| r.choice == "explore"));
    }

    #[test]
    fn posteriors_stay_at_the_prior_when_update_is_off() {
        let mut s = strategy(0.3, false, 2);
        let _ = s.perform(5, 1);
        for (_, _, influence) in s.model().edges() {
            if let InfluenceModel::Beta(b) = influence {
                assert_eq!((b.alpha, b.beta), (1.0, 1.0));
            }
        }
    }

    #[test]
    fn hub_edges_learn_when_update_is_on() {
        let mut s = strategy(0.0, true, 3);
        let reports = s.perform(4, 1);
        assert!(reports
            .iter()
            .any(|r| r.posterior.is_some_and(|p| p.updated_arcs > 0)));
    }

    #[test]
    fn same_seed_reproduces_the_campaign() {
        let mut a = strategy(0.3, true, 7);
        let mut b = strategy(0.3, true, 7);
        let ra = a.perform(5, 1);
        let rb = b.perform(5, 1);
        assert_eq!(ra.len(), rb.len());
        for (x, y) in ra.iter().zip(&rb) {
            assert_eq!(x.seeds, y.seeds);
            assert_eq!(x.spread, y.spread);
            assert_eq!(x.choice, y.choice);
        }
    }
}
