//! Seed-selection evaluators: the common contract and the registry used by
//! the CLI's small-integer indices.

use crate::graph::{Graph, SeedSet};
use crate::samples::{PathSampler, SampleManager};

use crate::baselines::{DiscountDegreeEvaluator, HighestDegreeEvaluator, RandomEvaluator};
use crate::celf::CelfEvaluator;
use crate::tim::{TimConfig, TimEvaluator};

/// A seed-selection policy.
///
/// `select` returns up to `k` nodes disjoint from `activated`; fewer than `k`
/// means the graph ran out of candidates and the caller should treat the
/// round as terminating. Internal caches (CELF's heap, PMC's DAGs) are
/// rebuilt per call, so evaluators carry no state across rounds beyond their
/// RNG position.
pub trait Evaluator {
    fn select(
        &mut self,
        graph: &Graph,
        sampler: &PathSampler,
        samples: &mut SampleManager,
        activated: &SeedSet,
        k: usize,
    ) -> SeedSet;
}

/// Registry of evaluators addressable by the CLI's small-integer indices:
/// `0=CELF, 1=Random, 2=DiscountDegree, 3=TIM, 4=HighestDegree`.
///
/// PMC is constructed directly ([`crate::pmc::PmcEvaluator`]); it has no
/// index slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EvaluatorKind {
    Celf,
    Random,
    DiscountDegree,
    Tim,
    HighestDegree,
}

impl EvaluatorKind {
    /// Decode a CLI index. `max_index` caps the admissible range per mode
    /// (e.g. `3` where HighestDegree is not offered).
    pub fn from_index(index: u32, max_index: u32) -> Option<Self> {
        if index > max_index {
            return None;
        }
        match index {
            0 => Some(EvaluatorKind::Celf),
            1 => Some(EvaluatorKind::Random),
            2 => Some(EvaluatorKind::DiscountDegree),
            3 => Some(EvaluatorKind::Tim),
            4 => Some(EvaluatorKind::HighestDegree),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EvaluatorKind::Celf => "celf",
            EvaluatorKind::Random => "random",
            EvaluatorKind::DiscountDegree => "discount-degree",
            EvaluatorKind::Tim => "tim",
            EvaluatorKind::HighestDegree => "highest-degree",
        }
    }

    /// Instantiate the evaluator; `seed` fixes the RNG of the stochastic
    /// ones.
    pub fn build(&self, seed: u64) -> Box<dyn Evaluator> {
        match self {
            EvaluatorKind::Celf => Box::new(CelfEvaluator::new()),
            EvaluatorKind::Random => Box::new(RandomEvaluator::with_seed(seed)),
            EvaluatorKind::DiscountDegree => Box::new(DiscountDegreeEvaluator::new()),
            EvaluatorKind::Tim => Box::new(TimEvaluator::with_seed(TimConfig::default(), seed)),
            EvaluatorKind::HighestDegree => Box::new(HighestDegreeEvaluator::new()),
        }
    }
}
