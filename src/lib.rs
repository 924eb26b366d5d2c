//! `infmax`: online influence maximization under uncertain edge
//! probabilities.
//!
//! A directed graph's arcs carry unknown propagation probabilities. Over `T`
//! rounds, each allowing `k` seed nodes, a strategy (a) selects seeds from
//! its current estimate, (b) observes the cascade that actually spreads on
//! the ground-truth graph, (c) folds the observed activations into per-arc
//! Beta posteriors, trading exploitation of the current estimate against
//! exploration that sharpens future ones.
//!
//! Goals:
//! - **Deterministic by default**: every stochastic component is seedable
//!   and uses ordered collections, so a fixed seed reproduces a campaign
//!   bit-for-bit.
//! - **One code path for explore and exploit**: evaluators read edges
//!   through a [`SampleKind`], so optimistic and mean-field selection share
//!   identical machinery.
//! - **Log-ready rows, no logger**: strategies return [`RoundReport`]
//!   values; printing belongs to the harness.
//!
//! Included evaluators: CELF lazy greedy, TIM reverse-reachable sketches,
//! PMC pruned Monte-Carlo, and random/degree baselines. Included strategies:
//! offline single-evaluator, ε-greedy, exponentiated-gradient (Hedge) over
//! edge readings, and z-score (UCB-style) evaluator arbitration.
//!
//! Non-goals:
//! - No distributed execution, no persistence of learned posteriors across
//!   invocations, no runtime graph mutation, no exact (non-Monte-Carlo)
//!   influence computation.

#![forbid(unsafe_code)]

mod graph;
pub use graph::*;

mod influence;
pub use influence::*;

mod stable_hash;
pub use stable_hash::*;

mod sampler;
pub use sampler::*;

mod samples;
pub use samples::*;

mod evaluator;
pub use evaluator::*;

mod baselines;
pub use baselines::*;

mod celf;
pub use celf::*;

mod tim;
pub use tim::*;

mod pmc;
pub use pmc::*;

mod strategy;
pub use strategy::*;

mod egreedy;
pub use egreedy::*;

mod expgrad;
pub use expgrad::*;

mod zscore;
pub use zscore::*;

mod input;
pub use input::*;

pub const INFMAX_VERSION: &str = env!("CARGO_PKG_VERSION");
