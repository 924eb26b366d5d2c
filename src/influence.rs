//! Per-edge influence distributions.
//!
//! Every arc carries either a fixed activation probability (ground-truth
//! graphs) or a Beta posterior over that probability (model graphs). The two
//! are a closed enum so samplers and evaluators dispatch statically; the same
//! code path serves exploitation (posterior mean) and exploration
//! (upper-confidence reading) by threading a [`SampleKind`] through.

use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Beta, Distribution};

/// Which reading of an edge distribution a caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SampleKind {
    /// Posterior mean `alpha / (alpha + beta)`.
    Mean,
    /// Lower confidence reading: mean minus one posterior std-dev, floored at 0.
    Lower,
    /// Upper confidence reading: mean plus one posterior std-dev, capped at 1.
    Upper,
    /// A random draw from the posterior.
    Draw,
    /// The ground prior the distribution was constructed with.
    Prior,
}

impl SampleKind {
    /// The adaptive readings an expert-mixture strategy can arbitrate over.
    pub const ADAPTIVE: [SampleKind; 4] = [
        SampleKind::Mean,
        SampleKind::Lower,
        SampleKind::Upper,
        SampleKind::Draw,
    ];
}

/// Per-update cap on posterior increments so one round of trials cannot grow
/// either Beta parameter without limit.
pub const MAX_ROUND_INCREMENT: f64 = 100.0;

const PROB_EPS: f64 = 1e-9;

/// Beta posterior over an edge's activation probability.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BetaBelief {
    pub alpha: f64,
    pub beta: f64,
    /// Ground probability supplied at construction; reported for
    /// [`SampleKind::Prior`] and never updated.
    pub prior: f64,
}

impl BetaBelief {
    /// Create a belief with the given prior pseudo-counts.
    ///
    /// Non-finite or non-positive parameters fall back to `Beta(1, 1)`, the
    /// prior probability is clamped to `[0, 1]`.
    pub fn new(alpha: f64, beta: f64, prior: f64) -> Self {
        let ok = |x: f64| x.is_finite() && x > 0.0;
        Self {
            alpha: if ok(alpha) { alpha } else { 1.0 },
            beta: if ok(beta) { beta } else { 1.0 },
            prior: if prior.is_finite() { prior.clamp(0.0, 1.0) } else { 0.0 },
        }
    }

    /// Posterior mean.
    pub fn mean(&self) -> f64 {
        let denom = self.alpha + self.beta;
        if denom <= 0.0 {
            0.5
        } else {
            self.alpha / denom
        }
    }

    /// Posterior standard deviation.
    pub fn std_dev(&self) -> f64 {
        let s = self.alpha + self.beta;
        if s <= 0.0 {
            return 0.0;
        }
        (self.alpha * self.beta / (s * s * (s + 1.0))).sqrt()
    }

    /// Mean minus one std-dev, floored at 0.
    pub fn lower(&self) -> f64 {
        (self.mean() - self.std_dev()).max(0.0)
    }

    /// Mean plus one std-dev, capped at 1.
    pub fn upper(&self) -> f64 {
        (self.mean() + self.std_dev()).min(1.0)
    }

    /// Draw from `Beta(alpha, beta)`.
    ///
    /// Parameters at the numerical boundary are clamped away from 0; if the
    /// distribution still cannot be constructed the posterior mean is
    /// returned. This never fails.
    pub fn draw(&self, rng: &mut StdRng) -> f64 {
        let a = self.alpha.max(PROB_EPS);
        let b = self.beta.max(PROB_EPS);
        match Beta::new(a, b) {
            Ok(dist) => dist.sample(rng).clamp(0.0, 1.0),
            Err(_) => self.mean(),
        }
    }

    /// Fold one round of observed trials into the posterior:
    /// `alpha += hits`, `beta += misses`, each increment capped at
    /// [`MAX_ROUND_INCREMENT`].
    pub fn observe(&mut self, hits: u64, misses: u64) {
        self.alpha += (hits as f64).min(MAX_ROUND_INCREMENT);
        self.beta += (misses as f64).min(MAX_ROUND_INCREMENT);
    }
}

/// Influence distribution attached to one arc.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InfluenceModel {
    /// A constant activation probability.
    Point(f64),
    /// A Beta posterior over the activation probability.
    Beta(BetaBelief),
}

impl InfluenceModel {
    /// Constant probability, clamped to `[0, 1]`.
    pub fn point(p: f64) -> Self {
        InfluenceModel::Point(if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 })
    }

    /// Beta posterior with the given prior pseudo-counts and ground prior.
    pub fn beta(alpha: f64, beta: f64, prior: f64) -> Self {
        InfluenceModel::Beta(BetaBelief::new(alpha, beta, prior))
    }

    /// Whether this distribution learns from observations.
    pub fn is_adaptive(&self) -> bool {
        matches!(self, InfluenceModel::Beta(_))
    }

    /// Read the activation probability under the requested reading.
    ///
    /// Point distributions return their constant for every kind; the RNG is
    /// only consulted for [`SampleKind::Draw`] on a Beta.
    pub fn sample(&self, kind: SampleKind, rng: &mut StdRng) -> f64 {
        match self {
            InfluenceModel::Point(p) => *p,
            InfluenceModel::Beta(b) => match kind {
                SampleKind::Mean => b.mean(),
                SampleKind::Lower => b.lower(),
                SampleKind::Upper => b.upper(),
                SampleKind::Draw => b.draw(rng),
                SampleKind::Prior => b.prior,
            },
        }
    }

    /// Flip a coin for one activation attempt under the requested reading.
    pub fn attempt(&self, kind: SampleKind, rng: &mut StdRng) -> bool {
        let p = self.sample(kind, rng);
        rng.random::<f64>() < p
    }

    /// Fold observed trials into the posterior (no-op for Point).
    pub fn observe(&mut self, hits: u64, misses: u64) {
        if let InfluenceModel::Beta(b) = self {
            b.observe(hits, misses);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn point_ignores_kind() {
        let mut rng = StdRng::seed_from_u64(0);
        let m = InfluenceModel::point(0.3);
        for kind in [
            SampleKind::Mean,
            SampleKind::Lower,
            SampleKind::Upper,
            SampleKind::Draw,
            SampleKind::Prior,
        ] {
            assert_eq!(m.sample(kind, &mut rng), 0.3);
        }
    }

    #[test]
    fn beta_readings_are_ordered() {
        let mut rng = StdRng::seed_from_u64(1);
        let b = BetaBelief::new(3.0, 7.0, 0.5);
        assert!(b.lower() <= b.mean());
        assert!(b.mean() <= b.upper());
        let d = b.draw(&mut rng);
        assert!((0.0..=1.0).contains(&d));
    }

    #[test]
    fn observe_moves_mean_toward_hit_rate() {
        let mut b = BetaBelief::new(1.0, 1.0, 0.5);
        let before = b.mean();
        b.observe(9, 1);
        assert!(b.mean() > before, "mean should move toward 0.9");
        // Mean lands between the prior mean and the empirical rate.
        assert!(b.mean() < 0.9);
    }

    #[test]
    fn observe_increment_is_bounded() {
        let mut b = BetaBelief::new(1.0, 1.0, 0.5);
        b.observe(1_000_000, 1_000_000);
        assert!(b.alpha <= 1.0 + MAX_ROUND_INCREMENT);
        assert!(b.beta <= 1.0 + MAX_ROUND_INCREMENT);
    }

    #[test]
    fn degenerate_parameters_never_fail() {
        let mut rng = StdRng::seed_from_u64(2);
        let b = BetaBelief::new(f64::NAN, -3.0, 2.0);
        assert_eq!((b.alpha, b.beta), (1.0, 1.0));
        assert_eq!(b.prior, 1.0);
        let d = b.draw(&mut rng);
        assert!((0.0..=1.0).contains(&d));
    }
}
