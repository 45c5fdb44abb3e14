use crate::stats::GroupStatistics;
use anyhow::{anyhow, Result};
use itertools::{Itertools, MinMaxResult};
use ordered_float::OrderedFloat;
use rand::Rng;
use rand_distr::{Beta as BetaDistribution, Distribution};
use serde::{Deserialize, Serialize};
use statrs::function::gamma::ln_gamma;

/// Parameters of a Beta posterior over a conversion probability.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PosteriorParameters {
    pub alpha: f64,
    pub beta: f64,
}

impl PosteriorParameters {
    pub fn new(alpha: f64, beta: f64) -> Self {
        Self { alpha, beta }
    }

    /// Uniform Beta(1, 1) prior.
    pub fn uniform_prior() -> Self {
        Self {
            alpha: 1.0,
            beta: 1.0,
        }
    }

    /// Update parameters with `successes` conversions and `failures` non-conversions
    pub fn update(&mut self, successes: u64, failures: u64) {
        self.alpha += successes as f64;
        self.beta += failures as f64;
    }

    /// Conjugate update of the uniform prior; `alpha + beta == trials + 2`.
    pub fn from_statistics(statistics: &GroupStatistics) -> Self {
        let mut posterior = Self::uniform_prior();
        posterior.update(statistics.successes, statistics.failures());
        posterior
    }

    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    pub fn variance(&self) -> f64 {
        let numerator = self.alpha * self.beta;
        let denominator = (self.alpha + self.beta).powf(2.0) * (self.alpha + self.beta + 1.0);
        numerator / denominator
    }

    pub fn standard_deviation(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn log_beta(&self) -> f64 {
        ln_gamma(self.alpha) + ln_gamma(self.beta) - ln_gamma(self.alpha + self.beta)
    }

    /// Log of the unnormalized density `x^(alpha-1) * (1-x)^(beta-1)`.
    ///
    /// A zero exponent contributes nothing, so `x = 0` with `alpha = 1` is finite.
    pub fn ln_kernel(&self, x: f64) -> f64 {
        if !(0.0..=1.0).contains(&x) {
            return f64::NEG_INFINITY;
        }
        weighted_ln(self.alpha - 1.0, x) + weighted_ln(self.beta - 1.0, 1.0 - x)
    }

    pub fn log_pdf(&self, x: f64) -> f64 {
        self.ln_kernel(x) - self.log_beta()
    }

    pub fn pdf(&self, x: f64) -> f64 {
        if !(0.0..=1.0).contains(&x) {
            return 0.0;
        }
        self.log_pdf(x).exp()
    }

    /// Draw `n` independent values from `Beta(alpha, beta)`.
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<PosteriorSample> {
        let dist = BetaDistribution::new(self.alpha, self.beta).map_err(|e| {
            anyhow!(
                "Invalid Beta parameters α = {}, β = {}: {}",
                self.alpha,
                self.beta,
                e
            )
        })?;
        let mut values = Vec::with_capacity(n);
        for _ in 0..n {
            values.push(dist.sample(rng));
        }
        Ok(PosteriorSample::from_values(values))
    }
}

fn weighted_ln(weight: f64, value: f64) -> f64 {
    if weight == 0.0 {
        0.0
    } else {
        weight * value.ln()
    }
}

/// Monte Carlo draws from one arm's posterior, in generation order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PosteriorSample {
    values: Vec<f64>,
}

impl PosteriorSample {
    pub fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Ascending copy of the draws.
    pub fn sorted(&self) -> Vec<f64> {
        let mut sorted = self.values.clone();
        sorted.sort_unstable_by_key(|v| OrderedFloat(*v));
        sorted
    }

    pub fn min_max(&self) -> Option<(f64, f64)> {
        match self.values.iter().copied().minmax_by_key(|v| OrderedFloat(*v)) {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(v) => Some((v, v)),
            MinMaxResult::MinMax(min, max) => Some((min, max)),
        }
    }

    /// All draws identical.
    pub fn is_degenerate(&self) -> bool {
        matches!(self.min_max(), Some((min, max)) if min == max)
    }

    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
    }
}
