use crate::posterior::{PosteriorParameters, PosteriorSample};
use serde::Serialize;

/// Two-sided 95% mass.
pub const LOWER_QUANTILE: f64 = 0.025;
pub const UPPER_QUANTILE: f64 = 0.975;
/// Standard normal quantile used by the Wald interval.
pub const WALD_Z: f64 = 1.96;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CredibleInterval {
    pub lower: f64,
    pub upper: f64,
}

impl CredibleInterval {
    /// Bounds are clipped to `[0, 1]` and swapped if given out of order.
    pub fn new(lower: f64, upper: f64) -> Self {
        let lower = lower.clamp(0.0, 1.0);
        let upper = upper.clamp(0.0, 1.0);
        if lower <= upper {
            Self { lower, upper }
        } else {
            Self {
                lower: upper,
                upper: lower,
            }
        }
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains(&self, x: f64) -> bool {
        self.lower <= x && x <= self.upper
    }

    pub fn is_point(&self) -> bool {
        self.lower == self.upper
    }
}

/// Linearly interpolated order statistic of an ascending slice.
///
/// `q` is clamped to `[0, 1]`; `q = 0` yields the minimum and `q = 1` the maximum.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let q = q.clamp(0.0, 1.0);
    let pos = (sorted.len() - 1) as f64 * q;
    let base = pos.floor() as usize;
    let frac = pos - base as f64;
    match sorted.get(base + 1) {
        Some(next) => Some((sorted[base] + frac * (next - sorted[base])).min(*next)),
        None => Some(sorted[base]),
    }
}

/// Quantile of unsorted samples; sorts a copy.
pub fn quantile(samples: &[f64], q: f64) -> Option<f64> {
    let sample = PosteriorSample::from_values(samples.to_vec());
    quantile_sorted(&sample.sorted(), q)
}

/// Equal-tailed 95% interval from Monte Carlo draws.
pub fn empirical_interval(sample: &PosteriorSample) -> Option<CredibleInterval> {
    let sorted = sample.sorted();
    let lower = quantile_sorted(&sorted, LOWER_QUANTILE)?;
    let upper = quantile_sorted(&sorted, UPPER_QUANTILE)?;
    Some(CredibleInterval::new(lower, upper))
}

/// Normal (Wald) approximation around the posterior mean:
/// `mean ± 1.96 * sqrt(mean * (1 - mean) / trials)`, clipped to `[0, 1]`.
///
/// This is not the exact Beta quantile; it is only reasonable for large `trials`.
pub fn wald_interval(posterior: &PosteriorParameters, trials: u64) -> Option<CredibleInterval> {
    if trials == 0 {
        return None;
    }
    let mean = posterior.mean();
    let half_width = WALD_Z * (mean * (1.0 - mean) / trials as f64).sqrt();
    Some(CredibleInterval::new(mean - half_width, mean + half_width))
}
