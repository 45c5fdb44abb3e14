//! Posterior representations for the two estimation strategies.
//!
//! Analytic mode keeps only the Beta parameters and derives everything in closed
//! form (or by approximation). Monte Carlo mode draws `sample_size` values per arm
//! and treats those draws as the posterior for intervals, densities and superiority.

use crate::arm::Arm;
use crate::config::EngineConfig;
use crate::histogram::Histogram;
use crate::interval::{empirical_interval, wald_interval, CredibleInterval};
use crate::posterior::{PosteriorParameters, PosteriorSample};
use crate::superiority::{empirical_superiority, heuristic_superiority, SuperiorityEstimate};
use anyhow::{bail, Result};
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EstimationMode {
    Analytic,
    MonteCarlo,
}

impl fmt::Display for EstimationMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EstimationMode::Analytic => write!(f, "analytic"),
            EstimationMode::MonteCarlo => write!(f, "monte-carlo"),
        }
    }
}

impl FromStr for EstimationMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "analytic" => Ok(EstimationMode::Analytic),
            "monte-carlo" | "montecarlo" | "mc" => Ok(EstimationMode::MonteCarlo),
            _ => bail!("Invalid estimation mode: {}", s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DensityPoint {
    pub x: f64,
    pub density_ad: f64,
    pub density_psa: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CurveKind {
    /// Shared-scale plotting curve; not a probability density.
    DisplayNormalized,
    /// Empirical densities from Monte Carlo histograms.
    Histogram,
}

/// Both arms' densities on one x grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityCurve {
    pub kind: CurveKind,
    pub points: Vec<DensityPoint>,
}

impl DensityCurve {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Unnormalized Beta kernels of both arms at `x_i = i / grid_points`, rescaled so the
/// taller of the two curves peaks at `ceiling`.
///
/// This is a display normalization, not a true probability density; it must NOT be
/// used for integration-based statistics.
///
/// The kernels are unnormalized, so their maxima differ by many orders of magnitude
/// once the arms have a few hundred trials. The arm with the smaller kernel maximum
/// then collapses to roughly 0 across the whole grid; only the taller arm is visible.
///
/// The rescaling is done in log space, so large `alpha` and `beta` give a finite
/// curve (0 for the collapsed arm) instead of `0 / 0`.
pub fn display_curve(
    ad: &PosteriorParameters,
    psa: &PosteriorParameters,
    grid_points: usize,
    ceiling: f64,
) -> DensityCurve {
    let xs: Vec<f64> = (0..grid_points)
        .map(|i| i as f64 / grid_points as f64)
        .collect();
    let ln_ad: Vec<f64> = xs.iter().map(|&x| ad.ln_kernel(x)).collect();
    let ln_psa: Vec<f64> = xs.iter().map(|&x| psa.ln_kernel(x)).collect();
    let ln_max = ln_ad
        .iter()
        .chain(ln_psa.iter())
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let rescale = |ln: f64| {
        if ln_max.is_finite() {
            (ln - ln_max).exp() * ceiling
        } else {
            0.0
        }
    };
    let points = xs
        .iter()
        .zip(ln_ad.iter().zip(ln_psa.iter()))
        .map(|(&x, (&a, &p))| DensityPoint {
            x,
            density_ad: rescale(a),
            density_psa: rescale(p),
        })
        .collect();
    DensityCurve {
        kind: CurveKind::DisplayNormalized,
        points,
    }
}

/// Zip two histograms bin by bin.
///
/// The arms are binned over their own ranges, so their edges differ. The x value
/// written is the ad arm's bin center (the psa arm's when only the ad arm is
/// degenerate), which is an approximation when the two ranges differ materially.
pub fn histogram_curve(ad: &Histogram, psa: &Histogram) -> DensityCurve {
    let axis = if ad.degenerate && !psa.degenerate { psa } else { ad };
    let points = axis
        .centers()
        .into_iter()
        .zip(ad.densities.iter().zip(psa.densities.iter()))
        .map(|(x, (&density_ad, &density_psa))| DensityPoint {
            x,
            density_ad,
            density_psa,
        })
        .collect();
    DensityCurve {
        kind: CurveKind::Histogram,
        points,
    }
}

/// Posterior of both arms under one estimation strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum PosteriorEstimate {
    Analytic {
        ad: PosteriorParameters,
        psa: PosteriorParameters,
    },
    MonteCarlo {
        ad: PosteriorSample,
        psa: PosteriorSample,
    },
}

impl PosteriorEstimate {
    /// Monte Carlo mode draws the ad arm first, then the psa arm, from the same `rng`.
    pub fn estimate<R: Rng + ?Sized>(
        mode: EstimationMode,
        ad: &PosteriorParameters,
        psa: &PosteriorParameters,
        config: &EngineConfig,
        rng: &mut R,
    ) -> Result<Self> {
        match mode {
            EstimationMode::Analytic => Ok(PosteriorEstimate::Analytic { ad: *ad, psa: *psa }),
            EstimationMode::MonteCarlo => {
                debug!(
                    "Drawing {} posterior samples per arm (ad: α = {}, β = {}; psa: α = {}, β = {})",
                    config.sample_size, ad.alpha, ad.beta, psa.alpha, psa.beta
                );
                let ad = ad.sample(config.sample_size, rng)?;
                let psa = psa.sample(config.sample_size, rng)?;
                Ok(PosteriorEstimate::MonteCarlo { ad, psa })
            }
        }
    }

    pub fn mode(&self) -> EstimationMode {
        match self {
            PosteriorEstimate::Analytic { .. } => EstimationMode::Analytic,
            PosteriorEstimate::MonteCarlo { .. } => EstimationMode::MonteCarlo,
        }
    }

    /// 95% interval for `arm`. The analytic Wald interval needs the arm's trial count.
    pub fn credible_interval(&self, arm: Arm, trials: u64) -> Option<CredibleInterval> {
        match self {
            PosteriorEstimate::Analytic { ad, psa } => {
                let posterior = match arm {
                    Arm::Ad => ad,
                    Arm::Psa => psa,
                };
                wald_interval(posterior, trials)
            }
            PosteriorEstimate::MonteCarlo { ad, psa } => {
                let sample = match arm {
                    Arm::Ad => ad,
                    Arm::Psa => psa,
                };
                empirical_interval(sample)
            }
        }
    }

    pub fn density_curve(&self, config: &EngineConfig) -> DensityCurve {
        match self {
            PosteriorEstimate::Analytic { ad, psa } => {
                display_curve(ad, psa, config.grid_points, config.display_ceiling)
            }
            PosteriorEstimate::MonteCarlo { ad, psa } => histogram_curve(
                &Histogram::from_sample(ad, config.histogram_bins),
                &Histogram::from_sample(psa, config.histogram_bins),
            ),
        }
    }

    /// Probability that the ad arm converts better than the psa arm.
    pub fn superiority(&self, config: &EngineConfig) -> Option<SuperiorityEstimate> {
        match self {
            PosteriorEstimate::Analytic { ad, psa } => {
                Some(heuristic_superiority(ad, psa, config.heuristic_scale))
            }
            PosteriorEstimate::MonteCarlo { ad, psa } => empirical_superiority(ad, psa),
        }
    }
}
