use crate::posterior::PosteriorSample;
use log::warn;
use serde::Serialize;

/// Equal-width density histogram of Monte Carlo draws.
///
/// Bin `i` covers `[min + i*width, min + (i+1)*width)`; the last bin also holds `max`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub min: f64,
    pub bin_width: f64,
    pub counts: Vec<usize>,
    pub densities: Vec<f64>,
    /// Zero-variance input. Densities are all zero and every center sits on the single value.
    pub degenerate: bool,
}

impl Histogram {
    pub fn from_sample(sample: &PosteriorSample, n_bins: usize) -> Self {
        Self::from_values(sample.values(), n_bins)
    }

    pub fn from_values(values: &[f64], n_bins: usize) -> Self {
        let sample = PosteriorSample::from_values(values.to_vec());
        let Some((min, max)) = sample.min_max() else {
            return Self::flat(0.0, n_bins);
        };
        if n_bins == 0 {
            return Self::flat(min, 0);
        }
        if max == min {
            warn!(
                "All {} posterior draws equal {}; returning a flat density curve",
                values.len(),
                min
            );
            return Self::flat(min, n_bins);
        }

        let bin_width = (max - min) / n_bins as f64;
        let mut counts = vec![0usize; n_bins];
        for &value in values {
            let idx = ((value - min) / bin_width).floor() as usize;
            counts[idx.min(n_bins - 1)] += 1;
        }
        let total = values.len() as f64;
        let densities = counts
            .iter()
            .map(|&count| count as f64 / (total * bin_width))
            .collect();
        Self {
            min,
            bin_width,
            counts,
            densities,
            degenerate: false,
        }
    }

    fn flat(value: f64, n_bins: usize) -> Self {
        Self {
            min: value,
            bin_width: 0.0,
            counts: vec![0; n_bins],
            densities: vec![0.0; n_bins],
            degenerate: true,
        }
    }

    pub fn n_bins(&self) -> usize {
        self.counts.len()
    }

    pub fn total_count(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn center(&self, idx: usize) -> f64 {
        self.min + (idx as f64 + 0.5) * self.bin_width
    }

    pub fn centers(&self) -> Vec<f64> {
        (0..self.n_bins()).map(|i| self.center(i)).collect()
    }
}
