use crate::posterior::{PosteriorParameters, PosteriorSample};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SuperiorityMethod {
    /// Closed-form function of the posterior means. Not a tail probability.
    Heuristic,
    /// Fraction of index-paired draws where the first arm wins.
    Empirical,
}

/// Estimated probability that the first arm's conversion rate exceeds the second's.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SuperiorityEstimate {
    pub probability: f64,
    pub method: SuperiorityMethod,
}

/// Heuristic `P(A > B)` from posterior means alone.
///
/// `1 - exp(-scale * |mA - mB|)` when `mA > mB`, otherwise `exp(-scale * |mA - mB|)`.
///
/// Heuristic only. It ignores posterior width, and at exactly equal means the second
/// branch applies and returns 1.0. Prefer [`empirical_superiority`] for decisions.
pub fn heuristic_superiority(
    a: &PosteriorParameters,
    b: &PosteriorParameters,
    scale: f64,
) -> SuperiorityEstimate {
    let (mean_a, mean_b) = (a.mean(), b.mean());
    let decay = (-(mean_a - mean_b).abs() * scale).exp();
    let probability = if mean_a > mean_b { 1.0 - decay } else { decay };
    SuperiorityEstimate {
        probability,
        method: SuperiorityMethod::Heuristic,
    }
}

/// `count(a_i > b_i) / n` over draws paired by index.
///
/// The arms are sampled independently, so this approximates the comparison of the
/// two marginals rather than a joint posterior. Unequal lengths use the shorter one.
pub fn empirical_superiority(a: &PosteriorSample, b: &PosteriorSample) -> Option<SuperiorityEstimate> {
    let n = a.len().min(b.len());
    if n == 0 {
        return None;
    }
    let wins = a
        .values()
        .iter()
        .zip(b.values())
        .filter(|(x, y)| x > y)
        .count();
    Some(SuperiorityEstimate {
        probability: wins as f64 / n as f64,
        method: SuperiorityMethod::Empirical,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heuristic_favours_higher_mean() {
        let ad = PosteriorParameters::new(151.0, 851.0);
        let psa = PosteriorParameters::new(101.0, 901.0);
        let estimate = heuristic_superiority(&ad, &psa, 10.0);
        assert_eq!(estimate.method, SuperiorityMethod::Heuristic);
        let expected = 1.0 - (-(ad.mean() - psa.mean()) * 10.0).exp();
        assert!((estimate.probability - expected).abs() < 1e-12);
        // A five-point lead still scores below one half.
        assert!((estimate.probability - 0.392_863_718).abs() < 1e-9);

        let reversed = heuristic_superiority(&psa, &ad, 10.0);
        assert!((reversed.probability - (1.0 - estimate.probability)).abs() < 1e-12);
    }

    #[test]
    fn test_heuristic_equal_means() {
        let p = PosteriorParameters::new(3.0, 5.0);
        assert_eq!(heuristic_superiority(&p, &p, 10.0).probability, 1.0);
    }

    #[test]
    fn test_heuristic_jumps_where_means_cross() {
        let lower = PosteriorParameters::new(10.0, 90.0);
        let higher = PosteriorParameters::new(81.0, 719.0);
        let below = heuristic_superiority(&lower, &higher, 10.0).probability;
        let equal = heuristic_superiority(&lower, &lower, 10.0).probability;
        let above = heuristic_superiority(&higher, &lower, 10.0).probability;
        assert!((below - (-0.0125f64).exp()).abs() < 1e-12);
        assert!((below - 0.987_577_800).abs() < 1e-9);
        assert_eq!(equal, 1.0);
        assert!((above - 0.012_422_199).abs() < 1e-9);
        assert!(below > above);
    }

    #[test]
    fn test_heuristic_monotone_in_gap() {
        let b = PosteriorParameters::new(10.0, 90.0);
        let mut last = 0.0;
        for successes in 11..60 {
            let a = PosteriorParameters::new(successes as f64, 100.0 - successes as f64);
            let p = heuristic_superiority(&a, &b, 10.0).probability;
            assert!(p >= last);
            last = p;
        }
        assert!(last > 0.95);
    }

    #[test]
    fn test_empirical_counts_pairs() {
        let a = PosteriorSample::from_values(vec![0.5, 0.1, 0.9, 0.4]);
        let b = PosteriorSample::from_values(vec![0.2, 0.2, 0.2, 0.4]);
        let estimate = empirical_superiority(&a, &b).unwrap();
        assert_eq!(estimate.method, SuperiorityMethod::Empirical);
        assert_eq!(estimate.probability, 0.5);
    }

    #[test]
    fn test_empirical_empty() {
        let empty = PosteriorSample::from_values(vec![]);
        assert!(empirical_superiority(&empty, &empty).is_none());
    }
}
