use crate::arm::Arm;
use crate::config::EngineConfig;
use crate::error::IngestionError;
use crate::estimator::{DensityCurve, EstimationMode, PosteriorEstimate};
use crate::filter::{Selector, TrialSet};
use crate::interval::CredibleInterval;
use crate::posterior::PosteriorParameters;
use crate::stats::{summarise_arm, ArmSummary};
use crate::superiority::SuperiorityEstimate;
use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use rand::Rng;
use serde::Serialize;

/// Memoization key of one analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct AnalysisKey {
    pub selector: Selector,
    pub mode: EstimationMode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArmAnalysis {
    pub summary: ArmSummary,
    pub posterior: PosteriorParameters,
    pub mean: f64,
    pub interval: CredibleInterval,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub selector: Selector,
    pub mode: EstimationMode,
    pub ad: ArmAnalysis,
    pub psa: ArmAnalysis,
    pub curve: DensityCurve,
    /// Probability that the ad arm converts better than the psa arm.
    pub superiority: SuperiorityEstimate,
}

impl AnalysisResult {
    pub fn arm(&self, arm: Arm) -> &ArmAnalysis {
        match arm {
            Arm::Ad => &self.ad,
            Arm::Psa => &self.psa,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AnalysisOutcome {
    Complete(AnalysisResult),
    /// At least one arm had no trials for the selector. Raw counts are kept for display.
    NoData {
        selector: Selector,
        mode: EstimationMode,
        ad: ArmSummary,
        psa: ArmSummary,
    },
}

impl AnalysisOutcome {
    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            AnalysisOutcome::Complete(result) => Some(result),
            AnalysisOutcome::NoData { .. } => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, AnalysisOutcome::NoData { .. })
    }

    /// Arms without any trials.
    pub fn missing_arms(&self) -> Vec<Arm> {
        match self {
            AnalysisOutcome::Complete(_) => Vec::new(),
            AnalysisOutcome::NoData { ad, psa, .. } => [ad, psa]
                .into_iter()
                .filter(|s| s.statistics.is_empty())
                .map(|s| s.arm)
                .collect(),
        }
    }
}

/// Run one full analysis over `records` for `selector` under `mode`.
pub fn compute_analysis<R: Rng + ?Sized>(
    records: &TrialSet,
    selector: &Selector,
    mode: EstimationMode,
    config: &EngineConfig,
    rng: &mut R,
) -> Result<AnalysisOutcome> {
    config.validate()?;
    let selected = records.select(selector);
    let ad_summary = summarise_arm(&selected, Arm::Ad);
    let psa_summary = summarise_arm(&selected, Arm::Psa);
    debug!(
        "{}: ad {}/{}, psa {}/{}",
        selector,
        ad_summary.statistics.successes,
        ad_summary.statistics.trials,
        psa_summary.statistics.successes,
        psa_summary.statistics.trials
    );

    if ad_summary.statistics.is_empty() || psa_summary.statistics.is_empty() {
        info!("No data for {} in at least one arm", selector);
        return Ok(AnalysisOutcome::NoData {
            selector: *selector,
            mode,
            ad: ad_summary,
            psa: psa_summary,
        });
    }

    let ad_posterior = PosteriorParameters::from_statistics(&ad_summary.statistics);
    let psa_posterior = PosteriorParameters::from_statistics(&psa_summary.statistics);
    let estimate = PosteriorEstimate::estimate(mode, &ad_posterior, &psa_posterior, config, rng)?;

    let arm_analysis = |summary: ArmSummary, posterior: PosteriorParameters| -> Result<ArmAnalysis> {
        let interval = estimate
            .credible_interval(summary.arm, summary.statistics.trials)
            .ok_or_else(|| anyhow!("Could not compute credible interval for {}", summary.arm))?;
        Ok(ArmAnalysis {
            summary,
            posterior,
            mean: posterior.mean(),
            interval,
        })
    };
    let ad = arm_analysis(ad_summary, ad_posterior)?;
    let psa = arm_analysis(psa_summary, psa_posterior)?;

    let curve = estimate.density_curve(config);
    let superiority = estimate
        .superiority(config)
        .ok_or_else(|| anyhow!("Could not estimate superiority probability"))?;

    Ok(AnalysisOutcome::Complete(AnalysisResult {
        selector: *selector,
        mode,
        ad,
        psa,
        curve,
        superiority,
    }))
}

/// Stateful caller that re-runs [`compute_analysis`] when the selector changes.
///
/// Only the most recent key is kept; repeating it returns the cached outcome
/// without drawing new samples.
pub struct AnalysisSession<R: Rng> {
    records: TrialSet,
    config: EngineConfig,
    rng: R,
    cached: Option<(AnalysisKey, AnalysisOutcome)>,
}

impl<R: Rng> AnalysisSession<R> {
    pub fn new(records: TrialSet, config: EngineConfig, rng: R) -> Self {
        Self {
            records,
            config,
            rng,
            cached: None,
        }
    }

    /// A failed load leaves the session without records; every analysis reports no data.
    pub fn from_load(
        load: Result<TrialSet, IngestionError>,
        config: EngineConfig,
        rng: R,
    ) -> Self {
        let records = match load {
            Ok(records) => records,
            Err(e) => {
                warn!("Trial records unavailable, continuing without data: {}", e);
                TrialSet::default()
            }
        };
        Self::new(records, config, rng)
    }

    pub fn records(&self) -> &TrialSet {
        &self.records
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cached_key(&self) -> Option<AnalysisKey> {
        self.cached.as_ref().map(|(key, _)| *key)
    }

    pub fn analyze(&mut self, selector: Selector, mode: EstimationMode) -> Result<&AnalysisOutcome> {
        let key = AnalysisKey { selector, mode };
        let is_fresh = matches!(&self.cached, Some((cached, _)) if *cached == key);
        if is_fresh {
            debug!("Reusing analysis for {} ({})", selector, mode);
        } else {
            let outcome =
                compute_analysis(&self.records, &selector, mode, &self.config, &mut self.rng)?;
            self.cached = Some((key, outcome));
        }
        self.cached
            .as_ref()
            .map(|(_, outcome)| outcome)
            .ok_or_else(|| anyhow!("Analysis cache is empty"))
    }

    /// Drop the cached outcome so the next call recomputes.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::TrialRecord;
    use crate::superiority::SuperiorityMethod;
    use crate::weekday::Weekday;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn arm_records(arm: Arm, day: Weekday, hour: u8, successes: usize, trials: usize) -> Vec<TrialRecord> {
        (0..trials)
            .map(|i| TrialRecord::new(arm, day, hour, i < successes, 3))
            .collect()
    }

    fn scenario_set() -> TrialSet {
        let mut records = arm_records(Arm::Ad, Weekday::Monday, 10, 150, 1000);
        records.extend(arm_records(Arm::Psa, Weekday::Monday, 10, 100, 1000));
        records.extend(arm_records(Arm::Ad, Weekday::Tuesday, 9, 1, 20));
        TrialSet::new(records)
    }

    #[test]
    fn test_analytic_scenario() {
        let set = scenario_set();
        let mut rng = StdRng::seed_from_u64(0);
        let outcome = compute_analysis(
            &set,
            &Selector::day(Weekday::Monday),
            EstimationMode::Analytic,
            &EngineConfig::default(),
            &mut rng,
        )
        .unwrap();
        let result = outcome.result().unwrap();
        assert_eq!(result.ad.posterior, PosteriorParameters::new(151.0, 851.0));
        assert_eq!(result.psa.posterior, PosteriorParameters::new(101.0, 901.0));
        assert!((result.ad.mean - 0.1506).abs() < 1e-4);
        assert!((result.psa.mean - 0.1008).abs() < 1e-4);
        assert!(result.ad.interval.lower < result.ad.mean && result.ad.mean < result.ad.interval.upper);
        assert_eq!(result.superiority.method, SuperiorityMethod::Heuristic);
        assert!((result.superiority.probability - 0.392_863_718).abs() < 1e-9);
        assert_eq!(result.curve.len(), 100);
    }

    #[test]
    fn test_no_data_for_missing_arm() {
        let set = scenario_set();
        let mut rng = StdRng::seed_from_u64(0);
        for mode in [EstimationMode::Analytic, EstimationMode::MonteCarlo] {
            let outcome = compute_analysis(
                &set,
                &Selector::day(Weekday::Tuesday),
                mode,
                &EngineConfig::default(),
                &mut rng,
            )
            .unwrap();
            assert!(outcome.is_no_data());
            assert_eq!(outcome.missing_arms(), vec![Arm::Psa]);
            match outcome {
                AnalysisOutcome::NoData { ad, .. } => assert_eq!(ad.statistics.trials, 20),
                _ => unreachable!(),
            }
        }
    }

    #[test]
    fn test_empty_record_set_is_no_data() {
        let mut rng = StdRng::seed_from_u64(0);
        let outcome = compute_analysis(
            &TrialSet::default(),
            &Selector::day_hour(Weekday::Sunday, 3),
            EstimationMode::MonteCarlo,
            &EngineConfig::default(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(outcome.missing_arms(), vec![Arm::Ad, Arm::Psa]);
    }

    #[test]
    fn test_monte_carlo_seeded_is_reproducible() {
        let set = scenario_set();
        let config = EngineConfig::default();
        let run = |seed| {
            compute_analysis(
                &set,
                &Selector::day_hour(Weekday::Monday, 10),
                EstimationMode::MonteCarlo,
                &config,
                &mut StdRng::seed_from_u64(seed),
            )
            .unwrap()
        };
        assert_eq!(run(5), run(5));
        let result = run(5);
        let result = result.result().unwrap();
        assert_eq!(result.superiority.method, SuperiorityMethod::Empirical);
        assert!(result.superiority.probability > 0.99);
        assert_eq!(result.curve.len(), 50);
    }

    #[test]
    fn test_invalid_config_is_error() {
        let config = EngineConfig {
            sample_size: 0,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(0);
        let outcome = compute_analysis(
            &scenario_set(),
            &Selector::day(Weekday::Monday),
            EstimationMode::MonteCarlo,
            &config,
            &mut rng,
        );
        assert!(outcome.is_err());
    }

    #[test]
    fn test_session_memoizes_most_recent_key() {
        let mut session = AnalysisSession::new(
            scenario_set(),
            EngineConfig::default(),
            StdRng::seed_from_u64(9),
        );
        let monday = Selector::day(Weekday::Monday);
        let first = session.analyze(monday, EstimationMode::MonteCarlo).unwrap().clone();
        let repeated = session.analyze(monday, EstimationMode::MonteCarlo).unwrap().clone();
        assert_eq!(first, repeated);

        // A different key resamples, so returning to the first key draws fresh values.
        session.analyze(monday, EstimationMode::Analytic).unwrap();
        assert_eq!(
            session.cached_key(),
            Some(AnalysisKey {
                selector: monday,
                mode: EstimationMode::Analytic
            })
        );
        let recomputed = session.analyze(monday, EstimationMode::MonteCarlo).unwrap().clone();
        assert_ne!(first, recomputed);
    }

    #[test]
    fn test_session_invalidate() {
        let mut session = AnalysisSession::new(
            scenario_set(),
            EngineConfig::default(),
            StdRng::seed_from_u64(9),
        );
        session
            .analyze(Selector::day(Weekday::Monday), EstimationMode::Analytic)
            .unwrap();
        session.invalidate();
        assert!(session.cached_key().is_none());
    }

    #[test]
    fn test_session_from_failed_load() {
        let load = Err(IngestionError::MissingColumn("converted"));
        let mut session = AnalysisSession::from_load(load, EngineConfig::default(), StdRng::seed_from_u64(1));
        assert!(session.records().is_empty());
        let outcome = session
            .analyze(Selector::day(Weekday::Monday), EstimationMode::Analytic)
            .unwrap();
        assert!(outcome.is_no_data());
    }
}
