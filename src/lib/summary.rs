//! Per-weekday overview of both arms, the tabular counterpart of the
//! single-selector analysis.

use crate::arm::Arm;
use crate::config::EngineConfig;
use crate::filter::TrialSet;
use crate::posterior::PosteriorParameters;
use crate::stats::{summarise_arm, ArmSummary};
use crate::superiority::heuristic_superiority;
use crate::weekday::Weekday;
use ordered_float::OrderedFloat;
use serde::Serialize;
use strum::IntoEnumIterator;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub day: Weekday,
    pub ad: ArmSummary,
    pub psa: ArmSummary,
    /// Posterior mean of the ad arm, `None` without ad trials.
    pub ad_mean: Option<f64>,
    pub psa_mean: Option<f64>,
    /// Heuristic `P(ad > psa)`; only defined when both arms have trials.
    pub prob_ad_better: Option<f64>,
}

impl DailySummary {
    pub fn arm(&self, arm: Arm) -> &ArmSummary {
        match arm {
            Arm::Ad => &self.ad,
            Arm::Psa => &self.psa,
        }
    }

    pub fn mean(&self, arm: Arm) -> Option<f64> {
        match arm {
            Arm::Ad => self.ad_mean,
            Arm::Psa => self.psa_mean,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklySummary {
    pub days: Vec<DailySummary>,
}

fn posterior_mean(summary: &ArmSummary) -> Option<f64> {
    if summary.statistics.is_empty() {
        return None;
    }
    Some(PosteriorParameters::from_statistics(&summary.statistics).mean())
}

pub fn summarise_day(records: &TrialSet, day: Weekday, config: &EngineConfig) -> DailySummary {
    let selected = records.filter_day(day);
    let ad = summarise_arm(&selected, Arm::Ad);
    let psa = summarise_arm(&selected, Arm::Psa);
    let prob_ad_better = if ad.statistics.is_empty() || psa.statistics.is_empty() {
        None
    } else {
        let estimate = heuristic_superiority(
            &PosteriorParameters::from_statistics(&ad.statistics),
            &PosteriorParameters::from_statistics(&psa.statistics),
            config.heuristic_scale,
        );
        Some(estimate.probability)
    };
    DailySummary {
        day,
        ad_mean: posterior_mean(&ad),
        psa_mean: posterior_mean(&psa),
        ad,
        psa,
        prob_ad_better,
    }
}

impl WeeklySummary {
    pub fn from_records(records: &TrialSet, config: &EngineConfig) -> Self {
        let days = Weekday::iter()
            .map(|day| summarise_day(records, day, config))
            .collect();
        Self { days }
    }

    /// Day with the highest ad-arm posterior mean; ties keep the earlier day.
    pub fn best_performing_day(&self) -> Option<Weekday> {
        self.days
            .iter()
            .filter_map(|d| d.ad_mean.map(|m| (d.day, m)))
            .rev()
            .max_by_key(|(_, m)| OrderedFloat(*m))
            .map(|(day, _)| day)
    }

    /// Day with the highest average exposures per ad-arm user; ties keep the earlier day.
    pub fn highest_exposure_day(&self) -> Option<Weekday> {
        self.days
            .iter()
            .filter_map(|d| d.ad.average_exposures.map(|e| (d.day, e)))
            .rev()
            .max_by_key(|(_, e)| OrderedFloat(*e))
            .map(|(day, _)| day)
    }

    /// Mean of the ad-arm posterior means over days that have ad data.
    ///
    /// Days without ad trials are left out of the average; they do not count as 0%.
    pub fn average_ad_rate(&self) -> Option<f64> {
        let means: Vec<f64> = self.days.iter().filter_map(|d| d.ad_mean).collect();
        if means.is_empty() {
            return None;
        }
        Some(means.iter().sum::<f64>() / means.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::TrialRecord;

    fn records(arm: Arm, day: Weekday, successes: usize, trials: usize, ads: u32) -> Vec<TrialRecord> {
        (0..trials)
            .map(|i| TrialRecord::new(arm, day, 12, i < successes, ads))
            .collect()
    }

    fn week() -> TrialSet {
        let mut all = Vec::new();
        all.extend(records(Arm::Ad, Weekday::Monday, 10, 100, 20));
        all.extend(records(Arm::Psa, Weekday::Monday, 5, 100, 20));
        all.extend(records(Arm::Ad, Weekday::Wednesday, 30, 100, 5));
        all.extend(records(Arm::Psa, Weekday::Wednesday, 10, 100, 5));
        all.extend(records(Arm::Ad, Weekday::Friday, 2, 50, 50));
        TrialSet::new(all)
    }

    #[test]
    fn test_weekly_summary_has_every_day() {
        let summary = WeeklySummary::from_records(&week(), &EngineConfig::default());
        assert_eq!(summary.days.len(), 7);
        assert_eq!(summary.days[0].day, Weekday::Monday);
        assert_eq!(summary.days[6].day, Weekday::Sunday);
        assert_eq!(summary.days[1].ad.statistics.trials, 0);
        assert!(summary.days[1].ad_mean.is_none());
    }

    #[test]
    fn test_insights() {
        let summary = WeeklySummary::from_records(&week(), &EngineConfig::default());
        assert_eq!(summary.best_performing_day(), Some(Weekday::Wednesday));
        assert_eq!(summary.highest_exposure_day(), Some(Weekday::Friday));
        let expected = (11.0 / 102.0 + 31.0 / 102.0 + 3.0 / 52.0) / 3.0;
        assert!((summary.average_ad_rate().unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_prob_ad_better_requires_both_arms() {
        let summary = WeeklySummary::from_records(&week(), &EngineConfig::default());
        let expected = 1.0 - (-10.0_f64 * (11.0 / 102.0 - 6.0 / 102.0)).exp();
        assert!((summary.days[0].prob_ad_better.unwrap() - expected).abs() < 1e-12);
        assert!((summary.days[0].prob_ad_better.unwrap() - 0.387_493_717).abs() < 1e-9);
        assert!(summary.days[4].prob_ad_better.is_none());
    }

    #[test]
    fn test_ties_keep_earlier_day() {
        let mut all = records(Arm::Ad, Weekday::Tuesday, 1, 10, 4);
        all.extend(records(Arm::Ad, Weekday::Thursday, 1, 10, 4));
        let summary = WeeklySummary::from_records(&TrialSet::new(all), &EngineConfig::default());
        assert_eq!(summary.best_performing_day(), Some(Weekday::Tuesday));
        assert_eq!(summary.highest_exposure_day(), Some(Weekday::Tuesday));
    }

    #[test]
    fn test_average_ad_rate_skips_days_without_ad_data() {
        let summary = WeeklySummary::from_records(
            &TrialSet::new(records(Arm::Ad, Weekday::Thursday, 4, 48, 2)),
            &EngineConfig::default(),
        );
        assert_eq!(summary.average_ad_rate(), Some(5.0 / 50.0));
    }

    #[test]
    fn test_daily_accessors_by_arm() {
        let summary = WeeklySummary::from_records(&week(), &EngineConfig::default());
        let monday = &summary.days[0];
        assert_eq!(monday.arm(Arm::Ad).statistics.successes, 10);
        assert_eq!(monday.arm(Arm::Psa).statistics.successes, 5);
        assert_eq!(monday.mean(Arm::Psa), Some(6.0 / 102.0));
        assert_eq!(summary.days[4].mean(Arm::Psa), None);
    }

    #[test]
    fn test_empty_week() {
        let summary = WeeklySummary::from_records(&TrialSet::default(), &EngineConfig::default());
        assert!(summary.best_performing_day().is_none());
        assert!(summary.average_ad_rate().is_none());
    }
}
