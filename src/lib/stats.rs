use crate::arm::Arm;
use crate::filter::TrialSet;
use serde::Serialize;

/// Sufficient statistics of one arm: conversions out of users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GroupStatistics {
    pub successes: u64,
    pub trials: u64,
}

impl GroupStatistics {
    /// `successes` is capped at `trials`.
    pub fn new(successes: u64, trials: u64) -> Self {
        Self {
            successes: successes.min(trials),
            trials,
        }
    }

    pub fn failures(&self) -> u64 {
        self.trials - self.successes
    }

    pub fn is_empty(&self) -> bool {
        self.trials == 0
    }

    /// Raw conversion rate, `None` without trials.
    pub fn conversion_rate(&self) -> Option<f64> {
        if self.trials == 0 {
            return None;
        }
        Some(self.successes as f64 / self.trials as f64)
    }
}

/// Per-arm counts and raw rates used by the summary outputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ArmSummary {
    pub arm: Arm,
    pub statistics: GroupStatistics,
    pub total_exposures: u64,
    /// `successes / trials`, `None` without trials.
    pub conversion_rate: Option<f64>,
    /// `total_exposures / trials`, `None` without trials.
    pub average_exposures: Option<f64>,
}

impl ArmSummary {
    pub fn new(arm: Arm, statistics: GroupStatistics, total_exposures: u64) -> Self {
        let average_exposures = if statistics.is_empty() {
            None
        } else {
            Some(total_exposures as f64 / statistics.trials as f64)
        };
        Self {
            arm,
            statistics,
            total_exposures,
            conversion_rate: statistics.conversion_rate(),
            average_exposures,
        }
    }
}

pub fn aggregate(records: &TrialSet, arm: Arm) -> GroupStatistics {
    summarise_arm(records, arm).statistics
}

pub fn summarise_arm(records: &TrialSet, arm: Arm) -> ArmSummary {
    let (successes, trials, total_exposures) = records
        .iter()
        .filter(|r| r.arm == arm)
        .fold((0u64, 0u64, 0u64), |(s, t, e), r| {
            (s + r.converted as u64, t + 1, e + r.ad_exposures as u64)
        });
    ArmSummary::new(arm, GroupStatistics { successes, trials }, total_exposures)
}
