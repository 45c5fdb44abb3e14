use crate::record::TrialRecord;
use crate::weekday::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which slice of the experiment to analyse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selector {
    pub day: Weekday,
    pub hour: Option<u8>,
}

impl Selector {
    pub fn day(day: Weekday) -> Self {
        Self { day, hour: None }
    }

    pub fn day_hour(day: Weekday, hour: u8) -> Self {
        Self {
            day,
            hour: Some(hour),
        }
    }

    pub fn matches(&self, record: &TrialRecord) -> bool {
        record.day == self.day && self.hour.is_none_or(|h| record.hour == h)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.hour {
            Some(hour) => write!(f, "{} {:02}:00", self.day, hour),
            None => write!(f, "{}", self.day),
        }
    }
}

/// Read-only collection of parsed trial records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrialSet {
    pub records: Vec<TrialRecord>,
}

impl TrialSet {
    pub fn new(records: Vec<TrialRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrialRecord> {
        self.records.iter()
    }

    pub fn filter(&self, filter_fn: impl Fn(&TrialRecord) -> bool) -> Self {
        let filtered_records: Vec<TrialRecord> = self
            .records
            .iter()
            .filter(|r| filter_fn(r))
            .copied()
            .collect();
        Self {
            records: filtered_records,
        }
    }

    pub fn filter_day(&self, day: Weekday) -> Self {
        self.filter(|r| r.day == day)
    }

    pub fn filter_hour(&self, hour: u8) -> Self {
        self.filter(|r| r.hour == hour)
    }

    pub fn select(&self, selector: &Selector) -> Self {
        self.filter(|r| selector.matches(r))
    }
}

impl FromIterator<TrialRecord> for TrialSet {
    fn from_iter<I: IntoIterator<Item = TrialRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
