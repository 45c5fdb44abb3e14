use anyhow::{bail, Result};
use serde::Serialize;
use std::{fmt, str::FromStr};
use strum_macros::EnumIter;

/// One branch of the experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, EnumIter)]
pub enum Arm {
    /// Users exposed to the advertisement.
    Ad,
    /// Control users shown a public service announcement.
    Psa,
}

impl Arm {
    pub fn to_code(&self) -> &'static str {
        match self {
            Arm::Ad => "ad",
            Arm::Psa => "psa",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Arm::Ad => "Ad Group",
            Arm::Psa => "PSA Group",
        }
    }
}

impl fmt::Display for Arm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_code())
    }
}

impl FromStr for Arm {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ad" => Ok(Arm::Ad),
            "psa" => Ok(Arm::Psa),
            _ => bail!("Invalid test group: {}", s),
        }
    }
}
