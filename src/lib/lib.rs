//! Bayesian posterior inference for two-arm conversion experiments.
//!
//! Trial records are loaded from CSV, filtered by weekday and hour, and each arm's
//! conversion rate is given a Beta posterior. Results are computed either in closed
//! form or by Monte Carlo sampling.

pub mod analysis;
pub mod arm;
pub mod config;
pub mod error;
pub mod estimator;
pub mod filter;
pub mod histogram;
pub mod interval;
pub mod posterior;
pub mod record;
pub mod stats;
pub mod summary;
pub mod superiority;
pub mod weekday;
