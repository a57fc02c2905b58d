//! Analysis of the indicator dataset.
//!
//! This module provides the derived indicators, the three composite
//! indices, trend fitting, statistical tests and period aggregation.

pub mod aggregator;
pub mod indicators;
pub mod indices;
pub mod statistics;
pub mod trend;

pub use aggregator::{summarize_periods, SUMMARY_INDICATORS};
pub use indicators::{employment_elasticity, gini};
pub use indices::compute_indices;
pub use trend::LinearTrend;
