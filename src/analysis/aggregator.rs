//! Period aggregation.
//!
//! This module groups yearly observations into labelled periods and
//! computes NaN-skipping means, the way the summary table is built.

use crate::dataset::Dataset;
use crate::models::{round_to, Indicator, Period, PeriodSummary};

/// Indicators averaged in the period summary table.
pub const SUMMARY_INDICATORS: [Indicator; 5] = [
    Indicator::GdpGrowth,
    Indicator::Unemployment,
    Indicator::Top1Percent,
    Indicator::FormalEmployment,
    Indicator::PressFreedomRank,
];

/// Mean ignoring NaN entries; NaN when nothing is left.
pub fn nan_mean(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Summarise each period: the NaN-skipping mean of every indicator,
/// rounded to 2 decimals.
pub fn summarize_periods(
    dataset: &Dataset,
    periods: &[Period],
    indicators: &[Indicator],
) -> Vec<PeriodSummary> {
    periods
        .iter()
        .map(|period| {
            let rows: Vec<_> = dataset
                .observations()
                .iter()
                .filter(|o| period.contains(o.year))
                .collect();
            let means = indicators
                .iter()
                .map(|&indicator| {
                    let values: Vec<f64> = rows.iter().map(|o| o.value(indicator)).collect();
                    (indicator, round_to(nan_mean(&values), 2))
                })
                .collect();

            PeriodSummary {
                label: period.label.clone(),
                means,
            }
        })
        .collect()
}
