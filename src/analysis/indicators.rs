//! Headline economic indicators: employment elasticity and the Gini coefficient.

use crate::dataset::Dataset;
use crate::error::DataResult;
use crate::models::{round_to, Elasticity};

/// Percentage change from `start` to `end`.
fn percent_change(start: f64, end: f64) -> f64 {
    (end - start) / start * 100.0
}

/// Employment elasticity of growth between two years.
///
/// Ratio of percentage employment growth to percentage GDP growth, rounded
/// to 2 decimals. Zero GDP growth yields 0, which callers must treat as a
/// sentinel rather than a measurement.
pub fn employment_elasticity(
    dataset: &Dataset,
    start_year: i32,
    end_year: i32,
) -> DataResult<Elasticity> {
    let start = dataset.observation(start_year)?;
    let end = dataset.observation(end_year)?;

    let emp_growth = percent_change(start.employment, end.employment);
    let gdp_growth = percent_change(start.gdp, end.gdp);

    let value = if gdp_growth != 0.0 {
        round_to(emp_growth / gdp_growth, 2)
    } else {
        0.0
    };

    Ok(Elasticity {
        start_year,
        end_year,
        value,
    })
}

/// Gini coefficient of a distribution of shares.
///
/// Shares are ranked ascending with 1-based rank `i`, giving
/// `2·Σ(i·x_i) / (n·Σx) − (n+1)/n`. Returns `None` for an empty slice or
/// when every share is zero.
pub fn gini(shares: &[f64]) -> Option<f64> {
    let n = shares.len();
    let total: f64 = shares.iter().sum();
    if n == 0 || total == 0.0 {
        return None;
    }

    let mut sorted = shares.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(idx, share)| (idx + 1) as f64 * share)
        .sum();

    let n = n as f64;
    Some(2.0 * weighted / (n * total) - (n + 1.0) / n)
}
