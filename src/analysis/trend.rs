//! Linear trend fitting and forecasting.

use crate::dataset::Dataset;
use crate::error::{DataError, DataResult};
use crate::models::Indicator;
use serde::Serialize;

/// Ordinary least-squares fit of `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearTrend {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    /// Number of points used in the fit.
    pub n: usize,
}

impl LinearTrend {
    /// Fit a line through `(x, y)` points. Points with a NaN coordinate are
    /// dropped; at least two distinct `x` values are required.
    pub fn fit(points: &[(f64, f64)]) -> DataResult<Self> {
        let points: Vec<(f64, f64)> = points
            .iter()
            .copied()
            .filter(|(x, y)| !x.is_nan() && !y.is_nan())
            .collect();

        let n = points.len();
        if n < 2 {
            return Err(DataError::insufficient("linear trend", 2, n));
        }

        let count = n as f64;
        let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / count;
        let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / count;

        let sxx: f64 = points.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();
        let sxy: f64 = points
            .iter()
            .map(|(x, y)| (x - mean_x) * (y - mean_y))
            .sum();

        if sxx == 0.0 {
            return Err(DataError::insufficient("linear trend (distinct x values)", 2, 1));
        }

        let slope = sxy / sxx;
        let intercept = mean_y - slope * mean_x;

        let ss_tot: f64 = points.iter().map(|(_, y)| (y - mean_y).powi(2)).sum();
        let ss_res: f64 = points
            .iter()
            .map(|(x, y)| (y - (intercept + slope * x)).powi(2))
            .sum();

        Ok(Self {
            slope,
            intercept,
            r_squared: r_squared(ss_res, ss_tot),
            n,
        })
    }

    /// Fit an indicator against year.
    pub fn fit_indicator(dataset: &Dataset, indicator: Indicator) -> DataResult<Self> {
        let points: Vec<(f64, f64)> = dataset
            .observations()
            .iter()
            .map(|o| (o.year as f64, o.value(indicator)))
            .collect();
        Self::fit(&points)
    }

    /// Value of the fitted line at `x`.
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Coefficient of determination. A constant target scores 1 for a perfect
/// fit and 0 otherwise.
pub fn r_squared(ss_res: f64, ss_tot: f64) -> f64 {
    if ss_tot == 0.0 {
        if ss_res == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - ss_res / ss_tot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Observation;

    #[test]
    fn test_exact_line() {
        let points: Vec<(f64, f64)> = (0..5).map(|x| (x as f64, 2.0 * x as f64 + 1.0)).collect();
        let trend = LinearTrend::fit(&points).unwrap();
        assert!((trend.slope - 2.0).abs() < 1e-12);
        assert!((trend.intercept - 1.0).abs() < 1e-12);
        assert!((trend.r_squared - 1.0).abs() < 1e-12);
        assert!((trend.predict(10.0) - 21.0).abs() < 1e-9);
        assert_eq!(trend.n, 5);
    }

    #[test]
    fn test_noisy_fit() {
        // y = 1, 3, 2, 4 at x = 0..4: slope 0.8, intercept 1.3, R² 0.64
        let points = [(0.0, 1.0), (1.0, 3.0), (2.0, 2.0), (3.0, 4.0)];
        let trend = LinearTrend::fit(&points).unwrap();
        assert!((trend.slope - 0.8).abs() < 1e-12);
        assert!((trend.intercept - 1.3).abs() < 1e-12);
        assert!((trend.r_squared - 0.64).abs() < 1e-12);
    }

    #[test]
    fn test_nan_points_dropped() {
        let points = [(0.0, 0.0), (1.0, f64::NAN), (2.0, 2.0)];
        let trend = LinearTrend::fit(&points).unwrap();
        assert_eq!(trend.n, 2);
        assert!((trend.slope - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_insufficient_points() {
        assert!(LinearTrend::fit(&[(1.0, 1.0)]).is_err());
        assert!(LinearTrend::fit(&[(1.0, 1.0), (1.0, 2.0)]).is_err());
    }

    #[test]
    fn test_constant_target() {
        let trend = LinearTrend::fit(&[(0.0, 5.0), (1.0, 5.0), (2.0, 5.0)]).unwrap();
        assert_eq!(trend.slope, 0.0);
        assert_eq!(trend.r_squared, 1.0);
        assert_eq!(r_squared(1.0, 0.0), 0.0);
    }

    #[test]
    fn test_fit_indicator_against_year() {
        let rows = (2014..=2018)
            .map(|year| {
                let mut obs = Observation::empty(year);
                obs.top1_percent = 20.0 + 0.5 * (year - 2014) as f64;
                obs
            })
            .collect();
        let dataset = Dataset::from_observations(rows).unwrap();
        let trend = LinearTrend::fit_indicator(&dataset, Indicator::Top1Percent).unwrap();
        assert!((trend.slope - 0.5).abs() < 1e-9);
        assert!((trend.predict(2025.0) - 25.5).abs() < 1e-6);
    }
}
