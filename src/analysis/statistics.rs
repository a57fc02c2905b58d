//! Statistical tests run on the dataset: a correlation matrix, a
//! structural-break t-test and a standardized multiple regression.

use super::trend::r_squared;
use crate::dataset::Dataset;
use crate::error::{DataError, DataResult};
use crate::models::Indicator;
use nalgebra::{DMatrix, DVector, SVD};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Pairwise Pearson correlations between a set of indicators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub indicators: Vec<Indicator>,
    /// Row-major; `None` where fewer than two complete pairs exist or a
    /// column has zero variance.
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    /// Render as a text table with values rounded to 2 decimals.
    pub fn to_table(&self) -> String {
        let width = self
            .indicators
            .iter()
            .map(|i| i.column().len())
            .max()
            .unwrap_or(0);

        let mut out = format!("{:width$}", "", width = width);
        for indicator in &self.indicators {
            out.push_str(&format!(" {:>8.8}", indicator.column()));
        }
        out.push('\n');

        for (indicator, row) in self.indicators.iter().zip(&self.values) {
            out.push_str(&format!("{:width$}", indicator.column(), width = width));
            for value in row {
                match value {
                    Some(v) => out.push_str(&format!(" {:>8.2}", v)),
                    None => out.push_str(&format!(" {:>8}", "NaN")),
                }
            }
            out.push('\n');
        }
        out
    }
}

/// Pearson correlation over the pairs where both values are present.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter(|(a, b)| !a.is_nan() && !b.is_nan())
        .map(|(a, b)| (*a, *b))
        .collect();

    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;

    let cov: f64 = pairs.iter().map(|(a, b)| (a - mean_x) * (b - mean_y)).sum();
    let var_x: f64 = pairs.iter().map(|(a, _)| (a - mean_x).powi(2)).sum();
    let var_y: f64 = pairs.iter().map(|(_, b)| (b - mean_y).powi(2)).sum();

    let denominator = (var_x * var_y).sqrt();
    if denominator == 0.0 {
        None
    } else {
        Some(cov / denominator)
    }
}

/// Correlation matrix of the given indicators.
pub fn correlation_matrix(dataset: &Dataset, indicators: &[Indicator]) -> CorrelationMatrix {
    let columns: Vec<Vec<f64>> = indicators.iter().map(|&i| dataset.column(i)).collect();

    let values = columns
        .iter()
        .map(|a| columns.iter().map(|b| pearson(a, b)).collect())
        .collect();

    CorrelationMatrix {
        indicators: indicators.to_vec(),
        values,
    }
}

/// Result of a two-sample t-test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TTestResult {
    pub t_statistic: f64,
    /// Two-sided.
    pub p_value: f64,
    pub degrees_of_freedom: f64,
}

/// Two-sample Student t-test with pooled variance. NaN values are ignored.
pub fn t_test(a: &[f64], b: &[f64]) -> DataResult<TTestResult> {
    let a: Vec<f64> = a.iter().copied().filter(|v| !v.is_nan()).collect();
    let b: Vec<f64> = b.iter().copied().filter(|v| !v.is_nan()).collect();

    if a.len() < 2 || b.len() < 2 {
        return Err(DataError::insufficient(
            "t-test (values per group)",
            2,
            a.len().min(b.len()),
        ));
    }

    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let mean1 = a.iter().sum::<f64>() / n1;
    let mean2 = b.iter().sum::<f64>() / n2;
    let ss1: f64 = a.iter().map(|v| (v - mean1).powi(2)).sum();
    let ss2: f64 = b.iter().map(|v| (v - mean2).powi(2)).sum();

    let df = n1 + n2 - 2.0;
    let pooled = (ss1 + ss2) / df;
    let se = (pooled * (1.0 / n1 + 1.0 / n2)).sqrt();
    let t = (mean1 - mean2) / se;

    let p_value = if t.is_finite() {
        StudentsT::new(0.0, 1.0, df)
            .map(|dist| 2.0 * (1.0 - dist.cdf(t.abs())))
            .unwrap_or(f64::NAN)
    } else {
        f64::NAN
    };

    Ok(TTestResult {
        t_statistic: t,
        p_value,
        degrees_of_freedom: df,
    })
}

/// Test for a structural break in an indicator: years up to and including
/// `break_year` against the years after it.
pub fn structural_break(
    dataset: &Dataset,
    indicator: Indicator,
    break_year: i32,
) -> DataResult<TTestResult> {
    let (before, after): (Vec<_>, Vec<_>) = dataset
        .observations()
        .iter()
        .partition(|o| o.year <= break_year);

    let before: Vec<f64> = before.iter().map(|o| o.value(indicator)).collect();
    let after: Vec<f64> = after.iter().map(|o| o.value(indicator)).collect();
    t_test(&before, &after)
}

/// Multiple regression on standardized features.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionResult {
    pub target: Indicator,
    pub intercept: f64,
    /// One coefficient per feature, in feature order.
    pub coefficients: Vec<(Indicator, f64)>,
    pub r_squared: f64,
    /// Rows used after dropping incomplete ones.
    pub n: usize,
}

/// Z-score a column using the population standard deviation. A constant
/// column maps to zeros.
pub fn standardize(values: &[f64]) -> Vec<f64> {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
    values
        .iter()
        .map(|v| if std == 0.0 { 0.0 } else { (v - mean) / std })
        .collect()
}

/// Regress `target` on standardized `features` with an intercept.
///
/// Rows with a missing feature or target are dropped.
pub fn multiple_regression(
    dataset: &Dataset,
    target: Indicator,
    features: &[Indicator],
) -> DataResult<RegressionResult> {
    let rows: Vec<(Vec<f64>, f64)> = dataset
        .observations()
        .iter()
        .map(|o| {
            let x: Vec<f64> = features.iter().map(|&f| o.value(f)).collect();
            (x, o.value(target))
        })
        .filter(|(x, y)| !y.is_nan() && x.iter().all(|v| !v.is_nan()))
        .collect();

    let k = features.len();
    let needed = k + 2;
    if rows.len() < needed {
        return Err(DataError::insufficient("multiple regression", needed, rows.len()));
    }

    // Standardize column by column, then add the intercept column.
    let standardized: Vec<Vec<f64>> = (0..k)
        .map(|j| standardize(&rows.iter().map(|(x, _)| x[j]).collect::<Vec<_>>()))
        .collect();
    let design = DMatrix::from_fn(rows.len(), k + 1, |i, j| {
        if j == 0 {
            1.0
        } else {
            standardized[j - 1][i]
        }
    });
    let y = DVector::from_iterator(rows.len(), rows.iter().map(|(_, y)| *y));

    let beta = least_squares(&design, &y)?;

    let mean_y = y.mean();
    let ss_tot: f64 = y.iter().map(|v| (v - mean_y).powi(2)).sum();
    let ss_res = (&y - &design * &beta).norm_squared();

    Ok(RegressionResult {
        target,
        intercept: beta[0],
        coefficients: features
            .iter()
            .copied()
            .zip(beta.iter().skip(1).copied())
            .collect(),
        r_squared: r_squared(ss_res, ss_tot),
        n: rows.len(),
    })
}

/// Least-squares solution of `X β = y` through the SVD of `X`.
///
/// Singular values below a relative tolerance are treated as zero, so a
/// constant or collinear feature yields the minimum-norm solution instead
/// of failing.
fn least_squares(design: &DMatrix<f64>, y: &DVector<f64>) -> DataResult<DVector<f64>> {
    let svd = SVD::new(design.clone(), true, true);
    let eps = svd.singular_values.max() * 1e-10;
    svd.solve(y, eps).map_err(|_| DataError::Singular)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Observation;
    use pretty_assertions::assert_eq;

    impl CorrelationMatrix {
        fn get(&self, a: Indicator, b: Indicator) -> Option<f64> {
            let i = self.indicators.iter().position(|x| *x == a)?;
            let j = self.indicators.iter().position(|x| *x == b)?;
            self.values[i][j]
        }
    }

    #[test]
    fn test_pearson_perfect() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        let z = [8.0, 6.0, 4.0, 2.0];
        assert!((pearson(&x, &y).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &z).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_pairwise_complete() {
        let x = [1.0, 2.0, f64::NAN, 4.0];
        let y = [1.0, 2.0, 100.0, 4.0];
        assert!((pearson(&x, &y).unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(pearson(&[1.0, 1.0], &[1.0, 2.0]), None);
        assert_eq!(pearson(&[1.0], &[1.0]), None);
    }

    #[test]
    fn test_correlation_matrix() {
        let rows = (0..6)
            .map(|i| {
                let mut obs = Observation::empty(2014 + i);
                obs.gdp_growth = i as f64;
                obs.unemployment = 10.0 - i as f64;
                obs
            })
            .collect();
        let dataset = Dataset::from_observations(rows).unwrap();
        let matrix = correlation_matrix(
            &dataset,
            &[Indicator::GdpGrowth, Indicator::Unemployment, Indicator::Top1Percent],
        );

        let r = matrix
            .get(Indicator::GdpGrowth, Indicator::Unemployment)
            .unwrap();
        assert!((r + 1.0).abs() < 1e-12);
        assert_eq!(
            matrix.get(Indicator::Top1Percent, Indicator::GdpGrowth),
            None
        );
        assert!(matrix.to_table().contains("NaN"));
        assert!(matrix.to_table().contains("-1.00"));
    }

    #[test]
    fn test_t_test_known_value() {
        // means 2 and 5, pooled variance 1, se = sqrt(2/3)
        let result = t_test(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]).unwrap();
        let expected_t = -3.0 / (2.0f64 / 3.0).sqrt();
        assert!((result.t_statistic - expected_t).abs() < 1e-12);
        assert_eq!(result.degrees_of_freedom, 4.0);
        // two-sided p for t = -3.674 with 4 degrees of freedom
        assert!((result.p_value - 0.021_31).abs() < 1e-4);
    }

    #[test]
    fn test_t_test_needs_two_per_group() {
        assert!(t_test(&[1.0], &[2.0, 3.0]).is_err());
        assert!(t_test(&[1.0, f64::NAN], &[2.0, 3.0]).is_err());
    }

    #[test]
    fn test_structural_break_split() {
        let rows = (2014..=2019)
            .map(|year| {
                let mut obs = Observation::empty(year);
                obs.formal_employment = if year <= 2016 { 10.0 + (year % 2) as f64 } else { 8.0 };
                obs
            })
            .collect();
        let dataset = Dataset::from_observations(rows).unwrap();
        let result = structural_break(&dataset, Indicator::FormalEmployment, 2016).unwrap();
        assert!(result.t_statistic > 0.0);
        assert!(result.p_value < 0.05);
    }

    #[test]
    fn test_standardize() {
        let z = standardize(&[1.0, 2.0, 3.0]);
        let s = (2.0f64 / 3.0).sqrt();
        assert!((z[0] + 1.0 / s).abs() < 1e-12);
        assert_eq!(z[1], 0.0);
        assert_eq!(standardize(&[4.0, 4.0]), vec![0.0, 0.0]);
    }

    fn exact_model_rows() -> Vec<Observation> {
        // y = 3 + 2*a - b on raw features
        let raw = [
            (1.0, 5.0),
            (2.0, 3.0),
            (3.0, 8.0),
            (4.0, 1.0),
            (5.0, 4.0),
            (6.0, 7.0),
        ];
        raw.iter()
            .enumerate()
            .map(|(idx, &(a, b))| {
                let mut obs = Observation::empty(2014 + idx as i32);
                obs.gdp_growth = a;
                obs.formal_employment = b;
                obs.top1_percent = 3.0 + 2.0 * a - b;
                obs
            })
            .collect()
    }

    #[test]
    fn test_least_squares_small_system() {
        // 2x + y = 5, x + 3y = 10 -> x = 1, y = 3
        let design = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 3.0]);
        let y = DVector::from_vec(vec![5.0, 10.0]);
        let x = least_squares(&design, &y).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-9);
        assert!((x[1] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_least_squares_rank_deficient_is_min_norm() {
        // x + 2y = 5 twice: min-norm solution is (1, 2)
        let design = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 1.0, 2.0]);
        let y = DVector::from_vec(vec![5.0, 5.0]);
        let x = least_squares(&design, &y).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-9);
        assert!((x[1] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_multiple_regression_recovers_exact_model() {
        let rows = exact_model_rows();
        let dataset = Dataset::from_observations(rows).unwrap();

        let result = multiple_regression(
            &dataset,
            Indicator::Top1Percent,
            &[Indicator::GdpGrowth, Indicator::FormalEmployment],
        )
        .unwrap();

        assert!((result.r_squared - 1.0).abs() < 1e-9);
        assert_eq!(result.n, 6);

        // Standardized coefficients equal raw coefficient times population std.
        let std_a = (17.5f64 / 6.0).sqrt();
        let (feature, coef) = result.coefficients[0];
        assert_eq!(feature, Indicator::GdpGrowth);
        assert!((coef - 2.0 * std_a).abs() < 1e-9);
        assert!(result.coefficients[1].1 < 0.0);
    }

    #[test]
    fn test_multiple_regression_constant_feature() {
        let rows = exact_model_rows()
            .into_iter()
            .map(|mut obs| {
                obs.fci = 0.4;
                obs
            })
            .collect();
        let dataset = Dataset::from_observations(rows).unwrap();

        let result = multiple_regression(
            &dataset,
            Indicator::Top1Percent,
            &[Indicator::GdpGrowth, Indicator::FormalEmployment, Indicator::Fci],
        )
        .unwrap();

        assert!((result.r_squared - 1.0).abs() < 1e-9);
        let std_a = (17.5f64 / 6.0).sqrt();
        assert!((result.coefficients[0].1 - 2.0 * std_a).abs() < 1e-9);
        assert_eq!(result.coefficients[2].0, Indicator::Fci);
        assert!(result.coefficients[2].1.abs() < 1e-9);
    }

    #[test]
    fn test_multiple_regression_collinear_features() {
        let rows = (0..6)
            .map(|i| {
                let mut obs = Observation::empty(2014 + i);
                obs.gdp_growth = i as f64;
                obs.unemployment = 2.0 * i as f64;
                obs.top1_percent = 1.0 + i as f64;
                obs
            })
            .collect();
        let dataset = Dataset::from_observations(rows).unwrap();

        let result = multiple_regression(
            &dataset,
            Indicator::Top1Percent,
            &[Indicator::GdpGrowth, Indicator::Unemployment],
        )
        .unwrap();

        // Identical standardized columns share the effect equally.
        let std_x = (17.5f64 / 6.0).sqrt();
        assert!((result.r_squared - 1.0).abs() < 1e-9);
        assert!((result.intercept - 3.5).abs() < 1e-9);
        assert!((result.coefficients[0].1 - std_x / 2.0).abs() < 1e-9);
        assert!((result.coefficients[1].1 - std_x / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_multiple_regression_drops_incomplete_rows() {
        let rows = (0..4)
            .map(|i| {
                let mut obs = Observation::empty(2014 + i);
                obs.gdp_growth = i as f64;
                obs.top1_percent = if i == 0 { f64::NAN } else { i as f64 };
                obs
            })
            .collect();
        let dataset = Dataset::from_observations(rows).unwrap();
        let result =
            multiple_regression(&dataset, Indicator::Top1Percent, &[Indicator::GdpGrowth]).unwrap();
        assert_eq!(result.n, 3);

        let too_few = multiple_regression(
            &dataset,
            Indicator::Top1Percent,
            &[Indicator::GdpGrowth, Indicator::Unemployment],
        );
        assert!(too_few.is_err());
    }
}
