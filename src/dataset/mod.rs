//! Dataset loading and profiling.
//!
//! This module reads the yearly indicator CSV into memory, enforces the
//! one-row-per-year invariant and provides column access for the
//! analysis steps.

use crate::error::{DataError, DataResult};
use crate::models::{ColumnProfile, Indicator, Observation};
use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::path::Path;
use tracing::{debug, info, warn};

/// The in-memory table of yearly observations, sorted by year.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    observations: Vec<Observation>,
    /// Known indicator columns that were absent from the source header.
    missing_columns: Vec<Indicator>,
    /// Columns in the source header, unknown ones included.
    column_count: usize,
}

impl Dataset {
    /// Build a dataset from observations, rejecting duplicate years.
    pub fn from_observations(mut observations: Vec<Observation>) -> DataResult<Self> {
        if observations.is_empty() {
            return Err(DataError::Empty);
        }

        let mut seen = HashSet::new();
        for obs in &observations {
            if !seen.insert(obs.year) {
                return Err(DataError::DuplicateYear(obs.year));
            }
        }

        observations.sort_by_key(|o| o.year);

        Ok(Self {
            observations,
            missing_columns: Vec::new(),
            column_count: Indicator::SOURCE.len() + 1,
        })
    }

    /// Load the dataset from a CSV file.
    pub fn load(path: &Path) -> DataResult<Self> {
        info!("Loading dataset from: {}", path.display());
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;
        Self::from_reader(reader)
    }

    /// Load the dataset from any CSV reader with a header row.
    pub fn from_reader<R: std::io::Read>(mut reader: csv::Reader<R>) -> DataResult<Self> {
        // Serde matches field names exactly, so normalize the header first.
        let headers: csv::StringRecord = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();
        reader.set_headers(headers.clone());
        let columns: HashSet<&str> = headers.iter().collect();

        if !columns.contains("year") {
            return Err(DataError::MissingYearColumn);
        }

        let missing_columns: Vec<Indicator> = Indicator::SOURCE
            .into_iter()
            .filter(|indicator| !columns.contains(indicator.column()))
            .collect();

        let unknown: Vec<&str> = headers
            .iter()
            .filter(|h| *h != "year" && h.parse::<Indicator>().is_err())
            .collect();
        if !unknown.is_empty() {
            warn!("Ignoring unknown columns: {}", unknown.join(", "));
        }

        let mut observations = Vec::new();
        for record in reader.deserialize::<Observation>() {
            observations.push(record?);
        }

        let mut dataset = Self::from_observations(observations)?;
        dataset.missing_columns = missing_columns;
        dataset.column_count = headers.len();

        if !dataset.missing_columns.is_empty() {
            let names: Vec<&str> = dataset.missing_columns.iter().map(|i| i.column()).collect();
            warn!(
                "Dataset is missing {} column(s), treated as NaN: {}",
                names.len(),
                names.join(", ")
            );
        }

        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn observations_mut(&mut self) -> &mut [Observation] {
        &mut self.observations
    }

    pub fn missing_columns(&self) -> &[Indicator] {
        &self.missing_columns
    }

    /// All years, ascending.
    pub fn years(&self) -> Vec<i32> {
        self.observations.iter().map(|o| o.year).collect()
    }

    /// First and last year covered.
    pub fn year_span(&self) -> Option<(i32, i32)> {
        match (self.observations.first(), self.observations.last()) {
            (Some(first), Some(last)) => Some((first.year, last.year)),
            _ => None,
        }
    }

    /// Look up the observation for a year.
    pub fn observation(&self, year: i32) -> DataResult<&Observation> {
        self.observations
            .binary_search_by_key(&year, |o| o.year)
            .map(|idx| &self.observations[idx])
            .map_err(|_| DataError::YearNotFound(year))
    }

    /// Values of one indicator in year order (NaN where missing).
    pub fn column(&self, indicator: Indicator) -> Vec<f64> {
        self.observations.iter().map(|o| o.value(indicator)).collect()
    }

    /// `(year, value)` pairs for one indicator, skipping missing values.
    pub fn series(&self, indicator: Indicator) -> Vec<(i32, f64)> {
        self.observations
            .iter()
            .map(|o| (o.year, o.value(indicator)))
            .filter(|(_, v)| !v.is_nan())
            .collect()
    }

    /// Observations whose year falls in `years`.
    pub fn filter_years(&self, years: RangeInclusive<i32>) -> Vec<&Observation> {
        self.observations
            .iter()
            .filter(|o| years.contains(&o.year))
            .collect()
    }

    /// Descriptive statistics for every column with at least one value.
    pub fn profile(&self) -> Vec<ColumnProfile> {
        Indicator::all()
            .filter_map(|indicator| profile_column(indicator, &self.column(indicator)))
            .collect()
    }

    /// Log shape and descriptive statistics, as a sanity check after loading.
    pub fn log_profile(&self) {
        info!("Dataset shape: ({}, {})", self.len(), self.column_count);
        if let Some((first, last)) = self.year_span() {
            info!("Years covered: {}-{}", first, last);
        }

        for p in self.profile() {
            debug!(
                "{:<24} count={:<3} mean={:>10.3} std={:>10.3} min={:>10.3} median={:>10.3} max={:>10.3}",
                p.indicator.column(),
                p.count,
                p.mean,
                p.std_dev,
                p.min,
                p.median,
                p.max
            );
        }
    }
}

/// Summarise one column; `None` when every value is missing.
fn profile_column(indicator: Indicator, values: &[f64]) -> Option<ColumnProfile> {
    let mut present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if present.is_empty() {
        return None;
    }

    present.sort_by(|a, b| a.total_cmp(b));
    let count = present.len();
    let mean = present.iter().sum::<f64>() / count as f64;
    let std_dev = if count > 1 {
        let ss: f64 = present.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (count - 1) as f64).sqrt()
    } else {
        f64::NAN
    };

    let mid = count / 2;
    let median = if count % 2 == 0 {
        (present[mid - 1] + present[mid]) / 2.0
    } else {
        present[mid]
    };

    Some(ColumnProfile {
        indicator,
        count,
        mean,
        std_dev,
        min: present[0],
        median,
        max: present[count - 1],
    })
}
