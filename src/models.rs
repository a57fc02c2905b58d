//! Data models for the replication pipeline.
//!
//! This module contains the core data structures used throughout the
//! application: the indicator catalogue, yearly observations and the
//! result records produced by the analysis steps.

use crate::error::DataError;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// A column of the yearly dataset, including the three derived indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    Gdp,
    GdpGrowth,
    Employment,
    FormalEmployment,
    Unemployment,
    YouthUnemployment,
    ManufacturingJobs,
    Top1Percent,
    Top10Percent,
    Bottom50Percent,
    GiniCoefficient,
    CessPercentage,
    ActualDevolution,
    PromisedDevolution,
    ConditionalBorrowing,
    TotalBorrowing,
    StateBorrowing,
    CentralSpending,
    PressFreedomRank,
    VdemLiberalDemocracy,
    FreedomHouseScore,
    InternetShutdowns,
    /// Statistical Suppression Index (derived)
    Ssi,
    /// Fiscal Centralization Index (derived)
    Fci,
    /// Democratic Quality Index (derived)
    Dqi,
}

impl Indicator {
    /// Columns read from the source CSV.
    pub const SOURCE: [Indicator; 22] = [
        Indicator::Gdp,
        Indicator::GdpGrowth,
        Indicator::Employment,
        Indicator::FormalEmployment,
        Indicator::Unemployment,
        Indicator::YouthUnemployment,
        Indicator::ManufacturingJobs,
        Indicator::Top1Percent,
        Indicator::Top10Percent,
        Indicator::Bottom50Percent,
        Indicator::GiniCoefficient,
        Indicator::CessPercentage,
        Indicator::ActualDevolution,
        Indicator::PromisedDevolution,
        Indicator::ConditionalBorrowing,
        Indicator::TotalBorrowing,
        Indicator::StateBorrowing,
        Indicator::CentralSpending,
        Indicator::PressFreedomRank,
        Indicator::VdemLiberalDemocracy,
        Indicator::FreedomHouseScore,
        Indicator::InternetShutdowns,
    ];

    /// Columns appended by the index computation.
    pub const DERIVED: [Indicator; 3] = [Indicator::Ssi, Indicator::Fci, Indicator::Dqi];

    /// Canonical column name.
    pub fn column(&self) -> &'static str {
        match self {
            Indicator::Gdp => "gdp",
            Indicator::GdpGrowth => "gdp_growth",
            Indicator::Employment => "employment",
            Indicator::FormalEmployment => "formal_employment",
            Indicator::Unemployment => "unemployment",
            Indicator::YouthUnemployment => "youth_unemployment",
            Indicator::ManufacturingJobs => "manufacturing_jobs",
            Indicator::Top1Percent => "top1_percent",
            Indicator::Top10Percent => "top10_percent",
            Indicator::Bottom50Percent => "bottom50_percent",
            Indicator::GiniCoefficient => "gini_coefficient",
            Indicator::CessPercentage => "cess_percentage",
            Indicator::ActualDevolution => "actual_devolution",
            Indicator::PromisedDevolution => "promised_devolution",
            Indicator::ConditionalBorrowing => "conditional_borrowing",
            Indicator::TotalBorrowing => "total_borrowing",
            Indicator::StateBorrowing => "state_borrowing",
            Indicator::CentralSpending => "central_spending",
            Indicator::PressFreedomRank => "press_freedom_rank",
            Indicator::VdemLiberalDemocracy => "vdem_liberal_democracy",
            Indicator::FreedomHouseScore => "freedom_house_score",
            Indicator::InternetShutdowns => "internet_shutdowns",
            Indicator::Ssi => "ssi",
            Indicator::Fci => "fci",
            Indicator::Dqi => "dqi",
        }
    }

    /// Iterate over every known column, source columns first.
    pub fn all() -> impl Iterator<Item = Indicator> {
        Self::SOURCE.into_iter().chain(Self::DERIVED)
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Indicator {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        Self::all()
            .find(|indicator| indicator.column() == name)
            .ok_or_else(|| DataError::UnknownIndicator(s.to_string()))
    }
}

fn missing() -> f64 {
    f64::NAN
}

/// Parse a numeric cell, mapping blanks and the usual NA spellings to NaN.
fn nan_if_missing<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(f64::NAN);
    };

    let trimmed = raw.trim();
    match trimmed.to_lowercase().as_str() {
        "" | "na" | "n/a" | "nan" | "null" | "none" => Ok(f64::NAN),
        _ => trimmed
            .parse::<f64>()
            .map_err(|e| de::Error::custom(format!("invalid number '{}': {}", trimmed, e))),
    }
}

/// One row of the dataset: a year and its indicators.
///
/// Missing values are stored as NaN so that they propagate through the
/// index formulas and are skipped by aggregations.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Observation {
    pub year: i32,

    #[serde(default = "missing", deserialize_with = "nan_if_missing")]
    pub gdp: f64,
    #[serde(default = "missing", deserialize_with = "nan_if_missing")]
    pub gdp_growth: f64,
    #[serde(default = "missing", deserialize_with = "nan_if_missing")]
    pub employment: f64,
    #[serde(default = "missing", deserialize_with = "nan_if_missing")]
    pub formal_employment: f64,
    #[serde(default = "missing", deserialize_with = "nan_if_missing")]
    pub unemployment: f64,
    #[serde(default = "missing", deserialize_with = "nan_if_missing")]
    pub youth_unemployment: f64,
    #[serde(default = "missing", deserialize_with = "nan_if_missing")]
    pub manufacturing_jobs: f64,
    #[serde(default = "missing", deserialize_with = "nan_if_missing")]
    pub top1_percent: f64,
    #[serde(default = "missing", deserialize_with = "nan_if_missing")]
    pub top10_percent: f64,
    #[serde(default = "missing", deserialize_with = "nan_if_missing")]
    pub bottom50_percent: f64,
    #[serde(default = "missing", deserialize_with = "nan_if_missing")]
    pub gini_coefficient: f64,
    #[serde(default = "missing", deserialize_with = "nan_if_missing")]
    pub cess_percentage: f64,
    #[serde(default = "missing", deserialize_with = "nan_if_missing")]
    pub actual_devolution: f64,
    #[serde(default = "missing", deserialize_with = "nan_if_missing")]
    pub promised_devolution: f64,
    #[serde(default = "missing", deserialize_with = "nan_if_missing")]
    pub conditional_borrowing: f64,
    #[serde(default = "missing", deserialize_with = "nan_if_missing")]
    pub total_borrowing: f64,
    #[serde(default = "missing", deserialize_with = "nan_if_missing")]
    pub state_borrowing: f64,
    #[serde(default = "missing", deserialize_with = "nan_if_missing")]
    pub central_spending: f64,
    #[serde(default = "missing", deserialize_with = "nan_if_missing")]
    pub press_freedom_rank: f64,
    #[serde(default = "missing", deserialize_with = "nan_if_missing")]
    pub vdem_liberal_democracy: f64,
    #[serde(default = "missing", deserialize_with = "nan_if_missing")]
    pub freedom_house_score: f64,
    #[serde(default = "missing", deserialize_with = "nan_if_missing")]
    pub internet_shutdowns: f64,

    /// Filled by `analysis::indices::compute_indices`.
    #[serde(skip, default = "missing")]
    pub ssi: f64,
    #[serde(skip, default = "missing")]
    pub fci: f64,
    #[serde(skip, default = "missing")]
    pub dqi: f64,
}

impl Observation {
    /// Creates an observation for `year` with every indicator missing.
    #[cfg(test)]
    pub fn empty(year: i32) -> Self {
        Self {
            year,
            gdp: f64::NAN,
            gdp_growth: f64::NAN,
            employment: f64::NAN,
            formal_employment: f64::NAN,
            unemployment: f64::NAN,
            youth_unemployment: f64::NAN,
            manufacturing_jobs: f64::NAN,
            top1_percent: f64::NAN,
            top10_percent: f64::NAN,
            bottom50_percent: f64::NAN,
            gini_coefficient: f64::NAN,
            cess_percentage: f64::NAN,
            actual_devolution: f64::NAN,
            promised_devolution: f64::NAN,
            conditional_borrowing: f64::NAN,
            total_borrowing: f64::NAN,
            state_borrowing: f64::NAN,
            central_spending: f64::NAN,
            press_freedom_rank: f64::NAN,
            vdem_liberal_democracy: f64::NAN,
            freedom_house_score: f64::NAN,
            internet_shutdowns: f64::NAN,
            ssi: f64::NAN,
            fci: f64::NAN,
            dqi: f64::NAN,
        }
    }

    /// Returns the value of an indicator (NaN when missing).
    pub fn value(&self, indicator: Indicator) -> f64 {
        match indicator {
            Indicator::Gdp => self.gdp,
            Indicator::GdpGrowth => self.gdp_growth,
            Indicator::Employment => self.employment,
            Indicator::FormalEmployment => self.formal_employment,
            Indicator::Unemployment => self.unemployment,
            Indicator::YouthUnemployment => self.youth_unemployment,
            Indicator::ManufacturingJobs => self.manufacturing_jobs,
            Indicator::Top1Percent => self.top1_percent,
            Indicator::Top10Percent => self.top10_percent,
            Indicator::Bottom50Percent => self.bottom50_percent,
            Indicator::GiniCoefficient => self.gini_coefficient,
            Indicator::CessPercentage => self.cess_percentage,
            Indicator::ActualDevolution => self.actual_devolution,
            Indicator::PromisedDevolution => self.promised_devolution,
            Indicator::ConditionalBorrowing => self.conditional_borrowing,
            Indicator::TotalBorrowing => self.total_borrowing,
            Indicator::StateBorrowing => self.state_borrowing,
            Indicator::CentralSpending => self.central_spending,
            Indicator::PressFreedomRank => self.press_freedom_rank,
            Indicator::VdemLiberalDemocracy => self.vdem_liberal_democracy,
            Indicator::FreedomHouseScore => self.freedom_house_score,
            Indicator::InternetShutdowns => self.internet_shutdowns,
            Indicator::Ssi => self.ssi,
            Indicator::Fci => self.fci,
            Indicator::Dqi => self.dqi,
        }
    }
}

/// A recorded data-suppression event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SuppressionEvent {
    pub label: &'static str,
    /// How severe the suppression was, in [0, 1].
    pub severity: f64,
    /// How much public attention it drew, in [0, 1].
    pub salience: f64,
}

impl SuppressionEvent {
    pub const fn new(label: &'static str, severity: f64, salience: f64) -> Self {
        Self {
            label,
            severity,
            salience,
        }
    }

    /// Contribution of this event to the year's SSI.
    pub fn score(&self) -> f64 {
        self.severity * self.salience
    }
}

/// Employment elasticity of growth over a period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Elasticity {
    pub start_year: i32,
    pub end_year: i32,
    /// Rounded to 2 decimals; 0 when GDP did not grow (sentinel, not a measurement).
    pub value: f64,
}

impl Elasticity {
    pub fn label(&self) -> String {
        format!("{}-{}", self.start_year, self.end_year)
    }
}

/// A labelled, inclusive span of years.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub label: String,
    pub from: i32,
    pub to: i32,
}

impl Period {
    pub fn new(from: i32, to: i32) -> Self {
        Self {
            label: format!("{}-{}", from, to),
            from,
            to,
        }
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.from..=self.to).contains(&year)
    }
}

/// Mean of selected indicators over a labelled span of years.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub label: String,
    /// (indicator, mean rounded to 2 dp); NaN when the period has no values.
    pub means: Vec<(Indicator, f64)>,
}

/// Descriptive statistics for one column, logged after loading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnProfile {
    pub indicator: Indicator,
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub median: f64,
    pub max: f64,
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
