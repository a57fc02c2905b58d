//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.replicate.toml` files. Every field has a default, so running without
//! a config file reproduces the reference replication.

use crate::analysis::SUMMARY_INDICATORS;
use crate::models::{Indicator, Period};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = ".replicate.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Input dataset settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Analysis parameters.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Chart rendering settings.
    #[serde(default)]
    pub charts: ChartConfig,

    /// Export settings.
    #[serde(default)]
    pub export: ExportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory all artifacts are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            verbose: false,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Input dataset settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to the master dataset CSV.
    #[serde(default = "default_data_path")]
    pub path: PathBuf,

    /// Title written into the JSON metadata.
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            title: default_title(),
        }
    }
}

fn default_data_path() -> PathBuf {
    PathBuf::from("data/SP_masterdataset.csv")
}

fn default_title() -> String {
    "India Economic Indicators 2014-2025".to_string()
}

/// Analysis parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Indicator fitted against year for the trend forecast.
    #[serde(default = "default_trend_indicator")]
    pub trend_indicator: Indicator,

    /// Year the trend is extrapolated to.
    #[serde(default = "default_forecast_year")]
    pub forecast_year: i32,

    /// Indicator tested for a structural break.
    #[serde(default = "default_break_indicator")]
    pub break_indicator: Indicator,

    /// Last year of the "before" group in the break test.
    #[serde(default = "default_break_year")]
    pub break_year: i32,

    /// Indicators in the correlation matrix.
    #[serde(default = "default_correlation_indicators")]
    pub correlation_indicators: Vec<Indicator>,

    /// Target of the multiple regression.
    #[serde(default = "default_regression_target")]
    pub regression_target: Indicator,

    /// Standardized regressors.
    #[serde(default = "default_regression_features")]
    pub regression_features: Vec<Indicator>,

    /// Indicators averaged in the period summary.
    #[serde(default = "default_summary_indicators")]
    pub summary_indicators: Vec<Indicator>,

    /// Periods over which employment elasticity is measured.
    #[serde(default = "default_elasticity_periods")]
    pub elasticity_periods: Vec<Period>,

    /// Periods of the summary statistics table.
    #[serde(default = "default_summary_periods")]
    pub summary_periods: Vec<Period>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            trend_indicator: default_trend_indicator(),
            forecast_year: default_forecast_year(),
            break_indicator: default_break_indicator(),
            break_year: default_break_year(),
            correlation_indicators: default_correlation_indicators(),
            regression_target: default_regression_target(),
            regression_features: default_regression_features(),
            summary_indicators: default_summary_indicators(),
            elasticity_periods: default_elasticity_periods(),
            summary_periods: default_summary_periods(),
        }
    }
}

fn default_trend_indicator() -> Indicator {
    Indicator::Top1Percent
}

fn default_forecast_year() -> i32 {
    2025
}

fn default_break_indicator() -> Indicator {
    Indicator::FormalEmployment
}

fn default_break_year() -> i32 {
    2016
}

fn default_correlation_indicators() -> Vec<Indicator> {
    SUMMARY_INDICATORS.to_vec()
}

fn default_regression_target() -> Indicator {
    Indicator::Top1Percent
}

fn default_regression_features() -> Vec<Indicator> {
    vec![
        Indicator::GdpGrowth,
        Indicator::FormalEmployment,
        Indicator::PressFreedomRank,
        Indicator::Fci,
    ]
}

fn default_summary_indicators() -> Vec<Indicator> {
    SUMMARY_INDICATORS.to_vec()
}

fn default_elasticity_periods() -> Vec<Period> {
    vec![Period::new(2011, 2016), Period::new(2017, 2023)]
}

fn default_summary_periods() -> Vec<Period> {
    vec![Period::new(2014, 2019), Period::new(2020, 2025)]
}

/// Chart rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Render PNG charts.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Width of the line charts in pixels.
    #[serde(default = "default_width")]
    pub width: u32,

    /// Height of the line charts in pixels.
    #[serde(default = "default_height")]
    pub height: u32,

    /// TrueType font used for titles and labels.
    #[serde(default = "default_font_path")]
    pub font_path: PathBuf,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            width: default_width(),
            height: default_height(),
            font_path: default_font_path(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_width() -> u32 {
    1200
}

fn default_height() -> u32 {
    600
}

fn default_font_path() -> PathBuf {
    PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf")
}

/// A filtered extract of the dataset written to its own CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetExport {
    /// File name, relative to the output directory.
    pub file: String,
    pub indicators: Vec<Indicator>,
    pub from: i32,
    pub to: i32,
}

impl DatasetExport {
    fn new(file: &str, indicators: &[Indicator]) -> Self {
        Self {
            file: file.to_string(),
            indicators: indicators.to_vec(),
            from: 2014,
            to: 2025,
        }
    }
}

/// Export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// File name of the JSON document.
    #[serde(default = "default_json_file")]
    pub json_file: String,

    /// Filtered dataset extracts.
    #[serde(default = "default_datasets")]
    pub datasets: Vec<DatasetExport>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            json_file: default_json_file(),
            datasets: default_datasets(),
        }
    }
}

fn default_json_file() -> String {
    "data.json".to_string()
}

fn default_datasets() -> Vec<DatasetExport> {
    vec![
        DatasetExport::new(
            "employment_analysis.csv",
            &[
                Indicator::Employment,
                Indicator::FormalEmployment,
                Indicator::Unemployment,
                Indicator::YouthUnemployment,
                Indicator::ManufacturingJobs,
            ],
        ),
        DatasetExport::new(
            "inequality_analysis.csv",
            &[
                Indicator::Top1Percent,
                Indicator::Top10Percent,
                Indicator::Bottom50Percent,
                Indicator::GiniCoefficient,
            ],
        ),
        DatasetExport::new(
            "fiscal_federalism.csv",
            &[
                Indicator::CessPercentage,
                Indicator::ActualDevolution,
                Indicator::PromisedDevolution,
                Indicator::StateBorrowing,
                Indicator::CentralSpending,
            ],
        ),
        DatasetExport::new(
            "democratic_indicators.csv",
            &[
                Indicator::PressFreedomRank,
                Indicator::VdemLiberalDemocracy,
                Indicator::FreedomHouseScore,
                Indicator::InternetShutdowns,
            ],
        ),
    ]
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings. Only values
    /// given explicitly on the command line override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data) = args.data {
            self.data.path = data.clone();
        }
        if let Some(ref output_dir) = args.output_dir {
            self.general.output_dir = output_dir.clone();
        }
        if let Some(ref title) = args.title {
            self.data.title = title.clone();
        }
        if let Some(year) = args.forecast_year {
            self.analysis.forecast_year = year;
        }

        // Flags always override
        if args.no_charts {
            self.charts.enabled = false;
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
