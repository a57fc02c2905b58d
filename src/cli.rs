//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// econ-replicate - replication pipeline for India's economic indicators
///
/// Loads the yearly master dataset, computes employment elasticity,
/// inequality and the three composite indices (SSI, FCI, DQI), runs the
/// statistical tests and writes charts, CSV extracts and a JSON document.
///
/// Examples:
///   econ-replicate
///   econ-replicate --data data/SP_masterdataset.csv --output-dir out
///   econ-replicate --no-charts --forecast-year 2030
///   econ-replicate --gini 40,30,20,10
///   econ-replicate --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to the master dataset CSV
    ///
    /// Defaults to data/SP_masterdataset.csv or the [data] path in .replicate.toml.
    #[arg(short, long, value_name = "FILE", env = "REPLICATE_DATA")]
    pub data: Option<PathBuf>,

    /// Directory to write charts and exports to
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .replicate.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Skip PNG chart rendering
    #[arg(long)]
    pub no_charts: bool,

    /// Year the inequality trend is extrapolated to
    #[arg(long, value_name = "YEAR")]
    pub forecast_year: Option<i32>,

    /// Title written into the JSON metadata
    #[arg(long, value_name = "TEXT")]
    pub title: Option<String>,

    /// Compute the Gini coefficient of comma-separated shares and exit
    ///
    /// Example: --gini 40,30,20,10
    #[arg(long, value_name = "SHARES", value_delimiter = ',', allow_hyphen_values = true)]
    pub gini: Option<Vec<f64>>,

    /// Generate a default .replicate.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref shares) = self.gini {
            if shares.is_empty() {
                return Err("--gini needs at least one share".to_string());
            }
            if shares.iter().any(|s| !s.is_finite() || *s < 0.0) {
                return Err("Gini shares must be finite and non-negative".to_string());
            }
            return Ok(());
        }

        // Validate data file if given explicitly
        if let Some(ref data) = self.data {
            if !data.exists() {
                return Err(format!("Data file does not exist: {}", data.display()));
            }
            if !data.is_file() {
                return Err(format!("Data path is not a file: {}", data.display()));
            }
        }

        // Validate output directory if it already exists
        if let Some(ref dir) = self.output_dir {
            if dir.exists() && !dir.is_dir() {
                return Err(format!(
                    "Output path is not a directory: {}",
                    dir.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings. `config_verbose`
    /// is `general.verbose` from the config file; `--quiet` wins over it.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn make_args() -> Args {
        Args {
            data: None,
            output_dir: None,
            config: None,
            verbose: false,
            quiet: false,
            no_charts: false,
            forecast_year: None,
            title: None,
            gini: None,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::parse_from([
            "econ-replicate",
            "--output-dir",
            "out",
            "--no-charts",
            "--forecast-year",
            "2030",
        ]);
        assert_eq!(args.output_dir, Some(PathBuf::from("out")));
        assert!(args.no_charts);
        assert_eq!(args.forecast_year, Some(2030));
        assert!(args.gini.is_none());
    }

    #[test]
    fn test_parse_gini_shares() {
        let args = Args::parse_from(["econ-replicate", "--gini", "40,30,20,10"]);
        assert_eq!(args.gini, Some(vec![40.0, 30.0, 20.0, 10.0]));
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_negative_share() {
        let mut args = make_args();
        args.gini = Some(vec![1.0, -2.0]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_data_file() {
        let mut args = make_args();
        args.data = Some(PathBuf::from("/nonexistent/SP_masterdataset.csv"));
        assert!(args.validate().is_err());

        // --init-config does not need a dataset
        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_fixture_data_file() {
        let mut args = make_args();
        args.data = Some(
            PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/sp_masterdataset.csv"),
        );
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(false), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(false), tracing::Level::ERROR);
    }

    #[test]
    fn test_log_level_from_config() {
        let mut args = make_args();
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.quiet = true;
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }
}
