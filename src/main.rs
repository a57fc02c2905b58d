//! econ-replicate - replication pipeline for India's economic indicators
//!
//! Loads the yearly master dataset, derives employment elasticity,
//! inequality and the three composite indices, runs the statistical
//! checks and writes charts plus CSV/JSON exports.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad arguments, unreadable data or config, failed export)

mod analysis;
mod cli;
mod config;
mod dataset;
mod error;
mod models;
mod report;

use analysis::statistics::{correlation_matrix, multiple_regression, structural_break};
use analysis::{compute_indices, employment_elasticity, summarize_periods, LinearTrend};
use anyhow::{Context, Result};
use chrono::Local;
use cli::Args;
use config::{Config, DEFAULT_CONFIG_FILE};
use dataset::Dataset;
use models::{Elasticity, PeriodSummary};
use report::ChartRenderer;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // --gini is a standalone calculation
    if let Some(ref shares) = args.gini {
        handle_gini(shares);
        return Ok(());
    }

    // The config decides the log level, so it is read before logging starts
    // and its origin is reported once the subscriber is up.
    let (mut config, origin) = load_config(&args)?;
    config.merge_with_args(&args);

    init_logging(args.log_level(config.general.verbose));

    info!("econ-replicate v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    origin.log();

    match run_pipeline(&args, config) {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Pipeline failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .replicate.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to change periods, indicators, charts and exports.");
    Ok(())
}

/// Handle --gini: print the coefficient of the given shares.
fn handle_gini(shares: &[f64]) {
    match analysis::gini(shares) {
        Some(value) => println!("Gini coefficient: {:.4}", value),
        None => {
            eprintln!("Error: Gini coefficient is undefined when every share is zero");
            std::process::exit(1);
        }
    }
}

/// Initialize logging. `RUST_LOG` overrides the level from flags and config.
fn init_logging(level: tracing::Level) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Where the configuration came from.
enum ConfigOrigin {
    Explicit(PathBuf),
    DefaultFile,
    Builtin,
    /// The default file exists but could not be parsed.
    Invalid(anyhow::Error),
}

impl ConfigOrigin {
    fn log(&self) {
        match self {
            ConfigOrigin::Explicit(path) => info!("Loaded config from: {}", path.display()),
            ConfigOrigin::DefaultFile => info!("Loaded default config from {}", DEFAULT_CONFIG_FILE),
            ConfigOrigin::Builtin => debug!("No config file found, using defaults"),
            ConfigOrigin::Invalid(e) => warn!("Failed to load config, using defaults: {:#}", e),
        }
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigOrigin)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigOrigin::Explicit(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigOrigin::DefaultFile)),
        Ok(None) => Ok((Config::default(), ConfigOrigin::Builtin)),
        Err(e) => Ok((Config::default(), ConfigOrigin::Invalid(e))),
    }
}

/// Run the complete pipeline: load, analyse, chart, export.
fn run_pipeline(args: &Args, config: Config) -> Result<()> {
    let start_time = Instant::now();

    // Step 1: Load the dataset
    println!("📥 Loading dataset: {}", config.data.path.display());
    let mut dataset = Dataset::load(&config.data.path)
        .with_context(|| format!("Failed to load {}", config.data.path.display()))?;
    dataset.log_profile();

    // Step 2: Headline indicators
    println!("\n📈 Employment elasticity:");
    let elasticities = compute_elasticities(&dataset, &config);

    // Step 3: Composite indices
    compute_indices(&mut dataset);
    println!("\n🧮 Computed SSI, FCI and DQI for {} years", dataset.len());

    // Step 4: Statistics
    run_statistics(&dataset, &config);

    let summaries = summarize_periods(
        &dataset,
        &config.analysis.summary_periods,
        &config.analysis.summary_indicators,
    );
    print_summaries(&summaries);

    // Step 5: Charts
    let out_dir = config.general.output_dir.clone();
    let mut chart_files = Vec::new();
    if config.charts.enabled {
        println!("\n🎨 Rendering charts...");
        let renderer = ChartRenderer::new(&config.charts);
        chart_files = renderer
            .render_all(&dataset, &elasticities, &out_dir)
            .context("Failed to render charts")?;
    } else {
        info!("Chart rendering disabled");
    }

    // Step 6: Exports
    println!("\n📝 Exporting data...");
    let exported = report::export_all(
        &dataset,
        &summaries,
        &config,
        Local::now().date_naive(),
        !args.quiet,
    )?;

    let duration = start_time.elapsed().as_secs_f64();
    println!("\n📊 Files written to {}:", out_dir.display());
    for path in chart_files.iter().chain(&exported.files) {
        if let Some(name) = path.file_name() {
            println!("   - {}", name.to_string_lossy());
        }
    }
    println!("   Duration: {:.1}s", duration);
    println!("\n✅ Replication complete!");

    Ok(())
}

/// Elasticity for each configured period. A period whose endpoint year is
/// missing is logged and skipped.
fn compute_elasticities(dataset: &Dataset, config: &Config) -> Vec<Elasticity> {
    let mut elasticities = Vec::new();
    for period in &config.analysis.elasticity_periods {
        match employment_elasticity(dataset, period.from, period.to) {
            Ok(e) => {
                if e.value == 0.0 {
                    debug!("{}: GDP did not grow, elasticity reported as 0", e.label());
                }
                println!("   {}: {:.2}", e.label(), e.value);
                elasticities.push(e);
            }
            Err(e) => warn!("Skipping elasticity for {}: {}", period.label, e),
        }
    }
    elasticities
}

/// Trend forecast, correlation matrix, structural break and regression.
/// Each step warns and moves on when the data cannot support it.
fn run_statistics(dataset: &Dataset, config: &Config) {
    let analysis = &config.analysis;

    println!("\n🔬 Statistical analysis:");
    match LinearTrend::fit_indicator(dataset, analysis.trend_indicator) {
        Ok(trend) => {
            println!(
                "   {} trend: slope {:.2}/year, R² {:.3}",
                analysis.trend_indicator,
                trend.slope,
                trend.r_squared
            );
            println!(
                "   Forecast for {}: {:.1}",
                analysis.forecast_year,
                trend.predict(analysis.forecast_year as f64)
            );
        }
        Err(e) => warn!("Skipping trend for {}: {}", analysis.trend_indicator, e),
    }

    let matrix = correlation_matrix(dataset, &analysis.correlation_indicators);
    println!("\n   Correlation matrix:");
    for line in matrix.to_table().lines() {
        println!("   {}", line);
    }

    match structural_break(dataset, analysis.break_indicator, analysis.break_year) {
        Ok(result) => println!(
            "\n   Structural break in {} after {}: t = {:.3}, p = {:.4}",
            analysis.break_indicator, analysis.break_year, result.t_statistic, result.p_value
        ),
        Err(e) => warn!("Skipping structural break test: {}", e),
    }

    match multiple_regression(
        dataset,
        analysis.regression_target,
        &analysis.regression_features,
    ) {
        Ok(result) => {
            println!(
                "\n   Regression of {} (n = {}): R² = {:.3}",
                result.target, result.n, result.r_squared
            );
            for (feature, coefficient) in &result.coefficients {
                println!("     {:<24} {:>8.3}", feature.column(), coefficient);
            }
        }
        Err(e) => warn!("Skipping regression: {}", e),
    }
}

fn print_summaries(summaries: &[PeriodSummary]) {
    println!("\n📋 Period summary:");
    for summary in summaries {
        let means: Vec<String> = summary
            .means
            .iter()
            .map(|(indicator, mean)| format!("{}={:.2}", indicator, mean))
            .collect();
        println!("   {}: {}", summary.label, means.join(", "));
    }
}
