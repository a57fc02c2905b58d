//! CSV and JSON export.
//!
//! This module writes the period summary, the index table, the filtered
//! dataset extracts and the JSON document consumed by the web front-end.

use crate::config::{Config, DatasetExport};
use crate::dataset::Dataset;
use crate::models::{Indicator, Observation, PeriodSummary};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const SUMMARY_FILE: &str = "summary_statistics.csv";
pub const INDICES_FILE: &str = "three_indices.csv";

/// Format a value for CSV. Rust's `Display` for `f64` is the shortest
/// representation that parses back to the same bits; NaN becomes an empty cell.
fn format_value(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

fn optional(value: f64) -> Option<f64> {
    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}

/// Write the per-period means, one row per period.
pub fn write_summary_csv(path: &Path, summaries: &[PeriodSummary]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let mut header = vec!["period".to_string()];
    if let Some(first) = summaries.first() {
        header.extend(first.means.iter().map(|(ind, _)| ind.column().to_string()));
    }
    writer.write_record(&header)?;

    for summary in summaries {
        let mut record = vec![summary.label.clone()];
        record.extend(summary.means.iter().map(|(_, v)| format_value(*v)));
        writer.write_record(&record)?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Write `year,ssi,fci,dqi` for every observation.
pub fn write_indices_csv(path: &Path, dataset: &Dataset) -> Result<()> {
    write_columns(
        path,
        dataset.observations().iter(),
        &Indicator::DERIVED,
    )
}

/// Write one configured extract: `year` plus the chosen indicators over a
/// year range.
pub fn write_filtered_dataset(path: &Path, dataset: &Dataset, export: &DatasetExport) -> Result<()> {
    let rows = dataset.filter_years(export.from..=export.to);
    debug!(
        "{}: {} rows, {} indicators",
        export.file,
        rows.len(),
        export.indicators.len()
    );
    write_columns(path, rows.into_iter(), &export.indicators)
}

fn write_columns<'a>(
    path: &Path,
    rows: impl Iterator<Item = &'a Observation>,
    indicators: &[Indicator],
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let mut header = vec!["year"];
    header.extend(indicators.iter().map(|ind| ind.column()));
    writer.write_record(&header)?;

    for obs in rows {
        let mut record = vec![obs.year.to_string()];
        record.extend(indicators.iter().map(|ind| format_value(obs.value(*ind))));
        writer.write_record(&record)?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// JSON document for the web front-end.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataDocument {
    pub metadata: DocumentMetadata,
    pub time_series: TimeSeries,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub title: String,
    pub last_updated: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeries {
    pub years: Vec<i32>,
    pub gdp_growth: Vec<Option<f64>>,
    pub unemployment: UnemploymentSeries,
    pub inequality: InequalitySeries,
    pub employment: EmploymentSeries,
    pub democratic_indicators: DemocraticSeries,
    pub indices: IndexSeries,
}

#[derive(Debug, Serialize)]
pub struct UnemploymentSeries {
    pub overall: Vec<Option<f64>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InequalitySeries {
    pub top1_percent: Vec<Option<f64>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmploymentSeries {
    pub formal_sector: Vec<Option<f64>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemocraticSeries {
    pub press_freedom_rank: Vec<Option<f64>>,
}

#[derive(Debug, Serialize)]
pub struct IndexSeries {
    pub ssi: Vec<Option<f64>>,
    pub fci: Vec<Option<f64>>,
    pub dqi: Vec<Option<f64>>,
}

impl DataDocument {
    /// Build the document from a dataset whose indices have been computed.
    pub fn from_dataset(dataset: &Dataset, title: &str, last_updated: NaiveDate) -> Self {
        let series = |ind: Indicator| -> Vec<Option<f64>> {
            dataset.column(ind).into_iter().map(optional).collect()
        };

        Self {
            metadata: DocumentMetadata {
                title: title.to_string(),
                last_updated: last_updated.format("%Y-%m-%d").to_string(),
            },
            time_series: TimeSeries {
                years: dataset.years(),
                gdp_growth: series(Indicator::GdpGrowth),
                unemployment: UnemploymentSeries {
                    overall: series(Indicator::Unemployment),
                },
                inequality: InequalitySeries {
                    top1_percent: series(Indicator::Top1Percent),
                },
                employment: EmploymentSeries {
                    formal_sector: series(Indicator::FormalEmployment),
                },
                democratic_indicators: DemocraticSeries {
                    press_freedom_rank: series(Indicator::PressFreedomRank),
                },
                indices: IndexSeries {
                    ssi: series(Indicator::Ssi),
                    fci: series(Indicator::Fci),
                    dqi: series(Indicator::Dqi),
                },
            },
        }
    }
}

/// Write the JSON document, pretty-printed.
pub fn write_json(path: &Path, document: &DataDocument) -> Result<()> {
    let json = serde_json::to_string_pretty(document).context("Failed to serialize JSON document")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Every artifact written by `export_all`, in write order.
#[derive(Debug, Default)]
pub struct ExportSummary {
    pub files: Vec<PathBuf>,
}

/// Write every CSV and the JSON document into the configured output directory.
pub fn export_all(
    dataset: &Dataset,
    summaries: &[PeriodSummary],
    config: &Config,
    last_updated: NaiveDate,
    show_progress: bool,
) -> Result<ExportSummary> {
    let out_dir = &config.general.output_dir;
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

    let total = 3 + config.export.datasets.len() as u64;
    let progress_bar = if show_progress {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut summary = ExportSummary::default();
    let mut record = |path: PathBuf, pb: &ProgressBar| {
        debug!("Wrote {}", path.display());
        pb.inc(1);
        summary.files.push(path);
    };

    let path = out_dir.join(SUMMARY_FILE);
    progress_bar.set_message(SUMMARY_FILE);
    write_summary_csv(&path, summaries)?;
    record(path, &progress_bar);

    let path = out_dir.join(INDICES_FILE);
    progress_bar.set_message(INDICES_FILE);
    write_indices_csv(&path, dataset)?;
    record(path, &progress_bar);

    for export in &config.export.datasets {
        let path = out_dir.join(&export.file);
        progress_bar.set_message(export.file.clone());
        write_filtered_dataset(&path, dataset, export)?;
        record(path, &progress_bar);
    }

    let path = out_dir.join(&config.export.json_file);
    progress_bar.set_message(config.export.json_file.clone());
    let document = DataDocument::from_dataset(dataset, &config.data.title, last_updated);
    write_json(&path, &document)?;
    record(path, &progress_bar);

    progress_bar.finish_and_clear();
    info!(
        "Exported {} files to {}",
        summary.files.len(),
        out_dir.display()
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{compute_indices, summarize_periods, SUMMARY_INDICATORS};
    use crate::models::Period;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn fixture() -> Dataset {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/sp_masterdataset.csv");
        let mut dataset = Dataset::load(&path).unwrap();
        compute_indices(&mut dataset);
        dataset
    }

    fn parse_cell(cell: &str) -> f64 {
        if cell.is_empty() {
            f64::NAN
        } else {
            cell.parse().unwrap()
        }
    }

    fn same(a: f64, b: f64) -> bool {
        (a.is_nan() && b.is_nan()) || a == b
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(0.1), "0.1");
        assert_eq!(format_value(2.0), "2");
        assert_eq!(format_value(f64::NAN), "");
    }

    #[test]
    fn test_indices_csv_reads_back_exactly() {
        let dataset = fixture();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(INDICES_FILE);
        write_indices_csv(&path, &dataset).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(
            reader.headers().unwrap().iter().collect::<Vec<_>>(),
            vec!["year", "ssi", "fci", "dqi"]
        );

        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), dataset.len());

        for (record, obs) in records.iter().zip(dataset.observations()) {
            assert_eq!(record[0].parse::<i32>().unwrap(), obs.year);
            assert!(same(parse_cell(&record[1]), obs.ssi));
            assert!(same(parse_cell(&record[2]), obs.fci));
            assert!(same(parse_cell(&record[3]), obs.dqi));
        }
    }

    #[test]
    fn test_filtered_dataset_range_and_columns() {
        let dataset = fixture();
        let dir = TempDir::new().unwrap();
        let export = DatasetExport {
            file: "inequality_analysis.csv".to_string(),
            indicators: vec![Indicator::Top1Percent, Indicator::GiniCoefficient],
            from: 2014,
            to: 2025,
        };
        let path = dir.path().join(&export.file);
        write_filtered_dataset(&path, &dataset, &export).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "year,top1_percent,gini_coefficient");
        assert_eq!(lines.len(), 1 + 12);
        assert!(lines[1].starts_with("2014,"));
        // 2025 has no Gini value in the fixture
        assert!(lines[12].starts_with("2025,"));
        assert!(lines[12].ends_with(','));
    }

    #[test]
    fn test_summary_csv_layout() {
        let dataset = fixture();
        let periods = vec![Period::new(2014, 2019), Period::new(2020, 2025)];
        let summaries = summarize_periods(&dataset, &periods, &SUMMARY_INDICATORS);

        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SUMMARY_FILE);
        write_summary_csv(&path, &summaries).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            "period,gdp_growth,unemployment,top1_percent,formal_employment,press_freedom_rank"
        );
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("2014-2019,"));
        assert!(lines[2].starts_with("2020-2025,"));
    }

    #[test]
    fn test_json_document_schema() {
        let dataset = fixture();
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let document = DataDocument::from_dataset(&dataset, "Test title", date);

        let value = serde_json::to_value(&document).unwrap();
        assert_eq!(value["metadata"]["title"], "Test title");
        assert_eq!(value["metadata"]["lastUpdated"], "2025-03-01");

        let ts = &value["timeSeries"];
        assert_eq!(ts["years"].as_array().unwrap().len(), dataset.len());
        assert_eq!(ts["gdpGrowth"].as_array().unwrap().len(), dataset.len());
        assert!(ts["unemployment"]["overall"].is_array());
        assert!(ts["inequality"]["top1Percent"].is_array());
        assert!(ts["employment"]["formalSector"].is_array());
        assert!(ts["democraticIndicators"]["pressFreedomRank"].is_array());
        for key in ["ssi", "fci", "dqi"] {
            assert_eq!(ts["indices"][key].as_array().unwrap().len(), dataset.len());
        }
    }

    #[test]
    fn test_json_nan_is_null() {
        let mut obs = Observation::empty(2020);
        obs.gdp_growth = 1.5;
        let dataset = Dataset::from_observations(vec![obs]).unwrap();
        let document =
            DataDocument::from_dataset(&dataset, "t", NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());

        let value = serde_json::to_value(&document).unwrap();
        assert_eq!(value["timeSeries"]["gdpGrowth"][0], 1.5);
        assert!(value["timeSeries"]["unemployment"]["overall"][0].is_null());
    }

    #[test]
    fn test_export_all_writes_every_file() {
        let dataset = fixture();
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.general.output_dir = dir.path().join("out");

        let summaries = summarize_periods(
            &dataset,
            &config.analysis.summary_periods,
            &config.analysis.summary_indicators,
        );
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let summary = export_all(&dataset, &summaries, &config, date, false).unwrap();

        assert_eq!(summary.files.len(), 7);
        for file in &summary.files {
            assert!(file.exists(), "{} missing", file.display());
        }
        assert!(config.general.output_dir.join("data.json").exists());
        assert!(config
            .general
            .output_dir
            .join("democratic_indicators.csv")
            .exists());
    }
}
