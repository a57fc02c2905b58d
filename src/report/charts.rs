//! PNG chart rendering.
//!
//! Charts are drawn with the plotters bitmap backend. Text needs a TrueType
//! font registered at runtime; without one the charts are drawn bare, with
//! no captions, tick labels or legends.

use crate::config::ChartConfig;
use crate::dataset::Dataset;
use crate::error::{DataError, DataResult};
use crate::models::{Elasticity, Indicator};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Family name the configured font is registered under.
const FONT: &str = "sans-serif";

pub const KEY_INDICATORS_FILE: &str = "key_indicators.png";
pub const INDICES_FILE: &str = "three_indices.png";
pub const ELASTICITY_FILE: &str = "employment_elasticity.png";

const KEY_SERIES: [(Indicator, &str, RGBColor); 3] = [
    (Indicator::GdpGrowth, "GDP Growth (%)", BLUE),
    (Indicator::Unemployment, "Unemployment (%)", RED),
    (Indicator::Top1Percent, "Top 1% Income Share (%)", GREEN),
];

const INDEX_PANELS: [(Indicator, &str, RGBColor); 3] = [
    (Indicator::Ssi, "Statistical Suppression Index", RED),
    (Indicator::Fci, "Fiscal Centralization Index", BLUE),
    (Indicator::Dqi, "Democratic Quality Index", GREEN),
];

fn render_err<E: std::fmt::Display>(e: E) -> DataError {
    DataError::Render(e.to_string())
}

/// Read a TrueType font and register it for chart text.
///
/// The font bytes are leaked: plotters keeps a `'static` reference for the
/// rest of the process.
fn load_font(path: &Path) -> bool {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(
                "Cannot read chart font {}: {}. Charts will have no text.",
                path.display(),
                e
            );
            return false;
        }
    };

    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    match register_font(FONT, FontStyle::Normal, bytes) {
        Ok(()) => {
            debug!("Registered chart font {}", path.display());
            true
        }
        Err(_) => {
            warn!(
                "{} is not a usable TrueType font. Charts will have no text.",
                path.display()
            );
            false
        }
    }
}

/// `[min, max]` of the finite values padded by 10% on each side, optionally
/// stretched to include zero.
fn padded_range(values: impl Iterator<Item = f64>, include_zero: bool) -> Range<f64> {
    let (mut lo, mut hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if lo > hi {
        return 0.0..1.0;
    }
    if include_zero {
        lo = lo.min(0.0);
        hi = hi.max(0.0);
    }
    if lo == hi {
        return (lo - 1.0)..(hi + 1.0);
    }

    let pad = (hi - lo) * 0.1;
    let lo = if include_zero && lo == 0.0 { 0.0 } else { lo - pad };
    lo..(hi + pad)
}

fn year_range(dataset: &Dataset) -> Range<i32> {
    match dataset.year_span() {
        Some((first, last)) if first < last => first..last,
        Some((year, _)) => (year - 1)..(year + 1),
        None => 0..1,
    }
}

/// Renders the three report charts at a fixed size.
#[derive(Debug, Clone)]
pub struct ChartRenderer {
    width: u32,
    height: u32,
    text: bool,
}

impl ChartRenderer {
    /// Build a renderer from config, registering the configured font.
    pub fn new(config: &ChartConfig) -> Self {
        let mut renderer = Self::without_text(config.width, config.height);
        renderer.text = load_font(&config.font_path);
        renderer
    }

    /// A renderer that never draws text.
    pub fn without_text(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            text: false,
        }
    }

    /// Render every chart into `out_dir`, returning the written paths.
    pub fn render_all(
        &self,
        dataset: &Dataset,
        elasticities: &[Elasticity],
        out_dir: &Path,
    ) -> DataResult<Vec<PathBuf>> {
        let mut written = Vec::new();
        if dataset.is_empty() {
            warn!("Dataset is empty, no charts rendered");
            return Ok(written);
        }
        std::fs::create_dir_all(out_dir)?;

        let path = out_dir.join(KEY_INDICATORS_FILE);
        self.key_indicators(dataset, &path)?;
        written.push(path);

        let path = out_dir.join(INDICES_FILE);
        self.three_indices(dataset, &path)?;
        written.push(path);

        let bars: Vec<Elasticity> = elasticities
            .iter()
            .filter(|e| e.value.is_finite())
            .cloned()
            .collect();
        if bars.len() < elasticities.len() {
            warn!(
                "Dropping {} undefined elasticity value(s) from {}",
                elasticities.len() - bars.len(),
                ELASTICITY_FILE
            );
        }
        if bars.is_empty() {
            warn!("No elasticity values, skipping {}", ELASTICITY_FILE);
        } else {
            let path = out_dir.join(ELASTICITY_FILE);
            self.elasticity(&bars, &path)?;
            written.push(path);
        }

        info!("Rendered {} charts", written.len());
        Ok(written)
    }

    /// GDP growth, unemployment and the top-1% share against year.
    pub fn key_indicators(&self, dataset: &Dataset, path: &Path) -> DataResult<()> {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let series: Vec<(Vec<(i32, f64)>, &str, RGBColor)> = KEY_SERIES
            .iter()
            .map(|&(ind, label, color)| (dataset.series(ind), label, color))
            .collect();
        let y_range = padded_range(
            series.iter().flat_map(|(points, _, _)| points.iter().map(|p| p.1)),
            true,
        );

        let mut builder = ChartBuilder::on(&root);
        builder.margin(20);
        if self.text {
            builder
                .caption("Key Economic Indicators of India", (FONT, 28))
                .x_label_area_size(40)
                .y_label_area_size(60);
        }
        let mut chart = builder
            .build_cartesian_2d(year_range(dataset), y_range)
            .map_err(render_err)?;

        // Without label areas the mesh draws grid lines only, no tick text.
        let mut mesh = chart.configure_mesh();
        if self.text {
            mesh.x_desc("Year")
                .y_desc("Percentage (%)")
                .label_style((FONT, 14));
        }
        mesh.draw().map_err(render_err)?;

        for (points, label, color) in &series {
            let color = *color;
            chart
                .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))
                .map_err(render_err)?
                .label(*label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
            chart
                .draw_series(
                    points
                        .iter()
                        .map(|&point| Circle::new(point, 4, color.filled())),
                )
                .map_err(render_err)?;
        }

        if self.text {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperLeft)
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .label_font((FONT, 14))
                .draw()
                .map_err(render_err)?;
        }

        root.present().map_err(render_err)?;
        debug!("Wrote {}", path.display());
        Ok(())
    }

    /// SSI, FCI and DQI side by side, each as a line over a shaded area.
    pub fn three_indices(&self, dataset: &Dataset, path: &Path) -> DataResult<()> {
        let root = BitMapBackend::new(path, (self.width * 3 / 2, self.height * 2 / 3))
            .into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let root = if self.text {
            root.titled("Three Composite Indices: Measuring Democratic Decline", (FONT, 26))
                .map_err(render_err)?
        } else {
            root
        };

        let panels = root.split_evenly((1, 3));
        for (panel, &(indicator, title, color)) in panels.iter().zip(INDEX_PANELS.iter()) {
            self.index_panel(panel, dataset, indicator, title, color)?;
        }

        root.present().map_err(render_err)?;
        debug!("Wrote {}", path.display());
        Ok(())
    }

    fn index_panel(
        &self,
        area: &DrawingArea<BitMapBackend<'_>, Shift>,
        dataset: &Dataset,
        indicator: Indicator,
        title: &str,
        color: RGBColor,
    ) -> DataResult<()> {
        let points = dataset.series(indicator);
        let y_range = padded_range(points.iter().map(|p| p.1), true);

        let mut builder = ChartBuilder::on(area);
        builder.margin(15);
        if self.text {
            builder
                .caption(title, (FONT, 18))
                .x_label_area_size(30)
                .y_label_area_size(45);
        }
        let mut chart = builder
            .build_cartesian_2d(year_range(dataset), y_range)
            .map_err(render_err)?;

        let mut mesh = chart.configure_mesh();
        if self.text {
            mesh.x_desc("Year")
                .x_labels(6)
                .label_style((FONT, 12));
        }
        mesh.draw().map_err(render_err)?;

        chart
            .draw_series(
                AreaSeries::new(points.iter().copied(), 0.0, &color.mix(0.3))
                    .border_style(color.stroke_width(2)),
            )
            .map_err(render_err)?;
        chart
            .draw_series(points.iter().map(|&point| Circle::new(point, 4, color.filled())))
            .map_err(render_err)?;

        Ok(())
    }

    /// One bar per elasticity period, labelled with its value.
    pub fn elasticity(&self, elasticities: &[Elasticity], path: &Path) -> DataResult<()> {
        let root = BitMapBackend::new(path, (self.width * 2 / 3, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let labels: Vec<String> = elasticities.iter().map(Elasticity::label).collect();
        let y_range = padded_range(elasticities.iter().map(|e| e.value), true);
        let count = elasticities.len() as i32;

        let mut builder = ChartBuilder::on(&root);
        builder.margin(20);
        if self.text {
            builder
                .caption("Employment Elasticity of Growth", (FONT, 26))
                .x_label_area_size(40)
                .y_label_area_size(60);
        }
        let mut chart = builder
            .build_cartesian_2d((0..count).into_segmented(), y_range)
            .map_err(render_err)?;

        let format_label = |value: &SegmentValue<i32>| match value {
            SegmentValue::CenterOf(idx) => labels.get(*idx as usize).cloned().unwrap_or_default(),
            _ => String::new(),
        };

        let mut mesh = chart.configure_mesh();
        mesh.disable_x_mesh();
        if self.text {
            mesh.x_labels(labels.len())
                .x_label_formatter(&format_label)
                .x_desc("Period")
                .y_desc("Elasticity")
                .label_style((FONT, 14));
        }
        mesh.draw().map_err(render_err)?;

        chart
            .draw_series(
                Histogram::vertical(&chart)
                    .style_func(|_, value: &f64| {
                        if *value >= 0.0 {
                            BLUE.mix(0.7).filled()
                        } else {
                            RED.mix(0.7).filled()
                        }
                    })
                    .margin(40)
                    .data(
                        elasticities
                            .iter()
                            .enumerate()
                            .map(|(idx, e)| (idx as i32, e.value)),
                    ),
            )
            .map_err(render_err)?;

        if self.text {
            chart
                .draw_series(elasticities.iter().enumerate().map(|(idx, e)| {
                    Text::new(
                        format!("{:.2}", e.value),
                        (SegmentValue::CenterOf(idx as i32), e.value),
                        (FONT, 16).into_font(),
                    )
                }))
                .map_err(render_err)?;
        }

        root.present().map_err(render_err)?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::compute_indices;
    use crate::models::Observation;
    use tempfile::TempDir;

    fn fixture() -> Dataset {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/sp_masterdataset.csv");
        let mut dataset = Dataset::load(&path).unwrap();
        compute_indices(&mut dataset);
        dataset
    }

    fn non_empty(path: &Path) -> bool {
        std::fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false)
    }

    #[test]
    fn test_padded_range() {
        let range = padded_range([1.0, 3.0].into_iter(), false);
        assert!((range.start - 0.8).abs() < 1e-12);
        assert!((range.end - 3.2).abs() < 1e-12);

        let range = padded_range([2.0, 4.0].into_iter(), true);
        assert_eq!(range.start, 0.0);

        let range = padded_range([f64::NAN].into_iter(), false);
        assert_eq!(range, 0.0..1.0);

        let range = padded_range([5.0, 5.0].into_iter(), false);
        assert_eq!(range, 4.0..6.0);
    }

    #[test]
    fn test_missing_font_disables_text() {
        let config = ChartConfig {
            font_path: PathBuf::from("/nonexistent/font.ttf"),
            ..ChartConfig::default()
        };
        let renderer = ChartRenderer::new(&config);
        assert!(!renderer.text);

        // A missing font still yields every chart, just without text
        let dataset = fixture();
        let elasticities = vec![Elasticity {
            start_year: 2011,
            end_year: 2016,
            value: 0.3,
        }];
        let dir = TempDir::new().unwrap();
        let written = renderer
            .render_all(&dataset, &elasticities, dir.path())
            .unwrap();
        assert_eq!(written.len(), 3);
        assert!(written.iter().all(|p| non_empty(p)));
    }

    #[test]
    fn test_render_all_without_text() {
        let dataset = fixture();
        let elasticities = vec![
            Elasticity {
                start_year: 2011,
                end_year: 2016,
                value: 0.25,
            },
            Elasticity {
                start_year: 2017,
                end_year: 2023,
                value: -0.1,
            },
        ];
        let dir = TempDir::new().unwrap();
        let renderer = ChartRenderer::without_text(300, 200);

        let written = renderer
            .render_all(&dataset, &elasticities, dir.path())
            .unwrap();
        assert_eq!(written.len(), 3);
        for path in &written {
            assert!(non_empty(path), "{} is empty", path.display());
        }
    }

    #[test]
    fn test_render_skips_elasticity_when_empty() {
        let dataset = fixture();
        let dir = TempDir::new().unwrap();
        let renderer = ChartRenderer::without_text(200, 150);

        let written = renderer.render_all(&dataset, &[], dir.path()).unwrap();
        assert_eq!(written.len(), 2);
        assert!(!dir.path().join(ELASTICITY_FILE).exists());
    }

    #[test]
    fn test_render_drops_undefined_elasticity() {
        let dataset = fixture();
        let dir = TempDir::new().unwrap();
        let renderer = ChartRenderer::without_text(200, 150);

        let undefined = vec![Elasticity {
            start_year: 2011,
            end_year: 2016,
            value: f64::NAN,
        }];
        let written = renderer.render_all(&dataset, &undefined, dir.path()).unwrap();
        assert_eq!(written.len(), 2);

        let mixed = vec![
            undefined[0].clone(),
            Elasticity {
                start_year: 2017,
                end_year: 2023,
                value: 0.4,
            },
        ];
        let written = renderer.render_all(&dataset, &mixed, dir.path()).unwrap();
        assert_eq!(written.len(), 3);
        assert!(non_empty(&dir.path().join(ELASTICITY_FILE)));
    }

    #[test]
    fn test_render_with_missing_values() {
        let mut rows = vec![Observation::empty(2020), Observation::empty(2021)];
        rows[0].gdp_growth = 1.0;
        let mut dataset = Dataset::from_observations(rows).unwrap();
        compute_indices(&mut dataset);

        let dir = TempDir::new().unwrap();
        let renderer = ChartRenderer::without_text(200, 150);
        let path = dir.path().join(KEY_INDICATORS_FILE);
        renderer.key_indicators(&dataset, &path).unwrap();
        assert!(non_empty(&path));
    }
}
