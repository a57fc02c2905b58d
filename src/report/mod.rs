//! Report artifacts: PNG charts and CSV/JSON exports.

pub mod charts;
pub mod generator;

pub use charts::ChartRenderer;
pub use generator::export_all;
