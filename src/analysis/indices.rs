//! The three composite indices: SSI, FCI and DQI.
//!
//! Each index is a pure function of a single year (SSI) or a single
//! observation (FCI, DQI). None of the components are clamped to [0, 1];
//! keeping inputs in range is the data author's responsibility.

use super::aggregator::nan_mean;
use crate::dataset::Dataset;
use crate::models::{Observation, SuppressionEvent};
use tracing::{debug, warn};

/// Cess share (percent of gross tax revenue) treated as full centralization.
const CESS_CEILING: f64 = 25.0;

/// Worst possible press freedom rank.
const PRESS_FREEDOM_WORST: f64 = 180.0;

/// Hand-curated suppression events, keyed by year.
static SUPPRESSION_EVENTS: &[(i32, &[SuppressionEvent])] = &[
    (
        2017,
        &[SuppressionEvent::new("Consumption Survey Withheld", 1.0, 0.8)],
    ),
    (
        2019,
        &[
            SuppressionEvent::new("PLFS Delayed", 0.5, 0.7),
            SuppressionEvent::new("NSC Resignations", 0.8, 0.6),
        ],
    ),
    (2020, &[SuppressionEvent::new("GDP Revision", 0.3, 0.6)]),
    (2021, &[SuppressionEvent::new("Census Postponed", 1.0, 1.0)]),
    (
        2023,
        &[SuppressionEvent::new("Multiple Suppressions", 0.8, 0.9)],
    ),
];

/// Suppression events recorded for a year (empty when none).
pub fn suppression_events(year: i32) -> &'static [SuppressionEvent] {
    SUPPRESSION_EVENTS
        .iter()
        .find(|(y, _)| *y == year)
        .map(|(_, events)| *events)
        .unwrap_or(&[])
}

/// Statistical Suppression Index: mean of severity × salience over the
/// year's events, 0 for a year without events.
pub fn ssi(year: i32) -> f64 {
    let events = suppression_events(year);
    if events.is_empty() {
        return 0.0;
    }
    events.iter().map(SuppressionEvent::score).sum::<f64>() / events.len() as f64
}

/// The three normalized FCI components, in order: cess, devolution shortfall,
/// conditional borrowing.
pub fn fci_components(obs: &Observation) -> [f64; 3] {
    [
        obs.cess_percentage / CESS_CEILING,
        1.0 - obs.actual_devolution / obs.promised_devolution,
        obs.conditional_borrowing / obs.total_borrowing,
    ]
}

/// Fiscal Centralization Index: mean of the non-NaN components.
pub fn fci(obs: &Observation) -> f64 {
    nan_mean(&fci_components(obs))
}

/// The three normalized DQI components: press freedom, V-Dem, Freedom House.
pub fn dqi_components(obs: &Observation) -> [f64; 3] {
    [
        (PRESS_FREEDOM_WORST - obs.press_freedom_rank) / PRESS_FREEDOM_WORST,
        obs.vdem_liberal_democracy,
        obs.freedom_house_score / 100.0,
    ]
}

/// Democratic Quality Index: geometric mean of the three components.
///
/// Uses a real power, so a negative product gives NaN rather than a
/// negative cube root.
pub fn dqi(obs: &Observation) -> f64 {
    let product: f64 = dqi_components(obs).iter().product();
    product.powf(1.0 / 3.0)
}

/// Fill the derived `ssi`, `fci` and `dqi` fields on every observation.
pub fn compute_indices(dataset: &mut Dataset) {
    for obs in dataset.observations_mut() {
        obs.ssi = ssi(obs.year);
        obs.fci = fci(obs);
        obs.dqi = dqi(obs);

        debug!(
            "{}: ssi={:.3} fci={:.3} dqi={:.3}",
            obs.year, obs.ssi, obs.fci, obs.dqi
        );

        if obs.dqi.is_nan() {
            warn!(
                "DQI for {} is undefined (missing or negative component: {:?})",
                obs.year,
                dqi_components(obs)
            );
        }
    }
}
