//! Prior estimator.
//!
//! Maps patient demographics and risk flags to a prior per condition using
//! first-match bands from the catalog. Priors never reach 0 or 1.

use crate::catalog::{Catalog, PriorRule};
use crate::patient::PatientContext;

pub const PRIOR_FLOOR: f64 = 0.001;
pub const PRIOR_CEILING: f64 = 0.999;

/// Prior for one rule: the first matching band, else the default
pub fn prior_for(rule: &PriorRule, patient: &PatientContext) -> f64 {
    let raw = rule
        .bands
        .iter()
        .find(|band| band.when.matches(patient))
        .map(|band| band.prior)
        .unwrap_or(rule.default);
    if raw.is_nan() {
        return PRIOR_FLOOR;
    }
    raw.clamp(PRIOR_FLOOR, PRIOR_CEILING)
}

/// Priors in catalog order
pub fn estimate_priors(catalog: &Catalog, patient: &PatientContext) -> Vec<f64> {
    (0..catalog.len())
        .map(|i| prior_for(catalog.prior_rule(i), patient))
        .collect()
}

/// ln(p / (1 - p))
pub fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}
