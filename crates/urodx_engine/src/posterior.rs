//! Posterior normalizer.
//!
//! Softmax over the log-odds vector with max-subtraction, then every
//! probability is kept strictly inside (0, 1).

use crate::catalog::Catalog;
use crate::likelihood::LogOdds;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Probabilities are clamped to [PROBABILITY_FLOOR, 1 - PROBABILITY_FLOOR]
pub const PROBABILITY_FLOOR: f64 = 1e-12;

/// Numerically stable softmax. Non-finite input yields a uniform distribution.
pub fn softmax(scores: &[f64]) -> Vec<f64> {
    if scores.is_empty() {
        return Vec::new();
    }
    let uniform = || vec![1.0 / scores.len() as f64; scores.len()];
    if scores.iter().any(|s| !s.is_finite()) {
        return uniform();
    }

    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    if !(total.is_finite() && total > 0.0) {
        return uniform();
    }

    exps.iter()
        .map(|e| (e / total).clamp(PROBABILITY_FLOOR, 1.0 - PROBABILITY_FLOOR))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCondition {
    pub condition: String,
    pub label: String,
    pub probability: f64,
}

/// Probability per condition, catalog order
#[derive(Debug, Clone, PartialEq)]
pub struct Posterior {
    conditions: Vec<String>,
    labels: Vec<String>,
    probabilities: Vec<f64>,
}

impl Posterior {
    pub fn from_log_odds(catalog: &Catalog, log_odds: &LogOdds) -> Self {
        Self {
            conditions: catalog.conditions.iter().map(|c| c.id.clone()).collect(),
            labels: catalog.conditions.iter().map(|c| c.label.clone()).collect(),
            probabilities: softmax(log_odds.as_slice()),
        }
    }

    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    pub fn get(&self, condition: &str) -> Option<f64> {
        self.conditions
            .iter()
            .position(|c| c == condition)
            .map(|i| self.probabilities[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.conditions
            .iter()
            .map(String::as_str)
            .zip(self.probabilities.iter().copied())
    }

    /// Highest first; ties keep catalog order
    pub fn ranked(&self) -> Vec<RankedCondition> {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| self.probabilities[b].total_cmp(&self.probabilities[a]));
        order
            .into_iter()
            .map(|i| RankedCondition {
                condition: self.conditions[i].clone(),
                label: self.labels[i].clone(),
                probability: self.probabilities[i],
            })
            .collect()
    }

    pub fn top(&self) -> Option<RankedCondition> {
        self.ranked().into_iter().next()
    }

    pub fn to_map(&self) -> BTreeMap<String, f64> {
        self.iter().map(|(c, p)| (c.to_string(), p)).collect()
    }
}
