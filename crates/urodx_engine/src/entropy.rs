//! Shannon entropy in bits.

use serde::{Deserialize, Serialize};

/// H(p) for a binary split; 0 at the boundaries
pub fn binary_entropy(p: f64) -> f64 {
    if p <= 0.0 || p >= 1.0 || p.is_nan() {
        return 0.0;
    }
    -p * p.log2() - (1.0 - p) * (1.0 - p).log2()
}

/// Multi-class entropy of a distribution
pub fn distribution_entropy(probabilities: &[f64]) -> f64 {
    probabilities
        .iter()
        .filter(|&&p| p > 0.0)
        .map(|&p| -p * p.log2())
        .sum()
}

/// Average of per-condition binary entropies
pub fn mean_binary_entropy(probabilities: &[f64]) -> f64 {
    if probabilities.is_empty() {
        return 0.0;
    }
    probabilities.iter().map(|&p| binary_entropy(p)).sum::<f64>() / probabilities.len() as f64
}

/// log2(n), the entropy of a uniform distribution over n outcomes
pub fn max_entropy(n: usize) -> f64 {
    if n <= 1 {
        0.0
    } else {
        (n as f64).log2()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntropySummary {
    /// Multi-class entropy of the posterior
    pub distribution: f64,
    pub mean_binary: f64,
    pub max: f64,
}

impl EntropySummary {
    pub fn of(probabilities: &[f64]) -> Self {
        Self {
            distribution: distribution_entropy(probabilities),
            mean_binary: mean_binary_entropy(probabilities),
            max: max_entropy(probabilities.len()),
        }
    }

    /// distribution / max, in [0, 1]
    pub fn normalized(&self) -> f64 {
        if self.max > 0.0 {
            (self.distribution / self.max).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}
