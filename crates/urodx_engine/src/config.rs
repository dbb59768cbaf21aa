//! Engine configuration.
//!
//! Tunables for FindPivots, question simulation and the questioning loop.
//! Every field has a default; out-of-range values are clamped by the
//! `effective_*` accessors rather than rejected.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// FindPivots parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotSettings {
    /// Distance bound B (valid: 0.1-10.0)
    #[serde(default = "default_bound")]
    pub bound: f64,

    /// Relaxation depth k (valid: 1-10)
    #[serde(default = "default_depth")]
    pub depth: usize,
}

fn default_bound() -> f64 {
    1.0
}

fn default_depth() -> usize {
    3
}

impl PivotSettings {
    pub fn effective_bound(&self) -> f64 {
        if self.bound.is_nan() {
            return default_bound();
        }
        self.bound.clamp(0.1, 10.0)
    }

    pub fn effective_depth(&self) -> usize {
        self.depth.clamp(1, 10)
    }
}

impl Default for PivotSettings {
    fn default() -> Self {
        Self {
            bound: default_bound(),
            depth: default_depth(),
        }
    }
}

/// Counterfactual simulation and loop limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestioningSettings {
    /// Severity assumed for a "yes" on a graded symptom (valid: 1-100).
    /// Raised past any rule gate on the same field.
    #[serde(default = "default_simulated_severity")]
    pub simulated_severity: u8,

    /// Count assumed for a "yes" on a counted symptom (valid: 1-20)
    #[serde(default = "default_simulated_count")]
    pub simulated_count: u32,

    /// Ranked suggestions returned per plan (valid: 1-10)
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,

    /// Session stops once posterior entropy is at or below this (bits)
    #[serde(default = "default_stop_entropy")]
    pub stop_entropy: f64,

    /// Session stops after this many questions (valid: 1-50)
    #[serde(default = "default_max_questions")]
    pub max_questions: usize,
}

fn default_simulated_severity() -> u8 {
    70
}

fn default_simulated_count() -> u32 {
    3
}

fn default_max_suggestions() -> usize {
    3
}

fn default_stop_entropy() -> f64 {
    0.2
}

fn default_max_questions() -> usize {
    15
}

impl QuestioningSettings {
    pub fn effective_simulated_severity(&self) -> u8 {
        self.simulated_severity.clamp(1, 100)
    }

    pub fn effective_simulated_count(&self) -> u32 {
        self.simulated_count.clamp(1, 20)
    }

    pub fn effective_max_suggestions(&self) -> usize {
        self.max_suggestions.clamp(1, 10)
    }

    pub fn effective_stop_entropy(&self) -> f64 {
        if self.stop_entropy.is_nan() {
            return default_stop_entropy();
        }
        self.stop_entropy.clamp(0.0, 3.0)
    }

    pub fn effective_max_questions(&self) -> usize {
        self.max_questions.clamp(1, 50)
    }
}

impl Default for QuestioningSettings {
    fn default() -> Self {
        Self {
            simulated_severity: default_simulated_severity(),
            simulated_count: default_simulated_count(),
            max_suggestions: default_max_suggestions(),
            stop_entropy: default_stop_entropy(),
            max_questions: default_max_questions(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSettings {
    /// Default filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub pivots: PivotSettings,

    #[serde(default)]
    pub questioning: QuestioningSettings,

    #[serde(default)]
    pub log: LogSettings,
}

impl EngineConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.pivots.bound, 1.0);
        assert_eq!(config.pivots.depth, 3);
        assert_eq!(config.questioning.simulated_severity, 70);
        assert_eq!(config.questioning.simulated_count, 3);
        assert_eq!(config.questioning.max_questions, 15);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_partial_toml() {
        let config = EngineConfig::from_toml_str("[pivots]\ndepth = 4\n").unwrap();
        assert_eq!(config.pivots.depth, 4);
        assert_eq!(config.pivots.bound, 1.0);
        assert_eq!(config.questioning, QuestioningSettings::default());
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_clamping() {
        let mut config = EngineConfig::default();
        config.pivots.depth = 0;
        config.pivots.bound = 50.0;
        config.questioning.simulated_severity = 0;
        config.questioning.max_questions = 500;
        assert_eq!(config.pivots.effective_depth(), 1);
        assert_eq!(config.pivots.effective_bound(), 10.0);
        assert_eq!(config.questioning.effective_simulated_severity(), 1);
        assert_eq!(config.questioning.effective_max_questions(), 50);
    }

    #[test]
    fn test_bad_toml() {
        let err = EngineConfig::from_toml_str("[pivots]\ndepth = \"deep\"\n").unwrap_err();
        assert_eq!(err.code(), "config");
    }

    #[test]
    fn test_round_trip() {
        let config = EngineConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }
}
