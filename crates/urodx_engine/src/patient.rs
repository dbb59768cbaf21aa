//! Patient demographics and risk history.
//!
//! Immutable input for one scoring pass. Every field has an explicit
//! "unknown" state instead of a probed default.

use serde::{Deserialize, Serialize};

/// Age used for prior bands when the patient's age is not known
pub const DEFAULT_AGE: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
    #[default]
    Unknown,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Female => "female",
            Gender::Male => "male",
            Gender::Unknown => "unknown",
        }
    }
}

/// Risk-history flags that shift priors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFlag {
    PreviousKidneyStones,
    FamilyHistoryProstateCancer,
}

/// Known risk history. `false` means "not reported", not "ruled out".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskHistory {
    pub previous_kidney_stones: bool,
    pub family_history_prostate_cancer: bool,
}

impl RiskHistory {
    pub fn has(&self, flag: RiskFlag) -> bool {
        match flag {
            RiskFlag::PreviousKidneyStones => self.previous_kidney_stones,
            RiskFlag::FamilyHistoryProstateCancer => self.family_history_prostate_cancer,
        }
    }

    pub fn set(&mut self, flag: RiskFlag, value: bool) {
        match flag {
            RiskFlag::PreviousKidneyStones => self.previous_kidney_stones = value,
            RiskFlag::FamilyHistoryProstateCancer => self.family_history_prostate_cancer = value,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientContext {
    pub age: Option<u32>,
    pub gender: Gender,
    pub risk: RiskHistory,
}

impl PatientContext {
    pub fn new(age: u32, gender: Gender) -> Self {
        Self {
            age: Some(age),
            gender,
            risk: RiskHistory::default(),
        }
    }

    /// Builder-style risk flag
    pub fn with_risk(mut self, flag: RiskFlag) -> Self {
        self.risk.set(flag, true);
        self
    }

    /// Age for prior lookup (falls back to DEFAULT_AGE)
    pub fn effective_age(&self) -> u32 {
        self.age.unwrap_or(DEFAULT_AGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_age_falls_back() {
        let patient = PatientContext::default();
        assert_eq!(patient.effective_age(), DEFAULT_AGE);
        assert_eq!(patient.gender, Gender::Unknown);
    }

    #[test]
    fn test_with_risk() {
        let patient = PatientContext::new(45, Gender::Male).with_risk(RiskFlag::PreviousKidneyStones);
        assert!(patient.risk.has(RiskFlag::PreviousKidneyStones));
        assert!(!patient.risk.has(RiskFlag::FamilyHistoryProstateCancer));
    }

    #[test]
    fn test_deserialize_partial() {
        let patient: PatientContext =
            serde_json::from_str(r#"{"gender":"female","risk":{"previous_kidney_stones":true}}"#)
                .unwrap();
        assert_eq!(patient.age, None);
        assert_eq!(patient.gender, Gender::Female);
        assert!(patient.risk.previous_kidney_stones);
    }
}
