//! Case files: one patient plus the evidence gathered so far, as JSON.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use urodx_engine::{PatientContext, SymptomEvidence};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseFile {
    pub patient: PatientContext,
    pub evidence: SymptomEvidence,
}

impl CaseFile {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Case file is not valid JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("Failed to read case {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Failed to parse case {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use urodx_engine::{Gender, Onset};

    #[test]
    fn test_parse_case() {
        let case = CaseFile::from_json(
            r#"{
                "patient": {"age": 72, "gender": "male"},
                "evidence": {
                    "onset_speed": "gradual",
                    "weak_stream_severity": 85,
                    "nocturia_per_night": 4,
                    "fever_present": false,
                    "reported_symptoms": ["straining"]
                }
            }"#,
        )
        .unwrap();
        assert_eq!(case.patient.gender, Gender::Male);
        assert_eq!(case.evidence.onset_speed, Some(Onset::Gradual));
        assert_eq!(case.evidence.fever_present, Some(false));
        assert!(case.evidence.reported_symptoms.contains("straining"));
    }

    #[test]
    fn test_empty_case_is_default() {
        assert_eq!(CaseFile::from_json("{}").unwrap(), CaseFile::default());
    }

    #[test]
    fn test_bad_onset_is_rejected() {
        assert!(CaseFile::from_json(r#"{"evidence": {"onset_speed": "yesterday"}}"#).is_err());
    }
}
