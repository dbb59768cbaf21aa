//! Symptom evidence accumulated by the calling session.
//!
//! Typed fields with an explicit unknown state (`None`) per field. The engine
//! reads this structure and never owns it; the session mutates it once per
//! answered question.

use crate::error::{EngineError, Result};
use crate::patient::{PatientContext, RiskFlag};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Severity scale ceiling (0-100)
pub const MAX_SEVERITY: u8 = 100;

/// Counts at or above this read as fully present on the node's 0-1 scale
pub const COUNT_SATURATION: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Onset {
    Sudden,
    Gradual,
}

impl Onset {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sudden" | "s" | "acute" => Some(Onset::Sudden),
            "gradual" | "g" | "slow" | "chronic" => Some(Onset::Gradual),
            _ => None,
        }
    }
}

/// Categorical presence findings with dedicated evidence fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Finding {
    Dysuria,
    Hematuria,
    Fever,
}

impl Finding {
    /// Reported-symptom id that also signals this finding
    pub fn reported_alias(&self) -> &'static str {
        match self {
            Finding::Dysuria => "pain_burning",
            Finding::Hematuria => "blood_in_urine",
            Finding::Fever => "fever",
        }
    }

    /// Severity field graded on the same symptom, if any
    pub fn severity_field(&self) -> Option<SeverityField> {
        match self {
            Finding::Dysuria => Some(SeverityField::Dysuria),
            Finding::Hematuria | Finding::Fever => None,
        }
    }
}

/// Continuous 0-100 severities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityField {
    Dysuria,
    WeakStream,
    Pain,
}

/// Counted symptoms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountField {
    NocturiaPerNight,
}

/// How a symptom node reads from (and is written to) the evidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvidenceProbe {
    Finding { finding: Finding },
    Severity { field: SeverityField },
    Count { field: CountField },
    History { flag: RiskFlag },
    Reported,
}

/// Observed value of a symptom node
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SymptomValue {
    #[default]
    Unknown,
    Flag(bool),
    Level(f64),
}

impl SymptomValue {
    pub fn is_known(&self) -> bool {
        !matches!(self, SymptomValue::Unknown)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerType {
    YesNo,
    #[serde(rename = "scale_0_10")]
    Scale0To10,
    Count,
    Categorical,
}

/// A patient's answer to one question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Answer {
    YesNo(bool),
    /// 0-10 scale, stored as a 0-100 severity
    Scale(u8),
    Count(u32),
    Onset(Onset),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymptomEvidence {
    pub onset_speed: Option<Onset>,
    pub fever_present: Option<bool>,
    pub dysuria: Option<bool>,
    pub hematuria: Option<bool>,
    pub dysuria_severity: Option<u8>,
    pub weak_stream_severity: Option<u8>,
    pub pain_severity: Option<u8>,
    pub nocturia_per_night: Option<u32>,
    /// Free-form symptom ids the patient reported as present
    pub reported_symptoms: BTreeSet<String>,
    /// Symptom ids the patient explicitly denied
    pub denied_symptoms: BTreeSet<String>,
}

impl SymptomEvidence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_onset(mut self, onset: Onset) -> Self {
        self.onset_speed = Some(onset);
        self
    }

    pub fn with_finding(mut self, finding: Finding, present: bool) -> Self {
        self.set_finding(finding, present);
        self
    }

    pub fn with_severity(mut self, field: SeverityField, severity: u8) -> Self {
        self.set_severity(field, severity);
        self
    }

    pub fn with_count(mut self, field: CountField, count: u32) -> Self {
        self.set_count(field, count);
        self
    }

    pub fn with_reported(mut self, id: &str) -> Self {
        self.denied_symptoms.remove(id);
        self.reported_symptoms.insert(id.to_string());
        self
    }

    pub fn finding(&self, finding: Finding) -> Option<bool> {
        match finding {
            Finding::Dysuria => self.dysuria,
            Finding::Hematuria => self.hematuria,
            Finding::Fever => self.fever_present,
        }
    }

    pub fn set_finding(&mut self, finding: Finding, present: bool) {
        let slot = match finding {
            Finding::Dysuria => &mut self.dysuria,
            Finding::Hematuria => &mut self.hematuria,
            Finding::Fever => &mut self.fever_present,
        };
        *slot = Some(present);
    }

    /// Whether a finding counts as present: the typed flag wins, then the
    /// reported-symptom alias. Missing means absent.
    pub fn finding_present(&self, finding: Finding) -> bool {
        match self.finding(finding) {
            Some(present) => present,
            None => self.reported_symptoms.contains(finding.reported_alias()),
        }
    }

    /// Severity clamped to 0-100
    pub fn severity(&self, field: SeverityField) -> Option<u8> {
        let raw = match field {
            SeverityField::Dysuria => self.dysuria_severity,
            SeverityField::WeakStream => self.weak_stream_severity,
            SeverityField::Pain => self.pain_severity,
        };
        raw.map(|v| v.min(MAX_SEVERITY))
    }

    pub fn set_severity(&mut self, field: SeverityField, severity: u8) {
        let value = Some(severity.min(MAX_SEVERITY));
        match field {
            SeverityField::Dysuria => self.dysuria_severity = value,
            SeverityField::WeakStream => self.weak_stream_severity = value,
            SeverityField::Pain => self.pain_severity = value,
        }
    }

    pub fn count(&self, field: CountField) -> Option<u32> {
        match field {
            CountField::NocturiaPerNight => self.nocturia_per_night,
        }
    }

    pub fn set_count(&mut self, field: CountField, count: u32) {
        match field {
            CountField::NocturiaPerNight => self.nocturia_per_night = Some(count),
        }
    }

    fn mark(&mut self, id: &str, present: bool) {
        if present {
            self.denied_symptoms.remove(id);
            self.reported_symptoms.insert(id.to_string());
        } else {
            self.reported_symptoms.remove(id);
            self.denied_symptoms.insert(id.to_string());
        }
    }

    fn listed(&self, id: &str) -> SymptomValue {
        if self.reported_symptoms.contains(id) {
            SymptomValue::Flag(true)
        } else if self.denied_symptoms.contains(id) {
            SymptomValue::Flag(false)
        } else {
            SymptomValue::Unknown
        }
    }

    /// Current value of a symptom node, read through its probe
    pub fn observed_value(
        &self,
        probe: EvidenceProbe,
        id: &str,
        patient: &PatientContext,
    ) -> SymptomValue {
        match probe {
            EvidenceProbe::Finding { finding } => {
                // a rated severity answers the presence question too
                if let Some(severity) = finding.severity_field().and_then(|field| self.severity(field)) {
                    return SymptomValue::Level(severity as f64 / MAX_SEVERITY as f64);
                }
                match self.finding(finding) {
                    Some(present) => SymptomValue::Flag(present),
                    None => self.listed(id),
                }
            }
            EvidenceProbe::Severity { field } => match self.severity(field) {
                Some(severity) => SymptomValue::Level(severity as f64 / MAX_SEVERITY as f64),
                None => self.listed(id),
            },
            EvidenceProbe::Count { field } => match self.count(field) {
                Some(count) => {
                    SymptomValue::Level(count.min(COUNT_SATURATION) as f64 / COUNT_SATURATION as f64)
                }
                None => self.listed(id),
            },
            EvidenceProbe::History { flag } => {
                if patient.risk.has(flag) {
                    SymptomValue::Flag(true)
                } else {
                    self.listed(id)
                }
            }
            EvidenceProbe::Reported => self.listed(id),
        }
    }

    /// Record an answer for a symptom node. Mismatched answer types are rejected.
    pub fn apply_answer(
        &mut self,
        probe: EvidenceProbe,
        id: &str,
        answer: Answer,
        patient: &mut PatientContext,
    ) -> Result<()> {
        let mismatch = |reason: &str| EngineError::InvalidAnswer {
            symptom: id.to_string(),
            reason: reason.to_string(),
        };

        match (probe, answer) {
            (EvidenceProbe::Finding { finding }, Answer::YesNo(present)) => {
                self.set_finding(finding, present);
                self.mark(id, present);
            }
            (EvidenceProbe::Finding { finding }, Answer::Scale(scale)) => {
                let field = finding
                    .severity_field()
                    .ok_or_else(|| mismatch("expected yes/no"))?;
                self.set_finding(finding, scale > 0);
                self.set_severity(field, scale_to_severity(scale));
                self.mark(id, scale > 0);
            }
            (EvidenceProbe::Severity { field }, Answer::Scale(scale)) => {
                self.set_severity(field, scale_to_severity(scale));
                self.mark(id, scale > 0);
            }
            (EvidenceProbe::Severity { field }, Answer::YesNo(present)) => {
                if !present {
                    self.set_severity(field, 0);
                }
                self.mark(id, present);
            }
            (EvidenceProbe::Count { field }, Answer::Count(count)) => {
                self.set_count(field, count);
                self.mark(id, count > 0);
            }
            (EvidenceProbe::Count { field }, Answer::YesNo(present)) => {
                if !present {
                    self.set_count(field, 0);
                }
                self.mark(id, present);
            }
            (EvidenceProbe::History { flag }, Answer::YesNo(present)) => {
                patient.risk.set(flag, present);
                self.mark(id, present);
            }
            (EvidenceProbe::Reported, Answer::YesNo(present)) => self.mark(id, present),
            (_, Answer::Onset(_)) => return Err(mismatch("onset is not a symptom answer")),
            _ => return Err(mismatch("answer type does not match the question")),
        }
        Ok(())
    }

    /// Counterfactual copy with one symptom forced present (at the simulated
    /// severity/count) or absent.
    pub fn counterfactual(
        &self,
        patient: &PatientContext,
        probe: EvidenceProbe,
        id: &str,
        present: bool,
        severity: u8,
        count: u32,
    ) -> (SymptomEvidence, PatientContext) {
        let mut evidence = self.clone();
        let mut patient = patient.clone();

        match probe {
            EvidenceProbe::Finding { finding } => evidence.set_finding(finding, present),
            EvidenceProbe::Severity { field } => {
                evidence.set_severity(field, if present { severity } else { 0 })
            }
            EvidenceProbe::Count { field } => {
                evidence.set_count(field, if present { count } else { 0 })
            }
            EvidenceProbe::History { flag } => patient.risk.set(flag, present),
            EvidenceProbe::Reported => {}
        }
        evidence.mark(id, present);

        (evidence, patient)
    }
}

/// Convert a 0-10 answer to the 0-100 severity scale
pub fn scale_to_severity(scale: u8) -> u8 {
    scale.min(10) * 10
}
