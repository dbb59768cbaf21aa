//! Recommendation synthesizer.
//!
//! Decision table over the top-ranked condition: if its probability clears
//! the condition's bundle threshold the bundle is emitted, otherwise the
//! uncertain bundle names the two leading candidates.

use crate::catalog::{Catalog, Confidence, Urgency};
use crate::evidence::{Finding, SymptomEvidence};
use crate::patient::{Gender, PatientContext};
use crate::posterior::Posterior;
use serde::{Deserialize, Serialize};

/// Men above this age get a PSA step in the action plan
pub const PSA_AGE: u32 = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub primary_diagnosis: String,
    /// Condition the bundle was chosen for; `None` when uncertain
    pub condition: Option<String>,
    pub probability: f64,
    pub confidence: Confidence,
    pub action: String,
    pub urgency: Urgency,
    pub self_care: Vec<String>,
    pub red_flags: String,
    #[serde(default)]
    pub investigations: Vec<String>,
    #[serde(default)]
    pub procedures: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Recommendation {
    pub fn is_uncertain(&self) -> bool {
        self.condition.is_none()
    }
}

fn percent(p: f64) -> String {
    format!("{:.0}%", p * 100.0)
}

pub fn synthesize(catalog: &Catalog, posterior: &Posterior) -> Recommendation {
    let ranked = posterior.ranked();

    if let Some(top) = ranked.first() {
        let bundle = catalog
            .recommendations
            .iter()
            .find(|b| b.condition == top.condition && top.probability > b.threshold);
        if let Some(bundle) = bundle {
            return Recommendation {
                primary_diagnosis: bundle.primary_diagnosis.clone(),
                condition: Some(bundle.condition.clone()),
                probability: top.probability,
                confidence: bundle.confidence,
                action: bundle.action.clone(),
                urgency: bundle.urgency,
                self_care: bundle.self_care.clone(),
                red_flags: bundle.red_flags.clone(),
                investigations: bundle.investigations.clone(),
                procedures: bundle.procedures.clone(),
                note: None,
            };
        }
    }

    let leaders: Vec<String> = ranked
        .iter()
        .take(2)
        .map(|r| format!("{} ({})", r.label, percent(r.probability)))
        .collect();
    let uncertain = &catalog.uncertain;

    Recommendation {
        primary_diagnosis: format!("Uncertain - top possibilities: {}", leaders.join(", ")),
        condition: None,
        probability: ranked.first().map_or(0.0, |r| r.probability),
        confidence: Confidence::Low,
        action: uncertain.action.clone(),
        urgency: Urgency::Routine,
        self_care: uncertain.self_care.clone(),
        red_flags: uncertain.red_flags.clone(),
        investigations: Vec::new(),
        procedures: Vec::new(),
        note: Some(uncertain.note.clone()),
    }
}

/// Concrete next steps for the person running the consultation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub urgency: Urgency,
    pub action: String,
    pub next_steps: Vec<String>,
    pub red_flags: String,
}

pub fn action_plan(
    recommendation: &Recommendation,
    patient: &PatientContext,
    evidence: &SymptomEvidence,
) -> ActionPlan {
    let mut steps: Vec<String> = vec!["urine dipstick".to_string(), "urine culture".to_string()];
    if patient.gender == Gender::Male && patient.effective_age() > PSA_AGE {
        steps.push("PSA".to_string());
    }
    if evidence.finding_present(Finding::Hematuria) {
        steps.push("ultrasound KUB".to_string());
    }
    for investigation in &recommendation.investigations {
        if !steps.iter().any(|s| s.eq_ignore_ascii_case(investigation)) {
            steps.push(investigation.clone());
        }
    }

    ActionPlan {
        urgency: recommendation.urgency,
        action: recommendation.action.clone(),
        next_steps: steps,
        red_flags: recommendation.red_flags.clone(),
    }
}
