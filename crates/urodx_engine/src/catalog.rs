//! Condition catalog: the immutable configuration every scoring call reads.
//!
//! Conditions with their symptom edges, symptom definitions, prior bands,
//! discrete point rules, continuous response rules, recommendation bundles
//! and initial questions. Loaded once at process start (built-in tables or
//! TOML) and validated before use; scoring functions take it by reference.

use crate::curve::ResponseCurve;
use crate::error::{EngineError, Result};
use crate::evidence::{AnswerType, CountField, EvidenceProbe, Finding, Onset, SeverityField};
use crate::patient::{Gender, PatientContext, RiskFlag};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Weighted symptom → condition link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymptomEdge {
    pub symptom: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionDef {
    pub id: String,
    pub label: String,
    /// Typical presentation, for display
    #[serde(default)]
    pub pattern: String,
    pub edges: Vec<SymptomEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymptomDef {
    pub id: String,
    pub label: String,
    pub probe: EvidenceProbe,
    pub question: String,
    pub answer_type: AnswerType,
}

/// Matching criteria for a prior band. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorMatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskFlag>,
}

impl PriorMatch {
    pub fn matches(&self, patient: &PatientContext) -> bool {
        self.gender.map_or(true, |g| patient.gender == g)
            && self.min_age.map_or(true, |age| patient.effective_age() >= age)
            && self.risk.map_or(true, |flag| patient.risk.has(flag))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorBand {
    pub when: PriorMatch,
    pub prior: f64,
}

/// Piecewise prior for one condition: first matching band wins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorRule {
    pub condition: String,
    pub default: f64,
    #[serde(default)]
    pub bands: Vec<PriorBand>,
    #[serde(default)]
    pub citation: String,
}

/// Evidence pattern that fires a discrete rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    Onset { onset: Onset },
    Present { finding: Finding },
    CountAtLeast { field: CountField, threshold: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionDelta {
    pub condition: String,
    pub delta: f64,
}

/// Signed log-odds points added when the trigger holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscreteRule {
    pub name: String,
    pub trigger: Trigger,
    pub deltas: Vec<ConditionDelta>,
    #[serde(default)]
    pub citation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuousEffect {
    pub condition: String,
    /// Scale applied to the log likelihood ratio (negative disfavors)
    pub weight: f64,
    /// Multiplier on the primary likelihood before the ratio is taken
    #[serde(default = "default_likelihood_scale")]
    pub likelihood_scale: f64,
}

fn default_likelihood_scale() -> f64 {
    1.0
}

/// Severity-driven log likelihood ratio.
///
/// Applies when the severity is strictly above `gate`. The term added to each
/// effect's condition is `weight * ln(scale * primary(s) / alternative(s))`,
/// with an absent alternative reading as 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuousRule {
    pub name: String,
    pub field: SeverityField,
    #[serde(default)]
    pub gate: u8,
    pub primary: ResponseCurve,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative: Option<ResponseCurve>,
    pub effects: Vec<ContinuousEffect>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Moderate,
    ModerateHigh,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Moderate => "moderate",
            Confidence::ModerateHigh => "moderate-high",
            Confidence::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Routine,
    Soon,
    Urgent,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Routine => "routine",
            Urgency::Soon => "soon",
            Urgency::Urgent => "urgent",
        }
    }
}

/// Recommendation emitted when `condition` is top with probability above `threshold`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationBundle {
    pub condition: String,
    pub threshold: f64,
    pub primary_diagnosis: String,
    pub confidence: Confidence,
    pub action: String,
    pub urgency: Urgency,
    #[serde(default)]
    pub self_care: Vec<String>,
    pub red_flags: String,
    #[serde(default)]
    pub investigations: Vec<String>,
    #[serde(default)]
    pub procedures: Vec<String>,
}

/// Bundle emitted when no condition clears its threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UncertainBundle {
    pub action: String,
    pub self_care: Vec<String>,
    pub red_flags: String,
    pub note: String,
}

/// What an initial question asks about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InitialTarget {
    OnsetSpeed,
    Symptom { id: String },
}

/// Static question asked when no evidence exists yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialQuestion {
    pub target: InitialTarget,
    pub question: String,
    pub answer_type: AnswerType,
    /// Editorial ranking value, not a computed gain
    pub information_gain: f64,
    pub rationale: String,
}

impl InitialQuestion {
    pub fn id(&self) -> &str {
        match &self.target {
            InitialTarget::OnsetSpeed => "onset_speed",
            InitialTarget::Symptom { id } => id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub name: String,
    pub conditions: Vec<ConditionDef>,
    pub symptoms: Vec<SymptomDef>,
    pub priors: Vec<PriorRule>,
    pub discrete_rules: Vec<DiscreteRule>,
    pub continuous_rules: Vec<ContinuousRule>,
    pub recommendations: Vec<RecommendationBundle>,
    pub uncertain: UncertainBundle,
    pub initial_questions: Vec<InitialQuestion>,
    #[serde(skip)]
    condition_index: HashMap<String, usize>,
    #[serde(skip)]
    symptom_index: HashMap<String, usize>,
    #[serde(skip)]
    prior_index: Vec<usize>,
}

impl Catalog {
    /// Assemble and validate a catalog
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        conditions: Vec<ConditionDef>,
        symptoms: Vec<SymptomDef>,
        priors: Vec<PriorRule>,
        discrete_rules: Vec<DiscreteRule>,
        continuous_rules: Vec<ContinuousRule>,
        recommendations: Vec<RecommendationBundle>,
        uncertain: UncertainBundle,
        initial_questions: Vec<InitialQuestion>,
    ) -> Result<Self> {
        Self {
            name: name.into(),
            conditions,
            symptoms,
            priors,
            discrete_rules,
            continuous_rules,
            recommendations,
            uncertain,
            initial_questions,
            condition_index: HashMap::new(),
            symptom_index: HashMap::new(),
            prior_index: Vec::new(),
        }
        .validated()
    }

    /// Parse and validate a TOML catalog
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let catalog: Catalog = toml::from_str(contents)?;
        catalog.validated()
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Build indices and check every cross-reference
    fn validated(mut self) -> Result<Self> {
        let fail = |msg: String| Err(EngineError::CatalogIntegrity(msg));

        if self.conditions.is_empty() {
            return fail("catalog has no conditions".to_string());
        }

        self.symptom_index.clear();
        for (i, symptom) in self.symptoms.iter().enumerate() {
            if self.symptom_index.insert(symptom.id.clone(), i).is_some() {
                return fail(format!("duplicate symptom '{}'", symptom.id));
            }
        }

        self.condition_index.clear();
        for (i, condition) in self.conditions.iter().enumerate() {
            if self.symptom_index.contains_key(&condition.id) {
                return fail(format!("id '{}' is both a symptom and a condition", condition.id));
            }
            if self.condition_index.insert(condition.id.clone(), i).is_some() {
                return fail(format!("duplicate condition '{}'", condition.id));
            }
            if condition.edges.is_empty() {
                return fail(format!("condition '{}' has no symptom edges", condition.id));
            }
            for edge in &condition.edges {
                if !self.symptom_index.contains_key(&edge.symptom) {
                    return fail(format!(
                        "condition '{}' references unknown symptom '{}'",
                        condition.id, edge.symptom
                    ));
                }
                if !(edge.weight > 0.0 && edge.weight <= 1.0) {
                    return fail(format!(
                        "edge {} -> {} has weight {} outside (0, 1]",
                        edge.symptom, condition.id, edge.weight
                    ));
                }
            }
        }

        let mut prior_index = vec![usize::MAX; self.conditions.len()];
        for (i, rule) in self.priors.iter().enumerate() {
            let idx = self.require_condition(&rule.condition, "prior")?;
            if prior_index[idx] != usize::MAX {
                return fail(format!("duplicate prior for '{}'", rule.condition));
            }
            prior_index[idx] = i;
            let values = std::iter::once(rule.default).chain(rule.bands.iter().map(|b| b.prior));
            for p in values {
                if !(0.0..=1.0).contains(&p) {
                    return fail(format!("prior {} for '{}' outside [0, 1]", p, rule.condition));
                }
            }
        }
        if let Some(missing) = prior_index.iter().position(|&i| i == usize::MAX) {
            return fail(format!("condition '{}' has no prior", self.conditions[missing].id));
        }
        self.prior_index = prior_index;

        for rule in &self.discrete_rules {
            for delta in &rule.deltas {
                self.require_condition(&delta.condition, &rule.name)?;
                if !delta.delta.is_finite() {
                    return fail(format!("rule '{}' has a non-finite delta", rule.name));
                }
            }
        }

        for rule in &self.continuous_rules {
            for effect in &rule.effects {
                self.require_condition(&effect.condition, &rule.name)?;
                if !(effect.weight.is_finite() && effect.likelihood_scale > 0.0) {
                    return fail(format!("rule '{}' has an invalid effect", rule.name));
                }
            }
        }

        for bundle in &self.recommendations {
            self.require_condition(&bundle.condition, "recommendation")?;
            if !(0.0..1.0).contains(&bundle.threshold) {
                return fail(format!(
                    "recommendation threshold {} for '{}' outside [0, 1)",
                    bundle.threshold, bundle.condition
                ));
            }
        }

        for question in &self.initial_questions {
            if let InitialTarget::Symptom { id } = &question.target {
                if !self.symptom_index.contains_key(id) {
                    return fail(format!("initial question references unknown symptom '{}'", id));
                }
            }
        }

        Ok(self)
    }

    fn require_condition(&self, id: &str, source: &str) -> Result<usize> {
        self.condition_index.get(id).copied().ok_or_else(|| {
            EngineError::CatalogIntegrity(format!("{} references unknown condition '{}'", source, id))
        })
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn condition_index(&self, id: &str) -> Option<usize> {
        self.condition_index.get(id).copied()
    }

    pub fn condition(&self, id: &str) -> Option<&ConditionDef> {
        self.condition_index(id).map(|i| &self.conditions[i])
    }

    pub fn symptom(&self, id: &str) -> Option<&SymptomDef> {
        self.symptom_index.get(id).map(|&i| &self.symptoms[i])
    }

    /// Prior rule for the condition at `index`
    pub fn prior_rule(&self, index: usize) -> &PriorRule {
        &self.priors[self.prior_index[index]]
    }

    /// Condition labels in catalog order
    pub fn condition_ids(&self) -> impl Iterator<Item = &str> {
        self.conditions.iter().map(|c| c.id.as_str())
    }

    /// Distinct non-empty citation strings, in table order
    pub fn citations(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let all = self
            .priors
            .iter()
            .map(|p| &p.citation)
            .chain(self.discrete_rules.iter().map(|r| &r.citation));
        for citation in all {
            if !citation.is_empty() && !out.contains(citation) {
                out.push(citation.clone());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> (Vec<ConditionDef>, Vec<SymptomDef>, Vec<PriorRule>) {
        let conditions = vec![ConditionDef {
            id: "flu".into(),
            label: "Flu".into(),
            pattern: String::new(),
            edges: vec![SymptomEdge {
                symptom: "fever".into(),
                weight: 0.9,
            }],
        }];
        let symptoms = vec![SymptomDef {
            id: "fever".into(),
            label: "Fever".into(),
            probe: EvidenceProbe::Finding {
                finding: Finding::Fever,
            },
            question: "Fever?".into(),
            answer_type: AnswerType::YesNo,
        }];
        let priors = vec![PriorRule {
            condition: "flu".into(),
            default: 0.2,
            bands: vec![],
            citation: "c".into(),
        }];
        (conditions, symptoms, priors)
    }

    fn uncertain() -> UncertainBundle {
        UncertainBundle {
            action: "review".into(),
            self_care: vec![],
            red_flags: String::new(),
            note: "more questions".into(),
        }
    }

    #[test]
    fn test_tiny_catalog_validates() {
        let (c, s, p) = tiny();
        let catalog = Catalog::new("t", c, s, p, vec![], vec![], vec![], uncertain(), vec![]).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.condition_index("flu"), Some(0));
        assert_eq!(catalog.prior_rule(0).default, 0.2);
        assert_eq!(catalog.citations(), vec!["c".to_string()]);
    }

    #[test]
    fn test_edge_to_unknown_symptom_is_fatal() {
        let (mut c, s, p) = tiny();
        c[0].edges.push(SymptomEdge {
            symptom: "cough".into(),
            weight: 0.5,
        });
        let err = Catalog::new("t", c, s, p, vec![], vec![], vec![], uncertain(), vec![]).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("cough"));
    }

    #[test]
    fn test_edge_weight_out_of_range() {
        let (mut c, s, p) = tiny();
        c[0].edges[0].weight = 0.0;
        assert!(Catalog::new("t", c, s, p, vec![], vec![], vec![], uncertain(), vec![]).is_err());
    }

    #[test]
    fn test_rule_for_unknown_condition() {
        let (c, s, p) = tiny();
        let rule = DiscreteRule {
            name: "fever".into(),
            trigger: Trigger::Present {
                finding: Finding::Fever,
            },
            deltas: vec![ConditionDelta {
                condition: "pyelonephritis".into(),
                delta: 8.0,
            }],
            citation: String::new(),
        };
        let err =
            Catalog::new("t", c, s, p, vec![rule], vec![], vec![], uncertain(), vec![]).unwrap_err();
        assert!(matches!(err, EngineError::CatalogIntegrity(_)));
    }

    #[test]
    fn test_missing_prior() {
        let (c, s, _) = tiny();
        assert!(Catalog::new("t", c, s, vec![], vec![], vec![], vec![], uncertain(), vec![]).is_err());
    }

    #[test]
    fn test_prior_match() {
        let rule = PriorMatch {
            gender: Some(Gender::Male),
            min_age: Some(60),
            risk: None,
        };
        assert!(rule.matches(&PatientContext::new(65, Gender::Male)));
        assert!(!rule.matches(&PatientContext::new(55, Gender::Male)));
        assert!(!rule.matches(&PatientContext::new(65, Gender::Female)));
        assert!(PriorMatch::default().matches(&PatientContext::default()));
    }
}
