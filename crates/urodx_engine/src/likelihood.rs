//! Likelihood aggregator.
//!
//! Discrete point rules and continuous response-curve rules add into a
//! log-odds vector aligned with catalog order. Every term is recorded as a
//! named contribution. Missing evidence contributes nothing.

use crate::catalog::{Catalog, ContinuousRule, Trigger};
use crate::evidence::SymptomEvidence;
use crate::prior::logit;
use serde::{Deserialize, Serialize};

/// Floor applied to likelihoods before taking a logarithm
pub const LIKELIHOOD_FLOOR: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionKind {
    Prior,
    Discrete,
    Continuous,
}

/// One additive log-odds term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub condition: String,
    pub source: String,
    pub kind: ContributionKind,
    pub delta: f64,
}

/// Log-odds per condition, catalog order
#[derive(Debug, Clone, PartialEq)]
pub struct LogOdds {
    values: Vec<f64>,
}

impl LogOdds {
    pub fn zeros(len: usize) -> Self {
        Self {
            values: vec![0.0; len],
        }
    }

    pub fn from_priors(priors: &[f64]) -> Self {
        Self {
            values: priors.iter().map(|&p| logit(p)).collect(),
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, index: usize) -> f64 {
        self.values[index]
    }

    pub fn add(&mut self, index: usize, delta: f64) {
        self.values[index] += delta;
    }
}

/// Log-odds together with the terms that produced them
#[derive(Debug, Clone)]
pub struct Aggregate {
    pub log_odds: LogOdds,
    pub contributions: Vec<Contribution>,
}

impl Aggregate {
    /// Start from priors, one prior contribution per condition
    pub fn from_priors(catalog: &Catalog, priors: &[f64]) -> Self {
        let log_odds = LogOdds::from_priors(priors);
        let contributions = catalog
            .conditions
            .iter()
            .enumerate()
            .map(|(i, c)| Contribution {
                condition: c.id.clone(),
                source: "prior".to_string(),
                kind: ContributionKind::Prior,
                delta: log_odds.get(i),
            })
            .collect();
        Self {
            log_odds,
            contributions,
        }
    }

    fn push(&mut self, catalog: &Catalog, condition: &str, source: &str, kind: ContributionKind, delta: f64) {
        if let Some(idx) = catalog.condition_index(condition) {
            self.log_odds.add(idx, delta);
            self.contributions.push(Contribution {
                condition: condition.to_string(),
                source: source.to_string(),
                kind,
                delta,
            });
        }
    }
}

/// Whether a discrete trigger holds for this evidence
pub fn trigger_holds(trigger: &Trigger, evidence: &SymptomEvidence) -> bool {
    match *trigger {
        Trigger::Onset { onset } => evidence.onset_speed == Some(onset),
        Trigger::Present { finding } => evidence.finding_present(finding),
        Trigger::CountAtLeast { field, threshold } => {
            evidence.count(field).map_or(false, |count| count >= threshold)
        }
    }
}

/// Add the deltas of every triggered discrete rule
pub fn apply_discrete(catalog: &Catalog, mut aggregate: Aggregate, evidence: &SymptomEvidence) -> Aggregate {
    for rule in &catalog.discrete_rules {
        if !trigger_holds(&rule.trigger, evidence) {
            continue;
        }
        for delta in &rule.deltas {
            aggregate.push(catalog, &delta.condition, &rule.name, ContributionKind::Discrete, delta.delta);
        }
    }
    aggregate
}

/// Weighted log likelihood ratio terms for one rule, or `None` when gated out
pub fn continuous_terms(rule: &ContinuousRule, evidence: &SymptomEvidence) -> Option<Vec<(String, f64)>> {
    let severity = evidence.severity(rule.field)?;
    if severity <= rule.gate {
        return None;
    }

    let s = severity as f64;
    let primary = rule.primary.eval(s);
    let alternative = rule.alternative.as_ref().map_or(1.0, |c| c.eval(s));
    let denominator = alternative.max(LIKELIHOOD_FLOOR);

    let terms = rule
        .effects
        .iter()
        .map(|effect| {
            let numerator = (effect.likelihood_scale * primary).max(LIKELIHOOD_FLOOR);
            (effect.condition.clone(), (numerator / denominator).ln() * effect.weight)
        })
        .collect();
    Some(terms)
}

/// Add every continuous rule whose severity clears its gate
pub fn apply_continuous(catalog: &Catalog, mut aggregate: Aggregate, evidence: &SymptomEvidence) -> Aggregate {
    for rule in &catalog.continuous_rules {
        let Some(terms) = continuous_terms(rule, evidence) else {
            continue;
        };
        for (condition, delta) in terms {
            aggregate.push(catalog, &condition, &rule.name, ContributionKind::Continuous, delta);
        }
    }
    aggregate
}

/// Discrete then continuous rules on top of the given log-odds
pub fn aggregate(catalog: &Catalog, start: Aggregate, evidence: &SymptomEvidence) -> Aggregate {
    let discrete = apply_discrete(catalog, start, evidence);
    apply_continuous(catalog, discrete, evidence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::{CountField, Finding, Onset, SeverityField};
    use approx::assert_abs_diff_eq;

    fn catalog() -> Catalog {
        Catalog::urology().unwrap()
    }

    fn idx(catalog: &Catalog, id: &str) -> usize {
        catalog.condition_index(id).unwrap()
    }

    #[test]
    fn test_empty_evidence_adds_nothing() {
        let catalog = catalog();
        let start = Aggregate {
            log_odds: LogOdds::zeros(catalog.len()),
            contributions: vec![],
        };
        let result = aggregate(&catalog, start, &SymptomEvidence::new());
        assert!(result.log_odds.as_slice().iter().all(|&v| v == 0.0));
        assert!(result.contributions.is_empty());
    }

    #[test]
    fn test_fever_deltas() {
        let catalog = catalog();
        let start = Aggregate {
            log_odds: LogOdds::zeros(catalog.len()),
            contributions: vec![],
        };
        let evidence = SymptomEvidence::new().with_finding(Finding::Fever, true);
        let result = apply_discrete(&catalog, start, &evidence);
        assert_abs_diff_eq!(result.log_odds.get(idx(&catalog, "prostatitis")), 7.0);
        assert_abs_diff_eq!(result.log_odds.get(idx(&catalog, "bph")), -8.0);
        assert_abs_diff_eq!(result.log_odds.get(idx(&catalog, "overactive_bladder")), -6.0);
    }

    #[test]
    fn test_nocturia_threshold() {
        let catalog = catalog();
        let zero = || Aggregate {
            log_odds: LogOdds::zeros(catalog.len()),
            contributions: vec![],
        };
        let two = SymptomEvidence::new().with_count(CountField::NocturiaPerNight, 2);
        let three = SymptomEvidence::new().with_count(CountField::NocturiaPerNight, 3);
        assert_abs_diff_eq!(apply_discrete(&catalog, zero(), &two).log_odds.get(idx(&catalog, "bph")), 0.0);
        assert_abs_diff_eq!(apply_discrete(&catalog, zero(), &three).log_odds.get(idx(&catalog, "bph")), 3.0);
    }

    #[test]
    fn test_reported_alias_triggers_finding() {
        let evidence = SymptomEvidence::new().with_reported("blood_in_urine");
        let trigger = Trigger::Present {
            finding: Finding::Hematuria,
        };
        assert!(trigger_holds(&trigger, &evidence));
        let onset = Trigger::Onset { onset: Onset::Sudden };
        assert!(!trigger_holds(&onset, &evidence));
    }

    #[test]
    fn test_dysuria_ratio_favors_uti_at_high_severity() {
        let catalog = catalog();
        let rule = &catalog.continuous_rules[0];
        let evidence = SymptomEvidence::new().with_severity(SeverityField::Dysuria, 75);
        let terms = continuous_terms(rule, &evidence).unwrap();
        let uti = terms.iter().find(|(c, _)| c == "uti").unwrap().1;
        let bph = terms.iter().find(|(c, _)| c == "bph").unwrap().1;
        assert!(uti > 0.0);
        assert!(bph < 0.0);
        // bph weight is -0.3 against uti's 0.5
        assert_abs_diff_eq!(bph, -uti * 0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_pain_gate_is_strict() {
        let catalog = catalog();
        let rule = catalog
            .continuous_rules
            .iter()
            .find(|r| r.field == SeverityField::Pain)
            .unwrap();
        let at_gate = SymptomEvidence::new().with_severity(SeverityField::Pain, 70);
        let above = SymptomEvidence::new().with_severity(SeverityField::Pain, 95);
        assert!(continuous_terms(rule, &at_gate).is_none());
        let terms = continuous_terms(rule, &above).unwrap();
        // sigmoid is near 1 at 95, so the log term is slightly negative
        assert!(terms[0].1 < 0.0 && terms[0].1 > -0.01);
    }

    #[test]
    fn test_zero_severity_is_absent() {
        let catalog = catalog();
        let evidence = SymptomEvidence::new().with_severity(SeverityField::WeakStream, 0);
        assert!(continuous_terms(&catalog.continuous_rules[1], &evidence).is_none());
    }

    #[test]
    fn test_contributions_sum_to_log_odds() {
        let catalog = catalog();
        let priors = vec![0.1; catalog.len()];
        let evidence = SymptomEvidence::new()
            .with_onset(Onset::Gradual)
            .with_severity(SeverityField::WeakStream, 85)
            .with_count(CountField::NocturiaPerNight, 4);
        let result = aggregate(&catalog, Aggregate::from_priors(&catalog, &priors), &evidence);
        for (i, id) in catalog.condition_ids().enumerate() {
            let sum: f64 = result
                .contributions
                .iter()
                .filter(|c| c.condition == id)
                .map(|c| c.delta)
                .sum();
            assert_abs_diff_eq!(sum, result.log_odds.get(i), epsilon = 1e-9);
        }
    }
}
