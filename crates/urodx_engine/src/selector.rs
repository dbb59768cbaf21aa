//! Entropy-driven question selection.
//!
//! FindPivots scopes the candidates; each candidate is scored by simulating
//! a "yes" and a "no" answer, rescoring the full posterior for both, and
//! taking the drop from the current entropy. Both answers are weighted
//! 0.5, an approximation that ignores how common the symptom actually is.
//!
//! Scoring a single candidate returns `Result`; failures are logged and the
//! candidate scores zero so the rest of the ranking still completes.

use crate::catalog::{Catalog, InitialTarget};
use crate::config::EngineConfig;
use crate::engine::evaluate;
use crate::entropy::distribution_entropy;
use crate::error::{EngineError, Result};
use crate::evidence::{AnswerType, EvidenceProbe, SymptomEvidence, MAX_SEVERITY};
use crate::graph::{Node, NodeId, ProbabilityGraph};
use crate::patient::PatientContext;
use crate::pivots::{find_pivots, PivotResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSuggestion {
    pub symptom_id: String,
    pub question: String,
    pub information_gain: f64,
    pub answer_type: AnswerType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

/// Gain computed for one candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub symptom_id: String,
    pub information_gain: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionPlan {
    pub current_entropy: f64,
    pub pivots: Vec<String>,
    pub working_set: Vec<String>,
    /// Every simulated candidate in traversal order
    pub candidates: Vec<CandidateScore>,
    /// Best first, positive gain only
    pub suggestions: Vec<QuestionSuggestion>,
    /// Suggestions come from the static opening list
    pub initial: bool,
}

impl QuestionPlan {
    pub fn best(&self) -> Option<&QuestionSuggestion> {
        self.suggestions.first()
    }
}

/// Symptom nodes to score: working-set symptoms themselves, and for each
/// working-set condition its incoming symptoms. Observed symptoms and
/// duplicates are dropped; order follows the working set.
pub fn candidate_symptoms(graph: &ProbabilityGraph, working_set: &[NodeId]) -> Vec<NodeId> {
    let mut out: Vec<NodeId> = Vec::new();
    let push = |id: NodeId, out: &mut Vec<NodeId>| {
        if !graph.node(id).is_observed() && !out.contains(&id) {
            out.push(id);
        }
    };

    for &id in working_set {
        match graph.node(id) {
            Node::Symptom(_) => push(id, &mut out),
            Node::Condition(_) => {
                for edge in graph.incoming(id) {
                    push(edge.from, &mut out);
                }
            }
        }
    }
    out
}

fn simulated_entropy(
    catalog: &Catalog,
    evidence: &SymptomEvidence,
    patient: &PatientContext,
    symptom_id: &str,
) -> Result<f64> {
    let evaluation = evaluate(catalog, evidence, patient);
    let entropy = distribution_entropy(evaluation.posterior.probabilities());
    if !entropy.is_finite() {
        return Err(EngineError::NonFiniteScore(symptom_id.to_string()));
    }
    Ok(entropy)
}

/// Severity used for a simulated "yes". Raised past the gate of any
/// continuous rule reading the same field, so the answer can reach it.
fn simulated_severity(catalog: &Catalog, config: &EngineConfig, probe: EvidenceProbe) -> u8 {
    let configured = config.questioning.effective_simulated_severity();
    let EvidenceProbe::Severity { field } = probe else {
        return configured;
    };
    catalog
        .continuous_rules
        .iter()
        .filter(|rule| rule.field == field)
        .map(|rule| rule.gate.saturating_add(1))
        .fold(configured, u8::max)
        .min(MAX_SEVERITY)
}

/// Expected entropy reduction from asking about `symptom_id`, floored at 0.
/// Zero for a symptom that is already observed.
pub fn expected_gain(
    catalog: &Catalog,
    config: &EngineConfig,
    evidence: &SymptomEvidence,
    patient: &PatientContext,
    symptom_id: &str,
    current_entropy: f64,
) -> Result<f64> {
    let def = catalog
        .symptom(symptom_id)
        .ok_or_else(|| EngineError::UnmappedSymptom(symptom_id.to_string()))?;

    if evidence.observed_value(def.probe, symptom_id, patient).is_known() {
        return Ok(0.0);
    }

    let severity = simulated_severity(catalog, config, def.probe);
    let count = config.questioning.effective_simulated_count();

    let (yes_evidence, yes_patient) =
        evidence.counterfactual(patient, def.probe, symptom_id, true, severity, count);
    let entropy_yes = simulated_entropy(catalog, &yes_evidence, &yes_patient, symptom_id)?;

    let (no_evidence, no_patient) =
        evidence.counterfactual(patient, def.probe, symptom_id, false, severity, count);
    let entropy_no = simulated_entropy(catalog, &no_evidence, &no_patient, symptom_id)?;

    let expected = 0.5 * entropy_yes + 0.5 * entropy_no;
    let gain = (current_entropy - expected).max(0.0);

    debug!(
        symptom = symptom_id,
        current = current_entropy,
        entropy_yes,
        entropy_no,
        gain,
        "simulated candidate"
    );
    Ok(gain)
}

/// Opening questions for when nothing is observed yet, minus any already answered
pub fn initial_questions(
    catalog: &Catalog,
    graph: &ProbabilityGraph,
    evidence: &SymptomEvidence,
) -> Vec<QuestionSuggestion> {
    catalog
        .initial_questions
        .iter()
        .filter(|q| match &q.target {
            InitialTarget::OnsetSpeed => evidence.onset_speed.is_none(),
            InitialTarget::Symptom { id } => graph
                .find(id)
                .map_or(true, |node| !graph.node(node).is_observed()),
        })
        .map(|q| QuestionSuggestion {
            symptom_id: q.id().to_string(),
            question: q.question.clone(),
            information_gain: q.information_gain,
            answer_type: q.answer_type,
            rationale: Some(q.rationale.clone()),
        })
        .collect()
}

/// Rank candidate questions for the current evidence. `graph` must already
/// hold the observed symptom values.
pub fn plan_questions(
    catalog: &Catalog,
    config: &EngineConfig,
    graph: &ProbabilityGraph,
    evidence: &SymptomEvidence,
    patient: &PatientContext,
    current_entropy: f64,
) -> QuestionPlan {
    let seeds = graph.observed_symptoms();
    if seeds.is_empty() {
        debug!("no observed symptoms, using opening questions");
        return QuestionPlan {
            current_entropy,
            pivots: Vec::new(),
            working_set: Vec::new(),
            candidates: Vec::new(),
            suggestions: initial_questions(catalog, graph, evidence),
            initial: true,
        };
    }

    let PivotResult {
        pivots,
        working_set,
        ..
    } = find_pivots(
        graph,
        &seeds,
        config.pivots.effective_bound(),
        config.pivots.effective_depth(),
    );

    let candidates: Vec<CandidateScore> = candidate_symptoms(graph, &working_set)
        .into_iter()
        .map(|id| {
            let symptom_id = graph.node(id).id();
            let gain = match expected_gain(catalog, config, evidence, patient, symptom_id, current_entropy) {
                Ok(gain) => gain,
                Err(e) => {
                    warn!(symptom = symptom_id, code = e.code(), "candidate scored as zero gain: {}", e);
                    0.0
                }
            };
            CandidateScore {
                symptom_id: symptom_id.to_string(),
                information_gain: gain,
            }
        })
        .collect();

    // Stable sort keeps first-encountered order among equal gains
    let mut ranked: Vec<&CandidateScore> = candidates.iter().filter(|c| c.information_gain > 0.0).collect();
    ranked.sort_by(|a, b| b.information_gain.total_cmp(&a.information_gain));

    let suggestions = ranked
        .into_iter()
        .take(config.questioning.effective_max_suggestions())
        .filter_map(|c| {
            let def = catalog.symptom(&c.symptom_id)?;
            Some(QuestionSuggestion {
                symptom_id: c.symptom_id.clone(),
                question: def.question.clone(),
                information_gain: c.information_gain,
                answer_type: def.answer_type,
                rationale: None,
            })
        })
        .collect();

    QuestionPlan {
        current_entropy,
        pivots: PivotResult::ids(&pivots, graph),
        working_set: PivotResult::ids(&working_set, graph),
        candidates,
        suggestions,
        initial: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::Onset;
    use crate::patient::Gender;

    fn setup(evidence: &SymptomEvidence, patient: &PatientContext) -> (Catalog, ProbabilityGraph, f64) {
        let catalog = Catalog::urology().unwrap();
        let mut graph = ProbabilityGraph::from_catalog(&catalog).unwrap();
        graph.populate(&catalog, evidence, patient);
        let entropy = distribution_entropy(evaluate(&catalog, evidence, patient).posterior.probabilities());
        (catalog, graph, entropy)
    }

    #[test]
    fn test_no_evidence_falls_back_to_opening_questions() {
        let evidence = SymptomEvidence::new();
        let patient = PatientContext::default();
        let (catalog, graph, entropy) = setup(&evidence, &patient);
        let plan = plan_questions(&catalog, &EngineConfig::default(), &graph, &evidence, &patient, entropy);
        assert!(plan.initial);
        assert!(plan.working_set.is_empty());
        let ids: Vec<&str> = plan.suggestions.iter().map(|s| s.symptom_id.as_str()).collect();
        assert_eq!(ids, vec!["onset_speed", "pain_burning"]);
        assert_eq!(plan.suggestions[0].answer_type, AnswerType::Categorical);
    }

    #[test]
    fn test_answered_onset_is_not_asked_again() {
        let evidence = SymptomEvidence::new().with_onset(Onset::Sudden);
        let patient = PatientContext::default();
        let (catalog, graph, entropy) = setup(&evidence, &patient);
        let plan = plan_questions(&catalog, &EngineConfig::default(), &graph, &evidence, &patient, entropy);
        assert_eq!(plan.suggestions.len(), 1);
        assert_eq!(plan.suggestions[0].symptom_id, "pain_burning");
    }

    #[test]
    fn test_candidates_exclude_observed() {
        let evidence = SymptomEvidence::new().with_reported("urgency").with_reported("frequency");
        let patient = PatientContext::new(55, Gender::Male);
        let (catalog, graph, entropy) = setup(&evidence, &patient);
        let plan = plan_questions(&catalog, &EngineConfig::default(), &graph, &evidence, &patient, entropy);
        assert!(!plan.initial);
        assert!(!plan.candidates.is_empty());
        for candidate in &plan.candidates {
            assert_ne!(candidate.symptom_id, "urgency");
            assert_ne!(candidate.symptom_id, "frequency");
            assert!(candidate.information_gain >= 0.0);
        }
        assert!(plan.suggestions.len() <= 3);
        for pair in plan.suggestions.windows(2) {
            assert!(pair[0].information_gain >= pair[1].information_gain);
        }
    }

    #[test]
    fn test_observed_symptom_has_zero_gain() {
        let evidence = SymptomEvidence::new().with_reported("urgency");
        let patient = PatientContext::default();
        let (catalog, _, entropy) = setup(&evidence, &patient);
        let gain =
            expected_gain(&catalog, &EngineConfig::default(), &evidence, &patient, "urgency", entropy).unwrap();
        assert_eq!(gain, 0.0);
    }

    #[test]
    fn test_unmapped_symptom_is_an_error() {
        let evidence = SymptomEvidence::new();
        let patient = PatientContext::default();
        let (catalog, _, entropy) = setup(&evidence, &patient);
        let err = expected_gain(&catalog, &EngineConfig::default(), &evidence, &patient, "weight_loss", entropy)
            .unwrap_err();
        assert_eq!(err.code(), "unmapped_symptom");
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_simulated_severity_clears_rule_gates() {
        let catalog = Catalog::urology().unwrap();
        let config = EngineConfig::default();
        let pain = EvidenceProbe::Severity { field: crate::evidence::SeverityField::Pain };
        let weak = EvidenceProbe::Severity { field: crate::evidence::SeverityField::WeakStream };
        assert_eq!(simulated_severity(&catalog, &config, pain), 71);
        assert_eq!(simulated_severity(&catalog, &config, weak), 70);
    }

    #[test]
    fn test_severe_pain_is_informative_when_stones_are_possible() {
        let evidence = SymptomEvidence::new().with_reported("pelvic_pain");
        let patient = PatientContext::new(55, Gender::Male);
        let (catalog, graph, entropy) = setup(&evidence, &patient);

        let gain =
            expected_gain(&catalog, &EngineConfig::default(), &evidence, &patient, "severe_pain", entropy).unwrap();
        assert!(gain > 0.0);

        let plan = plan_questions(&catalog, &EngineConfig::default(), &graph, &evidence, &patient, entropy);
        let scored = plan.candidates.iter().find(|c| c.symptom_id == "severe_pain").unwrap();
        assert!(scored.information_gain > 0.0);
    }

    #[test]
    fn test_rated_dysuria_is_not_asked_again() {
        let evidence = SymptomEvidence::new()
            .with_onset(Onset::Sudden)
            .with_severity(crate::evidence::SeverityField::Dysuria, 75)
            .with_finding(crate::evidence::Finding::Fever, false);
        let patient = PatientContext::new(28, Gender::Female);
        let (catalog, graph, entropy) = setup(&evidence, &patient);

        let plan = plan_questions(&catalog, &EngineConfig::default(), &graph, &evidence, &patient, entropy);
        assert!(plan.suggestions.iter().all(|s| s.symptom_id != "pain_burning"));
        assert!(plan.candidates.iter().all(|c| c.symptom_id != "pain_burning"));
        let gain =
            expected_gain(&catalog, &EngineConfig::default(), &evidence, &patient, "pain_burning", entropy).unwrap();
        assert_eq!(gain, 0.0);
    }

    #[test]
    fn test_failed_candidate_scores_zero_and_ranking_continues() {
        // weight_loss is in the graph but not in the catalog
        let mut graph = crate::graph::GraphBuilder::new()
            .symptom("urgency", "Urgency")
            .symptom("weight_loss", "Weight loss")
            .symptom("fever", "Fever")
            .condition("overactive_bladder", "Overactive bladder")
            .edge("urgency", "overactive_bladder", 0.9)
            .edge("weight_loss", "overactive_bladder", 0.5)
            .edge("fever", "overactive_bladder", 0.5)
            .build()
            .unwrap();
        graph.observe("urgency", crate::evidence::SymptomValue::Flag(true)).unwrap();

        let evidence = SymptomEvidence::new().with_reported("urgency");
        let patient = PatientContext::new(55, Gender::Male);
        let catalog = Catalog::urology().unwrap();
        let entropy = distribution_entropy(evaluate(&catalog, &evidence, &patient).posterior.probabilities());

        let plan = plan_questions(&catalog, &EngineConfig::default(), &graph, &evidence, &patient, entropy);
        let ids: Vec<&str> = plan.candidates.iter().map(|c| c.symptom_id.as_str()).collect();
        assert_eq!(ids, vec!["weight_loss", "fever"]);
        assert_eq!(plan.candidates[0].information_gain, 0.0);
        assert!(plan.candidates[1].information_gain > 0.0);
        assert_eq!(plan.suggestions.len(), 1);
        assert_eq!(plan.suggestions[0].symptom_id, "fever");
    }

    #[test]
    fn test_candidate_expansion_follows_edges() {
        let evidence = SymptomEvidence::new().with_reported("pelvic_pain");
        let patient = PatientContext::default();
        let (_, graph, _) = setup(&evidence, &patient);
        let stones = graph.find("kidney_stones").unwrap();
        let ids: Vec<&str> = candidate_symptoms(&graph, &[stones])
            .into_iter()
            .map(|id| graph.node(id).id())
            .collect();
        assert_eq!(ids, vec!["blood_in_urine", "severe_pain"]);
    }
}
