//! Differential engine: catalog + config, and the scoring pipeline.
//!
//! priors → log-odds → discrete rules → continuous rules → softmax
//!
//! The engine holds only immutable data. Every call recomputes from the
//! evidence it is given, so identical inputs give bit-identical output.

use crate::catalog::Catalog;
use crate::config::EngineConfig;
use crate::entropy::EntropySummary;
use crate::error::Result;
use crate::evidence::SymptomEvidence;
use crate::graph::{GraphSnapshot, ProbabilityGraph};
use crate::likelihood::{aggregate, Aggregate, Contribution, LogOdds};
use crate::patient::PatientContext;
use crate::posterior::{Posterior, RankedCondition};
use crate::prior::estimate_priors;
use crate::recommend::{action_plan, synthesize, ActionPlan, Recommendation};
use crate::selector::{self, QuestionPlan, QuestionSuggestion};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Intermediate products of one scoring pass
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub priors: Vec<f64>,
    pub log_odds: LogOdds,
    pub contributions: Vec<Contribution>,
    pub posterior: Posterior,
}

/// Run the full pipeline. Pure; missing evidence contributes nothing.
pub fn evaluate(catalog: &Catalog, evidence: &SymptomEvidence, patient: &PatientContext) -> Evaluation {
    let priors = estimate_priors(catalog, patient);
    let Aggregate {
        log_odds,
        contributions,
    } = aggregate(catalog, Aggregate::from_priors(catalog, &priors), evidence);
    let posterior = Posterior::from_log_odds(catalog, &log_odds);
    Evaluation {
        priors,
        log_odds,
        contributions,
        posterior,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub probabilities: BTreeMap<String, f64>,
    pub ranked: Vec<RankedCondition>,
    pub log_odds: BTreeMap<String, f64>,
    pub contributions: Vec<Contribution>,
    pub entropy: EntropySummary,
    pub recommendation: Recommendation,
    pub action_plan: ActionPlan,
    pub graph: GraphSnapshot,
    pub citations: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DifferentialEngine {
    catalog: Catalog,
    config: EngineConfig,
    graph: ProbabilityGraph,
}

impl DifferentialEngine {
    /// Fails if the catalog does not produce a consistent graph
    pub fn new(catalog: Catalog, config: EngineConfig) -> Result<Self> {
        let graph = ProbabilityGraph::from_catalog(&catalog)?;
        debug!(
            catalog = %catalog.name,
            conditions = catalog.len(),
            nodes = graph.len(),
            edges = graph.edges().len(),
            "engine ready"
        );
        Ok(Self {
            catalog,
            config,
            graph,
        })
    }

    /// Built-in urology catalog with the given config
    pub fn urology(config: EngineConfig) -> Result<Self> {
        Self::new(Catalog::urology()?, config)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn evaluate(&self, evidence: &SymptomEvidence, patient: &PatientContext) -> Evaluation {
        evaluate(&self.catalog, evidence, patient)
    }

    pub fn posterior(&self, evidence: &SymptomEvidence, patient: &PatientContext) -> Posterior {
        self.evaluate(evidence, patient).posterior
    }

    /// Fresh graph with symptom values and posterior written in
    pub fn graph_for(&self, evidence: &SymptomEvidence, patient: &PatientContext, posterior: &Posterior) -> ProbabilityGraph {
        let mut graph = self.graph.clone();
        graph.populate(&self.catalog, evidence, patient);
        graph.apply_posterior(posterior);
        graph
    }

    pub fn score(&self, evidence: &SymptomEvidence, patient: &PatientContext) -> ScoreResult {
        let evaluation = self.evaluate(evidence, patient);
        let graph = self.graph_for(evidence, patient, &evaluation.posterior);
        let recommendation = synthesize(&self.catalog, &evaluation.posterior);
        let plan = action_plan(&recommendation, patient, evidence);

        ScoreResult {
            probabilities: evaluation.posterior.to_map(),
            ranked: evaluation.posterior.ranked(),
            log_odds: self
                .catalog
                .condition_ids()
                .enumerate()
                .map(|(i, id)| (id.to_string(), evaluation.log_odds.get(i)))
                .collect(),
            contributions: evaluation.contributions,
            entropy: EntropySummary::of(evaluation.posterior.probabilities()),
            recommendation,
            action_plan: plan,
            graph: graph.snapshot(),
            citations: self.catalog.citations(),
        }
    }

    pub fn plan_questions(&self, evidence: &SymptomEvidence, patient: &PatientContext) -> QuestionPlan {
        let posterior = self.posterior(evidence, patient);
        let entropy = EntropySummary::of(posterior.probabilities()).distribution;
        let graph = self.graph_for(evidence, patient, &posterior);
        selector::plan_questions(&self.catalog, &self.config, &graph, evidence, patient, entropy)
    }

    /// Highest-gain question, if any has positive gain
    pub fn next_question(&self, evidence: &SymptomEvidence, patient: &PatientContext) -> Option<QuestionSuggestion> {
        self.plan_questions(evidence, patient).suggestions.into_iter().next()
    }

    /// Expected gain for one symptom against the current posterior
    pub fn information_gain(
        &self,
        symptom_id: &str,
        evidence: &SymptomEvidence,
        patient: &PatientContext,
    ) -> Result<f64> {
        let posterior = self.posterior(evidence, patient);
        let entropy = EntropySummary::of(posterior.probabilities()).distribution;
        selector::expected_gain(&self.catalog, &self.config, evidence, patient, symptom_id, entropy)
    }
}
