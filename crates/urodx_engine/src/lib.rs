//! Bayesian differential-diagnosis engine for lower urinary tract symptoms.
//!
//! Scores a fixed catalog of conditions from patient demographics and
//! accumulated symptom evidence, and picks the next most informative
//! question by simulated entropy reduction. Pure and synchronous: no I/O,
//! no global state. The questioning loop itself belongs to the caller.

pub mod catalog;
pub mod config;
pub mod curve;
pub mod engine;
pub mod entropy;
pub mod error;
pub mod evidence;
pub mod graph;
pub mod likelihood;
pub mod patient;
pub mod pivots;
pub mod posterior;
pub mod prior;
pub mod recommend;
pub mod selector;
pub mod urology;

pub use catalog::{Catalog, Confidence, Urgency};
pub use config::EngineConfig;
pub use engine::{evaluate, DifferentialEngine, Evaluation, ScoreResult};
pub use entropy::{binary_entropy, distribution_entropy, EntropySummary};
pub use error::{EngineError, Result};
pub use evidence::{Answer, AnswerType, CountField, Finding, Onset, SeverityField, SymptomEvidence};
pub use graph::{GraphSnapshot, NodeId, ProbabilityGraph};
pub use patient::{Gender, PatientContext, RiskFlag};
pub use pivots::{find_pivots, PivotResult};
pub use posterior::{softmax, Posterior, RankedCondition};
pub use recommend::{ActionPlan, Recommendation};
pub use selector::{QuestionPlan, QuestionSuggestion};
