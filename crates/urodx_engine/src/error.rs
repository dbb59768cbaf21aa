//! Error types for the differential engine.
//!
//! Construction-time integrity errors are fatal and surfaced to the caller.
//! Per-turn scoring errors are mapped to neutral values by the selector.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Graph integrity error: {0}")]
    GraphIntegrity(String),

    #[error("Catalog integrity error: {0}")]
    CatalogIntegrity(String),

    #[error("Unknown graph node: {0}")]
    UnknownNode(String),

    #[error("Symptom already observed: {0}")]
    AlreadyObserved(String),

    #[error("Symptom has no evidence mapping: {0}")]
    UnmappedSymptom(String),

    #[error("Non-finite score while simulating '{0}'")]
    NonFiniteScore(String),

    #[error("Answer does not fit symptom '{symptom}': {reason}")]
    InvalidAnswer { symptom: String, reason: String },

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl EngineError {
    /// Stable code for callers that surface the error
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::GraphIntegrity(_) => "graph_integrity",
            EngineError::CatalogIntegrity(_) => "catalog_integrity",
            EngineError::UnknownNode(_) => "unknown_node",
            EngineError::AlreadyObserved(_) => "already_observed",
            EngineError::UnmappedSymptom(_) => "unmapped_symptom",
            EngineError::NonFiniteScore(_) => "non_finite_score",
            EngineError::InvalidAnswer { .. } => "invalid_answer",
            EngineError::Config(_) => "config",
            EngineError::Serialize(_) => "serialize",
        }
    }

    /// Fatal errors stop the caller; everything else degrades to a neutral value.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::GraphIntegrity(_)
                | EngineError::CatalogIntegrity(_)
                | EngineError::Config(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrity_errors_are_fatal() {
        assert!(EngineError::GraphIntegrity("edge".into()).is_fatal());
        assert!(EngineError::CatalogIntegrity("rule".into()).is_fatal());
        assert!(!EngineError::NonFiniteScore("fever".into()).is_fatal());
        assert!(!EngineError::UnmappedSymptom("x".into()).is_fatal());
    }

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(EngineError::UnknownNode("x".into()).code(), "unknown_node");
        let err = EngineError::InvalidAnswer {
            symptom: "fever".into(),
            reason: "expected yes/no".into(),
        };
        assert_eq!(err.code(), "invalid_answer");
        assert!(err.to_string().contains("fever"));
    }
}
