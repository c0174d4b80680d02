//! Graph store error types.

use std::time::Duration;

use subjects_core::SubjectsError;
use thiserror::Error;

/// Errors surfaced by the store gateways and the reconciliation engine.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Neo4j error: {0}")]
    Neo4j(#[from] neo4rs::Error),

    #[error("Statement {index} failed: {source}")]
    Execution {
        index: usize,
        #[source]
        source: Box<GraphError>,
    },

    #[error("Statement rejected by the store: {0}")]
    Rejected(String),

    #[error("Failed to ensure constraint on ({label}, {property}): {reason}")]
    ConstraintSetup {
        label: String,
        property: String,
        reason: String,
    },

    #[error("Constraint violated: ({label}, {property}) already holds '{value}'")]
    ConstraintViolation {
        label: String,
        property: String,
        value: String,
    },

    #[error("Graph store did not respond within {0:?}")]
    Timeout(Duration),

    #[error("Graph store unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to decode result row: {0}")]
    Decode(String),

    #[error(transparent)]
    Input(#[from] SubjectsError),
}

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

impl GraphError {
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn execution(index: usize, source: GraphError) -> Self {
        Self::Execution {
            index,
            source: Box::new(source),
        }
    }

    /// Input errors are raised before any statement reaches the store.
    pub fn is_input(&self) -> bool {
        matches!(self, Self::Input(_))
    }
}
