//! Error types.
//!
//! Construction problems and illegal transitions are errors. An infeasible
//! goal or an inconclusive search is not: those are ordinary
//! [`SolveOutcome`](crate::solver::SolveOutcome) variants.

use thiserror::Error;

use crate::models::{OperatorId, PatientId, RoleId};
use crate::validation::ValidationError;

/// Main error type for model construction, parsing and plan replay.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Malformed input detected before any transition was attempted.
    #[error("invalid model input: {}", join_messages(.0))]
    Construction(Vec<ValidationError>),

    /// A transition was applied while one of its preconditions was false.
    #[error("illegal transition: {0}")]
    Transition(#[from] TransitionError),

    /// A replayed plan is legal but does not end in a goal state.
    #[error("plan does not reach the goal")]
    GoalNotReached,

    /// Text input could not be read.
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, ModelError>;

/// A violated transition precondition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("unknown operator {0}")]
    UnknownOperator(OperatorId),

    #[error("unknown role {0}")]
    UnknownRole(RoleId),

    #[error("unknown patient {0}")]
    UnknownPatient(PatientId),

    #[error("operator {0} is already selected")]
    AlreadySelected(OperatorId),

    #[error("operator {0} is not selected")]
    NotSelected(OperatorId),

    #[error("operator {operator} is not (or no longer) eligible for role {role}")]
    NotEligible { operator: OperatorId, role: RoleId },

    #[error("patient {0} is already processed")]
    AlreadyProcessed(PatientId),

    #[error("{remaining} patient(s) still unprocessed")]
    PatientsPending { remaining: usize },

    #[error("operator {0} has already submitted its plan")]
    AlreadySubmitted(OperatorId),

    #[error("operator {operator} accumulated {accumulated}, above the limit {limit}")]
    TimeLimitExceeded {
        operator: OperatorId,
        accumulated: u64,
        limit: u64,
    },
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
