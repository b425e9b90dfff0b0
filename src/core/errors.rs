use crate::snarks::r1cs::Variable;
use thiserror::Error;

/// Errors raised while building circuits or handling their encodings.
///
/// An unsatisfied constraint is never an error: satisfiability checks return
/// `bool` because a failing witness is an expected outcome for adversarial input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CircuitError {
    /// Configuration rejected at circuit-construction time.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// A witness value was read before it was assigned.
    #[error("variable {0} has no witness value")]
    UnassignedVariable(Variable),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl CircuitError {
    pub fn invalid_parameters(msg: &str) -> Self {
        Self::InvalidParameters(msg.to_string())
    }

    pub fn unassigned(variable: Variable) -> Self {
        Self::UnassignedVariable(variable)
    }

    pub fn encoding(msg: &str) -> Self {
        Self::Encoding(msg.to_string())
    }
}

pub type CircuitResult<T> = Result<T, CircuitError>;
