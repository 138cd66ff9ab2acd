//! Error types for the SAT layer.

use thiserror::Error;

/// Errors raised by a SAT backend.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SatError {
    /// The backend failed while solving.
    #[error("SAT backend error: {0}")]
    Backend(String),

    /// A clause referenced a variable that was never created.
    #[error("Unknown SAT variable {var} (solver has {num_vars} variables)")]
    UnknownVariable {
        /// Index of the offending variable.
        var: usize,
        /// Number of variables created so far.
        num_vars: usize,
    },

    /// The backend reported a satisfiable formula without a model.
    #[error("SAT backend returned no model for a satisfiable formula")]
    MissingModel,
}

/// Result type for SAT operations.
pub type SatResult<T> = Result<T, SatError>;
