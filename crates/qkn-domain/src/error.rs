//! Errors raised while building domain values from service payloads.

use crate::Method;
use thiserror::Error;

/// Domain validation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProblemError {
    /// Method tag outside the closed set
    #[error("Invalid method '{0}'. Use 'quantum' or 'ai'.")]
    InvalidMethod(String),

    /// The field required by the method is absent
    #[error("{method} record is missing its '{field}' field")]
    MissingSolution {
        /// Method of the offending record
        method: Method,
        /// Field that should have been populated
        field: &'static str,
    },

    /// The solution field is present but has the wrong shape
    #[error("{method} record has a malformed '{field}' field: {reason}")]
    MalformedSolution {
        /// Method of the offending record
        method: Method,
        /// Field that failed to decode
        field: &'static str,
        /// Decoder message
        reason: String,
    },
}
