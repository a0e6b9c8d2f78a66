//! Method module - how a question gets solved

use serde::{Deserialize, Serialize};
use std::fmt;

/// Solving method for a question
///
/// The method is a closed tag: it decides which solver the service runs and
/// which field of a [`Problem`](crate::Problem) carries the outcome.
/// - Quantum: a simulated circuit, producing a distribution over outcomes
/// - Ai: a language model, producing free text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Quantum-simulated solving (the default selection)
    #[default]
    Quantum,

    /// AI-based solving
    Ai,
}

impl Method {
    /// Get the wire name of the method
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Quantum => "quantum",
            Method::Ai => "ai",
        }
    }

    /// Upper-case label used when rendering a record, e.g. `QUANTUM`
    pub fn label(&self) -> &'static str {
        match self {
            Method::Quantum => "QUANTUM",
            Method::Ai => "AI",
        }
    }

    /// Parse a method from a string, ignoring case
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "quantum" => Some(Method::Quantum),
            "ai" => Some(Method::Ai),
            _ => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = crate::ProblemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| crate::ProblemError::InvalidMethod(s.to_string()))
    }
}
