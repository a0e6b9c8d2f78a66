//! Problem module - one question/answer record
//!
//! A [`Problem`] is created by the service, either as the reply to a solve
//! request or as a push event. The client never mutates one; it only
//! collects them into lists.

use crate::{Method, ProblemError, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier assigned by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProblemId(i64);

impl ProblemId {
    /// Wrap a raw identifier
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the raw value
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ProblemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome label → probability or count, as produced by a quantum run
///
/// Labels are measurement bitstrings such as `"00"` or `"11"`. Values may be
/// normalised probabilities or raw shot counts; [`Distribution::share`]
/// normalises either way.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Distribution(BTreeMap<String, f64>);

impl Distribution {
    /// Build a distribution from `(label, value)` pairs
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Number of distinct outcomes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no outcome was recorded
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value recorded for `label`
    pub fn get(&self, label: &str) -> Option<f64> {
        self.0.get(label).copied()
    }

    /// Sum of all values
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// Fraction of the total carried by `label`, in `[0, 1]`
    pub fn share(&self, label: &str) -> Option<f64> {
        let total = self.total();
        if total <= 0.0 {
            return None;
        }
        self.get(label).map(|v| v / total)
    }

    /// Outcomes in label order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Parse a mapping written as JSON or as a Python dict literal
    /// (`{'00': 512, '11': 512}`), the form stored history rows use.
    pub fn parse_mapping(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text).or_else(|_| serde_json::from_str(&text.replace('\'', "\"")))
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (label, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            let key = serde_json::to_string(label).map_err(|_| fmt::Error)?;
            write!(f, "{}: {}", key, value)?;
        }
        f.write_str("}")
    }
}

/// What the solver produced; the variant always agrees with the method
#[derive(Debug, Clone, PartialEq)]
pub enum Solution {
    /// Outcome distribution of a quantum run
    Quantum(Distribution),

    /// Free-text answer from the AI solver
    Ai(String),
}

impl Solution {
    /// Method that produced this solution
    pub fn method(&self) -> Method {
        match self {
            Solution::Quantum(_) => Method::Quantum,
            Solution::Ai(_) => Method::Ai,
        }
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Solution::Quantum(dist) => write!(f, "{}", dist),
            Solution::Ai(answer) => f.write_str(answer),
        }
    }
}

/// One question/answer record, tagged by solving method
///
/// Exactly one of `result` (quantum) or `answer` (ai) exists on the wire;
/// here that is the [`Solution`] variant, so the invariant cannot be broken
/// after decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProblemRecord", into = "ProblemRecord")]
pub struct Problem {
    /// Service-assigned identifier
    pub id: ProblemId,

    /// Question as submitted
    pub question: String,

    /// Solver output
    pub solution: Solution,

    /// Content identifier (display only); absent until the service pins it
    pub cid: Option<String>,

    /// When the service produced the record
    pub timestamp: Timestamp,
}

impl Problem {
    /// Create a new problem record
    pub fn new(
        id: ProblemId,
        question: impl Into<String>,
        solution: Solution,
        cid: Option<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id,
            question: question.into(),
            solution,
            cid,
            timestamp,
        }
    }

    /// Method the record was solved with
    pub fn method(&self) -> Method {
        self.solution.method()
    }

    /// Outcome distribution; `Some` only for quantum records
    pub fn result(&self) -> Option<&Distribution> {
        match &self.solution {
            Solution::Quantum(dist) => Some(dist),
            Solution::Ai(_) => None,
        }
    }

    /// Text answer; `Some` only for AI records
    pub fn answer(&self) -> Option<&str> {
        match &self.solution {
            Solution::Ai(answer) => Some(answer),
            Solution::Quantum(_) => None,
        }
    }
}

/// Wire shape of a [`Problem`]
///
/// Push events from the service carry the solver output under `response`
/// rather than `result`/`answer`; it is accepted as a fallback when decoding
/// and never written back. Quantum history rows carry no `result` and keep
/// the outcome mapping as a dict literal in `answer`; that is accepted too.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemRecord {
    /// Service-assigned identifier
    pub id: ProblemId,
    /// Question as submitted
    pub question: String,
    /// Method tag
    pub method: Method,
    /// Quantum outcome distribution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Distribution>,
    /// AI answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// Untyped solver output used by push events
    #[serde(default, skip_serializing)]
    pub response: Option<serde_json::Value>,
    /// Content identifier
    #[serde(default)]
    pub cid: Option<String>,
    /// Production time
    pub timestamp: Timestamp,
}

impl TryFrom<ProblemRecord> for Problem {
    type Error = ProblemError;

    fn try_from(record: ProblemRecord) -> Result<Self, Self::Error> {
        let solution = match record.method {
            Method::Quantum => {
                let dist = match (record.result, record.answer, record.response) {
                    (Some(dist), _, _) => dist,
                    // History rows keep the outcome mapping as text under `answer`.
                    (None, Some(text), _) => Distribution::parse_mapping(&text).map_err(|e| {
                        ProblemError::MalformedSolution {
                            method: Method::Quantum,
                            field: "answer",
                            reason: e.to_string(),
                        }
                    })?,
                    (None, None, Some(serde_json::Value::String(text))) => {
                        Distribution::parse_mapping(&text).map_err(|e| {
                            ProblemError::MalformedSolution {
                                method: Method::Quantum,
                                field: "response",
                                reason: e.to_string(),
                            }
                        })?
                    }
                    (None, None, Some(value)) if !value.is_null() => serde_json::from_value(value)
                        .map_err(|e| ProblemError::MalformedSolution {
                            method: Method::Quantum,
                            field: "response",
                            reason: e.to_string(),
                        })?,
                    _ => {
                        return Err(ProblemError::MissingSolution {
                            method: Method::Quantum,
                            field: "result",
                        })
                    }
                };
                Solution::Quantum(dist)
            }
            Method::Ai => {
                let answer = match (record.answer, record.response) {
                    (Some(answer), _) => answer,
                    (None, Some(serde_json::Value::String(text))) => text,
                    (None, Some(value)) if !value.is_null() => {
                        return Err(ProblemError::MalformedSolution {
                            method: Method::Ai,
                            field: "response",
                            reason: format!("expected a string, got {}", value),
                        })
                    }
                    _ => {
                        return Err(ProblemError::MissingSolution {
                            method: Method::Ai,
                            field: "answer",
                        })
                    }
                };
                Solution::Ai(answer)
            }
        };

        Ok(Problem {
            id: record.id,
            question: record.question,
            solution,
            cid: record.cid,
            timestamp: record.timestamp,
        })
    }
}

impl From<Problem> for ProblemRecord {
    fn from(problem: Problem) -> Self {
        let method = problem.method();
        let (result, answer) = match problem.solution {
            Solution::Quantum(dist) => (Some(dist), None),
            Solution::Ai(text) => (None, Some(text)),
        };
        Self {
            id: problem.id,
            question: problem.question,
            method,
            result,
            answer,
            response: None,
            cid: problem.cid,
            timestamp: problem.timestamp,
        }
    }
}
