//! Request and response shapes for the service endpoints other than problems.

use crate::{Method, Timestamp};
use serde::{Deserialize, Serialize};

/// Body of a solve request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveRequest {
    /// Question text
    pub question: String,
    /// Selected method
    pub method: Method,
}

impl SolveRequest {
    /// Create a new solve request
    pub fn new(question: impl Into<String>, method: Method) -> Self {
        Self {
            question: question.into(),
            method,
        }
    }
}

/// A stored question similar to a search query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Stored question
    pub question: String,
    /// Method it was solved with
    pub method: Method,
    /// Stored answer text (quantum outcomes arrive stringified)
    #[serde(default)]
    pub answer: String,
    /// Cosine similarity to the query
    pub similarity: f64,
    /// When the stored record was produced
    pub timestamp: Timestamp,
    /// Content identifier
    #[serde(default)]
    pub cid: Option<String>,
}

/// Reply of the search endpoint
///
/// The service answers with a plain message instead of a list when nothing
/// has been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchResults {
    /// Most similar records, best first
    Hits(Vec<SearchHit>),
    /// Nothing to search
    Empty {
        /// Service explanation
        message: String,
    },
}

impl SearchResults {
    /// Hits, or an empty slice
    pub fn hits(&self) -> &[SearchHit] {
        match self {
            SearchResults::Hits(hits) => hits,
            SearchResults::Empty { .. } => &[],
        }
    }
}

/// Reply of the health endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    /// Liveness message
    pub message: String,
}
