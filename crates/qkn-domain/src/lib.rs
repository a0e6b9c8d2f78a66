//! Quantum Knowledge Network Domain Layer
//!
//! Value types shared by the SDK and the CLI. Nothing here performs I/O.
//!
//! ## Key Concepts
//!
//! - **Problem**: one question/answer record, tagged by solving method
//! - **Method**: the closed set of solvers (`quantum`, `ai`)
//! - **Solution**: the solver output, whose variant always matches the method
//! - **Timestamp**: service-issued time, kept raw and parsed on demand

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod method;
pub mod problem;
pub mod service;
pub mod timestamp;

// Re-exports for convenience
pub use error::ProblemError;
pub use method::Method;
pub use problem::{Distribution, Problem, ProblemId, ProblemRecord, Solution};
pub use service::{SearchHit, SearchResults, ServiceStatus, SolveRequest};
pub use timestamp::Timestamp;
