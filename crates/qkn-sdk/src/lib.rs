//! Quantum Knowledge Network Rust SDK
//!
//! Client library for the Quantum Knowledge Network service: submit
//! questions, read the stored history, search it, and follow newly solved
//! records over the push channel.
//!
//! # Example
//!
//! ```no_run
//! use qkn_sdk::{PushEvent, QknClient};
//! use qkn_domain::{Method, SolveRequest};
//!
//! # async fn demo() -> Result<(), qkn_sdk::SdkError> {
//! let client = QknClient::new("http://localhost:8000")?;
//!
//! let problem = client
//!     .solve(&SolveRequest::new("What is 2+2?", Method::Ai))
//!     .await?;
//! println!("{}", problem.solution);
//!
//! let mut live = client.subscribe()?;
//! while let Some(event) = live.next_event().await {
//!     if let PushEvent::NewProblem(problem) = event {
//!         println!("{}", problem.question);
//!     }
//! }
//! live.close().await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod client;
mod error;
pub mod packet;
mod push;

pub use client::{
    ClientOptions, QknClient, DEFAULT_CONNECT_TIMEOUT, DEFAULT_SERVICE_URL, DEFAULT_SOCKET_PATH,
    DEFAULT_TIMEOUT,
};
pub use error::SdkError;
pub use push::{PushEvent, PushSubscription, NEW_PROBLEM_EVENT};
