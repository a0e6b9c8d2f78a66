//! Client view state.
//!
//! [`ClientView`] holds what the user sees: the question being typed, the
//! selected method, the live and history lists, a loading flag and one error
//! banner. It performs no I/O. Callers run the network calls and feed the
//! outcomes back through the `apply_*` / `finish_*` methods, so every state
//! change happens on whichever single task owns the view.

use crate::error::{CliError, Result};
use qkn_domain::{Method, Problem, SolveRequest};
use qkn_sdk::{PushEvent, SdkError};
use std::collections::VecDeque;

/// Banner shown when the history snapshot cannot be loaded
pub const HISTORY_LOAD_FAILED: &str = "Failed to load history";

/// Banner shown when the push channel fails
pub const LIVE_DISCONNECTED: &str = "Live updates disconnected";

/// Banner shown when a submit fails without a service-supplied message
pub const SUBMIT_FAILED: &str = "An unexpected error occurred. Please try again.";

/// State of the question form and the two result lists.
#[derive(Debug, Default)]
pub struct ClientView {
    question: String,
    method: Method,
    live: VecDeque<Problem>,
    history: Vec<Problem>,
    loading: bool,
    error: Option<String>,
    live_connected: bool,
}

impl ClientView {
    /// Empty view with the default method selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pending question text.
    pub fn question(&self) -> &str {
        &self.question
    }

    /// Replace the pending question text.
    pub fn set_question(&mut self, question: impl Into<String>) {
        self.question = question.into();
    }

    /// Selected method.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Select a method for the next submission.
    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    /// Live records, most recent first.
    pub fn live(&self) -> &VecDeque<Problem> {
        &self.live
    }

    /// History records, in service order.
    pub fn history(&self) -> &[Problem] {
        &self.history
    }

    /// Whether a submission is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Current error banner.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the push channel has acknowledged the connection.
    pub fn is_live_connected(&self) -> bool {
        self.live_connected
    }

    /// Clear the error banner.
    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Start a submission.
    ///
    /// Rejects an empty question and a second submission while one is in
    /// flight; neither touches the network. On success the banner is cleared,
    /// `loading` is set, and the request to send is returned.
    pub fn begin_submit(&mut self) -> Result<SolveRequest> {
        if self.loading {
            return Err(CliError::Busy);
        }
        if self.question.trim().is_empty() {
            return Err(CliError::InvalidInput("Please enter a question".to_string()));
        }

        self.error = None;
        self.loading = true;
        Ok(SolveRequest::new(self.question.clone(), self.method))
    }

    /// Finish a submission started with [`ClientView::begin_submit`].
    pub fn finish_submit(&mut self, outcome: std::result::Result<Problem, SdkError>) {
        match outcome {
            Ok(problem) => {
                self.live.push_front(problem);
                self.question.clear();
            }
            Err(e) => {
                let message = e.service_message().unwrap_or(SUBMIT_FAILED).to_string();
                self.error = Some(message);
            }
        }
        self.loading = false;
    }

    /// Apply the outcome of a history fetch.
    ///
    /// Success replaces the list wholesale; failure leaves it as it was.
    pub fn apply_history(&mut self, outcome: std::result::Result<Vec<Problem>, SdkError>) {
        match outcome {
            Ok(problems) => self.history = problems,
            Err(_) => self.error = Some(HISTORY_LOAD_FAILED.to_string()),
        }
    }

    /// Apply one push-channel event.
    ///
    /// Returns the record that was prepended, if any. Errors never clear a
    /// list.
    pub fn apply_push(&mut self, event: PushEvent) -> Option<&Problem> {
        match event {
            PushEvent::Connected => {
                self.live_connected = true;
                None
            }
            PushEvent::NewProblem(problem) => {
                self.live.push_front(problem);
                self.live.front()
            }
            PushEvent::ConnectError(_) | PushEvent::Disconnected(_) => {
                self.live_connected = false;
                self.error = Some(LIVE_DISCONNECTED.to_string());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qkn_domain::{Distribution, ProblemId, Solution, Timestamp};

    fn ai_problem(id: i64, question: &str, answer: &str) -> Problem {
        Problem::new(
            ProblemId::new(id),
            question,
            Solution::Ai(answer.to_string()),
            Some("Qm123".to_string()),
            Timestamp::new("2024-01-01T00:00:00Z"),
        )
    }

    fn quantum_problem(id: i64) -> Problem {
        Problem::new(
            ProblemId::new(id),
            "Prepare a Bell pair",
            Solution::Quantum(Distribution::from_pairs([("00", 0.5), ("11", 0.5)])),
            Some("QmBell".to_string()),
            Timestamp::new("2024-01-01T00:00:00Z"),
        )
    }

    fn live_ids(view: &ClientView) -> Vec<i64> {
        view.live().iter().map(|p| p.id.value()).collect()
    }

    #[test]
    fn test_new_view_defaults() {
        let view = ClientView::new();
        assert_eq!(view.method(), Method::Quantum);
        assert!(view.live().is_empty());
        assert!(view.history().is_empty());
        assert!(!view.is_loading());
        assert!(view.error().is_none());
    }

    #[test]
    fn test_successful_submit_prepends_and_clears_question() {
        let mut view = ClientView::new();
        view.apply_push(PushEvent::NewProblem(quantum_problem(7)));
        view.set_question("What is 2+2?");
        view.set_method(Method::Ai);

        let request = view.begin_submit().unwrap();
        assert_eq!(request, SolveRequest::new("What is 2+2?", Method::Ai));
        assert!(view.is_loading());

        view.finish_submit(Ok(ai_problem(1, "What is 2+2?", "4")));

        assert_eq!(live_ids(&view), vec![1, 7]);
        assert_eq!(view.question(), "");
        assert!(!view.is_loading());
        assert!(view.error().is_none());
    }

    #[test]
    fn test_empty_question_is_rejected_without_loading() {
        let mut view = ClientView::new();
        view.set_question("   ");

        assert!(matches!(view.begin_submit(), Err(CliError::InvalidInput(_))));
        assert!(!view.is_loading());
    }

    #[test]
    fn test_second_submit_while_loading_is_rejected() {
        let mut view = ClientView::new();
        view.set_question("q");
        view.begin_submit().unwrap();

        assert!(matches!(view.begin_submit(), Err(CliError::Busy)));
        assert!(view.is_loading());
    }

    #[test]
    fn test_submit_clears_previous_error() {
        let mut view = ClientView::new();
        view.apply_history(Err(SdkError::ConnectionError("refused".into())));
        assert_eq!(view.error(), Some(HISTORY_LOAD_FAILED));

        view.set_question("q");
        view.begin_submit().unwrap();
        assert!(view.error().is_none());
    }

    #[test]
    fn test_failed_submit_uses_service_message() {
        let mut view = ClientView::new();
        view.set_question("q");
        view.begin_submit().unwrap();

        view.finish_submit(Err(SdkError::ServiceError {
            status: Some(400),
            message: "Invalid method. Use 'quantum' or 'ai'.".to_string(),
        }));

        assert_eq!(view.error(), Some("Invalid method. Use 'quantum' or 'ai'."));
        assert!(!view.is_loading());
        assert_eq!(view.question(), "q");
        assert!(view.live().is_empty());
    }

    #[test]
    fn test_failed_submit_falls_back_to_generic_message() {
        let mut view = ClientView::new();
        view.set_question("q");
        view.begin_submit().unwrap();

        view.finish_submit(Err(SdkError::HttpError {
            status: 502,
            body: "Bad Gateway".to_string(),
        }));

        assert_eq!(view.error(), Some(SUBMIT_FAILED));
        assert!(!view.is_loading());
    }

    #[test]
    fn test_history_replaces_in_server_order() {
        let mut view = ClientView::new();
        view.apply_history(Ok(vec![ai_problem(9, "old", "x")]));

        view.apply_history(Ok(vec![
            ai_problem(3, "c", "x"),
            quantum_problem(1),
            ai_problem(2, "b", "x"),
        ]));

        let ids: Vec<i64> = view.history().iter().map(|p| p.id.value()).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_history_failure_sets_banner_and_keeps_list() {
        let mut view = ClientView::new();
        view.apply_history(Err(SdkError::HttpError {
            status: 500,
            body: String::new(),
        }));

        assert_eq!(view.error(), Some(HISTORY_LOAD_FAILED));
        assert!(view.history().is_empty());
    }

    #[test]
    fn test_push_prepends_while_submit_in_flight() {
        let mut view = ClientView::new();
        view.set_question("What is 2+2?");
        view.begin_submit().unwrap();

        let pushed = view.apply_push(PushEvent::NewProblem(quantum_problem(2)));
        assert_eq!(pushed.map(|p| p.id.value()), Some(2));
        assert!(view.is_loading());

        view.finish_submit(Ok(ai_problem(1, "What is 2+2?", "4")));
        assert_eq!(live_ids(&view), vec![1, 2]);
    }

    #[test]
    fn test_push_error_keeps_lists() {
        let mut view = ClientView::new();
        view.apply_history(Ok(vec![ai_problem(1, "a", "x")]));
        view.apply_push(PushEvent::Connected);
        view.apply_push(PushEvent::NewProblem(quantum_problem(2)));
        assert!(view.is_live_connected());

        view.apply_push(PushEvent::ConnectError("refused".into()));

        assert_eq!(view.error(), Some(LIVE_DISCONNECTED));
        assert!(!view.is_live_connected());
        assert_eq!(view.history().len(), 1);
        assert_eq!(view.live().len(), 1);
    }

    #[test]
    fn test_duplicate_ids_are_not_deduplicated() {
        let mut view = ClientView::new();
        view.apply_push(PushEvent::NewProblem(quantum_problem(2)));
        view.apply_push(PushEvent::NewProblem(quantum_problem(2)));
        view.apply_history(Ok(vec![quantum_problem(2)]));

        assert_eq!(view.live().len(), 2);
        assert_eq!(view.history().len(), 1);
    }

    #[test]
    fn test_dismiss_error() {
        let mut view = ClientView::new();
        view.apply_push(PushEvent::Disconnected("heartbeat timeout".into()));
        view.dismiss_error();
        assert!(view.error().is_none());
    }
}
