//! Error types for the Quantum Knowledge Network SDK.

use thiserror::Error;

/// SDK operation errors
#[derive(Debug, Error)]
pub enum SdkError {
    /// Network failure reaching the service (DNS, refused, reset)
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Request exceeded the configured timeout
    #[error("Request timeout")]
    Timeout,

    /// Non-2xx response without an error message in the body
    #[error("HTTP {status}: {body}")]
    HttpError {
        /// Response status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// The service reported a failure with its own message
    #[error("{message}")]
    ServiceError {
        /// Response status code, when the failure was not a 2xx
        status: Option<u16>,
        /// Message supplied by the service
        message: String,
    },

    /// Body did not decode into the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Push channel transport failure
    #[error("Push channel error: {0}")]
    PushError(String),

    /// Malformed Engine.IO / Socket.IO packet
    #[error("Protocol error: {0}")]
    ProtocolError(String),

    /// Service URL cannot be used
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl SdkError {
    /// Message supplied by the service, if the failure carried one
    pub fn service_message(&self) -> Option<&str> {
        match self {
            SdkError::ServiceError { message, .. } => Some(message),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SdkError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SdkError::Timeout
        } else if e.is_decode() {
            SdkError::InvalidResponse(e.to_string())
        } else if e.is_status() {
            match e.status() {
                Some(status) => SdkError::HttpError {
                    status: status.as_u16(),
                    body: e.to_string(),
                },
                None => SdkError::ConnectionError(e.to_string()),
            }
        } else {
            SdkError::ConnectionError(e.to_string())
        }
    }
}

impl From<serde_json::Error> for SdkError {
    fn from(e: serde_json::Error) -> Self {
        SdkError::InvalidResponse(format!("JSON parsing error: {}", e))
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for SdkError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        SdkError::PushError(e.to_string())
    }
}
