//! Quantum Knowledge Network client implementation.

use crate::error::SdkError;
use crate::packet::ROOT_NAMESPACE;
use crate::push::PushSubscription;
use qkn_domain::{Problem, SearchResults, ServiceStatus, SolveRequest};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Service address used when nothing else is configured
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8000";

/// Path the Socket.IO endpoint is mounted under
pub const DEFAULT_SOCKET_PATH: &str = "socket.io";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default limit on opening the push channel, handshake included
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

/// Client tuning knobs
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Socket.IO mount path, relative to the service URL
    pub socket_path: String,
    /// Socket.IO namespace to join
    pub namespace: String,
    /// Per-request timeout for HTTP calls
    pub timeout: Duration,
    /// Limit on dialing the push channel and completing its handshake
    pub connect_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            socket_path: DEFAULT_SOCKET_PATH.to_string(),
            namespace: ROOT_NAMESPACE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// Quantum Knowledge Network SDK client
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct QknClient {
    base_url: Url,
    http: reqwest::Client,
    options: ClientOptions,
}

impl QknClient {
    /// Create a client with default options
    pub fn new(service_url: &str) -> Result<Self, SdkError> {
        Self::with_options(service_url, ClientOptions::default())
    }

    /// Create a client with explicit options
    pub fn with_options(service_url: &str, options: ClientOptions) -> Result<Self, SdkError> {
        let base_url = parse_base_url(service_url)?;
        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| SdkError::ConnectionError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            http,
            options,
        })
    }

    /// Base URL every endpoint is resolved against
    pub fn service_url(&self) -> &Url {
        &self.base_url
    }

    /// Check that the service is up
    pub async fn health(&self) -> Result<ServiceStatus, SdkError> {
        let url = self.endpoint("")?;
        debug!(url = %url, "GET health");
        self.get_json(url).await
    }

    /// Fetch every stored record, in the order the service returns them
    ///
    /// A body that is not an array fails the whole load. Individual rows that
    /// do not decode are logged and skipped so one bad row cannot hide the
    /// rest.
    pub async fn history(&self) -> Result<Vec<Problem>, SdkError> {
        let url = self.endpoint("history")?;
        debug!(url = %url, "GET history");

        let result = self
            .get_json::<Vec<Value>>(url)
            .await
            .map(decode_rows);

        match &result {
            Ok(problems) => debug!(count = problems.len(), "History loaded"),
            Err(e) => warn!(error = %e, "History request failed"),
        }
        result
    }

    /// Submit a question and return the solved record
    pub async fn solve(&self, request: &SolveRequest) -> Result<Problem, SdkError> {
        let url = self.endpoint("solve")?;
        debug!(url = %url, method = %request.method, "POST solve");

        let result = self.post_json::<_, Problem>(url, request).await;

        match &result {
            Ok(problem) => debug!(id = %problem.id, "Question solved"),
            Err(e) => warn!(error = %e, "Solve request failed"),
        }
        result
    }

    /// Find stored questions similar to `query`
    pub async fn search(&self, query: &str) -> Result<SearchResults, SdkError> {
        let url = self.endpoint("search")?;
        debug!(url = %url, "GET search");
        let response = self.http.get(url).query(&[("q", query)]).send().await?;
        read_json(response).await
    }

    /// WebSocket URL of the push channel
    pub fn push_url(&self) -> Result<Url, SdkError> {
        let path = format!("{}/", self.options.socket_path.trim_matches('/'));
        let mut url = self.endpoint(&path)?;

        let scheme = match url.scheme() {
            "https" => "wss",
            _ => "ws",
        };
        url.set_scheme(scheme)
            .map_err(|_| SdkError::InvalidUrl(format!("cannot derive {} URL from {}", scheme, url)))?;
        url.query_pairs_mut()
            .clear()
            .append_pair("EIO", "4")
            .append_pair("transport", "websocket");
        Ok(url)
    }

    /// Open the live-update subscription
    ///
    /// Returns immediately; connection failures arrive as
    /// [`PushEvent::ConnectError`](crate::PushEvent::ConnectError). Must be
    /// called inside a Tokio runtime.
    pub fn subscribe(&self) -> Result<PushSubscription, SdkError> {
        let url = self.push_url()?;
        Ok(PushSubscription::open(
            url,
            self.options.namespace.clone(),
            self.options.connect_timeout,
        ))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, SdkError> {
        let response = self.http.get(url).send().await?;
        read_json(response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, SdkError> {
        let response = self.http.post(url).json(body).send().await?;
        read_json(response).await
    }

    fn endpoint(&self, path: &str) -> Result<Url, SdkError> {
        self.base_url
            .join(path)
            .map_err(|e| SdkError::InvalidUrl(format!("{}: {}", path, e)))
    }
}

/// Parse the service URL, keeping any path prefix as a directory.
fn parse_base_url(service_url: &str) -> Result<Url, SdkError> {
    let mut url = Url::parse(service_url.trim())
        .map_err(|e| SdkError::InvalidUrl(format!("{}: {}", service_url, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(SdkError::InvalidUrl(format!(
            "{}: scheme must be http or https",
            service_url
        )));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Decode a response body, turning service-reported failures into errors.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, SdkError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let parsed = serde_json::from_str::<Value>(&body).ok();
        return Err(match parsed.as_ref().and_then(error_message) {
            Some(message) => SdkError::ServiceError {
                status: Some(status.as_u16()),
                message,
            },
            None => SdkError::HttpError {
                status: status.as_u16(),
                body,
            },
        });
    }

    let value: Value = serde_json::from_str(&body)?;

    // The service reports solver failures as a 2xx object with only `error`.
    if value.get("id").is_none() {
        if let Some(message) = error_message(&value) {
            return Err(SdkError::ServiceError {
                status: None,
                message,
            });
        }
    }

    serde_json::from_value(value).map_err(|e| SdkError::InvalidResponse(e.to_string()))
}

/// Decode history rows one by one, dropping those that do not decode.
fn decode_rows(rows: Vec<Value>) -> Vec<Problem> {
    rows.into_iter()
        .enumerate()
        .filter_map(|(index, row)| match serde_json::from_value::<Problem>(row) {
            Ok(problem) => Some(problem),
            Err(e) => {
                warn!(index, error = %e, "Skipping malformed history row");
                None
            }
        })
        .collect()
}

/// `error` (or FastAPI's `detail`) text of a JSON object body.
fn error_message(body: &Value) -> Option<String> {
    let object = body.as_object()?;
    ["error", "detail"]
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}
