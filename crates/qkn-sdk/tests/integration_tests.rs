//! Integration tests for the Quantum Knowledge Network SDK
//!
//! Each test runs an in-process mock of the service (HTTP routes plus a
//! Socket.IO WebSocket endpoint) on an ephemeral local port.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use qkn_domain::{Method, ProblemId, SearchResults, SolveRequest};
use qkn_sdk::{ClientOptions, PushEvent, PushSubscription, QknClient, SdkError};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;

const OPEN_PACKET: &str =
    r#"0{"sid":"test-sid","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;

/// Heartbeat of 200 ms + 200 ms so a silent service is noticed quickly
const FAST_HEARTBEAT_OPEN_PACKET: &str =
    r#"0{"sid":"test-sid","upgrades":[],"pingInterval":200,"pingTimeout":200,"maxPayload":1000000}"#;

const BELL_EVENT: &str = r#"42["new_problem",{"id":2,"question":"Prepare a Bell pair","method":"quantum","result":{"00":0.5,"11":0.5},"cid":"QmBell","timestamp":"2024-01-01T00:00:00Z"}]"#;

/// How the mock Socket.IO endpoint behaves
#[derive(Clone)]
struct SocketScript {
    open: &'static str,
    accept: bool,
    events: Vec<String>,
    received: mpsc::UnboundedSender<String>,
}

async fn spawn_service(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn problem_json(id: i64, question: &str, method: &str) -> Value {
    match method {
        "quantum" => json!({
            "id": id,
            "question": question,
            "method": "quantum",
            "result": {"0": 498, "1": 526},
            "cid": format!("Qm{}", id),
            "timestamp": "2024-01-01T00:00:00"
        }),
        _ => json!({
            "id": id,
            "question": question,
            "method": "ai",
            "answer": "4",
            "cid": format!("Qm{}", id),
            "timestamp": "2024-01-01T00:00:00Z"
        }),
    }
}

async fn history_ok() -> Json<Value> {
    Json(json!([
        problem_json(3, "third", "ai"),
        problem_json(1, "first", "quantum"),
        problem_json(2, "second", "ai"),
    ]))
}

async fn solve_ok(Json(body): Json<Value>) -> impl IntoResponse {
    let method = body["method"].as_str().unwrap_or_default().to_string();
    match method.as_str() {
        "quantum" | "ai" => {
            let mut problem = problem_json(1, body["question"].as_str().unwrap_or_default(), &method);
            problem["cid"] = json!("Qm123");
            (StatusCode::OK, Json(problem))
        }
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Invalid method. Use 'quantum' or 'ai'."})),
        ),
    }
}

async fn search(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let q = params.get("q").cloned().unwrap_or_default();
    if q.is_empty() {
        return Json(json!({"message": "No stored questions yet."}));
    }
    Json(json!([{
        "question": format!("{}?", q),
        "method": "ai",
        "answer": "Correlated qubits",
        "similarity": 0.93,
        "timestamp": "2024-01-01T00:00:00",
        "cid": "QmS"
    }]))
}

async fn socket_endpoint(
    ws: WebSocketUpgrade,
    State(script): State<SocketScript>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| serve_socket(socket, script))
}

async fn serve_socket(mut socket: WebSocket, script: SocketScript) {
    if socket.send(Message::Text(script.open.into())).await.is_err() {
        return;
    }

    while let Some(Ok(message)) = socket.recv().await {
        let Message::Text(text) = message else {
            continue;
        };
        let text = text.to_string();
        let _ = script.received.send(text.clone());

        if text == "40" {
            if !script.accept {
                let _ = socket
                    .send(Message::Text(r#"44{"message":"Not authorized"}"#.into()))
                    .await;
                continue;
            }
            let _ = socket
                .send(Message::Text(r#"40{"sid":"socket-sid"}"#.into()))
                .await;
            for event in &script.events {
                let _ = socket.send(Message::Text(event.as_str().into())).await;
            }
        }
    }
}

fn service_router(script: SocketScript) -> Router {
    Router::new()
        .route("/", get(|| async { Json(json!({"message": "Quantum API is live!"})) }))
        .route("/history", get(history_ok))
        .route("/solve", post(solve_ok))
        .route("/search", get(search))
        .route("/socket.io/", get(socket_endpoint))
        .with_state(script)
}

async fn start(accept: bool, events: Vec<String>) -> (QknClient, mpsc::UnboundedReceiver<String>) {
    start_with_open(OPEN_PACKET, accept, events).await
}

async fn start_with_open(
    open: &'static str,
    accept: bool,
    events: Vec<String>,
) -> (QknClient, mpsc::UnboundedReceiver<String>) {
    let (received_tx, received_rx) = mpsc::unbounded_channel();
    let script = SocketScript {
        open,
        accept,
        events,
        received: received_tx,
    };
    let url = spawn_service(service_router(script)).await;
    (QknClient::new(&url).unwrap(), received_rx)
}

async fn next_event(subscription: &mut PushSubscription) -> PushEvent {
    tokio::time::timeout(Duration::from_secs(5), subscription.next_event())
        .await
        .expect("timed out waiting for push event")
        .expect("push channel ended")
}

async fn wait_for_frame(received: &mut mpsc::UnboundedReceiver<String>, frame: &str) {
    let wait = async {
        while let Some(text) = received.recv().await {
            if text == frame {
                return;
            }
        }
        panic!("service stopped before receiving {}", frame);
    };
    tokio::time::timeout(Duration::from_secs(5), wait)
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {}", frame));
}

/// Address nothing listens on
async fn dead_address() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

// ============================================================================
// HTTP endpoints
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let (client, _received) = start(true, vec![]).await;
    let status = client.health().await.unwrap();
    assert_eq!(status.message, "Quantum API is live!");
}

#[tokio::test]
async fn test_history_preserves_server_order() {
    let (client, _received) = start(true, vec![]).await;

    let history = client.history().await.unwrap();

    let ids: Vec<i64> = history.iter().map(|p| p.id.value()).collect();
    assert_eq!(ids, vec![3, 1, 2]);
    assert_eq!(history[1].method(), Method::Quantum);
    assert_eq!(history[1].result().unwrap().get("1"), Some(526.0));
}

#[tokio::test]
async fn test_history_server_error() {
    let app = Router::new().route(
        "/history",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "database is locked") }),
    );
    let client = QknClient::new(&spawn_service(app).await).unwrap();

    match client.history().await {
        Err(SdkError::HttpError { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "database is locked");
        }
        other => panic!("Expected HTTP error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_history_malformed_body() {
    let app = Router::new().route("/history", get(|| async { Json(json!({"rows": []})) }));
    let client = QknClient::new(&spawn_service(app).await).unwrap();

    assert!(matches!(client.history().await, Err(SdkError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_history_stored_rows() {
    // Stored quantum rows keep the counts as a dict literal under `answer`.
    let app = Router::new().route(
        "/history",
        get(|| async {
            Json(json!([
                {
                    "id": 2,
                    "question": "Prepare a Bell pair",
                    "method": "quantum",
                    "answer": "{'00': 512, '11': 512}",
                    "cid": "QmBell",
                    "timestamp": "2024-01-01 12:00:00"
                },
                {"id": 5, "method": "quantum"},
                {
                    "id": 1,
                    "question": "What is 2+2?",
                    "method": "ai",
                    "answer": "4",
                    "cid": "Qm1",
                    "timestamp": "2024-01-01 11:00:00"
                }
            ]))
        }),
    );
    let client = QknClient::new(&spawn_service(app).await).unwrap();

    let history = client.history().await.unwrap();

    let ids: Vec<i64> = history.iter().map(|p| p.id.value()).collect();
    assert_eq!(ids, vec![2, 1]);
    let dist = history[0].result().unwrap();
    assert_eq!(dist.get("00"), Some(512.0));
    assert_eq!(dist.get("11"), Some(512.0));
    assert_eq!(history[1].answer(), Some("4"));
}

#[tokio::test]
async fn test_history_unreachable_service() {
    let client = QknClient::new(&dead_address().await).unwrap();

    assert!(matches!(client.history().await, Err(SdkError::ConnectionError(_))));
}

#[tokio::test]
async fn test_solve_returns_problem() {
    let (client, _received) = start(true, vec![]).await;

    let problem = client
        .solve(&SolveRequest::new("What is 2+2?", Method::Ai))
        .await
        .unwrap();

    assert_eq!(problem.id, ProblemId::new(1));
    assert_eq!(problem.question, "What is 2+2?");
    assert_eq!(problem.answer(), Some("4"));
    assert_eq!(problem.cid.as_deref(), Some("Qm123"));
}

#[tokio::test]
async fn test_solve_error_field_on_failure_status() {
    let app = Router::new().route(
        "/solve",
        post(|| async {
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({"error": "Question too long"})),
            )
        }),
    );
    let client = QknClient::new(&spawn_service(app).await).unwrap();

    let err = client
        .solve(&SolveRequest::new("q", Method::Quantum))
        .await
        .unwrap_err();

    assert_eq!(err.service_message(), Some("Question too long"));
    assert!(matches!(err, SdkError::ServiceError { status: Some(422), .. }));
}

#[tokio::test]
async fn test_solve_error_field_on_success_status() {
    let app = Router::new().route(
        "/solve",
        post(|| async { Json(json!({"error": "Processing failed: simulator offline"})) }),
    );
    let client = QknClient::new(&spawn_service(app).await).unwrap();

    let err = client
        .solve(&SolveRequest::new("q", Method::Quantum))
        .await
        .unwrap_err();

    assert_eq!(err.service_message(), Some("Processing failed: simulator offline"));
}

#[tokio::test]
async fn test_solve_failure_without_message() {
    let app = Router::new().route("/solve", post(|| async { StatusCode::BAD_GATEWAY }));
    let client = QknClient::new(&spawn_service(app).await).unwrap();

    let err = client
        .solve(&SolveRequest::new("q", Method::Ai))
        .await
        .unwrap_err();

    assert!(err.service_message().is_none());
    assert!(matches!(err, SdkError::HttpError { status: 502, .. }));
}

#[tokio::test]
async fn test_search() {
    let (client, _received) = start(true, vec![]).await;

    let results = client.search("What is entanglement").await.unwrap();
    assert_eq!(results.hits().len(), 1);
    assert_eq!(results.hits()[0].question, "What is entanglement?");

    let empty = client.search("").await.unwrap();
    assert!(matches!(empty, SearchResults::Empty { .. }));
}

// ============================================================================
// Push channel
// ============================================================================

#[tokio::test]
async fn test_push_delivers_new_problem() {
    let (client, mut received) = start(true, vec![BELL_EVENT.to_string()]).await;
    let mut live = client.subscribe().unwrap();

    assert_eq!(next_event(&mut live).await, PushEvent::Connected);

    match next_event(&mut live).await {
        PushEvent::NewProblem(problem) => {
            assert_eq!(problem.id, ProblemId::new(2));
            assert_eq!(problem.method(), Method::Quantum);
            let dist = problem.result().unwrap();
            assert_eq!(dist.get("00"), Some(0.5));
            assert_eq!(dist.get("11"), Some(0.5));
        }
        other => panic!("Expected new problem, got {:?}", other),
    }

    live.close().await;
    wait_for_frame(&mut received, "41").await;
}

#[tokio::test]
async fn test_push_skips_malformed_and_foreign_events() {
    let events = vec![
        r#"42["new_problem",{"id":9,"method":"quantum"}]"#.to_string(),
        r#"42["other_event",{"id":10}]"#.to_string(),
        "not a packet".to_string(),
        BELL_EVENT.to_string(),
    ];
    let (client, _received) = start(true, events).await;
    let mut live = client.subscribe().unwrap();

    assert_eq!(next_event(&mut live).await, PushEvent::Connected);
    match next_event(&mut live).await {
        PushEvent::NewProblem(problem) => assert_eq!(problem.id, ProblemId::new(2)),
        other => panic!("Expected the well-formed problem, got {:?}", other),
    }

    live.close().await;
}

#[tokio::test]
async fn test_push_namespace_refused() {
    let (client, _received) = start(false, vec![]).await;
    let mut live = client.subscribe().unwrap();

    match next_event(&mut live).await {
        PushEvent::ConnectError(reason) => assert!(reason.contains("Not authorized")),
        other => panic!("Expected connect error, got {:?}", other),
    }

    // No reconnect: the channel is finished.
    let end = tokio::time::timeout(Duration::from_secs(5), live.next_event())
        .await
        .unwrap();
    assert!(end.is_none());
}

#[tokio::test]
async fn test_push_unreachable_service() {
    let client = QknClient::new(&dead_address().await).unwrap();
    let mut live = client.subscribe().unwrap();

    assert!(matches!(next_event(&mut live).await, PushEvent::ConnectError(_)));
}

#[tokio::test]
async fn test_push_connect_times_out_on_silent_endpoint() {
    // Upgrades the socket but never sends the open packet.
    let app = Router::new().route(
        "/socket.io/",
        get(|ws: WebSocketUpgrade| async move {
            ws.on_upgrade(|mut socket| async move { while let Some(Ok(_)) = socket.recv().await {} })
        }),
    );
    let url = spawn_service(app).await;
    let client = QknClient::with_options(
        &url,
        ClientOptions {
            connect_timeout: Duration::from_millis(300),
            ..ClientOptions::default()
        },
    )
    .unwrap();
    let mut live = client.subscribe().unwrap();

    match next_event(&mut live).await {
        PushEvent::ConnectError(reason) => assert!(reason.contains("timeout")),
        other => panic!("Expected connect error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_push_answers_ping_with_pong() {
    let (client, mut received) = start(true, vec!["2".to_string()]).await;
    let mut live = client.subscribe().unwrap();
    assert_eq!(next_event(&mut live).await, PushEvent::Connected);

    wait_for_frame(&mut received, "3").await;

    live.close().await;
}

#[tokio::test]
async fn test_push_heartbeat_timeout_disconnects() {
    let (client, _received) = start_with_open(FAST_HEARTBEAT_OPEN_PACKET, true, vec![]).await;
    let mut live = client.subscribe().unwrap();
    assert_eq!(next_event(&mut live).await, PushEvent::Connected);

    match next_event(&mut live).await {
        PushEvent::Disconnected(reason) => assert!(reason.contains("heartbeat")),
        other => panic!("Expected disconnect, got {:?}", other),
    }
}

#[tokio::test]
async fn test_dropping_subscription_disconnects() {
    let (client, mut received) = start(true, vec![]).await;
    let mut live = client.subscribe().unwrap();
    assert_eq!(next_event(&mut live).await, PushEvent::Connected);

    drop(live);

    wait_for_frame(&mut received, "41").await;
}
