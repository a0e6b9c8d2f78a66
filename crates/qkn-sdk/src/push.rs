//! Live-update subscription over the service's Socket.IO push channel.
//!
//! [`PushSubscription`] owns one background task holding the WebSocket.
//! Dialing happens inside that task, so opening a subscription never fails;
//! an unreachable service shows up as a [`PushEvent::ConnectError`]. There is
//! no reconnect: once the connection is gone the subscription stays closed.

use crate::error::SdkError;
use crate::packet::{connect_error_reason, EnginePacket, Handshake, SocketPacket};
use futures_util::{SinkExt, StreamExt};
use qkn_domain::Problem;
use reqwest::Url;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

/// Event name the service broadcasts new records under
pub const NEW_PROBLEM_EVENT: &str = "new_problem";

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Something that happened on the push channel
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    /// Namespace connection acknowledged by the service
    Connected,

    /// A newly solved record was broadcast
    NewProblem(Problem),

    /// The connection could not be established or was refused
    ConnectError(String),

    /// An established connection was lost
    Disconnected(String),
}

/// Handle to a live push-channel connection
///
/// The connection is released exactly once: by [`PushSubscription::close`],
/// or when the handle is dropped.
pub struct PushSubscription {
    events: mpsc::UnboundedReceiver<PushEvent>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PushSubscription {
    /// Spawn the connection task. Must be called inside a Tokio runtime.
    pub(crate) fn open(url: Url, namespace: String, connect_timeout: Duration) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(run_channel(
            url,
            namespace,
            connect_timeout,
            events_tx,
            shutdown_rx,
        ));

        Self {
            events: events_rx,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    /// Wait for the next event; `None` once the channel is finished
    pub async fn next_event(&mut self) -> Option<PushEvent> {
        self.events.recv().await
    }

    /// Disconnect gracefully and wait for the connection task to finish
    pub async fn close(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Push channel task ended abnormally");
            }
        }
    }
}

impl Drop for PushSubscription {
    fn drop(&mut self) {
        // The task sends the disconnect packets on its own once signalled.
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

async fn run_channel(
    url: Url,
    namespace: String,
    connect_timeout: Duration,
    events: mpsc::UnboundedSender<PushEvent>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let (mut socket, handshake) = tokio::select! {
        _ = &mut shutdown => {
            debug!("Push channel closed before it connected");
            return;
        }
        dialed = tokio::time::timeout(connect_timeout, dial(&url, &namespace)) => match dialed {
            Ok(Ok(connection)) => connection,
            Err(_) => {
                warn!(url = %url, timeout = ?connect_timeout, "Push channel connect timed out");
                let _ = events.send(PushEvent::ConnectError("connect timeout".to_string()));
                return;
            }
            Ok(Err(e)) => {
                warn!(url = %url, error = %e, "Push channel connect failed");
                let _ = events.send(PushEvent::ConnectError(e.to_string()));
                return;
            }
        }
    };

    info!(sid = %handshake.sid, "Push channel connected");
    let _ = events.send(PushEvent::Connected);
    let deadline = handshake.heartbeat_deadline();

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                disconnect(&mut socket, &namespace).await;
                info!("Push channel closed");
                return;
            }
            frame = tokio::time::timeout(deadline, socket.next()) => {
                let outcome = match frame {
                    Err(_) => FrameOutcome::Lost("heartbeat timeout".to_string()),
                    Ok(None) => FrameOutcome::Lost("connection closed".to_string()),
                    Ok(Some(Err(e))) => FrameOutcome::Lost(e.to_string()),
                    Ok(Some(Ok(Message::Close(_)))) => {
                        FrameOutcome::Lost("closed by service".to_string())
                    }
                    Ok(Some(Ok(Message::Text(text)))) => {
                        handle_frame(&mut socket, &namespace, &text, &events).await
                    }
                    Ok(Some(Ok(_))) => FrameOutcome::Continue,
                };

                match outcome {
                    FrameOutcome::Continue => {}
                    FrameOutcome::Lost(reason) => {
                        warn!(reason = %reason, "Push channel lost");
                        let _ = events.send(PushEvent::Disconnected(reason));
                        return;
                    }
                    FrameOutcome::Refused(reason) => {
                        warn!(reason = %reason, "Push channel refused by service");
                        let _ = events.send(PushEvent::ConnectError(reason));
                        return;
                    }
                }
            }
        }
    }
}

/// Open the WebSocket, read the Engine.IO handshake and join `namespace`.
async fn dial(url: &Url, namespace: &str) -> Result<(Socket, Handshake), SdkError> {
    debug!(url = %url, "Dialing push channel");
    let (mut socket, _response) = connect_async(url.as_str())
        .await
        .map_err(|e| SdkError::ConnectionError(e.to_string()))?;

    let handshake = match next_packet(&mut socket).await? {
        EnginePacket::Open(handshake) => handshake,
        other => {
            return Err(SdkError::ProtocolError(format!(
                "expected open packet, got {:?}",
                other
            )))
        }
    };

    socket
        .send(Message::Text(SocketPacket::connect(namespace).into_frame()))
        .await?;

    loop {
        match next_packet(&mut socket).await? {
            EnginePacket::Ping(data) => {
                socket
                    .send(Message::Text(EnginePacket::Pong(data).encode()))
                    .await?;
            }
            EnginePacket::Message(payload) => match SocketPacket::decode(&payload)? {
                SocketPacket::Connect { namespace: ns, .. } if ns == namespace => {
                    return Ok((socket, handshake));
                }
                SocketPacket::ConnectError { namespace: ns, data } if ns == namespace => {
                    return Err(SdkError::PushError(connect_error_reason(data.as_ref())));
                }
                other => debug!(packet = ?other, "Ignoring packet before namespace connect"),
            },
            EnginePacket::Close => {
                return Err(SdkError::PushError(
                    "service closed the session during handshake".to_string(),
                ))
            }
            _ => {}
        }
    }
}

/// Read frames until one decodes as an Engine.IO packet.
async fn next_packet(socket: &mut Socket) -> Result<EnginePacket, SdkError> {
    loop {
        match socket.next().await {
            Some(Ok(Message::Text(text))) => return EnginePacket::decode(&text),
            Some(Ok(Message::Close(_))) | None => {
                return Err(SdkError::PushError(
                    "connection closed during handshake".to_string(),
                ))
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(e.into()),
        }
    }
}

enum FrameOutcome {
    Continue,
    Lost(String),
    Refused(String),
}

/// Apply one text frame received after the namespace connect.
async fn handle_frame(
    socket: &mut Socket,
    namespace: &str,
    text: &str,
    events: &mpsc::UnboundedSender<PushEvent>,
) -> FrameOutcome {
    let packet = match EnginePacket::decode(text) {
        Ok(packet) => packet,
        Err(e) => {
            warn!(error = %e, "Skipping undecodable frame");
            return FrameOutcome::Continue;
        }
    };

    match packet {
        EnginePacket::Ping(data) => {
            match socket
                .send(Message::Text(EnginePacket::Pong(data).encode()))
                .await
            {
                Ok(()) => FrameOutcome::Continue,
                Err(e) => FrameOutcome::Lost(e.to_string()),
            }
        }
        EnginePacket::Close => FrameOutcome::Lost("session closed by service".to_string()),
        EnginePacket::Message(payload) => match SocketPacket::decode(&payload) {
            Ok(packet) if packet.namespace() != namespace => FrameOutcome::Continue,
            Ok(SocketPacket::Event { name, args, .. }) if name == NEW_PROBLEM_EVENT => {
                match args.into_iter().next() {
                    Some(payload) => match serde_json::from_value::<Problem>(payload) {
                        Ok(problem) => {
                            debug!(id = %problem.id, "Received new problem");
                            let _ = events.send(PushEvent::NewProblem(problem));
                        }
                        Err(e) => warn!(error = %e, "Skipping malformed new_problem payload"),
                    },
                    None => warn!("new_problem event without a payload"),
                }
                FrameOutcome::Continue
            }
            Ok(SocketPacket::Event { name, .. }) => {
                debug!(event = %name, "Ignoring unsubscribed event");
                FrameOutcome::Continue
            }
            Ok(SocketPacket::Disconnect { .. }) => {
                FrameOutcome::Lost("disconnected by service".to_string())
            }
            Ok(SocketPacket::ConnectError { data, .. }) => {
                FrameOutcome::Refused(connect_error_reason(data.as_ref()))
            }
            Ok(_) => FrameOutcome::Continue,
            Err(e) => {
                warn!(error = %e, "Skipping undecodable socket packet");
                FrameOutcome::Continue
            }
        },
        _ => FrameOutcome::Continue,
    }
}

async fn disconnect(socket: &mut Socket, namespace: &str) {
    let frames = [
        SocketPacket::disconnect(namespace).into_frame(),
        EnginePacket::Close.encode(),
    ];
    for frame in frames {
        if let Err(e) = socket.send(Message::Text(frame)).await {
            debug!(error = %e, "Push channel already gone while disconnecting");
            return;
        }
    }
    let _ = socket.close(None).await;
}
