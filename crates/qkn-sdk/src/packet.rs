//! Engine.IO v4 / Socket.IO v5 text packet codec.
//!
//! The push channel speaks Socket.IO over the Engine.IO WebSocket transport.
//! Every WebSocket text frame is one Engine.IO packet; Engine.IO `message`
//! packets carry one Socket.IO packet.
//!
//! ```text
//! 0{"sid":"..","pingInterval":25000,"pingTimeout":20000}   engine open
//! 2 / 3                                                   engine ping / pong
//! 40                                                      socket connect "/"
//! 42["new_problem",{...}]                                 socket event
//! 41                                                      socket disconnect
//! ```

use crate::error::SdkError;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Default Socket.IO namespace
pub const ROOT_NAMESPACE: &str = "/";

/// Engine.IO open-packet payload
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    /// Engine.IO session id
    pub sid: String,
    /// Transports the server could upgrade to
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Server ping period in milliseconds
    pub ping_interval: u64,
    /// Grace period after a missed ping, in milliseconds
    pub ping_timeout: u64,
    /// Largest payload the server accepts
    #[serde(default)]
    pub max_payload: Option<u64>,
}

impl Handshake {
    /// How long the connection may stay silent before it counts as lost
    pub fn heartbeat_deadline(&self) -> Duration {
        Duration::from_millis(self.ping_interval.saturating_add(self.ping_timeout))
    }
}

/// One Engine.IO packet
#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    /// Session opened by the server
    Open(Handshake),
    /// Transport close
    Close,
    /// Heartbeat ping
    Ping(String),
    /// Heartbeat reply
    Pong(String),
    /// Carries a Socket.IO packet
    Message(String),
    /// Transport upgrade
    Upgrade,
    /// No-op
    Noop,
}

impl EnginePacket {
    /// Decode a WebSocket text frame
    pub fn decode(frame: &str) -> Result<Self, SdkError> {
        let mut chars = frame.chars();
        let kind = chars
            .next()
            .ok_or_else(|| SdkError::ProtocolError("empty engine packet".to_string()))?;
        let data = chars.as_str();

        match kind {
            '0' => {
                let handshake: Handshake = serde_json::from_str(data).map_err(|e| {
                    SdkError::ProtocolError(format!("invalid open packet: {}", e))
                })?;
                Ok(EnginePacket::Open(handshake))
            }
            '1' => Ok(EnginePacket::Close),
            '2' => Ok(EnginePacket::Ping(data.to_string())),
            '3' => Ok(EnginePacket::Pong(data.to_string())),
            '4' => Ok(EnginePacket::Message(data.to_string())),
            '5' => Ok(EnginePacket::Upgrade),
            '6' => Ok(EnginePacket::Noop),
            other => Err(SdkError::ProtocolError(format!(
                "unknown engine packet type '{}'",
                other
            ))),
        }
    }

    /// Encode as a WebSocket text frame
    ///
    /// Only the packets a client sends are meaningful here; `Open` encodes
    /// to its bare type digit.
    pub fn encode(&self) -> String {
        match self {
            EnginePacket::Open(_) => "0".to_string(),
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping(data) => format!("2{}", data),
            EnginePacket::Pong(data) => format!("3{}", data),
            EnginePacket::Message(data) => format!("4{}", data),
            EnginePacket::Upgrade => "5".to_string(),
            EnginePacket::Noop => "6".to_string(),
        }
    }
}

/// One Socket.IO packet
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    /// Namespace connect request (client) or acknowledgement (server)
    Connect {
        /// Namespace
        namespace: String,
        /// Optional auth payload or server-assigned sid
        data: Option<Value>,
    },
    /// Namespace disconnect
    Disconnect {
        /// Namespace
        namespace: String,
    },
    /// Named event with arguments
    Event {
        /// Namespace
        namespace: String,
        /// Acknowledgement id, when the sender wants one
        id: Option<u64>,
        /// Event name
        name: String,
        /// Event arguments
        args: Vec<Value>,
    },
    /// Acknowledgement of an earlier event
    Ack {
        /// Namespace
        namespace: String,
        /// Id of the acknowledged event
        id: u64,
        /// Ack arguments
        args: Vec<Value>,
    },
    /// Server refused the namespace connection
    ConnectError {
        /// Namespace
        namespace: String,
        /// Reason payload, usually `{"message": ".."}`
        data: Option<Value>,
    },
}

impl SocketPacket {
    /// Connect to `namespace` without auth data
    pub fn connect(namespace: &str) -> Self {
        SocketPacket::Connect {
            namespace: namespace.to_string(),
            data: None,
        }
    }

    /// Disconnect from `namespace`
    pub fn disconnect(namespace: &str) -> Self {
        SocketPacket::Disconnect {
            namespace: namespace.to_string(),
        }
    }

    /// Namespace the packet belongs to
    pub fn namespace(&self) -> &str {
        match self {
            SocketPacket::Connect { namespace, .. }
            | SocketPacket::Disconnect { namespace }
            | SocketPacket::Event { namespace, .. }
            | SocketPacket::Ack { namespace, .. }
            | SocketPacket::ConnectError { namespace, .. } => namespace,
        }
    }

    /// Decode the payload of an Engine.IO message packet
    ///
    /// Format: `<type>[<attachments>-][<namespace>,][<ack id>][<json>]`.
    pub fn decode(payload: &str) -> Result<Self, SdkError> {
        let mut chars = payload.chars();
        let kind = chars
            .next()
            .ok_or_else(|| SdkError::ProtocolError("empty socket packet".to_string()))?;
        let mut rest = chars.as_str();

        if kind == '5' || kind == '6' {
            return Err(SdkError::ProtocolError(
                "binary socket packets are not supported".to_string(),
            ));
        }

        let namespace = if rest.starts_with('/') {
            match rest.find(',') {
                Some(idx) => {
                    let ns = &rest[..idx];
                    rest = &rest[idx + 1..];
                    ns.to_string()
                }
                None => {
                    let ns = rest.to_string();
                    rest = "";
                    ns
                }
            }
        } else {
            ROOT_NAMESPACE.to_string()
        };

        let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
        let id = if digits > 0 {
            let parsed = rest[..digits]
                .parse::<u64>()
                .map_err(|e| SdkError::ProtocolError(format!("invalid ack id: {}", e)))?;
            rest = &rest[digits..];
            Some(parsed)
        } else {
            None
        };

        let data = if rest.is_empty() {
            None
        } else {
            Some(serde_json::from_str::<Value>(rest).map_err(|e| {
                SdkError::ProtocolError(format!("invalid socket payload: {}", e))
            })?)
        };

        match kind {
            '0' => Ok(SocketPacket::Connect { namespace, data }),
            '1' => Ok(SocketPacket::Disconnect { namespace }),
            '2' => {
                let mut args = match data {
                    Some(Value::Array(items)) => items,
                    _ => {
                        return Err(SdkError::ProtocolError(
                            "event payload must be a JSON array".to_string(),
                        ))
                    }
                };
                if args.is_empty() {
                    return Err(SdkError::ProtocolError("event without a name".to_string()));
                }
                let name = match args.remove(0) {
                    Value::String(name) => name,
                    other => {
                        return Err(SdkError::ProtocolError(format!(
                            "event name must be a string, got {}",
                            other
                        )))
                    }
                };
                Ok(SocketPacket::Event {
                    namespace,
                    id,
                    name,
                    args,
                })
            }
            '3' => {
                let id = id.ok_or_else(|| {
                    SdkError::ProtocolError("ack packet without an id".to_string())
                })?;
                let args = match data {
                    Some(Value::Array(items)) => items,
                    None => Vec::new(),
                    Some(other) => vec![other],
                };
                Ok(SocketPacket::Ack {
                    namespace,
                    id,
                    args,
                })
            }
            '4' => Ok(SocketPacket::ConnectError { namespace, data }),
            other => Err(SdkError::ProtocolError(format!(
                "unknown socket packet type '{}'",
                other
            ))),
        }
    }

    /// Encode as the payload of an Engine.IO message packet
    pub fn encode(&self) -> String {
        let (kind, id, data) = match self {
            SocketPacket::Connect { data, .. } => ('0', None, data.clone()),
            SocketPacket::Disconnect { .. } => ('1', None, None),
            SocketPacket::Event { id, name, args, .. } => {
                let mut items = Vec::with_capacity(args.len() + 1);
                items.push(Value::String(name.clone()));
                items.extend(args.iter().cloned());
                ('2', *id, Some(Value::Array(items)))
            }
            SocketPacket::Ack { id, args, .. } => ('3', Some(*id), Some(Value::Array(args.clone()))),
            SocketPacket::ConnectError { data, .. } => ('4', None, data.clone()),
        };

        let mut out = String::new();
        out.push(kind);
        let namespace = self.namespace();
        if namespace != ROOT_NAMESPACE {
            out.push_str(namespace);
            out.push(',');
        }
        if let Some(id) = id {
            out.push_str(&id.to_string());
        }
        if let Some(data) = data {
            out.push_str(&data.to_string());
        }
        out
    }

    /// Wrap in an Engine.IO message frame
    pub fn into_frame(self) -> String {
        EnginePacket::Message(self.encode()).encode()
    }
}

/// Human-readable reason out of a connect-error payload
pub fn connect_error_reason(data: Option<&Value>) -> String {
    match data {
        Some(Value::Object(map)) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| Value::Object(map.clone()).to_string()),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => "connection refused".to_string(),
    }
}
