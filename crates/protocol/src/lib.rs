//! WebSocket wire protocol for the agent chat channel.
//!
//! Every frame is a JSON object with a `type` discriminator:
//!
//! - client → server: `agent_connect { agentId }`, `agent_message { content }`
//! - server → client: `connection_established { agentId, sessionId }`,
//!   `agent_response { content, responseTime, timestamp }`, `error { message }`
//!
//! Frames with a `type` the server does not know are not errors: [`ClientFrame::parse`]
//! returns `Ok(None)` for them so the caller can log and move on.

use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

/// Path of the WebSocket endpoint, relative to the configured base path.
pub const WS_PATH: &str = "/ws";

// ── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("frame is missing a string `type` field")]
    MissingType,
    #[error("invalid `{kind}` frame: {source}")]
    InvalidFrame {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

// ── Client → server ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    AgentConnect {
        #[serde(rename = "agentId")]
        agent_id: String,
    },
    AgentMessage {
        content: String,
    },
}

impl ClientFrame {
    const KNOWN_TYPES: &'static [&'static str] = &["agent_connect", "agent_message"];

    /// Parse a text frame.
    ///
    /// Returns `Ok(None)` when the `type` is well-formed but unrecognised.
    pub fn parse(text: &str) -> Result<Option<Self>, ProtocolError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(ProtocolError::InvalidJson)?;
        let kind = value
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or(ProtocolError::MissingType)?
            .to_string();

        if !Self::KNOWN_TYPES.contains(&kind.as_str()) {
            return Ok(None);
        }

        serde_json::from_value(value)
            .map(Some)
            .map_err(|source| ProtocolError::InvalidFrame { kind, source })
    }
}

// ── Server → client ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    ConnectionEstablished {
        #[serde(rename = "agentId")]
        agent_id: String,
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    AgentResponse {
        content: String,
        /// Milliseconds between receipt of the message and the reply.
        #[serde(rename = "responseTime")]
        response_time: u64,
        timestamp: DateTime<Utc>,
    },
    Error {
        message: String,
    },
}

impl ServerFrame {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Serialize to the JSON text sent on the socket.
    pub fn to_text(&self) -> String {
        // Serializing these variants cannot fail: no maps with non-string keys.
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"error"}"#.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_agent_connect() {
        let frame = ClientFrame::parse(r#"{"type":"agent_connect","agentId":"customercare-ai"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(frame, ClientFrame::AgentConnect {
            agent_id: "customercare-ai".into()
        });
    }

    #[test]
    fn parses_agent_message() {
        let frame = ClientFrame::parse(r#"{"type":"agent_message","content":"hello"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(frame, ClientFrame::AgentMessage {
            content: "hello".into()
        });
    }

    #[test]
    fn unknown_type_is_ignored() {
        assert!(
            ClientFrame::parse(r#"{"type":"ping"}"#)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn malformed_frames_are_errors() {
        assert!(matches!(
            ClientFrame::parse("not json"),
            Err(ProtocolError::InvalidJson(_))
        ));
        assert!(matches!(
            ClientFrame::parse(r#"{"content":"x"}"#),
            Err(ProtocolError::MissingType)
        ));
        assert!(matches!(
            ClientFrame::parse(r#"{"type":"agent_connect"}"#),
            Err(ProtocolError::InvalidFrame { .. })
        ));
    }

    #[test]
    fn server_frames_use_camel_case_fields() {
        let text = ServerFrame::ConnectionEstablished {
            agent_id: "a1".into(),
            session_id: "s1".into(),
        }
        .to_text();
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["type"], "connection_established");
        assert_eq!(v["agentId"], "a1");
        assert_eq!(v["sessionId"], "s1");

        let text = ServerFrame::AgentResponse {
            content: "hi".into(),
            response_time: 812,
            timestamp: Utc::now(),
        }
        .to_text();
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["type"], "agent_response");
        assert_eq!(v["responseTime"], 812);
        assert!(v["timestamp"].is_string());
    }
}
