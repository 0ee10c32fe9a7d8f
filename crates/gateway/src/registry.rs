//! Process-scoped registry of live WebSocket chat connections.
//!
//! Created once with the gateway state and drained on shutdown. Each entry
//! owns the sender half of its connection's write loop and a cancellation
//! token that pending reply timers for that connection hang off.

use std::{collections::HashMap, time::Instant};

use {
    agenthub_protocol::ServerFrame,
    tokio::sync::{RwLock, mpsc},
    tokio_util::sync::CancellationToken,
};

/// A connected chat client.
#[derive(Debug)]
pub struct ConnectionHandle {
    pub session_id: String,
    /// Agent the connection is bound to; last `agent_connect` wins.
    pub agent_id: Option<String>,
    sender: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
    pub connected_at: Instant,
}

impl ConnectionHandle {
    /// Queue a serialized frame on the write loop.
    pub fn send(&self, frame: &str) -> bool {
        self.sender.send(frame.to_string()).is_ok()
    }
}

pub struct ConnectionRegistry {
    connections: RwLock<HashMap<String, ConnectionHandle>>,
    shutdown: CancellationToken,
}

impl ConnectionRegistry {
    /// Connection tokens are children of `shutdown`.
    pub fn new(shutdown: CancellationToken) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            shutdown,
        }
    }

    /// Register a connection under a fresh session id.
    pub async fn register(&self, sender: mpsc::UnboundedSender<String>) -> (String, CancellationToken) {
        let session_id = format!("ws_{}", uuid::Uuid::new_v4().simple());
        let cancel = self.shutdown.child_token();
        self.connections.write().await.insert(session_id.clone(), ConnectionHandle {
            session_id: session_id.clone(),
            agent_id: None,
            sender,
            cancel: cancel.clone(),
            connected_at: Instant::now(),
        });
        (session_id, cancel)
    }

    /// Bind (or rebind) a connection to an agent. False if the connection is gone.
    pub async fn bind(&self, session_id: &str, agent_id: &str) -> bool {
        match self.connections.write().await.get_mut(session_id) {
            Some(conn) => {
                conn.agent_id = Some(agent_id.to_string());
                true
            },
            None => false,
        }
    }

    pub async fn bound_agent(&self, session_id: &str) -> Option<String> {
        self.connections
            .read()
            .await
            .get(session_id)
            .and_then(|c| c.agent_id.clone())
    }

    /// Send a frame to one connection. Silently false when it has closed.
    pub async fn send(&self, session_id: &str, frame: &ServerFrame) -> bool {
        self.connections
            .read()
            .await
            .get(session_id)
            .is_some_and(|c| c.send(&frame.to_text()))
    }

    /// Remove a connection and cancel its pending work.
    pub async fn remove(&self, session_id: &str) -> Option<ConnectionHandle> {
        let removed = self.connections.write().await.remove(session_id);
        if let Some(conn) = &removed {
            conn.cancel.cancel();
        }
        removed
    }

    pub async fn count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Remove every connection. Returns how many were dropped.
    pub async fn drain(&self) -> usize {
        let drained: Vec<_> = self.connections.write().await.drain().collect();
        for (_, conn) in &drained {
            conn.cancel.cancel();
        }
        drained.len()
    }
}
