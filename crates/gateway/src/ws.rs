//! WebSocket chat channel.
//!
//! Per connection: `Connected` on upgrade (fresh session id, registered),
//! `Bound` after `agent_connect`, replies to each `agent_message` after a
//! random delay, and `Closed` when the socket ends. Pending replies are tied
//! to the connection's cancellation token, so nothing is persisted or sent
//! once it has closed.

use std::{net::SocketAddr, sync::Arc, time::Instant};

use {
    agenthub_protocol::{ClientFrame, ServerFrame},
    agenthub_store::{ActivityType, NewActivityLog, NewInteraction, Scope},
    axum::extract::ws::{Message, WebSocket},
    chrono::Utc,
    futures::{SinkExt, StreamExt},
    serde_json::json,
    tokio::sync::mpsc,
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use crate::{responder, state::GatewayState};

/// Drive one WebSocket connection until it closes or the gateway shuts down.
pub async fn handle_connection(socket: WebSocket, state: Arc<GatewayState>, remote: SocketAddr) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let (session_id, cancel) = state.connections.register(tx).await;
    info!(%session_id, %remote, "ws: connection opened");

    let writer = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            msg = ws_rx.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    handle_text(&state, &session_id, &cancel, text.as_str()).await;
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {},
                Some(Err(e)) => {
                    debug!(%session_id, error = %e, "ws: read error");
                    break;
                },
            },
        }
    }

    // Dropping the registry entry drops the writer's sender and cancels timers.
    state.connections.remove(&session_id).await;
    let _ = writer.await;
    info!(%session_id, "ws: connection closed");
}

async fn handle_text(
    state: &Arc<GatewayState>,
    session_id: &str,
    cancel: &CancellationToken,
    text: &str,
) {
    match ClientFrame::parse(text) {
        Ok(Some(ClientFrame::AgentConnect { agent_id })) => {
            state.connections.bind(session_id, &agent_id).await;
            debug!(%session_id, %agent_id, "ws: bound to agent");
            state
                .connections
                .send(session_id, &ServerFrame::ConnectionEstablished {
                    agent_id,
                    session_id: session_id.to_string(),
                })
                .await;
        },
        Ok(Some(ClientFrame::AgentMessage { content })) => {
            let Some(agent_id) = state.connections.bound_agent(session_id).await else {
                state
                    .connections
                    .send(
                        session_id,
                        &ServerFrame::error("send agent_connect before agent_message"),
                    )
                    .await;
                return;
            };
            spawn_reply(
                Arc::clone(state),
                session_id.to_string(),
                agent_id,
                content,
                cancel.child_token(),
            );
        },
        Ok(None) => {
            warn!(%session_id, frame = %text, "ws: ignoring frame with unknown type");
        },
        Err(e) => {
            debug!(%session_id, error = %e, "ws: bad frame");
            state
                .connections
                .send(session_id, &ServerFrame::error(e.to_string()))
                .await;
        },
    }
}

/// Reply to one chat message after the simulated latency.
fn spawn_reply(
    state: Arc<GatewayState>,
    session_id: String,
    agent_id: String,
    message: String,
    cancel: CancellationToken,
) {
    let received_at = Instant::now();
    let delay = responder::response_delay(&state.config.chat);

    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(%session_id, "ws: connection closed before reply");
                return;
            },
            _ = tokio::time::sleep(delay) => {},
        }

        // Chat is not user-scoped: the agent id is resolved system-wide.
        let agent = match state.store.get_agent(&agent_id, &Scope::All).await {
            Ok(agent) => agent,
            Err(e) => {
                warn!(%agent_id, error = %e, "ws: agent lookup failed");
                None
            },
        };
        let content = responder::compose_reply(agent.as_ref(), &message);
        let response_time = received_at.elapsed().as_millis() as u64;

        let persisted = state
            .store
            .create_interaction(NewInteraction {
                agent_id: agent_id.clone(),
                session_id: session_id.clone(),
                message: message.clone(),
                response: content.clone(),
                response_time,
                success: agent.is_some(),
            })
            .await;
        if let Err(e) = persisted {
            warn!(%session_id, error = %e, "ws: failed to store interaction");
            state
                .connections
                .send(&session_id, &ServerFrame::error("failed to process message"))
                .await;
            return;
        }

        if let Some(agent) = &agent {
            let log = NewActivityLog::new(
                ActivityType::Interaction,
                format!("Chat message handled by {}", agent.name),
            )
            .agent(agent.id.clone())
            .details(json!({ "sessionId": session_id, "responseTime": response_time }));
            if let Err(e) = state.store.create_activity_log(log).await {
                warn!(%session_id, error = %e, "ws: failed to log interaction");
            }
        }

        state
            .connections
            .send(&session_id, &ServerFrame::AgentResponse {
                content,
                response_time,
                timestamp: Utc::now(),
            })
            .await;
    });
}
