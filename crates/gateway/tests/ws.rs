#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::time::{Duration, Instant};

use {
    agenthub_store::Scope,
    futures::{SinkExt, StreamExt},
    serde_json::{Value, json},
    tokio::net::TcpStream,
    tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message},
};

use common::TestGateway;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect(gw: &TestGateway) -> Socket {
    let (socket, _) = connect_async(format!("ws://{}/ws", gw.addr)).await.unwrap();
    socket
}

async fn send(socket: &mut Socket, frame: Value) {
    socket
        .send(Message::Text(frame.to_string().into()))
        .await
        .unwrap();
}

async fn recv(socket: &mut Socket) -> Value {
    let msg = tokio::time::timeout(Duration::from_secs(5), socket.next())
        .await
        .expect("frame within timeout")
        .unwrap()
        .unwrap();
    match msg {
        Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
        other => panic!("unexpected message: {other:?}"),
    }
}

#[tokio::test]
async fn refund_scenario() {
    let gw = TestGateway::start().await;
    let mut socket = connect(&gw).await;

    send(&mut socket, json!({ "type": "agent_connect", "agentId": "customercare-ai" })).await;
    let ack = recv(&mut socket).await;
    assert_eq!(ack["type"], "connection_established");
    assert_eq!(ack["agentId"], "customercare-ai");
    let session_id = ack["sessionId"].as_str().unwrap().to_string();

    let sent_at = Instant::now();
    send(&mut socket, json!({ "type": "agent_message", "content": "I need a refund for order #123" })).await;
    let reply = recv(&mut socket).await;
    let waited = sent_at.elapsed().as_millis() as u64;

    assert_eq!(reply["type"], "agent_response");
    assert_eq!(
        reply["content"],
        "I can definitely help you with your refund request. Let me process that for you right away."
    );
    let response_time = reply["responseTime"].as_u64().unwrap();
    assert!((500..=2500 + 200).contains(&response_time), "{response_time}");
    assert!(waited >= response_time);
    assert!(reply["timestamp"].is_string());

    let interactions = gw
        .state
        .store
        .get_interactions(Some("customercare-ai"))
        .await
        .unwrap();
    assert_eq!(interactions.len(), 1);
    assert_eq!(interactions[0].session_id, session_id);
    assert_eq!(interactions[0].message, "I need a refund for order #123");
    assert!(interactions[0].success);
}

#[tokio::test]
async fn errors_keep_connection_open() {
    let gw = TestGateway::start_with(|c| {
        c.chat.min_delay_ms = 10;
        c.chat.max_delay_ms = 20;
    })
    .await;
    let mut socket = connect(&gw).await;

    socket.send(Message::Text("{not json".into())).await.unwrap();
    assert_eq!(recv(&mut socket).await["type"], "error");

    send(&mut socket, json!({ "type": "agent_message", "content": "hi" })).await;
    let err = recv(&mut socket).await;
    assert_eq!(err["type"], "error");

    send(&mut socket, json!({ "type": "agent_connect" })).await;
    assert_eq!(recv(&mut socket).await["type"], "error");

    // Unknown types are ignored without a reply.
    send(&mut socket, json!({ "type": "typing" })).await;

    send(&mut socket, json!({ "type": "agent_connect", "agentId": "scout-ai" })).await;
    let ack = recv(&mut socket).await;
    assert_eq!(ack["type"], "connection_established");
    assert_eq!(ack["agentId"], "scout-ai");
}

#[tokio::test]
async fn rebinding_and_unknown_agent() {
    let gw = TestGateway::start_with(|c| {
        c.chat.min_delay_ms = 10;
        c.chat.max_delay_ms = 20;
    })
    .await;
    let mut socket = connect(&gw).await;

    send(&mut socket, json!({ "type": "agent_connect", "agentId": "customercare-ai" })).await;
    recv(&mut socket).await;
    send(&mut socket, json!({ "type": "agent_connect", "agentId": "ghost-ai" })).await;
    recv(&mut socket).await;

    send(&mut socket, json!({ "type": "agent_message", "content": "refund please" })).await;
    let reply = recv(&mut socket).await;
    assert_eq!(reply["type"], "agent_response");
    assert_eq!(
        reply["content"],
        "I'm sorry, but this agent is currently unavailable. Please try again later."
    );
    assert!(
        gw.state
            .store
            .get_interactions(Some("customercare-ai"))
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn closing_cancels_pending_reply() {
    let gw = TestGateway::start_with(|c| {
        c.chat.min_delay_ms = 300;
        c.chat.max_delay_ms = 300;
    })
    .await;
    let mut socket = connect(&gw).await;

    send(&mut socket, json!({ "type": "agent_connect", "agentId": "scout-ai" })).await;
    recv(&mut socket).await;
    assert_eq!(gw.state.connections.count().await, 1);

    send(&mut socket, json!({ "type": "agent_message", "content": "find papers" })).await;
    socket.close(None).await.unwrap();

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(gw.state.connections.count().await, 0);
    assert!(
        gw.state
            .store
            .get_interactions(Some("scout-ai"))
            .await
            .unwrap()
            .is_empty()
    );

    // Disconnecting does not touch the agent's status.
    let agent = gw
        .state
        .store
        .get_agent("scout-ai", &Scope::All)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(agent.status, agenthub_store::AgentStatus::Online);
}
