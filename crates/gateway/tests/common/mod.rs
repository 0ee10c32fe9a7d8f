#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::{net::SocketAddr, sync::Arc};

use {
    agenthub_config::AgentHubConfig,
    agenthub_gateway::{GatewayState, seed_demo_users, serve},
    agenthub_store::MemoryStore,
    serde_json::{Value, json},
    tokio::net::TcpListener,
};

pub struct TestGateway {
    pub addr: SocketAddr,
    pub state: Arc<GatewayState>,
    pub http: reqwest::Client,
}

impl TestGateway {
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    pub async fn start_with(tweak: impl FnOnce(&mut AgentHubConfig)) -> Self {
        let mut config = AgentHubConfig::default();
        config.auth.jwt_secret = Some("integration-secret".into());
        config.simulation.container_action_delay_ms = 50;
        tweak(&mut config);

        let state = GatewayState::new(config, Arc::new(MemoryStore::seeded()));
        seed_demo_users(&state).await.unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve(listener, Arc::clone(&state)));

        Self {
            addr,
            state,
            http: reqwest::Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub fn api(&self, path: &str) -> String {
        self.url(&format!("/api{path}"))
    }

    pub async fn login(&self, username: &str, password: &str) -> String {
        let resp = self
            .http
            .post(self.api("/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200, "login as {username}");
        let body: Value = resp.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn admin(&self) -> String {
        self.login("admin", "admin123").await
    }

    pub async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.http
            .get(self.api(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> reqwest::Response {
        self.http
            .post(self.api(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.state.shutdown.cancel();
    }
}
