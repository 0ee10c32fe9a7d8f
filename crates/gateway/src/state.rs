use std::{sync::Arc, time::Instant};

use {
    agenthub_auth::{AuthService, generate_secret},
    agenthub_config::AgentHubConfig,
    agenthub_store::EntityStore,
    secrecy::Secret,
    tokio_util::sync::CancellationToken,
    tracing::warn,
};

use crate::{registry::ConnectionRegistry, simulation::ClusterState};

/// Shared gateway runtime state, wrapped in Arc for use across handlers and tasks.
pub struct GatewayState {
    pub store: Arc<dyn EntityStore>,
    pub auth: AuthService,
    /// Live WebSocket chat connections.
    pub connections: ConnectionRegistry,
    pub cluster: ClusterState,
    pub config: AgentHubConfig,
    /// Cancelled once on shutdown; every background task holds a child.
    pub shutdown: CancellationToken,
    pub version: String,
    pub hostname: String,
    pub started_at: Instant,
}

impl GatewayState {
    pub fn new(config: AgentHubConfig, store: Arc<dyn EntityStore>) -> Arc<Self> {
        let secret = config.auth.jwt_secret.clone().unwrap_or_else(|| {
            warn!("no jwt secret configured, tokens will not survive a restart");
            generate_secret()
        });
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "unknown".into());
        let shutdown = CancellationToken::new();

        Arc::new(Self {
            auth: AuthService::new(
                Arc::clone(&store),
                Secret::new(secret),
                config.auth.session_ttl_hours,
            ),
            store,
            connections: ConnectionRegistry::new(shutdown.clone()),
            cluster: ClusterState::default(),
            config,
            shutdown,
            version: env!("CARGO_PKG_VERSION").to_string(),
            hostname,
            started_at: Instant::now(),
        })
    }
}
