use std::{net::SocketAddr, sync::Arc};

use {
    agenthub_auth::{AuthError, RegisterRequest},
    agenthub_config::{AgentHubConfig, StorageBackend, data_dir},
    agenthub_protocol::WS_PATH,
    agenthub_store::{EntityStore, MemoryStore, SqliteStore},
    axum::{
        Router,
        extract::{ConnectInfo, State, WebSocketUpgrade},
        response::{IntoResponse, Json},
        routing::get,
    },
    tokio::net::TcpListener,
    tower_http::{
        cors::{Any, CorsLayer},
        trace::TraceLayer,
    },
    tracing::{info, warn},
};

use crate::{routes, simulation::spawn_metrics_sampler, state::GatewayState, ws::handle_connection};

/// Demo accounts created in memory mode: (username, password, role, team).
const DEMO_USERS: &[(&str, &str, &str, Option<&str>)] = &[
    ("admin", "admin123", "admin", None),
    ("ops", "ops12345", "team_member", Some("Customer Success")),
];

// ── App ──────────────────────────────────────────────────────────────────────

/// Build the gateway router (shared between production startup and tests).
pub fn build_gateway_app(state: Arc<GatewayState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health_handler))
        .route(WS_PATH, get(ws_upgrade_handler))
        .nest("/api", routes::api_router());

    let base = state.config.server.normalized_base_path();
    let app = if base.is_empty() {
        app
    } else {
        Router::new().nest(&base, app)
    };

    app.layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ── Storage ──────────────────────────────────────────────────────────────────

/// Open the entity store selected by `storage.backend`.
pub async fn open_store(config: &AgentHubConfig) -> anyhow::Result<Arc<dyn EntityStore>> {
    match config.storage.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryStore::seeded())),
        StorageBackend::Sqlite => {
            let url = match &config.storage.database_url {
                Some(url) => url.clone(),
                None => {
                    let dir = data_dir();
                    std::fs::create_dir_all(&dir)?;
                    format!("sqlite://{}", dir.join("agenthub.db").display())
                },
            };
            Ok(Arc::new(SqliteStore::connect(&url).await?))
        },
    }
}

/// Create the demo accounts unless they already exist.
pub async fn seed_demo_users(state: &GatewayState) -> anyhow::Result<()> {
    for (username, password, role, team) in DEMO_USERS {
        let request = RegisterRequest {
            username: (*username).into(),
            email: format!("{username}@agenthub.local"),
            password: (*password).into(),
            role: (*role).into(),
            team: team.map(Into::into),
        };
        match state.auth.create_user(request).await {
            Ok(user) => info!(username = %user.username, role = %user.role, "demo user ready"),
            Err(AuthError::Conflict(_)) => {},
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

// ── Server startup ───────────────────────────────────────────────────────────

/// Serve on an already-bound listener until `state.shutdown` is cancelled.
pub async fn serve(listener: TcpListener, state: Arc<GatewayState>) -> anyhow::Result<()> {
    let app = build_gateway_app(Arc::clone(&state));
    let sampler = spawn_metrics_sampler(Arc::clone(&state));

    let shutdown = state.shutdown.clone();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { shutdown.cancelled().await })
    .await?;

    let drained = state.connections.drain().await;
    if let Some(sampler) = sampler {
        let _ = sampler.await;
    }
    info!(drained, "gateway stopped");
    Ok(())
}

/// Start the gateway HTTP + WebSocket server and run until Ctrl-C.
pub async fn start_gateway(config: AgentHubConfig) -> anyhow::Result<()> {
    let store = open_store(&config).await?;
    let backend = config.storage.backend;
    let seed = config.simulation.seed_demo_users && backend == StorageBackend::Memory;
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let base = config.server.normalized_base_path();

    let state = GatewayState::new(config, store);
    if seed {
        seed_demo_users(&state).await?;
    }

    let listener = TcpListener::bind(addr).await?;

    // Startup banner.
    let lines = [
        format!("agenthub gateway v{}", state.version),
        format!("listening on http://{addr}{base}"),
        format!("api {base}/api, websocket {base}{WS_PATH}"),
        format!("storage: {backend}"),
    ];
    let width = lines.iter().map(|l| l.len()).max().unwrap_or(0) + 4;
    info!("┌{}┐", "─".repeat(width));
    for line in &lines {
        info!("│  {:<w$}│", line, w = width - 2);
    }
    info!("└{}┘", "─".repeat(width));

    let shutdown = state.shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("shutdown requested"),
            Err(e) => warn!(error = %e, "failed to listen for ctrl-c"),
        }
        shutdown.cancel();
    });

    serve(listener, state).await
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn health_handler(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": state.version,
        "storage": state.config.storage.backend,
        "connections": state.connections.count().await,
    }))
}

async fn ws_upgrade_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<Arc<GatewayState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state, addr))
}

#[cfg(test)]
mod tests {
    use {
        axum::{
            body::{Body, to_bytes},
            http::{Request, StatusCode},
        },
        tower::ServiceExt,
    };

    use super::*;

    async fn app_with_base(base: &str) -> Router {
        let mut config = AgentHubConfig::default();
        config.server.base_path = base.into();
        config.auth.jwt_secret = Some("test".into());
        let state = GatewayState::new(config, Arc::new(MemoryStore::seeded()));
        build_gateway_app(state)
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = app_with_base("").await;
        let resp = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["storage"], "memory");
    }

    #[tokio::test]
    async fn routes_mount_under_base_path() {
        let app = app_with_base("/dashboard/").await;
        let resp = app
            .clone()
            .oneshot(Request::get("/dashboard/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn api_requires_bearer_token() {
        let app = app_with_base("").await;
        let resp = app
            .clone()
            .oneshot(Request::get("/api/agents").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = app
            .oneshot(
                Request::get("/api/agents")
                    .header("authorization", "Bearer forged.token.value")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn demo_users_seed_once() {
        let config = AgentHubConfig::default();
        let state = GatewayState::new(config, Arc::new(MemoryStore::new()));
        seed_demo_users(&state).await.unwrap();
        seed_demo_users(&state).await.unwrap();
        let ops = state.store.get_user_by_username("ops").await.unwrap().unwrap();
        assert_eq!(ops.team.as_deref(), Some("Customer Success"));
        assert!(state.auth.login("admin", "admin123").await.is_ok());
    }
}
