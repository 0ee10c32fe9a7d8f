//! HTTP API handlers, mounted under `<base_path>/api`.

pub mod agents;
pub mod auth;
pub mod cluster;
pub mod containers;
pub mod dashboard;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::GatewayState;

pub fn api_router() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/profile", get(auth::profile).patch(auth::update_profile))
        .route("/agents", get(agents::list).post(agents::create))
        .route(
            "/agents/{id}",
            get(agents::get_one)
                .patch(agents::update)
                .delete(agents::remove),
        )
        .route("/agents/{id}/status", patch(agents::set_status))
        .route("/agents/{id}/metrics", get(agents::metrics))
        .route("/agents/{id}/interactions", get(agents::interactions))
        .route("/agents/{id}/container/{action}", post(containers::container_action))
        .route("/agents/{id}/scale", post(containers::scale_agent))
        .route("/cluster/scale", post(cluster::scale))
        .route("/cluster/status", get(cluster::status))
        .route("/stats", get(dashboard::stats))
        .route("/activity-logs", get(dashboard::activity_logs))
        .route("/system-metrics", get(dashboard::system_metrics))
}
