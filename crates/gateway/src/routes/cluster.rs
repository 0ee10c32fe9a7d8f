use std::sync::Arc;

use {
    agenthub_store::{ActivityType, NewActivityLog, NewSystemMetric},
    axum::{Json, extract::State},
    serde::{Deserialize, Serialize},
    serde_json::json,
    tracing::info,
};

use crate::{
    error::{ApiError, ApiResult},
    extract::{AuthUser, JsonBody},
    simulation::{ScaleDirection, scoped_counts},
    state::GatewayState,
};

#[derive(Debug, Deserialize)]
pub struct ClusterScaleRequest {
    pub action: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStatus {
    pub nodes: u32,
    pub active_connections: usize,
    pub total_agents: usize,
    pub active_agents: usize,
    pub uptime_secs: u64,
    pub hostname: String,
}

pub async fn scale(
    State(state): State<Arc<GatewayState>>,
    caller: AuthUser,
    JsonBody(request): JsonBody<ClusterScaleRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let direction: ScaleDirection = request
        .action
        .parse()
        .map_err(|e: String| ApiError::invalid("action", e))?;
    let nodes = state.cluster.scale(direction);

    state
        .store
        .create_system_metric(NewSystemMetric {
            metric_name: "cluster_nodes".into(),
            value: nodes.to_string(),
        })
        .await?;
    state
        .store
        .create_activity_log(
            NewActivityLog::new(
                ActivityType::SystemEvent,
                format!("Cluster {} to {nodes} nodes", request.action),
            )
            .details(json!({ "nodes": nodes, "by": caller.user.username })),
        )
        .await?;
    info!(nodes, action = %request.action, "cluster scaled");
    Ok(Json(json!({
        "message": format!("Cluster {} complete", request.action),
        "nodes": nodes,
    })))
}

pub async fn status(
    State(state): State<Arc<GatewayState>>,
    caller: AuthUser,
) -> ApiResult<Json<ClusterStatus>> {
    let (total_agents, active_agents) = scoped_counts(&state, &caller.scope()).await?;
    Ok(Json(ClusterStatus {
        nodes: state.cluster.nodes(),
        active_connections: state.connections.count().await,
        total_agents,
        active_agents,
        uptime_secs: state.started_at.elapsed().as_secs(),
        hostname: state.hostname.clone(),
    }))
}
