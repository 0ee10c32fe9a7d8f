//! Simulated container control.
//!
//! Any authenticated caller who can see the agent may trigger these, unlike
//! agent create/delete/status which are admin-only.

use std::sync::Arc;

use {
    agenthub_store::{ActivityType, NewActivityLog},
    axum::{
        Json,
        extract::{Path, State},
        http::StatusCode,
    },
    serde::Deserialize,
    serde_json::{Value, json},
    tracing::info,
};

use crate::{
    error::{ApiError, ApiResult},
    extract::{AuthUser, JsonBody},
    routes::agents::visible_agent,
    simulation::{ContainerAction, run_container_action},
    state::GatewayState,
};

pub const MIN_REPLICAS: i64 = 1;
pub const MAX_REPLICAS: i64 = 10;

pub async fn container_action(
    State(state): State<Arc<GatewayState>>,
    caller: AuthUser,
    Path((id, action)): Path<(String, String)>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let action: ContainerAction = action
        .parse()
        .map_err(|e: String| ApiError::invalid("action", e))?;
    let agent = visible_agent(&state, &caller, &id).await?;

    run_container_action(&state, &agent, action).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "message": format!("Container {} initiated", action.as_str()),
            "agentId": agent.id,
            "action": action.as_str(),
            "status": "busy",
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ScaleRequest {
    pub replicas: i64,
}

pub async fn scale_agent(
    State(state): State<Arc<GatewayState>>,
    caller: AuthUser,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<ScaleRequest>,
) -> ApiResult<Json<Value>> {
    if !(MIN_REPLICAS..=MAX_REPLICAS).contains(&request.replicas) {
        return Err(ApiError::invalid(
            "replicas",
            format!("replicas must be between {MIN_REPLICAS} and {MAX_REPLICAS}"),
        ));
    }
    let agent = visible_agent(&state, &caller, &id).await?;

    state
        .store
        .create_activity_log(
            NewActivityLog::new(
                ActivityType::SystemEvent,
                format!("{} scaled to {} replicas", agent.name, request.replicas),
            )
            .agent(agent.id.clone())
            .details(json!({ "replicas": request.replicas, "by": caller.user.username })),
        )
        .await?;
    info!(agent_id = %agent.id, replicas = request.replicas, "agent scaled");
    Ok(Json(json!({
        "message": format!("Scaling {} to {} replicas", agent.name, request.replicas),
        "agentId": agent.id,
        "replicas": request.replicas,
    })))
}
