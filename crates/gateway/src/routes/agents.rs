use std::sync::Arc;

use {
    agenthub_store::{
        ActivityType, Agent, AgentStatus, AgentUpdate, Interaction, NewActivityLog, NewAgent,
        Scope,
    },
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
    simulation::{AgentMetrics, agent_metrics},
    state::GatewayState,
};

/// An agent the caller is allowed to see, or 404.
pub(crate) async fn visible_agent(
    state: &GatewayState,
    caller: &AuthUser,
    id: &str,
) -> ApiResult<Agent> {
    state
        .store
        .get_agent(id, &caller.scope())
        .await?
        .ok_or_else(|| ApiError::not_found("agent"))
}

pub async fn list(
    State(state): State<Arc<GatewayState>>,
    caller: AuthUser,
) -> ApiResult<Json<Vec<Agent>>> {
    Ok(Json(state.store.get_agents(&caller.scope()).await?))
}

pub async fn get_one(
    State(state): State<Arc<GatewayState>>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Agent>> {
    Ok(Json(visible_agent(&state, &caller, &id).await?))
}

pub async fn create(
    State(state): State<Arc<GatewayState>>,
    caller: AuthUser,
    JsonBody(new_agent): JsonBody<NewAgent>,
) -> ApiResult<(StatusCode, Json<Agent>)> {
    caller.require_admin()?;
    new_agent.validate().map_err(ApiError::fields)?;

    let agent = state.store.create_agent(new_agent).await?;
    state
        .store
        .create_activity_log(
            NewActivityLog::new(
                ActivityType::AgentRegistered,
                format!("{} registered for team {}", agent.name, agent.team),
            )
            .agent(agent.id.clone())
            .details(json!({ "agentType": agent.agent_type, "by": caller.user.username })),
        )
        .await?;
    info!(agent_id = %agent.id, team = %agent.team, "agent registered");
    Ok((StatusCode::CREATED, Json(agent)))
}

pub async fn update(
    State(state): State<Arc<GatewayState>>,
    caller: AuthUser,
    Path(id): Path<String>,
    JsonBody(update): JsonBody<AgentUpdate>,
) -> ApiResult<Json<Agent>> {
    caller.require_admin()?;
    update.validate().map_err(ApiError::fields)?;
    state
        .store
        .update_agent(&id, update)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("agent"))
}

pub async fn remove(
    State(state): State<Arc<GatewayState>>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    caller.require_admin()?;
    if !state.store.delete_agent(&id).await? {
        return Err(ApiError::not_found("agent"));
    }
    state
        .store
        .create_activity_log(
            NewActivityLog::new(ActivityType::SystemEvent, format!("Agent {id} removed"))
                .agent(id.clone()),
        )
        .await?;
    info!(agent_id = %id, "agent removed");
    Ok(Json(json!({ "message": "Agent removed", "agentId": id })))
}

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: AgentStatus,
}

pub async fn set_status(
    State(state): State<Arc<GatewayState>>,
    caller: AuthUser,
    Path(id): Path<String>,
    JsonBody(change): JsonBody<StatusChange>,
) -> ApiResult<Json<Agent>> {
    caller.require_admin()?;
    let agent = state
        .store
        .get_agent(&id, &Scope::All)
        .await?
        .ok_or_else(|| ApiError::not_found("agent"))?;

    state.store.update_agent_status(&id, change.status).await?;
    state
        .store
        .create_activity_log(
            NewActivityLog::new(
                ActivityType::AgentStatusChange,
                format!("{} status changed to {}", agent.name, change.status),
            )
            .agent(id.clone())
            .details(json!({ "from": agent.status, "to": change.status })),
        )
        .await?;

    state
        .store
        .get_agent(&id, &Scope::All)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("agent"))
}

pub async fn metrics(
    State(state): State<Arc<GatewayState>>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<AgentMetrics>> {
    let agent = visible_agent(&state, &caller, &id).await?;
    Ok(Json(agent_metrics(&agent)))
}

pub async fn interactions(
    State(state): State<Arc<GatewayState>>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Interaction>>> {
    let agent = visible_agent(&state, &caller, &id).await?;
    Ok(Json(state.store.get_interactions(Some(&agent.id)).await?))
}
