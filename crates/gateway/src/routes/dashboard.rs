use std::sync::Arc;

use {
    agenthub_store::{ActivityLog, AgentStats, SystemMetric},
    axum::{Json, extract::State},
};

use crate::{error::ApiResult, extract::AuthUser, state::GatewayState};

pub async fn stats(
    State(state): State<Arc<GatewayState>>,
    caller: AuthUser,
) -> ApiResult<Json<AgentStats>> {
    Ok(Json(state.store.get_stats(&caller.scope()).await?))
}

pub async fn activity_logs(
    State(state): State<Arc<GatewayState>>,
    caller: AuthUser,
) -> ApiResult<Json<Vec<ActivityLog>>> {
    Ok(Json(
        state.store.get_activity_logs_in(&caller.scope()).await?,
    ))
}

pub async fn system_metrics(
    State(state): State<Arc<GatewayState>>,
    caller: AuthUser,
) -> ApiResult<Json<Vec<SystemMetric>>> {
    caller.require_admin()?;
    Ok(Json(state.store.get_system_metrics().await?))
}
