use std::sync::Arc;

use {
    agenthub_auth::{AuthSession, ProfileUpdate, RegisterRequest},
    agenthub_store::User,
    axum::{Json, extract::State, http::StatusCode},
    serde::Deserialize,
    serde_json::{Value, json},
};

use crate::{
    error::ApiResult,
    extract::{AuthUser, JsonBody},
    state::GatewayState,
};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn register(
    State(state): State<Arc<GatewayState>>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthSession>)> {
    let session = state.auth.register(request).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn login(
    State(state): State<Arc<GatewayState>>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> ApiResult<Json<AuthSession>> {
    Ok(Json(
        state.auth.login(&request.username, &request.password).await?,
    ))
}

pub async fn logout(
    State(state): State<Arc<GatewayState>>,
    caller: AuthUser,
) -> ApiResult<Json<Value>> {
    state.auth.logout(&caller.token).await?;
    Ok(Json(json!({ "message": "Logged out successfully" })))
}

pub async fn profile(caller: AuthUser) -> Json<User> {
    Json(caller.user)
}

pub async fn update_profile(
    State(state): State<Arc<GatewayState>>,
    caller: AuthUser,
    JsonBody(update): JsonBody<ProfileUpdate>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.auth.update_profile(&caller.user, update).await?))
}
