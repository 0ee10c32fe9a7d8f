use std::sync::Arc;

use {
    agenthub_store::{Role, Scope, User},
    axum::{
        Json,
        extract::{FromRequest, FromRequestParts, Request, rejection::JsonRejection},
        http::{header::AUTHORIZATION, request::Parts},
    },
};

use crate::{error::ApiError, state::GatewayState};

/// The authenticated caller, resolved from `Authorization: Bearer <token>`.
pub struct AuthUser {
    pub user: User,
    pub token: String,
}

impl AuthUser {
    /// Agent visibility for this caller.
    pub fn scope(&self) -> Scope {
        Scope::for_user(&self.user)
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.user.role == Role::Admin {
            Ok(())
        } else {
            Err(ApiError::admin_only())
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl FromRequestParts<Arc<GatewayState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<GatewayState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::Unauthorized("authentication required".into()))?;
        let identity = state.auth.authenticate(token).await?;
        Ok(Self {
            user: identity.user,
            token: token.to_string(),
        })
    }
}

/// `Json` body extractor whose rejections answer 400 with the usual error
/// shape instead of axum's plain-text 422.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}
