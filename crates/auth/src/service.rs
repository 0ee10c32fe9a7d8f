use std::sync::Arc;

use {
    agenthub_store::{
        EntityStore, FieldError, NewSession, NewUser, Role, Session, User, UserUpdate,
    },
    chrono::{DateTime, Duration, Utc},
    secrecy::Secret,
    serde::{Deserialize, Serialize},
    tracing::{debug, info},
};

use crate::{
    error::AuthError,
    password::{dummy_hash, hash_password, verify_password},
    token::TokenIssuer,
    validate::{RegisterRequest, is_email},
};

/// A freshly issued credential.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub token: String,
    pub user: User,
    pub expires_at: DateTime<Utc>,
}

/// The caller behind a validated bearer token.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user: User,
    pub session: Session,
}

/// Body of `PATCH /auth/profile`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileUpdate {
    pub email: Option<String>,
}

pub struct AuthService {
    store: Arc<dyn EntityStore>,
    tokens: TokenIssuer,
    ttl: Duration,
}

impl AuthService {
    pub fn new(store: Arc<dyn EntityStore>, secret: Secret<String>, ttl_hours: u32) -> Self {
        Self {
            store,
            tokens: TokenIssuer::new(secret),
            ttl: Duration::hours(i64::from(ttl_hours)),
        }
    }

    /// Validate and persist a new user without issuing a session.
    pub async fn create_user(&self, request: RegisterRequest) -> Result<User, AuthError> {
        let (role, team) = request.validate().map_err(AuthError::Validation)?;
        let username = request.username.trim().to_string();
        let email = request.email.trim().to_string();

        // Friendly pre-check; the store enforces uniqueness atomically.
        if self.store.get_user_by_username(&username).await?.is_some() {
            return Err(AuthError::Conflict("username already exists".into()));
        }
        if self.store.get_user_by_email(&email).await?.is_some() {
            return Err(AuthError::Conflict("email already exists".into()));
        }

        let user = self
            .store
            .create_user(NewUser {
                username,
                email,
                password_hash: hash_password(&request.password)?,
                role,
                team,
            })
            .await?;
        info!(user_id = %user.id, username = %user.username, role = %user.role, "user created");
        Ok(user)
    }

    /// Public self-registration. Only team members may sign themselves up;
    /// admins come from [`Self::create_user`] (CLI, demo seed).
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthSession, AuthError> {
        if matches!(request.role.parse::<Role>(), Ok(Role::Admin)) {
            return Err(AuthError::Forbidden(
                "admin accounts cannot be self-registered".into(),
            ));
        }
        let user = self.create_user(request).await?;
        self.issue(user).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<AuthSession, AuthError> {
        let user = self.store.get_user_by_username(username.trim()).await?;
        // Always run one verification so unknown usernames cost the same.
        let hash = user
            .as_ref()
            .map_or(dummy_hash(), |u| u.password_hash.as_str());
        let verified = verify_password(password, hash);

        match user {
            Some(user) if verified && user.is_active => self.issue(user).await,
            Some(user) => {
                debug!(user_id = %user.id, "login rejected");
                Err(AuthError::InvalidCredentials)
            },
            None => {
                debug!("login for unknown username");
                Err(AuthError::InvalidCredentials)
            },
        }
    }

    /// Resolve a bearer token to its user. Every failure is `Unauthorized`.
    pub async fn authenticate(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = self.tokens.verify(token).map_err(|e| {
            debug!(error = %e, "bearer token rejected");
            AuthError::Unauthorized
        })?;

        let Some(session) = self.store.get_session(token).await? else {
            debug!(user_id = %claims.sub, "no session for signed token");
            return Err(AuthError::Unauthorized);
        };
        if session.user_id != claims.sub {
            return Err(AuthError::Unauthorized);
        }
        if session.is_expired(Utc::now()) {
            self.store.delete_session(token).await?;
            debug!(user_id = %session.user_id, "expired session removed");
            return Err(AuthError::Unauthorized);
        }

        let user = self
            .store
            .get_user_by_id(&session.user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AuthError::Unauthorized)?;
        Ok(Identity { user, session })
    }

    /// Drop the session behind `token`. Unknown tokens are not an error.
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        if self.store.delete_session(token).await? {
            debug!("session removed");
        }
        Ok(())
    }

    pub async fn update_profile(
        &self,
        user: &User,
        update: ProfileUpdate,
    ) -> Result<User, AuthError> {
        let mut changes = UserUpdate::default();
        if let Some(email) = update.email {
            let email = email.trim().to_string();
            if !is_email(&email) {
                return Err(AuthError::Validation(vec![FieldError::new(
                    "email",
                    "a valid email is required",
                )]));
            }
            if let Some(owner) = self.store.get_user_by_email(&email).await?
                && owner.id != user.id
            {
                return Err(AuthError::Conflict("email already exists".into()));
            }
            changes.email = Some(email);
        }
        self.store
            .update_user(&user.id, changes)
            .await?
            .ok_or(AuthError::Unauthorized)
    }

    async fn issue(&self, user: User) -> Result<AuthSession, AuthError> {
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let token = self.tokens.issue(&user, now, expires_at)?;
        self.store
            .create_session(NewSession {
                user_id: user.id.clone(),
                token: token.clone(),
                expires_at,
            })
            .await?;
        debug!(user_id = %user.id, %expires_at, "session issued");
        Ok(AuthSession {
            token,
            user,
            expires_at,
        })
    }
}
