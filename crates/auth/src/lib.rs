//! Credential lifecycle: registration, login, bearer-token validation and
//! logout.
//!
//! A bearer token is an HS256 JWT that must also match a live server-side
//! session row. Either half alone is not enough: a correctly signed token with
//! no session (or an expired one) is rejected.

pub mod error;
pub mod password;
pub mod service;
pub mod token;
pub mod validate;

pub use {
    error::AuthError,
    service::{AuthService, AuthSession, Identity, ProfileUpdate},
    token::{Claims, TokenIssuer, generate_secret},
    validate::RegisterRequest,
};
