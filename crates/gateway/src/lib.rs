//! Gateway: HTTP API and WebSocket chat server for the agent dashboard.
//!
//! Lifecycle:
//! 1. Load config and open the configured entity store
//! 2. Build shared state (auth service, connection registry, cluster)
//! 3. Seed demo users when running in memory mode
//! 4. Serve `<base>/api/*`, `<base>/ws` and `<base>/health`
//! 5. On shutdown cancel background work and drain the registry

pub mod error;
pub mod extract;
pub mod registry;
pub mod responder;
pub mod routes;
pub mod server;
pub mod simulation;
pub mod state;
pub mod ws;

pub use {
    error::{ApiError, ApiResult},
    server::{build_gateway_app, open_store, seed_demo_users, serve, start_gateway},
    state::GatewayState,
};
