//! Entity store: users, auth sessions, agents, interactions, system metrics
//! and activity logs behind one async contract.
//!
//! Two backends implement [`EntityStore`]: [`MemoryStore`] (process-local,
//! optionally seeded with sample rows) and [`SqliteStore`] (durable). Agent
//! visibility is decided in exactly one place, [`Scope::admits`], and every
//! agent read goes through it.

pub mod error;
pub mod memory;
pub mod scope;
pub mod seed;
pub mod sqlite;
pub mod store;
pub mod types;

pub use {
    error::{Result, StoreError},
    memory::MemoryStore,
    scope::Scope,
    sqlite::SqliteStore,
    store::{ACTIVITY_LOG_LIMIT, EntityStore, INTERACTION_LIMIT, SYSTEM_METRIC_LIMIT},
    types::*,
};
