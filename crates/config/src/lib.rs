//! Configuration: schema, file discovery and environment overrides.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{
        apply_env_overrides, clear_config_dir, data_dir, discover_and_load, load_config,
        set_config_dir,
    },
    schema::{
        AgentHubConfig, AuthConfig, ChatConfig, ServerConfig, SimulationConfig, StorageBackend,
        StorageConfig,
    },
};
