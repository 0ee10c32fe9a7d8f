//! Config schema types (server, storage, auth, chat, simulation).

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentHubConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub chat: ChatConfig,
    pub simulation: SimulationConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Prefix under which the whole application is mounted, e.g. `/dashboard`
    /// when running behind a reverse proxy. Empty means the root.
    pub base_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 5000,
            base_path: String::new(),
        }
    }
}

impl ServerConfig {
    /// The base path with a leading slash and no trailing slash (`""` for root).
    pub fn normalized_base_path(&self) -> String {
        let trimmed = self.base_path.trim().trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }
}

/// Which entity store backs the gateway.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local store seeded with sample rows. Lost on exit.
    #[default]
    Memory,
    /// Durable SQLite database.
    Sqlite,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
        })
    }
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "development" | "dev" => Ok(Self::Memory),
            "sqlite" | "production" | "prod" => Ok(Self::Sqlite),
            other => Err(format!("unknown storage backend: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// SQLite connection URL. Defaults to `<data_dir>/agenthub.db`.
    pub database_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret used to sign bearer tokens. When unset a random secret is
    /// generated per process, which invalidates all tokens on restart.
    pub jwt_secret: Option<String>,
    pub session_ttl_hours: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            session_ttl_hours: 24,
        }
    }
}

/// Artificial latency applied to simulated agent replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 500,
            max_delay_ms: 2500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// How long a simulated container start/stop/restart/deploy takes.
    pub container_action_delay_ms: u64,
    /// Interval of the system metric sampler. `0` disables it.
    pub metrics_interval_secs: u64,
    /// Create the demo `admin` and `ops` accounts when running in memory mode.
    pub seed_demo_users: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            container_action_delay_ms: 2000,
            metrics_interval_secs: 30,
            seed_demo_users: true,
        }
    }
}
