use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, schema::AgentHubConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "agenthub.toml",
    "agenthub.yaml",
    "agenthub.yml",
    "agenthub.json",
];

/// Override for the config directory, set via `set_config_dir()`.
static CONFIG_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Set a custom config directory. When set, discovery only looks in this
/// directory; project-local and user-global paths are skipped.
pub fn set_config_dir(path: PathBuf) {
    *CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(|e| e.into_inner()) = Some(path);
}

/// Clear the config directory override, restoring default discovery.
pub fn clear_config_dir() {
    *CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(|e| e.into_inner()) = None;
}

fn config_dir_override() -> Option<PathBuf> {
    CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .clone()
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<AgentHubConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations, then apply environment
/// overrides.
///
/// Search order:
/// 1. `./agenthub.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/agenthub/agenthub.{toml,yaml,yml,json}` (user-global)
///
/// Falls back to `AgentHubConfig::default()` when nothing is found or the file
/// fails to parse.
pub fn discover_and_load() -> AgentHubConfig {
    let mut config = match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                AgentHubConfig::default()
            })
        },
        None => {
            debug!("no config file found, using defaults");
            AgentHubConfig::default()
        },
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

/// Apply `AGENTHUB_*` overrides on top of file values.
///
/// `lookup` resolves a variable name; the real environment in production,
/// a map in tests.
pub fn apply_env_overrides(config: &mut AgentHubConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(secret) = lookup("AGENTHUB_JWT_SECRET").filter(|s| !s.is_empty()) {
        config.auth.jwt_secret = Some(secret);
    }
    if let Some(bind) = lookup("AGENTHUB_BIND") {
        config.server.bind = bind;
    }
    if let Some(port) = lookup("AGENTHUB_PORT") {
        match port.parse() {
            Ok(port) => config.server.port = port,
            Err(_) => warn!(value = %port, "ignoring invalid AGENTHUB_PORT"),
        }
    }
    if let Some(base_path) = lookup("AGENTHUB_BASE_PATH") {
        config.server.base_path = base_path;
    }
    if let Some(backend) = lookup("AGENTHUB_STORAGE") {
        match backend.parse() {
            Ok(backend) => config.storage.backend = backend,
            Err(e) => warn!(error = %e, "ignoring invalid AGENTHUB_STORAGE"),
        }
    }
    if let Some(url) = lookup("AGENTHUB_DATABASE_URL") {
        config.storage.database_url = Some(url);
    }
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    if let Some(dir) = config_dir_override() {
        // Override is set, don't fall through to other locations.
        return CONFIG_FILENAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|p| p.exists());
    }

    if let Some(p) = CONFIG_FILENAMES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
    {
        return Some(p);
    }

    let dir = home_dir()?.join(".config").join("agenthub");
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the data directory: `~/.agenthub/` on all platforms.
pub fn data_dir() -> PathBuf {
    home_dir()
        .map(|h| h.join(".agenthub"))
        .unwrap_or_else(|| PathBuf::from(".agenthub"))
}

fn home_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<AgentHubConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::schema::StorageBackend;

    #[test]
    fn loads_each_format() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("agenthub.toml");
        std::fs::write(&toml_path, "[server]\nport = 7000\n").unwrap();
        assert_eq!(load_config(&toml_path).unwrap().server.port, 7000);

        let yaml_path = dir.path().join("agenthub.yaml");
        std::fs::write(&yaml_path, "storage:\n  backend: sqlite\n").unwrap();
        assert_eq!(
            load_config(&yaml_path).unwrap().storage.backend,
            StorageBackend::Sqlite
        );

        let json_path = dir.path().join("agenthub.json");
        std::fs::write(&json_path, r#"{"chat":{"min_delay_ms":10}}"#).unwrap();
        assert_eq!(load_config(&json_path).unwrap().chat.min_delay_ms, 10);
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agenthub.ini");
        std::fs::write(&path, "port=1").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn discovery_honours_config_dir_override() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("agenthub.toml"),
            "[server]\nbase_path = \"/dash\"\n",
        )
        .unwrap();

        set_config_dir(dir.path().to_path_buf());
        let found = find_config_file();
        clear_config_dir();

        assert_eq!(found, Some(dir.path().join("agenthub.toml")));
    }

    #[test]
    fn env_overrides_win_over_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("AGENTHUB_JWT_SECRET", "s3cret"),
            ("AGENTHUB_PORT", "9100"),
            ("AGENTHUB_STORAGE", "production"),
            ("AGENTHUB_BASE_PATH", "/hub"),
        ]);
        let mut config = AgentHubConfig::default();
        apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.auth.jwt_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.server.normalized_base_path(), "/hub");
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let mut config = AgentHubConfig::default();
        apply_env_overrides(&mut config, |k| match k {
            "AGENTHUB_PORT" => Some("not-a-port".into()),
            "AGENTHUB_STORAGE" => Some("mongo".into()),
            "AGENTHUB_JWT_SECRET" => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert!(config.auth.jwt_secret.is_none());
    }
}
