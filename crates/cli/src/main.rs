mod user_commands;

use std::path::PathBuf;

use {
    agenthub_config::StorageBackend,
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "agenthub", about = "AgentHub, a role-based AI agent dashboard backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Directory to look for agenthub.{toml,yaml,json} in.
    #[arg(long, global = true, env = "AGENTHUB_CONFIG_DIR")]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server.
    Gateway {
        /// Overrides `server.bind`.
        #[arg(long)]
        bind: Option<String>,
        /// Overrides `server.port`.
        #[arg(long)]
        port: Option<u16>,
        /// Overrides `storage.backend` (memory or sqlite).
        #[arg(long)]
        storage: Option<StorageBackend>,
    },
    /// User management against the configured SQLite database.
    User {
        #[command(subcommand)]
        action: user_commands::UserAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    if let Some(dir) = &cli.config_dir {
        agenthub_config::set_config_dir(dir.clone());
    }
    let mut config = agenthub_config::discover_and_load();

    info!(version = env!("CARGO_PKG_VERSION"), "agenthub starting");

    match cli.command {
        Commands::Gateway {
            bind,
            port,
            storage,
        } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(storage) = storage {
                config.storage.backend = storage;
            }
            agenthub_gateway::start_gateway(config).await
        },
        Commands::User { action } => user_commands::handle_user(action, config).await,
    }
}
