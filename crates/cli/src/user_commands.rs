use {
    agenthub_auth::{AuthService, RegisterRequest, generate_secret},
    agenthub_config::{AgentHubConfig, StorageBackend},
    anyhow::Result,
    clap::Subcommand,
    secrecy::Secret,
};

#[derive(Subcommand)]
pub enum UserAction {
    /// Create a user in the SQLite database.
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        /// Read from the environment when omitted.
        #[arg(long, env = "AGENTHUB_USER_PASSWORD", hide_env_values = true)]
        password: String,
        /// admin or team_member.
        #[arg(long, default_value = "team_member")]
        role: String,
        /// Required for team members, ignored for admins.
        #[arg(long)]
        team: Option<String>,
    },
}

pub async fn handle_user(action: UserAction, config: AgentHubConfig) -> Result<()> {
    match action {
        UserAction::Create {
            username,
            email,
            password,
            role,
            team,
        } => {
            create(config, RegisterRequest {
                username,
                email,
                password,
                role,
                team,
            })
            .await
        },
    }
}

async fn create(mut config: AgentHubConfig, request: RegisterRequest) -> Result<()> {
    // An in-memory user would vanish on exit.
    config.storage.backend = StorageBackend::Sqlite;
    let store = agenthub_gateway::open_store(&config).await?;

    // No sessions are issued here, so the signing secret is irrelevant.
    let auth = AuthService::new(store, Secret::new(generate_secret()), 1);
    let user = auth.create_user(request).await?;

    println!(
        "Created {} '{}' ({}){}",
        user.role,
        user.username,
        user.email,
        user.team
            .as_deref()
            .map(|t| format!(" in team {t}"))
            .unwrap_or_default()
    );
    Ok(())
}
