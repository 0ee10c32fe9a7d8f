use std::str::FromStr;

use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    sqlx::{
        SqlitePool,
        sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    },
    tracing::debug,
};

use crate::{
    error::{Result, StoreError},
    scope::Scope,
    store::{ACTIVITY_LOG_LIMIT, EntityStore, INTERACTION_LIMIT, SYSTEM_METRIC_LIMIT},
    types::{
        ActivityLog, Agent, AgentStatus, AgentUpdate, Interaction, NewActivityLog, NewAgent,
        NewInteraction, NewSession, NewSystemMetric, NewUser, Session, SystemMetric, User,
        UserUpdate,
    },
};

// ── Timestamp helpers ────────────────────────────────────────────────────────

fn to_ms(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

fn from_ms(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

fn parse_column<T: FromStr<Err = String>>(value: &str) -> Result<T> {
    value.parse().map_err(StoreError::InvalidRow)
}

/// Map a unique-constraint violation to `Conflict`, naming the column when
/// SQLite reports it.
fn conflict_or(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err
        && db.is_unique_violation()
    {
        let message = db.message();
        let what = if message.contains("users.username") {
            "username"
        } else if message.contains("users.email") {
            "email"
        } else if message.contains("sessions.token") {
            "session token"
        } else {
            "record"
        };
        return StoreError::Conflict(format!("{what} already exists"));
    }
    StoreError::Database(err)
}

// ── Rows ─────────────────────────────────────────────────────────────────────

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    username: String,
    email: String,
    password_hash: String,
    role: String,
    team: Option<String>,
    is_active: i64,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(r: UserRow) -> Result<Self> {
        Ok(Self {
            id: r.id,
            username: r.username,
            email: r.email,
            password_hash: r.password_hash,
            role: parse_column(&r.role)?,
            team: r.team,
            is_active: r.is_active != 0,
            created_at: from_ms(r.created_at),
            updated_at: from_ms(r.updated_at),
        })
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: String,
    user_id: String,
    token: String,
    expires_at: i64,
    created_at: i64,
}

impl From<SessionRow> for Session {
    fn from(r: SessionRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            token: r.token,
            expires_at: from_ms(r.expires_at),
            created_at: from_ms(r.created_at),
        }
    }
}

#[derive(sqlx::FromRow)]
struct AgentRow {
    id: String,
    name: String,
    team: String,
    description: String,
    tech_stack: String,
    agent_type: String,
    status: String,
    container_url: Option<String>,
    container_image: Option<String>,
    response_time: String,
    uptime: String,
    last_health_check: Option<i64>,
    capabilities: String,
    is_active: i64,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<AgentRow> for Agent {
    type Error = StoreError;

    fn try_from(r: AgentRow) -> Result<Self> {
        Ok(Self {
            id: r.id,
            name: r.name,
            team: r.team,
            description: r.description,
            tech_stack: r.tech_stack,
            agent_type: r.agent_type,
            status: parse_column(&r.status)?,
            container_url: r.container_url,
            container_image: r.container_image,
            response_time: r.response_time,
            uptime: r.uptime,
            last_health_check: r.last_health_check.map(from_ms),
            capabilities: serde_json::from_str(&r.capabilities)?,
            is_active: r.is_active != 0,
            created_at: from_ms(r.created_at),
            updated_at: from_ms(r.updated_at),
        })
    }
}

#[derive(sqlx::FromRow)]
struct InteractionRow {
    id: String,
    agent_id: String,
    session_id: String,
    message: String,
    response: String,
    response_time: i64,
    success: i64,
    timestamp: i64,
}

impl From<InteractionRow> for Interaction {
    fn from(r: InteractionRow) -> Self {
        Self {
            id: r.id,
            agent_id: r.agent_id,
            session_id: r.session_id,
            message: r.message,
            response: r.response,
            response_time: r.response_time.max(0) as u64,
            success: r.success != 0,
            timestamp: from_ms(r.timestamp),
        }
    }
}

#[derive(sqlx::FromRow)]
struct MetricRow {
    id: String,
    metric_name: String,
    value: String,
    timestamp: i64,
}

impl From<MetricRow> for SystemMetric {
    fn from(r: MetricRow) -> Self {
        Self {
            id: r.id,
            metric_name: r.metric_name,
            value: r.value,
            timestamp: from_ms(r.timestamp),
        }
    }
}

#[derive(sqlx::FromRow)]
struct ActivityRow {
    id: String,
    kind: String,
    agent_id: Option<String>,
    message: String,
    details: Option<String>,
    timestamp: i64,
}

impl TryFrom<ActivityRow> for ActivityLog {
    type Error = StoreError;

    fn try_from(r: ActivityRow) -> Result<Self> {
        Ok(Self {
            id: r.id,
            kind: parse_column(&r.kind)?,
            agent_id: r.agent_id,
            message: r.message,
            details: r.details.as_deref().map(serde_json::from_str).transpose()?,
            timestamp: from_ms(r.timestamp),
        })
    }
}

// ── Store ────────────────────────────────────────────────────────────────────

/// SQLite-backed entity store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database at `url` and ensure the schema.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Self::init(&pool).await?;
        debug!(url, "sqlite store ready");
        Ok(Self::new(pool))
    }

    /// Create all tables if they don't exist.
    pub async fn init(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS users (
                id            TEXT PRIMARY KEY,
                username      TEXT NOT NULL UNIQUE,
                email         TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                role          TEXT NOT NULL,
                team          TEXT,
                is_active     INTEGER NOT NULL DEFAULT 1,
                created_at    INTEGER NOT NULL,
                updated_at    INTEGER NOT NULL
            )"#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS sessions (
                id         TEXT PRIMARY KEY,
                user_id    TEXT NOT NULL REFERENCES users(id),
                token      TEXT NOT NULL UNIQUE,
                expires_at INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            )"#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS agents (
                id                TEXT PRIMARY KEY,
                name              TEXT NOT NULL,
                team              TEXT NOT NULL,
                description       TEXT NOT NULL DEFAULT '',
                tech_stack        TEXT NOT NULL DEFAULT '',
                agent_type        TEXT NOT NULL,
                status            TEXT NOT NULL DEFAULT 'offline',
                container_url     TEXT,
                container_image   TEXT,
                response_time     TEXT NOT NULL DEFAULT 'N/A',
                uptime            TEXT NOT NULL DEFAULT '0%',
                last_health_check INTEGER,
                capabilities      TEXT NOT NULL DEFAULT '[]',
                is_active         INTEGER NOT NULL DEFAULT 1,
                created_at        INTEGER NOT NULL,
                updated_at        INTEGER NOT NULL
            )"#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS interactions (
                id            TEXT PRIMARY KEY,
                agent_id      TEXT NOT NULL,
                session_id    TEXT NOT NULL,
                message       TEXT NOT NULL,
                response      TEXT NOT NULL,
                response_time INTEGER NOT NULL,
                success       INTEGER NOT NULL,
                timestamp     INTEGER NOT NULL
            )"#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS system_metrics (
                id          TEXT PRIMARY KEY,
                metric_name TEXT NOT NULL,
                value       TEXT NOT NULL,
                timestamp   INTEGER NOT NULL
            )"#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS activity_logs (
                id        TEXT PRIMARY KEY,
                kind      TEXT NOT NULL,
                agent_id  TEXT,
                message   TEXT NOT NULL,
                details   TEXT,
                timestamp INTEGER NOT NULL
            )"#,
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_interactions_agent ON interactions(agent_id, timestamp)")
            .execute(pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_metrics_name ON system_metrics(metric_name, timestamp)")
            .execute(pool)
            .await?;

        Ok(())
    }

    async fn fetch_user(&self, column: &str, value: &str) -> Result<Option<User>> {
        // `column` is always one of our own literals, never user input.
        let sql = format!("SELECT * FROM users WHERE {column} = ?");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn fetch_agent(&self, id: &str) -> Result<Option<Agent>> {
        sqlx::query_as::<_, AgentRow>("SELECT * FROM agents WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Agent::try_from)
            .transpose()
    }
}

#[async_trait]
impl EntityStore for SqliteStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let now = Utc::now();
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            team: user.team,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        sqlx::query(
            r#"INSERT INTO users (id, username, email, password_hash, role, team, is_active, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?)"#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.team)
        .bind(to_ms(now))
        .bind(to_ms(now))
        .execute(&self.pool)
        .await
        .map_err(conflict_or)?;
        Ok(user)
    }

    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        self.fetch_user("id", id).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.fetch_user("username", username).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.fetch_user("email", email).await
    }

    async fn update_user(&self, id: &str, update: UserUpdate) -> Result<Option<User>> {
        let Some(mut user) = self.get_user_by_id(id).await? else {
            return Ok(None);
        };
        user.apply(update, Utc::now());
        sqlx::query(
            "UPDATE users SET email = ?, password_hash = ?, is_active = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_active as i64)
        .bind(to_ms(user.updated_at))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(conflict_or)?;
        Ok(Some(user))
    }

    async fn create_session(&self, session: NewSession) -> Result<Session> {
        let session = Session {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: session.user_id,
            token: session.token,
            expires_at: session.expires_at,
            created_at: Utc::now(),
        };
        sqlx::query(
            "INSERT INTO sessions (id, user_id, token, expires_at, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(&session.token)
        .bind(to_ms(session.expires_at))
        .bind(to_ms(session.created_at))
        .execute(&self.pool)
        .await
        .map_err(conflict_or)?;
        Ok(session)
    }

    async fn get_session(&self, token: &str) -> Result<Option<Session>> {
        Ok(
            sqlx::query_as::<_, SessionRow>("SELECT * FROM sessions WHERE token = ?")
                .bind(token)
                .fetch_optional(&self.pool)
                .await?
                .map(Into::into),
        )
    }

    async fn delete_session(&self, token: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_agents(&self, scope: &Scope) -> Result<Vec<Agent>> {
        if *scope == Scope::Nothing {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, AgentRow>(
            "SELECT * FROM agents WHERE is_active = 1 ORDER BY created_at DESC, rowid DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        let mut agents = Vec::with_capacity(rows.len());
        for row in rows {
            let agent = Agent::try_from(row)?;
            if scope.admits(&agent) {
                agents.push(agent);
            }
        }
        Ok(agents)
    }

    async fn get_agent(&self, id: &str, scope: &Scope) -> Result<Option<Agent>> {
        Ok(self.fetch_agent(id).await?.filter(|a| scope.admits(a)))
    }

    async fn create_agent(&self, agent: NewAgent) -> Result<Agent> {
        let agent = Agent::from_new(agent, Utc::now());
        sqlx::query(
            r#"INSERT INTO agents (id, name, team, description, tech_stack, agent_type, status,
                                   container_url, container_image, response_time, uptime,
                                   last_health_check, capabilities, is_active, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)"#,
        )
        .bind(&agent.id)
        .bind(&agent.name)
        .bind(&agent.team)
        .bind(&agent.description)
        .bind(&agent.tech_stack)
        .bind(&agent.agent_type)
        .bind(agent.status.as_str())
        .bind(&agent.container_url)
        .bind(&agent.container_image)
        .bind(&agent.response_time)
        .bind(&agent.uptime)
        .bind(agent.last_health_check.map(to_ms))
        .bind(serde_json::to_string(&agent.capabilities)?)
        .bind(to_ms(agent.created_at))
        .bind(to_ms(agent.updated_at))
        .execute(&self.pool)
        .await?;
        Ok(agent)
    }

    async fn update_agent(&self, id: &str, update: AgentUpdate) -> Result<Option<Agent>> {
        let Some(mut agent) = self.fetch_agent(id).await?.filter(Agent::is_visible) else {
            return Ok(None);
        };
        agent.apply(update, Utc::now());
        sqlx::query(
            r#"UPDATE agents SET name = ?, team = ?, description = ?, tech_stack = ?, agent_type = ?,
                                 container_url = ?, container_image = ?, response_time = ?, uptime = ?,
                                 last_health_check = ?, capabilities = ?, updated_at = ?
               WHERE id = ? AND is_active = 1"#,
        )
        .bind(&agent.name)
        .bind(&agent.team)
        .bind(&agent.description)
        .bind(&agent.tech_stack)
        .bind(&agent.agent_type)
        .bind(&agent.container_url)
        .bind(&agent.container_image)
        .bind(&agent.response_time)
        .bind(&agent.uptime)
        .bind(agent.last_health_check.map(to_ms))
        .bind(serde_json::to_string(&agent.capabilities)?)
        .bind(to_ms(agent.updated_at))
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(Some(agent))
    }

    async fn delete_agent(&self, id: &str) -> Result<bool> {
        let result =
            sqlx::query("UPDATE agents SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1")
                .bind(to_ms(Utc::now()))
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_agent_status(&self, id: &str, status: AgentStatus) -> Result<()> {
        sqlx::query("UPDATE agents SET status = ?, updated_at = ? WHERE id = ? AND is_active = 1")
            .bind(status.as_str())
            .bind(to_ms(Utc::now()))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_interactions(&self, agent_id: Option<&str>) -> Result<Vec<Interaction>> {
        let rows = match agent_id {
            Some(agent_id) => {
                sqlx::query_as::<_, InteractionRow>(
                    "SELECT * FROM interactions WHERE agent_id = ? ORDER BY timestamp DESC, rowid DESC LIMIT ?",
                )
                .bind(agent_id)
                .bind(INTERACTION_LIMIT as i64)
                .fetch_all(&self.pool)
                .await?
            },
            None => {
                sqlx::query_as::<_, InteractionRow>(
                    "SELECT * FROM interactions ORDER BY timestamp DESC, rowid DESC LIMIT ?",
                )
                .bind(INTERACTION_LIMIT as i64)
                .fetch_all(&self.pool)
                .await?
            },
        };
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_interaction(&self, interaction: NewInteraction) -> Result<Interaction> {
        let interaction = Interaction {
            id: uuid::Uuid::new_v4().to_string(),
            agent_id: interaction.agent_id,
            session_id: interaction.session_id,
            message: interaction.message,
            response: interaction.response,
            response_time: interaction.response_time,
            success: interaction.success,
            timestamp: Utc::now(),
        };
        sqlx::query(
            r#"INSERT INTO interactions (id, agent_id, session_id, message, response, response_time, success, timestamp)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&interaction.id)
        .bind(&interaction.agent_id)
        .bind(&interaction.session_id)
        .bind(&interaction.message)
        .bind(&interaction.response)
        .bind(interaction.response_time as i64)
        .bind(interaction.success as i64)
        .bind(to_ms(interaction.timestamp))
        .execute(&self.pool)
        .await?;
        Ok(interaction)
    }

    async fn get_system_metrics(&self) -> Result<Vec<SystemMetric>> {
        Ok(sqlx::query_as::<_, MetricRow>(
            "SELECT * FROM system_metrics ORDER BY timestamp DESC, rowid DESC LIMIT ?",
        )
        .bind(SYSTEM_METRIC_LIMIT as i64)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Into::into)
        .collect())
    }

    async fn create_system_metric(&self, metric: NewSystemMetric) -> Result<SystemMetric> {
        let metric = SystemMetric {
            id: uuid::Uuid::new_v4().to_string(),
            metric_name: metric.metric_name,
            value: metric.value,
            timestamp: Utc::now(),
        };
        sqlx::query("INSERT INTO system_metrics (id, metric_name, value, timestamp) VALUES (?, ?, ?, ?)")
            .bind(&metric.id)
            .bind(&metric.metric_name)
            .bind(&metric.value)
            .bind(to_ms(metric.timestamp))
            .execute(&self.pool)
            .await?;
        Ok(metric)
    }

    async fn get_activity_logs(&self) -> Result<Vec<ActivityLog>> {
        sqlx::query_as::<_, ActivityRow>(
            "SELECT * FROM activity_logs ORDER BY timestamp DESC, rowid DESC LIMIT ?",
        )
        .bind(ACTIVITY_LOG_LIMIT as i64)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(ActivityLog::try_from)
        .collect()
    }

    async fn get_agent_activity_logs(&self, agent_ids: &[String]) -> Result<Vec<ActivityLog>> {
        sqlx::query_as::<_, ActivityRow>(
            "SELECT * FROM activity_logs WHERE agent_id IN (SELECT value FROM json_each(?)) \
             ORDER BY timestamp DESC, rowid DESC LIMIT ?",
        )
        .bind(serde_json::to_string(agent_ids)?)
        .bind(ACTIVITY_LOG_LIMIT as i64)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(ActivityLog::try_from)
        .collect()
    }

    async fn create_activity_log(&self, log: NewActivityLog) -> Result<ActivityLog> {
        let log = ActivityLog {
            id: uuid::Uuid::new_v4().to_string(),
            kind: log.kind,
            agent_id: log.agent_id,
            message: log.message,
            details: log.details,
            timestamp: Utc::now(),
        };
        let details = log.details.as_ref().map(serde_json::to_string).transpose()?;
        sqlx::query(
            "INSERT INTO activity_logs (id, kind, agent_id, message, details, timestamp) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&log.id)
        .bind(log.kind.as_str())
        .bind(&log.agent_id)
        .bind(&log.message)
        .bind(details)
        .bind(to_ms(log.timestamp))
        .execute(&self.pool)
        .await?;
        Ok(log)
    }
}
