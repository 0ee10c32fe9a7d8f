//! Domain records shared by every backend.

use std::{collections::BTreeMap, fmt, str::FromStr};

use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

// ── Users ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    TeamMember,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::TeamMember => "team_member",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "team_member" => Ok(Self::TeamMember),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    /// `None` for admins, the owning team for team members.
    pub team: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub team: Option<String>,
}

/// Partial user update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub is_active: Option<bool>,
}

impl User {
    pub fn apply(&mut self, update: UserUpdate, now: DateTime<Utc>) {
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(hash) = update.password_hash {
            self.password_hash = hash;
        }
        if let Some(active) = update.is_active {
            self.is_active = active;
        }
        self.updated_at = now;
    }
}

// ── Auth sessions ────────────────────────────────────────────────────────────

/// Server-side record backing a bearer token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

// ── Agents ───────────────────────────────────────────────────────────────────

/// The six agent taxonomy labels.
pub const AGENT_TYPES: [&str; 6] = [
    "customer_service",
    "code_assistant",
    "data_analysis",
    "content_creation",
    "research",
    "sales",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Online,
    #[default]
    Offline,
    Busy,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Busy => "busy",
        }
    }

    /// Whether the status is counted as active in dashboard stats.
    pub fn counts_as_active(&self) -> bool {
        matches!(self, Self::Online | Self::Busy)
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentStatus {
    type Err = String;

    /// Accepts the legacy `active` and `error` spellings found in older rows.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online" | "active" => Ok(Self::Online),
            "offline" | "error" => Ok(Self::Offline),
            "busy" => Ok(Self::Busy),
            other => Err(format!("unknown agent status: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub team: String,
    pub description: String,
    /// Comma-joined free text, e.g. `"Python, FastAPI, Redis"`.
    pub tech_stack: String,
    pub agent_type: String,
    pub status: AgentStatus,
    pub container_url: Option<String>,
    pub container_image: Option<String>,
    pub response_time: String,
    pub uptime: String,
    pub last_health_check: Option<DateTime<Utc>>,
    pub capabilities: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Agent {
    /// Build a fresh agent record: `offline`, active, server-assigned id.
    pub fn from_new(new: NewAgent, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: new.name,
            team: new.team,
            description: new.description,
            tech_stack: new.tech_stack,
            agent_type: new.agent_type,
            status: AgentStatus::Offline,
            container_url: new.container_url,
            container_image: new.container_image,
            response_time: "N/A".into(),
            uptime: "0%".into(),
            last_health_check: None,
            capabilities: new.capabilities,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Soft-deleted agents are never visible, whatever the scope.
    pub fn is_visible(&self) -> bool {
        self.is_active
    }

    pub fn apply(&mut self, update: AgentUpdate, now: DateTime<Utc>) {
        let AgentUpdate {
            name,
            team,
            description,
            tech_stack,
            agent_type,
            container_url,
            container_image,
            capabilities,
            response_time,
            uptime,
            last_health_check,
        } = update;

        if let Some(v) = name {
            self.name = v;
        }
        if let Some(v) = team {
            self.team = v;
        }
        if let Some(v) = description {
            self.description = v;
        }
        if let Some(v) = tech_stack {
            self.tech_stack = v;
        }
        if let Some(v) = agent_type {
            self.agent_type = v;
        }
        if let Some(v) = container_url {
            self.container_url = Some(v);
        }
        if let Some(v) = container_image {
            self.container_image = Some(v);
        }
        if let Some(v) = capabilities {
            self.capabilities = v;
        }
        if let Some(v) = response_time {
            self.response_time = v;
        }
        if let Some(v) = uptime {
            self.uptime = v;
        }
        if let Some(v) = last_health_check {
            self.last_health_check = Some(v);
        }
        self.updated_at = now;
    }
}

/// A field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAgent {
    pub name: String,
    pub team: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tech_stack: String,
    pub agent_type: String,
    #[serde(default)]
    pub container_url: Option<String>,
    #[serde(default)]
    pub container_image: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

impl NewAgent {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(FieldError::new("name", "name is required"));
        } else if self.name.len() > 100 {
            errors.push(FieldError::new("name", "name must be at most 100 characters"));
        }
        if self.team.trim().is_empty() {
            errors.push(FieldError::new("team", "team is required"));
        }
        if !AGENT_TYPES.contains(&self.agent_type.as_str()) {
            errors.push(FieldError::new(
                "agentType",
                format!("agentType must be one of: {}", AGENT_TYPES.join(", ")),
            ));
        }
        if self.capabilities.iter().any(|c| c.trim().is_empty()) {
            errors.push(FieldError::new("capabilities", "capabilities must not be blank"));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Partial agent update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentUpdate {
    pub name: Option<String>,
    pub team: Option<String>,
    pub description: Option<String>,
    pub tech_stack: Option<String>,
    pub agent_type: Option<String>,
    pub container_url: Option<String>,
    pub container_image: Option<String>,
    pub capabilities: Option<Vec<String>>,
    #[serde(skip)]
    pub response_time: Option<String>,
    #[serde(skip)]
    pub uptime: Option<String>,
    #[serde(skip)]
    pub last_health_check: Option<DateTime<Utc>>,
}

impl AgentUpdate {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            errors.push(FieldError::new("name", "name must not be blank"));
        }
        if self.team.as_deref().is_some_and(|t| t.trim().is_empty()) {
            errors.push(FieldError::new("team", "team must not be blank"));
        }
        if let Some(kind) = &self.agent_type
            && !AGENT_TYPES.contains(&kind.as_str())
        {
            errors.push(FieldError::new(
                "agentType",
                format!("agentType must be one of: {}", AGENT_TYPES.join(", ")),
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Per-scope agent counters for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStats {
    pub total_agents: usize,
    pub active_agents: usize,
    pub offline_agents: usize,
    pub agent_types: BTreeMap<String, usize>,
}

impl AgentStats {
    pub fn tally(agents: &[Agent]) -> Self {
        let mut stats = Self {
            total_agents: agents.len(),
            ..Self::default()
        };
        for agent in agents {
            if agent.status.counts_as_active() {
                stats.active_agents += 1;
            } else {
                stats.offline_agents += 1;
            }
            *stats.agent_types.entry(agent.agent_type.clone()).or_default() += 1;
        }
        stats
    }
}

// ── Interactions ─────────────────────────────────────────────────────────────

/// One chat exchange with an agent. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub id: String,
    pub agent_id: String,
    /// WebSocket session id of the chat connection (not an auth session).
    pub session_id: String,
    pub message: String,
    pub response: String,
    /// Milliseconds.
    pub response_time: u64,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewInteraction {
    pub agent_id: String,
    pub session_id: String,
    pub message: String,
    pub response: String,
    pub response_time: u64,
    pub success: bool,
}

// ── System metrics ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMetric {
    pub id: String,
    pub metric_name: String,
    pub value: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSystemMetric {
    pub metric_name: String,
    pub value: String,
}

// ── Activity logs ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    AgentRegistered,
    AgentStatusChange,
    Interaction,
    SystemEvent,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AgentRegistered => "agent_registered",
            Self::AgentStatusChange => "agent_status_change",
            Self::Interaction => "interaction",
            Self::SystemEvent => "system_event",
        }
    }
}

impl FromStr for ActivityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "agent_registered" => Ok(Self::AgentRegistered),
            "agent_status_change" => Ok(Self::AgentStatusChange),
            "interaction" => Ok(Self::Interaction),
            "system_event" => Ok(Self::SystemEvent),
            other => Err(format!("unknown activity type: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActivityType,
    pub agent_id: Option<String>,
    pub message: String,
    pub details: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewActivityLog {
    pub kind: ActivityType,
    pub agent_id: Option<String>,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl NewActivityLog {
    pub fn new(kind: ActivityType, message: impl Into<String>) -> Self {
        Self {
            kind,
            agent_id: None,
            message: message.into(),
            details: None,
        }
    }

    pub fn agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}
