//! Storage contract shared by the in-memory and SQLite backends.

use async_trait::async_trait;

use crate::{
    error::Result,
    scope::Scope,
    types::{
        ActivityLog, Agent, AgentStats, AgentStatus, AgentUpdate, Interaction, NewActivityLog,
        NewAgent, NewInteraction, NewSession, NewSystemMetric, NewUser, Session, SystemMetric,
        User, UserUpdate,
    },
};

/// Most recent interactions returned per query.
pub const INTERACTION_LIMIT: usize = 100;
/// Most recent system metric snapshots returned per query.
pub const SYSTEM_METRIC_LIMIT: usize = 50;
/// Most recent activity log entries returned per query (and retained in memory).
pub const ACTIVITY_LOG_LIMIT: usize = 100;

#[async_trait]
pub trait EntityStore: Send + Sync {
    // ---- users ----

    /// Fails with `StoreError::Conflict` when the username or email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User>;
    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Returns `None` when no user has this id.
    async fn update_user(&self, id: &str, update: UserUpdate) -> Result<Option<User>>;

    // ---- auth sessions ----

    async fn create_session(&self, session: NewSession) -> Result<Session>;
    async fn get_session(&self, token: &str) -> Result<Option<Session>>;
    /// Returns whether a session was removed.
    async fn delete_session(&self, token: &str) -> Result<bool>;

    // ---- agents ----

    /// Agents admitted by `scope`, newest first.
    async fn get_agents(&self, scope: &Scope) -> Result<Vec<Agent>>;
    /// `None` both when the id is unknown and when the agent is out of scope.
    async fn get_agent(&self, id: &str, scope: &Scope) -> Result<Option<Agent>>;
    async fn create_agent(&self, agent: NewAgent) -> Result<Agent>;
    /// Updates an active agent. `None` when missing or soft-deleted.
    async fn update_agent(&self, id: &str, update: AgentUpdate) -> Result<Option<Agent>>;
    /// Soft delete. Returns whether an active agent was affected.
    async fn delete_agent(&self, id: &str) -> Result<bool>;
    async fn update_agent_status(&self, id: &str, status: AgentStatus) -> Result<()>;

    // ---- interactions ----

    /// Newest first, at most [`INTERACTION_LIMIT`].
    async fn get_interactions(&self, agent_id: Option<&str>) -> Result<Vec<Interaction>>;
    async fn create_interaction(&self, interaction: NewInteraction) -> Result<Interaction>;

    // ---- system metrics ----

    /// Newest first, at most [`SYSTEM_METRIC_LIMIT`].
    async fn get_system_metrics(&self) -> Result<Vec<SystemMetric>>;
    async fn create_system_metric(&self, metric: NewSystemMetric) -> Result<SystemMetric>;

    // ---- activity logs ----

    /// Newest first, at most [`ACTIVITY_LOG_LIMIT`].
    async fn get_activity_logs(&self) -> Result<Vec<ActivityLog>>;
    /// Entries attached to any of `agent_ids`, newest first, at most
    /// [`ACTIVITY_LOG_LIMIT`]. The filter runs before the limit.
    async fn get_agent_activity_logs(&self, agent_ids: &[String]) -> Result<Vec<ActivityLog>>;
    async fn create_activity_log(&self, log: NewActivityLog) -> Result<ActivityLog>;

    // ---- derived reads ----

    /// Agent counters computed over exactly the agents `scope` admits.
    async fn get_stats(&self, scope: &Scope) -> Result<AgentStats> {
        let agents = self.get_agents(scope).await?;
        Ok(AgentStats::tally(&agents))
    }

    /// Activity logs visible to `scope`: everything for an unrestricted scope,
    /// otherwise only entries attached to an agent the scope admits.
    async fn get_activity_logs_in(&self, scope: &Scope) -> Result<Vec<ActivityLog>> {
        if scope.is_unrestricted() {
            return self.get_activity_logs().await;
        }
        let visible: Vec<String> = self
            .get_agents(scope)
            .await?
            .into_iter()
            .map(|a| a.id)
            .collect();
        if visible.is_empty() {
            return Ok(Vec::new());
        }
        self.get_agent_activity_logs(&visible).await
    }
}
