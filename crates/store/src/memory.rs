//! Process-local store. All tables live behind one lock, so uniqueness checks
//! and inserts happen atomically.

use std::collections::{HashMap, VecDeque};

use {async_trait::async_trait, chrono::Utc, tokio::sync::RwLock};

use crate::{
    error::{Result, StoreError},
    scope::Scope,
    seed,
    store::{ACTIVITY_LOG_LIMIT, EntityStore, INTERACTION_LIMIT, SYSTEM_METRIC_LIMIT},
    types::{
        ActivityLog, Agent, AgentStatus, AgentUpdate, Interaction, NewActivityLog, NewAgent,
        NewInteraction, NewSession, NewSystemMetric, NewUser, Session, SystemMetric, User,
        UserUpdate,
    },
};

#[derive(Default)]
struct Tables {
    /// id → user
    users: HashMap<String, User>,
    /// token → session
    sessions: HashMap<String, Session>,
    /// Insertion order, oldest first.
    agents: Vec<Agent>,
    /// Capped at [`RETAINED_INTERACTIONS`], oldest first.
    interactions: VecDeque<Interaction>,
    /// Capped at [`RETAINED_METRICS`], oldest first.
    metrics: VecDeque<SystemMetric>,
    /// Capped at [`ACTIVITY_LOG_LIMIT`], oldest first.
    activity: VecDeque<ActivityLog>,
}

/// Interactions kept in memory across all agents.
const RETAINED_INTERACTIONS: usize = INTERACTION_LIMIT * 10;
/// Metric snapshots kept in memory. The sampler appends a few every interval.
const RETAINED_METRICS: usize = SYSTEM_METRIC_LIMIT * 10;

fn push_capped<T>(rows: &mut VecDeque<T>, row: T, cap: usize) {
    rows.push_back(row);
    while rows.len() > cap {
        rows.pop_front();
    }
}

impl Tables {
    fn username_taken(&self, username: &str) -> bool {
        self.users.values().any(|u| u.username == username)
    }

    fn email_taken(&self, email: &str, except_id: Option<&str>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id.as_str()) != except_id)
    }

    fn active_agent_mut(&mut self, id: &str) -> Option<&mut Agent> {
        self.agents
            .iter_mut()
            .find(|a| a.id == id && a.is_visible())
    }

    fn push_activity(&mut self, log: ActivityLog) {
        push_capped(&mut self.activity, log, ACTIVITY_LOG_LIMIT);
    }
}

pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }

    /// A store pre-populated with sample agents, metrics and activity.
    pub fn seeded() -> Self {
        let now = Utc::now();
        let mut tables = Tables {
            agents: seed::sample_agents(now),
            metrics: seed::sample_metrics(now).into(),
            ..Tables::default()
        };
        for log in seed::sample_activity(now) {
            tables.push_activity(log);
        }
        Self {
            tables: RwLock::new(tables),
        }
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables.username_taken(&user.username) {
            return Err(StoreError::Conflict("username already exists".into()));
        }
        if tables.email_taken(&user.email, None) {
            return Err(StoreError::Conflict("email already exists".into()));
        }
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
        tables.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, id: &str, update: UserUpdate) -> Result<Option<User>> {
        let mut tables = self.tables.write().await;
        if let Some(email) = &update.email
            && tables.email_taken(email, Some(id))
        {
            return Err(StoreError::Conflict("email already exists".into()));
        }
        let Some(user) = tables.users.get_mut(id) else {
            return Ok(None);
        };
        user.apply(update, Utc::now());
        Ok(Some(user.clone()))
    }

    async fn create_session(&self, session: NewSession) -> Result<Session> {
        let mut tables = self.tables.write().await;
        if tables.sessions.contains_key(&session.token) {
            return Err(StoreError::Conflict("session token already exists".into()));
        }
        let session = Session {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: session.user_id,
            token: session.token,
            expires_at: session.expires_at,
            created_at: Utc::now(),
        };
        tables
            .sessions
            .insert(session.token.clone(), session.clone());
        Ok(session)
    }

    async fn get_session(&self, token: &str) -> Result<Option<Session>> {
        Ok(self.tables.read().await.sessions.get(token).cloned())
    }

    async fn delete_session(&self, token: &str) -> Result<bool> {
        Ok(self
            .tables
            .write()
            .await
            .sessions
            .remove(token)
            .is_some())
    }

    async fn get_agents(&self, scope: &Scope) -> Result<Vec<Agent>> {
        let tables = self.tables.read().await;
        let mut agents: Vec<Agent> = tables
            .agents
            .iter()
            .rev()
            .filter(|a| scope.admits(a))
            .cloned()
            .collect();
        // Stable: ties keep newest-inserted first.
        agents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(agents)
    }

    async fn get_agent(&self, id: &str, scope: &Scope) -> Result<Option<Agent>> {
        let tables = self.tables.read().await;
        Ok(tables
            .agents
            .iter()
            .find(|a| a.id == id)
            .filter(|a| scope.admits(a))
            .cloned())
    }

    async fn create_agent(&self, agent: NewAgent) -> Result<Agent> {
        let agent = Agent::from_new(agent, Utc::now());
        self.tables.write().await.agents.push(agent.clone());
        Ok(agent)
    }

    async fn update_agent(&self, id: &str, update: AgentUpdate) -> Result<Option<Agent>> {
        let mut tables = self.tables.write().await;
        Ok(tables.active_agent_mut(id).map(|agent| {
            agent.apply(update, Utc::now());
            agent.clone()
        }))
    }

    async fn delete_agent(&self, id: &str) -> Result<bool> {
        let mut tables = self.tables.write().await;
        Ok(match tables.active_agent_mut(id) {
            Some(agent) => {
                agent.is_active = false;
                agent.updated_at = Utc::now();
                true
            },
            None => false,
        })
    }

    async fn update_agent_status(&self, id: &str, status: AgentStatus) -> Result<()> {
        let mut tables = self.tables.write().await;
        if let Some(agent) = tables.active_agent_mut(id) {
            agent.status = status;
            agent.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn get_interactions(&self, agent_id: Option<&str>) -> Result<Vec<Interaction>> {
        let tables = self.tables.read().await;
        Ok(tables
            .interactions
            .iter()
            .rev()
            .filter(|i| agent_id.is_none_or(|id| i.agent_id == id))
            .take(INTERACTION_LIMIT)
            .cloned()
            .collect())
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
        push_capped(
            &mut self.tables.write().await.interactions,
            interaction.clone(),
            RETAINED_INTERACTIONS,
        );
        Ok(interaction)
    }

    async fn get_system_metrics(&self) -> Result<Vec<SystemMetric>> {
        let tables = self.tables.read().await;
        Ok(tables
            .metrics
            .iter()
            .rev()
            .take(SYSTEM_METRIC_LIMIT)
            .cloned()
            .collect())
    }

    async fn create_system_metric(&self, metric: NewSystemMetric) -> Result<SystemMetric> {
        let metric = SystemMetric {
            id: uuid::Uuid::new_v4().to_string(),
            metric_name: metric.metric_name,
            value: metric.value,
            timestamp: Utc::now(),
        };
        push_capped(
            &mut self.tables.write().await.metrics,
            metric.clone(),
            RETAINED_METRICS,
        );
        Ok(metric)
    }

    async fn get_activity_logs(&self) -> Result<Vec<ActivityLog>> {
        let tables = self.tables.read().await;
        Ok(tables
            .activity
            .iter()
            .rev()
            .take(ACTIVITY_LOG_LIMIT)
            .cloned()
            .collect())
    }

    async fn get_agent_activity_logs(&self, agent_ids: &[String]) -> Result<Vec<ActivityLog>> {
        let tables = self.tables.read().await;
        Ok(tables
            .activity
            .iter()
            .rev()
            .filter(|log| log.agent_id.as_ref().is_some_and(|id| agent_ids.contains(id)))
            .take(ACTIVITY_LOG_LIMIT)
            .cloned()
            .collect())
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
        self.tables.write().await.push_activity(log.clone());
        Ok(log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActivityType, Role};

    fn new_agent(name: &str, team: &str) -> NewAgent {
        NewAgent {
            name: name.into(),
            team: team.into(),
            description: format!("{name} description"),
            tech_stack: "Rust".into(),
            agent_type: "code_assistant".into(),
            container_url: None,
            container_image: None,
            capabilities: vec!["review".into()],
        }
    }

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.into(),
            email: email.into(),
            password_hash: "hash".into(),
            role: Role::TeamMember,
            team: Some("Ops".into()),
        }
    }

    #[tokio::test]
    async fn seeded_store_has_one_agent_per_type() {
        let store = MemoryStore::seeded();
        let agents = store.get_agents(&Scope::All).await.unwrap();
        assert_eq!(agents.len(), 6);
        assert_eq!(store.get_stats(&Scope::All).await.unwrap().agent_types.len(), 6);
        assert!(
            store
                .get_agent("customercare-ai", &Scope::All)
                .await
                .unwrap()
                .is_some()
        );
        // Newest first.
        assert!(agents.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[tokio::test]
    async fn team_member_never_sees_other_teams() {
        let store = MemoryStore::new();
        store.create_agent(new_agent("a", "Ops")).await.unwrap();
        store.create_agent(new_agent("b", "Eng")).await.unwrap();
        let hidden = store.create_agent(new_agent("c", "Ops")).await.unwrap();
        store.delete_agent(&hidden.id).await.unwrap();

        let ops = store
            .get_agents(&Scope::for_actor("team_member", Some("Ops")))
            .await
            .unwrap();
        assert_eq!(ops.len(), 1);
        assert!(ops.iter().all(|a| a.team == "Ops" && a.is_active));

        let none = store
            .get_agents(&Scope::for_actor("team_member", None))
            .await
            .unwrap();
        assert!(none.is_empty());

        let all = store.get_agents(&Scope::All).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn out_of_scope_get_looks_like_missing() {
        let store = MemoryStore::new();
        let eng = store.create_agent(new_agent("b", "Eng")).await.unwrap();
        let ops = Scope::Team("Ops".into());

        let out_of_scope = store.get_agent(&eng.id, &ops).await.unwrap();
        let missing = store.get_agent("no-such-agent", &ops).await.unwrap();
        assert_eq!(out_of_scope, missing);
        assert!(out_of_scope.is_none());
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = MemoryStore::new();
        let input = new_agent("Support", "Ops");
        let created = store.create_agent(input.clone()).await.unwrap();
        let fetched = store
            .get_agent(&created.id, &Scope::Team("Ops".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.name, input.name);
        assert_eq!(fetched.capabilities, input.capabilities);
        assert_eq!(fetched.status, AgentStatus::Offline);
    }

    #[tokio::test]
    async fn delete_is_soft_and_idempotent() {
        let store = MemoryStore::new();
        let agent = store.create_agent(new_agent("a", "Ops")).await.unwrap();
        assert!(store.delete_agent(&agent.id).await.unwrap());
        assert!(!store.delete_agent(&agent.id).await.unwrap());
        assert!(
            store
                .get_agent(&agent.id, &Scope::All)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            store
                .update_agent(&agent.id, AgentUpdate::default())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn stats_ignore_other_teams() {
        let store = MemoryStore::new();
        for (team, status) in [
            ("Ops", AgentStatus::Online),
            ("Ops", AgentStatus::Online),
            ("Ops", AgentStatus::Offline),
            ("Eng", AgentStatus::Online),
            ("Eng", AgentStatus::Online),
        ] {
            let agent = store.create_agent(new_agent("x", team)).await.unwrap();
            store.update_agent_status(&agent.id, status).await.unwrap();
        }

        let stats = store
            .get_stats(&Scope::for_actor("team_member", Some("Ops")))
            .await
            .unwrap();
        assert_eq!(stats.total_agents, 3);
        assert_eq!(stats.active_agents, 2);
        assert_eq!(stats.offline_agents, 1);
        assert_eq!(stats.agent_types.get("code_assistant"), Some(&3));
    }

    #[tokio::test]
    async fn duplicate_username_or_email_conflicts() {
        let store = MemoryStore::new();
        store
            .create_user(new_user("alice", "alice@x.com"))
            .await
            .unwrap();
        assert!(matches!(
            store.create_user(new_user("alice", "other@x.com")).await,
            Err(StoreError::Conflict(_))
        ));
        assert!(matches!(
            store.create_user(new_user("bob", "alice@x.com")).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn update_user_merges_and_reports_missing() {
        let store = MemoryStore::new();
        let user = store
            .create_user(new_user("alice", "alice@x.com"))
            .await
            .unwrap();
        let updated = store
            .update_user(&user.id, UserUpdate {
                email: Some("alice@y.com".into()),
                ..UserUpdate::default()
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.email, "alice@y.com");
        assert_eq!(updated.username, "alice");
        assert!(updated.updated_at >= user.updated_at);

        assert!(
            store
                .update_user("missing", UserUpdate::default())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn interactions_and_metrics_are_capped() {
        let store = MemoryStore::new();
        for i in 0..(RETAINED_METRICS + 5) {
            store
                .create_system_metric(NewSystemMetric {
                    metric_name: "cluster_nodes".into(),
                    value: i.to_string(),
                })
                .await
                .unwrap();
        }
        for i in 0..(RETAINED_INTERACTIONS + 5) {
            store
                .create_interaction(NewInteraction {
                    agent_id: "a1".into(),
                    session_id: "ws_1".into(),
                    message: format!("message {i}"),
                    response: "ok".into(),
                    response_time: 10,
                    success: true,
                })
                .await
                .unwrap();
        }

        let tables = store.tables.read().await;
        assert_eq!(tables.metrics.len(), RETAINED_METRICS);
        assert_eq!(tables.interactions.len(), RETAINED_INTERACTIONS);
        assert_eq!(
            tables.metrics.back().map(|m| m.value.as_str()),
            Some((RETAINED_METRICS + 4).to_string().as_str())
        );
        assert_eq!(tables.interactions[0].message, "message 5");
    }

    #[tokio::test]
    async fn activity_log_is_capped() {
        let store = MemoryStore::new();
        for i in 0..(ACTIVITY_LOG_LIMIT + 20) {
            store
                .create_activity_log(NewActivityLog::new(
                    ActivityType::SystemEvent,
                    format!("event {i}"),
                ))
                .await
                .unwrap();
        }
        let logs = store.get_activity_logs().await.unwrap();
        assert_eq!(logs.len(), ACTIVITY_LOG_LIMIT);
        assert_eq!(logs[0].message, format!("event {}", ACTIVITY_LOG_LIMIT + 19));
    }

    #[tokio::test]
    async fn interactions_filter_by_agent_newest_first() {
        let store = MemoryStore::new();
        for (agent, msg) in [("a", "one"), ("b", "two"), ("a", "three")] {
            store
                .create_interaction(NewInteraction {
                    agent_id: agent.into(),
                    session_id: "ws-1".into(),
                    message: msg.into(),
                    response: "ok".into(),
                    response_time: 700,
                    success: true,
                })
                .await
                .unwrap();
        }
        let for_a = store.get_interactions(Some("a")).await.unwrap();
        let messages: Vec<_> = for_a.iter().map(|i| i.message.as_str()).collect();
        assert_eq!(messages, vec!["three", "one"]);
        assert_eq!(store.get_interactions(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn scoped_activity_logs_hide_foreign_agents() {
        let store = MemoryStore::new();
        let ops = store.create_agent(new_agent("a", "Ops")).await.unwrap();
        let eng = store.create_agent(new_agent("b", "Eng")).await.unwrap();
        for id in [&ops.id, &eng.id] {
            store
                .create_activity_log(
                    NewActivityLog::new(ActivityType::AgentRegistered, "registered").agent(id),
                )
                .await
                .unwrap();
        }
        store
            .create_activity_log(NewActivityLog::new(ActivityType::SystemEvent, "tick"))
            .await
            .unwrap();

        let scoped = store
            .get_activity_logs_in(&Scope::Team("Ops".into()))
            .await
            .unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].agent_id.as_deref(), Some(ops.id.as_str()));
        assert_eq!(store.get_activity_logs_in(&Scope::All).await.unwrap().len(), 3);
    }
}
