//! Simulated infrastructure: container actions, cluster scaling and the
//! periodic system metric sampler. Nothing here touches real containers.

use std::{
    str::FromStr,
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use {
    agenthub_store::{
        ActivityType, Agent, AgentStatus, NewActivityLog, NewSystemMetric, Scope,
    },
    rand::Rng,
    serde::Serialize,
    serde_json::json,
    tokio::task::JoinHandle,
    tracing::{debug, info, warn},
};

use crate::state::GatewayState;

pub const MIN_NODES: u32 = 1;
pub const MAX_NODES: u32 = 10;
const INITIAL_NODES: u32 = 3;

// ── Container actions ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerAction {
    Start,
    Stop,
    Restart,
    Deploy,
}

impl ContainerAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
            Self::Deploy => "deploy",
        }
    }

    /// Status the agent settles in once the action completes.
    pub fn final_status(&self) -> AgentStatus {
        match self {
            Self::Stop => AgentStatus::Offline,
            Self::Start | Self::Restart | Self::Deploy => AgentStatus::Online,
        }
    }
}

impl FromStr for ContainerAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            "restart" => Ok(Self::Restart),
            "deploy" => Ok(Self::Deploy),
            other => Err(format!(
                "unknown container action '{other}', expected start, stop, restart or deploy"
            )),
        }
    }
}

/// Mark the agent busy now and settle it after the configured delay.
///
/// The settle step is skipped if the gateway shuts down first.
pub async fn run_container_action(
    state: &Arc<GatewayState>,
    agent: &Agent,
    action: ContainerAction,
) -> agenthub_store::Result<JoinHandle<()>> {
    state
        .store
        .update_agent_status(&agent.id, AgentStatus::Busy)
        .await?;
    state
        .store
        .create_activity_log(
            NewActivityLog::new(
                ActivityType::AgentStatusChange,
                format!("Container {} initiated for {}", action.as_str(), agent.name),
            )
            .agent(agent.id.clone())
            .details(json!({ "action": action.as_str(), "status": AgentStatus::Busy })),
        )
        .await?;
    info!(agent_id = %agent.id, action = action.as_str(), "container action started");

    let state = Arc::clone(state);
    let agent_id = agent.id.clone();
    let agent_name = agent.name.clone();
    let cancel = state.shutdown.child_token();
    let delay = Duration::from_millis(state.config.simulation.container_action_delay_ms);

    Ok(tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(%agent_id, action = action.as_str(), "container action abandoned");
                return;
            },
            _ = tokio::time::sleep(delay) => {},
        }

        let status = action.final_status();
        if let Err(e) = state.store.update_agent_status(&agent_id, status).await {
            warn!(%agent_id, error = %e, "failed to settle container action");
            return;
        }
        let log = NewActivityLog::new(
            ActivityType::AgentStatusChange,
            format!("{agent_name} is now {status} after {}", action.as_str()),
        )
        .agent(agent_id.clone())
        .details(json!({ "action": action.as_str(), "status": status }));
        if let Err(e) = state.store.create_activity_log(log).await {
            warn!(%agent_id, error = %e, "failed to record container action");
        }
        info!(%agent_id, %status, "container action completed");
    }))
}

// ── Cluster ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleDirection {
    Up,
    Down,
}

impl FromStr for ScaleDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scale-up" => Ok(Self::Up),
            "scale-down" => Ok(Self::Down),
            other => Err(format!(
                "unknown scale action '{other}', expected scale-up or scale-down"
            )),
        }
    }
}

/// Simulated node count of the agent cluster.
pub struct ClusterState {
    nodes: AtomicU32,
}

impl Default for ClusterState {
    fn default() -> Self {
        Self {
            nodes: AtomicU32::new(INITIAL_NODES),
        }
    }
}

impl ClusterState {
    pub fn nodes(&self) -> u32 {
        self.nodes.load(Ordering::Relaxed)
    }

    /// Move one node in `direction`, clamped to `MIN_NODES..=MAX_NODES`.
    /// Returns the new count.
    pub fn scale(&self, direction: ScaleDirection) -> u32 {
        let step = |n: u32| match direction {
            ScaleDirection::Up => n.saturating_add(1).min(MAX_NODES),
            ScaleDirection::Down => n.saturating_sub(1).max(MIN_NODES),
        };
        let previous = self
            .nodes
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| Some(step(n)))
            .unwrap_or_else(|n| n);
        step(previous)
    }
}

// ── Metrics ──────────────────────────────────────────────────────────────────

/// Randomised resource figures for one agent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentMetrics {
    pub agent_id: String,
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub requests_per_minute: u32,
    pub error_rate: f64,
    pub avg_response_time_ms: u32,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn agent_metrics(agent: &Agent) -> AgentMetrics {
    let mut rng = rand::rng();
    AgentMetrics {
        agent_id: agent.id.clone(),
        cpu_usage: round1(rng.random_range(5.0..85.0)),
        memory_usage: round1(rng.random_range(20.0..90.0)),
        requests_per_minute: rng.random_range(0..500),
        error_rate: round1(rng.random_range(0.0..2.5)),
        avg_response_time_ms: rng.random_range(200..3000),
    }
}

/// Append one snapshot of each sampled system metric.
pub async fn sample_system_metrics(state: &GatewayState) -> agenthub_store::Result<()> {
    let uptime = format!("{:.2}%", rand::rng().random_range(99.0..99.99));
    let samples = [
        ("docker_registry_uptime", uptime),
        ("cluster_nodes", state.cluster.nodes().to_string()),
        ("active_connections", state.connections.count().await.to_string()),
    ];
    for (name, value) in samples {
        state
            .store
            .create_system_metric(NewSystemMetric {
                metric_name: name.into(),
                value,
            })
            .await?;
    }
    Ok(())
}

/// Sample system metrics on a fixed interval until shutdown.
///
/// Returns `None` without spawning when the interval is `0`.
pub fn spawn_metrics_sampler(state: Arc<GatewayState>) -> Option<JoinHandle<()>> {
    let secs = state.config.simulation.metrics_interval_secs;
    if secs == 0 {
        info!("system metric sampler disabled");
        return None;
    }
    let cancel = state.shutdown.child_token();
    let period = Duration::from_secs(secs);
    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(e) = sample_system_metrics(&state).await {
                        warn!(error = %e, "metric sampling failed");
                    }
                },
            }
        }
        debug!("metrics sampler stopped");
    }))
}

/// Agent counts within `scope`, for the cluster status view.
pub async fn scoped_counts(
    state: &GatewayState,
    scope: &Scope,
) -> agenthub_store::Result<(usize, usize)> {
    let stats = state.store.get_stats(scope).await?;
    Ok((stats.total_agents, stats.active_agents))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_actions() {
        assert_eq!("deploy".parse::<ContainerAction>(), Ok(ContainerAction::Deploy));
        assert!("explode".parse::<ContainerAction>().is_err());
        assert_eq!(ContainerAction::Stop.final_status(), AgentStatus::Offline);
        assert_eq!(ContainerAction::Restart.final_status(), AgentStatus::Online);
    }

    #[tokio::test]
    async fn zero_interval_disables_sampler() {
        let mut config = agenthub_config::AgentHubConfig::default();
        config.auth.jwt_secret = Some("test".into());
        config.simulation.metrics_interval_secs = 0;
        let state = GatewayState::new(config, Arc::new(agenthub_store::MemoryStore::new()));
        assert!(spawn_metrics_sampler(Arc::clone(&state)).is_none());
        assert!(state.store.get_system_metrics().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sampler_writes_snapshots_until_shutdown() {
        let mut config = agenthub_config::AgentHubConfig::default();
        config.auth.jwt_secret = Some("test".into());
        config.simulation.metrics_interval_secs = 60;
        let state = GatewayState::new(config, Arc::new(agenthub_store::MemoryStore::new()));

        let sampler = spawn_metrics_sampler(Arc::clone(&state)).unwrap();
        // The first tick fires immediately.
        tokio::time::sleep(Duration::from_millis(100)).await;
        state.shutdown.cancel();
        sampler.await.unwrap();

        let names: Vec<_> = state
            .store
            .get_system_metrics()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.metric_name)
            .collect();
        assert_eq!(names.len(), 3);
        assert!(names.contains(&"cluster_nodes".to_string()));
    }

    #[test]
    fn cluster_scaling_is_clamped() {
        let cluster = ClusterState::default();
        assert_eq!(cluster.nodes(), 3);
        assert_eq!(cluster.scale(ScaleDirection::Down), 2);
        assert_eq!(cluster.scale(ScaleDirection::Down), 1);
        assert_eq!(cluster.scale(ScaleDirection::Down), 1);
        for _ in 0..20 {
            cluster.scale(ScaleDirection::Up);
        }
        assert_eq!(cluster.nodes(), MAX_NODES);
        assert!("sideways".parse::<ScaleDirection>().is_err());
    }
}
