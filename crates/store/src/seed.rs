//! Fixed sample rows for the in-memory backend.

use chrono::{DateTime, Duration, Utc};

use crate::types::{ActivityLog, ActivityType, Agent, AgentStatus, SystemMetric};

struct SampleAgent {
    id: &'static str,
    name: &'static str,
    team: &'static str,
    description: &'static str,
    tech_stack: &'static str,
    agent_type: &'static str,
    status: AgentStatus,
    image: &'static str,
    response_time: &'static str,
    uptime: &'static str,
    capabilities: &'static [&'static str],
}

const SAMPLE_AGENTS: &[SampleAgent] = &[
    SampleAgent {
        id: "customercare-ai",
        name: "CustomerCare AI",
        team: "Customer Success",
        description: "Answers order, refund and shipping questions around the clock.",
        tech_stack: "Python, FastAPI, Redis",
        agent_type: "customer_service",
        status: AgentStatus::Online,
        image: "registry.agenthub.local/customercare-ai:2.3.1",
        response_time: "1.2s",
        uptime: "99.8%",
        capabilities: &["order_lookup", "refunds", "shipping_status"],
    },
    SampleAgent {
        id: "codereview-ai",
        name: "CodeReview AI",
        team: "Engineering",
        description: "Reviews pull requests and flags risky changes.",
        tech_stack: "Rust, Axum, PostgreSQL",
        agent_type: "code_assistant",
        status: AgentStatus::Online,
        image: "registry.agenthub.local/codereview-ai:1.8.0",
        response_time: "2.4s",
        uptime: "99.5%",
        capabilities: &["code_review", "static_analysis", "test_suggestions"],
    },
    SampleAgent {
        id: "insights-ai",
        name: "Insights AI",
        team: "Data",
        description: "Builds ad-hoc reports from the warehouse.",
        tech_stack: "Python, Pandas, DuckDB",
        agent_type: "data_analysis",
        status: AgentStatus::Busy,
        image: "registry.agenthub.local/insights-ai:0.9.4",
        response_time: "3.1s",
        uptime: "98.9%",
        capabilities: &["sql_generation", "charting", "anomaly_detection"],
    },
    SampleAgent {
        id: "copywriter-ai",
        name: "Copywriter AI",
        team: "Marketing",
        description: "Drafts campaign copy and social posts.",
        tech_stack: "Node.js, Express",
        agent_type: "content_creation",
        status: AgentStatus::Offline,
        image: "registry.agenthub.local/copywriter-ai:1.1.2",
        response_time: "1.8s",
        uptime: "97.2%",
        capabilities: &["copywriting", "seo", "tone_adjustment"],
    },
    SampleAgent {
        id: "scout-ai",
        name: "Scout AI",
        team: "Research",
        description: "Summarises papers and tracks competitor releases.",
        tech_stack: "Python, LangChain",
        agent_type: "research",
        status: AgentStatus::Online,
        image: "registry.agenthub.local/scout-ai:0.6.0",
        response_time: "4.0s",
        uptime: "99.1%",
        capabilities: &["literature_search", "summarisation"],
    },
    SampleAgent {
        id: "dealdesk-ai",
        name: "DealDesk AI",
        team: "Sales",
        description: "Qualifies leads and prepares quotes.",
        tech_stack: "Go, gRPC",
        agent_type: "sales",
        status: AgentStatus::Offline,
        image: "registry.agenthub.local/dealdesk-ai:1.0.3",
        response_time: "1.5s",
        uptime: "98.4%",
        capabilities: &["lead_scoring", "quoting", "crm_sync"],
    },
];

/// Sample agents, oldest first, one per taxonomy type.
pub fn sample_agents(now: DateTime<Utc>) -> Vec<Agent> {
    let count = SAMPLE_AGENTS.len() as i64;
    SAMPLE_AGENTS
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let created = now - Duration::hours(count - i as i64);
            Agent {
                id: s.id.into(),
                name: s.name.into(),
                team: s.team.into(),
                description: s.description.into(),
                tech_stack: s.tech_stack.into(),
                agent_type: s.agent_type.into(),
                status: s.status,
                container_url: Some(format!("http://{}.agents.svc.cluster.local:8080", s.id)),
                container_image: Some(s.image.into()),
                response_time: s.response_time.into(),
                uptime: s.uptime.into(),
                last_health_check: Some(now - Duration::minutes(5)),
                capabilities: s.capabilities.iter().map(|c| c.to_string()).collect(),
                is_active: true,
                created_at: created,
                updated_at: created,
            }
        })
        .collect()
}

/// Sample system metric snapshots, oldest first.
pub fn sample_metrics(now: DateTime<Utc>) -> Vec<SystemMetric> {
    [
        ("docker_registry_uptime", "99.9%"),
        ("kubernetes_nodes", "3"),
        ("cluster_cpu_usage", "42%"),
        ("cluster_memory_usage", "61%"),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (name, value))| SystemMetric {
        id: uuid::Uuid::new_v4().to_string(),
        metric_name: name.into(),
        value: value.into(),
        timestamp: now - Duration::minutes(10 - i as i64),
    })
    .collect()
}

/// Sample activity trail, oldest first.
pub fn sample_activity(now: DateTime<Utc>) -> Vec<ActivityLog> {
    let mut logs: Vec<ActivityLog> = SAMPLE_AGENTS
        .iter()
        .enumerate()
        .map(|(i, s)| ActivityLog {
            id: uuid::Uuid::new_v4().to_string(),
            kind: ActivityType::AgentRegistered,
            agent_id: Some(s.id.into()),
            message: format!("{} registered for team {}", s.name, s.team),
            details: Some(serde_json::json!({ "agentType": s.agent_type })),
            timestamp: now - Duration::hours(SAMPLE_AGENTS.len() as i64 - i as i64),
        })
        .collect();
    logs.push(ActivityLog {
        id: uuid::Uuid::new_v4().to_string(),
        kind: ActivityType::SystemEvent,
        agent_id: None,
        message: "Cluster health check passed".into(),
        details: Some(serde_json::json!({ "nodes": 3 })),
        timestamp: now - Duration::minutes(1),
    });
    logs
}
