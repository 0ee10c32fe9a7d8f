//! Row-level visibility of agents.
//!
//! | actor                    | visible agents                   |
//! |--------------------------|----------------------------------|
//! | admin                    | every active agent               |
//! | team_member of team `T`  | active agents with `team == T`   |
//! | team_member without team | none                             |
//! | unknown role             | none                             |
//!
//! Both list and get-by-id reads filter through [`Scope::admits`], so an
//! out-of-scope agent is indistinguishable from a missing one.

use crate::types::{Agent, Role, User};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Every active agent.
    All,
    /// Active agents of one team.
    Team(String),
    /// Nothing at all.
    Nothing,
}

impl Scope {
    /// Resolve the scope of an actor from its raw role and team.
    pub fn for_actor(role: &str, team: Option<&str>) -> Self {
        match (role.parse::<Role>(), team) {
            (Ok(Role::Admin), _) => Self::All,
            (Ok(Role::TeamMember), Some(team)) if !team.is_empty() => Self::Team(team.to_string()),
            _ => Self::Nothing,
        }
    }

    pub fn for_user(user: &User) -> Self {
        Self::for_actor(user.role.as_str(), user.team.as_deref())
    }

    /// The single visibility predicate for agents.
    pub fn admits(&self, agent: &Agent) -> bool {
        if !agent.is_visible() {
            return false;
        }
        match self {
            Self::All => true,
            Self::Team(team) => agent.team == *team,
            Self::Nothing => false,
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        matches!(self, Self::All)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::types::NewAgent;

    fn agent(team: &str) -> Agent {
        Agent::from_new(
            NewAgent {
                name: format!("{team} bot"),
                team: team.into(),
                description: String::new(),
                tech_stack: String::new(),
                agent_type: "research".into(),
                container_url: None,
                container_image: None,
                capabilities: Vec::new(),
            },
            Utc::now(),
        )
    }

    #[test]
    fn resolves_actor_scopes() {
        assert_eq!(Scope::for_actor("admin", None), Scope::All);
        assert_eq!(Scope::for_actor("admin", Some("Ops")), Scope::All);
        assert_eq!(
            Scope::for_actor("team_member", Some("Ops")),
            Scope::Team("Ops".into())
        );
        assert_eq!(Scope::for_actor("team_member", None), Scope::Nothing);
        assert_eq!(Scope::for_actor("team_member", Some("")), Scope::Nothing);
        assert_eq!(Scope::for_actor("superuser", Some("Ops")), Scope::Nothing);
    }

    #[test]
    fn team_scope_only_admits_own_team() {
        let scope = Scope::Team("Ops".into());
        assert!(scope.admits(&agent("Ops")));
        assert!(!scope.admits(&agent("Eng")));
        assert!(!scope.admits(&agent("ops")));
    }

    #[test]
    fn deleted_agents_are_never_admitted() {
        let mut deleted = agent("Ops");
        deleted.is_active = false;
        assert!(!Scope::All.admits(&deleted));
        assert!(!Scope::Team("Ops".into()).admits(&deleted));
    }

    #[test]
    fn nothing_admits_nothing() {
        assert!(!Scope::Nothing.admits(&agent("Ops")));
    }
}
