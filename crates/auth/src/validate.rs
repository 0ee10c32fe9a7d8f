use {
    agenthub_store::{FieldError, Role},
    serde::Deserialize,
};

/// Body of `POST /auth/register` (and `agenthub user create`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub team: Option<String>,
}

fn default_role() -> String {
    Role::TeamMember.as_str().to_string()
}

impl RegisterRequest {
    /// Validate field shapes and resolve the role/team pair.
    ///
    /// Admins never carry a team; team members must name one.
    pub fn validate(&self) -> Result<(Role, Option<String>), Vec<FieldError>> {
        let mut errors = Vec::new();

        let username = self.username.trim();
        if username.len() < 3 || username.len() > 50 {
            errors.push(FieldError::new(
                "username",
                "username must be between 3 and 50 characters",
            ));
        }
        if !is_email(&self.email) {
            errors.push(FieldError::new("email", "a valid email is required"));
        }
        if self.password.len() < 6 {
            errors.push(FieldError::new(
                "password",
                "password must be at least 6 characters",
            ));
        }

        let team = self
            .team
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        let resolved = match self.role.parse::<Role>() {
            Ok(Role::Admin) => Some((Role::Admin, None)),
            Ok(Role::TeamMember) => match team {
                Some(team) => Some((Role::TeamMember, Some(team))),
                None => {
                    errors.push(FieldError::new("team", "team is required for team members"));
                    None
                },
            },
            Err(_) => {
                errors.push(FieldError::new("role", "role must be admin or team_member"));
                None
            },
        };

        match resolved {
            Some(pair) if errors.is_empty() => Ok(pair),
            _ => Err(errors),
        }
    }
}

pub(crate) fn is_email(value: &str) -> bool {
    let value = value.trim();
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !value.contains(' '),
        None => false,
    }
}
