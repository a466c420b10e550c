//! Clinical roles of authenticated actors.

use std::str::FromStr;

/// Error type for role parsing.
#[derive(Debug, thiserror::Error)]
pub enum RoleError {
    /// The input did not name a known role
    #[error("invalid role: {0}")]
    Invalid(String),
}

/// The role of an authenticated principal.
///
/// `SuperAdmin` is a platform operator role: it manages organizations and
/// user accounts and is never authorised against clinical data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Doctor,
    Nurse,
}

impl Role {
    /// Returns the lowercase wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Nurse => "nurse",
        }
    }
}

impl FromStr for Role {
    type Err = RoleError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "super_admin" => Ok(Role::SuperAdmin),
            "admin" => Ok(Role::Admin),
            "doctor" => Ok(Role::Doctor),
            "nurse" => Ok(Role::Nurse),
            other => Err(RoleError::Invalid(other.to_owned())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
