//! Project and owner models.

use super::validation::{require_name, ModelValidationError};
use super::{ProjectId, TeamId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Board owner. Authentication lives outside this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub display_name: String,
}

impl User {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            display_name: display_name.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_name("user display name", &self.display_name)
    }
}

/// A project is owned by one user and staffed by one team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub owner_id: UserId,
    pub team_id: TeamId,
    pub name: String,
    pub is_active: bool,
}

impl Project {
    pub fn new(owner_id: UserId, team_id: TeamId, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            team_id,
            name: name.into(),
            is_active: true,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_name("project name", &self.name)
    }
}
