//! Team and team member models.
//!
//! # Invariants
//! - A member belongs to exactly one team; a team to exactly one owner.
//! - Inactive members keep their load but never receive new work.

use super::validation::{require_name, ModelValidationError};
use super::{MemberId, TeamId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub owner_id: UserId,
    pub name: String,
    pub is_active: bool,
}

impl Team {
    pub fn new(owner_id: UserId, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name: name.into(),
            is_active: true,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_name("team name", &self.name)
    }
}

/// One person on a team with a fixed number of concurrent task slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: MemberId,
    pub team_id: TeamId,
    pub name: String,
    pub role: Option<String>,
    /// Maximum concurrent non-done tasks.
    pub capacity: u32,
    pub is_active: bool,
}

impl TeamMember {
    pub fn new(team_id: TeamId, name: impl Into<String>, capacity: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            team_id,
            name: name.into(),
            role: None,
            capacity,
            is_active: true,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_name("member name", &self.name)
    }
}
