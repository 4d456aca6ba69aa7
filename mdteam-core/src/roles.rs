//! Role registry for the simulated multidisciplinary team.
//!
//! Roles are configuration data, not behavior: each carries a title, an
//! objective and a persona text that the backend adapter turns into a system
//! prompt. The registry is built once and shared read-only.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifies one of the six fixed team roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleId {
    /// Triage doctor; labels query complexity.
    Moderator,
    PrimaryCare,
    Radiologist,
    Pathologist,
    Surgeon,
    /// Team lead; consolidates every prior stage into the final answer.
    Integrator,
}

impl RoleId {
    /// All roles, in pipeline order.
    pub const ALL: [RoleId; 6] = [
        RoleId::Moderator,
        RoleId::PrimaryCare,
        RoleId::Radiologist,
        RoleId::Pathologist,
        RoleId::Surgeon,
        RoleId::Integrator,
    ];

    /// Stable machine identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleId::Moderator => "moderator",
            RoleId::PrimaryCare => "primary_care",
            RoleId::Radiologist => "radiologist",
            RoleId::Pathologist => "pathologist",
            RoleId::Surgeon => "surgeon",
            RoleId::Integrator => "integrator",
        }
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named persona with a fixed objective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRole {
    pub id: RoleId,
    /// Human-readable title, e.g. "Radiologist".
    pub title: String,
    pub objective: String,
    pub persona: String,
}

impl TeamRole {
    fn new(id: RoleId, title: &str, objective: &str, persona: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            objective: objective.to_string(),
            persona: persona.to_string(),
        }
    }

    /// System prompt presented to the backend when this role answers.
    pub fn system_prompt(&self) -> String {
        format!(
            "You are the {}. {}\nYour objective: {}",
            self.title, self.persona, self.objective
        )
    }
}

/// Immutable mapping from role identifier to role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRegistry {
    roles: BTreeMap<RoleId, TeamRole>,
}

impl RoleRegistry {
    /// Build the fixed six-role team.
    pub fn standard() -> Self {
        let roles = [
            TeamRole::new(
                RoleId::Moderator,
                "Moderator",
                "Classify the complexity of the medical query.",
                "Experienced triage doctor.",
            ),
            TeamRole::new(
                RoleId::PrimaryCare,
                "Primary Care Physician",
                "Handle low-complexity medical cases.",
                "General physician skilled in primary care.",
            ),
            TeamRole::new(
                RoleId::Radiologist,
                "Radiologist",
                "Interpret radiology clues.",
                "Expert radiologist.",
            ),
            TeamRole::new(
                RoleId::Pathologist,
                "Pathologist",
                "Analyse labs and pathology.",
                "Clinical pathology expert.",
            ),
            TeamRole::new(
                RoleId::Surgeon,
                "Surgeon",
                "Determine surgical/interventional needs.",
                "Trauma and GI surgeon.",
            ),
            TeamRole::new(
                RoleId::Integrator,
                "Infectious Disease Specialist",
                "Integrate MDT outputs into final medical reasoning.",
                "ICT leader doctor.",
            ),
        ];

        Self {
            roles: roles.into_iter().map(|r| (r.id, r)).collect(),
        }
    }

    /// Look up a role. Every `RoleId` is present in a standard registry.
    pub fn get(&self, id: RoleId) -> &TeamRole {
        &self.roles[&id]
    }

    /// Read-only view of the full mapping.
    pub fn roles(&self) -> &BTreeMap<RoleId, TeamRole> {
        &self.roles
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Convenience accessor returning the standard registry.
pub fn get_roles() -> RoleRegistry {
    RoleRegistry::standard()
}
