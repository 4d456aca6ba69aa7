//! Complexity classification and stage selection.

use super::backend::ReasoningBackend;
use crate::error::LlmError;
use crate::roles::RoleRegistry;
use crate::tasks::{ReasoningRequest, TaskKind, TaskPlan};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// How much of the team a query needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ComplexityTier {
    Low,
    Moderate,
    High,
}

impl ComplexityTier {
    /// Downstream stages for this tier, in execution order.
    ///
    /// Each tier's list is a prefix of the next one's.
    pub fn stages(&self) -> &'static [TaskKind] {
        const ALL: [TaskKind; 4] = [
            TaskKind::PrimaryCareRound,
            TaskKind::RadiologyRound,
            TaskKind::PathologyRound,
            TaskKind::SurgeryRound,
        ];
        match self {
            ComplexityTier::Low => &ALL[..1],
            ComplexityTier::Moderate => &ALL[..3],
            ComplexityTier::High => &ALL,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplexityTier::Low => "LOW",
            ComplexityTier::Moderate => "MODERATE",
            ComplexityTier::High => "HIGH",
        }
    }
}

impl std::fmt::Display for ComplexityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map the moderator's raw answer to a tier.
///
/// Case-insensitive substring test, `LOW` before `MODERATE`. Anything else,
/// including an explicit "High", an empty answer or noise, resolves to
/// [`ComplexityTier::High`].
pub fn classify_response(raw: &str) -> ComplexityTier {
    let normalized = if raw.trim().is_empty() {
        "UNKNOWN".to_string()
    } else {
        raw.to_uppercase()
    };

    if normalized.contains("LOW") {
        ComplexityTier::Low
    } else if normalized.contains("MODERATE") {
        ComplexityTier::Moderate
    } else {
        ComplexityTier::High
    }
}

/// Run the classification request against the moderator and derive the tier.
pub async fn classify(
    backend: &dyn ReasoningBackend,
    roles: &RoleRegistry,
    request: &ReasoningRequest,
) -> Result<ComplexityTier, LlmError> {
    let moderator = roles.get(request.role);
    let raw = backend.invoke(moderator, request).await?.into_text();
    let tier = classify_response(&raw);
    debug!(raw = %raw, "Moderator answer");
    info!(tier = %tier, "Complexity classified");
    Ok(tier)
}

/// Pick the downstream requests that run for `tier`, in fixed order.
pub fn select_stages(tier: ComplexityTier, plan: &TaskPlan) -> Vec<&ReasoningRequest> {
    tier.stages().iter().map(|kind| plan.get(*kind)).collect()
}
