//! Complexity-gated team reasoning pipeline.
//!
//! One query flows through four steps, each awaited before the next starts:
//!
//! 1. **Classify**: the moderator labels the query LOW / MODERATE / HIGH.
//! 2. **Select**: the tier picks a prefix of primary care, radiology,
//!    pathology, surgery.
//! 3. **Execute**: each selected stage runs against its own role; a short
//!    summary is kept per stage.
//! 4. **Integrate**: the integrator consolidates the stage reports into the
//!    final answer.
//!
//! Backend failures are never caught here. The first one aborts the query.

pub mod backend;
pub mod complexity;
pub mod stages;

pub use backend::{BackendOutput, ProviderBackend, ReasoningBackend};
pub use complexity::{ComplexityTier, classify, classify_response, select_stages};
pub use stages::{StageResult, execute, integrate, summarize};

use crate::error::LlmError;
use crate::roles::{RoleId, RoleRegistry};
use crate::tasks::build_requests;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Terminal output of one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    /// The integrator's answer, verbatim.
    #[serde(rename = "final")]
    pub final_text: String,
    /// Stage summaries in execution order; stages without one are absent.
    pub reasoning: Vec<String>,
    pub complexity: ComplexityTier,
}

/// The simulated multidisciplinary team.
///
/// Holds no per-query state; one instance serves any number of concurrent
/// queries.
#[derive(Clone)]
pub struct MedicalTeam {
    roles: Arc<RoleRegistry>,
    backend: Arc<dyn ReasoningBackend>,
}

impl MedicalTeam {
    pub fn new(roles: Arc<RoleRegistry>, backend: Arc<dyn ReasoningBackend>) -> Self {
        Self { roles, backend }
    }

    pub fn roles(&self) -> &RoleRegistry {
        &self.roles
    }

    /// Run the full pipeline for `query`.
    pub async fn run(&self, query: &str) -> Result<PipelineResult, LlmError> {
        let start = Instant::now();
        let plan = build_requests(query, &self.roles);
        let backend = self.backend.as_ref();

        let tier = classify(backend, &self.roles, plan.classification()).await?;

        let selected = select_stages(tier, &plan);
        info!(tier = %tier, stages = selected.len(), "Running team stages");
        let results = execute(backend, &self.roles, &selected).await?;

        let final_text = integrate(
            backend,
            self.roles.get(RoleId::Integrator),
            plan.integration(),
            &results,
        )
        .await?;

        let reasoning: Vec<String> = results.into_iter().filter_map(|r| r.summary).collect();

        info!(
            tier = %tier,
            summaries = reasoning.len(),
            total_latency_ms = start.elapsed().as_millis() as u64,
            "Team pipeline complete"
        );

        Ok(PipelineResult {
            final_text,
            reasoning,
            complexity: tier,
        })
    }
}

impl std::fmt::Debug for MedicalTeam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MedicalTeam")
            .field("roles", &self.roles.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::MockLlmProvider;
    use crate::config::LlmConfig;
    use crate::roles::get_roles;

    fn team(provider: Arc<MockLlmProvider>) -> MedicalTeam {
        let backend = ProviderBackend::new(provider, &LlmConfig::default());
        MedicalTeam::new(Arc::new(get_roles()), Arc::new(backend))
    }

    #[tokio::test]
    async fn test_low_tier_runs_primary_care_only() {
        let provider = Arc::new(MockLlmProvider::with_responses([
            "Low",
            "Updated Diagnosis: tension headache. Reasoning: stress related. Extra.",
            "Final Diagnosis: tension headache",
        ]));
        let result = team(provider.clone()).run("mild headache, what treatment?").await.unwrap();

        assert_eq!(result.complexity, ComplexityTier::Low);
        assert_eq!(
            result.reasoning,
            vec!["Updated Diagnosis: tension headache. Reasoning: stress related".to_string()]
        );
        assert_eq!(result.final_text, "Final Diagnosis: tension headache");
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_result_serializes_with_final_key() {
        let result = PipelineResult {
            final_text: "done".into(),
            reasoning: vec!["a".into()],
            complexity: ComplexityTier::High,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["final"], "done");
        assert_eq!(json["complexity"], "HIGH");
        assert_eq!(json["reasoning"][0], "a");
    }
}
