//! Integration tests for the team pipeline.
//!
//! Drives `MedicalTeam` end-to-end through `ProviderBackend` and a scripted
//! `MockLlmProvider`, checking call counts, role binding and failure
//! propagation for each complexity tier.

use async_trait::async_trait;
use mdteam_core::error::LlmError;
use mdteam_core::{
    BackendOutput, ComplexityTier, LlmConfig, MedicalTeam, MockLlmProvider, ProviderBackend,
    ReasoningBackend, ReasoningRequest, RoleId, TaskKind, TeamRole, get_roles,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn team_with(provider: Arc<MockLlmProvider>) -> MedicalTeam {
    let backend = ProviderBackend::new(provider, &LlmConfig::default());
    MedicalTeam::new(Arc::new(get_roles()), Arc::new(backend))
}

/// Role id attached to the system message of each recorded request.
fn roles_called(provider: &MockLlmProvider) -> Vec<String> {
    provider
        .requests()
        .iter()
        .map(|r| {
            r.messages[0]
                .metadata
                .get("role")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}

fn user_prompt(provider: &MockLlmProvider, call: usize) -> String {
    provider.requests()[call].messages[1]
        .content
        .as_text()
        .unwrap_or_default()
        .to_string()
}

#[tokio::test]
async fn test_fever_and_abdominal_pain_runs_three_stages_and_integrator() {
    let provider = Arc::new(MockLlmProvider::with_responses([
        "Moderate",
        "Updated Diagnosis: appendicitis. Reasoning: RLQ pain. Fever",
        "Imaging Findings: inflamed appendix. Reasoning: CT",
        "Pathology Findings: leukocytosis",
        "Final Diagnosis: acute appendicitis",
    ]));
    let team = team_with(provider.clone());

    let result = team
        .run("patient has fever and abdominal pain")
        .await
        .unwrap();

    assert_eq!(result.complexity, ComplexityTier::Moderate);
    assert_eq!(
        result.reasoning,
        vec![
            "Updated Diagnosis: appendicitis. Reasoning: RLQ pain".to_string(),
            "Imaging Findings: inflamed appendix. Reasoning: CT".to_string(),
            "Pathology Findings: leukocytosis".to_string(),
        ]
    );
    assert_eq!(result.final_text, "Final Diagnosis: acute appendicitis");
    assert_eq!(provider.call_count(), 5);
    assert_eq!(
        roles_called(&provider),
        vec!["moderator", "primary_care", "radiologist", "pathologist", "integrator"]
    );
}

#[tokio::test]
async fn test_high_case_runs_every_stage_in_order() {
    let provider = Arc::new(MockLlmProvider::with_responses([
        "High", "pcp", "rad", "path", "surg", "final",
    ]));
    let result = team_with(provider.clone()).run("septic shock").await.unwrap();

    assert_eq!(result.complexity, ComplexityTier::High);
    assert_eq!(result.reasoning, vec!["pcp", "rad", "path", "surg"]);
    assert_eq!(provider.call_count(), 6);
    assert_eq!(
        roles_called(&provider),
        vec![
            "moderator",
            "primary_care",
            "radiologist",
            "pathologist",
            "surgeon",
            "integrator"
        ]
    );
}

#[tokio::test]
async fn test_unrecognized_classification_fails_open_to_high() {
    let provider = Arc::new(MockLlmProvider::with_responses([
        "I cannot decide", "a", "b", "c", "d", "final",
    ]));
    let result = team_with(provider.clone()).run("odd case").await.unwrap();
    assert_eq!(result.complexity, ComplexityTier::High);
    assert_eq!(provider.call_count(), 6);
}

#[tokio::test]
async fn test_query_reaches_every_prompt_verbatim() {
    let provider = Arc::new(MockLlmProvider::with_responses(["Low", "pcp", "final"]));
    let query = "Chest pain\n  radiating to the LEFT arm  ";
    team_with(provider.clone()).run(query).await.unwrap();

    for call in 0..3 {
        assert!(user_prompt(&provider, call).contains(query));
    }
}

#[tokio::test]
async fn test_integrator_sees_stage_reports() {
    let provider = Arc::new(MockLlmProvider::with_responses([
        "Moderate",
        "PCP REPORT TEXT",
        "RADIOLOGY REPORT TEXT",
        "PATHOLOGY REPORT TEXT",
        "final",
    ]));
    team_with(provider.clone()).run("mass on scan").await.unwrap();

    let integration_prompt = user_prompt(&provider, 4);
    assert!(integration_prompt.contains("TEAM REPORTS:"));
    assert!(integration_prompt.contains("PCP REPORT TEXT"));
    assert!(integration_prompt.contains("RADIOLOGY REPORT TEXT"));
    assert!(integration_prompt.contains("PATHOLOGY REPORT TEXT"));
    assert!(!integration_prompt.contains("[surgery_round]"));
}

#[tokio::test]
async fn test_whitespace_stage_is_dropped_from_reasoning() {
    let provider = Arc::new(MockLlmProvider::with_responses(["Low", "   \n ", "final"]));
    let result = team_with(provider.clone()).run("mild cough").await.unwrap();

    assert!(result.reasoning.is_empty());
    assert_eq!(result.final_text, "final");
    assert_eq!(provider.call_count(), 3);
}

#[tokio::test]
async fn test_stage_failure_aborts_without_partial_result() {
    let provider = Arc::new(MockLlmProvider::with_responses(["High", "pcp", "rad"]));
    provider.queue_error(LlmError::QuotaExceeded {
        message: "out of credits".into(),
    });
    let err = team_with(provider.clone()).run("trauma").await.unwrap_err();

    assert!(err.is_quota_exhausted());
    // Classifier + three stages attempted; surgery and integration never run.
    assert_eq!(provider.call_count(), 4);
}

#[tokio::test]
async fn test_classifier_failure_stops_pipeline() {
    let provider = Arc::new(MockLlmProvider::new());
    provider.queue_error(LlmError::Timeout { timeout_secs: 30 });
    let err = team_with(provider.clone()).run("stroke").await.unwrap_err();
    assert!(matches!(err, LlmError::Timeout { timeout_secs: 30 }));
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_integrator_failure_propagates() {
    let provider = Arc::new(MockLlmProvider::with_responses(["Low", "pcp"]));
    provider.queue_error(LlmError::Connection {
        message: "reset".into(),
    });
    let err = team_with(provider.clone()).run("rash").await.unwrap_err();
    assert!(matches!(err, LlmError::Connection { .. }));
    assert_eq!(provider.call_count(), 3);
}

/// Answers purely from the role and prompt, so concurrent queries cannot
/// disturb each other.
struct DeterministicBackend;

#[async_trait]
impl ReasoningBackend for DeterministicBackend {
    async fn invoke(
        &self,
        role: &TeamRole,
        request: &ReasoningRequest,
    ) -> Result<BackendOutput, LlmError> {
        tokio::task::yield_now().await;
        let text = match role.id {
            RoleId::Moderator if request.prompt.contains("mild") => "Low".to_string(),
            RoleId::Moderator => "High".to_string(),
            RoleId::Integrator => format!("final for {}", request.prompt.len()),
            other => format!("{other} report"),
        };
        Ok(BackendOutput::Parts(vec![text]))
    }
}

#[tokio::test]
async fn test_concurrent_queries_share_one_team() {
    let team = MedicalTeam::new(Arc::new(get_roles()), Arc::new(DeterministicBackend));

    let (mild, severe) = tokio::join!(team.run("mild headache"), team.run("multi-organ failure"));
    let (mild, severe) = (mild.unwrap(), severe.unwrap());

    assert_eq!(mild.complexity, ComplexityTier::Low);
    assert_eq!(mild.reasoning, vec!["primary_care report"]);
    assert_eq!(severe.complexity, ComplexityTier::High);
    assert_eq!(severe.reasoning.len(), 4);
    assert_eq!(
        ComplexityTier::High.stages().last(),
        Some(&TaskKind::SurgeryRound)
    );
}
