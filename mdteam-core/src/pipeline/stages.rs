//! Stage execution and final integration.

use super::backend::ReasoningBackend;
use crate::error::LlmError;
use crate::roles::{RoleId, RoleRegistry, TeamRole};
use crate::tasks::{ReasoningRequest, TaskKind};
use std::time::Instant;
use tracing::{info, warn};

/// Output of one executed stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageResult {
    pub kind: TaskKind,
    pub role: RoleId,
    pub raw: String,
    /// `None` when the raw text had no non-empty sentence fragment.
    pub summary: Option<String>,
}

/// Short summary of a stage's raw text: the first two non-empty
/// period-delimited fragments, trimmed and rejoined with `". "`.
pub fn summarize(text: &str) -> Option<String> {
    let fragments: Vec<&str> = text
        .split('.')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .take(2)
        .collect();
    if fragments.is_empty() {
        None
    } else {
        Some(fragments.join(". "))
    }
}

/// Run each selected stage against its own role, strictly one after another.
///
/// The first backend failure aborts the loop and is returned unchanged.
pub async fn execute(
    backend: &dyn ReasoningBackend,
    roles: &RoleRegistry,
    stages: &[&ReasoningRequest],
) -> Result<Vec<StageResult>, LlmError> {
    let mut results = Vec::with_capacity(stages.len());

    for request in stages {
        let role = roles.get(request.role);
        let start = Instant::now();
        let raw = backend.invoke(role, request).await?.into_text();
        let summary = summarize(&raw);

        info!(
            stage = %request.kind,
            role = %role.id,
            latency_ms = start.elapsed().as_millis() as u64,
            chars = raw.len(),
            "Stage complete"
        );
        if summary.is_none() {
            warn!(stage = %request.kind, "Stage produced no summary; dropping it from reasoning");
        }

        results.push(StageResult {
            kind: request.kind,
            role: request.role,
            raw,
            summary,
        });
    }

    Ok(results)
}

/// Ask the integrator to consolidate every stage report into the final answer.
///
/// The plan's integration request stays untouched; the reports are appended
/// to a copy of its prompt. The backend's text is returned as is, apart from
/// surrounding whitespace.
pub async fn integrate(
    backend: &dyn ReasoningBackend,
    integrator: &TeamRole,
    request: &ReasoningRequest,
    reports: &[StageResult],
) -> Result<String, LlmError> {
    let start = Instant::now();
    let request = with_team_reports(request, reports);
    let answer = backend.invoke(integrator, &request).await?.into_text();
    info!(
        role = %integrator.id,
        reports = reports.len(),
        latency_ms = start.elapsed().as_millis() as u64,
        "Integration complete"
    );
    Ok(answer)
}

fn with_team_reports(request: &ReasoningRequest, reports: &[StageResult]) -> ReasoningRequest {
    let mut prompt = request.prompt.clone();
    if !reports.is_empty() {
        prompt.push_str("\n\nTEAM REPORTS:");
        for report in reports {
            prompt.push_str(&format!("\n\n[{}]\n{}", report.kind, report.raw));
        }
    }
    ReasoningRequest {
        prompt,
        ..request.clone()
    }
}
