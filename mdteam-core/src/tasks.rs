//! Task template engine.
//!
//! Renders the six reasoning requests for one query. Each request is bound to
//! a role and carries a strict output-format contract. Rendering is pure: the
//! same query and registry always yield the same plan.

use crate::roles::{RoleId, RoleRegistry};
use serde::{Deserialize, Serialize};

/// The six fixed steps of a plan, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    ComplexityCheck,
    PrimaryCareRound,
    RadiologyRound,
    PathologyRound,
    SurgeryRound,
    FinalIntegration,
}

impl TaskKind {
    pub const ALL: [TaskKind; 6] = [
        TaskKind::ComplexityCheck,
        TaskKind::PrimaryCareRound,
        TaskKind::RadiologyRound,
        TaskKind::PathologyRound,
        TaskKind::SurgeryRound,
        TaskKind::FinalIntegration,
    ];

    /// The role this step is bound to.
    pub fn role(&self) -> RoleId {
        match self {
            TaskKind::ComplexityCheck => RoleId::Moderator,
            TaskKind::PrimaryCareRound => RoleId::PrimaryCare,
            TaskKind::RadiologyRound => RoleId::Radiologist,
            TaskKind::PathologyRound => RoleId::Pathologist,
            TaskKind::SurgeryRound => RoleId::Surgeon,
            TaskKind::FinalIntegration => RoleId::Integrator,
        }
    }

    fn index(&self) -> usize {
        match self {
            TaskKind::ComplexityCheck => 0,
            TaskKind::PrimaryCareRound => 1,
            TaskKind::RadiologyRound => 2,
            TaskKind::PathologyRound => 3,
            TaskKind::SurgeryRound => 4,
            TaskKind::FinalIntegration => 5,
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TaskKind::ComplexityCheck => "complexity_check",
            TaskKind::PrimaryCareRound => "primary_care_round",
            TaskKind::RadiologyRound => "radiology_round",
            TaskKind::PathologyRound => "pathology_round",
            TaskKind::SurgeryRound => "surgery_round",
            TaskKind::FinalIntegration => "final_integration",
        };
        f.write_str(name)
    }
}

/// A fully rendered prompt plus its bound role and expected-output contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningRequest {
    pub kind: TaskKind,
    pub role: RoleId,
    pub prompt: String,
    pub expected_output: String,
}

/// The ordered set of six requests rendered for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPlan {
    requests: [ReasoningRequest; 6],
}

impl TaskPlan {
    /// The complexity classification request (always first).
    pub fn classification(&self) -> &ReasoningRequest {
        &self.requests[0]
    }

    /// The final integration request (always last).
    pub fn integration(&self) -> &ReasoningRequest {
        &self.requests[5]
    }

    pub fn get(&self, kind: TaskKind) -> &ReasoningRequest {
        &self.requests[kind.index()]
    }

    pub fn requests(&self) -> &[ReasoningRequest] {
        &self.requests
    }
}

/// Render the six reasoning requests for `query`.
///
/// `query` is interpolated verbatim; rejecting empty input is the caller's job.
pub fn build_requests(query: &str, roles: &RoleRegistry) -> TaskPlan {
    let requests = TaskKind::ALL.map(|kind| {
        let role = kind.role();
        let title = &roles.get(role).title;
        let (prompt, expected_output) = render(kind, query, title);
        ReasoningRequest {
            kind,
            role,
            prompt,
            expected_output: expected_output.to_string(),
        }
    });
    TaskPlan { requests }
}

fn render(kind: TaskKind, query: &str, title: &str) -> (String, &'static str) {
    match kind {
        TaskKind::ComplexityCheck => (
            format!(
                "You must strictly answer with exactly one of these words:\n\n\
                 Low\nModerate\nHigh\n\n\
                 Classify the medical query based on clinical complexity:\n\n{query}"
            ),
            "One word only: Low / Moderate / High",
        ),
        TaskKind::PrimaryCareRound => (
            format!(
                "PRIMARY CARE CLINICIAN ROUND (PCP SOLO):\n\n\
                 Case:\n{query}\n\n\
                 You are acting as a {title} for a LOW complexity case.\n\n\
                 FORMAT STRICTLY:\n\n\
                 • Updated Diagnosis:\n(text)\n\n\
                 • Reasoning:\n(text explaining how you reached the diagnosis)"
            ),
            "Diagnosis + Reasoning in the above structured format.",
        ),
        TaskKind::RadiologyRound => (
            format!(
                "RADIOLOGY ROUND (MDT / ICT):\n\n\
                 Case:\n{query}\n\n\
                 You are a {title} in a multidisciplinary team.\n\n\
                 FORMAT STRICTLY:\n\n\
                 • Imaging Findings:\n(text – what imaging would show, or how imaging helps)\n\n\
                 • Reasoning:\n(text explaining your interpretation and impact on diagnosis/management)"
            ),
            "Imaging Findings + Reasoning.",
        ),
        TaskKind::PathologyRound => (
            format!(
                "PATHOLOGY ROUND (MDT / ICT):\n\n\
                 Case:\n{query}\n\n\
                 You are a {title} in a multidisciplinary team.\n\n\
                 FORMAT STRICTLY:\n\n\
                 • Pathology Findings:\n(text – labs, biopsy, histology, other tests)\n\n\
                 • Reasoning:\n(text explaining how pathology supports or changes the diagnosis)"
            ),
            "Pathology Findings + Reasoning.",
        ),
        TaskKind::SurgeryRound => (
            format!(
                "SURGERY ROUND (ICT – Surgical Assessment):\n\n\
                 Case:\n{query}\n\n\
                 You are a {title} in the Integrated Care Team (ICT).\n\n\
                 FORMAT STRICTLY:\n\n\
                 • Surgical Assessment:\n(text – need for surgery, urgency, risks, alternatives)\n\n\
                 • Reasoning:\n(text explaining your decision-making)"
            ),
            "Surgical Assessment + Reasoning.",
        ),
        TaskKind::FinalIntegration => (
            format!(
                "FINAL INTEGRATION ROUND (ICT LEAD / {title}):\n\n\
                 Case:\n{query}\n\n\
                 Combine ALL available team reports (PCP, Radiology, Pathology, Surgery if present)\n\
                 and generate a final consolidated decision.\n\n\
                 FORMAT STRICTLY:\n\n\
                 • Final Diagnosis:\n(text)\n\n\
                 • Management Plan:\n(text – investigations, treatment, monitoring, referrals)\n\n\
                 • Justification:\n(text – how you integrated the multidisciplinary inputs and why this plan is appropriate)"
            ),
            "Final Diagnosis + Management Plan + Justification.",
        ),
    }
}
