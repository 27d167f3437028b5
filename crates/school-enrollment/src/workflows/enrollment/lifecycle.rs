use serde::Serialize;

use super::domain::{Applicant, ApplicantId, EnrollmentStatus};
use super::gating::{self, GatingBlocker, GatingReport};

/// Raised when a finalize or contract action runs before gating allows it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreconditionError {
    #[error("applicant {applicant_id} is not ready to finalize ({})", summarize(.blockers))]
    NotReady {
        applicant_id: ApplicantId,
        blockers: Vec<GatingBlocker>,
    },
    #[error("contract generation already in progress for applicant {0}")]
    ContractInFlight(ApplicantId),
}

fn summarize(blockers: &[GatingBlocker]) -> String {
    blockers
        .iter()
        .map(GatingBlocker::summary)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result of a status recompute, kept so callers can log or display what moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusTransition {
    pub from: EnrollmentStatus,
    pub to: EnrollmentStatus,
}

impl StatusTransition {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// State machine over [`EnrollmentStatus`].
pub struct EnrollmentLifecycle;

impl EnrollmentLifecycle {
    /// Next status given the current one and a fresh readiness evaluation.
    ///
    /// Readiness always promotes. A regression demotes `ReadyToFinalize` so a stale ready label
    /// never survives a save.
    pub fn recompute(current: EnrollmentStatus, ready: bool) -> StatusTransition {
        let to = match (current, ready) {
            (_, true) => EnrollmentStatus::ReadyToFinalize,
            (EnrollmentStatus::ReadyToFinalize, false) => EnrollmentStatus::PendingAnalysis,
            (EnrollmentStatus::PendingAnalysis, false) => EnrollmentStatus::PendingAnalysis,
        };

        StatusTransition { from: current, to }
    }

    /// Recompute and write the status onto the applicant.
    pub fn save(applicant: &mut Applicant, financials_validated: bool) -> StatusTransition {
        let ready = gating::is_ready_to_finalize(applicant, financials_validated);
        let transition = Self::recompute(applicant.status, ready);
        applicant.status = transition.to;
        transition
    }

    /// Live gating check guarding the irreversible finalize and contract actions.
    pub fn ensure_finalizable(
        applicant: &Applicant,
        financials_validated: bool,
    ) -> Result<GatingReport, PreconditionError> {
        let report = gating::evaluate(applicant, financials_validated);
        if report.is_ready() {
            Ok(report)
        } else {
            Err(PreconditionError::NotReady {
                applicant_id: applicant.id.clone(),
                blockers: report.blockers,
            })
        }
    }
}
