//! Finalize-readiness rules.
//!
//! Readiness is a strict conjunction of the persisted validation flags, the session-scoped
//! financial validation and the approval state of every document. Nothing is cached; callers
//! re-evaluate after every mutation.

use serde::{Deserialize, Serialize};

use super::domain::{Applicant, DocumentStatus};

/// A single unmet condition keeping the applicant from finalizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GatingBlocker {
    DataNotValidated,
    GuardianDataNotValidated,
    PaymentNotConfirmed,
    FinancialsNotValidated,
    DocumentNotApproved { name: String, status: DocumentStatus },
}

impl GatingBlocker {
    pub fn summary(&self) -> String {
        match self {
            GatingBlocker::DataNotValidated => "student data not validated".to_string(),
            GatingBlocker::GuardianDataNotValidated => "guardian data not validated".to_string(),
            GatingBlocker::PaymentNotConfirmed => "payment not confirmed".to_string(),
            GatingBlocker::FinancialsNotValidated => "financial terms not validated".to_string(),
            GatingBlocker::DocumentNotApproved { name, status } => {
                format!("document `{name}` is {}", status.label())
            }
        }
    }
}

/// Outcome of a readiness evaluation, listing every blocker found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatingReport {
    pub blockers: Vec<GatingBlocker>,
}

impl GatingReport {
    pub fn is_ready(&self) -> bool {
        self.blockers.is_empty()
    }

    pub fn summary(&self) -> String {
        if self.blockers.is_empty() {
            return "ready to finalize".to_string();
        }

        let reasons: Vec<String> = self.blockers.iter().map(GatingBlocker::summary).collect();
        format!("blocked: {}", reasons.join("; "))
    }
}

/// Collect every blocker for the applicant. An empty document list blocks nothing.
pub fn evaluate(applicant: &Applicant, financials_validated: bool) -> GatingReport {
    let mut blockers = Vec::new();

    if !applicant.data_validated {
        blockers.push(GatingBlocker::DataNotValidated);
    }
    if !applicant.guardian_data_validated {
        blockers.push(GatingBlocker::GuardianDataNotValidated);
    }
    if !applicant.payment_confirmed {
        blockers.push(GatingBlocker::PaymentNotConfirmed);
    }
    if !financials_validated {
        blockers.push(GatingBlocker::FinancialsNotValidated);
    }

    blockers.extend(
        applicant
            .documents
            .iter()
            .filter(|document| !document.is_approved())
            .map(|document| GatingBlocker::DocumentNotApproved {
                name: document.name.clone(),
                status: document.status,
            }),
    );

    GatingReport { blockers }
}

pub fn is_ready_to_finalize(applicant: &Applicant, financials_validated: bool) -> bool {
    evaluate(applicant, financials_validated).is_ready()
}
