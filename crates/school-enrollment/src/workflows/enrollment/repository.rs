use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Applicant, ApplicantId, Document};
use super::gating::{GatingBlocker, GatingReport};

/// Storage abstraction so the service can be exercised without a database.
pub trait ApplicantRepository: Send + Sync {
    fn insert(&self, applicant: Applicant) -> Result<Applicant, RepositoryError>;
    fn update(&self, applicant: Applicant) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ApplicantId) -> Result<Option<Applicant>, RepositoryError>;
    fn remove(&self, id: &ApplicantId) -> Result<(), RepositoryError>;
    fn pending(&self, limit: usize) -> Result<Vec<Applicant>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Receiver of finalized applicants; owns the enrolled-student record from then on.
pub trait EnrolledStudentSink: Send + Sync {
    fn enroll(&self, applicant: Applicant) -> Result<EnrolledStudentRecord, SinkError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrolledStudentRecord {
    pub student_id: String,
    pub applicant_id: ApplicantId,
    pub student_name: String,
    pub enrolled_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("enrolled-student registry unavailable: {0}")]
    Unavailable(String),
    #[error("enrolled-student registry refused the handoff: {0}")]
    Refused(String),
}

/// Sanitized applicant status exposed to callers.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicantStatusView {
    pub applicant_id: ApplicantId,
    pub student_name: String,
    pub status: &'static str,
    pub ready_to_finalize: bool,
    pub readiness: String,
    pub blockers: Vec<GatingBlocker>,
    pub documents: Vec<Document>,
}

impl ApplicantStatusView {
    pub fn new(applicant: &Applicant, report: GatingReport) -> Self {
        Self {
            applicant_id: applicant.id.clone(),
            student_name: applicant.student.full_name.clone(),
            status: applicant.status.label(),
            ready_to_finalize: report.is_ready(),
            readiness: report.summary(),
            blockers: report.blockers,
            documents: applicant.documents.clone(),
        }
    }
}
