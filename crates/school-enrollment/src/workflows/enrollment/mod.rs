//! Enrollment desk workflow: document review, finalize gating, status lifecycle and contract
//! generation for school applicants.

pub mod checklist;
pub mod contract;
pub mod domain;
pub mod gating;
pub mod lifecycle;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use checklist::{DocumentChecklist, ValidationError};
pub use contract::{
    ContractError, ContractPipeline, ContractRenderer, ContractTemplate, ContractTextFiller,
    EnrolledStudentProjection, FillError, FilledContract, GenerationError, RenderError,
    RenderedArtifact, RenderedContract, SchoolInfo, NOT_INFORMED,
};
pub use domain::{
    Address, Applicant, ApplicantId, DeliveryMethod, DiscountProgram, Document, DocumentDecision,
    DocumentStatus, EnrollmentStatus, FinancialTerms, Guardian, PaymentMethod, StudentIdentity,
    ValidationFlag,
};
pub use gating::{is_ready_to_finalize, GatingBlocker, GatingReport};
pub use lifecycle::{EnrollmentLifecycle, PreconditionError, StatusTransition};
pub use repository::{
    ApplicantRepository, ApplicantStatusView, EnrolledStudentRecord, EnrolledStudentSink,
    RepositoryError, SinkError,
};
pub use router::{enrollment_router, FlagUpdate, PendingQuery, SessionFlags};
pub use service::{EnrollmentService, EnrollmentServiceError};
