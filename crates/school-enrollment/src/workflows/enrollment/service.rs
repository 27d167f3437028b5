use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::checklist::{DocumentChecklist, ValidationError};
use super::contract::{
    ContractError, ContractPipeline, ContractTemplate, GenerationError, RenderedContract,
    SchoolInfo,
};
use super::domain::{
    Applicant, ApplicantId, Document, DocumentDecision, EnrollmentStatus, ValidationFlag,
};
use super::gating;
use super::lifecycle::{EnrollmentLifecycle, PreconditionError, StatusTransition};
use super::repository::{
    ApplicantRepository, ApplicantStatusView, EnrolledStudentRecord, EnrolledStudentSink,
    RepositoryError, SinkError,
};

/// Caller-facing facade composing the checklist, gating, lifecycle and contract pipeline over a
/// repository and the enrolled-student sink.
pub struct EnrollmentService<R, S> {
    repository: Arc<R>,
    sink: Arc<S>,
    pipeline: Arc<ContractPipeline>,
    school: SchoolInfo,
    template: ContractTemplate,
}

impl<R, S> EnrollmentService<R, S>
where
    R: ApplicantRepository + 'static,
    S: EnrolledStudentSink + 'static,
{
    pub fn new(
        repository: Arc<R>,
        sink: Arc<S>,
        pipeline: Arc<ContractPipeline>,
        school: SchoolInfo,
        template: ContractTemplate,
    ) -> Self {
        Self {
            repository,
            sink,
            pipeline,
            school,
            template,
        }
    }

    pub fn pipeline(&self) -> &ContractPipeline {
        &self.pipeline
    }

    /// Accept a new applicant. Intake always starts in `PendingAnalysis`.
    pub fn register(&self, mut applicant: Applicant) -> Result<Applicant, EnrollmentServiceError> {
        if applicant.guardians.is_empty() {
            return Err(ValidationError::MissingGuardian.into());
        }
        let mut checklist = DocumentChecklist::new(std::mem::take(&mut applicant.documents))?;
        let cleared = checklist.discard_stale_reasons();
        if cleared > 0 {
            debug!(
                applicant_id = %applicant.id,
                cleared,
                "dropped reasons on non-rejected documents"
            );
        }

        applicant.documents = checklist.into_documents();
        applicant.status = EnrollmentStatus::PendingAnalysis;
        let stored = self.repository.insert(applicant)?;
        info!(applicant_id = %stored.id, "applicant registered");
        Ok(stored)
    }

    pub fn get(&self, id: &ApplicantId) -> Result<Applicant, EnrollmentServiceError> {
        let applicant = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(applicant)
    }

    /// Stored status alongside a live readiness evaluation.
    pub fn readiness(
        &self,
        id: &ApplicantId,
        financials_validated: bool,
    ) -> Result<ApplicantStatusView, EnrollmentServiceError> {
        let applicant = self.get(id)?;
        let report = gating::evaluate(&applicant, financials_validated);
        Ok(ApplicantStatusView::new(&applicant, report))
    }

    /// Applicants still awaiting analysis, each with a live readiness evaluation.
    pub fn pending_applicants(
        &self,
        limit: usize,
        financials_validated: bool,
    ) -> Result<Vec<ApplicantStatusView>, EnrollmentServiceError> {
        let pending = self.repository.pending(limit)?;
        Ok(pending
            .iter()
            .map(|applicant| {
                ApplicantStatusView::new(
                    applicant,
                    gating::evaluate(applicant, financials_validated),
                )
            })
            .collect())
    }

    /// Current reason of a document, used to pre-populate a re-rejection.
    pub fn rejection_draft(
        &self,
        id: &ApplicantId,
        document: &str,
    ) -> Result<String, EnrollmentServiceError> {
        let applicant = self.get(id)?;
        let checklist = DocumentChecklist::new(applicant.documents)?;
        Ok(checklist.rejection_draft(document)?)
    }

    /// Review a document by its position in the checklist.
    pub fn update_document_at(
        &self,
        id: &ApplicantId,
        index: usize,
        decision: &DocumentDecision,
    ) -> Result<Vec<Document>, EnrollmentServiceError> {
        let applicant = self.get(id)?;
        let checklist = DocumentChecklist::new(applicant.documents)?;
        let name = checklist.name_at(index)?.to_string();
        self.update_document(id, &name, decision)
    }

    /// Approve or reject one document and return the updated checklist.
    ///
    /// Status is not recomputed here; that happens on save.
    pub fn update_document(
        &self,
        id: &ApplicantId,
        document: &str,
        decision: &DocumentDecision,
    ) -> Result<Vec<Document>, EnrollmentServiceError> {
        let mut applicant = self.get(id)?;
        let mut checklist = DocumentChecklist::new(std::mem::take(&mut applicant.documents))?;
        checklist.apply(document, decision)?;

        applicant.documents = checklist.into_documents();
        let documents = applicant.documents.clone();
        self.repository.update(applicant)?;

        debug!(applicant_id = %id, document, ?decision, "document reviewed");
        Ok(documents)
    }

    pub fn set_validation_flag(
        &self,
        id: &ApplicantId,
        flag: ValidationFlag,
        value: bool,
    ) -> Result<Applicant, EnrollmentServiceError> {
        let mut applicant = self.get(id)?;
        flag.apply(&mut applicant, value);
        self.repository.update(applicant.clone())?;

        debug!(applicant_id = %id, ?flag, value, "validation flag updated");
        Ok(applicant)
    }

    /// Save: persist the recomputed status.
    pub fn recompute_status(
        &self,
        id: &ApplicantId,
        financials_validated: bool,
    ) -> Result<StatusTransition, EnrollmentServiceError> {
        let mut applicant = self.get(id)?;
        let transition = EnrollmentLifecycle::save(&mut applicant, financials_validated);
        self.repository.update(applicant)?;

        if transition.changed() {
            info!(
                applicant_id = %id,
                from = transition.from.label(),
                to = transition.to.label(),
                "enrollment status changed"
            );
        }
        Ok(transition)
    }

    /// Hand a ready applicant to the enrolled-student sink. Refused while gating fails.
    ///
    /// The record leaves the repository before the handoff and is put back if the sink refuses,
    /// so an applicant is never enrolled while still finalizable.
    pub fn attempt_finalize(
        &self,
        id: &ApplicantId,
        financials_validated: bool,
    ) -> Result<EnrolledStudentRecord, EnrollmentServiceError> {
        let applicant = self.get(id)?;
        if let Err(err) = EnrollmentLifecycle::ensure_finalizable(&applicant, financials_validated)
        {
            warn!(applicant_id = %id, error = %err, "finalize refused");
            return Err(err.into());
        }

        self.repository.remove(id)?;
        let record = match self.sink.enroll(applicant.clone()) {
            Ok(record) => record,
            Err(err) => {
                if let Err(restore) = self.repository.insert(applicant) {
                    warn!(
                        applicant_id = %id,
                        error = %restore,
                        "applicant not restored after refused handoff"
                    );
                }
                warn!(applicant_id = %id, error = %err, "enrolled-student sink refused applicant");
                return Err(err.into());
            }
        };

        info!(
            applicant_id = %id,
            student_id = %record.student_id,
            "applicant finalized as enrolled student"
        );
        Ok(record)
    }

    pub async fn download_contract(
        &self,
        id: &ApplicantId,
        financials_validated: bool,
        issued_on: NaiveDate,
    ) -> Result<RenderedContract, EnrollmentServiceError> {
        let applicant = self.get(id)?;
        let rendered = self
            .pipeline
            .download(
                &self.template,
                &applicant,
                financials_validated,
                &self.school,
                issued_on,
            )
            .await?;
        Ok(rendered)
    }
}

/// Error raised by the enrollment service.
#[derive(Debug, thiserror::Error)]
pub enum EnrollmentServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl From<ContractError> for EnrollmentServiceError {
    fn from(value: ContractError) -> Self {
        match value {
            ContractError::Precondition(err) => Self::Precondition(err),
            ContractError::Generation(err) => Self::Generation(err),
        }
    }
}
