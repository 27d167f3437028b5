use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;

use super::domain::{Applicant, ApplicantId, DocumentDecision, ValidationFlag};
use super::lifecycle::PreconditionError;
use super::repository::{ApplicantRepository, EnrolledStudentSink, RepositoryError};
use super::service::{EnrollmentService, EnrollmentServiceError};

/// Session-scoped checks supplied with every gating request.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SessionFlags {
    #[serde(default)]
    pub financials_validated: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FlagUpdate {
    pub flag: ValidationFlag,
    pub value: bool,
}

/// Listing parameters for applicants awaiting analysis.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PendingQuery {
    #[serde(default = "default_pending_limit")]
    pub limit: usize,
    #[serde(default)]
    pub financials_validated: bool,
}

fn default_pending_limit() -> usize {
    50
}

/// Router builder exposing the enrollment desk over HTTP.
pub fn enrollment_router<R, S>(service: Arc<EnrollmentService<R, S>>) -> Router
where
    R: ApplicantRepository + 'static,
    S: EnrolledStudentSink + 'static,
{
    Router::new()
        .route(
            "/api/v1/enrollment/applicants",
            post(register_handler::<R, S>).get(pending_handler::<R, S>),
        )
        .route(
            "/api/v1/enrollment/applicants/:applicant_id",
            get(status_handler::<R, S>),
        )
        .route(
            "/api/v1/enrollment/applicants/:applicant_id/documents/:document",
            post(document_handler::<R, S>).get(rejection_draft_handler::<R, S>),
        )
        .route(
            "/api/v1/enrollment/applicants/:applicant_id/flags",
            put(flag_handler::<R, S>),
        )
        .route(
            "/api/v1/enrollment/applicants/:applicant_id/save",
            post(save_handler::<R, S>),
        )
        .route(
            "/api/v1/enrollment/applicants/:applicant_id/finalize",
            post(finalize_handler::<R, S>),
        )
        .route(
            "/api/v1/enrollment/applicants/:applicant_id/contract",
            post(contract_handler::<R, S>),
        )
        .with_state(service)
}

pub(crate) async fn register_handler<R, S>(
    State(service): State<Arc<EnrollmentService<R, S>>>,
    axum::Json(applicant): axum::Json<Applicant>,
) -> Response
where
    R: ApplicantRepository + 'static,
    S: EnrolledStudentSink + 'static,
{
    match service.register(applicant) {
        Ok(stored) => {
            let view = service.readiness(&stored.id, false);
            match view {
                Ok(view) => (StatusCode::CREATED, axum::Json(view)).into_response(),
                Err(err) => error_response(err),
            }
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn pending_handler<R, S>(
    State(service): State<Arc<EnrollmentService<R, S>>>,
    Query(query): Query<PendingQuery>,
) -> Response
where
    R: ApplicantRepository + 'static,
    S: EnrolledStudentSink + 'static,
{
    match service.pending_applicants(query.limit, query.financials_validated) {
        Ok(views) => (StatusCode::OK, axum::Json(views)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn status_handler<R, S>(
    State(service): State<Arc<EnrollmentService<R, S>>>,
    Path(applicant_id): Path<String>,
    Query(session): Query<SessionFlags>,
) -> Response
where
    R: ApplicantRepository + 'static,
    S: EnrolledStudentSink + 'static,
{
    let id = ApplicantId(applicant_id);
    match service.readiness(&id, session.financials_validated) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn document_handler<R, S>(
    State(service): State<Arc<EnrollmentService<R, S>>>,
    Path((applicant_id, document)): Path<(String, String)>,
    axum::Json(decision): axum::Json<DocumentDecision>,
) -> Response
where
    R: ApplicantRepository + 'static,
    S: EnrolledStudentSink + 'static,
{
    let id = ApplicantId(applicant_id);
    match service.update_document(&id, &document, &decision) {
        Ok(documents) => (StatusCode::OK, axum::Json(documents)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn rejection_draft_handler<R, S>(
    State(service): State<Arc<EnrollmentService<R, S>>>,
    Path((applicant_id, document)): Path<(String, String)>,
) -> Response
where
    R: ApplicantRepository + 'static,
    S: EnrolledStudentSink + 'static,
{
    let id = ApplicantId(applicant_id);
    match service.rejection_draft(&id, &document) {
        Ok(draft) => {
            let payload = json!({
                "applicant_id": id,
                "document": document,
                "rejection_draft": draft,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn flag_handler<R, S>(
    State(service): State<Arc<EnrollmentService<R, S>>>,
    Path(applicant_id): Path<String>,
    axum::Json(update): axum::Json<FlagUpdate>,
) -> Response
where
    R: ApplicantRepository + 'static,
    S: EnrolledStudentSink + 'static,
{
    let id = ApplicantId(applicant_id);
    match service.set_validation_flag(&id, update.flag, update.value) {
        Ok(applicant) => {
            let payload = json!({
                "applicant_id": applicant.id,
                "data_validated": applicant.data_validated,
                "guardian_data_validated": applicant.guardian_data_validated,
                "payment_confirmed": applicant.payment_confirmed,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn save_handler<R, S>(
    State(service): State<Arc<EnrollmentService<R, S>>>,
    Path(applicant_id): Path<String>,
    axum::Json(session): axum::Json<SessionFlags>,
) -> Response
where
    R: ApplicantRepository + 'static,
    S: EnrolledStudentSink + 'static,
{
    let id = ApplicantId(applicant_id);
    match service.recompute_status(&id, session.financials_validated) {
        Ok(transition) => {
            let payload = json!({
                "applicant_id": id,
                "previous_status": transition.from.label(),
                "status": transition.to.label(),
                "changed": transition.changed(),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn finalize_handler<R, S>(
    State(service): State<Arc<EnrollmentService<R, S>>>,
    Path(applicant_id): Path<String>,
    axum::Json(session): axum::Json<SessionFlags>,
) -> Response
where
    R: ApplicantRepository + 'static,
    S: EnrolledStudentSink + 'static,
{
    let id = ApplicantId(applicant_id);
    match service.attempt_finalize(&id, session.financials_validated) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn contract_handler<R, S>(
    State(service): State<Arc<EnrollmentService<R, S>>>,
    Path(applicant_id): Path<String>,
    axum::Json(session): axum::Json<SessionFlags>,
) -> Response
where
    R: ApplicantRepository + 'static,
    S: EnrolledStudentSink + 'static,
{
    let id = ApplicantId(applicant_id);
    let today = Local::now().date_naive();
    match service
        .download_contract(&id, session.financials_validated, today)
        .await
    {
        Ok(rendered) => (StatusCode::OK, axum::Json(rendered)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) fn error_response(err: EnrollmentServiceError) -> Response {
    let status = match &err {
        EnrollmentServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EnrollmentServiceError::Precondition(PreconditionError::NotReady { .. }) => {
            StatusCode::PRECONDITION_FAILED
        }
        EnrollmentServiceError::Precondition(PreconditionError::ContractInFlight(_)) => {
            StatusCode::CONFLICT
        }
        EnrollmentServiceError::Generation(_) => StatusCode::BAD_GATEWAY,
        EnrollmentServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        EnrollmentServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        EnrollmentServiceError::Repository(RepositoryError::Unavailable(_))
        | EnrollmentServiceError::Sink(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let mut payload = json!({ "error": err.to_string() });
    if let EnrollmentServiceError::Precondition(PreconditionError::NotReady { blockers, .. }) =
        &err
    {
        payload["blockers"] = json!(blockers);
    }

    (status, axum::Json(payload)).into_response()
}
