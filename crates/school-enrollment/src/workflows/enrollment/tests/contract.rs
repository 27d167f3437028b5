use std::sync::Arc;

use super::common::*;
use crate::workflows::enrollment::contract::{
    ContractError, EnrolledStudentProjection, GenerationError, NOT_INFORMED,
};
use crate::workflows::enrollment::domain::DocumentStatus;
use crate::workflows::enrollment::lifecycle::PreconditionError;

#[test]
fn projection_marks_missing_fields_as_not_informed() {
    let mut applicant = ready_applicant("projection");
    applicant.payment_method = None;
    applicant.financials.discount_program = None;

    let projection = EnrolledStudentProjection::from_applicant(&applicant, issued_on());

    assert_eq!(projection.student_name, "João Ação");
    assert_eq!(projection.grade, "5th grade");
    assert_eq!(projection.class_name, NOT_INFORMED);
    assert_eq!(projection.student_tax_id, NOT_INFORMED);
    assert_eq!(projection.payment_method, NOT_INFORMED);
    assert_eq!(projection.discount_program, NOT_INFORMED);
    assert_eq!(projection.fee_recurring, "1250.50");
    assert_eq!(projection.issued_on, "2025-01-15");
    assert_eq!(
        projection.address,
        "Rua das Palmeiras, 42 - apto 12, Jardim - Sao Paulo/SP - 01234-000"
    );
    assert!(projection.fields().values().all(|value| !value.is_empty()));
}

#[test]
fn projection_without_guardians_still_fills_every_field() {
    let mut applicant = ready_applicant("orphan");
    applicant.guardians.clear();

    let projection = EnrolledStudentProjection::from_applicant(&applicant, issued_on());

    assert_eq!(projection.guardian_name, NOT_INFORMED);
    assert_eq!(projection.guardian_email, NOT_INFORMED);
}

#[tokio::test]
async fn generate_refuses_without_calling_filler_when_not_ready() {
    let filler = Arc::new(RecordingFiller::default());
    let renderer = Arc::new(MemoryRenderer::default());
    let pipeline = pipeline(filler.clone(), renderer);
    let mut applicant = ready_applicant("not-ready");
    applicant.documents[0].status = DocumentStatus::Rejected;

    let result = pipeline
        .generate(&template(), &applicant, true, &school(), issued_on())
        .await;

    assert!(matches!(
        result,
        Err(ContractError::Precondition(PreconditionError::NotReady { .. }))
    ));
    assert_eq!(filler.calls(), 0);
}

#[tokio::test]
async fn generate_hands_the_projection_to_the_filler() {
    let filler = Arc::new(RecordingFiller::default());
    let renderer = Arc::new(MemoryRenderer::default());
    let pipeline = pipeline(filler.clone(), renderer);
    let applicant = ready_applicant("filled");

    let filled = pipeline
        .generate(&template(), &applicant, true, &school(), issued_on())
        .await
        .expect("generation succeeds");

    assert_eq!(filled.file_stem, "contract_jo_o_a__o");
    assert_eq!(filled.title, "Enrollment Contract - João Ação");
    assert!(filled.text().contains("Student: João Ação"));
    assert!(filled.text().contains("Monthly fee: 1250.50"));
    let snapshot = filler.last_snapshot().expect("filler saw a snapshot");
    assert_eq!(snapshot.applicant_id, applicant.id);
}

#[tokio::test]
async fn fill_failure_keeps_message_and_releases_slot() {
    let filler = Arc::new(RecordingFiller::failing("model quota exceeded"));
    let renderer = Arc::new(MemoryRenderer::default());
    let pipeline = pipeline(filler.clone(), renderer.clone());
    let applicant = ready_applicant("fill-fails");

    let result = pipeline
        .download(&template(), &applicant, true, &school(), issued_on())
        .await;

    match result {
        Err(ContractError::Generation(GenerationError::Fill(message))) => {
            assert_eq!(message, "model quota exceeded")
        }
        other => panic!("expected fill failure, got {other:?}"),
    }
    assert!(!pipeline.is_in_flight(&applicant.id));
    assert!(renderer.rendered().is_empty());
}

#[tokio::test]
async fn render_failure_is_surfaced_and_releases_slot() {
    let filler = Arc::new(RecordingFiller::default());
    let renderer = Arc::new(MemoryRenderer::failing("disk full"));
    let pipeline = pipeline(filler.clone(), renderer);
    let applicant = ready_applicant("render-fails");

    let result = pipeline
        .download(&template(), &applicant, true, &school(), issued_on())
        .await;

    match result {
        Err(ContractError::Generation(GenerationError::Render(message))) => {
            assert_eq!(message, "disk full")
        }
        other => panic!("expected render failure, got {other:?}"),
    }
    assert_eq!(filler.calls(), 1);
    assert!(!pipeline.is_in_flight(&applicant.id));
}

#[tokio::test]
async fn download_renders_markup_and_releases_slot() {
    let filler = Arc::new(RecordingFiller::default());
    let renderer = Arc::new(MemoryRenderer::default());
    let pipeline = pipeline(filler, renderer.clone());
    let applicant = ready_applicant("download");

    let rendered = pipeline
        .download(&template(), &applicant, true, &school(), issued_on())
        .await
        .expect("download succeeds");

    assert_eq!(rendered.applicant_id, applicant.id);
    assert_eq!(rendered.artifact.location, "memory://contract_jo_o_a__o.html");
    let calls = renderer.rendered();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "contract_jo_o_a__o");
    assert!(calls[0].1.contains("<h1>Enrollment Contract - João Ação</h1>"));
    assert!(calls[0].1.contains("Colegio Horizonte"));
    assert!(!pipeline.is_in_flight(&applicant.id));
}

#[tokio::test]
async fn second_download_is_refused_while_one_is_outstanding() {
    let filler = Arc::new(RecordingFiller::default());
    let renderer = Arc::new(MemoryRenderer::default());
    let pipeline = pipeline(filler.clone(), renderer);
    let applicant = ready_applicant("single-flight");

    let slot = pipeline.begin(&applicant.id).expect("slot is free");
    assert!(pipeline.is_in_flight(&applicant.id));

    let refused = pipeline
        .download(&template(), &applicant, true, &school(), issued_on())
        .await;
    match refused {
        Err(ContractError::Precondition(PreconditionError::ContractInFlight(id))) => {
            assert_eq!(id, applicant.id)
        }
        other => panic!("expected in-flight refusal, got {other:?}"),
    }
    assert_eq!(filler.calls(), 0);

    drop(slot);
    pipeline
        .download(&template(), &applicant, true, &school(), issued_on())
        .await
        .expect("download succeeds once the slot is released");
}

#[tokio::test]
async fn other_applicants_are_not_blocked_by_an_outstanding_download() {
    let filler = Arc::new(RecordingFiller::default());
    let renderer = Arc::new(MemoryRenderer::default());
    let pipeline = pipeline(filler, renderer);
    let busy = ready_applicant("busy");
    let other = ready_applicant("other");

    let _slot = pipeline.begin(&busy.id).expect("slot is free");

    pipeline
        .download(&template(), &other, true, &school(), issued_on())
        .await
        .expect("unrelated applicant proceeds");
}
