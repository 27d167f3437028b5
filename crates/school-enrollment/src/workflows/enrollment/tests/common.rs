use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::enrollment::contract::{
    ContractPipeline, ContractRenderer, ContractTemplate, ContractTextFiller,
    EnrolledStudentProjection, FillError, RenderError, RenderedArtifact, SchoolInfo,
};
use crate::workflows::enrollment::domain::{
    Address, Applicant, ApplicantId, DeliveryMethod, DiscountProgram, Document, DocumentStatus,
    EnrollmentStatus, FinancialTerms, Guardian, PaymentMethod, StudentIdentity,
};
use crate::workflows::enrollment::repository::{
    ApplicantRepository, EnrolledStudentRecord, EnrolledStudentSink, RepositoryError, SinkError,
};
use crate::workflows::enrollment::service::EnrollmentService;

pub(super) fn issued_on() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 15).expect("valid date")
}

pub(super) fn school() -> SchoolInfo {
    SchoolInfo {
        name: "Colegio Horizonte".to_string(),
        tax_id: "12.345.678/0001-90".to_string(),
        address: "Av. Paulista, 1000 - Sao Paulo/SP".to_string(),
        phone: "+55 11 3000-0000".to_string(),
    }
}

pub(super) fn template() -> ContractTemplate {
    ContractTemplate {
        name: "Enrollment Contract".to_string(),
        body: "Student: {{student_name}}\nGrade: {{grade}}\n\nGuardian: {{guardian_name}}\nMonthly fee: {{fee_recurring}}".to_string(),
    }
}

pub(super) fn document(name: &str, status: DocumentStatus) -> Document {
    Document {
        name: name.to_string(),
        delivery_method: DeliveryMethod::Digital,
        status,
        rejection_reason: None,
        file_reference: Some(format!("uploads/{name}.pdf")),
    }
}

/// Applicant fresh from intake: nothing validated, two pending documents.
pub(super) fn applicant(suffix: &str) -> Applicant {
    Applicant {
        id: ApplicantId(format!("app-{suffix}")),
        student: StudentIdentity {
            full_name: "João Ação".to_string(),
            birth_date: NaiveDate::from_ymd_opt(2015, 3, 9),
            tax_id: None,
            grade: Some("5th grade".to_string()),
            class_name: None,
            shift: Some("morning".to_string()),
        },
        guardians: vec![Guardian {
            name: "Maria Ação".to_string(),
            tax_id: "123.456.789-00".to_string(),
            email: "maria@example.com".to_string(),
            phone: "+55 11 98888-7777".to_string(),
        }],
        address: Address {
            street: "Rua das Palmeiras".to_string(),
            number: "42".to_string(),
            complement: Some("apto 12".to_string()),
            neighborhood: "Jardim".to_string(),
            city: "Sao Paulo".to_string(),
            state: "SP".to_string(),
            postal_code: "01234-000".to_string(),
        },
        financials: FinancialTerms {
            fee_one: 50_000,
            fee_recurring: 125_050,
            discount_program: Some(DiscountProgram {
                name: "Sibling".to_string(),
                percent: 10,
            }),
        },
        documents: vec![
            document("Birth certificate", DocumentStatus::Pending),
            document("Proof of address", DocumentStatus::UnderAnalysis),
        ],
        data_validated: false,
        guardian_data_validated: false,
        payment_confirmed: false,
        payment_method: Some(PaymentMethod::Pix),
        status: EnrollmentStatus::PendingAnalysis,
    }
}

/// Applicant passing every persisted check; gating depends only on the session flag.
pub(super) fn ready_applicant(suffix: &str) -> Applicant {
    let mut applicant = applicant(suffix);
    for document in &mut applicant.documents {
        document.status = DocumentStatus::Approved;
    }
    applicant.data_validated = true;
    applicant.guardian_data_validated = true;
    applicant.payment_confirmed = true;
    applicant
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<ApplicantId, Applicant>>>,
}

impl MemoryRepository {
    pub(super) fn stored(&self, id: &ApplicantId) -> Option<Applicant> {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .get(id)
            .cloned()
    }
}

impl ApplicantRepository for MemoryRepository {
    fn insert(&self, applicant: Applicant) -> Result<Applicant, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&applicant.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(applicant.id.clone(), applicant.clone());
        Ok(applicant)
    }

    fn update(&self, applicant: Applicant) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.insert(applicant.id.clone(), applicant);
        Ok(())
    }

    fn fetch(&self, id: &ApplicantId) -> Result<Option<Applicant>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn remove(&self, id: &ApplicantId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    fn pending(&self, limit: usize) -> Result<Vec<Applicant>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut pending: Vec<Applicant> = guard
            .values()
            .filter(|applicant| applicant.status == EnrollmentStatus::PendingAnalysis)
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.id.cmp(&b.id));
        pending.truncate(limit);
        Ok(pending)
    }
}

/// Memory repository whose `remove` always reports an outage.
#[derive(Default, Clone)]
pub(super) struct StuckRepository {
    pub(super) inner: MemoryRepository,
}

impl ApplicantRepository for StuckRepository {
    fn insert(&self, applicant: Applicant) -> Result<Applicant, RepositoryError> {
        self.inner.insert(applicant)
    }

    fn update(&self, applicant: Applicant) -> Result<(), RepositoryError> {
        self.inner.update(applicant)
    }

    fn fetch(&self, id: &ApplicantId) -> Result<Option<Applicant>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn remove(&self, _id: &ApplicantId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("delete timed out".to_string()))
    }

    fn pending(&self, limit: usize) -> Result<Vec<Applicant>, RepositoryError> {
        self.inner.pending(limit)
    }
}

pub(super) struct UnavailableRepository;

impl ApplicantRepository for UnavailableRepository {
    fn insert(&self, _applicant: Applicant) -> Result<Applicant, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _applicant: Applicant) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicantId) -> Result<Option<Applicant>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn remove(&self, _id: &ApplicantId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn pending(&self, _limit: usize) -> Result<Vec<Applicant>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemorySink {
    enrolled: Arc<Mutex<Vec<Applicant>>>,
}

impl MemorySink {
    pub(super) fn enrolled(&self) -> Vec<Applicant> {
        self.enrolled.lock().expect("sink mutex poisoned").clone()
    }
}

impl EnrolledStudentSink for MemorySink {
    fn enroll(&self, applicant: Applicant) -> Result<EnrolledStudentRecord, SinkError> {
        let mut guard = self.enrolled.lock().expect("sink mutex poisoned");
        let record = EnrolledStudentRecord {
            student_id: format!("stu-{:04}", guard.len() + 1),
            applicant_id: applicant.id.clone(),
            student_name: applicant.student.full_name.clone(),
            enrolled_at: Utc
                .with_ymd_and_hms(2025, 1, 15, 9, 0, 0)
                .single()
                .expect("valid timestamp"),
        };
        guard.push(applicant);
        Ok(record)
    }
}

pub(super) struct RefusingSink;

impl EnrolledStudentSink for RefusingSink {
    fn enroll(&self, _applicant: Applicant) -> Result<EnrolledStudentRecord, SinkError> {
        Err(SinkError::Refused("registry closed for the term".to_string()))
    }
}

/// Substitutes `{{field}}` placeholders and counts invocations.
#[derive(Default)]
pub(super) struct RecordingFiller {
    calls: AtomicUsize,
    snapshots: Mutex<Vec<EnrolledStudentProjection>>,
    failure: Option<String>,
}

impl RecordingFiller {
    pub(super) fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(super) fn last_snapshot(&self) -> Option<EnrolledStudentProjection> {
        self.snapshots
            .lock()
            .expect("filler mutex poisoned")
            .last()
            .cloned()
    }
}

#[async_trait]
impl ContractTextFiller for RecordingFiller {
    async fn fill(
        &self,
        template: &ContractTemplate,
        snapshot: &EnrolledStudentProjection,
        school: &SchoolInfo,
    ) -> Result<String, FillError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.snapshots
            .lock()
            .expect("filler mutex poisoned")
            .push(snapshot.clone());

        if let Some(message) = &self.failure {
            return Err(FillError(message.clone()));
        }

        let mut text = format!("{}\n\n{}", school.name, template.body);
        for (key, value) in snapshot.fields() {
            text = text.replace(&format!("{{{{{key}}}}}"), value);
        }
        Ok(text)
    }
}

#[derive(Default)]
pub(super) struct MemoryRenderer {
    rendered: Mutex<Vec<(String, String)>>,
    failure: Option<String>,
}

impl MemoryRenderer {
    pub(super) fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub(super) fn rendered(&self) -> Vec<(String, String)> {
        self.rendered.lock().expect("renderer mutex poisoned").clone()
    }
}

#[async_trait]
impl ContractRenderer for MemoryRenderer {
    async fn render(&self, file_stem: &str, markup: &str) -> Result<RenderedArtifact, RenderError> {
        if let Some(message) = &self.failure {
            return Err(RenderError(message.clone()));
        }

        self.rendered
            .lock()
            .expect("renderer mutex poisoned")
            .push((file_stem.to_string(), markup.to_string()));
        Ok(RenderedArtifact {
            location: format!("memory://{file_stem}.html"),
            content_type: "text/html".to_string(),
            bytes: markup.len(),
        })
    }
}

pub(super) fn pipeline(
    filler: Arc<RecordingFiller>,
    renderer: Arc<MemoryRenderer>,
) -> Arc<ContractPipeline> {
    Arc::new(ContractPipeline::new(filler, renderer))
}

pub(super) struct Harness {
    pub(super) service: EnrollmentService<MemoryRepository, MemorySink>,
    pub(super) repository: Arc<MemoryRepository>,
    pub(super) sink: Arc<MemorySink>,
    pub(super) filler: Arc<RecordingFiller>,
    pub(super) renderer: Arc<MemoryRenderer>,
}

pub(super) fn harness_with(filler: RecordingFiller, renderer: MemoryRenderer) -> Harness {
    let repository = Arc::new(MemoryRepository::default());
    let sink = Arc::new(MemorySink::default());
    let filler = Arc::new(filler);
    let renderer = Arc::new(renderer);
    let service = EnrollmentService::new(
        repository.clone(),
        sink.clone(),
        pipeline(filler.clone(), renderer.clone()),
        school(),
        template(),
    );

    Harness {
        service,
        repository,
        sink,
        filler,
        renderer,
    }
}

pub(super) fn harness() -> Harness {
    harness_with(RecordingFiller::default(), MemoryRenderer::default())
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
