use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use school_enrollment::config::ContractConfig;
use school_enrollment::error::AppError;
use school_enrollment::workflows::enrollment::{
    Applicant, ApplicantId, ApplicantRepository, ContractRenderer, ContractTemplate,
    ContractTextFiller, EnrolledStudentProjection, EnrolledStudentRecord, EnrolledStudentSink,
    EnrollmentStatus, FillError, RenderError, RenderedArtifact, RepositoryError, SchoolInfo,
    SinkError,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicantRepository {
    records: Arc<Mutex<HashMap<ApplicantId, Applicant>>>,
}

impl ApplicantRepository for InMemoryApplicantRepository {
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
        if guard.contains_key(&applicant.id) {
            guard.insert(applicant.id.clone(), applicant);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &ApplicantId) -> Result<Option<Applicant>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn remove(&self, id: &ApplicantId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
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

#[derive(Default, Clone)]
pub(crate) struct InMemoryStudentRegistry {
    students: Arc<Mutex<Vec<EnrolledStudentRecord>>>,
}

impl EnrolledStudentSink for InMemoryStudentRegistry {
    fn enroll(&self, applicant: Applicant) -> Result<EnrolledStudentRecord, SinkError> {
        let mut guard = self.students.lock().expect("registry mutex poisoned");
        let record = EnrolledStudentRecord {
            student_id: format!("stu-{:06}", guard.len() + 1),
            applicant_id: applicant.id,
            student_name: applicant.student.full_name,
            enrolled_at: Utc::now(),
        };
        guard.push(record.clone());
        Ok(record)
    }
}

impl InMemoryStudentRegistry {
    pub(crate) fn students(&self) -> Vec<EnrolledStudentRecord> {
        self.students.lock().expect("registry mutex poisoned").clone()
    }
}

/// Local stand-in for the prose service: substitutes `{{field}}` placeholders from the
/// projection and the `school_*` fields, failing on anything left unresolved.
#[derive(Debug, Default, Clone)]
pub(crate) struct PlaceholderFiller;

#[async_trait]
impl ContractTextFiller for PlaceholderFiller {
    async fn fill(
        &self,
        template: &ContractTemplate,
        snapshot: &EnrolledStudentProjection,
        school: &SchoolInfo,
    ) -> Result<String, FillError> {
        let mut values: HashMap<&str, &str> = snapshot.fields().into_iter().collect();
        values.insert("school_name", &school.name);
        values.insert("school_tax_id", &school.tax_id);
        values.insert("school_address", &school.address);
        values.insert("school_phone", &school.phone);

        let mut filled = String::with_capacity(template.body.len());
        let mut rest = template.body.as_str();
        while let Some(start) = rest.find("{{") {
            filled.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after
                .find("}}")
                .ok_or_else(|| FillError("unterminated placeholder in template".to_string()))?;
            let key = after[..end].trim();
            let value = values
                .get(key)
                .ok_or_else(|| FillError(format!("unresolved placeholder `{key}`")))?;
            filled.push_str(value);
            rest = &after[end + 2..];
        }
        filled.push_str(rest);

        Ok(filled)
    }
}

/// Writes rendered contracts as HTML files under the configured directory.
#[derive(Debug, Clone)]
pub(crate) struct HtmlFileRenderer {
    output_dir: PathBuf,
}

impl HtmlFileRenderer {
    pub(crate) fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }
}

#[async_trait]
impl ContractRenderer for HtmlFileRenderer {
    async fn render(&self, file_stem: &str, markup: &str) -> Result<RenderedArtifact, RenderError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|err| RenderError(format!("cannot create output directory: {err}")))?;

        let path = self.output_dir.join(format!("{file_stem}.html"));
        tokio::fs::write(&path, markup.as_bytes())
            .await
            .map_err(|err| RenderError(format!("cannot write {}: {err}", path.display())))?;

        let content_type = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .to_string();

        Ok(RenderedArtifact {
            location: path.display().to_string(),
            content_type,
            bytes: markup.len(),
        })
    }
}

pub(crate) const DEFAULT_CONTRACT_TEMPLATE: &str = "\
ENROLLMENT SERVICES AGREEMENT

{{school_name}}, tax id {{school_tax_id}}, located at {{school_address}}, and the guardian \
{{guardian_name}}, tax id {{guardian_tax_id}}, e-mail {{guardian_email}}, phone {{guardian_phone}}, \
resident at {{address}}, agree to the enrollment of the student {{student_name}}, born on \
{{student_birth_date}}, tax id {{student_tax_id}}.

Placement: {{grade}}, class {{class_name}}, {{shift}} shift.

Fees: enrollment fee of {{fee_one}} and monthly installments of {{fee_recurring}}, discount \
program {{discount_program}}, payable by {{payment_method}}.

Issued on {{issued_on}}. Contact the school office at {{school_phone}}.";

/// Template from `CONTRACT_TEMPLATE_PATH` when configured, the built-in agreement otherwise.
pub(crate) fn load_contract_template(config: &ContractConfig) -> Result<ContractTemplate, AppError> {
    match &config.template_path {
        Some(path) => {
            let body = std::fs::read_to_string(path)?;
            let name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "Enrollment Contract".to_string());
            Ok(ContractTemplate { name, body })
        }
        None => Ok(ContractTemplate {
            name: "Enrollment Contract".to_string(),
            body: DEFAULT_CONTRACT_TEMPLATE.to_string(),
        }),
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
