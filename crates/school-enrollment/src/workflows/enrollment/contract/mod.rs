//! Contract generation once an applicant clears gating.
//!
//! Filling is delegated to a [`ContractTextFiller`] and file emission to a
//! [`ContractRenderer`]. The pipeline owns the gating precondition, the projection handed to the
//! filler, error wrapping, and a per-applicant single-flight guard around the fill/render pair.

mod collaborators;
pub mod filename;
mod markup;
mod projection;

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{Applicant, ApplicantId};
use super::lifecycle::{EnrollmentLifecycle, PreconditionError};

pub use collaborators::{
    ContractRenderer, ContractTextFiller, FillError, RenderError, RenderedArtifact,
};
pub use markup::render_contract_markup;
pub use projection::{ContractTemplate, EnrolledStudentProjection, SchoolInfo, NOT_INFORMED};

/// Collaborator failure during contract fill or rendering, with the underlying message kept.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("contract text generation failed: {0}")]
    Fill(String),
    #[error("contract rendering failed: {0}")]
    Render(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractError {
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Filled contract text waiting to be rendered. Rendering consumes it.
#[derive(Debug)]
pub struct FilledContract {
    pub applicant_id: ApplicantId,
    pub file_stem: String,
    pub title: String,
    text: String,
}

impl FilledContract {
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Terminal result of a successful download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedContract {
    pub applicant_id: ApplicantId,
    pub file_stem: String,
    pub artifact: RenderedArtifact,
}

pub struct ContractPipeline {
    filler: Arc<dyn ContractTextFiller>,
    renderer: Arc<dyn ContractRenderer>,
    in_flight: Mutex<HashSet<ApplicantId>>,
}

impl ContractPipeline {
    pub fn new(filler: Arc<dyn ContractTextFiller>, renderer: Arc<dyn ContractRenderer>) -> Self {
        Self {
            filler,
            renderer,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn is_in_flight(&self, applicant_id: &ApplicantId) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(applicant_id)
    }

    /// Claim the single-flight slot for an applicant until the returned guard drops.
    pub fn begin(&self, applicant_id: &ApplicantId) -> Result<InFlightGuard<'_>, PreconditionError> {
        let mut slots = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !slots.insert(applicant_id.clone()) {
            return Err(PreconditionError::ContractInFlight(applicant_id.clone()));
        }

        Ok(InFlightGuard {
            slots: &self.in_flight,
            applicant_id: applicant_id.clone(),
        })
    }

    /// Fill the template for an applicant that currently passes gating.
    ///
    /// The filler is never called when gating fails.
    pub async fn generate(
        &self,
        template: &ContractTemplate,
        applicant: &Applicant,
        financials_validated: bool,
        school: &SchoolInfo,
        issued_on: NaiveDate,
    ) -> Result<FilledContract, ContractError> {
        EnrollmentLifecycle::ensure_finalizable(applicant, financials_validated)?;

        let snapshot = EnrolledStudentProjection::from_applicant(applicant, issued_on);
        info!(applicant_id = %applicant.id, template = %template.name, "filling enrollment contract");

        let text = self
            .filler
            .fill(template, &snapshot, school)
            .await
            .map_err(|err| {
                warn!(applicant_id = %applicant.id, error = %err, "contract fill failed");
                GenerationError::Fill(err.0)
            })?;

        Ok(FilledContract {
            applicant_id: applicant.id.clone(),
            file_stem: filename::contract_file_stem(&applicant.student.full_name),
            title: format!("{} - {}", template.name, snapshot.student_name),
            text,
        })
    }

    /// Materialize a filled contract. The filled text is dropped whether or not rendering
    /// succeeds.
    pub async fn render(&self, filled: FilledContract) -> Result<RenderedContract, ContractError> {
        let FilledContract {
            applicant_id,
            file_stem,
            title,
            text,
        } = filled;

        let markup = render_contract_markup(&title, &text);
        drop(text);

        let artifact = self
            .renderer
            .render(&file_stem, &markup)
            .await
            .map_err(|err| {
                warn!(%applicant_id, error = %err, "contract render failed");
                GenerationError::Render(err.0)
            })?;

        info!(%applicant_id, location = %artifact.location, "enrollment contract rendered");
        Ok(RenderedContract {
            applicant_id,
            file_stem,
            artifact,
        })
    }

    /// Guarded generate + render pair. A second call for the same applicant while one is
    /// outstanding is refused; the slot is released on every exit path.
    pub async fn download(
        &self,
        template: &ContractTemplate,
        applicant: &Applicant,
        financials_validated: bool,
        school: &SchoolInfo,
        issued_on: NaiveDate,
    ) -> Result<RenderedContract, ContractError> {
        let _slot = self.begin(&applicant.id)?;
        let filled = self
            .generate(template, applicant, financials_validated, school, issued_on)
            .await?;
        self.render(filled).await
    }
}

/// Held while a contract is being produced for one applicant.
pub struct InFlightGuard<'a> {
    slots: &'a Mutex<HashSet<ApplicantId>>,
    applicant_id: ApplicantId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.applicant_id);
    }
}
