use async_trait::async_trait;
use serde::Serialize;

use super::projection::{ContractTemplate, EnrolledStudentProjection, SchoolInfo};

/// Failure reported by the text-filling service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct FillError(pub String);

/// Failure reported by the document renderer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct RenderError(pub String);

/// External service producing contract prose from a template and a projection.
#[async_trait]
pub trait ContractTextFiller: Send + Sync {
    async fn fill(
        &self,
        template: &ContractTemplate,
        snapshot: &EnrolledStudentProjection,
        school: &SchoolInfo,
    ) -> Result<String, FillError>;
}

/// Downloadable file materialized by a [`ContractRenderer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedArtifact {
    pub location: String,
    pub content_type: String,
    pub bytes: usize,
}

/// External step turning rendered markup into a downloadable file.
#[async_trait]
pub trait ContractRenderer: Send + Sync {
    async fn render(&self, file_stem: &str, markup: &str) -> Result<RenderedArtifact, RenderError>;
}
