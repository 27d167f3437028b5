use std::collections::BTreeSet;

use super::domain::{Document, DocumentDecision, DocumentStatus};

/// Bad local input raised by document review; nothing is mutated when it is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("rejection reason must not be empty")]
    EmptyRejectionReason,
    #[error("document `{0}` is not on the checklist")]
    UnknownDocument(String),
    #[error("document `{0}` appears more than once on the checklist")]
    DuplicateDocument(String),
    #[error("document index {index} is out of range (checklist has {len} documents)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("applicant must list at least one guardian")]
    MissingGuardian,
}

/// Ordered document list for one applicant, addressed by document name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentChecklist {
    documents: Vec<Document>,
}

impl DocumentChecklist {
    pub fn new(documents: Vec<Document>) -> Result<Self, ValidationError> {
        let mut seen = BTreeSet::new();
        for document in &documents {
            if !seen.insert(document.name.as_str()) {
                return Err(ValidationError::DuplicateDocument(document.name.clone()));
            }
        }

        Ok(Self { documents })
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn into_documents(self) -> Vec<Document> {
        self.documents
    }

    /// Resolve a positional index to the stable document key.
    pub fn name_at(&self, index: usize) -> Result<&str, ValidationError> {
        self.documents
            .get(index)
            .map(|document| document.name.as_str())
            .ok_or(ValidationError::IndexOutOfRange {
                index,
                len: self.documents.len(),
            })
    }

    pub fn approve(&mut self, name: &str) -> Result<&[Document], ValidationError> {
        let document = self.find_mut(name)?;
        document.status = DocumentStatus::Approved;
        document.rejection_reason = None;
        Ok(&self.documents)
    }

    pub fn reject(&mut self, name: &str, reason: &str) -> Result<&[Document], ValidationError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ValidationError::EmptyRejectionReason);
        }

        let document = self.find_mut(name)?;
        document.status = DocumentStatus::Rejected;
        document.rejection_reason = Some(reason.to_string());
        Ok(&self.documents)
    }

    pub fn apply(
        &mut self,
        name: &str,
        decision: &DocumentDecision,
    ) -> Result<&[Document], ValidationError> {
        match decision {
            DocumentDecision::Approve => self.approve(name),
            DocumentDecision::Reject { reason } => self.reject(name, reason),
        }
    }

    /// Reason shown when a reviewer reopens the rejection dialog; a re-rejection keeps the
    /// document in `Rejected` rather than sending it back to analysis.
    pub fn rejection_draft(&self, name: &str) -> Result<String, ValidationError> {
        let document = self.find(name)?;
        Ok(document.rejection_reason.clone().unwrap_or_default())
    }

    /// Drop reasons carried by documents that are not `Rejected`. Returns how many were cleared.
    pub fn discard_stale_reasons(&mut self) -> usize {
        let mut cleared = 0;
        for document in &mut self.documents {
            if document.status != DocumentStatus::Rejected && document.rejection_reason.is_some() {
                document.rejection_reason = None;
                cleared += 1;
            }
        }
        cleared
    }

    pub fn all_approved(&self) -> bool {
        self.documents.iter().all(Document::is_approved)
    }

    fn find(&self, name: &str) -> Result<&Document, ValidationError> {
        self.documents
            .iter()
            .find(|document| document.name == name)
            .ok_or_else(|| ValidationError::UnknownDocument(name.to_string()))
    }

    fn find_mut(&mut self, name: &str) -> Result<&mut Document, ValidationError> {
        self.documents
            .iter_mut()
            .find(|document| document.name == name)
            .ok_or_else(|| ValidationError::UnknownDocument(name.to_string()))
    }
}
