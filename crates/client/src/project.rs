//! Tagging existing entries with a project number.

use std::sync::Arc;

use futures::future::join_all;

use manualhub_core::{CatalogEntry, DomainError, encode};
use manualhub_store::{RemoteStore, StoreError};

use crate::cache::MetadataCache;
use crate::views::search_by_document_no;

pub const PROJECT_CREATED: &str = "Project created successfully!";
pub const PROJECT_FAILED: &str = "Failed to create project. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectOutcome {
    Created { updated: usize },
    Invalid(DomainError),
    /// Some updates failed. The ones that succeeded are not rolled back.
    Failed {
        updated: usize,
        failures: Vec<(String, StoreError)>,
    },
}

impl ProjectOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ProjectOutcome::Created { .. })
    }

    pub fn message(&self) -> String {
        match self {
            ProjectOutcome::Created { .. } => PROJECT_CREATED.to_string(),
            ProjectOutcome::Invalid(err) => err.message().to_string(),
            ProjectOutcome::Failed { .. } => PROJECT_FAILED.to_string(),
        }
    }
}

/// Draft of a project: its number plus the documents to tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectDraft {
    project_no: String,
    documents: Vec<CatalogEntry>,
}

impl ProjectDraft {
    pub fn new(project_no: impl Into<String>) -> Self {
        Self {
            project_no: project_no.into(),
            documents: Vec::new(),
        }
    }

    pub fn project_no(&self) -> &str {
        &self.project_no
    }

    pub fn set_project_no(&mut self, project_no: impl Into<String>) {
        self.project_no = project_no.into();
    }

    pub fn documents(&self) -> &[CatalogEntry] {
        &self.documents
    }

    /// Add `entry` unless a document with the same number is already in.
    pub fn add_document(&mut self, entry: CatalogEntry) -> bool {
        if self.contains(&entry.document_no) {
            return false;
        }
        self.documents.push(entry);
        true
    }

    pub fn remove_document(&mut self, document_no: &str) {
        self.documents.retain(|d| d.document_no != document_no);
    }

    pub fn contains(&self, document_no: &str) -> bool {
        self.documents.iter().any(|d| d.document_no == document_no)
    }

    /// Candidate documents for the draft. A blank query finds nothing.
    pub async fn search(
        &self,
        cache: &MetadataCache,
        query: &str,
    ) -> Result<Vec<CatalogEntry>, StoreError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let entries = cache.get_entries().await?;
        Ok(search_by_document_no(&entries, query)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.project_no.trim().is_empty() {
            return Err(DomainError::validation("project number is required"));
        }
        if self.documents.is_empty() {
            return Err(DomainError::validation("add at least one document"));
        }
        Ok(())
    }

    /// Write the project number onto every document, concurrently.
    pub async fn apply(&self, store: &Arc<dyn RemoteStore>, cache: &MetadataCache) -> ProjectOutcome {
        if let Err(err) = self.validate() {
            return ProjectOutcome::Invalid(err);
        }
        let project_no = self.project_no.trim().to_string();

        let updates = self.documents.iter().map(|doc| {
            let mut tagged = doc.clone();
            tagged.project_no = project_no.clone();
            async move {
                let stored = encode(&tagged).map_err(|e| StoreError::invalid_input(e.to_string()))?;
                store.update_entry(&stored).await
            }
        });
        let results = join_all(updates).await;

        let mut updated = 0;
        let mut failures = Vec::new();
        for (doc, result) in self.documents.iter().zip(results) {
            match result {
                Ok(()) => updated += 1,
                Err(err) => {
                    tracing::error!(document = %doc.document_no, "project tagging failed: {err}");
                    failures.push((doc.document_no.clone(), err));
                }
            }
        }

        if updated > 0 {
            cache.invalidate().await;
        }
        if failures.is_empty() {
            tracing::info!(project = %project_no, documents = updated, "project created");
            ProjectOutcome::Created { updated }
        } else {
            ProjectOutcome::Failed { updated, failures }
        }
    }
}
