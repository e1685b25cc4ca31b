//! New-document wizard and the upload protocol behind it.
//!
//! Files are uploaded one at a time, then the catalog row is written. If the
//! row write fails, the files uploaded for it are deleted again (best
//! effort). A failed file upload aborts the batch without any cleanup, and so
//! does a confirmed cancel.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::join_all;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use manualhub_core::{
    CatalogEntry, DocumentMetadata, DomainError, EntryKey, FileMetadata, PendingUpload,
    UploadFile, Visibility, check_blob_name, encode,
};
use manualhub_store::{RemoteStore, StoreError};

use crate::cache::MetadataCache;
use crate::error::WorkflowError;

pub const UPLOAD_SUCCEEDED: &str = "Document uploaded successfully!";
pub const UPLOAD_FAILED: &str = "Upload failed. Please try again.";
pub const UPLOAD_CANCELLED: &str = "Upload cancelled.";

/// Share of the progress bar spent on file transfers.
const FILES_SHARE: usize = 80;
const ROW_WRITE_PROGRESS: u8 = 90;
const COMPLETE: u8 = 100;

/// Progress in percent, 0..=100.
pub type ProgressSender = mpsc::UnboundedSender<u8>;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UploadStage {
    CollectingMetadata,
    SelectingFiles,
    AnnotatingFiles,
    Uploading,
    Done,
    Failed,
}

/// Result of the compensating deletes after a rejected row write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub attempted: usize,
    pub deleted: usize,
    /// The store had nothing under that name.
    pub absent: usize,
    pub failed: usize,
}

impl CleanupReport {
    fn record(&mut self, file: &str, result: Result<bool, StoreError>) {
        match result {
            Ok(true) => self.deleted += 1,
            Ok(false) => {
                self.absent += 1;
                tracing::warn!(file = %file, "uploaded file was not found during cleanup");
            }
            Err(err) => {
                self.failed += 1;
                tracing::warn!(file = %file, "could not remove uploaded file: {err}");
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Succeeded { entry: CatalogEntry },
    /// A file transfer failed; nothing was written and nothing cleaned up.
    FileFailed { file: String, error: StoreError },
    /// Every file landed but the row write failed; uploaded files were
    /// deleted again as far as possible.
    EntryRejected { reason: String, cleanup: CleanupReport },
    Cancelled,
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Succeeded { .. })
    }

    /// Status line shown to the user.
    pub fn message(&self) -> String {
        match self {
            UploadOutcome::Succeeded { .. } => UPLOAD_SUCCEEDED.to_string(),
            UploadOutcome::FileFailed { .. } => UPLOAD_FAILED.to_string(),
            UploadOutcome::EntryRejected { reason, .. } => {
                format!("Failed to complete upload process: {reason}")
            }
            UploadOutcome::Cancelled => UPLOAD_CANCELLED.to_string(),
        }
    }
}

/// `80 * completed / total`, rounded half up.
pub fn transfer_progress(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return FILES_SHARE as u8;
    }
    let completed = completed.min(total);
    ((2 * FILES_SHARE * completed + total) / (2 * total)) as u8
}

fn report(progress: &ProgressSender, percent: u8) {
    // A dropped receiver only means nobody is watching.
    let _ = progress.send(percent);
}

/// Runs the upload protocol against a store.
#[derive(Clone)]
pub struct UploadCoordinator {
    store: Arc<dyn RemoteStore>,
    cache: Arc<MetadataCache>,
}

impl UploadCoordinator {
    pub fn new(store: Arc<dyn RemoteStore>, cache: Arc<MetadataCache>) -> Self {
        Self { store, cache }
    }

    /// Upload `files` in order, then write the catalog row.
    pub async fn execute(
        &self,
        metadata: DocumentMetadata,
        files: Vec<PendingUpload>,
        progress: ProgressSender,
    ) -> UploadOutcome {
        let total = files.len();
        let mut uploaded = Vec::with_capacity(total);

        for (done, pending) in files.into_iter().enumerate() {
            match self
                .store
                .upload_file(&pending.file, pending.visibility())
                .await
            {
                Ok(blob) => uploaded.push((pending, blob.url)),
                Err(error) => {
                    tracing::error!(file = %pending.file.name, "file upload failed: {error}");
                    report(&progress, COMPLETE);
                    return UploadOutcome::FileFailed {
                        file: pending.file.name,
                        error,
                    };
                }
            }
            report(&progress, transfer_progress(done + 1, total));
        }

        // Entry-level market flags come from the first file only.
        let market = uploaded
            .first()
            .and_then(|(p, _)| p.metadata.as_ref())
            .map(|m| m.market)
            .unwrap_or_default();
        let placed: Vec<(String, Visibility)> = uploaded
            .iter()
            .map(|(p, url)| (url.clone(), p.visibility()))
            .collect();
        let variants = uploaded
            .into_iter()
            .map(|(p, url)| p.into_variant(url))
            .collect();

        let key = EntryKey::generate(metadata.product_category.clone());
        let entry = CatalogEntry::assemble(key, &metadata, variants, market);
        report(&progress, ROW_WRITE_PROGRESS);

        let written = match encode(&entry) {
            Ok(stored) => self
                .store
                .create_entry(&stored)
                .await
                .map_err(|e| e.message().to_string()),
            Err(e) => Err(e.to_string()),
        };

        match written {
            Ok(()) => {
                self.cache.invalidate().await;
                tracing::info!(entry = %entry.key(), files = total, "document uploaded");
                report(&progress, COMPLETE);
                UploadOutcome::Succeeded { entry }
            }
            Err(reason) => {
                tracing::error!(entry = %entry.key(), "catalog row write failed: {reason}");
                let cleanup = self.compensate(&placed).await;
                report(&progress, COMPLETE);
                UploadOutcome::EntryRejected { reason, cleanup }
            }
        }
    }

    /// Delete every file of a rejected batch, concurrently. Failures are
    /// logged only.
    async fn compensate(&self, placed: &[(String, Visibility)]) -> CleanupReport {
        let results = join_all(
            placed
                .iter()
                .map(|(url, visibility)| self.store.delete_file(url, *visibility)),
        )
        .await;

        let mut report = CleanupReport {
            attempted: placed.len(),
            ..Default::default()
        };
        for ((url, _), result) in placed.iter().zip(results) {
            report.record(url, result);
        }
        report
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CloseRequest {
    /// Nothing in flight; the wizard may close.
    Close,
    /// An upload is running; ask the user before cancelling it.
    NeedsConfirmation,
}

#[derive(Debug, Default)]
struct ControlState {
    token: CancellationToken,
    uploading: AtomicBool,
    confirming: AtomicBool,
}

/// Close/cancel handle for a running wizard; cheap to clone into UI tasks.
#[derive(Debug, Clone, Default)]
pub struct UploadControl {
    state: Arc<ControlState>,
}

impl UploadControl {
    pub fn request_close(&self) -> CloseRequest {
        if self.state.uploading.load(Ordering::SeqCst) {
            self.state.confirming.store(true, Ordering::SeqCst);
            CloseRequest::NeedsConfirmation
        } else {
            CloseRequest::Close
        }
    }

    /// Cancel the in-flight upload. Files already uploaded stay where they
    /// are. Returns whether anything was cancelled.
    pub fn confirm_cancel(&self) -> bool {
        let confirming = self.state.confirming.swap(false, Ordering::SeqCst);
        if confirming && self.state.uploading.load(Ordering::SeqCst) {
            self.state.token.cancel();
            return true;
        }
        false
    }

    pub fn dismiss_cancel(&self) {
        self.state.confirming.store(false, Ordering::SeqCst);
    }

    pub fn is_awaiting_confirmation(&self) -> bool {
        self.state.confirming.load(Ordering::SeqCst)
    }

    pub fn is_uploading(&self) -> bool {
        self.state.uploading.load(Ordering::SeqCst)
    }

    fn set_uploading(&self, value: bool) {
        self.state.uploading.store(value, Ordering::SeqCst);
        if !value {
            self.state.confirming.store(false, Ordering::SeqCst);
        }
    }
}

/// Draft state of the new-document wizard.
#[derive(Debug)]
pub struct UploadSession {
    stage: UploadStage,
    metadata: DocumentMetadata,
    files: Vec<PendingUpload>,
    control: UploadControl,
    outcome: Option<UploadOutcome>,
}

impl Default for UploadSession {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadSession {
    pub fn new() -> Self {
        Self {
            stage: UploadStage::CollectingMetadata,
            metadata: DocumentMetadata::default(),
            files: Vec::new(),
            control: UploadControl::default(),
            outcome: None,
        }
    }

    pub fn stage(&self) -> UploadStage {
        self.stage
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    pub fn files(&self) -> &[PendingUpload] {
        &self.files
    }

    pub fn outcome(&self) -> Option<&UploadOutcome> {
        self.outcome.as_ref()
    }

    pub fn control(&self) -> UploadControl {
        self.control.clone()
    }

    pub fn request_close(&self) -> CloseRequest {
        self.control.request_close()
    }

    pub fn submit_metadata(&mut self, metadata: DocumentMetadata) -> Result<(), WorkflowError> {
        self.expect_stage(&[UploadStage::CollectingMetadata], "submit metadata")?;
        metadata.validate()?;
        self.metadata = metadata;
        self.stage = UploadStage::SelectingFiles;
        Ok(())
    }

    /// Add a PDF; it starts out public and unannotated.
    pub fn add_file(&mut self, file: UploadFile) -> Result<usize, WorkflowError> {
        self.expect_stage(&[UploadStage::SelectingFiles], "add files")?;
        check_blob_name(&file.name)?;
        if !file.is_pdf() {
            return Err(DomainError::validation(format!(
                "'{}' is not a PDF ({})",
                file.name, file.content_type
            ))
            .into());
        }
        self.files.push(PendingUpload::new(file));
        Ok(self.files.len() - 1)
    }

    pub fn remove_file(&mut self, index: usize) -> Result<PendingUpload, WorkflowError> {
        self.expect_stage(
            &[UploadStage::SelectingFiles, UploadStage::AnnotatingFiles],
            "remove files",
        )?;
        self.pending(index)?;
        Ok(self.files.remove(index))
    }

    pub fn set_public(&mut self, index: usize, public: bool) -> Result<(), WorkflowError> {
        self.expect_stage(
            &[UploadStage::SelectingFiles, UploadStage::AnnotatingFiles],
            "change visibility",
        )?;
        self.pending(index)?.public = public;
        Ok(())
    }

    pub fn continue_to_annotation(&mut self) -> Result<(), WorkflowError> {
        self.expect_stage(&[UploadStage::SelectingFiles], "continue")?;
        if self.files.is_empty() {
            return Err(DomainError::validation("select at least one file").into());
        }
        self.stage = UploadStage::AnnotatingFiles;
        Ok(())
    }

    pub fn annotate(&mut self, index: usize, metadata: FileMetadata) -> Result<(), WorkflowError> {
        self.expect_stage(&[UploadStage::AnnotatingFiles], "annotate files")?;
        metadata.validate()?;
        self.pending(index)?.metadata = Some(metadata);
        Ok(())
    }

    pub fn back(&mut self) -> Result<(), WorkflowError> {
        self.stage = match self.stage {
            UploadStage::AnnotatingFiles => UploadStage::SelectingFiles,
            UploadStage::SelectingFiles => UploadStage::CollectingMetadata,
            other => {
                return Err(WorkflowError::invalid_state(format!(
                    "cannot go back from {other:?}"
                )));
            }
        };
        Ok(())
    }

    /// Metadata submitted and every selected file annotated.
    pub fn is_ready(&self) -> bool {
        self.stage == UploadStage::AnnotatingFiles
            && !self.files.is_empty()
            && self.files.iter().all(PendingUpload::is_annotated)
    }

    /// Run the upload protocol. Validation failures are returned as errors
    /// before anything is sent; everything after that is an `UploadOutcome`.
    pub async fn upload(
        &mut self,
        coordinator: &UploadCoordinator,
        progress: ProgressSender,
    ) -> Result<UploadOutcome, WorkflowError> {
        self.expect_stage(&[UploadStage::AnnotatingFiles], "upload")?;
        self.metadata.validate()?;
        if let Some(idx) = self.files.iter().position(|f| !f.is_annotated()) {
            return Err(DomainError::validation(format!(
                "file '{}' needs a language, manual type and release date",
                self.files[idx].file.name
            ))
            .into());
        }
        if self.files.is_empty() {
            return Err(DomainError::validation("select at least one file").into());
        }

        self.stage = UploadStage::Uploading;
        self.control.set_uploading(true);
        report(&progress, 0);

        let token = self.control.state.token.clone();
        let files = std::mem::take(&mut self.files);
        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::warn!("upload cancelled; files already uploaded in this batch are left in place");
                UploadOutcome::Cancelled
            }
            outcome = coordinator.execute(self.metadata.clone(), files, progress) => outcome,
        };

        self.control.set_uploading(false);
        self.stage = if outcome.is_success() {
            UploadStage::Done
        } else {
            UploadStage::Failed
        };
        self.outcome = Some(outcome.clone());
        Ok(outcome)
    }

    fn pending(&mut self, index: usize) -> Result<&mut PendingUpload, WorkflowError> {
        self.files
            .get_mut(index)
            .ok_or_else(|| DomainError::not_found(format!("selected file {index}")).into())
    }

    fn expect_stage(&self, allowed: &[UploadStage], action: &str) -> Result<(), WorkflowError> {
        if allowed.contains(&self.stage) {
            Ok(())
        } else {
            Err(WorkflowError::invalid_state(format!(
                "cannot {action} while {:?}",
                self.stage
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use manualhub_core::{MarketFlags, MarketRegion, normalize};
    use manualhub_store::{InMemoryRemoteStore, StoreCall, StoreOperation};

    struct Harness {
        store: Arc<InMemoryRemoteStore>,
        cache: Arc<MetadataCache>,
        coordinator: UploadCoordinator,
    }

    fn harness() -> Harness {
        let store = Arc::new(InMemoryRemoteStore::new());
        let cache = Arc::new(MetadataCache::new(store.clone()));
        let coordinator = UploadCoordinator::new(store.clone(), cache.clone());
        Harness {
            store,
            cache,
            coordinator,
        }
    }

    fn annotation(lang: &str, market: MarketFlags) -> FileMetadata {
        FileMetadata {
            lang: lang.to_string(),
            manual_types: vec!["IM".to_string()],
            release_date: Some("2024-06-01".to_string()),
            market,
        }
    }

    fn ready_session(files: &[(&str, bool)]) -> UploadSession {
        let mut session = UploadSession::new();
        session
            .submit_metadata(DocumentMetadata {
                document_no: "DOC-42".to_string(),
                product_category: "arc".to_string(),
                title: "Renegade ES 300i".to_string(),
                ..Default::default()
            })
            .unwrap();
        for (name, public) in files {
            let idx = session.add_file(UploadFile::pdf(*name, vec![7u8; 4])).unwrap();
            session.set_public(idx, *public).unwrap();
        }
        session.continue_to_annotation().unwrap();
        for idx in 0..files.len() {
            let market = if idx == 0 {
                MarketFlags::default().with(MarketRegion::Europe)
            } else {
                MarketFlags::default().with(MarketRegion::Asia)
            };
            session.annotate(idx, annotation("en-GB", market)).unwrap();
        }
        session
    }

    fn drain(mut rx: mpsc::UnboundedReceiver<u8>) -> Vec<u8> {
        let mut seen = Vec::new();
        while let Ok(p) = rx.try_recv() {
            seen.push(p);
        }
        seen
    }

    #[test]
    fn transfer_progress_rounds_like_the_progress_bar() {
        assert_eq!(transfer_progress(1, 3), 27);
        assert_eq!(transfer_progress(2, 3), 53);
        assert_eq!(transfer_progress(3, 3), 80);
        assert_eq!(transfer_progress(1, 6), 13);
        assert_eq!(transfer_progress(0, 0), 80);
    }

    #[test]
    fn wizard_walks_forward_and_back() {
        let mut session = UploadSession::new();
        assert!(session.add_file(UploadFile::pdf("a.pdf", vec![1u8])).is_err());

        let err = session.submit_metadata(DocumentMetadata::default()).unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
        assert_eq!(session.stage(), UploadStage::CollectingMetadata);

        session
            .submit_metadata(DocumentMetadata {
                document_no: "D".to_string(),
                ..Default::default()
            })
            .unwrap();
        assert!(session.continue_to_annotation().is_err());
        session.add_file(UploadFile::pdf("a.pdf", vec![1u8])).unwrap();
        assert!(session.files()[0].public);
        session.continue_to_annotation().unwrap();
        assert!(!session.is_ready());

        session.back().unwrap();
        assert_eq!(session.stage(), UploadStage::SelectingFiles);
        session.back().unwrap();
        assert_eq!(session.stage(), UploadStage::CollectingMetadata);
        assert!(session.back().is_err());
    }

    #[test]
    fn only_pdfs_with_storable_names_can_be_selected() {
        let mut session = UploadSession::new();
        session
            .submit_metadata(DocumentMetadata {
                document_no: "D".to_string(),
                ..Default::default()
            })
            .unwrap();

        let err = session
            .add_file(UploadFile::new("notes.docx", "application/msword", vec![1u8]))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
        let err = session
            .add_file(UploadFile::pdf("Manual #3.pdf", vec![1u8]))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
        assert!(session.files().is_empty());

        session.add_file(UploadFile::pdf("Manual 3.pdf", vec![1u8])).unwrap();
        assert_eq!(session.files().len(), 1);
    }

    #[test]
    fn annotations_with_unknown_codes_are_refused() {
        let mut session = ready_session(&[("a.pdf", true)]);
        let err = session
            .annotate(0, annotation("Klingon", MarketFlags::default()))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
        // The earlier, valid annotation is kept.
        assert_eq!(session.files()[0].metadata.as_ref().unwrap().lang, "en-GB");
    }

    #[test]
    fn cleanup_report_separates_absent_files_from_deleted_ones() {
        let mut report = CleanupReport {
            attempted: 3,
            ..Default::default()
        };
        report.record("memory://a.pdf", Ok(true));
        report.record("memory://b.pdf", Ok(false));
        report.record("memory://c.pdf", Err(StoreError::remote(500, "busy")));
        assert_eq!(
            report,
            CleanupReport {
                attempted: 3,
                deleted: 1,
                absent: 1,
                failed: 1
            }
        );
    }

    #[tokio::test]
    async fn unstorable_name_fails_the_batch_and_leaves_nothing_behind() {
        let h = harness();
        h.store
            .fail_always(StoreOperation::CreateEntry, StoreError::remote(400, "rejected"));
        let mut pending = PendingUpload::new(UploadFile::pdf("Manual #3.pdf", vec![1u8]));
        pending.metadata = Some(annotation("en-GB", MarketFlags::default()));
        let (tx, _rx) = mpsc::unbounded_channel();

        let outcome = h
            .coordinator
            .execute(
                DocumentMetadata {
                    document_no: "DOC-3".to_string(),
                    product_category: "arc".to_string(),
                    ..Default::default()
                },
                vec![pending],
                tx,
            )
            .await;

        assert!(matches!(
            outcome,
            UploadOutcome::FileFailed { error: StoreError::InvalidInput(_), .. }
        ));
        assert_eq!(h.store.blob_count(), 0);
        assert_eq!(h.store.call_count(StoreOperation::CreateEntry), 0);
    }

    #[tokio::test]
    async fn unannotated_files_block_upload_before_any_call() {
        let h = harness();
        let mut session = ready_session(&[("a.pdf", true)]);
        session.add_file_for_test("b.pdf");
        let (tx, _rx) = mpsc::unbounded_channel();

        let err = session.upload(&h.coordinator, tx).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
        assert!(h.store.calls().is_empty());
        assert_eq!(session.files().len(), 2);
    }

    #[tokio::test]
    async fn successful_upload_writes_one_row_and_invalidates_cache() {
        let h = harness();
        h.cache.get().await.unwrap();
        let mut session = ready_session(&[("a.pdf", true), ("b.pdf", false)]);
        let (tx, rx) = mpsc::unbounded_channel();

        let outcome = session.upload(&h.coordinator, tx).await.unwrap();
        assert!(outcome.is_success());
        assert_eq!(outcome.message(), "Document uploaded successfully!");
        assert_eq!(session.stage(), UploadStage::Done);
        assert_eq!(drain(rx), vec![0, 40, 80, 90, 100]);
        assert!(!h.cache.is_fresh().await);

        let rows = h.store.rows();
        assert_eq!(rows.len(), 1);
        let entry = normalize(rows[0].clone()).unwrap();
        assert_eq!(entry.partition_key, "arc");
        assert!(!entry.row_key.is_empty());
        assert_eq!(entry.language_variants.len(), 2);
        assert_eq!(entry.language_variants[1].blob_name(), "b.pdf");
        assert_eq!(entry.market.selected(), vec![MarketRegion::Europe]);
        assert!(h.store.has_blob("b.pdf", Visibility::Restricted));
    }

    #[tokio::test]
    async fn rejected_row_deletes_every_uploaded_file() {
        let h = harness();
        h.store.fail_always(
            StoreOperation::CreateEntry,
            StoreError::remote(400, "Table storage error: 400"),
        );
        let mut session = ready_session(&[("a.pdf", true), ("b.pdf", false)]);
        let (tx, rx) = mpsc::unbounded_channel();

        let outcome = session.upload(&h.coordinator, tx).await.unwrap();
        assert_eq!(
            outcome.message(),
            "Failed to complete upload process: Table storage error: 400"
        );
        let UploadOutcome::EntryRejected { cleanup, .. } = outcome else {
            panic!("expected EntryRejected");
        };
        assert_eq!(
            cleanup,
            CleanupReport {
                attempted: 2,
                deleted: 2,
                absent: 0,
                failed: 0
            }
        );

        let deletes: Vec<_> = h
            .store
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                StoreCall::DeleteFile { name, visibility } => Some((name, visibility)),
                _ => None,
            })
            .collect();
        assert_eq!(deletes.len(), 2);
        assert!(deletes.contains(&("memory://instructionmanuals/a.pdf".to_string(), Visibility::Public)));
        assert!(deletes.contains(&("memory://servicemanuals/b.pdf".to_string(), Visibility::Restricted)));
        assert_eq!(h.store.blob_count(), 0);
        assert_eq!(session.stage(), UploadStage::Failed);
        assert_eq!(drain(rx).last(), Some(&100));
    }

    #[tokio::test]
    async fn failing_cleanup_does_not_change_the_reported_failure() {
        let h = harness();
        h.store
            .fail_always(StoreOperation::CreateEntry, StoreError::remote(409, "conflict"));
        h.store
            .fail_always(StoreOperation::DeleteFile, StoreError::remote(500, "nope"));
        let mut session = ready_session(&[("a.pdf", true), ("b.pdf", true)]);
        let (tx, _rx) = mpsc::unbounded_channel();

        let outcome = session.upload(&h.coordinator, tx).await.unwrap();
        assert_eq!(outcome.message(), "Failed to complete upload process: conflict");
        let UploadOutcome::EntryRejected { cleanup, .. } = outcome else {
            panic!("expected EntryRejected");
        };
        assert_eq!(cleanup.failed, 2);
        assert_eq!(h.store.call_count(StoreOperation::DeleteFile), 2);
    }

    #[tokio::test]
    async fn failed_file_aborts_without_row_or_cleanup() {
        let h = harness();
        h.store
            .fail_on_call(StoreOperation::UploadFile, 2, StoreError::remote(500, "disk full"));
        let mut session = ready_session(&[("a.pdf", true), ("b.pdf", true), ("c.pdf", true)]);
        let (tx, rx) = mpsc::unbounded_channel();

        let outcome = session.upload(&h.coordinator, tx).await.unwrap();
        assert_eq!(outcome.message(), "Upload failed. Please try again.");
        assert!(matches!(outcome, UploadOutcome::FileFailed { ref file, .. } if file == "b.pdf"));
        assert_eq!(h.store.call_count(StoreOperation::UploadFile), 2);
        assert_eq!(h.store.call_count(StoreOperation::CreateEntry), 0);
        assert_eq!(h.store.call_count(StoreOperation::DeleteFile), 0);
        // The first file of the batch is orphaned.
        assert!(h.store.has_blob("a.pdf", Visibility::Public));
        assert!(session.files().is_empty());
        assert_eq!(drain(rx), vec![0, 27, 100]);
    }

    #[tokio::test(start_paused = true)]
    async fn confirmed_cancel_stops_without_cleanup() {
        let h = harness();
        h.store
            .set_latency(StoreOperation::UploadFile, Duration::from_secs(10));
        let mut session = ready_session(&[("a.pdf", true), ("b.pdf", true)]);
        let control = session.control();
        assert_eq!(control.request_close(), CloseRequest::Close);

        let coordinator = h.coordinator.clone();
        let task = tokio::spawn(async move {
            let (tx, _rx) = mpsc::unbounded_channel();
            let outcome = session.upload(&coordinator, tx).await;
            (session, outcome)
        });

        tokio::time::sleep(Duration::from_secs(15)).await;
        assert_eq!(control.request_close(), CloseRequest::NeedsConfirmation);
        assert!(control.is_awaiting_confirmation());
        assert!(control.confirm_cancel());

        let (session, outcome) = task.await.unwrap();
        assert_eq!(outcome.unwrap(), UploadOutcome::Cancelled);
        assert_eq!(session.stage(), UploadStage::Failed);
        assert!(!control.is_uploading());
        assert_eq!(h.store.call_count(StoreOperation::CreateEntry), 0);
        assert_eq!(h.store.call_count(StoreOperation::DeleteFile), 0);
        assert!(h.store.has_blob("a.pdf", Visibility::Public));
    }

    #[tokio::test(start_paused = true)]
    async fn dismissed_cancel_lets_upload_finish() {
        let h = harness();
        h.store
            .set_latency(StoreOperation::UploadFile, Duration::from_secs(10));
        let mut session = ready_session(&[("a.pdf", true)]);
        let control = session.control();

        let coordinator = h.coordinator.clone();
        let task = tokio::spawn(async move {
            let (tx, _rx) = mpsc::unbounded_channel();
            session.upload(&coordinator, tx).await
        });

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(control.request_close(), CloseRequest::NeedsConfirmation);
        control.dismiss_cancel();
        assert!(!control.confirm_cancel());

        assert!(task.await.unwrap().unwrap().is_success());
        assert_eq!(h.store.rows().len(), 1);
    }

    impl UploadSession {
        fn add_file_for_test(&mut self, name: &str) {
            self.files.push(PendingUpload::new(UploadFile::pdf(name, vec![0u8])));
        }
    }
}
