//! `manualhub-client`: front-end workflows over a `RemoteStore`.
//!
//! Owns draft state (upload wizard, edits, project drafts), the metadata
//! cache, and the coordinators that turn store failures into status messages.

pub mod cache;
pub mod edit;
pub mod error;
pub mod project;
pub mod proxy;
pub mod upload;
pub mod views;

pub use cache::{DEFAULT_FRESHNESS, MetadataCache};
pub use edit::{EditCoordinator, EditOutcome};
pub use error::WorkflowError;
pub use project::{ProjectDraft, ProjectOutcome};
pub use proxy::ProxyRemoteStore;
pub use upload::{
    CleanupReport, CloseRequest, ProgressSender, UploadControl, UploadCoordinator, UploadOutcome,
    UploadSession, UploadStage,
};
pub use views::{
    DEFAULT_PAGE_SIZE, Page, ProjectGroup, group_by_project, known_project_numbers, paginate,
    search_by_document_no,
};
