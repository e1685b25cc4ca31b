//! `manualhub-core`: catalog model and formatting rules.
//!
//! This crate contains **pure domain** types (no I/O, no async).

pub mod catalog;
pub mod error;
pub mod format;
pub mod id;
pub mod reference;

pub use catalog::{
    CatalogEntry, DocumentMetadata, FileMetadata, LanguageVariant, MarketFlags, MarketRegion,
    PDF_CONTENT_TYPE, PendingUpload, UploadFile, Visibility, blob_name_from, check_blob_name,
};
pub use error::{DomainError, DomainResult};
pub use format::{
    FormatError, StoredField, TableEntity, decode_rows, encode, normalize, normalize_all,
};
pub use id::EntryKey;
