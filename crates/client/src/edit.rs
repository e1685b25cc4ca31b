//! Saving edited entries and removing language variants.

use std::sync::Arc;

use manualhub_core::{CatalogEntry, DomainError, LanguageVariant, encode};
use manualhub_store::{RemoteStore, StoreError};

use crate::cache::MetadataCache;

pub const SAVE_SUCCEEDED: &str = "Document updated successfully!";
pub const VARIANT_DELETED: &str = "Language variant deleted successfully";
pub const VARIANT_DELETE_FAILED: &str = "Failed to delete language variant. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Saved,
    VariantDeleted { variant: LanguageVariant },
    /// Rejected before any remote call.
    Invalid(DomainError),
    SaveFailed(StoreError),
    /// The file could not be deleted; the entry is unchanged.
    VariantDeleteFailed(StoreError),
    /// The file is gone but the row still lists the variant.
    VariantRowStale {
        variant: LanguageVariant,
        error: StoreError,
    },
}

impl EditOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, EditOutcome::Saved | EditOutcome::VariantDeleted { .. })
    }

    pub fn message(&self) -> String {
        match self {
            EditOutcome::Saved => SAVE_SUCCEEDED.to_string(),
            EditOutcome::VariantDeleted { .. } => VARIANT_DELETED.to_string(),
            EditOutcome::Invalid(err) => err.message().to_string(),
            EditOutcome::SaveFailed(err) => err.message().to_string(),
            EditOutcome::VariantDeleteFailed(_) | EditOutcome::VariantRowStale { .. } => {
                VARIANT_DELETE_FAILED.to_string()
            }
        }
    }
}

#[derive(Clone)]
pub struct EditCoordinator {
    store: Arc<dyn RemoteStore>,
    cache: Arc<MetadataCache>,
}

impl EditCoordinator {
    pub fn new(store: Arc<dyn RemoteStore>, cache: Arc<MetadataCache>) -> Self {
        Self { store, cache }
    }

    /// Validate, then replace the stored row with `entry`.
    pub async fn save_edits(&self, entry: &CatalogEntry) -> EditOutcome {
        if let Err(err) = entry.validate() {
            return EditOutcome::Invalid(err);
        }
        match self.write(entry).await {
            Ok(()) => {
                tracing::info!(entry = %entry.key(), "entry updated");
                EditOutcome::Saved
            }
            Err(err) => {
                tracing::error!(entry = %entry.key(), "entry update failed: {err}");
                EditOutcome::SaveFailed(err)
            }
        }
    }

    /// Delete the variant's file, then drop it from `entry` and persist.
    ///
    /// `entry` is only modified once the file is gone. If the row write that
    /// follows fails, the stored row keeps listing a variant whose file no
    /// longer exists.
    pub async fn delete_variant(&self, entry: &mut CatalogEntry, index: usize) -> EditOutcome {
        let url = match entry.variant(index) {
            Ok(variant) => variant.url.clone(),
            Err(err) => return EditOutcome::Invalid(err),
        };

        match self.store.delete_file(&url, entry.visibility()).await {
            Ok(true) => {}
            Ok(false) => tracing::info!(file = %url, "variant file was already gone"),
            Err(err) => {
                tracing::error!(file = %url, "variant file delete failed: {err}");
                return EditOutcome::VariantDeleteFailed(err);
            }
        }

        let variant = match entry.remove_variant(index) {
            Ok(variant) => variant,
            Err(err) => return EditOutcome::Invalid(err),
        };

        match self.write(entry).await {
            Ok(()) => {
                tracing::info!(
                    entry = %entry.key(),
                    language = variant.language_label(),
                    "language variant removed"
                );
                EditOutcome::VariantDeleted { variant }
            }
            Err(error) => {
                tracing::error!(
                    entry = %entry.key(),
                    "variant file deleted but row update failed: {error}"
                );
                EditOutcome::VariantRowStale { variant, error }
            }
        }
    }

    async fn write(&self, entry: &CatalogEntry) -> Result<(), StoreError> {
        let stored = encode(entry).map_err(|e| StoreError::invalid_input(e.to_string()))?;
        self.store.update_entry(&stored).await?;
        self.cache.invalidate().await;
        Ok(())
    }
}
