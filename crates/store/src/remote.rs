use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use manualhub_core::{TableEntity, UploadFile, Visibility};

use crate::error::StoreError;

/// Where an uploaded file ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedBlob {
    pub url: String,
    #[serde(rename = "blobName")]
    pub blob_name: String,
    pub container: String,
}

/// Remote blob + table store boundary.
///
/// Every operation fails with `StoreError::Remote` when the upstream answers
/// with a non-success status, and with `StoreError::Configuration` (before
/// any I/O) when the endpoint it needs is not configured.
///
/// A single call never mixes the public and restricted blob locations.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Every row of the metadata table, in the order the upstream lists them.
    async fn list_entries(&self) -> Result<Vec<TableEntity>, StoreError>;

    /// Insert a new row.
    async fn create_entry(&self, entity: &TableEntity) -> Result<(), StoreError>;

    /// Replace the row addressed by the entity's partition and row key.
    async fn update_entry(&self, entity: &TableEntity) -> Result<(), StoreError>;

    async fn upload_file(
        &self,
        file: &UploadFile,
        visibility: Visibility,
    ) -> Result<UploadedBlob, StoreError>;

    /// Delete a file by full URL or bare name; only the final path segment is
    /// used. `Ok(false)` when there was nothing to delete.
    async fn delete_file(&self, name: &str, visibility: Visibility) -> Result<bool, StoreError>;
}

#[async_trait]
impl<S> RemoteStore for Arc<S>
where
    S: RemoteStore + ?Sized,
{
    async fn list_entries(&self) -> Result<Vec<TableEntity>, StoreError> {
        (**self).list_entries().await
    }

    async fn create_entry(&self, entity: &TableEntity) -> Result<(), StoreError> {
        (**self).create_entry(entity).await
    }

    async fn update_entry(&self, entity: &TableEntity) -> Result<(), StoreError> {
        (**self).update_entry(entity).await
    }

    async fn upload_file(
        &self,
        file: &UploadFile,
        visibility: Visibility,
    ) -> Result<UploadedBlob, StoreError> {
        (**self).upload_file(file, visibility).await
    }

    async fn delete_file(&self, name: &str, visibility: Visibility) -> Result<bool, StoreError> {
        (**self).delete_file(name, visibility).await
    }
}

/// Key of `entity`, checked to be addressable by the table store.
pub(crate) fn entity_key(entity: &TableEntity) -> Result<manualhub_core::EntryKey, StoreError> {
    let key = manualhub_core::EntryKey::new(entity.partition_key(), entity.row_key());
    key.ensure_addressable()
        .map_err(|e| StoreError::invalid_input(e.to_string()))?;
    Ok(key)
}
