use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use manualhub_core::{
    EntryKey, TableEntity, UploadFile, Visibility, blob_name_from, check_blob_name,
};

use crate::config::container_for;
use crate::error::StoreError;
use crate::remote::{RemoteStore, UploadedBlob, entity_key};

/// Operation selector for fault injection and call counting.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    ListEntries,
    CreateEntry,
    UpdateEntry,
    UploadFile,
    DeleteFile,
}

/// One call as the store saw it, recorded whether or not it succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    ListEntries,
    CreateEntry(TableEntity),
    UpdateEntry(TableEntity),
    UploadFile { name: String, visibility: Visibility },
    DeleteFile { name: String, visibility: Visibility },
}

impl StoreCall {
    pub fn operation(&self) -> StoreOperation {
        match self {
            StoreCall::ListEntries => StoreOperation::ListEntries,
            StoreCall::CreateEntry(_) => StoreOperation::CreateEntry,
            StoreCall::UpdateEntry(_) => StoreOperation::UpdateEntry,
            StoreCall::UploadFile { .. } => StoreOperation::UploadFile,
            StoreCall::DeleteFile { .. } => StoreOperation::DeleteFile,
        }
    }
}

#[derive(Debug, Clone)]
enum Trigger {
    Always,
    /// 1-based call number of that operation.
    OnCall(usize),
}

#[derive(Debug, Clone)]
struct Fault {
    operation: StoreOperation,
    trigger: Trigger,
    error: StoreError,
}

#[derive(Debug, Default)]
struct State {
    rows: Vec<TableEntity>,
    blobs: HashMap<(Visibility, String), Bytes>,
    calls: Vec<StoreCall>,
    faults: Vec<Fault>,
    latency: HashMap<StoreOperation, Duration>,
}

/// In-memory remote store.
///
/// Intended for tests/dev. Records every call and can be told to fail or
/// stall specific operations.
#[derive(Debug, Default)]
pub struct InMemoryRemoteStore {
    state: RwLock<State>,
}

impl InMemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<TableEntity>) -> Self {
        let store = Self::default();
        if let Ok(mut state) = store.state.write() {
            state.rows = rows;
        }
        store
    }

    /// Every call of `operation` fails with `error`.
    pub fn fail_always(&self, operation: StoreOperation, error: StoreError) {
        self.push_fault(operation, Trigger::Always, error);
    }

    /// Only the `n`-th call (1-based) of `operation` fails with `error`.
    pub fn fail_on_call(&self, operation: StoreOperation, n: usize, error: StoreError) {
        self.push_fault(operation, Trigger::OnCall(n), error);
    }

    pub fn clear_faults(&self) {
        if let Ok(mut state) = self.state.write() {
            state.faults.clear();
        }
    }

    /// Delay every call of `operation` by `delay` (tokio time).
    pub fn set_latency(&self, operation: StoreOperation, delay: Duration) {
        if let Ok(mut state) = self.state.write() {
            state.latency.insert(operation, delay);
        }
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.state
            .read()
            .map(|s| s.calls.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self, operation: StoreOperation) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.operation() == operation)
            .count()
    }

    pub fn rows(&self) -> Vec<TableEntity> {
        self.state.read().map(|s| s.rows.clone()).unwrap_or_default()
    }

    pub fn row(&self, key: &EntryKey) -> Option<TableEntity> {
        self.rows()
            .into_iter()
            .find(|r| same_key(r, key))
    }

    pub fn has_blob(&self, name: &str, visibility: Visibility) -> bool {
        self.state
            .read()
            .map(|s| s.blobs.contains_key(&(visibility, blob_name_from(name).to_string())))
            .unwrap_or(false)
    }

    pub fn blob_count(&self) -> usize {
        self.state.read().map(|s| s.blobs.len()).unwrap_or(0)
    }

    /// Put a file in place without recording a call.
    pub fn seed_blob(&self, name: &str, visibility: Visibility, data: impl Into<Bytes>) {
        if let Ok(mut state) = self.state.write() {
            state
                .blobs
                .insert((visibility, blob_name_from(name).to_string()), data.into());
        }
    }

    fn push_fault(&self, operation: StoreOperation, trigger: Trigger, error: StoreError) {
        if let Ok(mut state) = self.state.write() {
            state.faults.push(Fault {
                operation,
                trigger,
                error,
            });
        }
    }

    /// Record `call`, wait out any configured latency, then return the
    /// injected fault for this call, if any.
    async fn begin(&self, call: StoreCall) -> Result<(), StoreError> {
        let operation = call.operation();
        let (delay, fault) = {
            let mut state = self.lock_write()?;
            state.calls.push(call);
            let nth = state
                .calls
                .iter()
                .filter(|c| c.operation() == operation)
                .count();
            let fault = state
                .faults
                .iter()
                .find(|f| {
                    f.operation == operation
                        && match f.trigger {
                            Trigger::Always => true,
                            Trigger::OnCall(n) => n == nth,
                        }
                })
                .map(|f| f.error.clone());
            (state.latency.get(&operation).copied(), fault)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match fault {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn lock_write(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::transport("lock poisoned"))
    }
}

fn same_key(row: &TableEntity, key: &EntryKey) -> bool {
    row.partition_key() == key.partition_key && row.row_key() == key.row_key
}

#[async_trait]
impl RemoteStore for InMemoryRemoteStore {
    async fn list_entries(&self) -> Result<Vec<TableEntity>, StoreError> {
        self.begin(StoreCall::ListEntries).await?;
        Ok(self.lock_write()?.rows.clone())
    }

    async fn create_entry(&self, entity: &TableEntity) -> Result<(), StoreError> {
        self.begin(StoreCall::CreateEntry(entity.clone())).await?;
        let key = entity_key(entity)?;
        let mut state = self.lock_write()?;
        if state.rows.iter().any(|r| same_key(r, &key)) {
            return Err(StoreError::remote(409, format!("EntityAlreadyExists: {key}")));
        }
        state.rows.push(entity.clone());
        Ok(())
    }

    async fn update_entry(&self, entity: &TableEntity) -> Result<(), StoreError> {
        self.begin(StoreCall::UpdateEntry(entity.clone())).await?;
        let key = entity_key(entity)?;
        let mut state = self.lock_write()?;
        match state.rows.iter_mut().find(|r| same_key(r, &key)) {
            Some(row) => {
                *row = entity.clone();
                Ok(())
            }
            None => Err(StoreError::remote(404, format!("ResourceNotFound: {key}"))),
        }
    }

    async fn upload_file(
        &self,
        file: &UploadFile,
        visibility: Visibility,
    ) -> Result<UploadedBlob, StoreError> {
        self.begin(StoreCall::UploadFile {
            name: file.name.clone(),
            visibility,
        })
        .await?;
        let blob_name =
            check_blob_name(&file.name).map_err(|e| StoreError::invalid_input(e.message()))?;
        let container = container_for(visibility);
        let mut state = self.lock_write()?;
        state
            .blobs
            .insert((visibility, blob_name.to_string()), file.data.clone());
        Ok(UploadedBlob {
            url: format!("memory://{container}/{blob_name}"),
            blob_name: blob_name.to_string(),
            container: container.to_string(),
        })
    }

    async fn delete_file(&self, name: &str, visibility: Visibility) -> Result<bool, StoreError> {
        self.begin(StoreCall::DeleteFile {
            name: name.to_string(),
            visibility,
        })
        .await?;
        let blob_name = blob_name_from(name).to_string();
        let mut state = self.lock_write()?;
        Ok(state.blobs.remove(&(visibility, blob_name)).is_some())
    }
}
