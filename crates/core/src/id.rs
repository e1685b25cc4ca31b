//! Catalog entry addressing.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Composite key of a catalog row: partition (product category) + row id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryKey {
    #[serde(rename = "PartitionKey")]
    pub partition_key: String,
    #[serde(rename = "RowKey")]
    pub row_key: String,
}

impl EntryKey {
    pub fn new(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
        }
    }

    /// Key for a brand new row in `partition_key`.
    ///
    /// Row ids are UUIDv7 (time-ordered). Prefer passing keys explicitly in
    /// tests for determinism.
    pub fn generate(partition_key: impl Into<String>) -> Self {
        Self::new(partition_key, new_row_key())
    }

    /// Reject keys the table store cannot address.
    pub fn ensure_addressable(&self) -> Result<(), DomainError> {
        if self.row_key.trim().is_empty() {
            return Err(DomainError::invalid_id("RowKey must not be empty"));
        }
        for (name, value) in [("PartitionKey", &self.partition_key), ("RowKey", &self.row_key)] {
            if value.chars().any(|c| matches!(c, '/' | '\\' | '#' | '?') || c.is_control()) {
                return Err(DomainError::invalid_id(format!(
                    "{name} contains a character the table store does not allow"
                )));
            }
        }
        Ok(())
    }
}

impl core::fmt::Display for EntryKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.partition_key, self.row_key)
    }
}

/// Fresh row identifier.
pub fn new_row_key() -> String {
    Uuid::now_v7().to_string()
}
