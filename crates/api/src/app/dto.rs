//! Request/response bodies of the proxy routes.

use serde::{Deserialize, Serialize};

use manualhub_core::{TableEntity, Visibility};
use manualhub_store::UploadedBlob;

/// `isPublic` is true unless it is exactly `"false"`.
pub fn visibility_from_flag(flag: Option<&str>) -> Visibility {
    Visibility::from_public_flag(flag != Some("false"))
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub value: Vec<TableEntity>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(flatten)]
    pub blob: UploadedBlob,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    #[serde(rename = "blobName")]
    pub blob_name: Option<String>,
    #[serde(rename = "isPublic")]
    pub is_public: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    /// `false` when there was nothing to delete.
    pub deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_literal_false_means_restricted() {
        assert_eq!(visibility_from_flag(None), Visibility::Public);
        assert_eq!(visibility_from_flag(Some("true")), Visibility::Public);
        assert_eq!(visibility_from_flag(Some("FALSE")), Visibility::Public);
        assert_eq!(visibility_from_flag(Some("false")), Visibility::Restricted);
    }
}
