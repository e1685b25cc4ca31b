//! `RemoteStore` over the ManualHub HTTP proxy.
//!
//! The proxy holds the store credentials; this client only knows its base URL.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use manualhub_core::{TableEntity, UploadFile, Visibility, decode_rows};
use manualhub_store::{RemoteStore, StoreError, UploadedBlob};

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    value: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct DeleteResponse {
    #[serde(default = "deleted_by_default")]
    deleted: bool,
}

fn deleted_by_default() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    message: String,
    /// Present when the proxy relays a failed upstream call.
    upstream_status: Option<u16>,
    upstream_message: Option<String>,
}

pub struct ProxyRemoteStore {
    http: reqwest::Client,
    base_url: String,
}

impl ProxyRemoteStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check connectivity by hitting the health endpoint.
    pub async fn check_connectivity(&self) -> bool {
        self.http
            .get(self.url("/health"))
            .send()
            .await
            .is_ok_and(|r| r.status().is_success())
    }
}

async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body: ErrorBody = resp.json().await.unwrap_or_default();
    let message = match (body.message.is_empty(), body.error.is_empty()) {
        (false, _) => body.message,
        (true, false) => body.error.clone(),
        (true, true) => status.to_string(),
    };
    Err(match (body.error.as_str(), body.upstream_status) {
        ("configuration_error", _) => StoreError::Configuration(message),
        ("upstream_unreachable", _) => StoreError::Transport(message),
        ("upstream_decode_error", _) => StoreError::Decode(message),
        (_, Some(upstream)) => StoreError::remote(upstream, body.upstream_message.unwrap_or(message)),
        _ if status == StatusCode::BAD_REQUEST => StoreError::InvalidInput(message),
        _ => StoreError::remote(status.as_u16(), message),
    })
}

#[async_trait]
impl RemoteStore for ProxyRemoteStore {
    async fn list_entries(&self) -> Result<Vec<TableEntity>, StoreError> {
        let resp = self.http.get(self.url("/api/table")).send().await?;
        let body: ListResponse = ensure_success(resp)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::decode(e.to_string()))?;
        Ok(decode_rows(body.value))
    }

    async fn create_entry(&self, entity: &TableEntity) -> Result<(), StoreError> {
        let resp = self
            .http
            .post(self.url("/api/table"))
            .json(entity)
            .send()
            .await?;
        ensure_success(resp).await?;
        Ok(())
    }

    async fn update_entry(&self, entity: &TableEntity) -> Result<(), StoreError> {
        let resp = self
            .http
            .put(self.url("/api/table"))
            .json(entity)
            .send()
            .await?;
        ensure_success(resp).await?;
        Ok(())
    }

    async fn upload_file(
        &self,
        file: &UploadFile,
        visibility: Visibility,
    ) -> Result<UploadedBlob, StoreError> {
        let part = Part::stream(file.data.clone())
            .file_name(file.name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| StoreError::invalid_input(format!("content type: {e}")))?;
        let form = Form::new()
            .part("file", part)
            .text("isPublic", visibility.is_public().to_string());

        let resp = self
            .http
            .post(self.url("/api/blob/upload"))
            .multipart(form)
            .send()
            .await?;
        ensure_success(resp)
            .await?
            .json::<UploadedBlob>()
            .await
            .map_err(|e| StoreError::decode(e.to_string()))
    }

    async fn delete_file(&self, name: &str, visibility: Visibility) -> Result<bool, StoreError> {
        let is_public = visibility.is_public().to_string();
        let resp = self
            .http
            .delete(self.url("/api/blob/delete"))
            .query(&[("blobName", name), ("isPublic", is_public.as_str())])
            .send()
            .await?;
        let body: DeleteResponse = ensure_success(resp)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::decode(e.to_string()))?;
        Ok(body.deleted)
    }
}
