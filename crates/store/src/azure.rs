//! Azure Blob + Table REST adapter.
//!
//! Authentication is entirely by shared access signature: the SAS query
//! string is appended to every request URL.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use url::Url;

use manualhub_core::{
    TableEntity, UploadFile, Visibility, blob_name_from, check_blob_name, decode_rows,
};

use crate::config::{Endpoint, StoreConfig, container_for};
use crate::error::StoreError;
use crate::remote::{RemoteStore, UploadedBlob, entity_key};

const NO_METADATA: &str = "application/json;odata=nometadata";
const PAGE_SIZE: &str = "$top=1000";
const CONTINUATION_PARTITION: &str = "x-ms-continuation-NextPartitionKey";
const CONTINUATION_ROW: &str = "x-ms-continuation-NextRowKey";

#[derive(Debug, Deserialize)]
struct TablePage {
    #[serde(default)]
    value: Vec<serde_json::Value>,
}

pub struct AzureRemoteStore {
    http: reqwest::Client,
    config: StoreConfig,
}

impl AzureRemoteStore {
    pub fn new(config: StoreConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(http: reqwest::Client, config: StoreConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    async fn put_entity(&self, url: Url, entity: &TableEntity, what: &str) -> Result<(), StoreError> {
        let resp = self
            .http
            .put(url)
            .header(ACCEPT, NO_METADATA)
            .header(CONTENT_TYPE, NO_METADATA)
            .header("Prefer", "return-no-content")
            .body(json_body(entity)?)
            .send()
            .await?;
        ensure_success(resp, what).await?;
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for AzureRemoteStore {
    async fn list_entries(&self) -> Result<Vec<TableEntity>, StoreError> {
        let table = self.config.table()?;
        let mut rows = Vec::new();
        let mut continuation: Option<(String, Option<String>)> = None;

        loop {
            let mut url = signed(table, &table.base_url)?;
            append_raw_query(&mut url, PAGE_SIZE);
            if let Some((partition, row)) = &continuation {
                let mut pairs = url.query_pairs_mut();
                pairs.append_pair("NextPartitionKey", partition);
                if let Some(row) = row {
                    pairs.append_pair("NextRowKey", row);
                }
            }

            let resp = self.http.get(url).header(ACCEPT, NO_METADATA).send().await?;
            let resp = ensure_success(resp, "list entries").await?;
            let next_partition = header_text(&resp, CONTINUATION_PARTITION);
            let next_row = header_text(&resp, CONTINUATION_ROW);

            let page: TablePage = resp
                .json()
                .await
                .map_err(|e| StoreError::decode(e.to_string()))?;
            rows.extend(decode_rows(page.value));

            match next_partition {
                Some(partition) => continuation = Some((partition, next_row)),
                None => break,
            }
        }

        tracing::debug!(rows = rows.len(), "listed catalog rows");
        Ok(rows)
    }

    async fn create_entry(&self, entity: &TableEntity) -> Result<(), StoreError> {
        let table = self.config.table()?;
        let key = entity_key(entity)?;
        let url = signed(table, &table.base_url)?;

        let resp = self
            .http
            .post(url)
            .header(ACCEPT, NO_METADATA)
            .header(CONTENT_TYPE, NO_METADATA)
            .header("Prefer", "return-no-content")
            .body(json_body(entity)?)
            .send()
            .await?;
        ensure_success(resp, "create entry").await?;
        tracing::info!(entry = %key, "catalog row created");
        Ok(())
    }

    async fn update_entry(&self, entity: &TableEntity) -> Result<(), StoreError> {
        let table = self.config.table()?;
        let key = entity_key(entity)?;
        let address = format!(
            "{}(PartitionKey='{}',RowKey='{}')",
            table.base_url,
            quote_key(&key.partition_key),
            quote_key(&key.row_key)
        );
        let url = signed(table, &address)?;

        self.put_entity(url, entity, "update entry").await?;
        tracing::info!(entry = %key, "catalog row replaced");
        Ok(())
    }

    async fn upload_file(
        &self,
        file: &UploadFile,
        visibility: Visibility,
    ) -> Result<UploadedBlob, StoreError> {
        let endpoint = self.config.blob(visibility)?;
        let blob_name =
            check_blob_name(&file.name).map_err(|e| StoreError::invalid_input(e.message()))?;
        let url = object_url(endpoint, blob_name)?;

        let resp = self
            .http
            .put(url)
            .header("x-ms-blob-type", "BlockBlob")
            .header(CONTENT_TYPE, file.content_type.as_str())
            .body(file.data.clone())
            .send()
            .await?;
        ensure_success(resp, "upload file").await?;

        tracing::info!(
            blob = blob_name,
            visibility = visibility.as_str(),
            bytes = file.len(),
            "file uploaded"
        );
        Ok(UploadedBlob {
            url: format!("{}/{}", endpoint.base_url, blob_name),
            blob_name: blob_name.to_string(),
            container: container_for(visibility).to_string(),
        })
    }

    async fn delete_file(&self, name: &str, visibility: Visibility) -> Result<bool, StoreError> {
        let endpoint = self.config.blob(visibility)?;
        let blob_name = blob_name_from(name);
        if blob_name.is_empty() {
            return Err(StoreError::invalid_input(format!(
                "'{name}' does not name a blob"
            )));
        }
        let url = object_url(endpoint, blob_name)?;

        let resp = self
            .http
            .delete(url)
            .header("x-ms-date", http_date())
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            tracing::info!(blob = blob_name, "file already absent");
            return Ok(false);
        }
        ensure_success(resp, "delete file").await?;
        tracing::info!(blob = blob_name, visibility = visibility.as_str(), "file deleted");
        Ok(true)
    }
}

fn signed(endpoint: &Endpoint, raw: &str) -> Result<Url, StoreError> {
    let mut url = Url::parse(raw).map_err(|e| {
        StoreError::configuration(format!("invalid endpoint URL '{}': {e}", endpoint.base_url))
    })?;
    if !endpoint.sas.is_empty() {
        url.set_query(Some(&endpoint.sas));
    }
    Ok(url)
}

fn object_url(endpoint: &Endpoint, name: &str) -> Result<Url, StoreError> {
    let mut url = signed(endpoint, &endpoint.base_url)?;
    url.path_segments_mut()
        .map_err(|_| {
            StoreError::configuration(format!(
                "endpoint URL '{}' cannot hold a path",
                endpoint.base_url
            ))
        })?
        .pop_if_empty()
        .push(name);
    Ok(url)
}

// `$` must reach the table service unescaped.
fn append_raw_query(url: &mut Url, extra: &str) {
    let query = match url.query() {
        Some(q) if !q.is_empty() => format!("{q}&{extra}"),
        _ => extra.to_string(),
    };
    url.set_query(Some(&query));
}

fn json_body(entity: &TableEntity) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(entity).map_err(|e| StoreError::invalid_input(format!("entity: {e}")))
}

fn quote_key(value: &str) -> String {
    value.replace('\'', "''")
}

fn header_text(resp: &Response, name: &str) -> Option<String> {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .filter(|v| !v.is_empty())
}

fn http_date() -> String {
    chrono::Utc::now()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

async fn ensure_success(resp: Response, what: &str) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        format!("{what} failed: {status}")
    } else {
        format!("{what} failed: {status}: {}", body.trim())
    };
    tracing::error!(status = status.as_u16(), "{message}");
    Err(StoreError::remote(status.as_u16(), message))
}
