use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Multipart, Query},
    http::StatusCode,
    response::IntoResponse,
};

use manualhub_core::UploadFile;
use manualhub_store::RemoteStore;

use crate::app::{dto, errors};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Multipart upload: a `file` part and an optional `isPublic` text part.
pub async fn upload(
    Extension(store): Extension<Arc<dyn RemoteStore>>,
    mut multipart: Multipart,
) -> axum::response::Response {
    let mut file = None;
    let mut is_public: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return errors::json_error(StatusCode::BAD_REQUEST, "invalid_multipart", e.to_string());
            }
        };

        let part = field.name().map(str::to_string);
        match part.as_deref() {
            Some("file") => {
                let name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or(FALLBACK_CONTENT_TYPE)
                    .to_string();
                let data = match field.bytes().await {
                    Ok(data) => data,
                    Err(e) => {
                        return errors::json_error(StatusCode::BAD_REQUEST, "invalid_multipart", e.to_string());
                    }
                };
                file = Some(UploadFile::new(name, content_type, data));
            }
            Some("isPublic") => match field.text().await {
                Ok(text) => is_public = Some(text),
                Err(e) => {
                    return errors::json_error(StatusCode::BAD_REQUEST, "invalid_multipart", e.to_string());
                }
            },
            _ => {}
        }
    }

    let Some(file) = file else {
        return errors::json_error(StatusCode::BAD_REQUEST, "missing_file", "No file provided");
    };
    if file.name.trim().is_empty() {
        return errors::json_error(StatusCode::BAD_REQUEST, "missing_file_name", "file part needs a file name");
    }

    let visibility = dto::visibility_from_flag(is_public.as_deref());
    match store.upload_file(&file, visibility).await {
        Ok(blob) => Json(dto::UploadResponse {
            success: true,
            blob,
        })
        .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete(
    Extension(store): Extension<Arc<dyn RemoteStore>>,
    Query(query): Query<dto::DeleteQuery>,
) -> axum::response::Response {
    let Some(blob_name) = query.blob_name.filter(|n| !n.trim().is_empty()) else {
        return errors::json_error(StatusCode::BAD_REQUEST, "missing_blob_name", "Blob name is required");
    };

    let visibility = dto::visibility_from_flag(query.is_public.as_deref());
    match store.delete_file(&blob_name, visibility).await {
        Ok(deleted) => Json(dto::DeleteResponse {
            success: true,
            deleted,
        })
        .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
