use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use manualhub_core::TableEntity;
use manualhub_store::RemoteStore;

use crate::app::{dto, errors};

pub async fn list_entries(
    Extension(store): Extension<Arc<dyn RemoteStore>>,
) -> axum::response::Response {
    match store.list_entries().await {
        Ok(value) => Json(dto::ListResponse { value }).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_entry(
    Extension(store): Extension<Arc<dyn RemoteStore>>,
    Json(entity): Json<TableEntity>,
) -> axum::response::Response {
    match store.create_entry(&entity).await {
        Ok(()) => Json(dto::SuccessResponse::ok()).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_entry(
    Extension(store): Extension<Arc<dyn RemoteStore>>,
    Json(entity): Json<TableEntity>,
) -> axum::response::Response {
    if entity.partition_key.is_none() || entity.row_key.is_none() {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "missing_keys",
            "PartitionKey and RowKey are required",
        );
    }
    match store.update_entry(&entity).await {
        Ok(()) => Json(dto::SuccessResponse::ok()).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
