use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use manualhub_store::StoreError;

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Configuration(msg) => {
            tracing::error!("store configuration missing: {msg}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "configuration_error", msg)
        }
        StoreError::InvalidInput(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_request", msg),
        StoreError::Remote { status, message } => upstream_error(status, message),
        StoreError::Transport(msg) => json_error(StatusCode::BAD_GATEWAY, "upstream_unreachable", msg),
        StoreError::Decode(msg) => json_error(StatusCode::BAD_GATEWAY, "upstream_decode_error", msg),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// 502 carrying the upstream status and message as separate fields, so
/// clients can rebuild the original `StoreError::Remote`.
fn upstream_error(upstream_status: u16, upstream_message: String) -> axum::response::Response {
    (
        StatusCode::BAD_GATEWAY,
        axum::Json(json!({
            "error": "upstream_error",
            "message": format!("upstream status {upstream_status}: {upstream_message}"),
            "upstream_status": upstream_status,
            "upstream_message": upstream_message,
        })),
    )
        .into_response()
}
