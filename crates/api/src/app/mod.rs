//! HTTP application wiring (Axum router + store wiring).
//!
//! - `routes/`: HTTP handlers, one file per upstream (table, blob) plus system
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use manualhub_store::{AzureRemoteStore, RemoteStore, StoreConfig};

pub mod dto;
pub mod errors;
pub mod routes;

/// Largest accepted upload body.
pub const MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

/// Build the router against the Azure stores described by `config`.
pub fn build_app_with_config(config: StoreConfig) -> Router {
    build_app(Arc::new(AzureRemoteStore::new(config)))
}

/// Build the full HTTP router around any store (public entrypoint used by
/// `main.rs` and the tests).
pub fn build_app(store: Arc<dyn RemoteStore>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api", routes::router())
        .layer(
            ServiceBuilder::new()
                .layer(Extension(store))
                .layer(axum::extract::DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
}
