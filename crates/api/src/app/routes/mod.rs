use axum::{
    Router,
    routing::{delete, get, post},
};

pub mod blob;
pub mod system;
pub mod table;

/// Router for everything under `/api`.
pub fn router() -> Router {
    Router::new()
        .route(
            "/table",
            get(table::list_entries)
                .post(table::create_entry)
                .put(table::update_entry),
        )
        .route("/blob/upload", post(blob::upload))
        .route("/blob/delete", delete(blob::delete))
}
