pub mod applications;
pub mod health;


use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};

use crate::state::AppState;
use crate::uploads::MAX_RESUME_BYTES;

/// Room for the text fields and multipart framing around a full-size resume.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/applications",
            get(applications::handle_list).post(applications::handle_create),
        )
        .route(
            "/applications/:id",
            get(applications::handle_get)
                .put(applications::handle_update)
                .delete(applications::handle_delete),
        )
        .route(
            "/applications/:id/resume",
            get(applications::handle_download_resume),
        )
        .layer(DefaultBodyLimit::max(MAX_RESUME_BYTES + FORM_OVERHEAD_BYTES));

    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        .nest("/api", api)
        .with_state(state)
}
