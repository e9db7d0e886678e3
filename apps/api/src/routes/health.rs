use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /
/// Describes the service and its routes.
pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "message": "Job Application API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "GET /health",
            "applications": {
                "create": "POST /api/applications (multipart form-data)",
                "list": "GET /api/applications",
                "getOne": "GET /api/applications/:id",
                "downloadResume": "GET /api/applications/:id/resume",
                "update": "PUT /api/applications/:id (multipart form-data)",
                "delete": "DELETE /api/applications/:id"
            }
        }
    }))
}

/// GET /health
/// Always 200; `database` tells whether the record store is reachable.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "message": "Server is running",
        "database": state.persistence.as_str()
    }))
}
