use axum::response::Json;
use serde_json::{json, Value};

pub use modkit::api::not_found;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
