//! API-boundary helpers shared by REST modules: the OpenAPI registry seam
//! and the error type handlers return.

pub mod error;

/// Collects OpenAPI fragments from REST modules so the host can serve one document.
pub trait OpenApiRegistry: Send + Sync {
    fn register_openapi(&self, doc: utoipa::openapi::OpenApi);
}

/// Handler for unmatched paths and methods. Attach it with
/// `MethodRouter::fallback` as well, so a known path with an unsupported
/// method answers 404 instead of 405.
pub async fn not_found() -> error::ApiError {
    error::ApiError::not_found("404 page not found")
}
