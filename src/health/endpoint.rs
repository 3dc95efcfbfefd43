//! Liveness endpoint polled by the registry.

use axum::{http::StatusCode, Json};

/// Path the registry health check targets.
pub const HEALTH_PATH: &str = "/health";

/// Fixed body returned by the health endpoint.
pub const HEALTH_BODY: &str = "SUCCESS";

/// Always 200, regardless of downstream dependencies.
pub async fn health() -> (StatusCode, Json<&'static str>) {
    (StatusCode::OK, Json(HEALTH_BODY))
}
