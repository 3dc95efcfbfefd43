//! Access log middleware.
//! Logs one line per request, except registry health probes.

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};

use crate::health::HEALTH_PATH;
use crate::observability::metrics;

pub async fn access_log(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let is_probe = req.uri().path() == HEALTH_PATH;

    let path = match req.uri().query() {
        Some(query) => format!("{}?{}", req.uri().path(), query),
        None => req.uri().path().to_string(),
    };
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let response = next.run(req).await;

    if !is_probe {
        let status = response.status();
        metrics::record_request(method.as_str(), status.as_u16(), start);
        tracing::info!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = status.as_u16(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Request"
        );
    }

    response
}
