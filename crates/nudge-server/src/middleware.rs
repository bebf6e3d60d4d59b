//! Middleware for the REST API server.

use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Create CORS middleware.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Request logging middleware.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    info!(
        method = %method,
        uri = %uri,
        status = response.status().as_u16(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Request completed"
    );

    response
}

/// Extract the token from `Bearer <t>` or `Token <t>`.
fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("Token "))
        .map(str::trim)
}

/// API key authentication middleware.
///
/// Active only when `NUDGE_REQUIRE_AUTH` is set and `NUDGE_API_KEY` is non-empty.
pub async fn auth_middleware(request: Request, next: Next) -> Result<Response, StatusCode> {
    if std::env::var("NUDGE_REQUIRE_AUTH").is_ok() {
        let expected_key = std::env::var("NUDGE_API_KEY").unwrap_or_default();

        if !expected_key.is_empty() {
            let token = request
                .headers()
                .get("Authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(bearer_token);

            if token != Some(expected_key.as_str()) {
                return Err(StatusCode::UNAUTHORIZED);
            }
        }
    }

    Ok(next.run(request).await)
}
