use axum::http::StatusCode;

/// Liveness probe, reachable without a session.
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}
