use axum::http::StatusCode;

/// Liveness check for load balancers. Touches neither the subscription
/// store nor any webhook target.
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}
