use axum::http::StatusCode;

/// Liveness probe. Answers without touching the LeafAI backend and is
/// exempt from rate limiting.
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Service is up"),
    ),
    tag = "health"
)]
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}
