use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::backend::proxy;
use crate::common::AppState;
use crate::error::{AppError, AppResult};

use super::auth_token;

/// Pass a dashboard request through to the LeafAI backend
///
/// The JSON body is forwarded unchanged with the caller's `Authorization`
/// header; the backend's status and body come back verbatim.
#[utoipa::path(
    post,
    path = "/api/proxy/{endpoint}",
    params(
        ("endpoint" = String, Path, description = "Backend endpoint, e.g. getsensors"),
    ),
    request_body(content = serde_json::Value, content_type = "application/json", description = "Forwarded unchanged"),
    responses(
        (status = 200, description = "Backend response, relayed verbatim"),
        (status = 400, description = "Missing auth token or malformed JSON body"),
        (status = 404, description = "Unknown endpoint"),
        (status = 500, description = "Backend unreachable"),
    ),
    tag = "proxy"
)]
pub async fn forward(
    State(state): State<AppState>,
    Path(endpoint): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    let route = proxy::lookup(&endpoint)
        .ok_or_else(|| AppError::NotFound(format!("Unknown endpoint '{endpoint}'")))?;

    let token = auth_token(&headers);
    if route.requires_token && token.is_none() {
        return Err(AppError::BadRequest("Missing auth token".to_string()));
    }

    let payload: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Object(serde_json::Map::new())
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {e}")))?
    };

    let forwarded = state.backend.forward(route, token, payload).await?;

    tracing::debug!(
        endpoint = route.endpoint,
        status = forwarded.status,
        "proxy_forwarded"
    );

    let status = StatusCode::from_u16(forwarded.status).unwrap_or(StatusCode::BAD_GATEWAY);
    Ok((status, Json(forwarded.body)).into_response())
}
