use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use uuid::Uuid;

use crate::common::AppState;
use crate::error::{AppError, AppResult};
use crate::provisioning::{self, FlowEvent, ProvisioningSession, Step};

use super::require_token;

async fn load_session(state: &AppState, id: Uuid) -> AppResult<ProvisioningSession> {
    state
        .sessions
        .get(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Provisioning session '{id}' not found")))
}

/// Start a device setup wizard
#[utoipa::path(
    post,
    path = "/api/provisioning",
    responses(
        (status = 201, description = "Session created, waiting for the device scan", body = ProvisioningSession),
    ),
    tag = "provisioning"
)]
pub async fn create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<ProvisioningSession>) {
    let session = ProvisioningSession::new();
    state.sessions.insert(session.id, session.clone()).await;
    tracing::info!(session_id = %session.id, "provisioning_started");
    (StatusCode::CREATED, Json(session))
}

/// Current snapshot of a wizard, e.g. after a page reload
#[utoipa::path(
    get,
    path = "/api/provisioning/{session_id}",
    params(
        ("session_id" = Uuid, Path, description = "Session id"),
    ),
    responses(
        (status = 200, description = "Session snapshot", body = ProvisioningSession),
        (status = 404, description = "Unknown or expired session"),
    ),
    tag = "provisioning"
)]
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<ProvisioningSession>> {
    load_session(&state, session_id).await.map(Json)
}

/// Apply one wizard event
///
/// On success the new snapshot replaces the stored one. On failure the
/// stored session is left as it was.
#[utoipa::path(
    post,
    path = "/api/provisioning/{session_id}/events",
    params(
        ("session_id" = Uuid, Path, description = "Session id"),
    ),
    request_body = FlowEvent,
    responses(
        (status = 200, description = "Next snapshot", body = ProvisioningSession),
        (status = 400, description = "Validation failure or event not allowed in this step"),
        (status = 404, description = "Unknown or expired session"),
        (status = 422, description = "QR code rejected or backend refused the change"),
        (status = 500, description = "Backend unreachable"),
    ),
    tag = "provisioning"
)]
pub async fn apply_event(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    headers: HeaderMap,
    Json(event): Json<FlowEvent>,
) -> AppResult<Json<ProvisioningSession>> {
    let token = require_token(&headers)?;
    let session = load_session(&state, session_id).await?;

    let next = provisioning::apply(&session, event, state.backend.as_ref(), token)
        .await
        .map_err(|e| {
            tracing::debug!(session_id = %session_id, step = ?session.step, error = %e, "provisioning_event_rejected");
            AppError::from(e)
        })?;

    if next.step == Step::Cancelled {
        state.sessions.invalidate(&session_id).await;
        tracing::info!(session_id = %session_id, "provisioning_cancelled");
    } else {
        state.sessions.insert(session_id, next.clone()).await;
        if next.step == Step::Complete {
            tracing::info!(
                session_id = %session_id,
                sensors = next.accumulated_sensors.len(),
                "provisioning_complete"
            );
        }
    }

    Ok(Json(next))
}

/// Discard a wizard
#[utoipa::path(
    delete,
    path = "/api/provisioning/{session_id}",
    params(
        ("session_id" = Uuid, Path, description = "Session id"),
    ),
    responses(
        (status = 204, description = "Session discarded"),
    ),
    tag = "provisioning"
)]
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> StatusCode {
    state.sessions.invalidate(&session_id).await;
    StatusCode::NO_CONTENT
}
