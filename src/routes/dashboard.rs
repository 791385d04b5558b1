use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::Stream;
use tokio_stream::{wrappers::WatchStream, StreamExt};

use crate::common::AppState;
use crate::error::AppResult;
use crate::sync::PollHandle;
use crate::telemetry::{build_view, view, DashboardView, ViewRequest};

use super::require_token;

/// Current values, chart series and extremes for one location or plant
///
/// Without dates the chart shows the trailing window before the newest
/// reading; with `start_date`/`end_date` it shows those whole days.
#[utoipa::path(
    post,
    path = "/api/dashboard",
    request_body = ViewRequest,
    responses(
        (status = 200, description = "View built (check `status` for empty states)", body = DashboardView),
        (status = 400, description = "Invalid selection or missing auth token"),
        (status = 500, description = "Backend unreachable"),
    ),
    tag = "dashboard"
)]
pub async fn get_dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ViewRequest>,
) -> AppResult<Json<DashboardView>> {
    let token = require_token(&headers)?;
    let target = request.target()?;
    let window = request.window()?;

    let view = build_view(
        state.backend.as_ref(),
        token,
        &target,
        window,
        &view::window_config(&state.config),
    )
    .await?;

    Ok(Json(view))
}

/// Live dashboard updates as Server-Sent Events
///
/// Emits a `dashboard` event with the latest-window view on connect and on
/// every poll tick. Polling stops when the client disconnects.
#[utoipa::path(
    get,
    path = "/api/dashboard/watch",
    params(
        ("location_id" = Option<String>, Query, description = "Location to watch"),
        ("plant_id" = Option<String>, Query, description = "Plant to watch"),
    ),
    responses(
        (status = 200, description = "text/event-stream of DashboardView"),
        (status = 400, description = "Invalid selection or missing auth token"),
    ),
    tag = "dashboard"
)]
pub async fn watch_dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(request): Query<ViewRequest>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    let token = require_token(&headers)?.to_string();
    let target = request.target()?;

    let poller = PollHandle::start(state, token, target);
    let updates = WatchStream::new(poller.subscribe());

    // The stream owns the poller, so dropping the connection stops it.
    let events = updates.filter_map(move |view| {
        let _poller = &poller;
        view.map(|v| Event::default().event("dashboard").json_data(v))
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
