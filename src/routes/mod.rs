pub mod dashboard;
pub mod health;
pub mod provisioning;
pub mod proxy;
mod rate_limit;

use axum::{
    http::{header, HeaderMap},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

use rate_limit::ClientIpKeyExtractor;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::common::AppState;
use crate::error::{AppError, AppResult};

/// Auth token sent by the dashboard, forwarded to the backend as is.
pub fn auth_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Like [`auth_token`], but a missing token is a bad request.
pub fn require_token(headers: &HeaderMap) -> AppResult<&str> {
    auth_token(headers).ok_or_else(|| AppError::BadRequest("Missing auth token".to_string()))
}

/// OpenAPI document served at `/docs`.
#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthz,
        proxy::forward,
        dashboard::get_dashboard,
        dashboard::watch_dashboard,
        provisioning::create_session,
        provisioning::get_session,
        provisioning::apply_event,
        provisioning::delete_session,
    ),
    components(
        schemas(
            crate::telemetry::ViewRequest,
            crate::telemetry::DashboardView,
            crate::telemetry::ViewStatus,
            crate::telemetry::Aggregate,
            crate::telemetry::ChartSeries,
            crate::telemetry::MinMax,
            crate::telemetry::Metric,
            crate::telemetry::SensorProfile,
            crate::telemetry::Substrate,
            crate::backend::SensorRecord,
            crate::backend::RawReading,
            crate::provisioning::ProvisioningSession,
            crate::provisioning::FlowEvent,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "proxy", description = "Pass-through to the LeafAI backend"),
        (name = "dashboard", description = "Sensor cards and charts"),
        (name = "provisioning", description = "Device setup wizard"),
    ),
    info(
        title = "Grow Monitor API",
        description = "Greenhouse dashboard API in front of the LeafAI backend",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;

/// Build the application router.
///
/// # Errors
///
/// Returns `AppError::Internal` when the rate limiter settings are unusable
/// (e.g. a zero burst size).
pub fn build_router(state: AppState) -> AppResult<Router> {
    let config = &state.config;

    let api_routes = Router::new()
        .route("/proxy/{endpoint}", post(proxy::forward))
        .route("/dashboard", post(dashboard::get_dashboard))
        .route("/dashboard/watch", get(dashboard::watch_dashboard))
        .route("/provisioning", post(provisioning::create_session))
        .route(
            "/provisioning/{session_id}",
            get(provisioning::get_session).delete(provisioning::delete_session),
        )
        .route(
            "/provisioning/{session_id}/events",
            post(provisioning::apply_event),
        );

    let api_routes = if config.disable_rate_limiting {
        tracing::warn!("Rate limiting DISABLED");
        api_routes
    } else {
        tracing::info!(
            rate = %format!("{}/s burst {}", config.rate_limit_per_second, config.rate_limit_burst),
            "Rate limiting configured"
        );

        let limiter = GovernorConfigBuilder::default()
            .key_extractor(ClientIpKeyExtractor)
            .per_second(config.rate_limit_per_second)
            .burst_size(config.rate_limit_burst)
            .finish()
            .ok_or_else(|| AppError::Internal("Invalid rate limiter settings".to_string()))?;

        api_routes.layer(GovernorLayer {
            config: Arc::new(limiter),
        })
    }
    .layer(RequestBodyLimitLayer::new(1024 * 1024)); // 1MB body limit

    // Health check routes (NO rate limiting)
    let health_routes = Router::new().route("/healthz", get(health::healthz));

    // OpenAPI documentation
    let docs_routes = Router::new().merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    Ok(Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(docs_routes)
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}
