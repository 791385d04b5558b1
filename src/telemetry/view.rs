use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::backend::{Backend, RecordId, SensorRecord};
use crate::config::Config;
use crate::error::{AppError, AppResult};

use super::resolver::{self, Target};
use super::series::{self, Aggregate, SensorProfile};
use super::window::{self, WindowConfig, WindowRequest};
use super::reading;

/// Dashboard selection: one location or plant, optionally a day range.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ViewRequest {
    pub location_id: Option<RecordId>,
    pub plant_id: Option<RecordId>,
    /// First day, inclusive (`YYYY-MM-DD`)
    pub start_date: Option<NaiveDate>,
    /// Last day, inclusive (`YYYY-MM-DD`)
    pub end_date: Option<NaiveDate>,
}

impl ViewRequest {
    /// # Errors
    ///
    /// `AppError::BadRequest` unless exactly one of `location_id` / `plant_id` is set.
    pub fn target(&self) -> AppResult<Target> {
        match (&self.location_id, &self.plant_id) {
            (Some(id), None) => Ok(Target::Location(id.clone())),
            (None, Some(id)) => Ok(Target::Plant(id.clone())),
            _ => Err(AppError::BadRequest(
                "Provide exactly one of location_id or plant_id".to_string(),
            )),
        }
    }

    /// # Errors
    ///
    /// `AppError::BadRequest` if only one date is given or the range is inverted.
    pub fn window(&self) -> AppResult<WindowRequest> {
        match (self.start_date, self.end_date) {
            (None, None) => Ok(WindowRequest::Latest),
            (Some(start), Some(end)) => {
                WindowRequest::range(start, end).map_err(|e| AppError::BadRequest(e.to_string()))
            }
            _ => Err(AppError::BadRequest(
                "start_date and end_date must be given together".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ViewStatus {
    Ready,
    /// A sensor exists but nothing falls into the window
    NoReadings,
    /// No sensor is attached to the location/plant
    NoSensor,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DashboardView {
    pub success: bool,
    pub status: ViewStatus,
    pub sensor: Option<SensorRecord>,
    pub profile: Option<SensorProfile>,
    pub telemetry: Aggregate,
}

impl DashboardView {
    fn no_sensor() -> Self {
        Self {
            success: true,
            status: ViewStatus::NoSensor,
            sensor: None,
            profile: None,
            telemetry: Aggregate::default(),
        }
    }
}

#[must_use]
pub fn window_config(config: &Config) -> WindowConfig {
    let defaults = WindowConfig::default();
    WindowConfig {
        lookback: Duration::try_hours(config.default_window_hours)
            .filter(|d| *d > Duration::zero())
            .unwrap_or(defaults.lookback),
        cap: if config.default_window_cap == 0 {
            defaults.cap
        } else {
            config.default_window_cap
        },
    }
}

/// Fetch, resolve and shape everything one dashboard card/chart needs.
///
/// # Errors
///
/// Propagates backend failures; empty results are statuses, not errors.
pub async fn build_view(
    backend: &dyn Backend,
    token: &str,
    target: &Target,
    request: WindowRequest,
    config: &WindowConfig,
) -> AppResult<DashboardView> {
    let sensors = backend.sensors(token).await?;

    let Some(sensor) = resolver::resolve(&sensors, target) else {
        tracing::debug!(view_target = ?target, sensors = sensors.len(), "no_sensor_for_target");
        return Ok(DashboardView::no_sensor());
    };

    let raw = backend.sensor_values(token, sensor.reading_serial()).await?;
    let history = reading::parse_batch(&raw);
    let window = window::select(&history, request, config);
    let profile = SensorProfile::for_sensor(sensor);

    let status = if window.is_empty() {
        ViewStatus::NoReadings
    } else {
        ViewStatus::Ready
    };

    tracing::debug!(
        serial = sensor.reading_serial(),
        history = history.len(),
        window = window.len(),
        status = ?status,
        "dashboard_view_built"
    );

    Ok(DashboardView {
        success: true,
        status,
        sensor: Some(sensor.clone()),
        profile: Some(profile),
        telemetry: series::aggregate(&window, &history, profile),
    })
}
