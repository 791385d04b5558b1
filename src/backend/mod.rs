//! Access to the external LeafAI backend.
//!
//! Everything goes through [`Backend::forward`], which posts a JSON body to
//! one of the [`proxy::PROXY_ROUTES`] and hands back the upstream status and
//! body untouched. The typed calls used by the dashboard and the
//! provisioning flow are thin wrappers over it that check the
//! `{ success, message }` envelope.

mod client;
pub mod models;
pub mod proxy;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};

pub use client::LeafClient;
pub use models::{RawReading, RecordId, SensorRecord};
pub use proxy::{ProxyRoute, Upstream};

use models::{ActionResponse, SensorValuesResponse, SensorsResponse};

/// Upstream answer relayed by the proxy routes.
#[derive(Debug, Clone, PartialEq)]
pub struct Forwarded {
    pub status: u16,
    pub body: Value,
}

impl Forwarded {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Backend: Send + Sync {
    /// Post `body` to the upstream behind `route`, attaching `token` as the
    /// `Authorization` header when present.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Upstream` on network failure or a non-JSON body.
    async fn forward(
        &self,
        route: &ProxyRoute,
        token: Option<&str>,
        body: Value,
    ) -> AppResult<Forwarded>;

    /// All sensors visible to the token's user.
    async fn sensors(&self, token: &str) -> AppResult<Vec<SensorRecord>> {
        let response: SensorsResponse =
            call(self, proxy::GET_SENSORS, token, json!({})).await?;
        if !response.success {
            tracing::debug!("getsensors reported no sensors");
        }
        Ok(response.sensor)
    }

    /// Reading history of one sensor serial.
    async fn sensor_values(&self, token: &str, serial: &str) -> AppResult<Vec<RawReading>> {
        let response: SensorValuesResponse = call(
            self,
            proxy::GET_SENSOR_VALUES,
            token,
            json!({ "SerialNumber": serial }),
        )
        .await?;
        if !response.success {
            tracing::debug!(serial, "getsensorvalues reported no readings");
        }
        Ok(response.sensorvalue)
    }

    async fn create_location(&self, token: &str, name: &str) -> AppResult<RecordId> {
        let response = action(self, proxy::ADD_LOCATION, token, json!({ "name": name })).await?;
        response
            .id
            .ok_or_else(|| AppError::Upstream("addlocation returned no id".to_string()))
    }

    async fn register_device(
        &self,
        token: &str,
        device_serial: &str,
        location: &RecordId,
    ) -> AppResult<()> {
        action(
            self,
            proxy::ADD_DEVICE,
            token,
            json!({ "SerialNumber": device_serial, "location_id": location }),
        )
        .await
        .map(|_| ())
    }

    async fn add_sensor(
        &self,
        token: &str,
        device_serial: &str,
        sensor_serial: &str,
        sensor_type: &str,
        substrate: Option<&str>,
    ) -> AppResult<()> {
        action(
            self,
            proxy::ADD_SENSOR,
            token,
            json!({
                "SerialNumber": device_serial,
                "AddonSerialNumber": sensor_serial,
                "SensorType": sensor_type,
                "substrate": substrate,
            }),
        )
        .await
        .map(|_| ())
    }

    async fn assign_sensor(
        &self,
        token: &str,
        sensor_serial: &str,
        plant: &RecordId,
    ) -> AppResult<()> {
        action(
            self,
            proxy::ASSIGN_SENSOR,
            token,
            json!({ "AddonSerialNumber": sensor_serial, "in_plant_id": plant }),
        )
        .await
        .map(|_| ())
    }
}

/// Forward to a known endpoint and decode a successful response.
async fn call<B, T>(backend: &B, endpoint: &str, token: &str, body: Value) -> AppResult<T>
where
    B: Backend + ?Sized,
    T: DeserializeOwned,
{
    let route = proxy::lookup(endpoint)
        .ok_or_else(|| AppError::Internal(format!("unknown endpoint {endpoint}")))?;

    let forwarded = backend.forward(route, Some(token), body).await?;
    if !forwarded.is_success() {
        return Err(AppError::Upstream(format!(
            "{endpoint} answered HTTP {}",
            forwarded.status
        )));
    }

    serde_json::from_value(forwarded.body).map_err(|e| {
        AppError::Upstream(format!("Failed to parse {endpoint} response: {e}"))
    })
}

/// Like [`call`] for write endpoints: `success: false` surfaces the
/// backend's own message.
async fn action<B>(backend: &B, endpoint: &str, token: &str, body: Value) -> AppResult<ActionResponse>
where
    B: Backend + ?Sized,
{
    let response: ActionResponse = call(backend, endpoint, token, body).await?;
    if response.success {
        Ok(response)
    } else {
        Err(AppError::Rejected(
            response
                .message
                .unwrap_or_else(|| format!("{endpoint} was rejected")),
        ))
    }
}
