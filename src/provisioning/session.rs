use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::backend::models::ProductType;
use crate::backend::RecordId;
use crate::telemetry::Substrate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    AwaitingDeviceScan,
    LocationSelection,
    AwaitingSensorScan,
    SubstrateSelection,
    PlantAssignment,
    Complete,
    Cancelled,
}

impl Step {
    /// Steps during which the camera is held.
    #[must_use]
    pub fn is_scanning(self) -> bool {
        matches!(self, Self::AwaitingDeviceScan | Self::AwaitingSensorScan)
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Cancelled)
    }
}

/// Camera lease held by the scanner UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Camera {
    Active,
    Released,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ScannedSensor {
    pub serial: String,
    pub product: ProductType,
    pub substrate: Option<Substrate>,
    /// Whether the backend has accepted this sensor
    pub registered: bool,
}

/// One run of the device setup wizard.
///
/// Transitions never mutate a stored session in place; `flow::apply`
/// returns a new snapshot that replaces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProvisioningSession {
    pub id: Uuid,
    pub step: Step,
    pub camera: Camera,
    pub device_serial: Option<String>,
    pub selected_location: Option<RecordId>,
    pub location_registered: bool,
    pub scanned_sensor: Option<ScannedSensor>,
    pub pending_substrate: Option<Substrate>,
    pub accumulated_sensors: Vec<ScannedSensor>,
    pub selected_plant: Option<RecordId>,
    pub history: Vec<Step>,
}

impl ProvisioningSession {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            step: Step::AwaitingDeviceScan,
            camera: Camera::Active,
            device_serial: None,
            selected_location: None,
            location_registered: false,
            scanned_sensor: None,
            pending_substrate: None,
            accumulated_sensors: Vec::new(),
            selected_plant: None,
            history: Vec::new(),
        }
    }

    /// Move forward to `step`, remembering where we came from.
    pub(crate) fn advance(&mut self, step: Step) {
        if step != self.step {
            self.history.push(self.step);
        }
        self.set_step(step);
    }

    /// Close a detour step and return to the step it was entered from.
    /// The detour is not recorded, so `Back` skips over it.
    pub(crate) fn resume(&mut self) {
        if let Some(previous) = self.history.pop() {
            self.set_step(previous);
        }
    }

    /// Jump without recording history (back navigation, cancel).
    pub(crate) fn set_step(&mut self, step: Step) {
        self.step = step;
        self.camera = if step.is_scanning() {
            Camera::Active
        } else {
            Camera::Released
        };
    }

    /// Most recent sensor the backend has accepted.
    #[must_use]
    pub fn latest_registered_sensor(&self) -> Option<&ScannedSensor> {
        self.accumulated_sensors.iter().rev().find(|s| s.registered)
    }
}

impl Default for ProvisioningSession {
    fn default() -> Self {
        Self::new()
    }
}
