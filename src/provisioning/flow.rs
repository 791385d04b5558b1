use serde::Deserialize;
use utoipa::ToSchema;

use crate::backend::{Backend, RecordId};
use crate::error::AppError;
use crate::telemetry::Substrate;

use super::qr::{self, ScanError};
use super::session::{ProvisioningSession, ScannedSensor, Step};

/// User input driving the wizard.
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowEvent {
    ScanDevice { payload: String },
    SelectLocation { location_id: RecordId },
    CreateLocation { name: String },
    ConfirmLocation,
    ScanSensor { payload: String },
    SelectSubstrate { substrate: Substrate },
    ConfirmSubstrate,
    FinishScanning,
    SelectPlant { plant_id: RecordId },
    AssignPlant,
    Back,
    Cancel,
}

impl FlowEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::ScanDevice { .. } => "scan_device",
            Self::SelectLocation { .. } => "select_location",
            Self::CreateLocation { .. } => "create_location",
            Self::ConfirmLocation => "confirm_location",
            Self::ScanSensor { .. } => "scan_sensor",
            Self::SelectSubstrate { .. } => "select_substrate",
            Self::ConfirmSubstrate => "confirm_substrate",
            Self::FinishScanning => "finish_scanning",
            Self::SelectPlant { .. } => "select_plant",
            Self::AssignPlant => "assign_plant",
            Self::Back => "back",
            Self::Cancel => "cancel",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("{0}")]
    Validation(&'static str),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("{event} is not possible while {step:?}")]
    InvalidEvent { event: &'static str, step: Step },

    #[error(transparent)]
    Backend(#[from] AppError),
}

impl From<FlowError> for AppError {
    fn from(err: FlowError) -> Self {
        match err {
            FlowError::Validation(msg) => Self::BadRequest(msg.to_string()),
            FlowError::Scan(e) => Self::Scan(e.to_string()),
            e @ FlowError::InvalidEvent { .. } => Self::BadRequest(e.to_string()),
            FlowError::Backend(e) => e,
        }
    }
}

/// Apply `event` to `session`, returning the next snapshot.
///
/// On error the caller keeps the old snapshot: nothing about the session
/// changes, and a failed remote call is not retried.
pub async fn apply(
    session: &ProvisioningSession,
    event: FlowEvent,
    backend: &dyn Backend,
    token: &str,
) -> Result<ProvisioningSession, FlowError> {
    let mut next = session.clone();
    let step = session.step;

    match (step, event) {
        (s, _) if s.is_terminal() => {
            return Err(FlowError::InvalidEvent {
                event: "any event",
                step: s,
            });
        }

        (_, FlowEvent::Cancel) => next.set_step(Step::Cancelled),

        (_, FlowEvent::Back) => go_back(&mut next)?,

        (Step::AwaitingDeviceScan, FlowEvent::ScanDevice { payload }) => {
            let code = qr::decode_device(&payload)?;
            tracing::info!(session_id = %next.id, serial = %code.serial, "device_scanned");
            next.device_serial = Some(code.serial);
            next.advance(Step::LocationSelection);
        }

        (Step::LocationSelection, FlowEvent::SelectLocation { location_id }) => {
            next.selected_location = Some(location_id);
        }

        (Step::LocationSelection, FlowEvent::CreateLocation { name }) => {
            let name = name.trim();
            if name.is_empty() {
                return Err(FlowError::Validation("Please enter a location name"));
            }
            let id = backend.create_location(token, name).await?;
            tracing::info!(session_id = %next.id, location_id = %id, "location_created");
            next.selected_location = Some(id);
        }

        (Step::LocationSelection, FlowEvent::ConfirmLocation) => {
            let Some(location) = next.selected_location.clone() else {
                return Err(FlowError::Validation("Please select a location"));
            };
            let device = next
                .device_serial
                .clone()
                .ok_or(FlowError::Validation("Scan a device first"))?;
            backend.register_device(token, &device, &location).await?;
            tracing::info!(session_id = %next.id, serial = %device, location_id = %location, "device_registered");
            next.location_registered = true;
            next.advance(Step::AwaitingSensorScan);
        }

        (Step::AwaitingSensorScan, FlowEvent::ScanSensor { payload }) => {
            let code = qr::decode_sensor(&payload)?;
            if next.accumulated_sensors.iter().any(|s| s.serial == code.serial) {
                return Err(FlowError::Validation("This sensor was already added"));
            }

            let mut sensor = ScannedSensor {
                serial: code.serial,
                product: code.product,
                substrate: None,
                registered: false,
            };

            if code.product.requires_substrate() {
                next.pending_substrate = None;
                next.scanned_sensor = Some(sensor.clone());
                next.accumulated_sensors.push(sensor);
                next.advance(Step::SubstrateSelection);
            } else {
                let device = next
                    .device_serial
                    .clone()
                    .ok_or(FlowError::Validation("Scan a device first"))?;
                backend
                    .add_sensor(token, &device, &sensor.serial, sensor.product.code(), None)
                    .await?;
                sensor.registered = true;
                tracing::info!(session_id = %next.id, serial = %sensor.serial, "sensor_added");
                next.scanned_sensor = Some(sensor.clone());
                next.accumulated_sensors.push(sensor);
            }
        }

        (Step::SubstrateSelection, FlowEvent::SelectSubstrate { substrate }) => {
            next.pending_substrate = Some(substrate);
        }

        (Step::SubstrateSelection, FlowEvent::ConfirmSubstrate) => {
            let Some(substrate) = next.pending_substrate else {
                return Err(FlowError::Validation("Please select a substrate"));
            };
            let device = next
                .device_serial
                .clone()
                .ok_or(FlowError::Validation("Scan a device first"))?;
            let sensor = next
                .accumulated_sensors
                .last_mut()
                .filter(|s| !s.registered)
                .ok_or(FlowError::Validation("Scan a sensor first"))?;

            backend
                .add_sensor(
                    token,
                    &device,
                    &sensor.serial,
                    sensor.product.code(),
                    Some(substrate.as_str()),
                )
                .await?;
            sensor.substrate = Some(substrate);
            sensor.registered = true;
            tracing::info!(session_id = %next.id, serial = %sensor.serial, substrate = substrate.as_str(), "sensor_added");

            next.scanned_sensor = Some(sensor.clone());
            next.pending_substrate = None;
            next.resume();
        }

        (Step::AwaitingSensorScan, FlowEvent::FinishScanning) => {
            if next.latest_registered_sensor().is_some() {
                next.advance(Step::PlantAssignment);
            } else {
                next.advance(Step::Complete);
            }
        }

        (Step::PlantAssignment, FlowEvent::SelectPlant { plant_id }) => {
            next.selected_plant = Some(plant_id);
        }

        (Step::PlantAssignment, FlowEvent::AssignPlant) => {
            let Some(plant) = next.selected_plant.clone() else {
                return Err(FlowError::Validation("Please select a plant"));
            };
            let sensor = next
                .latest_registered_sensor()
                .map(|s| s.serial.clone())
                .ok_or(FlowError::Validation("Add a sensor first"))?;
            backend.assign_sensor(token, &sensor, &plant).await?;
            tracing::info!(session_id = %next.id, serial = %sensor, plant_id = %plant, "sensor_assigned");
            next.advance(Step::Complete);
        }

        (step, event) => {
            return Err(FlowError::InvalidEvent {
                event: event.name(),
                step,
            });
        }
    }

    Ok(next)
}

/// Step back one screen. Remote writes already made stay in place; only a
/// sensor still waiting for its substrate is forgotten.
fn go_back(session: &mut ProvisioningSession) -> Result<(), FlowError> {
    let previous = session
        .history
        .pop()
        .ok_or(FlowError::Validation("Nothing to go back to"))?;

    if session.step == Step::SubstrateSelection
        && session.accumulated_sensors.last().is_some_and(|s| !s.registered)
    {
        session.accumulated_sensors.pop();
        session.scanned_sensor = None;
        session.pending_substrate = None;
    }

    session.set_step(previous);
    Ok(())
}
