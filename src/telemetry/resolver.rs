use crate::backend::{RecordId, SensorRecord};

/// What a dashboard view is looking at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Location(RecordId),
    Plant(RecordId),
}

/// First sensor registered at `location`.
#[must_use]
pub fn sensor_for_location<'a>(
    sensors: &'a [SensorRecord],
    location: &RecordId,
) -> Option<&'a SensorRecord> {
    sensors
        .iter()
        .find(|s| s.location_id.as_ref() == Some(location))
}

/// First sensor assigned to `plant`.
#[must_use]
pub fn sensor_for_plant<'a>(
    sensors: &'a [SensorRecord],
    plant: &RecordId,
) -> Option<&'a SensorRecord> {
    sensors
        .iter()
        .find(|s| s.in_plant_id.as_ref() == Some(plant))
}

/// `None` is the "no sensor for this location/plant" state, not an error.
#[must_use]
pub fn resolve<'a>(sensors: &'a [SensorRecord], target: &Target) -> Option<&'a SensorRecord> {
    match target {
        Target::Location(id) => sensor_for_location(sensors, id),
        Target::Plant(id) => sensor_for_plant(sensors, id),
    }
}
