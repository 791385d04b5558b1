use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::backend::RawReading;

#[derive(Debug, thiserror::Error)]
pub enum ReadingError {
    #[error("malformed sensor payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("unparseable capture time: {0:?}")]
    Timestamp(String),
}

/// Numbers that may arrive as JSON numbers or numeric strings.
///
/// Anything that does not yield a finite number becomes `None`, so it never
/// reaches min/max as `NaN`.
fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(value.filter(|v| v.is_finite()))
}

/// Decoded `SENSORDATAJSON` payload.
///
/// Every field is optional; which ones are populated depends on the sensor
/// and its substrate.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SensorPayload {
    #[serde(rename = "AirTemp", default, deserialize_with = "lenient_f64")]
    pub air_temp: Option<f64>,
    #[serde(rename = "AirHum", default, deserialize_with = "lenient_f64")]
    pub air_humidity: Option<f64>,
    #[serde(rename = "AirCO2", default, deserialize_with = "lenient_f64")]
    pub air_co2: Option<f64>,
    #[serde(rename = "AirVPD", default, deserialize_with = "lenient_f64")]
    pub air_vpd: Option<f64>,
    #[serde(rename = "SoilTemp", default, deserialize_with = "lenient_f64")]
    pub soil_temp: Option<f64>,
    #[serde(rename = "BulkEC", default, deserialize_with = "lenient_f64")]
    pub bulk_ec: Option<f64>,
    #[serde(rename = "VWCRock", default, deserialize_with = "lenient_f64")]
    pub vwc_rock: Option<f64>,
    #[serde(rename = "VWC", default, deserialize_with = "lenient_f64")]
    pub vwc: Option<f64>,
    #[serde(rename = "VWCCoco", default, deserialize_with = "lenient_f64")]
    pub vwc_coco: Option<f64>,
    #[serde(rename = "PoreEC", default, deserialize_with = "lenient_f64")]
    pub pore_ec: Option<f64>,
    #[serde(rename = "LeafWetness", default, deserialize_with = "lenient_f64")]
    pub leaf_wetness: Option<f64>,
    #[serde(rename = "LeafTemp", default, deserialize_with = "lenient_f64")]
    pub leaf_temp: Option<f64>,
    #[serde(rename = "VWC_CHANNEL_0", default, deserialize_with = "lenient_f64")]
    pub vwc_channel_0: Option<f64>,
    #[serde(rename = "VWC_CHANNEL_1", default, deserialize_with = "lenient_f64")]
    pub vwc_channel_1: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReading {
    pub captured_at: NaiveDateTime,
    pub payload: SensorPayload,
}

/// Parse a backend capture time.
///
/// RFC 3339 values are converted to UTC; naive `YYYY-MM-DD HH:MM:SS` (with
/// `T` or space, optional fraction) are taken as given.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, ReadingError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_utc());
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| ReadingError::Timestamp(raw.to_string()))
}

/// Decode one raw reading. Either the whole reading parses or none of it does.
pub fn parse_reading(raw: &RawReading) -> Result<ParsedReading, ReadingError> {
    let payload: SensorPayload = serde_json::from_str(&raw.payload)?;
    let captured_at = parse_timestamp(&raw.captured_at)?;
    Ok(ParsedReading {
        captured_at,
        payload,
    })
}

/// Decode a batch, dropping readings that fail to parse.
pub fn parse_batch(raw: &[RawReading]) -> Vec<ParsedReading> {
    let parsed: Vec<ParsedReading> = raw
        .iter()
        .filter_map(|r| match parse_reading(r) {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    captured_at = %r.captured_at,
                    "Dropping unreadable sensor reading"
                );
                None
            }
        })
        .collect();

    let dropped = raw.len() - parsed.len();
    if dropped > 0 {
        tracing::debug!(total = raw.len(), dropped, "reading_batch_parsed");
    }
    parsed
}
