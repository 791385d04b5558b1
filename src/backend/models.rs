use serde::de::Error as _;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Identifier of a backend record (location, plant).
///
/// The backend mixes numeric and string ids for the same column, so ids are
/// normalized to their decimal text on the way in and compared strictly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(raw: impl AsRef<str>) -> Self {
        let trimmed = raw.as_ref().trim();
        match trimmed.parse::<i64>() {
            Ok(n) => Self(n.to_string()),
            Err(_) => Self(trimmed.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<i64> for RecordId {
    fn from(raw: i64) -> Self {
        Self(raw.to_string())
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(Self::new(s)),
            Value::Number(n) => Ok(Self::new(n.to_string())),
            other => Err(D::Error::custom(format!("invalid identifier: {other}"))),
        }
    }
}

/// Optional id where the backend uses `null`, `""` or `0` for "unset".
fn optional_record_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<RecordId>, D::Error> {
    let id = Option::<RecordId>::deserialize(deserializer)?;
    Ok(id.filter(|id| !id.as_str().is_empty() && id.as_str() != "0"))
}

/// Serial numbers occasionally arrive as bare numbers.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!("invalid serial number: {other}"))),
    }
}

fn optional_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Text field that may be missing, `null` or not a string.
///
/// Missing and `null` become `""`, other values their JSON text, so the
/// reading parser decides whether the record is usable.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        None | Some(Value::Null) => String::new(),
        Some(other) => other.to_string(),
    })
}

/// `success` flag; anything but `true` counts as `false`.
fn lenient_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(matches!(
        Option::<Value>::deserialize(deserializer)?,
        Some(Value::Bool(true))
    ))
}

/// List of backend records where the list itself may be `null` and single
/// entries may be malformed. Bad entries are skipped one by one.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items,
        _ => return Ok(Vec::new()),
    };

    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(index, error = %e, "Skipping malformed backend record");
                None
            }
        })
        .collect())
}

/// A stored sensor reading, exactly as the backend ships it.
///
/// `payload` is itself JSON-encoded; decoding it is the parser's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RawReading {
    #[serde(rename = "SENSORDATAJSON", default, deserialize_with = "lenient_text")]
    pub payload: String,
    #[serde(rename = "CreateDateTime", default, deserialize_with = "lenient_text")]
    pub captured_at: String,
}

/// Sensor record from `getsensors`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SensorRecord {
    #[serde(rename = "SerialNumber", deserialize_with = "lenient_string")]
    pub serial_number: String,
    #[serde(default, deserialize_with = "optional_record_id")]
    pub location_id: Option<RecordId>,
    #[serde(default, deserialize_with = "optional_record_id")]
    pub in_plant_id: Option<RecordId>,
    #[serde(rename = "substrate", default, deserialize_with = "optional_string")]
    pub substrate_type: Option<String>,
    #[serde(
        rename = "AddonSerialNumber",
        default,
        deserialize_with = "optional_string"
    )]
    pub addon_serial_number: Option<String>,
    #[serde(rename = "SensorType", default, deserialize_with = "optional_string")]
    pub sensor_type: Option<String>,
}

impl SensorRecord {
    /// Serial whose readings belong to this record: the addon if one is
    /// attached, the device otherwise.
    #[must_use]
    pub fn reading_serial(&self) -> &str {
        self.addon_serial_number
            .as_deref()
            .unwrap_or(&self.serial_number)
    }
}

/// Response from `getsensors`
#[derive(Debug, Clone, Deserialize)]
pub struct SensorsResponse {
    #[serde(default, deserialize_with = "lenient_flag")]
    pub success: bool,
    #[serde(default, deserialize_with = "lenient_list")]
    pub sensor: Vec<SensorRecord>,
}

/// Response from `getsensorvalues`
#[derive(Debug, Clone, Deserialize)]
pub struct SensorValuesResponse {
    #[serde(default, deserialize_with = "lenient_flag")]
    pub success: bool,
    #[serde(default, deserialize_with = "lenient_list")]
    pub sensorvalue: Vec<RawReading>,
}

/// Response from write endpoints (`addlocation`, `adddevice`, ...)
#[derive(Debug, Clone, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "optional_record_id")]
    pub id: Option<RecordId>,
}

/// Hardware product codes, as printed in QR labels and stored in `SensorType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ProductType {
    #[serde(rename = "GROWHUB")]
    GrowHub,
    #[serde(rename = "CLIMATE")]
    Climate,
    #[serde(rename = "SUBSTRATE")]
    Substrate,
    #[serde(rename = "LEAF")]
    Leaf,
    #[serde(rename = "VWC2")]
    DualVwc,
}

impl ProductType {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::GrowHub => "GROWHUB",
            Self::Climate => "CLIMATE",
            Self::Substrate => "SUBSTRATE",
            Self::Leaf => "LEAF",
            Self::DualVwc => "VWC2",
        }
    }

    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        [
            Self::GrowHub,
            Self::Climate,
            Self::Substrate,
            Self::Leaf,
            Self::DualVwc,
        ]
        .into_iter()
        .find(|p| p.code().eq_ignore_ascii_case(code.trim()))
    }

    /// The base station; everything else is an addon sensor.
    #[must_use]
    pub fn is_device(self) -> bool {
        matches!(self, Self::GrowHub)
    }

    #[must_use]
    pub fn requires_substrate(self) -> bool {
        matches!(self, Self::Substrate)
    }
}
