use serde::Deserialize;

use crate::backend::models::ProductType;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    #[error("QR code is not a LeafAI label")]
    Malformed,

    #[error("unknown product type {0:?}")]
    UnknownProduct(String),

    #[error("QR label has no serial number")]
    MissingSerial,

    #[error("expected a {expected}, scanned a {found}")]
    WrongProduct {
        expected: &'static str,
        found: &'static str,
    },
}

#[derive(Debug, Deserialize)]
struct Label {
    #[serde(rename = "ProductType")]
    product_type: String,
    #[serde(rename = "SerialNumber", default)]
    serial_number: Option<serde_json::Value>,
}

/// A decoded product label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedCode {
    pub product: ProductType,
    pub serial: String,
}

/// Decode a label of the form `{"ProductType": "...", "SerialNumber": "..."}`.
pub fn decode(payload: &str) -> Result<ScannedCode, ScanError> {
    let label: Label = serde_json::from_str(payload.trim()).map_err(|_| ScanError::Malformed)?;

    let product = ProductType::from_code(&label.product_type)
        .ok_or_else(|| ScanError::UnknownProduct(label.product_type.clone()))?;

    let serial = match label.serial_number {
        Some(serde_json::Value::String(s)) => s.trim().to_string(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };
    if serial.is_empty() {
        return Err(ScanError::MissingSerial);
    }

    Ok(ScannedCode { product, serial })
}

/// Decode a label that must be the base station.
pub fn decode_device(payload: &str) -> Result<ScannedCode, ScanError> {
    let code = decode(payload)?;
    if !code.product.is_device() {
        return Err(ScanError::WrongProduct {
            expected: "device",
            found: "sensor",
        });
    }
    Ok(code)
}

/// Decode a label that must be an addon sensor.
pub fn decode_sensor(payload: &str) -> Result<ScannedCode, ScanError> {
    let code = decode(payload)?;
    if code.product.is_device() {
        return Err(ScanError::WrongProduct {
            expected: "sensor",
            found: "device",
        });
    }
    Ok(code)
}
