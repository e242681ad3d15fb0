use crate::error::TelemetryError;
use serde::{Deserialize, Deserializer};
use std::fmt;
use tracing::warn;

// Connection state of a device as reported by the discovery service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    Connected,
    Disconnected,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Connected => "Connected",
            DeviceStatus::Disconnected => "Disconnected",
        }
    }
}

// A device visible on the local network, one element of `GET /api/devices`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Device {
    pub ip: String,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub connected: bool,
}

fn null_as_false<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// Identity of a device within one scan result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKey<'a> {
    Mac(&'a str),
    Ip(&'a str),
}

impl fmt::Display for DeviceKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKey::Mac(mac) => write!(f, "mac:{}", mac),
            DeviceKey::Ip(ip) => write!(f, "ip:{}", ip),
        }
    }
}

impl Device {
    /// MAC when present and non-empty, otherwise the IP address.
    pub fn key(&self) -> DeviceKey<'_> {
        match self.mac.as_deref() {
            Some(mac) if !mac.is_empty() => DeviceKey::Mac(mac),
            _ => DeviceKey::Ip(&self.ip),
        }
    }

    pub fn status(&self) -> DeviceStatus {
        if self.connected {
            DeviceStatus::Connected
        } else {
            DeviceStatus::Disconnected
        }
    }

    pub fn vendor_label(&self) -> &str {
        match self.vendor.as_deref() {
            Some(vendor) if !vendor.is_empty() => vendor,
            _ => "Unknown",
        }
    }

    pub fn mac_label(&self) -> &str {
        match self.mac.as_deref() {
            Some(mac) if !mac.is_empty() => mac,
            _ => "n/a",
        }
    }
}

// Result of decoding a discovery response body
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedDevices {
    pub devices: Vec<Device>,
    pub dropped: usize,
}

/// Decodes a discovery response.
///
/// The body must be a JSON array; elements that do not match the device
/// shape are skipped and counted in `dropped`.
pub fn decode_device_list(body: &[u8]) -> Result<DecodedDevices, TelemetryError> {
    let value: serde_json::Value = serde_json::from_slice(body)?;
    let entries = match value {
        serde_json::Value::Array(entries) => entries,
        other => {
            return Err(TelemetryError::Decode(format!(
                "expected a JSON array of devices, got {}",
                json_type_name(&other)
            )))
        }
    };

    let mut decoded = DecodedDevices::default();
    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<Device>(entry) {
            Ok(device) => decoded.devices.push(device),
            Err(e) => {
                warn!(index, error = %e, "dropping malformed device entry");
                decoded.dropped += 1;
            }
        }
    }

    Ok(decoded)
}

// Round-trip network health, the body of `GET /api/ping`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActivitySample {
    pub latency: f64,
    pub packet_loss: f64,
    #[serde(default)]
    pub download_speed: Option<f64>,
    pub upload_speed: f64,
}

pub fn decode_activity_sample(body: &[u8]) -> Result<ActivitySample, TelemetryError> {
    Ok(serde_json::from_slice(body)?)
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
