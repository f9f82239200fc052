/// Device-control events emitted by the agent when a peripheral's
/// connection state changes.
///
/// Sample payload for a connected removable drive:
///
/// ```json
/// {
///     "deviceClass": 8,
///     "deviceName": "SanDisk Cruzer Blade",
///     "eventId": "{96e5a854-abb7-11ec-ba75-000c29ad0249}",
///     "eventType": "connected",
///     "interface": "USB",
///     "productId": 21863,
///     "ruleId": "-1",
///     "serialId": "4C530110050104113372",
///     "timestamp": "2022-03-24T21:19:00.894+00:00",
///     "vendorId": 1921
/// }
/// ```
use chrono::{DateTime, FixedOffset};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Connection state change reported by the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceEventType {
    Connected,
    Disconnected,
    /// Any other value the agent may send (e.g. blocked, read-only).
    #[serde(other)]
    Other,
}

/// One device-control event.
///
/// Only `eventType` and `deviceClass` drive decisions, and only they can
/// reject a payload. `deviceName` is logged as whatever text it holds. The
/// identifying fields are `None` when missing or not of the expected shape.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceEvent {
    pub event_type: DeviceEventType,
    pub device_class: i64,
    #[serde(default, deserialize_with = "name_text")]
    pub device_name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub event_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub interface: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub product_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub rule_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub serial_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub timestamp: Option<DateTime<FixedOffset>>,
    #[serde(default, deserialize_with = "lenient")]
    pub vendor_id: Option<i64>,
}

/// Any JSON value; `None` unless it parses as `T`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

/// Strings as-is, `null` as empty, anything else as its JSON text.
fn name_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(name) => name,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

impl DeviceEvent {
    /// Parse a serialized event as delivered by `OnDeviceControlEvent`.
    pub fn from_json(payload: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(payload)?)
    }

    /// True for a newly connected device of the given USB class.
    pub fn is_connect_of_class(&self, class: i64) -> bool {
        self.event_type == DeviceEventType::Connected && self.device_class == class
    }
}
