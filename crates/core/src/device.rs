//! Vendor device and raw event payloads.
//!
//! These mirror the JSON shapes returned by the vendor API. They are
//! produced per poll and discarded once classified.

use serde::{Deserialize, Serialize};

use crate::types::{DeviceId, UnixSeconds};

/// A litter box registered to the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    /// Vendor category (e.g. `"T3"`), used to select the endpoint template.
    #[serde(rename = "type")]
    pub device_type: String,
}

impl Device {
    pub fn new(id: DeviceId, name: impl Into<String>, device_type: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            device_type: device_type.into(),
        }
    }

    /// Path segment the vendor expects for this device category.
    pub fn endpoint_segment(&self) -> String {
        self.device_type.to_lowercase()
    }
}

/// One telemetry event as delivered by the vendor.
///
/// `content` is left untyped here; its shape depends on `event_type` and
/// is interpreted by the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    pub event_type: i64,
    pub timestamp: UnixSeconds,
    #[serde(default)]
    pub content: serde_json::Value,
}

/// Current state block from the device detail endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceState {
    /// The waste bin is full and needs emptying.
    pub box_full: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_event_parses_vendor_shape() {
        let event: RawEvent = serde_json::from_value(serde_json::json!({
            "eventType": 10,
            "timestamp": 1_650_000_000,
            "content": {"timeIn": 1, "timeOut": 2, "petWeight": 4200},
            "deviceId": 99,
        }))
        .expect("vendor event should parse");

        assert_eq!(event.event_type, 10);
        assert_eq!(event.timestamp, 1_650_000_000);
        assert_eq!(event.content["petWeight"], 4200);
    }

    #[test]
    fn raw_event_without_content_defaults_to_null() {
        let event: RawEvent =
            serde_json::from_value(serde_json::json!({"eventType": 3, "timestamp": 5}))
                .expect("event without content should parse");
        assert!(event.content.is_null());
    }

    #[test]
    fn endpoint_segment_is_lowercase() {
        let device = Device::new(1, "Box", "T3");
        assert_eq!(device.endpoint_segment(), "t3");
    }

    #[test]
    fn device_state_reads_box_full() {
        let state: DeviceState =
            serde_json::from_value(serde_json::json!({"boxFull": true, "power": 1}))
                .expect("state should parse");
        assert!(state.box_full);
    }
}
