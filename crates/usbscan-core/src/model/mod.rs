/// Data model for agent notifications.
///
/// Re-exports the device-control event record and its event-type enum.
pub mod device_event;

pub use device_event::{DeviceEvent, DeviceEventType};
