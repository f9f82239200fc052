/// Agent event handling — the device filter and the drive scanner.
///
/// The agent delivers events one at a time on the thread that pumps
/// messages, and each handler call runs to completion before the next one
/// is dispatched. Every scanner invocation below is synchronous, so scans of
/// several removable drives happen strictly one after another.
use crate::config::Settings;
use crate::ctl::{CommandRunner, SentinelCtl};
use crate::error::Result;
use crate::model::DeviceEvent;
use crate::platform::drives::{DriveInfo, DriveSource};
use tracing::info;

/// Callbacks for the two agent events the process subscribes to.
pub trait AgentEvents {
    /// The agent process has quit. Scanning through `SentinelCtl.exe` is
    /// likely broken from here on; nothing can be done about it.
    fn on_quit(&self);

    /// A device-control event with its raw JSON payload.
    fn on_device_control_event(&self, payload: &str) -> Result<()>;
}

/// Agent event members, identified by their dispinterface member name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentEventKind {
    Quit,
    DeviceControl,
}

impl AgentEventKind {
    pub fn from_member_name(name: &str) -> Option<Self> {
        match name {
            "OnQuit" => Some(Self::Quit),
            "OnDeviceControlEvent" => Some(Self::DeviceControl),
            _ => None,
        }
    }

    pub fn member_name(self) -> &'static str {
        match self {
            Self::Quit => "OnQuit",
            Self::DeviceControl => "OnDeviceControlEvent",
        }
    }
}

/// What happened to one removable drive during an accepted event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveScan {
    pub root: String,
    /// A running scan was aborted before this one started.
    pub aborted_previous: bool,
    /// Raw reply of `scan_folder`.
    pub output: String,
}

/// Scans removable drives when a USB mass-storage device connects.
pub struct UsbScanHandler<D, R> {
    drives: D,
    ctl: SentinelCtl<R>,
    mass_storage_class: i64,
}

impl<D: DriveSource, R: CommandRunner> UsbScanHandler<D, R> {
    pub fn new(drives: D, ctl: SentinelCtl<R>, settings: &Settings) -> Self {
        Self {
            drives,
            ctl,
            mass_storage_class: settings.mass_storage_class,
        }
    }

    /// Filter one device-control payload and scan if it is a mass-storage
    /// connect. Returns `None` for ignored events, which leave no trace.
    pub fn handle_device_event(&self, payload: &str) -> Result<Option<Vec<DriveScan>>> {
        let event = DeviceEvent::from_json(payload)?;
        if !event.is_connect_of_class(self.mass_storage_class) {
            return Ok(None);
        }

        info!("usb_scan: Found USB device {}", event.device_name);
        self.scan_removable_drives().map(Some)
    }

    /// Scan every removable drive currently attached.
    ///
    /// The connected device is not mapped to a drive letter, so the whole
    /// removable set is rescanned. The first failing invocation stops the
    /// remaining drives.
    pub fn scan_removable_drives(&self) -> Result<Vec<DriveScan>> {
        let mut scans = Vec::new();
        for drive in self.drives.drives().iter().filter(|d| d.is_removable()) {
            scans.push(self.scan_drive(drive)?);
        }
        Ok(scans)
    }

    fn scan_drive(&self, drive: &DriveInfo) -> Result<DriveScan> {
        let aborted_previous = self.ctl.is_scan_in_progress()?;
        if aborted_previous {
            info!("usb_scan: A scan is already in progress...");
            // The reply is logged but not checked; the new scan goes ahead.
            let abort = self.ctl.abort_scan()?;
            info!("usb_scan: {abort}");
        }

        let output = self.ctl.scan_folder(&drive.root)?;
        info!("usb_scan: {output}");

        Ok(DriveScan {
            root: drive.root.clone(),
            aborted_previous,
            output,
        })
    }
}

impl<D: DriveSource, R: CommandRunner> AgentEvents for UsbScanHandler<D, R> {
    fn on_quit(&self) {
        info!("usb_scan: Sentinel agent quit!");
    }

    fn on_device_control_event(&self, payload: &str) -> Result<()> {
        self.handle_device_event(payload).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_names_round_trip() {
        for kind in [AgentEventKind::Quit, AgentEventKind::DeviceControl] {
            assert_eq!(AgentEventKind::from_member_name(kind.member_name()), Some(kind));
        }
        assert_eq!(AgentEventKind::from_member_name("OnAgentUpdated"), None);
    }
}
