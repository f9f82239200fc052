/// Fixed settings for a usbscan process.
///
/// There is no configuration file, no environment variable, and no command
/// line flag. Everything the process needs is known at build time and lives
/// here so it can be handed around by reference instead of sitting in globals.
use std::path::PathBuf;

/// USB device class code for mass-storage devices.
pub const MASS_STORAGE_CLASS: i64 = 8;

/// Prefix `SentinelCtl.exe is_scan_in_progress` prints while a scan runs.
pub const SCAN_IN_PROGRESS: &str = "Scan is in progress";

/// Placeholder in [`Settings::install_template`] replaced by the agent version.
pub const VERSION_PLACEHOLDER: &str = "{version}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Log file, relative to the working directory.
    pub log_file: PathBuf,
    /// ProgID of the agent's event source.
    pub agent_prog_id: &'static str,
    /// ProgID of the helper object exposing `GetAgentStatusJSON`. Creating it
    /// requires an elevated process.
    pub helper_prog_id: &'static str,
    /// Install path of the scanner with [`VERSION_PLACEHOLDER`] in place of
    /// the agent version.
    pub install_template: &'static str,
    /// Image name of the agent's tray UI, used for the unprivileged fallback.
    pub ui_image: &'static str,
    /// Image name of the command-line scanner.
    pub ctl_image: &'static str,
    pub mass_storage_class: i64,
    pub scan_in_progress_prefix: &'static str,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from("usb_scan.log"),
            agent_prog_id: "SentinelAgent.1",
            helper_prog_id: "SentinelHelper.1",
            install_template:
                "C:\\Program Files\\SentinelOne\\Sentinel Agent {version}\\SentinelCtl.exe",
            ui_image: "SentinelUI.exe",
            ctl_image: "SentinelCtl.exe",
            mass_storage_class: MASS_STORAGE_CLASS,
            scan_in_progress_prefix: SCAN_IN_PROGRESS,
        }
    }
}

impl Settings {
    /// Scanner path for an installed agent of the given version.
    pub fn versioned_ctl_path(&self, version: &str) -> PathBuf {
        PathBuf::from(self.install_template.replace(VERSION_PLACEHOLDER, version))
    }
}
