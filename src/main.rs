//! usb_scan — scans removable drives with SentinelCtl as soon as the
//! SentinelOne agent reports a USB mass-storage device connected.
//!
//! Thin binary entry point. All logic lives in the `usbscan-core`
//! and `usbscan-agent` crates.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use usbscan_agent::{pump_messages, subscribe, Apartment, HelperStatus};
use usbscan_core::ctl::{SentinelCtl, SystemRunner};
use usbscan_core::platform::{is_elevated, SystemDrives, SystemProcesses};
use usbscan_core::resolver::{log_resolution, resolve_ctl_path};
use usbscan_core::{logging, Settings, UsbScanHandler};

fn main() -> anyhow::Result<()> {
    let settings = Settings::default();

    // Everything goes to the log file; release builds have no console.
    logging::init(&settings.log_file)?;

    run(&settings).inspect_err(|e| tracing::error!("usb_scan: {e:#}"))
}

fn run(settings: &Settings) -> anyhow::Result<()> {
    tracing::info!("usb_scan: starting (elevated: {})", is_elevated());

    // Status query, subscription and event delivery all share this apartment.
    let _apartment = Apartment::enter()?;

    let status = HelperStatus::new(settings.helper_prog_id);
    let resolution = resolve_ctl_path(&status, &SystemProcesses, settings)?;
    log_resolution(&resolution);

    let ctl = SentinelCtl::new(
        resolution.into_path(),
        SystemRunner,
        settings.scan_in_progress_prefix,
    );
    let handler = UsbScanHandler::new(SystemDrives, ctl, settings);

    let _subscription = subscribe(settings.agent_prog_id, Box::new(handler))?;
    tracing::info!("usb_scan: listening for {} events", settings.agent_prog_id);

    pump_messages()?;
    Ok(())
}
