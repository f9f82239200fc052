/// End-to-end handler tests.
///
/// These drive `UsbScanHandler` through its `AgentEvents` entry points with
/// a fixed drive set and a recording stand-in for `SentinelCtl.exe`, then
/// check exactly which scanner invocations happened and in what order.
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use usbscan_core::ctl::{CommandOutput, CommandRunner, SentinelCtl};
use usbscan_core::logging::{file_subscriber, open_log};
use usbscan_core::platform::{DriveInfo, DriveSource, DriveType};
use usbscan_core::{AgentEvents, Error, Settings, UsbScanHandler};

// ── Helpers ──────────────────────────────────────────────────────────────────

const CTL: &str = "C:\\Program Files\\SentinelOne\\Sentinel Agent 22.1.4.10010\\SentinelCtl.exe";

/// Drive set that also counts how often it was enumerated.
struct Drives {
    drives: Vec<DriveInfo>,
    enumerations: RefCell<usize>,
}

impl Drives {
    fn new(drives: &[(&str, DriveType)]) -> Self {
        Self {
            drives: drives
                .iter()
                .map(|(root, ty)| DriveInfo::new(*root, *ty))
                .collect(),
            enumerations: RefCell::new(0),
        }
    }
}

impl DriveSource for Drives {
    fn drives(&self) -> Vec<DriveInfo> {
        *self.enumerations.borrow_mut() += 1;
        self.drives.clone()
    }
}

/// Records every invocation. `is_scan_in_progress` replies are taken from
/// `busy` in order; other subcommands reply with a fixed text. A subcommand
/// listed in `fail` exits with code 1.
#[derive(Default)]
struct Ctl {
    busy: RefCell<Vec<bool>>,
    fail: Vec<&'static str>,
    calls: RefCell<Vec<String>>,
}

impl Ctl {
    fn busy(replies: &[bool]) -> Self {
        Self {
            busy: RefCell::new(replies.iter().rev().copied().collect()),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl CommandRunner for Ctl {
    fn run(&self, program: &Path, args: &[&str]) -> usbscan_core::Result<CommandOutput> {
        assert_eq!(program, Path::new(CTL));
        self.calls.borrow_mut().push(args.join(" "));

        let stdout = match args[0] {
            "is_scan_in_progress" => {
                if self.busy.borrow_mut().pop().unwrap_or(false) {
                    "Scan is in progress\r\n".to_string()
                } else {
                    "No scan is in progress\r\n".to_string()
                }
            }
            "abort_scan" => "Scan aborted successfully\r\n".to_string(),
            "scan_folder" => format!("Scan of {} started\r\n", args[2]),
            other => panic!("unexpected subcommand {other}"),
        };
        let code = if self.fail.iter().any(|f| *f == args[0]) { 1 } else { 0 };
        Ok(CommandOutput {
            code: Some(code),
            stdout,
        })
    }
}

fn handler<'a>(drives: &'a Drives, ctl: &'a Ctl) -> UsbScanHandler<&'a Drives, &'a Ctl> {
    let settings = Settings::default();
    UsbScanHandler::new(
        drives,
        SentinelCtl::new(PathBuf::from(CTL), ctl, settings.scan_in_progress_prefix),
        &settings,
    )
}

fn event(event_type: &str, class: i64) -> String {
    format!(
        r#"{{
            "deviceClass": {class},
            "deviceName": "SanDisk Cruzer Blade",
            "eventId": "{{96e5a854-abb7-11ec-ba75-000c29ad0249}}",
            "eventType": "{event_type}",
            "interface": "USB",
            "productId": 21863,
            "ruleId": "-1",
            "serialId": "4C530110050104113372",
            "timestamp": "2022-03-24T21:19:00.894+00:00",
            "vendorId": 1921
        }}"#
    )
}

/// Run `f` with a file subscriber installed and return what it logged.
fn logged(f: impl FnOnce()) -> String {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let path = tmp.path().join("usb_scan.log");
    let subscriber = file_subscriber(open_log(&path).unwrap());
    tracing::subscriber::with_default(subscriber, f);
    fs::read_to_string(&path).unwrap()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

/// Only the removable drive is scanned; the fixed system drive is untouched.
#[test]
fn connected_mass_storage_scans_removable_drive_only() {
    let drives = Drives::new(&[("C:\\", DriveType::Fixed), ("D:\\", DriveType::Removable)]);
    let ctl = Ctl::default();

    let scans = handler(&drives, &ctl)
        .handle_device_event(&event("connected", 8))
        .unwrap()
        .expect("event should be accepted");

    assert_eq!(ctl.calls(), vec!["is_scan_in_progress", "scan_folder -i D:\\"]);
    assert_eq!(scans.len(), 1);
    assert_eq!(scans[0].root, "D:\\");
    assert!(!scans[0].aborted_previous);
    assert_eq!(scans[0].output, "Scan of D:\\ started\r\n");
}

/// A running scan is aborted before the new one starts.
#[test]
fn running_scan_is_aborted_first() {
    let drives = Drives::new(&[("C:\\", DriveType::Fixed), ("D:\\", DriveType::Removable)]);
    let ctl = Ctl::busy(&[true]);

    handler(&drives, &ctl)
        .on_device_control_event(&event("connected", 8))
        .unwrap();

    assert_eq!(
        ctl.calls(),
        vec!["is_scan_in_progress", "abort_scan", "scan_folder -i D:\\"]
    );
}

/// Each removable drive gets its own status check and exactly one scan, in
/// enumeration order.
#[test]
fn every_removable_drive_is_scanned_once_in_order() {
    let drives = Drives::new(&[
        ("C:\\", DriveType::Fixed),
        ("E:\\", DriveType::Removable),
        ("F:\\", DriveType::CdRom),
        ("G:\\", DriveType::Removable),
        ("Z:\\", DriveType::Network),
    ]);
    // The scan started for E:\ is still running when G:\ is checked.
    let ctl = Ctl::busy(&[false, true]);

    let scans = handler(&drives, &ctl)
        .handle_device_event(&event("connected", 8))
        .unwrap()
        .unwrap();

    assert_eq!(
        ctl.calls(),
        vec![
            "is_scan_in_progress",
            "scan_folder -i E:\\",
            "is_scan_in_progress",
            "abort_scan",
            "scan_folder -i G:\\",
        ]
    );
    let roots: Vec<_> = scans.iter().map(|s| s.root.as_str()).collect();
    assert_eq!(roots, vec!["E:\\", "G:\\"]);
    assert_eq!(
        scans.iter().map(|s| s.aborted_previous).collect::<Vec<_>>(),
        vec![false, true]
    );
}

/// Disconnects and non-mass-storage devices cause no enumeration and no
/// scanner invocation.
#[test]
fn ignored_events_do_nothing() {
    let drives = Drives::new(&[("D:\\", DriveType::Removable)]);
    let ctl = Ctl::default();
    let handler = handler(&drives, &ctl);

    for payload in [
        event("disconnected", 8),
        event("connected", 3),
        event("blocked", 8),
        event("disconnected", 3),
    ] {
        assert_eq!(handler.handle_device_event(&payload).unwrap(), None);
    }

    assert!(ctl.calls().is_empty());
    assert_eq!(*drives.enumerations.borrow(), 0);
}

/// A mass-storage connect with no removable drive mounted yet scans nothing.
#[test]
fn no_removable_drive_means_no_invocation() {
    let drives = Drives::new(&[("C:\\", DriveType::Fixed)]);
    let ctl = Ctl::default();

    let scans = handler(&drives, &ctl)
        .handle_device_event(&event("connected", 8))
        .unwrap()
        .unwrap();

    assert!(scans.is_empty());
    assert!(ctl.calls().is_empty());
    assert_eq!(*drives.enumerations.borrow(), 1);
}

/// A failing status query ends handling of the event before any scan.
#[test]
fn failing_status_query_stops_the_event() {
    let drives = Drives::new(&[("D:\\", DriveType::Removable), ("E:\\", DriveType::Removable)]);
    let ctl = Ctl {
        fail: vec!["is_scan_in_progress"],
        ..Ctl::default()
    };

    let err = handler(&drives, &ctl)
        .on_device_control_event(&event("connected", 8))
        .unwrap_err();

    assert!(matches!(err, Error::CommandFailed { code: Some(1), .. }));
    assert_eq!(ctl.calls(), vec!["is_scan_in_progress"]);
}

/// The handler stays usable after an error; the next event is handled.
#[test]
fn handler_survives_a_failed_event() {
    let drives = Drives::new(&[("D:\\", DriveType::Removable)]);
    let ctl = Ctl::default();
    let handler = handler(&drives, &ctl);

    assert!(matches!(
        handler.on_device_control_event("{not json"),
        Err(Error::Payload(_))
    ));
    handler.on_quit();
    handler
        .on_device_control_event(&event("connected", 8))
        .unwrap();

    assert_eq!(ctl.calls(), vec!["is_scan_in_progress", "scan_folder -i D:\\"]);
}

/// Identifying fields of an unexpected shape do not stop the scan.
#[test]
fn odd_identifying_fields_still_scan() {
    let drives = Drives::new(&[("C:\\", DriveType::Fixed), ("D:\\", DriveType::Removable)]);
    let ctl = Ctl::default();
    let payload = r#"{
        "deviceClass": 8,
        "deviceName": null,
        "eventType": "connected",
        "productId": "21863",
        "timestamp": "2022-03-24 21:19:00"
    }"#;

    handler(&drives, &ctl).on_device_control_event(payload).unwrap();

    assert_eq!(ctl.calls(), vec!["is_scan_in_progress", "scan_folder -i D:\\"]);
}

/// An accepted event logs the device, then the raw abort and scan replies.
#[test]
fn accepted_event_logs_device_and_scanner_output() {
    let drives = Drives::new(&[("C:\\", DriveType::Fixed), ("D:\\", DriveType::Removable)]);
    let ctl = Ctl::busy(&[true]);
    let handler = handler(&drives, &ctl);

    let log = logged(|| {
        handler
            .on_device_control_event(&event("connected", 8))
            .unwrap();
    });

    let found = log
        .find("usb_scan: Found USB device SanDisk Cruzer Blade")
        .expect("device line missing");
    let busy = log
        .find("usb_scan: A scan is already in progress...")
        .expect("in-progress line missing");
    let aborted = log
        .find("usb_scan: Scan aborted successfully")
        .expect("abort output missing");
    let started = log
        .find("usb_scan: Scan of D:\\ started")
        .expect("scan output missing");
    assert!(found < busy && busy < aborted && aborted < started, "{log}");
    assert!(!log.contains("C:\\"), "{log}");
}

/// Ignored events leave nothing in the log.
#[test]
fn ignored_events_log_nothing() {
    let drives = Drives::new(&[("D:\\", DriveType::Removable)]);
    let ctl = Ctl::default();
    let handler = handler(&drives, &ctl);

    let log = logged(|| {
        for payload in [event("disconnected", 8), event("connected", 3)] {
            handler.on_device_control_event(&payload).unwrap();
        }
    });

    assert_eq!(log, "");
    assert!(ctl.calls().is_empty());
}
