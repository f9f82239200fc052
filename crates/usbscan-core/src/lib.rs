/// usbscan core — device filtering, drive scanning, and scanner resolution.
///
/// This crate holds everything that does not need the agent's COM server.
/// The external collaborators (drive enumeration, process listing, the
/// `SentinelCtl.exe` command line, the agent status document) sit behind
/// small traits so the handler can be driven by fakes in tests.
///
/// # Modules
///
/// - [`model`] — Device-control events as delivered by the agent.
/// - [`ctl`] — Synchronous invocation of the `SentinelCtl.exe` command line.
/// - [`resolver`] — Two-tier startup discovery of the scanner executable.
/// - [`handler`] — The event handler that filters events and scans drives.
/// - [`platform`] — Windows drive, process, and elevation queries.
/// - [`logging`] — Append-only timestamped log file.
pub mod config;
pub mod ctl;
pub mod error;
pub mod handler;
pub mod logging;
pub mod model;
pub mod platform;
pub mod resolver;

pub use config::Settings;
pub use error::{Error, Result};
pub use handler::{AgentEventKind, AgentEvents, DriveScan, UsbScanHandler};
