/// usbscan agent bindings — the SentinelOne agent's COM surface.
///
/// This crate talks to the agent's COM server and nothing else. Scan
/// decisions live in `usbscan-core`; this side only turns COM calls into
/// [`usbscan_core::AgentEvents`] callbacks and back.
///
/// # Modules
///
/// - [`apartment`] — The single-threaded COM apartment of the main thread.
/// - [`status`] — `GetAgentStatusJSON` on the elevated helper object.
/// - [`subscription`] — Event sink registration and the message pump.
///
/// Everything compiles off Windows, where every entry point returns
/// [`AgentError::Unsupported`].
pub mod apartment;
pub mod error;
pub mod status;
pub mod subscription;

mod interfaces;

#[cfg(windows)]
mod com;
#[cfg(windows)]
mod sink;

pub use apartment::Apartment;
pub use error::AgentError;
pub use status::HelperStatus;
pub use subscription::{pump_messages, subscribe, Subscription};
