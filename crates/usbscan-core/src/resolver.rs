/// Startup discovery of the `SentinelCtl.exe` path.
///
/// Two tiers, tried in order:
/// - **Tier 1 (agent status):** ask the agent's helper object for its status
///   document and build the versioned install path. Needs elevation.
/// - **Tier 2 (UI process):** find the running `SentinelUI.exe` and swap its
///   image name for `SentinelCtl.exe`. Works unprivileged.
///
/// Tier 2 runs whenever tier 1 fails, whatever the reason. If several UI
/// processes run, the first one in snapshot order is used; that order is up
/// to the OS.
use crate::config::Settings;
use crate::platform::processes::{image_paths_named, ProcessSource};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Provider of the agent status JSON document (`GetAgentStatusJSON`).
pub trait AgentStatusSource {
    fn agent_status_json(&self) -> Result<String, BoxError>;
}

/// Why tier 1 did not produce a path.
#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    #[error("agent status query failed: {0}")]
    Query(#[source] BoxError),
    #[error("agent status is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why tier 2 did not produce a path.
#[derive(Debug, thiserror::Error)]
pub enum FallbackError {
    #[error("no running {0} process with a readable image path")]
    NoUiProcess(String),
}

/// Both tiers failed.
#[derive(Debug, thiserror::Error)]
#[error("cannot locate SentinelCtl ({status}; {fallback})")]
pub struct ResolveError {
    pub status: StatusError,
    pub fallback: FallbackError,
}

/// Where the scanner path came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Built from the installed agent version.
    Versioned { path: PathBuf, version: String },
    /// Derived from a running UI process. `candidates` counts every UI
    /// process seen; only the first was used.
    UiProcess {
        path: PathBuf,
        ui_path: String,
        candidates: usize,
    },
}

impl Resolution {
    pub fn path(&self) -> &Path {
        match self {
            Self::Versioned { path, .. } | Self::UiProcess { path, .. } => path,
        }
    }

    pub fn into_path(self) -> PathBuf {
        match self {
            Self::Versioned { path, .. } | Self::UiProcess { path, .. } => path,
        }
    }

    pub fn tier(&self) -> &'static str {
        match self {
            Self::Versioned { .. } => "agent status",
            Self::UiProcess { .. } => "UI process",
        }
    }
}

#[derive(Debug, Deserialize)]
struct AgentStatus {
    #[serde(rename = "agent-version")]
    agent_version: String,
}

/// Tier 1: versioned install path from the agent status document.
pub fn from_agent_status<S: AgentStatusSource + ?Sized>(
    source: &S,
    settings: &Settings,
) -> Result<Resolution, StatusError> {
    let json = source.agent_status_json().map_err(StatusError::Query)?;
    let status: AgentStatus = serde_json::from_str(&json)?;
    Ok(Resolution::Versioned {
        path: settings.versioned_ctl_path(&status.agent_version),
        version: status.agent_version,
    })
}

/// Tier 2: scanner path next to the first running UI process.
pub fn from_ui_process<P: ProcessSource + ?Sized>(
    processes: &P,
    settings: &Settings,
) -> Result<Resolution, FallbackError> {
    let ui_paths = image_paths_named(processes, settings.ui_image);
    let candidates = ui_paths.len();
    let ui_path = ui_paths
        .into_iter()
        .next()
        .ok_or_else(|| FallbackError::NoUiProcess(settings.ui_image.to_string()))?;

    if candidates > 1 {
        warn!(
            "usb_scan: {candidates} {} processes running, using {ui_path}",
            settings.ui_image
        );
    }

    Ok(Resolution::UiProcess {
        path: PathBuf::from(ui_path.replace(settings.ui_image, settings.ctl_image)),
        ui_path,
        candidates,
    })
}

/// Resolve the scanner path, falling back to tier 2 on any tier 1 failure.
pub fn resolve_ctl_path<S, P>(
    status: &S,
    processes: &P,
    settings: &Settings,
) -> Result<Resolution, ResolveError>
where
    S: AgentStatusSource + ?Sized,
    P: ProcessSource + ?Sized,
{
    let status_err = match from_agent_status(status, settings) {
        Ok(resolution) => return Ok(resolution),
        Err(e) => e,
    };
    debug!("usb_scan: agent status unavailable, falling back to UI process: {status_err}");

    from_ui_process(processes, settings).map_err(|fallback| ResolveError {
        status: status_err,
        fallback,
    })
}

/// Log the outcome of [`resolve_ctl_path`] and warn if the file is missing.
pub fn log_resolution(resolution: &Resolution) {
    info!(
        "usb_scan: using {} (via {})",
        resolution.path().display(),
        resolution.tier()
    );
    if !resolution.path().exists() {
        warn!(
            "usb_scan: {} does not exist, scans will fail",
            resolution.path().display()
        );
    }
}
