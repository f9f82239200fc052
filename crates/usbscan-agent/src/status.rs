/// Agent status document from the helper object.
///
/// Creating the helper fails with "access denied" unless the process is
/// elevated; the resolver then falls back to the UI-process lookup.
use usbscan_core::resolver::{AgentStatusSource, BoxError};

/// `GetAgentStatusJSON` on the helper registered under `prog_id`.
#[derive(Debug, Clone, Copy)]
pub struct HelperStatus {
    prog_id: &'static str,
}

impl HelperStatus {
    pub fn new(prog_id: &'static str) -> Self {
        Self { prog_id }
    }
}

impl AgentStatusSource for HelperStatus {
    #[cfg(windows)]
    fn agent_status_json(&self) -> Result<String, BoxError> {
        let (_, helper) = crate::com::create_object(self.prog_id)?;
        let json = crate::com::call_string_method(&helper, "GetAgentStatusJSON")?;
        tracing::debug!("usb_scan: {} returned {} bytes of status", self.prog_id, json.len());
        Ok(json)
    }

    #[cfg(not(windows))]
    fn agent_status_json(&self) -> Result<String, BoxError> {
        let _ = self.prog_id;
        Err(crate::AgentError::Unsupported.into())
    }
}
