/// Errors raised while talking to the agent's COM server.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[cfg(windows)]
    #[error("COM call failed: {0}")]
    Com(#[from] windows::core::Error),

    /// The agent object carries no type information for its events.
    #[error("{0} exposes no type library")]
    NoTypeLibrary(String),

    /// The agent's coclass declares no default source interface.
    #[error("{0} declares no default event interface")]
    NoSourceInterface(String),

    #[error("the SentinelOne agent COM server is only available on Windows")]
    Unsupported,
}
