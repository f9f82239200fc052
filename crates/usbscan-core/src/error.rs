/// Error type shared by the core crate.
use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The device-control payload was not a valid event record.
    #[error("malformed device event: {0}")]
    Payload(#[from] serde_json::Error),

    /// The scanner executable could not be started at all.
    #[error("failed to run {} {args}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        args: String,
        #[source]
        source: std::io::Error,
    },

    /// The scanner ran but exited unsuccessfully. `code` is `None` when the
    /// process was terminated without an exit status.
    #[error("{} {args} exited with {code:?}: {stdout}", .program.display())]
    CommandFailed {
        program: PathBuf,
        args: String,
        code: Option<i32>,
        stdout: String,
    },

    #[error("log file {}: {source}", .path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}
