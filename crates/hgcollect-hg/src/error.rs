use std::fmt;
use std::process::ExitStatus;
use std::time::Duration;

/// Result type for hgcollect-hg operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while invoking `hg log`
#[derive(Debug)]
pub enum Error {
    /// The binary could not be located or started
    Spawn {
        program: String,
        source: std::io::Error,
    },

    /// The command ran but exited non-zero
    Exit { status: ExitStatus, stderr: String },

    /// The command outlived its deadline and was killed
    Timeout { limit: Duration, stderr: String },

    /// IO failure while driving the subprocess
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Spawn { program, source } => {
                write!(f, "failed to start {}: {}", program, source)
            }
            Error::Exit { status, stderr } => {
                write!(f, "hg exited with {}: {}", status, stderr.trim())
            }
            Error::Timeout { limit, stderr } => {
                write!(
                    f,
                    "hg exceeded the {}s deadline and was killed: {}",
                    limit.as_secs(),
                    stderr.trim()
                )
            }
            Error::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Spawn { source, .. } => Some(source),
            Error::Io(err) => Some(err),
            Error::Exit { .. } | Error::Timeout { .. } => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}
