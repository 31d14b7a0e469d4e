//! Error and exit code types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by selection, configuration and watching.
#[derive(Debug, Error)]
pub enum Error {
    /// A path pattern or regex-valued config entry failed to compile.
    #[error("invalid pattern /{pattern}/: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Configuration file missing required structure or holding bad values.
    #[error("config error: {message}")]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    /// File I/O error.
    #[error("io error: {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the run report failed.
    #[error("failed to write report: {0}")]
    Report(#[source] std::io::Error),

    /// The import query could not be built for a grammar.
    #[error("import query error: {0}")]
    Query(String),

    /// File watcher could not be started.
    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),
}

impl Error {
    pub(crate) fn config(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Config { message: message.into(), path }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

/// Result type using the crate `Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Every executed test file passed.
    Success = 0,
    /// A test file failed or errored, or nothing was selected.
    TestsFailed = 1,
    /// Bad pattern, config or argument.
    ConfigError = 2,
    /// Anything else.
    InternalError = 3,
    /// The run was cancelled before every file was dispatched.
    Interrupted = 130,
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::InvalidPattern { .. } | Error::Config { .. } => ExitCode::ConfigError,
            Error::Io { .. } | Error::Report(_) | Error::Query(_) | Error::Watch(_) => {
                ExitCode::InternalError
            }
        }
    }
}
