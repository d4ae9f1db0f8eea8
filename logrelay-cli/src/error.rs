//! CLI-specific error types and exit code mapping

use logrelay_core::error::{LogRelayError, StoreError};
use logrelay_router::LogRouterError;

/// CLI-specific error type.
///
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// The backing store could not be reached or rejected a command.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Pattern record failed validation or could not be parsed.
    #[error("pattern error: {0}")]
    Pattern(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from logrelay-core.
    #[error("{0}")]
    Core(#[from] LogRelayError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                         |
    /// |------|---------------------------------|
    /// | 0    | Success                         |
    /// | 1    | General / command error         |
    /// | 2    | Configuration error             |
    /// | 3    | Store unreachable               |
    /// | 4    | Pattern record rejected         |
    /// | 10   | IO error                        |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Core(LogRelayError::Config(_)) => 2,
            Self::StoreUnavailable(_) | Self::Core(LogRelayError::Store(_)) => 3,
            Self::Pattern(_) => 4,
            Self::Io(_) => 10,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Core(_) => 1,
        }
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        Self::StoreUnavailable(e.to_string())
    }
}

impl From<LogRouterError> for CliError {
    fn from(e: LogRouterError) -> Self {
        match e {
            LogRouterError::Store(store) => Self::StoreUnavailable(store.to_string()),
            LogRouterError::Config { .. } => Self::Config(e.to_string()),
            other => Self::Pattern(other.to_string()),
        }
    }
}
