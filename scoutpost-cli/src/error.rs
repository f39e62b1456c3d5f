//! CLI-specific error types and exit code mapping

use scoutpost_core::error::ScoutpostError;
use scoutpost_core::types::Severity;
use scoutpost_engine::EngineClientError;
use scoutpost_scout::ScoutError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// The engine daemon or a scan precondition is not available.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The scan found vulnerabilities at or above the `--fail-on` threshold.
    #[error("found {count} vulnerabilities at or above {threshold}")]
    VulnerabilitiesFound { count: usize, threshold: Severity },

    /// Container engine API error.
    #[error("engine error: {0}")]
    Engine(String),

    /// Scan pipeline error.
    #[error("scan error: {0}")]
    Scan(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from scoutpost-core.
    #[error("{0}")]
    Core(ScoutpostError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                   |
    /// |------|-------------------------------------------|
    /// | 0    | Success                                   |
    /// | 1    | General / command error                   |
    /// | 2    | Configuration error                       |
    /// | 3    | Engine unreachable or precondition unmet  |
    /// | 4    | Vulnerabilities at or above `--fail-on`   |
    /// | 10   | IO error                                  |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Unavailable(_) => 3,
            Self::VulnerabilitiesFound { .. } => 4,
            Self::Io(_) => 10,
            Self::Command(_)
            | Self::Engine(_)
            | Self::Scan(_)
            | Self::JsonSerialize(_)
            | Self::Core(_) => 1,
        }
    }
}

impl From<ScoutpostError> for CliError {
    fn from(e: ScoutpostError) -> Self {
        match e {
            ScoutpostError::Config(inner) => Self::Config(inner.to_string()),
            ScoutpostError::Io(inner) => Self::Io(inner),
            other => Self::Core(other),
        }
    }
}

impl From<ScoutError> for CliError {
    fn from(e: ScoutError) -> Self {
        match e {
            ScoutError::PreconditionUnavailable(precondition) => Self::Unavailable(format!(
                "{precondition} ({})",
                precondition.suggestion()
            )),
            ScoutError::Config { .. } => Self::Config(e.to_string()),
            ScoutError::InvalidInvocation(_) => Self::Command(e.to_string()),
            other => Self::Scan(other.to_string()),
        }
    }
}

impl From<EngineClientError> for CliError {
    fn from(e: EngineClientError) -> Self {
        match e {
            EngineClientError::Connection(_) => Self::Unavailable(e.to_string()),
            EngineClientError::Config { .. } => Self::Config(e.to_string()),
            other => Self::Engine(other.to_string()),
        }
    }
}
