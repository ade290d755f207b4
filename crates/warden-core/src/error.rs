//! Error handling for warden
//!
//! Domain error types with exit code mapping. The dispatcher itself never
//! surfaces errors through the process exit code (verdicts travel in the JSON
//! response body); `ExitCode` covers CLI-level failures such as unusable
//! arguments or an unreadable stdin stream.

use thiserror::Error;

/// Convenient result alias for warden operations.
pub type Result<T> = std::result::Result<T, WardenError>;

/// Result specialized for configuration loading.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Root error type for all warden operations.
#[derive(Error, Debug)]
pub enum WardenError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Security rule error: {0}")]
    Security(#[from] SecurityError),

    #[error("Git operation failed: {0}")]
    Git(#[from] GitError),

    #[error("JSON processing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML processing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Operation timeout: {operation} took longer than {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    /// Wraps arbitrary errors from external libraries
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Standard exit codes for the `warden` binary.
///
/// A functioning dispatcher always exits with [`ExitCode::Success`]; the
/// remaining codes only appear when the runner itself cannot operate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    ConfigError = 3,
    TimeoutError = 5,
    InternalError = 99,
}

impl From<&WardenError> for ExitCode {
    fn from(error: &WardenError) -> Self {
        match error {
            WardenError::Config(_) => ExitCode::ConfigError,
            WardenError::Timeout { .. } => ExitCode::TimeoutError,
            WardenError::Anyhow(_) => ExitCode::InternalError,
            _ => ExitCode::GeneralError,
        }
    }
}

/// Configuration-related errors with specific variants
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid configuration format: {reason}")]
    InvalidFormat { reason: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    Other(String),
}

/// Security rule loading and evaluation errors
#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("Invalid rule at {location}: {reason}")]
    InvalidRule { location: String, reason: String },

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidGlob { pattern: String, reason: String },

    #[error("{0}")]
    Other(String),
}

/// Git subprocess errors raised during worktree detection
#[derive(Debug, Error)]
pub enum GitError {
    #[error("git executable not found")]
    NotInstalled,

    #[error("git command failed: {stderr}")]
    CommandFailed { stderr: String },

    #[error("Unparseable worktree listing: {reason}")]
    ParseError { reason: String },
}
