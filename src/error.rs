// file: src/error.rs
// version: 3.0.0
// guid: 0c6f2a9e-41d7-4b83-9a55-7d0e3b6c1f24

use thiserror::Error;

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, BootstrapError>;

/// Error types for cluster bootstrap orchestration
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Privilege escalation failed on {host}: {message}")]
    PrivilegeError { host: String, message: String },

    #[error("Transport error on {host}: {message}")]
    TransportError { host: String, message: String },

    #[error("Command failed on {host} (exit code {exit_code:?}): {command}\n{output}")]
    RemoteCommandError {
        host: String,
        command: String,
        exit_code: Option<i32>,
        output: String,
    },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Task error on {host}: {message}")]
    TaskError { host: String, message: String },

    #[error("Fan-out failed on {failed} of {total} hosts:\n{details}")]
    FanOutError {
        failed: usize,
        total: usize,
        details: String,
    },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl BootstrapError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a new parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    pub fn privilege(host: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::PrivilegeError {
            host: host.into(),
            message: msg.into(),
        }
    }

    pub fn transport(host: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::TransportError {
            host: host.into(),
            message: msg.into(),
        }
    }

    /// Host the error is attributed to, if any
    pub fn host(&self) -> Option<&str> {
        match self {
            Self::PrivilegeError { host, .. }
            | Self::TransportError { host, .. }
            | Self::RemoteCommandError { host, .. }
            | Self::TaskError { host, .. } => Some(host),
            _ => None,
        }
    }
}
