// file: src/network/transport.rs
// version: 1.0.0
// guid: a0e47c2b-83f1-4d69-b5a8-f2c6d09e1734

//! Remote command transport primitives

use crate::error::BootstrapError;
use crate::Result;
use std::path::Path;

/// Where and as whom a command is sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub address: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
}

impl Connection {
    pub fn new(address: impl Into<String>, port: u16, user: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            port,
            user: user.into(),
            password: None,
        }
    }

    pub fn with_password(mut self, password: Option<String>) -> Self {
        self.password = password.filter(|p| !p.is_empty());
        self
    }
}

/// Trait for executing commands and copying files on a target host
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Execute command and return its stdout. A non-zero exit is a
    /// `RemoteCommandError`; connection problems are `TransportError`.
    async fn execute(&self, conn: &Connection, command: &str) -> Result<String>;

    /// Copy a local file to the target host
    async fn transfer(&self, conn: &Connection, local_path: &Path, remote_path: &str) -> Result<()>;

    /// Execute a command intended as a boolean check.
    /// Returns Ok(true) on exit 0, Ok(false) on non-zero, Err on transport issues.
    async fn probe(&self, conn: &Connection, command: &str) -> Result<bool> {
        match self.execute(conn, command).await {
            Ok(_) => Ok(true),
            Err(BootstrapError::RemoteCommandError { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Quote a string for use as a single POSIX shell word
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("kubeadm reset -f"), "'kubeadm reset -f'");
        assert_eq!(shell_quote("echo 'hi'"), r"'echo '\''hi'\'''");
        assert_eq!(shell_quote(""), "''");
    }

    #[test]
    fn test_empty_password_is_unset() {
        let conn = Connection::new("10.0.0.1", 22, "root").with_password(Some(String::new()));
        assert!(conn.password.is_none());
    }
}
