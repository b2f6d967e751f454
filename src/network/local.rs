// file: src/network/local.rs
// version: 2.0.0
// guid: d27f6a84-1e3c-4b97-8a05-6c9b2e4f0d18

//! Local command execution for single-machine clusters

use super::transport::{Connection, Transport};
use crate::error::BootstrapError;
use crate::Result;
use std::path::Path;
use tokio::process::Command;
use tracing::info;

/// Transport that runs every command on this machine, ignoring the
/// connection address. Mimics the SSH transport's error reporting.
#[derive(Debug, Clone, Default)]
pub struct LocalTransport;

impl LocalTransport {
    /// Create a new local transport
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Transport for LocalTransport {
    async fn execute(&self, conn: &Connection, command: &str) -> Result<String> {
        let output = Command::new("bash")
            .arg("-c")
            .arg(command)
            .output()
            .await
            .map_err(|e| {
                BootstrapError::transport(&conn.address, format!("Failed to spawn bash: {}", e))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            return Err(BootstrapError::RemoteCommandError {
                host: conn.address.clone(),
                command: command.to_string(),
                exit_code: output.status.code(),
                output: if stderr.trim().is_empty() { stdout } else { stderr },
            });
        }

        Ok(stdout)
    }

    async fn transfer(&self, conn: &Connection, local_path: &Path, remote_path: &str) -> Result<()> {
        info!(
            "Local mode: copying {} to {}",
            local_path.display(),
            remote_path
        );

        tokio::fs::copy(local_path, remote_path).await.map_err(|e| {
            BootstrapError::transport(
                &conn.address,
                format!("Failed to copy {}: {}", local_path.display(), e),
            )
        })?;

        Ok(())
    }
}
