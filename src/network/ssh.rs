// file: src/network/ssh.rs
// version: 2.0.0
// guid: 4b9d1e70-c6a2-4f83-9e15-0d7a3b8c62f9

//! SSH transport for remote bootstrap operations

use super::transport::{Connection, Transport};
use crate::error::BootstrapError;
use crate::Result;
use ssh2::{ExtendedData, Session};
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// SSH transport. Each call opens its own session so concurrent calls
/// against different hosts share nothing.
#[derive(Debug, Clone)]
pub struct SshTransport {
    connect_timeout: Duration,
}

impl SshTransport {
    /// Create a new SSH transport
    pub fn new() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Connect, handshake and authenticate
    fn open_session(conn: &Connection, timeout: Duration) -> Result<Session> {
        let host = conn.address.as_str();
        let addr = (host, conn.port)
            .to_socket_addrs()
            .map_err(|e| BootstrapError::transport(host, format!("Failed to resolve: {}", e)))?
            .next()
            .ok_or_else(|| BootstrapError::transport(host, "No address resolved"))?;

        let tcp = TcpStream::connect_timeout(&addr, timeout).map_err(|e| {
            BootstrapError::transport(host, format!("Failed to connect to port {}: {}", conn.port, e))
        })?;

        let mut session = Session::new().map_err(|e| {
            BootstrapError::transport(host, format!("Failed to create SSH session: {}", e))
        })?;

        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| BootstrapError::transport(host, format!("SSH handshake failed: {}", e)))?;

        match &conn.password {
            Some(password) => session
                .userauth_password(&conn.user, password)
                .map_err(|e| {
                    BootstrapError::transport(
                        host,
                        format!("Password authentication failed for {}: {}", conn.user, e),
                    )
                })?,
            None => session.userauth_agent(&conn.user).map_err(|e| {
                BootstrapError::transport(
                    host,
                    format!("Agent authentication failed for {}: {}", conn.user, e),
                )
            })?,
        }

        if !session.authenticated() {
            return Err(BootstrapError::transport(host, "SSH authentication failed"));
        }

        Ok(session)
    }

    fn execute_blocking(conn: &Connection, command: &str, timeout: Duration) -> Result<String> {
        let host = conn.address.as_str();
        let session = Self::open_session(conn, timeout)?;

        let mut channel = session.channel_session().map_err(|e| {
            BootstrapError::transport(host, format!("Failed to create SSH channel: {}", e))
        })?;

        // Merge stderr into stdout so a single read drains both.
        channel.handle_extended_data(ExtendedData::Merge).map_err(|e| {
            BootstrapError::transport(host, format!("Failed to merge stderr: {}", e))
        })?;

        channel
            .exec(command)
            .map_err(|e| BootstrapError::transport(host, format!("Failed to execute command: {}", e)))?;

        let mut output = String::new();
        channel
            .read_to_string(&mut output)
            .map_err(|e| BootstrapError::transport(host, format!("Failed to read output: {}", e)))?;

        channel.wait_close().map_err(|e| {
            BootstrapError::transport(host, format!("Failed to close SSH channel: {}", e))
        })?;

        let exit_status = channel.exit_status().map_err(|e| {
            BootstrapError::transport(host, format!("Failed to get exit status: {}", e))
        })?;

        let _ = session.disconnect(None, "", None);

        command_outcome(host, command, exit_status, output)
    }

    fn upload_blocking(
        conn: &Connection,
        local_path: &Path,
        remote_path: &str,
        timeout: Duration,
    ) -> Result<()> {
        let host = conn.address.as_str();
        let file_content = std::fs::read(local_path)?;
        let session = Self::open_session(conn, timeout)?;

        let mut remote_file = session
            .scp_send(
                Path::new(remote_path),
                0o644,
                file_content.len() as u64,
                None,
            )
            .map_err(|e| {
                BootstrapError::transport(host, format!("Failed to create SCP channel: {}", e))
            })?;

        remote_file
            .write_all(&file_content)
            .map_err(|e| BootstrapError::transport(host, format!("Failed to write file data: {}", e)))?;
        remote_file
            .send_eof()
            .map_err(|e| BootstrapError::transport(host, format!("Failed to send EOF: {}", e)))?;
        remote_file
            .wait_eof()
            .map_err(|e| BootstrapError::transport(host, format!("Failed to wait for EOF: {}", e)))?;
        remote_file.close().map_err(|e| {
            BootstrapError::transport(host, format!("Failed to close remote file: {}", e))
        })?;
        remote_file
            .wait_close()
            .map_err(|e| BootstrapError::transport(host, format!("Failed to wait for close: {}", e)))?;

        let _ = session.disconnect(None, "", None);
        Ok(())
    }
}

/// Map a finished command to its output, or to a failure carrying the
/// combined output when the exit status is non-zero
fn command_outcome(host: &str, command: &str, exit_status: i32, output: String) -> Result<String> {
    if exit_status != 0 {
        return Err(BootstrapError::RemoteCommandError {
            host: host.to_string(),
            command: command.to_string(),
            exit_code: Some(exit_status),
            output,
        });
    }

    Ok(output)
}

#[async_trait::async_trait]
impl Transport for SshTransport {
    async fn execute(&self, conn: &Connection, command: &str) -> Result<String> {
        let conn = conn.clone();
        let command = command.to_string();
        let timeout = self.connect_timeout;
        let host = conn.address.clone();

        let output = tokio::task::spawn_blocking(move || {
            Self::execute_blocking(&conn, &command, timeout)
        })
        .await
        .map_err(|e| BootstrapError::TaskError {
            host,
            message: e.to_string(),
        })??;

        debug!("Command output: {} bytes", output.len());
        Ok(output)
    }

    async fn transfer(&self, conn: &Connection, local_path: &Path, remote_path: &str) -> Result<()> {
        info!(
            "Uploading {} to {}:{}",
            local_path.display(),
            conn.address,
            remote_path
        );

        let conn = conn.clone();
        let local_path = local_path.to_path_buf();
        let remote_path = remote_path.to_string();
        let timeout = self.connect_timeout;
        let host = conn.address.clone();

        tokio::task::spawn_blocking(move || {
            Self::upload_blocking(&conn, &local_path, &remote_path, timeout)
        })
        .await
        .map_err(|e| BootstrapError::TaskError {
            host,
            message: e.to_string(),
        })??;

        info!("File upload completed");
        Ok(())
    }
}

impl Default for SshTransport {
    fn default() -> Self {
        Self::new()
    }
}
