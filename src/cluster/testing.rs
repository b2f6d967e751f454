// file: src/cluster/testing.rs
// version: 1.0.0
// guid: f5e2c9a7-3b18-4d04-a6f3-9c71b0e8d254

//! Scripted transport for unit tests

use crate::error::BootstrapError;
use crate::network::transport::{Connection, Transport};
use crate::Result;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

enum Reply {
    Output(String),
    Fail(String),
}

/// Transport answering from rules matched by host (`*` for any) and a
/// command substring. Unmatched commands succeed with empty output.
#[derive(Default)]
pub struct MockTransport {
    rules: Vec<(String, String, Reply)>,
    unreachable: HashSet<String>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<(String, String)>>,
    transfers: Mutex<Vec<(String, PathBuf, String)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, host: &str, needle: &str, output: &str) -> Self {
        self.rules
            .push((host.to_string(), needle.to_string(), Reply::Output(output.to_string())));
        self
    }

    pub fn fail_on(mut self, host: &str, needle: &str) -> Self {
        self.rules.push((
            host.to_string(),
            needle.to_string(),
            Reply::Fail(format!("{}: command failed", needle)),
        ));
        self
    }

    pub fn unreachable(mut self, host: &str) -> Self {
        self.unreachable.insert(host.to_string());
        self
    }

    pub fn delay(mut self, host: &str, millis: u64) -> Self {
        self.delays
            .insert(host.to_string(), Duration::from_millis(millis));
        self
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, host: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|(h, _)| h == host)
            .map(|(_, command)| command)
            .collect()
    }

    pub fn transfers(&self) -> Vec<(String, PathBuf, String)> {
        self.transfers.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn execute(&self, conn: &Connection, command: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((conn.address.clone(), command.to_string()));

        if let Some(delay) = self.delays.get(&conn.address) {
            tokio::time::sleep(*delay).await;
        }

        if self.unreachable.contains(&conn.address) {
            return Err(BootstrapError::transport(&conn.address, "connection refused"));
        }

        let rule = self
            .rules
            .iter()
            .find(|(host, needle, _)| (host == "*" || *host == conn.address) && command.contains(needle.as_str()));

        match rule {
            Some((_, _, Reply::Output(output))) => Ok(output.clone()),
            Some((_, _, Reply::Fail(message))) => Err(BootstrapError::RemoteCommandError {
                host: conn.address.clone(),
                command: command.to_string(),
                exit_code: Some(1),
                output: message.clone(),
            }),
            None => Ok(String::new()),
        }
    }

    async fn transfer(&self, conn: &Connection, local_path: &Path, remote_path: &str) -> Result<()> {
        self.transfers.lock().unwrap().push((
            conn.address.clone(),
            local_path.to_path_buf(),
            remote_path.to_string(),
        ));

        if self.unreachable.contains(&conn.address) {
            return Err(BootstrapError::transport(&conn.address, "connection refused"));
        }

        Ok(())
    }
}
