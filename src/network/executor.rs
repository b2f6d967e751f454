// file: src/network/executor.rs
// version: 2.0.0
// guid: 72c8e1a4-0d5f-4b36-8e92-a4f7b3c0d615

//! Concurrent fan-out of commands and file pushes across hosts

use super::transport::Transport;
use crate::cluster::topology::ResolvedNode;
use crate::error::BootstrapError;
use crate::reporter::{ExecutionResult, FanOutReport};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Dispatches one task per host and waits for all of them. Failures are
/// recorded per host; nothing short-circuits and nothing is retried.
#[derive(Clone)]
pub struct FanOutExecutor {
    transport: Arc<dyn Transport>,
}

impl FanOutExecutor {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Run the same privileged command on every host
    pub async fn run_all(&self, hosts: &[ResolvedNode], command: &str) -> FanOutReport {
        self.run_each(command, hosts, |_| command.to_string()).await
    }

    /// Run a per-host privileged command on every host
    pub async fn run_each<F>(&self, operation: &str, hosts: &[ResolvedNode], command_for: F) -> FanOutReport
    where
        F: Fn(&ResolvedNode) -> String,
    {
        let handles: Vec<JoinHandle<ExecutionResult>> = hosts
            .iter()
            .map(|node| {
                let transport = Arc::clone(&self.transport);
                let node = node.clone();
                let command = command_for(&node);
                tokio::spawn(async move {
                    match node.execute(transport.as_ref(), &command).await {
                        Ok(output) => {
                            log_output(&node.address, &output);
                            ExecutionResult::success(&node.address, Some(output))
                        }
                        Err(e) => {
                            error!("[{}] {}", node.address, e);
                            ExecutionResult::failure(&node.address, e)
                        }
                    }
                })
            })
            .collect();

        FanOutReport::new(operation, join_in_order(hosts, handles).await)
    }

    /// Copy a local file to the same remote path on every host
    pub async fn push_all(&self, hosts: &[ResolvedNode], local_path: &Path, remote_path: &str) -> FanOutReport {
        let handles: Vec<JoinHandle<ExecutionResult>> = hosts
            .iter()
            .map(|node| {
                let transport = Arc::clone(&self.transport);
                let node = node.clone();
                let local_path: PathBuf = local_path.to_path_buf();
                let remote_path = remote_path.to_string();
                tokio::spawn(async move {
                    match transport
                        .transfer(&node.connection, &local_path, &remote_path)
                        .await
                    {
                        Ok(()) => {
                            info!("[{}] pushed {}", node.address, remote_path);
                            ExecutionResult::success(&node.address, None)
                        }
                        Err(e) => {
                            error!("[{}] {}", node.address, e);
                            ExecutionResult::failure(&node.address, e)
                        }
                    }
                })
            })
            .collect();

        FanOutReport::new(
            format!("push {}", remote_path),
            join_in_order(hosts, handles).await,
        )
    }
}

/// Barrier: await every task, keeping input order regardless of completion order
async fn join_in_order(hosts: &[ResolvedNode], handles: Vec<JoinHandle<ExecutionResult>>) -> Vec<ExecutionResult> {
    let mut results = Vec::with_capacity(handles.len());

    for (node, handle) in hosts.iter().zip(handles) {
        let result = handle.await.unwrap_or_else(|e| {
            ExecutionResult::failure(
                &node.address,
                BootstrapError::TaskError {
                    host: node.address.clone(),
                    message: e.to_string(),
                },
            )
        });
        results.push(result);
    }

    results
}

fn log_output(host: &str, output: &str) {
    let output = output.trim_end();
    if output.is_empty() {
        info!("[{}] done", host);
        return;
    }

    for line in output.lines() {
        info!("[{}] {}", host, line);
    }
}
