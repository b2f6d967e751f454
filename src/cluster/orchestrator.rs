// file: src/cluster/orchestrator.rs
// version: 1.0.0
// guid: c0f8a2d6-4e39-4b71-85ca-7b1e9d3f6a20

//! Orchestration driver: the decision point for every phase's errors

use super::join::{derive_join_commands, JoinCommands};
use super::synthesizer::{BootstrapParameters, ConfigSynthesizer};
use super::topology::{group_hosts, HostGroup, ResolvedNode, RoleGroups};
use crate::config::{BootstrapDefaults, ClusterSpec};
use crate::error::BootstrapError;
use crate::logging::with_async_operation_span;
use crate::network::executor::FanOutExecutor;
use crate::network::transport::Transport;
use crate::reporter::FanOutReport;
use crate::utils::fs::exists;
use crate::Result;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Resolved topology together with the synthesized parameters
#[derive(Debug, Serialize)]
pub struct ClusterPlan {
    pub groups: RoleGroups,
    pub parameters: BootstrapParameters,
}

pub struct Orchestrator {
    cluster: ClusterSpec,
    synthesizer: ConfigSynthesizer,
    executor: FanOutExecutor,
}

impl Orchestrator {
    pub fn new(transport: Arc<dyn Transport>, cluster: ClusterSpec, defaults: BootstrapDefaults) -> Self {
        Self::with_synthesizer(transport, cluster, ConfigSynthesizer::new(defaults))
    }

    pub fn with_synthesizer(
        transport: Arc<dyn Transport>,
        cluster: ClusterSpec,
        synthesizer: ConfigSynthesizer,
    ) -> Self {
        Self {
            cluster,
            synthesizer,
            executor: FanOutExecutor::new(transport),
        }
    }

    pub fn cluster(&self) -> &ClusterSpec {
        &self.cluster
    }

    pub fn synthesizer(&self) -> &ConfigSynthesizer {
        &self.synthesizer
    }

    fn defaults(&self) -> &BootstrapDefaults {
        self.synthesizer.defaults()
    }

    /// Negotiate privilege on every host and build the role groups.
    /// Runs afresh on every call.
    pub async fn resolve(&self) -> Result<RoleGroups> {
        self.cluster.validate()?;
        group_hosts(
            Arc::clone(self.executor.transport()),
            &self.cluster,
            self.defaults(),
        )
        .await
    }

    pub fn bootstrap_parameters(&self) -> Result<BootstrapParameters> {
        self.synthesizer.synthesize(&self.cluster)
    }

    pub async fn plan(&self) -> Result<ClusterPlan> {
        let parameters = self.bootstrap_parameters()?;
        let groups = self.resolve().await?;
        Ok(ClusterPlan { groups, parameters })
    }

    /// Run a privileged command on one host group
    pub async fn run(&self, group: HostGroup, command: &str) -> Result<FanOutReport> {
        let groups = self.resolve().await?;
        Ok(self.executor.run_all(groups.get(group), command).await)
    }

    /// Push a staged local artifact to one host group
    pub async fn push_artifact(&self, group: HostGroup, local_path: &Path, remote_path: &str) -> Result<FanOutReport> {
        if !exists(local_path) {
            return Err(BootstrapError::config(format!(
                "Local artifact not found: {}",
                local_path.display()
            )));
        }

        let groups = self.resolve().await?;
        Ok(self
            .executor
            .push_all(groups.get(group), local_path, remote_path)
            .await)
    }

    /// Rewrite the managed `/etc/hosts` block on every node
    pub async fn sync_hosts(&self) -> Result<FanOutReport> {
        let groups = self.resolve().await?;
        let command = self.synthesizer.hosts_sync_command(&self.cluster);

        Ok(self
            .executor
            .run_each("sync /etc/hosts", &groups.all, |_| command.clone())
            .await)
    }

    /// Derive join commands on the first control-plane node
    pub async fn join_commands(&self, groups: &RoleGroups) -> Result<(ResolvedNode, JoinCommands)> {
        let master = groups
            .first_control_plane()
            .ok_or_else(|| BootstrapError::config("No control-plane host declared"))?
            .clone();

        let commands = derive_join_commands(
            self.executor.transport().as_ref(),
            &master,
            &self.defaults().kubeadm_path,
        )
        .await?;

        Ok((master, commands))
    }

    /// Join every other Kubernetes node to the cluster initialized on the
    /// first control-plane node
    pub async fn scale(&self) -> Result<FanOutReport> {
        with_async_operation_span("scale", move || self.join_remaining_nodes()).await
    }

    async fn join_remaining_nodes(&self) -> Result<FanOutReport> {
        let groups = self.resolve().await?;
        let (master, commands) = self.join_commands(&groups).await?;

        let targets: Vec<ResolvedNode> = groups
            .kubernetes
            .iter()
            .filter(|node| node.address != master.address)
            .cloned()
            .collect();

        if targets.is_empty() {
            warn!("No nodes to join besides {}", master.address);
            return Ok(FanOutReport::new("join", Vec::new()));
        }

        info!(
            "Joining {} nodes to the control plane on {}",
            targets.len(),
            master.address
        );

        Ok(self
            .executor
            .run_each("join", &targets, |node| {
                if node.is_control_plane {
                    commands.control_plane.clone()
                } else {
                    commands.worker.clone()
                }
            })
            .await)
    }
}
