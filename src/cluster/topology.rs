// file: src/cluster/topology.rs
// version: 1.0.0
// guid: 1a6d8e3f-5c27-4b90-8e4d-b3f0a7c5e912

//! Host classification into overlapping role groups

use super::privilege::{negotiate_privilege, Escalation};
use crate::cluster::join::redact_join_secrets;
use crate::config::{BootstrapDefaults, ClusterSpec, NodeSpec, Role};
use crate::error::BootstrapError;
use crate::network::transport::{Connection, Transport};
use crate::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// A declared node plus what was learned about it during this run
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedNode {
    #[serde(skip)]
    pub spec: NodeSpec,
    #[serde(skip)]
    pub connection: Connection,
    pub address: String,
    pub hostname: Option<String>,
    pub is_etcd: bool,
    pub is_control_plane: bool,
    pub is_worker: bool,
    pub escalation: Escalation,
}

impl ResolvedNode {
    pub fn new(spec: NodeSpec, defaults: &BootstrapDefaults, escalation: Escalation) -> Self {
        let connection = Self::connection_for(&spec, defaults);

        Self {
            address: connection.address.clone(),
            hostname: spec.hostname().map(str::to_string),
            is_etcd: spec.has_role(Role::Etcd),
            is_control_plane: spec.has_role(Role::Master),
            is_worker: spec.has_role(Role::Worker),
            spec,
            connection,
            escalation,
        }
    }

    fn connection_for(spec: &NodeSpec, defaults: &BootstrapDefaults) -> Connection {
        Connection::new(
            spec.address.trim(),
            spec.ssh_port(defaults),
            spec.ssh_user(defaults),
        )
        .with_password(spec.password.clone())
    }

    pub fn is_kubernetes(&self) -> bool {
        self.is_control_plane || self.is_worker
    }

    /// Command text as sent, wrapped with the negotiated escalation prefix
    pub fn privileged(&self, command: &str) -> String {
        self.escalation.wrap(command)
    }

    /// Run a command as root on this node
    pub async fn execute(&self, transport: &dyn Transport, command: &str) -> Result<String> {
        debug!("{}: {}", self.address, redact_join_secrets(command));

        transport
            .execute(&self.connection, &self.privileged(command))
            .await
            .map_err(|e| match e {
                BootstrapError::RemoteCommandError {
                    host,
                    exit_code,
                    output,
                    ..
                } => BootstrapError::RemoteCommandError {
                    host,
                    command: redact_join_secrets(command),
                    exit_code,
                    output,
                },
                other => other,
            })
    }
}

/// Named views over the resolved nodes. A node may appear in several.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoleGroups {
    pub all: Vec<ResolvedNode>,
    pub etcd: Vec<ResolvedNode>,
    pub control_plane: Vec<ResolvedNode>,
    pub worker: Vec<ResolvedNode>,
    /// Control-plane and worker nodes, each once
    pub kubernetes: Vec<ResolvedNode>,
}

/// Group selector used by the fan-out commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostGroup {
    All,
    Etcd,
    ControlPlane,
    Worker,
    Kubernetes,
}

impl RoleGroups {
    /// Build groups from already-resolved nodes, keeping declaration order
    pub fn from_nodes(nodes: Vec<ResolvedNode>) -> Self {
        let mut groups = RoleGroups::default();

        for node in nodes {
            if node.is_etcd {
                groups.etcd.push(node.clone());
            }
            if node.is_control_plane {
                groups.control_plane.push(node.clone());
            }
            if node.is_worker {
                groups.worker.push(node.clone());
            }
            if node.is_kubernetes() {
                groups.kubernetes.push(node.clone());
            }
            groups.all.push(node);
        }

        groups
    }

    pub fn get(&self, group: HostGroup) -> &[ResolvedNode] {
        match group {
            HostGroup::All => &self.all,
            HostGroup::Etcd => &self.etcd,
            HostGroup::ControlPlane => &self.control_plane,
            HostGroup::Worker => &self.worker,
            HostGroup::Kubernetes => &self.kubernetes,
        }
    }

    pub fn first_control_plane(&self) -> Option<&ResolvedNode> {
        self.control_plane.first()
    }
}

/// Negotiate privilege for every host (concurrently, once each) and
/// classify them into role groups. Any negotiation failure aborts.
pub async fn group_hosts(
    transport: Arc<dyn Transport>,
    cluster: &ClusterSpec,
    defaults: &BootstrapDefaults,
) -> Result<RoleGroups> {
    let handles: Vec<_> = cluster
        .hosts
        .iter()
        .map(|spec| {
            let transport = Arc::clone(&transport);
            let connection = ResolvedNode::connection_for(spec, defaults);
            tokio::spawn(async move {
                negotiate_privilege(transport.as_ref(), &connection).await
            })
        })
        .collect();

    let mut nodes = Vec::with_capacity(handles.len());
    let mut pending = cluster.hosts.iter().zip(handles);
    while let Some((spec, handle)) = pending.next() {
        let negotiated = handle
            .await
            .map_err(|e| BootstrapError::TaskError {
                host: spec.address.clone(),
                message: e.to_string(),
            })
            .and_then(|result| result);

        match negotiated {
            Ok(escalation) => nodes.push(ResolvedNode::new(spec.clone(), defaults, escalation)),
            Err(e) => {
                // No partial topology: stop probing the hosts still in flight.
                for (_, handle) in pending {
                    handle.abort();
                }
                return Err(e);
            }
        }
    }

    let groups = RoleGroups::from_nodes(nodes);
    info!(
        "Resolved {} hosts: {} etcd, {} control-plane, {} worker",
        groups.all.len(),
        groups.etcd.len(),
        groups.control_plane.len(),
        groups.worker.len()
    );

    Ok(groups)
}
