// file: src/config/cluster.rs
// version: 1.0.0
// guid: e81b5f26-0c4d-47a9-b3e2-6d90a8c5f17b

//! Declarative cluster topology structures

use super::{BootstrapDefaults, Role};
use crate::error::BootstrapError;
use crate::utils::network::NetworkUtils;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Declared cluster: hosts, API load balancer, network and version overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterSpec {
    /// Machines in declaration order
    #[serde(default)]
    pub hosts: Vec<NodeSpec>,
    /// Control-plane endpoint declaration
    #[serde(default)]
    pub lb_kubeapiserver: LbConfig,
    /// Pod network configuration
    #[serde(default)]
    pub network: NetworkConfig,
    /// Kubernetes release, e.g. `v1.17.0`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kube_version: Option<String>,
    /// Image repository override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
}

/// One declared machine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    #[serde(rename = "hostName", default, skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    /// External (SSH) address
    pub address: String,
    /// SSH port, written either as a number or as a quoted string
    #[serde(
        default,
        deserialize_with = "port_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub port: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_address: Option<String>,
    #[serde(default)]
    pub role: Vec<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname_override: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub taints: Vec<Taint>,
}

/// Node taint applied at join time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taint {
    pub key: String,
    #[serde(default)]
    pub value: String,
    pub effect: TaintEffect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaintEffect {
    NoSchedule,
    PreferNoSchedule,
    NoExecute,
}

/// Pod network configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kube_pods_cidr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kube_service_cidr: Option<String>,
}

/// API server load balancer declaration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LbConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(
        default,
        deserialize_with = "port_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub port: Option<String>,
}

/// Treat an empty or whitespace-only string the same as an unset field
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrInt {
    Int(i64),
    Str(String),
}

/// Ports appear both as `22` and `"22"` in cluster files; keep the text
/// and check it in `validate()`
fn port_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<StringOrInt>::deserialize(deserializer)?.map(|value| match value {
        StringOrInt::Int(number) => number.to_string(),
        StringOrInt::Str(text) => text,
    }))
}

/// Parse a configured port, rejecting anything outside 1..=65535
fn parse_port(value: &Option<String>) -> std::result::Result<Option<u16>, String> {
    match non_empty(value) {
        None => Ok(None),
        Some(text) => match text.parse::<u16>() {
            Ok(port) if port > 0 => Ok(Some(port)),
            _ => Err(text.to_string()),
        },
    }
}

impl ClusterSpec {
    /// Validate the cluster configuration before any remote command is issued
    pub fn validate(&self) -> crate::Result<()> {
        for (index, host) in self.hosts.iter().enumerate() {
            host.validate()
                .map_err(|e| BootstrapError::validation(format!("hosts[{}]: {}", index, e)))?;
        }

        if let Some(cidr) = non_empty(&self.network.kube_pods_cidr) {
            NetworkUtils::validate_cidr(cidr)?;
        }
        if let Some(cidr) = non_empty(&self.network.kube_service_cidr) {
            NetworkUtils::validate_cidr(cidr)?;
        }
        if let Some(address) = self.lb_kubeapiserver.address() {
            NetworkUtils::validate_ip_address(address)?;
        }
        if let Err(port) = parse_port(&self.lb_kubeapiserver.port) {
            return Err(BootstrapError::validation(format!(
                "Invalid lb_kubeapiserver port '{}'",
                port
            )));
        }

        if !self.hosts.is_empty() && !self.hosts.iter().any(|h| h.has_role(Role::Master)) {
            return Err(BootstrapError::validation(
                "At least one host must have the master role",
            ));
        }

        Ok(())
    }

    pub fn pod_cidr<'a>(&'a self, defaults: &'a BootstrapDefaults) -> &'a str {
        non_empty(&self.network.kube_pods_cidr).unwrap_or(&defaults.pod_cidr)
    }

    pub fn service_cidr<'a>(&'a self, defaults: &'a BootstrapDefaults) -> &'a str {
        non_empty(&self.network.kube_service_cidr).unwrap_or(&defaults.service_cidr)
    }

    pub fn network_plugin<'a>(&'a self, defaults: &'a BootstrapDefaults) -> &'a str {
        non_empty(&self.network.plugin).unwrap_or(&defaults.network_plugin)
    }

    pub fn kube_version<'a>(&'a self, defaults: &'a BootstrapDefaults) -> &'a str {
        non_empty(&self.kube_version).unwrap_or(&defaults.kube_version)
    }

    pub fn image_repo<'a>(&'a self, defaults: &'a BootstrapDefaults) -> &'a str {
        non_empty(&self.image_repo).unwrap_or(&defaults.image_repo)
    }

    pub fn cluster_name<'a>(&'a self, defaults: &'a BootstrapDefaults) -> &'a str {
        non_empty(&self.cluster_name).unwrap_or(&defaults.cluster_name)
    }
}

impl NodeSpec {
    /// Validate a single host declaration
    pub fn validate(&self) -> crate::Result<()> {
        if self.address.trim().is_empty() {
            return Err(BootstrapError::validation("Host address cannot be empty"));
        }

        if let Err(port) = parse_port(&self.port) {
            return Err(BootstrapError::validation(format!(
                "Invalid SSH port '{}' for {}",
                port,
                self.address.trim()
            )));
        }

        Ok(())
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role.contains(&role)
    }

    /// Node name, preferring the override
    pub fn hostname(&self) -> Option<&str> {
        non_empty(&self.hostname_override).or_else(|| non_empty(&self.host_name))
    }

    pub fn internal_address(&self) -> Option<&str> {
        non_empty(&self.internal_address)
    }

    /// Address used for cluster traffic: internal if set, else external
    pub fn cluster_address(&self) -> &str {
        self.internal_address().unwrap_or(self.address.trim())
    }

    /// Configured SSH port; callers validate first, an invalid value falls back to the default
    pub fn ssh_port(&self, defaults: &BootstrapDefaults) -> u16 {
        parse_port(&self.port)
            .ok()
            .flatten()
            .unwrap_or(defaults.ssh_port)
    }

    pub fn ssh_user<'a>(&'a self, defaults: &'a BootstrapDefaults) -> &'a str {
        non_empty(&self.user).unwrap_or(&defaults.ssh_user)
    }
}

impl LbConfig {
    pub fn domain(&self) -> Option<&str> {
        non_empty(&self.domain)
    }

    pub fn address(&self) -> Option<&str> {
        non_empty(&self.address)
    }

    pub fn port(&self) -> Option<u16> {
        parse_port(&self.port).ok().flatten()
    }
}
