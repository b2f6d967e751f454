// file: src/config/mod.rs
// version: 2.0.0
// guid: 5b7e0c93-46a1-4f2d-b8c6-0e9d27a4f315

//! Configuration module for the cluster bootstrap engine
//!
//! Handles loading and validation of the declarative cluster topology and
//! the immutable defaults applied when fields are left unset.

pub mod cluster;
pub mod defaults;
pub mod loader;

pub use cluster::{ClusterSpec, LbConfig, NetworkConfig, NodeSpec, Taint, TaintEffect};
pub use defaults::BootstrapDefaults;

use serde::{Deserialize, Serialize};

/// Recognized node roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "etcd")]
    Etcd,
    #[serde(rename = "master", alias = "control-plane")]
    Master,
    #[serde(rename = "worker")]
    Worker,
}

impl Role {
    /// Get the role as it appears in configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Etcd => "etcd",
            Role::Master => "master",
            Role::Worker => "worker",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = crate::error::BootstrapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "etcd" => Ok(Role::Etcd),
            "master" | "control-plane" => Ok(Role::Master),
            "worker" => Ok(Role::Worker),
            _ => Err(crate::error::BootstrapError::ConfigError(format!(
                "Unknown role: {}",
                s
            ))),
        }
    }
}
