// file: src/cluster/mod.rs
// version: 1.0.0
// guid: 4f1a7c9e-2d58-4b03-a6e7-95c0b3d8f261

//! Cluster bootstrap orchestration
//!
//! Classifies hosts into role groups, negotiates privilege escalation per
//! host, synthesizes bootstrap parameters and derives the join protocol
//! from the first control-plane node.

pub mod join;
pub mod orchestrator;
pub mod privilege;
pub mod synthesizer;
pub mod topology;

#[cfg(test)]
pub(crate) mod testing;

pub use join::{build_join_commands, derive_join_commands, extract_certificate_key, JoinCommands};
pub use orchestrator::{ClusterPlan, Orchestrator};
pub use privilege::{negotiate_privilege, Escalation};
pub use synthesizer::{BootstrapParameters, ConfigSynthesizer, HostsEntry};
pub use topology::{group_hosts, HostGroup, ResolvedNode, RoleGroups};
