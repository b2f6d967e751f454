// file: src/lib.rs
// version: 3.0.0
// guid: 2c9a6e13-f4b7-4d80-a5c2-7e1d0b8f3a64

//! # Kube Bootstrap
//!
//! Turns a declarative description of machines (addresses, credentials,
//! role assignments) into a multi-node Kubernetes control plane by issuing
//! privileged shell commands over SSH.
//!
//! The engine classifies hosts into overlapping role groups, negotiates
//! privilege escalation once per host, fans commands and file pushes out
//! concurrently, synthesizes kubeadm bootstrap parameters and derives the
//! control-plane and worker join commands from kubeadm's output.

pub mod cli;
pub mod cluster;
pub mod config;
pub mod error;
pub mod logging;
pub mod network;
pub mod reporter;
pub mod utils;

pub use error::{BootstrapError, Result};

/// Version information for the utility
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
