// file: src/cli/args.rs
// version: 2.0.0
// guid: 5a8c1e7f-3b90-4d26-9f4e-a0c7d2b6e183

//! Command line argument definitions

use crate::cluster::HostGroup;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kube-bootstrap")]
#[command(about = "Bootstrap a multi-node Kubernetes control plane over SSH")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Cluster description (YAML). Without one, a single-node cluster on this machine is assumed.
    #[arg(short = 'f', long, global = true, env = "KUBE_BOOTSTRAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Run commands on this machine instead of over SSH
    #[arg(long, global = true)]
    pub local: bool,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON (filter from RUST_LOG)
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show role groups and synthesized bootstrap parameters
    Plan {
        #[arg(long)]
        json: bool,
    },

    /// Run a privileged command on a host group
    Run {
        #[arg(short, long, value_enum, default_value = "all")]
        group: GroupArg,

        command: String,
    },

    /// Push a local file to a host group
    Push {
        #[arg(short, long, value_enum, default_value = "all")]
        group: GroupArg,

        local: PathBuf,

        remote: String,
    },

    /// Print the managed /etc/hosts block
    Hosts {
        #[arg(long, help = "Write the block to /etc/hosts on every node")]
        apply: bool,
    },

    /// Print the kubeadm ClusterConfiguration for the first control plane
    KubeadmConfig {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Join all remaining nodes to the control plane on the first master
    Scale,
}

/// Host group argument for CLI
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum GroupArg {
    All,
    Etcd,
    Master,
    Worker,
    K8s,
}

impl From<GroupArg> for HostGroup {
    fn from(group: GroupArg) -> Self {
        match group {
            GroupArg::All => HostGroup::All,
            GroupArg::Etcd => HostGroup::Etcd,
            GroupArg::Master => HostGroup::ControlPlane,
            GroupArg::Worker => HostGroup::Worker,
            GroupArg::K8s => HostGroup::Kubernetes,
        }
    }
}
