// file: src/cli/commands.rs
// version: 2.0.0
// guid: e6b4d0a8-7c13-4f5e-92d1-3a8f0c5e7b26

//! Command implementations for the CLI

use crate::{
    cluster::{HostGroup, Orchestrator},
    config::{loader::ConfigLoader, BootstrapDefaults, ClusterSpec},
    network::{LocalTransport, SshTransport, Transport},
    reporter::FanOutReport,
    Result,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Load the cluster description and pick a transport
pub fn build_orchestrator(config: Option<&Path>, local: bool) -> Result<Orchestrator> {
    let cluster = match config {
        Some(path) => ConfigLoader::new().load_cluster_spec(path)?,
        None => {
            info!("No cluster config given, assuming a single-node cluster");
            ClusterSpec::default()
        }
    };

    let transport: Arc<dyn Transport> = if local {
        Arc::new(LocalTransport::new())
    } else {
        Arc::new(SshTransport::new())
    };

    Ok(Orchestrator::new(transport, cluster, BootstrapDefaults::default()))
}

fn finish(report: FanOutReport) -> Result<()> {
    report.print_summary();
    report.into_result().map(|_| ())
}

/// Show role groups and bootstrap parameters
pub async fn plan_command(orchestrator: &Orchestrator, json: bool) -> Result<()> {
    let plan = orchestrator.plan().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("Hosts:");
    for node in &plan.groups.all {
        let mut roles = Vec::new();
        if node.is_etcd {
            roles.push("etcd");
        }
        if node.is_control_plane {
            roles.push("master");
        }
        if node.is_worker {
            roles.push("worker");
        }
        println!(
            "  {:<16} {:<20} {:<20} escalation={:?}",
            node.address,
            node.hostname.as_deref().unwrap_or("-"),
            roles.join(","),
            node.escalation
        );
    }

    let params = &plan.parameters;
    println!("Control plane endpoint: {}", params.control_plane_endpoint);
    println!("Kubernetes version:     {}", params.kubernetes_version);
    println!("Image repository:       {}", params.image_repository);
    println!("Network plugin:         {}", params.network_plugin);
    println!("Pod subnet:             {}", params.pod_subnet);
    println!("Service subnet:         {}", params.service_subnet);
    println!("Certificate SANs:");
    for san in &params.cert_sans {
        println!("  {}", san);
    }

    Ok(())
}

/// Run a privileged command on a host group
pub async fn run_command(orchestrator: &Orchestrator, group: HostGroup, command: &str) -> Result<()> {
    info!("Running on {:?} hosts: {}", group, command);
    finish(orchestrator.run(group, command).await?)
}

/// Push a local file to a host group
pub async fn push_command(orchestrator: &Orchestrator, group: HostGroup, local: &Path, remote: &str) -> Result<()> {
    finish(orchestrator.push_artifact(group, local, remote).await?)
}

/// Print or apply the managed /etc/hosts block
pub async fn hosts_command(orchestrator: &Orchestrator, apply: bool) -> Result<()> {
    if apply {
        return finish(orchestrator.sync_hosts().await?);
    }

    for entry in orchestrator.synthesizer().hosts_entries(orchestrator.cluster()) {
        println!("{}", entry);
    }
    Ok(())
}

/// Print or write the kubeadm ClusterConfiguration
pub async fn kubeadm_config_command(orchestrator: &Orchestrator, output: Option<PathBuf>) -> Result<()> {
    let params = orchestrator.bootstrap_parameters()?;
    let yaml = orchestrator.synthesizer().render_kubeadm_config(&params)?;

    match output {
        Some(path) => {
            tokio::fs::write(&path, yaml).await?;
            info!("kubeadm config written to {}", path.display());
        }
        None => print!("{}", yaml),
    }

    Ok(())
}

/// Derive join commands and join all remaining nodes
pub async fn scale_command(orchestrator: &Orchestrator) -> Result<()> {
    finish(orchestrator.scale().await?)
}
