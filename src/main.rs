// file: src/main.rs
// version: 2.0.0
// guid: 7d2f9b40-a6e1-4c85-b07d-f3e8a1c5d962

//! kube-bootstrap - main entry point

use clap::Parser;
use kube_bootstrap::{
    cli::{
        args::{Cli, Commands},
        commands::*,
    },
    logging::logger,
};
use tokio::signal;
use tracing::warn;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.json_logs {
        logger::init_json_logger()?;
    } else {
        logger::init_logger(cli.verbose, cli.quiet)?;
    }

    let orchestrator = build_orchestrator(cli.config.as_deref(), cli.local)?;

    let command_future = async {
        match cli.command {
            Commands::Plan { json } => plan_command(&orchestrator, json).await,
            Commands::Run { group, command } => {
                run_command(&orchestrator, group.into(), &command).await
            }
            Commands::Push {
                group,
                local,
                remote,
            } => push_command(&orchestrator, group.into(), &local, &remote).await,
            Commands::Hosts { apply } => hosts_command(&orchestrator, apply).await,
            Commands::KubeadmConfig { output } => {
                kubeadm_config_command(&orchestrator, output).await
            }
            Commands::Scale => scale_command(&orchestrator).await,
        }
    };

    tokio::select! {
        result = command_future => result.map_err(anyhow::Error::from),
        _ = signal::ctrl_c() => {
            warn!("Interrupted, remote commands already dispatched may still be running");
            std::process::exit(130);
        }
    }
}
