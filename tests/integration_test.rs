// file: tests/integration_test.rs
// version: 2.0.0
// guid: 4b7e0c2a-9d61-4f83-b5a8-1e3c6f9d0a27

//! Integration tests for the bootstrap engine

use async_trait::async_trait;
use kube_bootstrap::{
    cluster::{ConfigSynthesizer, HostGroup, Orchestrator},
    config::{loader::ConfigLoader, BootstrapDefaults},
    network::{Connection, Transport},
    BootstrapError, Result,
};
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const KEY: &str = "0c4f7a1d3e6b9c2f5a8d1e4b7c0f3a6d9e2b5c8f1a4d7e0b3c6f9a2d5e8b1c4f";

const CLUSTER_YAML: &str = r#"
hosts:
  - hostName: master1
    address: 192.168.0.11
    internal_address: 10.0.0.11
    role: [etcd, master]
  - hostName: master2
    address: 192.168.0.12
    user: ubuntu
    password: ${NODE_PASSWORD}
    role: [etcd, master]
  - hostName: node1
    address: 192.168.0.21
    role: [worker]
  - hostName: node2
    address: 192.168.0.22
    user: centos
    role: [worker]
lb_kubeapiserver:
  domain: api.example.internal
  port: 6443
network:
  plugin: calico
  kube_service_cidr: 10.96.0.0/12
"#;

/// Records every command and answers kubeadm's certificate and token steps
#[derive(Default)]
struct RecordingTransport {
    commands: Mutex<Vec<(String, String)>>,
    refuse_su: bool,
}

impl RecordingTransport {
    fn commands_to(&self, host: &str) -> Vec<String> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .filter(|(h, _)| h == host)
            .map(|(_, c)| c.clone())
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn execute(&self, conn: &Connection, command: &str) -> Result<String> {
        self.commands
            .lock()
            .unwrap()
            .push((conn.address.clone(), command.to_string()));

        let fail = |output: &str| BootstrapError::RemoteCommandError {
            host: conn.address.clone(),
            command: command.to_string(),
            exit_code: Some(1),
            output: output.to_string(),
        };

        if command.contains("command -v sudo") {
            return if conn.user == "centos" {
                Err(fail("not found"))
            } else {
                Ok(String::new())
            };
        }
        if command.contains("command -v su ") {
            return if self.refuse_su { Err(fail("not found")) } else { Ok(String::new()) };
        }
        if command.contains("upload-certs") {
            return Ok(format!(
                "[upload-certs] Storing the certificates in Secret \"kubeadm-certs\"\n[upload-certs] Using certificate key:\n{}\n",
                KEY
            ));
        }
        if command.contains("token create") {
            return Ok(format!(
                "kubeadm join api.example.internal:6443 --token 9a08jv.c0izixklcxtmnze7 \\\n    --discovery-token-ca-cert-hash sha256:2f6a0e5b1c \\\n    --control-plane --certificate-key {}\n",
                KEY
            ));
        }

        Ok(String::new())
    }

    async fn transfer(&self, _conn: &Connection, _local: &Path, _remote: &str) -> Result<()> {
        Ok(())
    }
}

fn load(dir: &TempDir) -> kube_bootstrap::config::ClusterSpec {
    let path = dir.path().join("cluster.yaml");
    std::fs::write(&path, CLUSTER_YAML).unwrap();

    let mut loader = ConfigLoader::new();
    loader.set_env_var("NODE_PASSWORD".to_string(), "s3cret".to_string());
    loader.load_cluster_spec(&path).unwrap()
}

fn orchestrator(transport: Arc<RecordingTransport>, dir: &TempDir) -> Orchestrator {
    let synthesizer = ConfigSynthesizer::with_local_address(
        BootstrapDefaults::default(),
        IpAddr::V4(Ipv4Addr::new(192, 168, 0, 5)),
    );
    Orchestrator::with_synthesizer(transport, load(dir), synthesizer)
}

#[tokio::test]
async fn test_plan_from_yaml() {
    let dir = TempDir::new().unwrap();
    let transport = Arc::new(RecordingTransport::default());
    let orchestrator = orchestrator(transport, &dir);

    let plan = orchestrator.plan().await.unwrap();

    assert_eq!(plan.groups.control_plane.len(), 2);
    assert_eq!(plan.groups.worker.len(), 2);
    assert_eq!(plan.groups.kubernetes.len(), 4);
    assert_eq!(plan.parameters.control_plane_endpoint, "api.example.internal:6443");
    assert_eq!(plan.parameters.service_subnet, "10.96.0.0/12");
    assert_eq!(plan.parameters.cert_sans.last().map(String::as_str), Some("10.96.0.1"));
    assert!(plan.parameters.cert_sans.iter().any(|s| s == "10.0.0.11"));
}

#[tokio::test]
async fn test_scale_end_to_end() {
    let dir = TempDir::new().unwrap();
    let transport = Arc::new(RecordingTransport::default());
    let orchestrator = orchestrator(transport.clone(), &dir);

    let report = orchestrator.scale().await.unwrap();

    assert!(report.is_success(), "{}", report.summary());
    let hosts: Vec<&str> = report.results.iter().map(|r| r.host.as_str()).collect();
    assert_eq!(hosts, vec!["192.168.0.12", "192.168.0.21", "192.168.0.22"]);

    // master2 logs in as ubuntu and escalates with sudo
    let master2 = transport.commands_to("192.168.0.12");
    let join = master2.last().unwrap();
    assert!(join.starts_with("sudo -E sh -c '/usr/local/bin/kubeadm join api.example.internal:6443"));
    assert!(join.contains("--control-plane --certificate-key"));
    assert!(join.contains(KEY));

    // node2 has no sudo and falls back to su
    let node2 = transport.commands_to("192.168.0.22");
    let join = node2.last().unwrap();
    assert!(join.starts_with("su -c '"));
    assert!(!join.contains("--control-plane"));
    assert!(!join.contains(KEY));
    assert!(join.contains("--token 9a08jv.c0izixklcxtmnze7"));
}

#[tokio::test]
async fn test_scale_aborts_without_escalation() {
    let dir = TempDir::new().unwrap();
    let transport = Arc::new(RecordingTransport {
        refuse_su: true,
        ..Default::default()
    });
    let orchestrator = orchestrator(transport.clone(), &dir);

    let err = orchestrator.scale().await.unwrap_err();

    assert_eq!(err.host(), Some("192.168.0.22"));
    assert!(transport.commands_to("192.168.0.11").is_empty());
}

#[tokio::test]
async fn test_run_on_workers_only() {
    let dir = TempDir::new().unwrap();
    let transport = Arc::new(RecordingTransport::default());
    let orchestrator = orchestrator(transport.clone(), &dir);

    let report = orchestrator
        .run(HostGroup::Worker, "systemctl restart kubelet")
        .await
        .unwrap();

    assert_eq!(report.len(), 2);
    assert!(transport.commands_to("192.168.0.11").is_empty());
    assert_eq!(
        transport.commands_to("192.168.0.21"),
        vec!["sh -c 'systemctl restart kubelet'".to_string()]
    );
}

#[tokio::test]
async fn test_kubeadm_config_rendering() {
    let dir = TempDir::new().unwrap();
    let orchestrator = orchestrator(Arc::new(RecordingTransport::default()), &dir);

    let params = orchestrator.bootstrap_parameters().unwrap();
    let yaml = orchestrator.synthesizer().render_kubeadm_config(&params).unwrap();

    assert!(yaml.contains("kind: ClusterConfiguration"));
    assert!(yaml.contains("controlPlaneEndpoint: api.example.internal:6443"));
    assert!(yaml.contains("serviceSubnet: 10.96.0.0/12"));
}

#[test]
fn test_missing_env_var_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cluster.yaml");
    std::fs::write(&path, CLUSTER_YAML.replace("NODE_PASSWORD", "KUBE_BOOTSTRAP_UNSET_VAR")).unwrap();

    let err = ConfigLoader::new().load_cluster_spec(&path).unwrap_err();
    assert!(matches!(err, BootstrapError::ConfigError(_)));
}
