// file: src/config/defaults.rs
// version: 1.0.0
// guid: c4a9e2f0-7d31-4b86-a5e0-93f1d6b2c748

//! Defaults applied to unset cluster fields

use serde::{Deserialize, Serialize};

/// Immutable set of defaults passed into the synthesizer and loader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapDefaults {
    pub ssh_port: u16,
    pub ssh_user: String,
    pub lb_domain: String,
    pub lb_port: u16,
    pub network_plugin: String,
    pub pod_cidr: String,
    pub service_cidr: String,
    pub cluster_name: String,
    pub image_repo: String,
    pub kube_version: String,
    /// Hostname used for the load-balancer entry of a single-machine cluster
    pub single_node_hostname: String,
    /// Absolute path of kubeadm on every node
    pub kubeadm_path: String,
}

impl Default for BootstrapDefaults {
    fn default() -> Self {
        Self {
            ssh_port: 22,
            ssh_user: "root".to_string(),
            lb_domain: "lb.kubesphere.local".to_string(),
            lb_port: 6443,
            network_plugin: "calico".to_string(),
            pod_cidr: "10.233.64.0/18".to_string(),
            service_cidr: "10.233.0.0/18".to_string(),
            cluster_name: "cluster.local".to_string(),
            image_repo: "kubesphere".to_string(),
            kube_version: "v1.17.0".to_string(),
            single_node_hostname: "ks-allinone".to_string(),
            kubeadm_path: "/usr/local/bin/kubeadm".to_string(),
        }
    }
}
