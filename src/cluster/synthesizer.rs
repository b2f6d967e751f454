// file: src/cluster/synthesizer.rs
// version: 1.0.0
// guid: 3d7c0a5e-b81f-4e29-9643-f0a2c6e8d4b1

//! Bootstrap parameter synthesis: subnets, endpoint, certificate SANs and
//! `/etc/hosts` entries derived from the topology and defaults.

use crate::config::{BootstrapDefaults, ClusterSpec, NodeSpec, Role};
use crate::utils::network::NetworkUtils;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};

/// Marker lines delimiting the managed block in `/etc/hosts`
pub const HOSTS_BLOCK_BEGIN: &str = "# kube-bootstrap hosts BEGIN";
pub const HOSTS_BLOCK_END: &str = "# kube-bootstrap hosts END";

/// Parameters consumed by whatever runs `kubeadm init`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapParameters {
    pub cluster_name: String,
    pub pod_subnet: String,
    pub service_subnet: String,
    pub image_repository: String,
    pub kubernetes_version: String,
    pub network_plugin: String,
    pub control_plane_endpoint: String,
    pub cert_sans: Vec<String>,
}

/// One `/etc/hosts` line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostsEntry {
    pub address: String,
    pub hostname: String,
}

impl std::fmt::Display for HostsEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}  {}", self.address, self.hostname)
    }
}

pub struct ConfigSynthesizer {
    defaults: BootstrapDefaults,
    local_address: IpAddr,
}

impl ConfigSynthesizer {
    /// Create a synthesizer using this machine's detected address for
    /// single-node clusters
    pub fn new(defaults: BootstrapDefaults) -> Self {
        let local_address = NetworkUtils::detect_local_address()
            .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
        Self::with_local_address(defaults, local_address)
    }

    pub fn with_local_address(defaults: BootstrapDefaults, local_address: IpAddr) -> Self {
        Self {
            defaults,
            local_address,
        }
    }

    pub fn defaults(&self) -> &BootstrapDefaults {
        &self.defaults
    }

    /// Compute bootstrap parameters, applying defaults to unset fields
    pub fn synthesize(&self, cluster: &ClusterSpec) -> Result<BootstrapParameters> {
        let defaults = &self.defaults;
        let service_subnet = cluster.service_cidr(defaults).to_string();
        let pod_subnet = cluster.pod_cidr(defaults).to_string();
        NetworkUtils::validate_cidr(&pod_subnet)?;
        let service_address = NetworkUtils::first_usable_address(&service_subnet)?;

        let cluster_name = cluster.cluster_name(defaults).to_string();

        Ok(BootstrapParameters {
            control_plane_endpoint: self.control_plane_endpoint(cluster),
            cert_sans: self.cert_sans(cluster, &cluster_name, service_address),
            cluster_name,
            pod_subnet,
            service_subnet,
            image_repository: cluster.image_repo(defaults).to_string(),
            kubernetes_version: cluster.kube_version(defaults).to_string(),
            network_plugin: cluster.network_plugin(defaults).to_string(),
        })
    }

    /// `host:port` every node uses to reach the API server
    pub fn control_plane_endpoint(&self, cluster: &ClusterSpec) -> String {
        let lb = &cluster.lb_kubeapiserver;
        let defaults = &self.defaults;

        // A configured address always selects the conventional domain form.
        if lb.address().is_some() {
            return format!("{}:{}", defaults.lb_domain, defaults.lb_port);
        }

        match lb.domain() {
            Some(domain) => format!("{}:{}", domain, lb.port().unwrap_or(defaults.lb_port)),
            None if cluster.hosts.is_empty() => {
                format!("{}:{}", self.local_address, defaults.lb_port)
            }
            None => format!("{}:{}", defaults.lb_domain, defaults.lb_port),
        }
    }

    fn cert_sans(&self, cluster: &ClusterSpec, cluster_name: &str, service_address: IpAddr) -> Vec<String> {
        let lb = &cluster.lb_kubeapiserver;
        let lb_address = lb.address();

        let mut sans: Vec<String> = vec![
            "kubernetes".to_string(),
            "kubernetes.default".to_string(),
            "kubernetes.default.svc".to_string(),
            format!("kubernetes.default.svc.{}", cluster_name),
            "localhost".to_string(),
            "127.0.0.1".to_string(),
        ];

        sans.push(lb.domain().unwrap_or(&self.defaults.lb_domain).to_string());
        if let Some(address) = lb_address {
            sans.push(address.to_string());
        }

        if cluster.hosts.is_empty() {
            let local = self.local_address.to_string();
            if Some(local.as_str()) != lb_address {
                sans.push(local);
            }
        }

        for host in &cluster.hosts {
            if let Some(hostname) = host.hostname() {
                sans.push(hostname.to_string());
            }

            let external = host.address.trim();
            if !external.is_empty() && Some(external) != lb_address {
                sans.push(external.to_string());
            }

            if let Some(internal) = host.internal_address() {
                if internal != external && Some(internal) != lb_address {
                    sans.push(internal.to_string());
                }
            }
        }

        sans.push(service_address.to_string());

        sans
    }

    /// `/etc/hosts` entries: each named host's cluster address, then the
    /// API load balancer name
    pub fn hosts_entries(&self, cluster: &ClusterSpec) -> Vec<HostsEntry> {
        let lb = &cluster.lb_kubeapiserver;

        let mut entries: Vec<HostsEntry> = cluster
            .hosts
            .iter()
            .filter_map(|host| {
                host.hostname().map(|hostname| HostsEntry {
                    address: host.cluster_address().to_string(),
                    hostname: hostname.to_string(),
                })
            })
            .collect();

        let (address, hostname) = if cluster.hosts.is_empty() {
            (
                lb.address()
                    .map(str::to_string)
                    .unwrap_or_else(|| self.local_address.to_string()),
                lb.domain()
                    .unwrap_or(&self.defaults.single_node_hostname)
                    .to_string(),
            )
        } else {
            let address = lb
                .address()
                .or_else(|| first_control_plane(cluster).map(NodeSpec::cluster_address))
                .unwrap_or_default()
                .to_string();
            (address, lb.domain().unwrap_or(&self.defaults.lb_domain).to_string())
        };

        if !address.is_empty() {
            entries.push(HostsEntry { address, hostname });
        }

        entries
    }

    /// Shell command replacing the managed block in `/etc/hosts`
    pub fn hosts_sync_command(&self, cluster: &ClusterSpec) -> String {
        let mut lines = vec![HOSTS_BLOCK_BEGIN.to_string()];
        lines.extend(self.hosts_entries(cluster).iter().map(ToString::to_string));
        lines.push(HOSTS_BLOCK_END.to_string());

        let quoted: Vec<String> = lines
            .iter()
            .map(|line| crate::network::transport::shell_quote(line))
            .collect();

        format!(
            "sed -i '/^{}$/,/^{}$/d' /etc/hosts && printf '%s\\n' {} >> /etc/hosts",
            HOSTS_BLOCK_BEGIN,
            HOSTS_BLOCK_END,
            quoted.join(" ")
        )
    }

    /// Render a kubeadm `ClusterConfiguration` document
    pub fn render_kubeadm_config(&self, params: &BootstrapParameters) -> Result<String> {
        let document = KubeadmClusterConfiguration {
            api_version: "kubeadm.k8s.io/v1beta2",
            kind: "ClusterConfiguration",
            kubernetes_version: &params.kubernetes_version,
            image_repository: &params.image_repository,
            control_plane_endpoint: &params.control_plane_endpoint,
            networking: KubeadmNetworking {
                dns_domain: &params.cluster_name,
                pod_subnet: &params.pod_subnet,
                service_subnet: &params.service_subnet,
            },
            api_server: KubeadmApiServer {
                cert_sans: &params.cert_sans,
            },
        };

        Ok(serde_yaml::to_string(&document)?)
    }
}

fn first_control_plane(cluster: &ClusterSpec) -> Option<&NodeSpec> {
    cluster.hosts.iter().find(|h| h.has_role(Role::Master))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct KubeadmClusterConfiguration<'a> {
    api_version: &'a str,
    kind: &'a str,
    kubernetes_version: &'a str,
    image_repository: &'a str,
    control_plane_endpoint: &'a str,
    networking: KubeadmNetworking<'a>,
    api_server: KubeadmApiServer<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct KubeadmNetworking<'a> {
    dns_domain: &'a str,
    pod_subnet: &'a str,
    service_subnet: &'a str,
}

#[derive(Serialize)]
struct KubeadmApiServer<'a> {
    #[serde(rename = "certSANs")]
    cert_sans: &'a [String],
}
