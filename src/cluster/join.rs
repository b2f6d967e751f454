// file: src/cluster/join.rs
// version: 1.0.0
// guid: 6e0b3d8a-9f42-4c15-a7d6-2c8e5f1b0a97

//! Join command derivation from kubeadm's human-oriented output
//!
//! kubeadm prints the certificate key and the join command as text meant
//! for people. Everything that depends on that text format lives in
//! [`extract_certificate_key`] and [`build_join_commands`] so a format
//! change touches only these two functions and their pinned samples.

use super::topology::ResolvedNode;
use crate::error::BootstrapError;
use crate::network::transport::Transport;
use crate::Result;
use regex::Regex;
use std::sync::OnceLock;
use tracing::info;

/// Length of a kubeadm certificate key in hex characters
pub const CERTIFICATE_KEY_LEN: usize = 64;

const JOIN_MARKER: &str = "kubeadm join";
const CONTROL_PLANE_FLAG: &str = "--control-plane";
const CERTIFICATE_KEY_FLAG: &str = "--certificate-key";
const REDACTED: &str = "<redacted>";

fn hex_run_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[0-9a-f]+").expect("static regex"))
}

fn secret_flag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(--token|--certificate-key|--discovery-token-ca-cert-hash)(=|\s+)\S+")
            .expect("static regex")
    })
}

/// The two commands handed to joining nodes. Both embed admission secrets,
/// so `Debug` never prints them.
#[derive(Clone, PartialEq, Eq)]
pub struct JoinCommands {
    pub control_plane: String,
    pub worker: String,
}

impl std::fmt::Debug for JoinCommands {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JoinCommands")
            .field("control_plane", &redact_join_secrets(&self.control_plane))
            .field("worker", &redact_join_secrets(&self.worker))
            .finish()
    }
}

/// Mask token, hash and certificate key values in a command line
pub fn redact_join_secrets(command: &str) -> String {
    secret_flag_regex()
        .replace_all(command, |cap: &regex::Captures| {
            format!("{}{}{}", &cap[1], &cap[2], REDACTED)
        })
        .into_owned()
}

/// Find the certificate key in `kubeadm init phase upload-certs` output:
/// the first maximal run of lowercase hex that is exactly 64 long.
pub fn extract_certificate_key(output: &str) -> Result<String> {
    hex_run_regex()
        .find_iter(output)
        .map(|m| m.as_str())
        .find(|run| run.len() == CERTIFICATE_KEY_LEN)
        .map(str::to_string)
        .ok_or_else(|| {
            BootstrapError::parse(format!(
                "no {}-character certificate key found in upload-certs output",
                CERTIFICATE_KEY_LEN
            ))
        })
}

/// Rebuild canonical join commands from `kubeadm token create
/// --print-join-command --certificate-key <key>` output.
///
/// The host/token portion is whatever follows the `kubeadm join` marker,
/// minus the control-plane flag and the certificate key, in whichever
/// order kubeadm printed them. The worker command is the control-plane
/// command cut at `--control-plane`.
pub fn build_join_commands(
    token_output: &str,
    certificate_key: &str,
    kubeadm_path: &str,
) -> Result<JoinCommands> {
    let (_, after_marker) = token_output.split_once(JOIN_MARKER).ok_or_else(|| {
        BootstrapError::parse(format!("no '{}' command found in token output", JOIN_MARKER))
    })?;

    if !after_marker.contains(certificate_key) {
        return Err(BootstrapError::parse(
            "certificate key missing from printed join command",
        ));
    }

    let joined = after_marker.replace("\\\r\n", " ").replace("\\\n", " ");
    let line = joined.lines().next().unwrap_or_default();

    let mut portion = Vec::new();
    let mut tokens = line.split_whitespace();
    while let Some(token) = tokens.next() {
        match token {
            CONTROL_PLANE_FLAG => {}
            CERTIFICATE_KEY_FLAG => {
                tokens.next();
            }
            t if t.starts_with("--certificate-key=") || t == certificate_key => {}
            t => portion.push(t),
        }
    }

    if portion.is_empty() || !portion.contains(&"--token") {
        return Err(BootstrapError::parse(
            "join command has no endpoint/token portion",
        ));
    }

    let control_plane = format!(
        "{} join {} {} {} {}",
        kubeadm_path,
        portion.join(" "),
        CONTROL_PLANE_FLAG,
        CERTIFICATE_KEY_FLAG,
        certificate_key
    );

    let worker = control_plane
        .split(CONTROL_PLANE_FLAG)
        .next()
        .unwrap_or_default()
        .trim_end()
        .to_string();

    Ok(JoinCommands {
        control_plane,
        worker,
    })
}

/// Run the upload-certs / token-create exchange on the first control-plane
/// node and derive both join commands. Any missing pattern is fatal.
pub async fn derive_join_commands(
    transport: &dyn Transport,
    master: &ResolvedNode,
    kubeadm_path: &str,
) -> Result<JoinCommands> {
    info!("Uploading control-plane certificates on {}", master.address);
    let upload_output = master
        .execute(
            transport,
            &format!("{} init phase upload-certs --upload-certs", kubeadm_path),
        )
        .await?;

    let certificate_key = extract_certificate_key(&upload_output)?;

    info!("Creating join token on {}", master.address);
    let token_output = master
        .execute(
            transport,
            &format!(
                "{} token create --print-join-command {} {}",
                kubeadm_path, CERTIFICATE_KEY_FLAG, certificate_key
            ),
        )
        .await?;

    let commands = build_join_commands(&token_output, &certificate_key, kubeadm_path)?;
    info!("Join commands derived: {:?}", commands);

    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::privilege::Escalation;
    use crate::cluster::testing::MockTransport;
    use crate::config::{BootstrapDefaults, NodeSpec, Role};

    const KEY: &str = "0f6ebb9c8a1b3e5d7f2a4c6e8b0d1f3a5c7e9b2d4f6a8c0e1b3d5f7a9c2e4b6d";
    const KUBEADM: &str = "/usr/local/bin/kubeadm";

    fn upload_certs_output() -> String {
        format!(
            "I1016 10:00:00.000000   1234 version.go:251] remote version is much newer\n\
             W1016 10:00:00.100000   1234 validation.go:28] Cannot validate kube-proxy config\n\
             [upload-certs] Storing the certificates in Secret \"kubeadm-certs\" in the \"kube-system\" Namespace\n\
             [upload-certs] Using certificate key:\n\
             {}\n",
            KEY
        )
    }

    fn token_output() -> String {
        format!(
            "W1016 10:00:01.000000   1240 validation.go:28] Cannot validate kubelet config\n\
             kubeadm join lb.kubesphere.local:6443 --token abcdef.0123456789abcdef     \
             --discovery-token-ca-cert-hash sha256:1a2b3c --control-plane --certificate-key {} \n",
            KEY
        )
    }

    fn master() -> ResolvedNode {
        let spec = NodeSpec {
            address: "10.0.0.1".to_string(),
            role: vec![Role::Etcd, Role::Master],
            ..Default::default()
        };
        ResolvedNode::new(spec, &BootstrapDefaults::default(), Escalation::Root)
    }

    #[test]
    fn test_extract_certificate_key() {
        assert_eq!(extract_certificate_key(&upload_certs_output()).unwrap(), KEY);
    }

    #[test]
    fn test_extract_accepts_non_hex_neighbours() {
        let text = format!("key=[{}]xyz", KEY);
        assert_eq!(extract_certificate_key(&text).unwrap(), KEY);
    }

    #[test]
    fn test_extract_rejects_63_and_65_char_runs() {
        let short = format!("using key: {}.\n", &KEY[..63]);
        let long = format!("using key: {}a.\n", KEY);

        assert!(matches!(
            extract_certificate_key(&short),
            Err(BootstrapError::ParseError(_))
        ));
        assert!(matches!(
            extract_certificate_key(&long),
            Err(BootstrapError::ParseError(_))
        ));
    }

    #[test]
    fn test_extract_skips_shorter_runs() {
        let text = format!("deadbeef cafe\n{}\n", KEY);
        assert_eq!(extract_certificate_key(&text).unwrap(), KEY);
        assert!(extract_certificate_key("").is_err());
    }

    #[test]
    fn test_build_join_commands_kubeadm_order() {
        let commands = build_join_commands(&token_output(), KEY, KUBEADM).unwrap();

        assert_eq!(
            commands.control_plane,
            format!(
                "/usr/local/bin/kubeadm join lb.kubesphere.local:6443 --token abcdef.0123456789abcdef \
                 --discovery-token-ca-cert-hash sha256:1a2b3c --control-plane --certificate-key {}",
                KEY
            )
        );
        assert_eq!(
            commands.worker,
            "/usr/local/bin/kubeadm join lb.kubesphere.local:6443 --token abcdef.0123456789abcdef \
             --discovery-token-ca-cert-hash sha256:1a2b3c"
        );
    }

    #[test]
    fn test_build_join_commands_key_before_control_plane_flag() {
        let output = format!(
            "... some preamble\nkubeadm join 10.0.0.1:6443 --token abc.def \
             --discovery-token-ca-cert-hash sha256:xyz --certificate-key {} --control-plane\n",
            KEY
        );

        let commands = build_join_commands(&output, KEY, KUBEADM).unwrap();

        assert!(commands.control_plane.contains(KEY));
        assert!(commands.control_plane.contains("--control-plane"));
        let cut = commands.control_plane.split("--control-plane").next().unwrap();
        assert_eq!(commands.worker, cut.trim_end());
        assert!(!commands.worker.contains(KEY));
        assert!(!commands.worker.contains("--certificate-key"));
    }

    #[test]
    fn test_build_join_commands_line_continuation() {
        let output = format!(
            "kubeadm join 10.0.0.1:6443 --token abc.def \\\n    --discovery-token-ca-cert-hash sha256:xyz \\\n    --control-plane --certificate-key {}\n",
            KEY
        );

        let commands = build_join_commands(&output, KEY, KUBEADM).unwrap();

        assert_eq!(
            commands.worker,
            "/usr/local/bin/kubeadm join 10.0.0.1:6443 --token abc.def --discovery-token-ca-cert-hash sha256:xyz"
        );
    }

    #[test]
    fn test_build_join_commands_missing_marker() {
        let output = format!("error: token create failed {}\n", KEY);
        assert!(matches!(
            build_join_commands(&output, KEY, KUBEADM),
            Err(BootstrapError::ParseError(_))
        ));
    }

    #[test]
    fn test_build_join_commands_missing_key() {
        let output = "kubeadm join 10.0.0.1:6443 --token abc.def --control-plane\n";
        assert!(build_join_commands(output, KEY, KUBEADM).is_err());
    }

    #[test]
    fn test_redact_join_secrets() {
        let redacted = redact_join_secrets(&format!(
            "kubeadm join 10.0.0.1:6443 --token abc.def --discovery-token-ca-cert-hash sha256:xyz --certificate-key={}",
            KEY
        ));

        assert!(!redacted.contains(KEY));
        assert!(!redacted.contains("abc.def"));
        assert!(redacted.contains("10.0.0.1:6443"));
        assert!(redacted.contains("--token <redacted>"));
        assert!(redacted.contains("--certificate-key=<redacted>"));
    }

    #[test]
    fn test_join_commands_debug_is_redacted() {
        let commands = build_join_commands(&token_output(), KEY, KUBEADM).unwrap();
        let debug = format!("{:?}", commands);
        assert!(!debug.contains(KEY));
        assert!(!debug.contains("abcdef.0123456789abcdef"));
    }

    #[tokio::test]
    async fn test_derive_join_commands() {
        let mock = MockTransport::new()
            .respond("10.0.0.1", "upload-certs", &upload_certs_output())
            .respond("10.0.0.1", "token create", &token_output());

        let commands = derive_join_commands(&mock, &master(), KUBEADM).await.unwrap();

        assert!(commands.control_plane.ends_with(KEY));
        assert!(commands.control_plane.starts_with("/usr/local/bin/kubeadm join "));
        let calls = mock.calls_to("10.0.0.1");
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0],
            "sh -c '/usr/local/bin/kubeadm init phase upload-certs --upload-certs'"
        );
        assert_eq!(
            calls[1],
            format!(
                "sh -c '/usr/local/bin/kubeadm token create --print-join-command --certificate-key {}'",
                KEY
            )
        );
    }

    #[tokio::test]
    async fn test_derive_join_commands_upload_failure() {
        let mock = MockTransport::new().fail_on("10.0.0.1", "upload-certs");

        let err = derive_join_commands(&mock, &master(), KUBEADM).await.unwrap_err();

        assert!(matches!(err, BootstrapError::RemoteCommandError { .. }));
        assert_eq!(mock.calls_to("10.0.0.1").len(), 1);
    }

    #[tokio::test]
    async fn test_derive_join_commands_no_key_stops_before_token() {
        let mock = MockTransport::new().respond("10.0.0.1", "upload-certs", "[upload-certs] done\n");

        let err = derive_join_commands(&mock, &master(), KUBEADM).await.unwrap_err();

        assert!(matches!(err, BootstrapError::ParseError(_)));
        assert_eq!(mock.calls_to("10.0.0.1").len(), 1);
    }
}
