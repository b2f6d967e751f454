// file: src/cluster/privilege.rs
// version: 1.0.0
// guid: 8c3a5f19-e07b-4d26-b941-5a2e8d0c7f63

//! Per-host privilege escalation negotiation

use crate::error::BootstrapError;
use crate::network::transport::{shell_quote, Connection, Transport};
use crate::Result;
use serde::Serialize;
use tracing::debug;

/// How commands are raised to root on a host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Escalation {
    /// Already root, plain shell
    Root,
    /// Non-interactive sudo preserving the environment
    Sudo,
    Su,
}

impl Escalation {
    /// Command wrapper prepended to every privileged command
    pub fn prefix(&self) -> &'static str {
        match self {
            Escalation::Root => "sh -c ",
            Escalation::Sudo => "sudo -E sh -c ",
            Escalation::Su => "su -c ",
        }
    }

    /// Wrap a command so it runs as root
    pub fn wrap(&self, command: &str) -> String {
        format!("{}{}", self.prefix(), shell_quote(command))
    }
}

fn presence_probe(binary: &str) -> String {
    format!("command -v {} >/dev/null 2>&1", binary)
}

/// Decide how to escalate on one host. Non-root users are probed for
/// `sudo`, then `su`; finding neither is a hard stop for that host.
pub async fn negotiate_privilege(transport: &dyn Transport, conn: &Connection) -> Result<Escalation> {
    if conn.user == "root" {
        debug!("{}: connected as root, no escalation needed", conn.address);
        return Ok(Escalation::Root);
    }

    for (binary, escalation) in [("sudo", Escalation::Sudo), ("su", Escalation::Su)] {
        if transport.probe(conn, &presence_probe(binary)).await? {
            debug!("{}: escalating with {}", conn.address, binary);
            return Ok(escalation);
        }
    }

    Err(BootstrapError::privilege(
        &conn.address,
        format!(
            "no privilege escalation mechanism available for user {} (neither sudo nor su found)",
            conn.user
        ),
    ))
}
