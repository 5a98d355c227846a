//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;
use std::net::Ipv4Addr;

use serde::Serialize;
use wgmesh_config::{public_key_from_private, PeerChange, PeerSpec, WgConfig};
use wgmesh_tools::{TunnelAction, TunnelOutcome};

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

/// A peer as shown to users; the pre-shared key itself is never printed.
#[derive(Debug, Clone, Serialize)]
pub struct PeerSummary {
    /// Display name.
    pub name: Option<String>,
    /// Public key.
    pub public_key: String,
    /// Endpoint.
    pub endpoint: Option<String>,
    /// Allowed IPs.
    pub allowed_ips: Vec<String>,
    /// Keepalive interval.
    pub persistent_keepalive: Option<u16>,
    /// Whether a pre-shared key is set.
    pub pre_shared_key: bool,
}

impl From<&PeerSpec> for PeerSummary {
    fn from(peer: &PeerSpec) -> Self {
        Self {
            name: peer.name.clone(),
            public_key: peer.public_key.clone(),
            endpoint: peer.endpoint.clone(),
            allowed_ips: peer.allowed_ips.clone(),
            persistent_keepalive: peer.persistent_keepalive,
            pre_shared_key: peer.pre_shared_key.is_some(),
        }
    }
}

/// A config as shown to users, without its private key.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    /// File the config was read from.
    pub file: Option<String>,
    /// Interface display name.
    pub name: Option<String>,
    /// Interface addresses.
    pub addresses: Vec<String>,
    /// Listen port.
    pub listen_port: Option<u16>,
    /// DNS servers.
    pub dns: Vec<String>,
    /// MTU.
    pub mtu: Option<u16>,
    /// Public key derived from the private key, when it decodes.
    pub public_key: Option<String>,
    /// Peers in file order.
    pub peers: Vec<PeerSummary>,
}

impl ConfigSummary {
    /// Summarizes a config.
    #[must_use]
    pub fn from_config(config: &WgConfig) -> Self {
        let public_key = config
            .public_key
            .clone()
            .or_else(|| public_key_from_private(&config.interface.private_key).ok());
        Self {
            file: config.file_path().map(|p| p.display().to_string()),
            name: config.interface.name.clone(),
            addresses: config.interface.addresses.clone(),
            listen_port: config.interface.listen_port,
            dns: config.interface.dns.clone(),
            mtu: config.interface.mtu,
            public_key,
            peers: config.peers.iter().map(PeerSummary::from).collect(),
        }
    }
}

impl TableDisplay for ConfigSummary {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Interface {}", or_dash(self.name.as_deref()))?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "File:         {}", or_dash(self.file.as_deref()))?;
        writeln!(writer, "Address:      {}", self.addresses.join(", "))?;
        if let Some(port) = self.listen_port {
            writeln!(writer, "Listen Port:  {port}")?;
        }
        if !self.dns.is_empty() {
            writeln!(writer, "DNS:          {}", self.dns.join(", "))?;
        }
        if let Some(mtu) = self.mtu {
            writeln!(writer, "MTU:          {mtu}")?;
        }
        writeln!(writer, "Public Key:   {}", or_dash(self.public_key.as_deref()))?;
        writeln!(writer)?;

        if self.peers.is_empty() {
            writeln!(writer, "No peers.")?;
            return Ok(());
        }
        writeln!(
            writer,
            "{:<46} {:<16} {:<24} {:<10} ALLOWED IPS",
            "PUBLIC KEY", "NAME", "ENDPOINT", "KEEPALIVE"
        )?;
        for peer in &self.peers {
            let keepalive = peer
                .persistent_keepalive
                .map_or_else(|| "-".to_string(), |k| format!("{k}s"));
            writeln!(
                writer,
                "{:<46} {:<16} {:<24} {:<10} {}",
                peer.public_key,
                or_dash(peer.name.as_deref()),
                or_dash(peer.endpoint.as_deref()),
                keepalive,
                peer.allowed_ips.join(", ")
            )?;
        }
        Ok(())
    }
}

/// Result of `keys`.
#[derive(Debug, Clone, Serialize)]
pub struct KeysReport {
    /// File written.
    pub file: String,
    /// The node's public key.
    pub public_key: String,
    /// Newly generated pre-shared key, to hand to peers.
    pub pre_shared_key: Option<String>,
    /// Whether the existing private key was kept.
    pub reused_private_key: bool,
}

impl TableDisplay for KeysReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "File:            {}", self.file)?;
        writeln!(writer, "Public Key:      {}", self.public_key)?;
        if let Some(psk) = &self.pre_shared_key {
            writeln!(writer, "Pre-shared Key:  {psk}")?;
        }
        let private = if self.reused_private_key { "kept" } else { "generated" };
        writeln!(writer, "Private Key:     {private}")?;
        Ok(())
    }
}

/// What happened to a peer entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerAction {
    /// New peer appended.
    Added,
    /// Existing peer updated.
    Updated,
    /// Peer removed.
    Removed,
    /// No peer had that key.
    NotFound,
}

impl From<PeerChange> for PeerAction {
    fn from(change: PeerChange) -> Self {
        match change {
            PeerChange::Added => Self::Added,
            PeerChange::Updated => Self::Updated,
        }
    }
}

impl PeerAction {
    fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Updated => "updated",
            Self::Removed => "removed",
            Self::NotFound => "not found",
        }
    }
}

/// Result of `add-peer` and `remove-peer`.
#[derive(Debug, Clone, Serialize)]
pub struct PeerReport {
    /// File edited.
    pub file: String,
    /// Peer public key.
    pub public_key: String,
    /// What happened.
    pub action: PeerAction,
    /// Whether the interface was restarted.
    pub applied: bool,
}

impl TableDisplay for PeerReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(
            writer,
            "Peer {} {} in {}",
            self.public_key,
            self.action.as_str(),
            self.file
        )?;
        if self.applied {
            writeln!(writer, "Interface restarted.")?;
        }
        Ok(())
    }
}

/// One node after pairing.
#[derive(Debug, Clone, Serialize)]
pub struct NodeReport {
    /// Config file.
    pub file: String,
    /// Node public key.
    pub public_key: String,
    /// Number of peers after pairing.
    pub peers: usize,
}

/// Result of `pair` and `mesh`.
#[derive(Debug, Clone, Serialize)]
pub struct MeshReport {
    /// Every node in input order.
    pub nodes: Vec<NodeReport>,
    /// Whether config files were written.
    pub written: bool,
}

impl TableDisplay for MeshReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{:<46} {:<6} FILE", "PUBLIC KEY", "PEERS")?;
        for node in &self.nodes {
            writeln!(writer, "{:<46} {:<6} {}", node.public_key, node.peers, node.file)?;
        }
        if !self.written {
            writeln!(writer)?;
            writeln!(writer, "Dry run: no files written.")?;
        }
        Ok(())
    }
}

/// Result of `up`, `down` and `restart`.
#[derive(Debug, Clone, Serialize)]
pub struct TunnelReport {
    /// Config file.
    pub file: String,
    /// Final action taken.
    pub action: TunnelAction,
    /// Outcome of that action.
    pub outcome: TunnelOutcome,
}

impl TableDisplay for TunnelReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let state = match self.action {
            TunnelAction::Up => "up",
            TunnelAction::Down => "down",
        };
        match self.outcome {
            TunnelOutcome::Changed => writeln!(writer, "Interface {} is {state}", self.file)?,
            TunnelOutcome::AlreadyInState => {
                writeln!(writer, "Interface {} was already {state}", self.file)?;
            }
        }
        Ok(())
    }
}

/// Result of `public-ip`.
#[derive(Debug, Clone, Serialize)]
pub struct PublicIpReport {
    /// The public address.
    pub ip: Ipv4Addr,
}

impl TableDisplay for PublicIpReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{}", self.ip)?;
        Ok(())
    }
}

/// Result of `check`.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    /// `wg --version` output.
    pub version: String,
}

impl TableDisplay for CheckReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{}", self.version)?;
        Ok(())
    }
}
