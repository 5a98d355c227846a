//! `mesh`: build a mesh from a JSON definition file.
//!
//! ```json
//! {
//!   "preSharedKey": true,
//!   "nodes": [
//!     {
//!       "filePath": "/etc/wireguard/hub.conf",
//!       "wgInterface": { "address": ["10.10.0.1/24"], "listenPort": 51820 },
//!       "peer": { "endpoint": "hub.example.com:51820" }
//!     },
//!     { "filePath": "/etc/wireguard/laptop.conf", "peer": { "persistentKeepalive": 25 } }
//!   ]
//! }
//! ```
//!
//! A node without `wgInterface` is read from its file. A node whose `peer`
//! has no allowed IPs is reached through host routes to its addresses.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use wgmesh_config::{InterfaceSpec, PeerSettings, WgConfig};
use wgmesh_tools::{read_config, read_config_string, KeyGenerator, ToolError};

use crate::commands::pair::{default_settings, pair_nodes, PairNode};
use crate::error::CliError;
use crate::output::OutputFormat;

/// A mesh definition.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshDefinition {
    /// Share one generated pre-shared key across the mesh.
    #[serde(default)]
    pub pre_shared_key: bool,
    /// Nodes in pairing order.
    pub nodes: Vec<MeshNode>,
}

/// One node of a mesh definition.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshNode {
    /// Where the node's config lives.
    pub file_path: PathBuf,
    /// Interface settings; read from `file_path` when absent.
    #[serde(default)]
    pub wg_interface: Option<InterfaceSpec>,
    /// How other nodes reach this one.
    #[serde(default)]
    pub peer: PeerSettings,
    /// Replace an existing private key.
    #[serde(default)]
    pub overwrite_keys: bool,
}

impl MeshDefinition {
    /// Parses and checks a definition.
    pub fn from_json(json: &str) -> Result<Self, CliError> {
        let definition: Self = serde_json::from_str(json)
            .map_err(|e| CliError::InvalidArgument(format!("mesh definition: {e}")))?;
        definition.validate()?;
        Ok(definition)
    }

    fn validate(&self) -> Result<(), CliError> {
        if self.nodes.len() < 2 {
            return Err(CliError::InvalidArgument(
                "mesh definition needs at least two nodes".into(),
            ));
        }
        let mut seen = HashSet::new();
        for node in &self.nodes {
            if !seen.insert(node.file_path.as_path()) {
                return Err(CliError::InvalidArgument(format!(
                    "mesh definition lists {} twice",
                    node.file_path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Mesh command executor.
pub struct MeshCommand<'a, G> {
    generator: &'a G,
}

impl<'a, G: KeyGenerator> MeshCommand<'a, G> {
    /// Create a new mesh command.
    #[must_use]
    pub fn new(generator: &'a G) -> Self {
        Self { generator }
    }

    /// Loads the definition, pairs its nodes and writes their configs.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        definition: &Path,
        dry_run: bool,
    ) -> Result<(), CliError> {
        let json = read_config_string(definition).await?;
        let definition = MeshDefinition::from_json(&json)?;

        let mut nodes = Vec::with_capacity(definition.nodes.len());
        for node in definition.nodes {
            let config = match node.wg_interface {
                Some(interface) => WgConfig::new(interface).with_file_path(&node.file_path),
                None => read_config(&node.file_path).await.map_err(|e| match e {
                    ToolError::FileRead { path, .. } => CliError::InvalidArgument(format!(
                        "node {} has no wgInterface and its file cannot be read",
                        path.display()
                    )),
                    other => other.into(),
                })?,
            };
            let settings = default_settings(&config, node.peer);
            nodes.push(PairNode {
                config,
                settings,
                overwrite_keys: node.overwrite_keys,
            });
        }

        let report = pair_nodes(self.generator, nodes, definition.pre_shared_key, dry_run).await?;
        format.write(writer, &report)
    }
}
