//! `pair`: add each config file as a peer of every other.

use std::io::Write;

use tracing::info;
use wgmesh_config::{create_peer_pairs, GenerateKeysOptions, PeerPair, PeerSettings, WgConfig};
use wgmesh_tools::{generate_keys, read_config, write_config, KeyGenerator};

use crate::cli::PairArgs;
use crate::commands::display_path;
use crate::error::CliError;
use crate::output::{MeshReport, NodeReport, OutputFormat};

/// A node waiting to be paired.
#[derive(Debug)]
pub(crate) struct PairNode {
    pub config: WgConfig,
    pub settings: PeerSettings,
    pub overwrite_keys: bool,
}

/// Host route for an interface address: `10.0.0.2/24` gives `10.0.0.2/32`.
pub(crate) fn host_route(address: &str) -> String {
    let ip = address.split_once('/').map_or(address, |(ip, _)| ip).trim();
    if ip.contains(':') {
        format!("{ip}/128")
    } else {
        format!("{ip}/32")
    }
}

/// Fills empty allowed IPs with host routes to the node's own addresses.
pub(crate) fn default_settings(config: &WgConfig, mut settings: PeerSettings) -> PeerSettings {
    if settings.allowed_ips.is_empty() {
        settings.allowed_ips = config.interface.addresses.iter().map(|a| host_route(a)).collect();
    }
    settings
}

/// Generates keys, pairs every node and optionally writes the files.
///
/// With `shared_psk` one pre-shared key is generated and used by every
/// node, so both ends of each peer entry agree on it.
pub(crate) async fn pair_nodes<G: KeyGenerator>(
    generator: &G,
    nodes: Vec<PairNode>,
    shared_psk: bool,
    dry_run: bool,
) -> Result<MeshReport, CliError> {
    let mut pairs = Vec::with_capacity(nodes.len());
    let mut psk: Option<String> = None;

    for node in nodes {
        let PairNode {
            mut config,
            settings,
            overwrite_keys,
        } = node;
        let want_psk = shared_psk && psk.is_none();
        let keys = generate_keys(
            &mut config,
            generator,
            GenerateKeysOptions {
                pre_shared_key: want_psk,
                overwrite: overwrite_keys,
            },
        )
        .await?;
        if want_psk {
            psk = keys.pre_shared_key;
        }
        pairs.push(PeerPair::new(config, settings));
    }

    for pair in &mut pairs {
        pair.config.pre_shared_key.clone_from(&psk);
    }
    create_peer_pairs(&mut pairs)?;

    let mut reports = Vec::with_capacity(pairs.len());
    for pair in &pairs {
        if !dry_run {
            write_config(&pair.config, None).await?;
        }
        reports.push(NodeReport {
            file: display_path(pair.config.file_path()),
            public_key: pair.config.public_key.clone().unwrap_or_default(),
            peers: pair.config.peers.len(),
        });
    }
    info!(nodes = reports.len(), written = !dry_run, "mesh built");

    Ok(MeshReport {
        nodes: reports,
        written: !dry_run,
    })
}

/// Pair command executor.
pub struct PairCommand<'a, G> {
    generator: &'a G,
}

impl<'a, G: KeyGenerator> PairCommand<'a, G> {
    /// Create a new pair command.
    #[must_use]
    pub fn new(generator: &'a G) -> Self {
        Self { generator }
    }

    /// Reads every file, pairs them and writes them back.
    ///
    /// Each node is reached through host routes to its interface addresses.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        args: &PairArgs,
    ) -> Result<(), CliError> {
        if args.files.len() < 2 {
            return Err(CliError::InvalidArgument("pair needs at least two config files".into()));
        }

        let mut nodes = Vec::with_capacity(args.files.len());
        for file in &args.files {
            let config = read_config(file).await?;
            let settings = PeerSettings {
                name: config.interface.name.clone(),
                persistent_keepalive: args.keepalive.filter(|k| *k > 0),
                ..PeerSettings::default()
            };
            let settings = default_settings(&config, settings);
            nodes.push(PairNode {
                config,
                settings,
                overwrite_keys: false,
            });
        }

        let report = pair_nodes(self.generator, nodes, args.psk, args.dry_run).await?;
        format.write(writer, &report)
    }
}
