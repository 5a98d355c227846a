//! `add-peer` and `remove-peer`.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;
use wgmesh_config::{AddPeerOptions, PeerSpec, WgConfig};
use wgmesh_tools::{read_config, save, SaveOptions, TunnelControl};

use crate::cli::AddPeerArgs;
use crate::commands::display_path;
use crate::error::CliError;
use crate::output::{OutputFormat, PeerAction, PeerReport};

/// Peer command executor.
pub struct PeerCommand<'a, T> {
    tunnel: &'a T,
}

impl<'a, T: TunnelControl> PeerCommand<'a, T> {
    /// Create a new peer command.
    #[must_use]
    pub fn new(tunnel: &'a T) -> Self {
        Self { tunnel }
    }

    /// Adds or updates a peer and saves the file.
    pub async fn add<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        args: &AddPeerArgs,
    ) -> Result<(), CliError> {
        if args.public_key.trim().is_empty() {
            return Err(CliError::InvalidArgument("public key must not be empty".into()));
        }

        let allowed_ips: Vec<&str> = args
            .allowed_ips
            .iter()
            .map(|ip| ip.trim())
            .filter(|ip| !ip.is_empty())
            .collect();
        if allowed_ips.is_empty() {
            return Err(CliError::InvalidArgument("allowed IPs must not be empty".into()));
        }

        let mut config = read_config(&args.file).await?;
        let mut peer = PeerSpec::new(args.public_key.trim(), allowed_ips);
        peer.name.clone_from(&args.name);
        peer.endpoint.clone_from(&args.endpoint);
        peer.persistent_keepalive = args.keepalive.filter(|k| *k > 0);
        peer.pre_shared_key.clone_from(&args.pre_shared_key);

        let change = config.add_peer(
            peer,
            AddPeerOptions {
                merge_allowed_ips: args.merge,
            },
        );
        let path = self.save(&config, args.apply).await?;

        let report = PeerReport {
            file: display_path(Some(&path)),
            public_key: args.public_key.trim().to_string(),
            action: change.into(),
            applied: args.apply,
        };
        format.write(writer, &report)
    }

    /// Removes a peer and saves the file. A missing peer is reported, not
    /// treated as an error, and leaves the file untouched.
    pub async fn remove<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        file: &Path,
        public_key: &str,
        apply: bool,
    ) -> Result<(), CliError> {
        let mut config = read_config(file).await?;
        let (action, applied) = if config.remove_peer(public_key).is_some() {
            self.save(&config, apply).await?;
            (PeerAction::Removed, apply)
        } else {
            (PeerAction::NotFound, false)
        };

        let report = PeerReport {
            file: display_path(Some(file)),
            public_key: public_key.to_string(),
            action,
            applied,
        };
        format.write(writer, &report)
    }

    async fn save(&self, config: &WgConfig, apply: bool) -> Result<PathBuf, CliError> {
        let options = SaveOptions {
            file_path: None,
            no_up: !apply,
        };
        let path = save(self.tunnel, config, &options).await?;
        info!(path = %path.display(), applied = apply, "saved config");
        Ok(path)
    }
}
