//! The config aggregate: one interface, its peers and cached key material.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec::{generate_wg_config, parse_wg_config, ParsedConfig};
use crate::error::{ConfigError, Result};
use crate::keys::KeyMaterial;
use crate::model::{InterfaceSpec, PeerSettings, PeerSpec};

/// Options for [`WgConfig::add_peer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddPeerOptions {
    /// Union the allowed IPs of an existing peer instead of replacing them.
    pub merge_allowed_ips: bool,
}

impl AddPeerOptions {
    /// Options that union allowed IPs on update.
    #[must_use]
    pub const fn merging() -> Self {
        Self {
            merge_allowed_ips: true,
        }
    }
}

/// What [`WgConfig::add_peer`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerChange {
    /// The public key was new; the peer was appended.
    Added,
    /// A peer with the same public key was updated in place.
    Updated,
}

/// Options for key generation on a config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateKeysOptions {
    /// Also create a pre-shared key.
    pub pre_shared_key: bool,
    /// Replace an existing private key instead of re-deriving its public key.
    pub overwrite: bool,
}

/// A WireGuard config with a few in-memory extras.
///
/// `public_key` and `pre_shared_key` cache this node's own key material;
/// the text format has no place for them, so they only survive through
/// JSON. `file_path` is the default location for reads, writes and
/// `wg-quick` invocations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WgConfig {
    /// Settings for the local node.
    #[serde(rename = "wgInterface")]
    pub interface: InterfaceSpec,
    /// Remote peers, unique by public key.
    #[serde(default)]
    pub peers: Vec<PeerSpec>,
    /// This node's public key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    /// A pre-shared key generated for this node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_shared_key: Option<String>,
    /// Where this config is stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
}

impl WgConfig {
    /// Creates a config with no peers.
    #[must_use]
    pub fn new(interface: InterfaceSpec) -> Self {
        Self {
            interface,
            peers: Vec::new(),
            public_key: None,
            pre_shared_key: None,
            file_path: None,
        }
    }

    /// Creates a config from parsed text.
    #[must_use]
    pub fn from_parsed(parsed: ParsedConfig) -> Self {
        Self::new(parsed.interface).with_peers(parsed.peers)
    }

    /// Parses `wg-quick` config text.
    pub fn parse(text: &str) -> Result<Self> {
        parse_wg_config(text).map(Self::from_parsed)
    }

    /// Sets the peers, keeping the last entry for a repeated public key.
    #[must_use]
    pub fn with_peers(mut self, peers: impl IntoIterator<Item = PeerSpec>) -> Self {
        self.peers.clear();
        for peer in peers {
            self.add_peer(peer, AddPeerOptions::default());
        }
        self
    }

    /// Sets the cached public key.
    #[must_use]
    pub fn with_public_key(mut self, key: impl Into<String>) -> Self {
        self.public_key = Some(key.into());
        self
    }

    /// Sets the cached pre-shared key.
    #[must_use]
    pub fn with_pre_shared_key(mut self, key: impl Into<String>) -> Self {
        self.pre_shared_key = Some(key.into());
        self
    }

    /// Sets the file path.
    #[must_use]
    pub fn with_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Replaces interface and peers with parsed ones.
    ///
    /// Cached keys and the file path are kept.
    pub fn apply_parsed(&mut self, parsed: ParsedConfig) {
        let ParsedConfig { interface, peers } = parsed;
        self.interface = interface;
        self.peers.clear();
        for peer in peers {
            self.add_peer(peer, AddPeerOptions::default());
        }
    }

    /// Parses text into this config, see [`WgConfig::apply_parsed`].
    pub fn parse_into(&mut self, text: &str) -> Result<()> {
        let parsed = parse_wg_config(text)?;
        self.apply_parsed(parsed);
        Ok(())
    }

    /// Renders the `wg-quick` config text.
    #[must_use]
    pub fn to_config_string(&self) -> String {
        generate_wg_config(&self.interface, &self.peers)
    }

    /// Serializes to JSON, including the cached keys.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserializes from JSON produced by [`WgConfig::to_json`].
    pub fn from_json(json: &str) -> Result<Self> {
        let mut config: Self = serde_json::from_str(json)?;
        // Re-insert so the unique public key invariant holds.
        let peers = std::mem::take(&mut config.peers);
        Ok(config.with_peers(peers))
    }

    /// Returns the file path, if any.
    #[must_use]
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Picks `explicit` or else the config's own file path.
    pub fn resolve_path<'a>(&'a self, explicit: Option<&'a Path>) -> Result<&'a Path> {
        explicit
            .or(self.file_path.as_deref())
            .ok_or_else(|| ConfigError::precondition("no file path set for config"))
    }

    /// Adds a peer, or updates the peer with the same public key.
    ///
    /// On update every field the incoming peer sets wins; allowed IPs are
    /// replaced unless `options.merge_allowed_ips` is set.
    pub fn add_peer(&mut self, peer: PeerSpec, options: AddPeerOptions) -> PeerChange {
        match self.peers.iter_mut().find(|p| p.public_key == peer.public_key) {
            Some(existing) => {
                debug!(
                    peer = %peer.public_key,
                    merge_allowed_ips = options.merge_allowed_ips,
                    "updating peer"
                );
                existing.merge_from(peer, options.merge_allowed_ips);
                PeerChange::Updated
            }
            None => {
                debug!(peer = %peer.public_key, "adding peer");
                self.peers.push(peer);
                PeerChange::Added
            }
        }
    }

    /// Removes the peer with this public key.
    pub fn remove_peer(&mut self, public_key: &str) -> Option<PeerSpec> {
        let index = self.peers.iter().position(|p| p.public_key == public_key)?;
        debug!(peer = %public_key, "removing peer");
        Some(self.peers.remove(index))
    }

    /// Looks up a peer by public key. An empty key finds nothing.
    #[must_use]
    pub fn get_peer(&self, public_key: &str) -> Option<&PeerSpec> {
        if public_key.is_empty() {
            return None;
        }
        self.peers.iter().find(|p| p.public_key == public_key)
    }

    /// Builds a peer entry that other configs can use to reach this node.
    ///
    /// # Errors
    ///
    /// Returns `Precondition` if this config has no public key yet.
    pub fn create_peer(&self, settings: PeerSettings) -> Result<PeerSpec> {
        match self.public_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(settings.into_peer(key)),
            _ => Err(ConfigError::precondition(
                "config has no public key; generate keys first",
            )),
        }
    }

    /// The private key a key generator should reuse, if any.
    #[must_use]
    pub fn reusable_private_key(&self, options: GenerateKeysOptions) -> Option<&str> {
        if options.overwrite {
            return None;
        }
        Some(self.interface.private_key.as_str()).filter(|k| !k.is_empty())
    }

    /// Stores freshly generated keys on this config.
    ///
    /// The pre-shared key cache is cleared when none was generated.
    pub fn apply_keys(&mut self, keys: &KeyMaterial) {
        self.interface.private_key.clone_from(&keys.private_key);
        self.public_key = Some(keys.public_key.clone());
        self.pre_shared_key.clone_from(&keys.pre_shared_key);
    }

    /// Generates keys in-process instead of asking the `wg` tool.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing private key cannot be decoded.
    pub fn generate_keys_native(&mut self, options: GenerateKeysOptions) -> Result<KeyMaterial> {
        let keys = match self.reusable_private_key(options) {
            Some(existing) => KeyMaterial::from_private_key(existing, options.pre_shared_key)?,
            None => KeyMaterial::generate(options.pre_shared_key),
        };
        self.apply_keys(&keys);
        Ok(keys)
    }

    /// Checks that the config can be written as a usable `wg-quick` file.
    ///
    /// A config that passes parses back from its own text.
    ///
    /// # Errors
    ///
    /// Returns a structural error naming the first problem found.
    pub fn validate(&self) -> Result<()> {
        if let Some(reason) = self.interface_problem() {
            return Err(ConfigError::no_valid_interface(
                reason,
                self.to_config_string(),
            ));
        }
        for peer in &self.peers {
            if let Some(reason) = peer_problem(peer) {
                return Err(ConfigError::invalid_peer(
                    reason,
                    generate_wg_config(&self.interface, std::slice::from_ref(peer)),
                ));
            }
        }
        Ok(())
    }

    fn interface_problem(&self) -> Option<String> {
        let iface = &self.interface;
        if iface.addresses.is_empty() {
            return Some("interface has no address".to_string());
        }
        if iface.private_key.trim().is_empty() {
            return Some("interface has no private key".to_string());
        }
        list_problem("Address", &iface.addresses)
            .or_else(|| list_problem("DNS", &iface.dns))
            .or_else(|| line_break("PrivateKey", &iface.private_key))
            .or_else(|| iface.name.as_deref().and_then(|v| line_break("Name", v)))
            .or_else(|| iface.table.as_deref().and_then(|v| line_break("Table", v)))
            .or_else(|| {
                [
                    ("PreUp", &iface.pre_up),
                    ("PostUp", &iface.post_up),
                    ("PreDown", &iface.pre_down),
                    ("PostDown", &iface.post_down),
                ]
                .into_iter()
                .find_map(|(key, commands)| commands.iter().find_map(|c| line_break(key, c)))
            })
    }
}

fn peer_problem(peer: &PeerSpec) -> Option<String> {
    if peer.public_key.trim().is_empty() {
        return Some("peer has no public key".to_string());
    }
    if peer.allowed_ips.is_empty() {
        return Some(format!("peer {} has no allowed IPs", peer.public_key));
    }
    line_break("PublicKey", &peer.public_key)
        .or_else(|| list_problem("AllowedIPs", &peer.allowed_ips))
        .or_else(|| peer.name.as_deref().and_then(|v| line_break("Name", v)))
        .or_else(|| peer.endpoint.as_deref().and_then(|v| line_break("Endpoint", v)))
        .or_else(|| {
            peer.pre_shared_key
                .as_deref()
                .and_then(|v| line_break("PresharedKey", v))
        })
}

/// Entries of a comma-separated field must be non-blank single values.
fn list_problem(key: &str, entries: &[String]) -> Option<String> {
    entries.iter().find_map(|entry| {
        if entry.trim().is_empty() {
            Some(format!("{key} has a blank entry"))
        } else if entry.contains(',') {
            Some(format!("{key} entry {entry:?} contains a comma"))
        } else {
            line_break(key, entry)
        }
    })
}

fn line_break(key: &str, value: &str) -> Option<String> {
    value
        .contains(['\n', '\r'])
        .then(|| format!("{key} contains a line break"))
}

impl fmt::Display for WgConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_config_string())
    }
}

impl FromStr for WgConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
