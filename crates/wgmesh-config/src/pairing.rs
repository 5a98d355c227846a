//! Full-mesh peer pairing.
//!
//! Every config in a set is added as a peer to every other config, so that
//! after one pass each node knows all the others.

use std::fmt;

use tracing::{debug, info};

use crate::entity::{AddPeerOptions, WgConfig};
use crate::error::Result;
use crate::model::PeerSettings;

/// The two configs involved when deriving peer settings.
#[derive(Debug, Clone, Copy)]
pub struct PairContext<'a> {
    /// The config receiving the peer entry.
    pub this_config: &'a WgConfig,
    /// The config the peer entry describes.
    pub peer_config: &'a WgConfig,
}

/// Settings factory signature.
pub type SettingsFactory = Box<dyn Fn(PairContext<'_>) -> PeerSettings>;

/// How other nodes should see a config when adding it as a peer.
pub enum PeerSettingsSource {
    /// The same settings for every receiving node.
    Static(PeerSettings),
    /// Settings computed per receiving node.
    Factory(SettingsFactory),
}

impl PeerSettingsSource {
    /// Wraps a closure as a factory.
    pub fn factory(f: impl Fn(PairContext<'_>) -> PeerSettings + 'static) -> Self {
        Self::Factory(Box::new(f))
    }

    fn resolve(&self, ctx: PairContext<'_>) -> PeerSettings {
        match self {
            Self::Static(settings) => settings.clone(),
            Self::Factory(f) => f(ctx),
        }
    }
}

impl From<PeerSettings> for PeerSettingsSource {
    fn from(settings: PeerSettings) -> Self {
        Self::Static(settings)
    }
}

impl fmt::Debug for PeerSettingsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(settings) => f.debug_tuple("Static").field(settings).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// A config and the settings others use to reach it.
#[derive(Debug)]
pub struct PeerPair {
    /// The node's config; receives peers during pairing.
    pub config: WgConfig,
    /// How this node appears in other configs.
    pub settings: PeerSettingsSource,
}

impl PeerPair {
    /// Creates a pair entry.
    pub fn new(config: WgConfig, settings: impl Into<PeerSettingsSource>) -> Self {
        Self {
            config,
            settings: settings.into(),
        }
    }

    /// Returns the config.
    #[must_use]
    pub fn into_config(self) -> WgConfig {
        self.config
    }
}

/// Adds every config as a peer of every other config.
///
/// Pairs run in order with the receiving config as the outer loop. Two
/// entries with the same public key are treated as one node and skipped.
/// When the receiving config has a pre-shared key it overrides whatever
/// the settings say. Existing peers are updated in replace mode.
///
/// # Errors
///
/// Stops at the first config with no public key. Peers added before the
/// failure stay in place.
pub fn create_peer_pairs(pairs: &mut [PeerPair]) -> Result<()> {
    let mut added = 0usize;

    for i in 0..pairs.len() {
        for j in 0..pairs.len() {
            let peer = {
                let this = &pairs[i];
                let other = &pairs[j];
                if this.config.public_key == other.config.public_key {
                    continue;
                }

                let mut settings = other.settings.resolve(PairContext {
                    this_config: &this.config,
                    peer_config: &other.config,
                });
                if let Some(psk) = this.config.pre_shared_key.as_deref().filter(|k| !k.is_empty()) {
                    settings.pre_shared_key = Some(psk.to_string());
                }
                other.config.create_peer(settings)?
            };

            debug!(receiver = i, peer = %peer.public_key, "pairing");
            pairs[i].config.add_peer(peer, AddPeerOptions::default());
            added += 1;
        }
    }

    info!(configs = pairs.len(), peers_added = added, "peer pairing complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::model::InterfaceSpec;

    fn node(key: &str, address: &str) -> WgConfig {
        WgConfig::new(InterfaceSpec::new(format!("{key}-priv"), [address])).with_public_key(key)
    }

    fn keys(config: &WgConfig) -> Vec<&str> {
        config.peers.iter().map(|p| p.public_key.as_str()).collect()
    }

    #[test]
    fn three_nodes_form_a_full_mesh() {
        let mut pairs = vec![
            PeerPair::new(node("A", "10.0.0.1/24"), PeerSettings::new(["10.0.0.1/32"])),
            PeerPair::new(node("B", "10.0.0.2/24"), PeerSettings::new(["10.0.0.2/32"])),
            PeerPair::new(node("C", "10.0.0.3/24"), PeerSettings::new(["10.0.0.3/32"])),
        ];
        create_peer_pairs(&mut pairs).expect("pairing");

        assert_eq!(keys(&pairs[0].config), vec!["B", "C"]);
        assert_eq!(keys(&pairs[1].config), vec!["A", "C"]);
        assert_eq!(keys(&pairs[2].config), vec!["A", "B"]);
        assert_eq!(pairs[0].config.peers[0].allowed_ips, vec!["10.0.0.2/32"]);
        assert!(pairs
            .iter()
            .flat_map(|p| &p.config.peers)
            .all(|peer| peer.pre_shared_key.is_none()));
    }

    #[test]
    fn receiver_pre_shared_key_wins() {
        let mut pairs = vec![
            PeerPair::new(
                node("A", "10.0.0.1/24").with_pre_shared_key("psk"),
                PeerSettings::new(["10.0.0.1/32"]),
            ),
            PeerPair::new(
                node("B", "10.0.0.2/24"),
                PeerSettingsSource::factory(|_| {
                    PeerSettings::new(["10.0.0.2/32"]).with_pre_shared_key("from-factory")
                }),
            ),
            PeerPair::new(node("C", "10.0.0.3/24"), PeerSettings::new(["10.0.0.3/32"])),
        ];
        create_peer_pairs(&mut pairs).expect("pairing");

        for peer in &pairs[0].config.peers {
            assert_eq!(peer.pre_shared_key.as_deref(), Some("psk"));
        }
        // C has no key of its own, so B's factory value survives there.
        let b_in_c = pairs[2].config.get_peer("B").expect("B");
        assert_eq!(b_in_c.pre_shared_key.as_deref(), Some("from-factory"));
    }

    #[test]
    fn factory_sees_both_configs() {
        let mut pairs = vec![
            PeerPair::new(node("A", "10.0.0.1/24"), PeerSettings::new(["10.0.0.1/32"])),
            PeerPair::new(
                node("B", "10.0.0.2/24"),
                PeerSettingsSource::factory(|ctx| {
                    let receiver = ctx.this_config.public_key.clone().unwrap_or_default();
                    PeerSettings::new(ctx.peer_config.interface.addresses.clone())
                        .with_name(format!("seen-by-{receiver}"))
                }),
            ),
        ];
        create_peer_pairs(&mut pairs).expect("pairing");

        let b = pairs[0].config.get_peer("B").expect("B");
        assert_eq!(b.name.as_deref(), Some("seen-by-A"));
        assert_eq!(b.allowed_ips, vec!["10.0.0.2/24"]);
    }

    #[test]
    fn missing_public_key_aborts() {
        let mut pairs = vec![
            PeerPair::new(node("A", "10.0.0.1/24"), PeerSettings::new(["10.0.0.1/32"])),
            PeerPair::new(
                WgConfig::new(InterfaceSpec::new("priv", ["10.0.0.2/24"])),
                PeerSettings::new(["10.0.0.2/32"]),
            ),
        ];
        let err = create_peer_pairs(&mut pairs).expect_err("no key");
        assert!(matches!(err, ConfigError::Precondition(_)));
    }

    #[test]
    fn shared_public_key_is_skipped() {
        let mut pairs = vec![
            PeerPair::new(node("A", "10.0.0.1/24"), PeerSettings::new(["10.0.0.1/32"])),
            PeerPair::new(node("A", "10.0.0.9/24"), PeerSettings::new(["10.0.0.9/32"])),
        ];
        create_peer_pairs(&mut pairs).expect("pairing");
        assert!(pairs.iter().all(|p| p.config.peers.is_empty()));
    }

    #[test]
    fn rerun_updates_in_place() {
        let mut pairs = vec![
            PeerPair::new(node("A", "10.0.0.1/24"), PeerSettings::new(["10.0.0.1/32"])),
            PeerPair::new(node("B", "10.0.0.2/24"), PeerSettings::new(["10.0.0.2/32"])),
        ];
        create_peer_pairs(&mut pairs).expect("pairing");
        pairs[1].settings = PeerSettings::new(["10.0.1.0/24"]).into();
        create_peer_pairs(&mut pairs).expect("pairing");

        assert_eq!(pairs[0].config.peers.len(), 1);
        assert_eq!(pairs[0].config.peers[0].allowed_ips, vec!["10.0.1.0/24"]);
    }
}
