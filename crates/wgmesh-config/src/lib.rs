//! WireGuard config model, `wg-quick` text codec and mesh pairing.
//!
//! This crate is pure computation: it never touches the filesystem or runs
//! processes. See `wgmesh-tools` for those.
//!
//! # Example
//!
//! ```
//! use wgmesh_config::{create_peer_pairs, InterfaceSpec, PeerPair, PeerSettings, WgConfig};
//!
//! let a = WgConfig::new(InterfaceSpec::new("a-priv", ["10.0.0.1/24"])).with_public_key("A");
//! let b = WgConfig::new(InterfaceSpec::new("b-priv", ["10.0.0.2/24"])).with_public_key("B");
//!
//! let mut pairs = vec![
//!     PeerPair::new(a, PeerSettings::new(["10.0.0.1/32"])),
//!     PeerPair::new(b, PeerSettings::new(["10.0.0.2/32"])),
//! ];
//! create_peer_pairs(&mut pairs).unwrap();
//!
//! let text = pairs[0].config.to_string();
//! assert!(text.contains("PublicKey = B"));
//! ```

pub mod codec;
pub mod entity;
pub mod error;
pub mod keys;
pub mod model;
pub mod pairing;

pub use codec::{generate_wg_config, parse_wg_config, ParsedConfig};
pub use entity::{AddPeerOptions, GenerateKeysOptions, PeerChange, WgConfig};
pub use error::{ConfigError, Result};
pub use keys::{
    decode_key, generate_preshared_key, generate_private_key, public_key_from_private,
    strip_whitespace, KeyMaterial, KEY_SIZE,
};
pub use model::{InterfaceSpec, PeerSettings, PeerSpec};
pub use pairing::{create_peer_pairs, PairContext, PeerPair, PeerSettingsSource, SettingsFactory};
