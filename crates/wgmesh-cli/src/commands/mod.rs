//! CLI command implementations.
//!
//! Each submodule implements a specific CLI command:
//! - [`show`] - Config summary or regenerated text
//! - [`keys`] - Key generation
//! - [`peer`] - Adding and removing peers
//! - [`pair`] - Pairing config files into a mesh
//! - [`mesh`] - Building a mesh from a JSON definition
//! - [`tunnel`] - `wg-quick` up, down and restart
//! - [`system`] - Public IP lookup and install check

pub mod keys;
pub mod mesh;
pub mod pair;
pub mod peer;
pub mod show;
pub mod system;
pub mod tunnel;

use std::path::Path;

use wgmesh_config::KeyMaterial;
use wgmesh_tools::{KeyGenerator, NativeKeyGenerator, WgKeyGenerator};

pub use keys::KeysCommand;
pub use mesh::{MeshCommand, MeshDefinition, MeshNode};
pub use pair::PairCommand;
pub use peer::PeerCommand;
pub use show::ShowCommand;
pub use system::{CheckCommand, PublicIpCommand};
pub use tunnel::{TunnelCommand, TunnelRequest};

/// The key generator picked on the command line.
#[derive(Debug, Clone)]
pub enum KeyBackend {
    /// Run `wg`.
    Wg(WgKeyGenerator),
    /// Generate in-process.
    Native(NativeKeyGenerator),
}

impl KeyGenerator for KeyBackend {
    async fn generate(
        &self,
        with_pre_shared_key: bool,
        existing_private_key: Option<&str>,
    ) -> wgmesh_tools::Result<KeyMaterial> {
        match self {
            Self::Wg(g) => g.generate(with_pre_shared_key, existing_private_key).await,
            Self::Native(g) => g.generate(with_pre_shared_key, existing_private_key).await,
        }
    }
}

pub(crate) fn display_path(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string()).unwrap_or_default()
}
