//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use wgmesh_tools::{ToolsConfig, DEFAULT_PUBLIC_IP_URL};

/// wgmesh - build and manage WireGuard mesh configs.
#[derive(Parser, Debug, Clone)]
#[command(name = "wgmesh")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table, global = true)]
    pub format: Format,

    /// Path to the `wg` binary.
    #[arg(long = "wg", env = "WGMESH_WG", global = true)]
    pub wg_path: Option<String>,

    /// Path to the `wg-quick` binary.
    #[arg(long = "wg-quick", env = "WGMESH_WG_QUICK", global = true)]
    pub wg_quick_path: Option<String>,

    /// Plain-text service that echoes the caller's IPv4 address.
    #[arg(long, env = "WGMESH_PUBLIC_IP_URL", default_value = DEFAULT_PUBLIC_IP_URL, global = true)]
    pub public_ip_url: String,

    /// Generate keys in-process instead of running `wg`.
    #[arg(long, global = true)]
    pub native_keys: bool,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Tool settings from the global flags.
    #[must_use]
    pub fn tools_config(&self) -> ToolsConfig {
        ToolsConfig {
            wg_path: self.wg_path.clone(),
            wg_quick_path: self.wg_quick_path.clone(),
            public_ip_url: self.public_ip_url.clone(),
        }
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show a config file.
    Show {
        /// Config file to read.
        file: PathBuf,

        /// Print the regenerated config text instead of a summary.
        #[arg(long)]
        raw: bool,
    },

    /// Generate keys for a config file and write it back.
    Keys(KeysArgs),

    /// Add or update a peer in a config file.
    AddPeer(AddPeerArgs),

    /// Remove a peer from a config file.
    RemovePeer {
        /// Config file to edit.
        file: PathBuf,

        /// Public key of the peer to remove.
        public_key: String,

        /// Restart the interface after writing.
        #[arg(long)]
        apply: bool,
    },

    /// Add every config file as a peer of every other.
    Pair(PairArgs),

    /// Build a mesh from a JSON definition file.
    Mesh {
        /// Mesh definition (JSON).
        definition: PathBuf,

        /// Pair and print the result without writing any file.
        #[arg(long)]
        dry_run: bool,
    },

    /// Bring an interface up with `wg-quick`.
    Up {
        /// Config file of the interface.
        file: PathBuf,
    },

    /// Bring an interface down with `wg-quick`.
    Down {
        /// Config file of the interface.
        file: PathBuf,
    },

    /// Bring an interface down and up again.
    Restart {
        /// Config file of the interface.
        file: PathBuf,
    },

    /// Print this machine's public IPv4 address.
    PublicIp,

    /// Check that the WireGuard tools are installed.
    Check,
}

/// Arguments for `keys`.
#[derive(Args, Debug, Clone)]
pub struct KeysArgs {
    /// Config file to update.
    pub file: PathBuf,

    /// Also generate a pre-shared key.
    #[arg(long)]
    pub psk: bool,

    /// Replace an existing private key.
    #[arg(long)]
    pub overwrite: bool,
}

/// Arguments for `add-peer`.
#[derive(Args, Debug, Clone)]
pub struct AddPeerArgs {
    /// Config file to edit.
    pub file: PathBuf,

    /// The peer's public key.
    #[arg(long)]
    pub public_key: String,

    /// Address ranges routed to the peer (comma-separated).
    #[arg(long, value_delimiter = ',', required = true)]
    pub allowed_ips: Vec<String>,

    /// Public `host:port` of the peer.
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Keepalive interval in seconds.
    #[arg(long)]
    pub keepalive: Option<u16>,

    /// Pre-shared key for the peer.
    #[arg(long)]
    pub pre_shared_key: Option<String>,

    /// Display name for the peer.
    #[arg(long)]
    pub name: Option<String>,

    /// Union allowed IPs with an existing peer instead of replacing them.
    #[arg(long)]
    pub merge: bool,

    /// Restart the interface after writing.
    #[arg(long)]
    pub apply: bool,
}

/// Arguments for `pair`.
#[derive(Args, Debug, Clone)]
pub struct PairArgs {
    /// Config files to pair.
    #[arg(required = true, num_args = 2..)]
    pub files: Vec<PathBuf>,

    /// Keepalive interval set on every peer entry.
    #[arg(long)]
    pub keepalive: Option<u16>,

    /// Generate one pre-shared key and use it on every peer entry.
    #[arg(long)]
    pub psk: bool,

    /// Pair and print the result without writing any file.
    #[arg(long)]
    pub dry_run: bool,
}
