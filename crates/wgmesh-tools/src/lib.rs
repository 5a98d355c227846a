//! External collaborators for wgmesh configs.
//!
//! Key generation through `wg`, config file IO with owner-only
//! permissions, `wg-quick` up/down and public IP lookup. Everything here is
//! async and built on tokio.

pub mod command;
pub mod config;
pub mod error;
pub mod fs;
pub mod keygen;
pub mod public_ip;
pub mod tunnel;

pub use command::{AllowedProgram, CommandError, CommandOutput, SafeCommand};
pub use config::ToolsConfig;
pub use error::{Result, ToolError};
pub use fs::{
    ensure_dir_exists, ensure_file_exists, interface_name_from_path, read_config,
    read_config_string, reload_config, write_config, write_config_string,
};
pub use keygen::{
    check_wg_installed, generate_keys, KeyGenerator, NativeKeyGenerator, WgKeyGenerator,
};
pub use public_ip::{PublicIpResolver, DEFAULT_PUBLIC_IP_URL};
pub use tunnel::{
    down, restart, save, up, MockTunnelControl, SaveOptions, TunnelAction, TunnelControl,
    TunnelOutcome, WgQuick,
};
