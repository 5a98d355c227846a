//! # wgmesh-cli
//!
//! Command-line interface for wgmesh.
//!
//! Provides commands for:
//! - Inspecting wg-quick config files
//! - Generating keys
//! - Adding and removing peers
//! - Pairing configs into a full mesh
//! - Bringing interfaces up and down
//!
//! # Architecture
//!
//! Commands are thin wrappers over `wgmesh-config` (the data model, codec
//! and pairing) and `wgmesh-tools` (`wg`, `wg-quick`, files and the public
//! IP lookup). Every command writes either a table or JSON.
//!
//! ```text
//! ┌────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ wgmesh-cli │────►│ wgmesh-tools │────►│ wg, wg-quick │
//! └────────────┘     └──────┬───────┘     └──────────────┘
//!                           ▼
//!                    ┌───────────────┐
//!                    │ wgmesh-config │
//!                    └───────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::{AddPeerArgs, Cli, Commands, Format, KeysArgs, PairArgs};
pub use error::CliError;
pub use output::OutputFormat;
