//! Error types for the process, filesystem and network collaborators.

use std::path::PathBuf;

use thiserror::Error;
use wgmesh_config::ConfigError;

use crate::command::CommandError;
use crate::tunnel::TunnelAction;

/// Result type alias for tool operations.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Errors that can occur while running tools around a config.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The config itself is invalid or lacks required state.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Running an external program failed.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// `wg` could not be run.
    #[error("WireGuard is not installed; install wg and wg-quick: {message}")]
    NotInstalled {
        /// What went wrong when probing for `wg`.
        message: String,
    },

    /// Reading a config file failed.
    #[error("failed to read config at path: {}: {source}", path.display())]
    FileRead {
        /// The file that was read.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// Writing a config file failed.
    #[error("failed to write config at path: {}: {source}", path.display())]
    FileWrite {
        /// The file that was written.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// `wg-quick` failed for a reason other than the interface already
    /// being in the requested state.
    #[error("wg-quick {action} {} failed: {stderr}", path.display())]
    TunnelFailed {
        /// Whether the tunnel was brought up or down.
        action: TunnelAction,
        /// The config path handed to `wg-quick`.
        path: PathBuf,
        /// Standard error output.
        stderr: String,
    },

    /// The public IP lookup failed.
    #[error("public IP lookup failed: {message}")]
    PublicIp {
        /// Description of the failure.
        message: String,
    },
}

impl ToolError {
    /// Creates a `NotInstalled` error.
    #[must_use]
    pub fn not_installed(message: impl Into<String>) -> Self {
        Self::NotInstalled {
            message: message.into(),
        }
    }

    /// Creates a `FileRead` error.
    #[must_use]
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a `FileWrite` error.
    #[must_use]
    pub fn file_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Creates a `TunnelFailed` error.
    #[must_use]
    pub fn tunnel_failed(
        action: TunnelAction,
        path: impl Into<PathBuf>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::TunnelFailed {
            action,
            path: path.into(),
            stderr: stderr.into(),
        }
    }

    /// Creates a `PublicIp` error.
    #[must_use]
    pub fn public_ip(message: impl Into<String>) -> Self {
        Self::PublicIp {
            message: message.into(),
        }
    }

    /// Returns `true` if the operation needed state the config does not have.
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Config(ConfigError::Precondition(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_write_names_the_path() {
        let err = ToolError::file_write(
            "/etc/wireguard/wg0.conf",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(
            err.to_string(),
            "failed to write config at path: /etc/wireguard/wg0.conf: denied"
        );
    }

    #[test]
    fn tunnel_failed_display() {
        let err = ToolError::tunnel_failed(
            TunnelAction::Up,
            "/etc/wireguard/wg0.conf",
            "RTNETLINK answers: Operation not permitted",
        );
        assert_eq!(
            err.to_string(),
            "wg-quick up /etc/wireguard/wg0.conf failed: RTNETLINK answers: Operation not permitted"
        );
    }

    #[test]
    fn config_errors_pass_through() {
        let err: ToolError = ConfigError::precondition("no file path set for config").into();
        assert!(err.is_precondition());
        assert_eq!(err.to_string(), "precondition failed: no file path set for config");
    }
}
