//! Error types for WireGuard config operations.

use thiserror::Error;

/// Result type alias for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while parsing, building or mutating a config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The text has no usable `[Interface]` section, or it lacks a required field.
    #[error("no valid interface: {reason}")]
    NoValidInterface {
        /// What was missing.
        reason: String,
        /// The offending config text.
        text: String,
    },

    /// A `[Peer]` section lacks `AllowedIPs` or `PublicKey`.
    #[error("invalid peer: {reason}")]
    InvalidPeer {
        /// What was missing.
        reason: String,
        /// The offending peer section text.
        text: String,
    },

    /// The operation needs state that has not been established yet.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// Invalid key format.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Invalid base64 encoding.
    #[error("invalid base64 encoding: {0}")]
    InvalidBase64(String),

    /// Invalid key length.
    #[error("invalid key length: expected 32, got {0}")]
    InvalidKeyLength(usize),

    /// JSON (de)serialization of a config failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    /// Creates a `NoValidInterface` error.
    #[must_use]
    pub fn no_valid_interface(reason: impl Into<String>, text: impl Into<String>) -> Self {
        Self::NoValidInterface {
            reason: reason.into(),
            text: text.into(),
        }
    }

    /// Creates an `InvalidPeer` error.
    #[must_use]
    pub fn invalid_peer(reason: impl Into<String>, text: impl Into<String>) -> Self {
        Self::InvalidPeer {
            reason: reason.into(),
            text: text.into(),
        }
    }

    /// Creates a `Precondition` error.
    #[must_use]
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    /// Stable machine-readable code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoValidInterface { .. } => "no_valid_interface",
            Self::InvalidPeer { .. } => "invalid_peer",
            Self::Precondition(_) => "precondition",
            Self::InvalidKey(_) | Self::InvalidBase64(_) | Self::InvalidKeyLength(_) => {
                "invalid_key"
            }
            Self::Json(_) => "json",
        }
    }

    /// Returns `true` for errors describing malformed config text.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::NoValidInterface { .. } | Self::InvalidPeer { .. })
    }

    /// The raw text that triggered a structural error, if any.
    #[must_use]
    pub fn offending_text(&self) -> Option<&str> {
        match self {
            Self::NoValidInterface { text, .. } | Self::InvalidPeer { text, .. } => Some(text),
            _ => None,
        }
    }
}
