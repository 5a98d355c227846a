//! Settings shared by the tool collaborators.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::keygen::WgKeyGenerator;
use crate::public_ip::{PublicIpResolver, DEFAULT_PUBLIC_IP_URL};
use crate::tunnel::WgQuick;

/// Where to find `wg` and `wg-quick`, and which service reports the public IP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolsConfig {
    /// Path to `wg`; looked up on `PATH` when unset.
    pub wg_path: Option<String>,
    /// Path to `wg-quick`; looked up on `PATH` when unset.
    pub wg_quick_path: Option<String>,
    /// Plain-text IPv4 echo service.
    pub public_ip_url: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            wg_path: None,
            wg_quick_path: None,
            public_ip_url: DEFAULT_PUBLIC_IP_URL.to_string(),
        }
    }
}

impl ToolsConfig {
    /// Sets the `wg` path.
    #[must_use]
    pub fn with_wg_path(mut self, path: impl Into<String>) -> Self {
        self.wg_path = Some(path.into());
        self
    }

    /// Sets the `wg-quick` path.
    #[must_use]
    pub fn with_wg_quick_path(mut self, path: impl Into<String>) -> Self {
        self.wg_quick_path = Some(path.into());
        self
    }

    /// Sets the public IP service URL.
    #[must_use]
    pub fn with_public_ip_url(mut self, url: impl Into<String>) -> Self {
        self.public_ip_url = url.into();
        self
    }

    /// A key generator using the configured `wg`.
    #[must_use]
    pub fn key_generator(&self) -> WgKeyGenerator {
        match &self.wg_path {
            Some(path) => WgKeyGenerator::new().with_program_path(path.clone()),
            None => WgKeyGenerator::new(),
        }
    }

    /// Tunnel control using the configured `wg-quick`.
    #[must_use]
    pub fn tunnel(&self) -> WgQuick {
        match &self.wg_quick_path {
            Some(path) => WgQuick::new().with_program_path(path.clone()),
            None => WgQuick::new(),
        }
    }

    /// A resolver for the configured service.
    pub fn public_ip_resolver(&self) -> Result<PublicIpResolver> {
        PublicIpResolver::new(self.public_ip_url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ToolsConfig::default();
        assert!(config.wg_path.is_none());
        assert!(config.wg_quick_path.is_none());
        assert_eq!(config.public_ip_url, DEFAULT_PUBLIC_IP_URL);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: ToolsConfig =
            serde_json::from_str(r#"{"wgPath": "/usr/local/bin/wg"}"#).expect("json");
        assert_eq!(config.wg_path.as_deref(), Some("/usr/local/bin/wg"));
        assert_eq!(config.public_ip_url, DEFAULT_PUBLIC_IP_URL);
    }

    #[test]
    fn resolver_uses_configured_url() {
        let config = ToolsConfig::default().with_public_ip_url("https://ip.example.com");
        let resolver = config.public_ip_resolver().expect("resolver");
        assert_eq!(resolver.url(), "https://ip.example.com");
    }
}
