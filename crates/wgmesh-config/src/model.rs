//! Core types for `WireGuard` configuration.
//!
//! Keys, addresses and endpoints are kept as opaque strings: the text
//! format only needs them to be present, not semantically valid.

use serde::{Deserialize, Serialize};

/// Settings for the local node (`[Interface]` section).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceSpec {
    /// Display name, stored as a `# Name =` comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Addresses (CIDR) assigned to this interface.
    #[serde(rename = "address")]
    pub addresses: Vec<String>,
    /// UDP listen port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen_port: Option<u16>,
    /// The interface's private key; empty until keys are generated.
    #[serde(default)]
    pub private_key: String,
    /// DNS servers announced to the tunnel.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns: Vec<String>,
    /// Routing table; `off` and `auto` are special to `wg-quick`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    /// Interface MTU.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u16>,
    /// Commands run before the interface comes up, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre_up: Vec<String>,
    /// Commands run after the interface comes up, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_up: Vec<String>,
    /// Commands run before the interface goes down, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre_down: Vec<String>,
    /// Commands run after the interface goes down, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_down: Vec<String>,
}

impl InterfaceSpec {
    /// Creates an interface with a private key and its addresses.
    #[must_use]
    pub fn new<I, S>(private_key: impl Into<String>, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            private_key: private_key.into(),
            addresses: addresses.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the listen port.
    #[must_use]
    pub fn with_listen_port(mut self, port: u16) -> Self {
        self.listen_port = Some(port);
        self
    }

    /// Adds a DNS server.
    #[must_use]
    pub fn with_dns(mut self, server: impl Into<String>) -> Self {
        self.dns.push(server.into());
        self
    }

    /// Sets the routing table.
    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Sets the MTU.
    #[must_use]
    pub fn with_mtu(mut self, mtu: u16) -> Self {
        self.mtu = Some(mtu);
        self
    }

    /// Appends a `PreUp` command.
    #[must_use]
    pub fn with_pre_up(mut self, command: impl Into<String>) -> Self {
        self.pre_up.push(command.into());
        self
    }

    /// Appends a `PostUp` command.
    #[must_use]
    pub fn with_post_up(mut self, command: impl Into<String>) -> Self {
        self.post_up.push(command.into());
        self
    }

    /// Appends a `PreDown` command.
    #[must_use]
    pub fn with_pre_down(mut self, command: impl Into<String>) -> Self {
        self.pre_down.push(command.into());
        self
    }

    /// Appends a `PostDown` command.
    #[must_use]
    pub fn with_post_down(mut self, command: impl Into<String>) -> Self {
        self.post_down.push(command.into());
        self
    }
}

/// Settings for a remote node (`[Peer]` section).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerSpec {
    /// Display name, stored as a `# Name =` comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Public `host:port` of the peer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Address ranges (CIDR) routed to this peer.
    pub allowed_ips: Vec<String>,
    /// The peer's public key; unique within a config.
    pub public_key: String,
    /// Keepalive interval in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent_keepalive: Option<u16>,
    /// Pre-shared key for this peer relationship.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_shared_key: Option<String>,
}

impl PeerSpec {
    /// Creates a peer with a public key and its allowed IPs.
    #[must_use]
    pub fn new<I, S>(public_key: impl Into<String>, allowed_ips: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            public_key: public_key.into(),
            allowed_ips: allowed_ips.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the persistent keepalive interval.
    #[must_use]
    pub fn with_persistent_keepalive(mut self, seconds: u16) -> Self {
        self.persistent_keepalive = Some(seconds);
        self
    }

    /// Sets the pre-shared key.
    #[must_use]
    pub fn with_pre_shared_key(mut self, key: impl Into<String>) -> Self {
        self.pre_shared_key = Some(key.into());
        self
    }

    /// Overwrites this peer with every field `incoming` sets.
    ///
    /// Unset optional fields on `incoming` leave the current value alone.
    /// `AllowedIPs` are unioned (existing first) when `merge_allowed_ips`
    /// is set and replaced otherwise.
    pub fn merge_from(&mut self, incoming: Self, merge_allowed_ips: bool) {
        if incoming.name.is_some() {
            self.name = incoming.name;
        }
        if incoming.endpoint.is_some() {
            self.endpoint = incoming.endpoint;
        }
        if incoming.persistent_keepalive.is_some() {
            self.persistent_keepalive = incoming.persistent_keepalive;
        }
        if incoming.pre_shared_key.is_some() {
            self.pre_shared_key = incoming.pre_shared_key;
        }
        if !incoming.public_key.is_empty() {
            self.public_key = incoming.public_key;
        }

        if merge_allowed_ips {
            for ip in incoming.allowed_ips {
                if !self.allowed_ips.contains(&ip) {
                    self.allowed_ips.push(ip);
                }
            }
        } else {
            self.allowed_ips = incoming.allowed_ips;
        }
    }
}

/// Peer settings without an identity; turned into a [`PeerSpec`] by
/// [`crate::WgConfig::create_peer`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerSettings {
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Public `host:port`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Address ranges (CIDR) routed to the peer.
    #[serde(default)]
    pub allowed_ips: Vec<String>,
    /// Keepalive interval in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent_keepalive: Option<u16>,
    /// Pre-shared key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_shared_key: Option<String>,
}

impl PeerSettings {
    /// Creates settings routing the given ranges.
    #[must_use]
    pub fn new<I, S>(allowed_ips: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_ips: allowed_ips.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the persistent keepalive interval.
    #[must_use]
    pub fn with_persistent_keepalive(mut self, seconds: u16) -> Self {
        self.persistent_keepalive = Some(seconds);
        self
    }

    /// Sets the pre-shared key.
    #[must_use]
    pub fn with_pre_shared_key(mut self, key: impl Into<String>) -> Self {
        self.pre_shared_key = Some(key.into());
        self
    }

    /// Attaches an identity to these settings.
    #[must_use]
    pub fn into_peer(self, public_key: impl Into<String>) -> PeerSpec {
        PeerSpec {
            name: self.name,
            endpoint: self.endpoint,
            allowed_ips: self.allowed_ips,
            public_key: public_key.into(),
            persistent_keepalive: self.persistent_keepalive,
            pre_shared_key: self.pre_shared_key,
        }
    }
}
