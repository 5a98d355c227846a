//! WireGuard configuration file generation and parsing.
//!
//! This module handles the INI-style `wg-quick` format. A `# Name = ...`
//! comment carries a display name for the section it appears in.
//!
//! Keys are matched exactly against the text before the first `=` on a
//! line, so a key never matches inside another key's line.

use std::fmt::Write as FmtWrite;

use crate::error::{ConfigError, Result};
use crate::model::{InterfaceSpec, PeerSpec};

const NAME_KEY: &str = "Name";

/// Interface and peers read from config text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedConfig {
    /// The `[Interface]` section.
    pub interface: InterfaceSpec,
    /// Every `[Peer]` section, in file order.
    pub peers: Vec<PeerSpec>,
}

/// Generates `wg-quick` config text from an interface and its peers.
///
/// Unset, empty and zero values are left out.
#[must_use]
pub fn generate_wg_config(interface: &InterfaceSpec, peers: &[PeerSpec]) -> String {
    let mut output = String::new();

    output.push_str("[Interface]\n");
    if let Some(name) = non_empty(interface.name.as_deref()) {
        let _ = writeln!(output, "# {NAME_KEY} = {name}");
    }
    if !interface.addresses.is_empty() {
        let _ = writeln!(output, "Address = {}", interface.addresses.join(","));
    }
    if !interface.private_key.is_empty() {
        let _ = writeln!(output, "PrivateKey = {}", interface.private_key);
    }
    if let Some(port) = interface.listen_port.filter(|p| *p != 0) {
        let _ = writeln!(output, "ListenPort = {port}");
    }
    if !interface.dns.is_empty() {
        let _ = writeln!(output, "DNS = {}", interface.dns.join(","));
    }
    if let Some(mtu) = interface.mtu.filter(|m| *m != 0) {
        let _ = writeln!(output, "MTU = {mtu}");
    }
    if let Some(table) = non_empty(interface.table.as_deref()) {
        let _ = writeln!(output, "Table = {table}");
    }
    for (key, commands) in [
        ("PreUp", &interface.pre_up),
        ("PostUp", &interface.post_up),
        ("PreDown", &interface.pre_down),
        ("PostDown", &interface.post_down),
    ] {
        for command in commands {
            let _ = writeln!(output, "{key} = {command}");
        }
    }

    for peer in peers {
        output.push('\n');
        output.push_str("[Peer]\n");
        if let Some(name) = non_empty(peer.name.as_deref()) {
            let _ = writeln!(output, "# {NAME_KEY} = {name}");
        }
        if !peer.public_key.is_empty() {
            let _ = writeln!(output, "PublicKey = {}", peer.public_key);
        }
        if !peer.allowed_ips.is_empty() {
            let _ = writeln!(output, "AllowedIPs = {}", peer.allowed_ips.join(","));
        }
        if let Some(endpoint) = non_empty(peer.endpoint.as_deref()) {
            let _ = writeln!(output, "Endpoint = {endpoint}");
        }
        if let Some(psk) = non_empty(peer.pre_shared_key.as_deref()) {
            let _ = writeln!(output, "PresharedKey = {psk}");
        }
        if let Some(keepalive) = peer.persistent_keepalive.filter(|k| *k != 0) {
            let _ = writeln!(output, "PersistentKeepalive = {keepalive}");
        }
    }

    output
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Section kinds recognised by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Interface,
    Peer,
    Other,
}

/// A section header and the lines that follow it.
#[derive(Debug)]
struct Block<'a> {
    section: Section,
    lines: Vec<&'a str>,
}

impl Block<'_> {
    fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Values of every line whose key is exactly `key`.
    fn values<'k>(&'k self, key: &'k str) -> impl Iterator<Item = &'k str> + 'k {
        self.lines.iter().filter_map(move |line| line_value(line, key))
    }

    fn first(&self, key: &str) -> Option<String> {
        self.values(key).next().map(str::to_string)
    }

    fn all(&self, key: &str) -> Vec<String> {
        self.values(key).map(str::to_string).collect()
    }

    fn list(&self, key: &str) -> Vec<String> {
        self.values(key)
            .next()
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn number(&self, key: &str) -> Option<u16> {
        self.values(key)
            .next()
            .and_then(|value| value.parse::<u16>().ok())
            .filter(|n| *n != 0)
    }
}

/// Extracts the value of `line` if its key is `key`.
///
/// `Name` only lives in `#` comments; every other key is ignored when
/// commented out.
fn line_value<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let line = line.trim();
    let line = match line.strip_prefix('#') {
        Some(comment) if key == NAME_KEY => comment,
        Some(_) => return None,
        None if key == NAME_KEY => return None,
        None => line,
    };

    let (k, v) = line.split_once('=')?;
    if k.trim() != key {
        return None;
    }
    let v = v.trim();
    (!v.is_empty()).then_some(v)
}

/// Section named by a header line such as `[Peer]` or `[Peer] # laptop`.
fn section_header(line: &str) -> Option<Section> {
    let header = line.split_once('#').map_or(line, |(before, _)| before).trim();
    let name = header.strip_prefix('[')?.strip_suffix(']')?;
    Some(match name.trim() {
        "Interface" => Section::Interface,
        "Peer" => Section::Peer,
        _ => Section::Other,
    })
}

fn split_sections(text: &str) -> Vec<Block<'_>> {
    let mut blocks: Vec<Block<'_>> = Vec::new();

    for line in text.lines() {
        if let Some(section) = section_header(line) {
            blocks.push(Block {
                section,
                lines: vec![line],
            });
            continue;
        }

        // Lines before the first header belong to no section.
        if let Some(block) = blocks.last_mut() {
            block.lines.push(line);
        }
    }

    blocks
}

/// Parses `wg-quick` config text.
///
/// The first `[Interface]` section is used; it must carry `Address` and
/// `PrivateKey`. Every `[Peer]` section must carry `PublicKey` and
/// `AllowedIPs`. The first invalid section aborts the whole parse.
pub fn parse_wg_config(config_str: &str) -> Result<ParsedConfig> {
    let blocks = split_sections(config_str);

    let interface_block = blocks
        .iter()
        .find(|b| b.section == Section::Interface)
        .ok_or_else(|| {
            ConfigError::no_valid_interface("no [Interface] section found", config_str)
        })?;
    let interface = parse_interface(interface_block, config_str)?;

    let peers = blocks
        .iter()
        .filter(|b| b.section == Section::Peer)
        .map(parse_peer)
        .collect::<Result<Vec<_>>>()?;

    Ok(ParsedConfig { interface, peers })
}

fn parse_interface(block: &Block<'_>, config_str: &str) -> Result<InterfaceSpec> {
    let addresses = block.list("Address");
    if addresses.is_empty() {
        return Err(ConfigError::no_valid_interface(
            "missing Address in [Interface] section",
            config_str,
        ));
    }

    let private_key = block.first("PrivateKey").ok_or_else(|| {
        ConfigError::no_valid_interface("missing PrivateKey in [Interface] section", config_str)
    })?;

    Ok(InterfaceSpec {
        name: block.first(NAME_KEY),
        addresses,
        listen_port: block.number("ListenPort"),
        private_key,
        dns: block.list("DNS"),
        table: block.first("Table"),
        mtu: block.number("MTU"),
        pre_up: block.all("PreUp"),
        post_up: block.all("PostUp"),
        pre_down: block.all("PreDown"),
        post_down: block.all("PostDown"),
    })
}

fn parse_peer(block: &Block<'_>) -> Result<PeerSpec> {
    let allowed_ips = block.list("AllowedIPs");
    if allowed_ips.is_empty() {
        return Err(ConfigError::invalid_peer(
            "missing AllowedIPs in [Peer] section",
            block.text(),
        ));
    }

    let public_key = block.first("PublicKey").ok_or_else(|| {
        ConfigError::invalid_peer("missing PublicKey in [Peer] section", block.text())
    })?;

    Ok(PeerSpec {
        name: block.first(NAME_KEY),
        endpoint: block.first("Endpoint"),
        allowed_ips,
        public_key,
        persistent_keepalive: block.number("PersistentKeepalive"),
        pre_shared_key: block.first("PresharedKey"),
    })
}
