//! Reading and writing config files.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use wgmesh_config::WgConfig;

use crate::error::{Result, ToolError};

/// Reads a config file as text.
pub async fn read_config_string(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path)
        .await
        .map_err(|e| ToolError::file_read(path, e))
}

/// Reads and parses a config file, remembering its path.
pub async fn read_config(path: impl AsRef<Path>) -> Result<WgConfig> {
    let path = path.as_ref();
    let text = read_config_string(path).await?;
    let config = WgConfig::parse(&text)?.with_file_path(path);
    debug!(path = %path.display(), peers = config.peers.len(), "read config");
    Ok(config)
}

/// Re-reads a config file into an existing config.
///
/// The path is `path` or else the config's own file path. Cached keys
/// survive; interface and peers are replaced.
pub async fn reload_config(config: &mut WgConfig, path: Option<&Path>) -> Result<()> {
    let path = config.resolve_path(path)?.to_path_buf();
    let text = read_config_string(&path).await?;
    config.parse_into(&text)?;
    Ok(())
}

/// Writes a config to `path` or else to its own file path.
///
/// The config is validated first. Returns the path written.
pub async fn write_config(config: &WgConfig, path: Option<&Path>) -> Result<PathBuf> {
    let path = config.resolve_path(path)?.to_path_buf();
    config.validate()?;
    write_config_string(&path, &config.to_config_string()).await?;
    Ok(path)
}

/// Writes config text with owner-only permissions, creating parent
/// directories as needed.
pub async fn write_config_string(path: impl AsRef<Path>, text: &str) -> Result<()> {
    let path = path.as_ref();
    write_private(path, text)
        .await
        .map_err(|e| ToolError::file_write(path, e))?;
    info!(path = %path.display(), "wrote config");
    Ok(())
}

async fn write_private(path: &Path, text: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .await?;
        file.write_all(text.as_bytes()).await?;
        file.flush().await?;
        // An existing file keeps its old mode on open.
        fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    }

    #[cfg(not(unix))]
    {
        let mut file = fs::File::create(path).await?;
        file.write_all(text.as_bytes()).await?;
        file.flush().await?;
    }

    Ok(())
}

/// Creates a directory and its parents if missing.
pub async fn ensure_dir_exists(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    fs::create_dir_all(path)
        .await
        .map_err(|e| ToolError::file_write(path, e))
}

/// Creates an empty file if nothing exists at `path`.
pub async fn ensure_file_exists(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let result = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await;
    match result {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(ToolError::file_write(path, e)),
    }
}

/// Interface name for a config path: the file name without `.conf`.
///
/// `/etc/wireguard/wg0.conf` gives `wg0`.
#[must_use]
pub fn interface_name_from_path(path: impl AsRef<Path>) -> Option<String> {
    let name = path.as_ref().file_name()?.to_str()?;
    let name = name.strip_suffix(".conf").unwrap_or(name);
    (!name.is_empty()).then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use test_case::test_case;
    use wgmesh_config::{AddPeerOptions, InterfaceSpec, PeerSpec};

    fn sample() -> WgConfig {
        let mut config =
            WgConfig::new(InterfaceSpec::new("PRIV", ["10.0.0.1/24"]).with_listen_port(51820));
        config.add_peer(PeerSpec::new("PEER", ["10.0.0.2/32"]), AddPeerOptions::default());
        config
    }

    #[tokio::test]
    async fn write_then_read() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("nested/dir/wg0.conf");

        let written = write_config(&sample(), Some(&path)).await.expect("write");
        assert_eq!(written, path);

        let config = read_config(&path).await.expect("read");
        assert_eq!(config.interface.listen_port, Some(51820));
        assert_eq!(config.peers.len(), 1);
        assert_eq!(config.file_path(), Some(path.as_path()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn written_files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("wg0.conf");
        std::fs::write(&path, "old").expect("seed");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).expect("chmod");

        write_config_string(&path, "[Interface]\n").await.expect("write");

        let mode = std::fs::metadata(&path).expect("metadata").permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "[Interface]\n");
    }

    #[tokio::test]
    async fn write_without_path_is_precondition() {
        let err = write_config(&sample(), None).await.expect_err("no path");
        assert!(err.is_precondition());
    }

    #[tokio::test]
    async fn write_uses_own_file_path() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("wg1.conf");
        let config = sample().with_file_path(&path);

        assert_eq!(write_config(&config, None).await.expect("write"), path);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn invalid_config_is_not_written() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("wg0.conf");
        let config = WgConfig::new(InterfaceSpec::new("", ["10.0.0.1/24"]));

        assert!(matches!(
            write_config(&config, Some(&path)).await,
            Err(ToolError::Config(_))
        ));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn reload_keeps_cached_keys() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("wg0.conf");
        write_config_string(&path, "[Interface]\nAddress = 10.1.0.1/24\nPrivateKey = NEW\n")
            .await
            .expect("write");

        let mut config = sample().with_public_key("PUB").with_file_path(&path);
        reload_config(&mut config, None).await.expect("reload");

        assert_eq!(config.interface.private_key, "NEW");
        assert!(config.peers.is_empty());
        assert_eq!(config.public_key.as_deref(), Some("PUB"));
    }

    #[tokio::test]
    async fn read_missing_file_names_path() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("missing.conf");
        let err = read_config(&path).await.expect_err("missing");
        assert!(matches!(err, ToolError::FileRead { .. }));
        assert!(err.to_string().contains("missing.conf"));
    }

    #[tokio::test]
    async fn read_malformed_file_is_structural() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("bad.conf");
        std::fs::write(&path, "[Peer]\nPublicKey = x\nAllowedIPs = 10.0.0.1/32\n").expect("seed");

        let err = read_config(&path).await.expect_err("no interface");
        assert!(matches!(
            err,
            ToolError::Config(ref e) if e.code() == "no_valid_interface"
        ));
    }

    #[tokio::test]
    async fn ensure_helpers_are_idempotent() {
        let dir = TempDir::new().expect("tempdir");
        let sub = dir.path().join("a/b");
        ensure_dir_exists(&sub).await.expect("dir");
        ensure_dir_exists(&sub).await.expect("dir again");

        let file = sub.join("wg0.conf");
        ensure_file_exists(&file).await.expect("file");
        std::fs::write(&file, "keep").expect("write");
        ensure_file_exists(&file).await.expect("file again");
        assert_eq!(std::fs::read_to_string(&file).expect("read"), "keep");
    }

    #[test_case("/etc/wireguard/wg0.conf", Some("wg0") ; "conf file")]
    #[test_case("relative/mesh-a.conf", Some("mesh-a") ; "relative")]
    #[test_case("wg1", Some("wg1") ; "no extension")]
    #[test_case("/", None ; "root")]
    fn interface_names(path: &str, expected: Option<&str>) {
        assert_eq!(interface_name_from_path(path).as_deref(), expected);
    }
}
