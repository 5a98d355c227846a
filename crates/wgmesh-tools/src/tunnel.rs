//! Bringing WireGuard interfaces up and down with `wg-quick`.
//!
//! `wg-quick` fails when the interface is already in the requested state.
//! Those failures are reported as [`TunnelOutcome::AlreadyInState`];
//! everything else is a [`ToolError::TunnelFailed`].

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};
use wgmesh_config::WgConfig;

use crate::command::{AllowedProgram, CommandError, SafeCommand};
use crate::error::{Result, ToolError};
use crate::fs::{interface_name_from_path, write_config};

/// Direction of a tunnel change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TunnelAction {
    /// `wg-quick up`.
    Up,
    /// `wg-quick down`.
    Down,
}

impl TunnelAction {
    /// The `wg-quick` subcommand.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl fmt::Display for TunnelAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a successful up or down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TunnelOutcome {
    /// The interface changed state.
    Changed,
    /// The interface was already up (or down).
    AlreadyInState,
}

/// Returns `true` if `stderr` from a failed `wg-quick` run only says the
/// interface is already in the requested state.
#[must_use]
pub fn is_already_in_state(action: TunnelAction, stderr: &str) -> bool {
    match action {
        TunnelAction::Up => stderr.contains("already exists as") && stderr.contains("wg-quick"),
        TunnelAction::Down => stderr.contains("is not a WireGuard interface"),
    }
}

/// Turns a failed run into an outcome or an error.
pub(crate) fn classify_failure(
    action: TunnelAction,
    path: &Path,
    stderr: &str,
) -> Result<TunnelOutcome> {
    if is_already_in_state(action, stderr) {
        warn!(path = %path.display(), %action, "interface already in requested state");
        Ok(TunnelOutcome::AlreadyInState)
    } else {
        Err(ToolError::tunnel_failed(action, path, stderr.trim()))
    }
}

/// Controls the interface described by a config file.
#[allow(async_fn_in_trait)]
pub trait TunnelControl {
    /// Brings the interface up.
    async fn up(&self, path: &Path) -> Result<TunnelOutcome>;

    /// Brings the interface down.
    async fn down(&self, path: &Path) -> Result<TunnelOutcome>;
}

/// Runs the real `wg-quick`.
#[derive(Debug, Clone, Default)]
pub struct WgQuick {
    program_path: Option<String>,
}

impl WgQuick {
    /// Uses `wg-quick` from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `wg-quick` at a specific path.
    #[must_use]
    pub fn with_program_path(mut self, path: impl Into<String>) -> Self {
        self.program_path = Some(path.into());
        self
    }

    async fn run(&self, action: TunnelAction, path: &Path) -> Result<TunnelOutcome> {
        let path_arg = path.to_str().ok_or_else(|| {
            CommandError::invalid_argument("config path", "path is not valid UTF-8")
        })?;
        let output = SafeCommand::new(AllowedProgram::WgQuick)
            .with_program_path_opt(self.program_path.as_deref())
            .arg(action.as_str())
            .arg(path_arg)
            .execute_unchecked()
            .await?;

        if output.success() {
            info!(path = %path.display(), %action, "wireguard interface changed state");
            return Ok(TunnelOutcome::Changed);
        }
        classify_failure(action, path, &output.stderr_lossy())
    }
}

impl TunnelControl for WgQuick {
    async fn up(&self, path: &Path) -> Result<TunnelOutcome> {
        self.run(TunnelAction::Up, path).await
    }

    async fn down(&self, path: &Path) -> Result<TunnelOutcome> {
        self.run(TunnelAction::Down, path).await
    }
}

#[derive(Debug, Default)]
struct MockState {
    up: HashSet<String>,
    calls: Vec<(TunnelAction, PathBuf)>,
    failure: Option<(TunnelAction, String)>,
}

/// In-memory tunnel control for tests.
///
/// Tracks which interfaces are up by interface name and answers repeated
/// ups and downs with the same messages `wg-quick` prints.
#[derive(Debug, Clone, Default)]
pub struct MockTunnelControl {
    state: Arc<RwLock<MockState>>,
}

impl MockTunnelControl {
    /// Creates a mock with every interface down.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later `action` fail with `stderr`.
    pub async fn fail_with(&self, action: TunnelAction, stderr: impl Into<String>) {
        self.state.write().await.failure = Some((action, stderr.into()));
    }

    /// Returns `true` if the named interface is up.
    pub async fn is_up(&self, interface: &str) -> bool {
        self.state.read().await.up.contains(interface)
    }

    /// Every call made so far, in order.
    pub async fn calls(&self) -> Vec<(TunnelAction, PathBuf)> {
        self.state.read().await.calls.clone()
    }

    async fn run(&self, action: TunnelAction, path: &Path) -> Result<TunnelOutcome> {
        let name = interface_name_from_path(path).ok_or_else(|| {
            CommandError::invalid_argument("config path", "no interface name in path")
        })?;

        let mut state = self.state.write().await;
        state.calls.push((action, path.to_path_buf()));

        let failure = state
            .failure
            .clone()
            .filter(|(failing, _)| *failing == action);
        if let Some((_, stderr)) = failure {
            drop(state);
            return classify_failure(action, path, &stderr);
        }

        let changed = match action {
            TunnelAction::Up => state.up.insert(name.clone()),
            TunnelAction::Down => state.up.remove(&name),
        };
        drop(state);

        if changed {
            return Ok(TunnelOutcome::Changed);
        }
        let stderr = match action {
            TunnelAction::Up => format!("wg-quick: `{name}' already exists as `{name}'"),
            TunnelAction::Down => format!("wg-quick: `{name}' is not a WireGuard interface"),
        };
        classify_failure(action, path, &stderr)
    }
}

impl TunnelControl for MockTunnelControl {
    async fn up(&self, path: &Path) -> Result<TunnelOutcome> {
        self.run(TunnelAction::Up, path).await
    }

    async fn down(&self, path: &Path) -> Result<TunnelOutcome> {
        self.run(TunnelAction::Down, path).await
    }
}

/// Brings up the interface for `config`.
///
/// The path is `path` or else the config's own file path.
pub async fn up<T: TunnelControl>(
    tunnel: &T,
    config: &WgConfig,
    path: Option<&Path>,
) -> Result<TunnelOutcome> {
    tunnel.up(config.resolve_path(path)?).await
}

/// Brings down the interface for `config`.
pub async fn down<T: TunnelControl>(
    tunnel: &T,
    config: &WgConfig,
    path: Option<&Path>,
) -> Result<TunnelOutcome> {
    tunnel.down(config.resolve_path(path)?).await
}

/// Brings the interface down and then up again.
///
/// Returns the outcome of the final up.
pub async fn restart<T: TunnelControl>(
    tunnel: &T,
    config: &WgConfig,
    path: Option<&Path>,
) -> Result<TunnelOutcome> {
    let path = config.resolve_path(path)?;
    tunnel.down(path).await?;
    tunnel.up(path).await
}

/// Options for [`save`].
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// Write here instead of the config's own file path.
    pub file_path: Option<PathBuf>,
    /// Only write the file; leave the interface alone.
    pub no_up: bool,
}

/// Writes the config and restarts its interface unless `no_up` is set.
///
/// Returns the path written.
pub async fn save<T: TunnelControl>(
    tunnel: &T,
    config: &WgConfig,
    options: &SaveOptions,
) -> Result<PathBuf> {
    let path = write_config(config, options.file_path.as_deref()).await?;
    if !options.no_up {
        tunnel.down(&path).await?;
        tunnel.up(&path).await?;
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use test_case::test_case;
    use wgmesh_config::InterfaceSpec;

    fn config() -> WgConfig {
        WgConfig::new(InterfaceSpec::new("PRIV", ["10.0.0.1/24"]))
    }

    #[test_case(
        TunnelAction::Up, "wg-quick: `wg0' already exists as `wg0'", true ; "up already exists"
    )]
    #[test_case(TunnelAction::Up, "already exists as wg0", false ; "up without wg-quick marker")]
    #[test_case(
        TunnelAction::Up, "RTNETLINK answers: Operation not permitted", false ; "up permission"
    )]
    #[test_case(
        TunnelAction::Down, "wg-quick: `wg0' is not a WireGuard interface", true ;
        "down not an interface"
    )]
    #[test_case(
        TunnelAction::Down, "wg-quick: `wg0' already exists as `wg0'", false ;
        "down with up message"
    )]
    fn benign_stderr(action: TunnelAction, stderr: &str, benign: bool) {
        assert_eq!(is_already_in_state(action, stderr), benign);
    }

    #[test]
    fn genuine_failure_keeps_stderr() {
        let err = classify_failure(TunnelAction::Up, Path::new("/etc/wireguard/wg0.conf"), "boom\n")
            .expect_err("failure");
        assert!(matches!(
            err,
            ToolError::TunnelFailed { action: TunnelAction::Up, ref stderr, .. } if stderr == "boom"
        ));
    }

    #[tokio::test]
    async fn mock_tracks_state() {
        let tunnel = MockTunnelControl::new();
        let cfg = config().with_file_path("/etc/wireguard/wg0.conf");

        assert_eq!(up(&tunnel, &cfg, None).await.expect("up"), TunnelOutcome::Changed);
        assert!(tunnel.is_up("wg0").await);
        assert_eq!(up(&tunnel, &cfg, None).await.expect("up"), TunnelOutcome::AlreadyInState);

        assert_eq!(down(&tunnel, &cfg, None).await.expect("down"), TunnelOutcome::Changed);
        assert_eq!(down(&tunnel, &cfg, None).await.expect("down"), TunnelOutcome::AlreadyInState);
        assert!(!tunnel.is_up("wg0").await);
    }

    #[tokio::test]
    async fn restart_goes_down_then_up() {
        let tunnel = MockTunnelControl::new();
        let cfg = config();
        let path = Path::new("/etc/wireguard/wg3.conf");

        let outcome = restart(&tunnel, &cfg, Some(path)).await.expect("restart");
        assert_eq!(outcome, TunnelOutcome::Changed);
        let calls = tunnel.calls().await;
        assert_eq!(
            calls,
            vec![
                (TunnelAction::Down, path.to_path_buf()),
                (TunnelAction::Up, path.to_path_buf()),
            ]
        );
    }

    #[tokio::test]
    async fn no_path_is_precondition() {
        let tunnel = MockTunnelControl::new();
        let err = up(&tunnel, &config(), None).await.expect_err("no path");
        assert!(err.is_precondition());
        assert!(tunnel.calls().await.is_empty());
    }

    #[tokio::test]
    async fn genuine_failures_surface() {
        let tunnel = MockTunnelControl::new();
        tunnel
            .fail_with(TunnelAction::Up, "RTNETLINK answers: Operation not permitted")
            .await;
        let cfg = config().with_file_path("/etc/wireguard/wg0.conf");

        let err = up(&tunnel, &cfg, None).await.expect_err("failure");
        assert!(matches!(err, ToolError::TunnelFailed { .. }));
        assert!(!tunnel.is_up("wg0").await);
    }

    #[tokio::test]
    async fn save_writes_and_restarts() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("wg0.conf");
        let tunnel = MockTunnelControl::new();
        let cfg = config().with_file_path(&path);

        let written = save(&tunnel, &cfg, &SaveOptions::default()).await.expect("save");
        assert_eq!(written, path);
        assert!(path.exists());
        assert!(tunnel.is_up("wg0").await);
    }

    #[tokio::test]
    async fn save_no_up_only_writes() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("wg0.conf");
        let tunnel = MockTunnelControl::new();
        let options = SaveOptions {
            file_path: Some(path.clone()),
            no_up: true,
        };

        save(&tunnel, &config(), &options).await.expect("save");
        assert!(path.exists());
        assert!(tunnel.calls().await.is_empty());
    }

    #[tokio::test]
    async fn wg_quick_missing_program_is_command_error() {
        let tunnel = WgQuick::new().with_program_path("/nonexistent/wgmesh-test/wg-quick");
        let err = tunnel
            .up(Path::new("/etc/wireguard/wg0.conf"))
            .await
            .expect_err("missing program");
        assert!(matches!(err, ToolError::Command(ref e) if e.is_not_found()));
    }
}
