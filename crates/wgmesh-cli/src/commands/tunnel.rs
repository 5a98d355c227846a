//! `up`, `down` and `restart`.

use std::io::Write;
use std::path::Path;

use wgmesh_tools::{down, read_config, restart, up, TunnelAction, TunnelControl};

use crate::commands::display_path;
use crate::error::CliError;
use crate::output::{OutputFormat, TunnelReport};

/// Which tunnel operation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunnelRequest {
    /// Bring the interface up.
    Up,
    /// Bring the interface down.
    Down,
    /// Down, then up.
    Restart,
}

/// Tunnel command executor.
pub struct TunnelCommand<'a, T> {
    tunnel: &'a T,
}

impl<'a, T: TunnelControl> TunnelCommand<'a, T> {
    /// Create a new tunnel command.
    #[must_use]
    pub fn new(tunnel: &'a T) -> Self {
        Self { tunnel }
    }

    /// Reads `file` so a malformed config fails before `wg-quick` runs,
    /// then applies `request` to it.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        request: TunnelRequest,
        file: &Path,
    ) -> Result<(), CliError> {
        let config = read_config(file).await?;
        let (action, outcome) = match request {
            TunnelRequest::Up => (TunnelAction::Up, up(self.tunnel, &config, None).await?),
            TunnelRequest::Down => (TunnelAction::Down, down(self.tunnel, &config, None).await?),
            TunnelRequest::Restart => {
                (TunnelAction::Up, restart(self.tunnel, &config, None).await?)
            }
        };

        let report = TunnelReport {
            file: display_path(Some(file)),
            action,
            outcome,
        };
        format.write(writer, &report)
    }
}
