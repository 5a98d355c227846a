//! `show`: print a config file.

use std::io::Write;
use std::path::Path;

use wgmesh_tools::read_config;

use crate::error::CliError;
use crate::output::{ConfigSummary, OutputFormat};

/// Show command executor.
#[derive(Debug, Default)]
pub struct ShowCommand;

impl ShowCommand {
    /// Create a new show command.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Reads `file` and prints a summary, or with `raw` the regenerated
    /// config text.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        file: &Path,
        raw: bool,
    ) -> Result<(), CliError> {
        let config = read_config(file).await?;
        if raw {
            write!(writer, "{config}")?;
            return Ok(());
        }
        format.write(writer, &ConfigSummary::from_config(&config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Format;
    use tempfile::TempDir;

    const TEXT: &str = "[Interface]\n# Name = hub\nAddress = 10.0.0.1/24\nPrivateKey = PRIV\n\
                        ListenPort = 51820\n\n[Peer]\nPublicKey = PEER\nAllowedIPs = 10.0.0.2/32\n";

    #[tokio::test]
    async fn raw_output_regenerates_text() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("wg0.conf");
        std::fs::write(&path, TEXT).expect("write");

        let mut buf = Vec::new();
        ShowCommand::new()
            .execute(&mut buf, &OutputFormat::default(), &path, true)
            .await
            .expect("show");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("ListenPort = 51820"));
        assert!(text.contains("PublicKey = PEER"));
    }

    #[tokio::test]
    async fn json_summary() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("wg0.conf");
        std::fs::write(&path, TEXT).expect("write");

        let mut buf = Vec::new();
        ShowCommand::new()
            .execute(&mut buf, &OutputFormat::new(Format::Json), &path, false)
            .await
            .expect("show");
        let value: serde_json::Value = serde_json::from_slice(&buf).expect("json");
        assert_eq!(value["name"], "hub");
        assert_eq!(value["peers"][0]["public_key"], "PEER");
        assert!(value.get("private_key").is_none());
    }

    #[tokio::test]
    async fn malformed_file_fails() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("bad.conf");
        std::fs::write(&path, "[Interface]\nAddress = 10.0.0.1/24\n").expect("write");

        let err = ShowCommand::new()
            .execute(&mut Vec::new(), &OutputFormat::default(), &path, false)
            .await
            .expect_err("missing private key");
        assert!(matches!(err, CliError::Config(_)));
    }
}
