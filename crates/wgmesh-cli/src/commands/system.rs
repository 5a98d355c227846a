//! `public-ip` and `check`.

use std::io::Write;

use wgmesh_tools::{check_wg_installed, PublicIpResolver};

use crate::error::CliError;
use crate::output::{CheckReport, OutputFormat, PublicIpReport};

/// Public IP command executor.
#[derive(Debug)]
pub struct PublicIpCommand {
    resolver: PublicIpResolver,
}

impl PublicIpCommand {
    /// Create a new public IP command.
    #[must_use]
    pub fn new(resolver: PublicIpResolver) -> Self {
        Self { resolver }
    }

    /// Looks up and prints this host's public IPv4 address.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
    ) -> Result<(), CliError> {
        let ip = self.resolver.lookup().await?;
        format.write(writer, &PublicIpReport { ip })
    }
}

/// Install check executor.
#[derive(Debug, Default)]
pub struct CheckCommand {
    wg_path: Option<String>,
}

impl CheckCommand {
    /// Create a new check command; `wg_path` overrides the `wg` on `PATH`.
    #[must_use]
    pub fn new(wg_path: Option<String>) -> Self {
        Self { wg_path }
    }

    /// Runs `wg --version` and prints the result.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
    ) -> Result<(), CliError> {
        let version = check_wg_installed(self.wg_path.as_deref()).await?;
        format.write(writer, &CheckReport { version })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write as _};
    use std::net::TcpListener;
    use wgmesh_tools::ToolError;

    #[tokio::test]
    async fn missing_wg_is_not_installed() {
        let err = CheckCommand::new(Some("/nonexistent/wgmesh-test/wg".into()))
            .execute(&mut Vec::new(), &OutputFormat::default())
            .await
            .expect_err("no wg");
        assert!(matches!(err, CliError::Tool(ToolError::NotInstalled { .. })));
    }

    #[tokio::test]
    async fn prints_looked_up_address() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut buf = [0_u8; 4096];
            let _ = stream.read(&mut buf).expect("read");
            stream
                .write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Length: 12\r\n\
                      Connection: close\r\n\r\n203.0.113.7\n",
                )
                .expect("respond");
        });

        let client = reqwest::Client::builder().no_proxy().build().expect("client");
        let resolver = PublicIpResolver::with_client(client, format!("http://{addr}/"));
        let mut buf = Vec::new();
        PublicIpCommand::new(resolver)
            .execute(&mut buf, &OutputFormat::default())
            .await
            .expect("lookup");
        server.join().expect("server");
        assert_eq!(String::from_utf8(buf).expect("utf8"), "203.0.113.7\n");
    }
}
