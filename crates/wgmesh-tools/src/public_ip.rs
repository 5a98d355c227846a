//! Public IPv4 lookup through a plain-text echo service.

use std::net::Ipv4Addr;
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, ToolError};

/// Service used when no URL is configured.
pub const DEFAULT_PUBLIC_IP_URL: &str = "https://api.ipify.org";

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Asks an HTTP service for this machine's public IPv4 address.
#[derive(Debug, Clone)]
pub struct PublicIpResolver {
    client: reqwest::Client,
    url: String,
}

impl PublicIpResolver {
    /// Creates a resolver for a service that answers with the bare address.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .build()
            .map_err(|e| ToolError::public_ip(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Creates a resolver with a preconfigured HTTP client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// The service URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetches the public address.
    pub async fn lookup(&self) -> Result<Ipv4Addr> {
        debug!(url = %self.url, "looking up public IP");
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| ToolError::public_ip(e.to_string()))?;
        let body = response
            .text()
            .await
            .map_err(|e| ToolError::public_ip(e.to_string()))?;
        parse_ipv4_body(&body)
    }
}

/// Parses a response body holding a single IPv4 address.
pub fn parse_ipv4_body(body: &str) -> Result<Ipv4Addr> {
    let trimmed = body.trim();
    trimmed
        .parse()
        .map_err(|_| ToolError::public_ip(format!("not an IPv4 address: {trimmed:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test_case("203.0.113.7", Some(Ipv4Addr::new(203, 0, 113, 7)) ; "bare")]
    #[test_case("  198.51.100.1\n", Some(Ipv4Addr::new(198, 51, 100, 1)) ; "whitespace")]
    #[test_case("2001:db8::1", None ; "ipv6")]
    #[test_case("<html>", None ; "html")]
    fn parse_body(body: &str, expected: Option<Ipv4Addr>) {
        assert_eq!(parse_ipv4_body(body).ok(), expected);
    }

    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: text/plain\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{addr}/")
    }

    fn local_resolver(url: String) -> PublicIpResolver {
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .expect("client");
        PublicIpResolver::with_client(client, url)
    }

    #[tokio::test]
    async fn lookup_reads_plain_text_address() {
        let url = serve_once("200 OK", "203.0.113.7\n").await;
        let resolver = local_resolver(url);
        assert_eq!(
            resolver.lookup().await.expect("lookup"),
            Ipv4Addr::new(203, 0, 113, 7)
        );
    }

    #[tokio::test]
    async fn lookup_rejects_error_status() {
        let url = serve_once("503 Service Unavailable", "busy").await;
        let resolver = local_resolver(url);
        assert!(matches!(
            resolver.lookup().await,
            Err(ToolError::PublicIp { .. })
        ));
    }
}
