use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;

use crate::error::ThreelegError;

/// Port of a callback the CLI can serve itself: `http://localhost:<port>/...`
/// or `http://127.0.0.1:<port>/...` with an explicit port.
pub fn loopback_port(callback: &str) -> Option<u16> {
    let url = Url::parse(callback).ok()?;
    if url.scheme() != "http" {
        return None;
    }
    match url.host_str()? {
        "localhost" | "127.0.0.1" => url.port(),
        _ => None,
    }
}

/// One-shot HTTP listener that captures the provider's redirect.
#[derive(Debug)]
pub struct RedirectListener {
    listener: TcpListener,
    port: u16,
}

impl RedirectListener {
    pub async fn bind(port: u16) -> Result<Self, ThreelegError> {
        let listener = TcpListener::bind(("127.0.0.1", port)).await?;
        let port = listener.local_addr()?.port();
        Ok(Self { listener, port })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ThreelegError> {
        Ok(self.listener.local_addr()?)
    }

    /// Wait for a single request and return the full redirect URL it carried.
    pub async fn wait(self, timeout: Duration) -> Result<String, ThreelegError> {
        let port = self.port;
        let accept_future = async {
            let (mut stream, _) = self.listener.accept().await?;

            let mut buf = vec![0u8; 8192];
            let n = stream.read(&mut buf).await?;
            let request = String::from_utf8_lossy(&buf[..n]);

            let target = request_target(&request).ok_or_else(|| {
                ThreelegError::OAuthCallback("Malformed callback request".to_string())
            })?;

            let body = if target.contains("oauth_verifier=") {
                "<!DOCTYPE html><html><body><h1>Authorization received</h1>\
                 <p>You can close this window and return to the terminal.</p></body></html>"
            } else {
                "<!DOCTYPE html><html><body><h1>Authorization not completed</h1>\
                 <p>The provider did not return a verifier. Check the terminal.</p></body></html>"
            };
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await?;
            stream.shutdown().await?;

            Ok::<String, ThreelegError>(format!("http://127.0.0.1:{port}{target}"))
        };

        tokio::time::timeout(timeout, accept_future)
            .await
            .map_err(|_| {
                ThreelegError::OAuthCallback(format!(
                    "Timed out waiting for OAuth callback after {}ms",
                    timeout.as_millis()
                ))
            })?
    }
}

/// The target of `GET /callback?oauth_token=... HTTP/1.1`.
fn request_target(request: &str) -> Option<&str> {
    let first_line = request.lines().next()?;
    let mut parts = first_line.split_whitespace();
    let _method = parts.next()?;
    let target = parts.next()?;
    target.starts_with('/').then_some(target)
}
