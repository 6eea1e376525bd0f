use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};

use crate::error::ThreelegError;
use crate::request::{HttpMethod, SignedRequest};
use crate::transport::{HttpResponse, HttpTransport};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// reqwest-backed transport.
///
/// Signed requests are only sent over `https://` unless cleartext HTTP was
/// explicitly allowed.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    allow_http: bool,
}

impl ReqwestTransport {
    pub fn new(allow_http: bool) -> Result<Self, ThreelegError> {
        Self::with_timeout(allow_http, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(allow_http: bool, timeout: Duration) -> Result<Self, ThreelegError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("threeleg/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ThreelegError::Transport(Box::new(e)))?;

        Ok(Self { client, allow_http })
    }

    /// Use an existing client, e.g. one with custom proxy settings.
    pub fn with_client(client: reqwest::Client, allow_http: bool) -> Self {
        Self { client, allow_http }
    }

    fn check_scheme(&self, request: &SignedRequest) -> Result<(), ThreelegError> {
        match request.url.scheme() {
            "https" => Ok(()),
            "http" if self.allow_http => Ok(()),
            "http" => Err(ThreelegError::Transport(
                format!(
                    "Cleartext HTTP is not allowed for '{}'. \
                     Use https:// or pass --allow-http to permit insecure connections.",
                    request.url
                )
                .into(),
            )),
            scheme => Err(ThreelegError::Transport(
                format!("Unsupported URL scheme '{scheme}' in '{}'", request.url).into(),
            )),
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &SignedRequest) -> Result<HttpResponse, ThreelegError> {
        self.check_scheme(request)?;

        let authorization = HeaderValue::from_str(&request.authorization).map_err(|e| {
            ThreelegError::Transport(format!("Invalid Authorization header: {e}").into())
        })?;

        let builder = match request.method {
            HttpMethod::Get => self.client.get(request.url.clone()),
            HttpMethod::Post => self.client.post(request.url.clone()),
        };

        let response = builder
            .header(AUTHORIZATION, authorization)
            .send()
            .await
            .map_err(|e| ThreelegError::Transport(Box::new(e)))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ThreelegError::Transport(Box::new(e)))?;

        tracing::debug!(
            method = request.method.as_str(),
            url = %request.url,
            status,
            bytes = body.len(),
            "received response"
        );

        Ok(HttpResponse::new(status, body.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed(url: &str) -> SignedRequest {
        SignedRequest {
            method: HttpMethod::Get,
            url: url::Url::parse(url).unwrap(),
            authorization: "OAuth oauth_version=\"1.0\"".into(),
        }
    }

    #[test]
    fn rejects_http_without_allow_flag() {
        let transport = ReqwestTransport::new(false).unwrap();
        let err = transport
            .check_scheme(&signed("http://example.com/resource"))
            .unwrap_err();
        assert!(
            err.to_string().contains("Cleartext HTTP is not allowed"),
            "got: {err}"
        );
    }

    #[test]
    fn allows_http_with_flag() {
        let transport = ReqwestTransport::new(true).unwrap();
        transport
            .check_scheme(&signed("http://localhost:8080/resource"))
            .unwrap();
    }

    #[test]
    fn allows_https() {
        let transport = ReqwestTransport::new(false).unwrap();
        transport
            .check_scheme(&signed("https://example.com/resource"))
            .unwrap();
    }

    #[test]
    fn rejects_unsupported_scheme() {
        let transport = ReqwestTransport::new(true).unwrap();
        let err = transport
            .check_scheme(&signed("ftp://example.com/resource"))
            .unwrap_err();
        assert!(err.to_string().contains("Unsupported URL scheme"), "got: {err}");
    }

    #[tokio::test]
    async fn rejects_header_with_control_characters() {
        let transport = ReqwestTransport::new(false).unwrap();
        let mut request = signed("https://example.com/resource");
        request.authorization = "OAuth value\r\ninjection".into();
        let err = transport.send(&request).await.unwrap_err();
        assert!(err.to_string().contains("Invalid Authorization header"));
    }
}
