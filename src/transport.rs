use async_trait::async_trait;

use crate::error::ThreelegError;
use crate::request::SignedRequest;

/// Raw status and body as returned by the server. All interpretation
/// happens in the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

impl std::fmt::Debug for dyn HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport").finish()
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a signed request and return the raw response.
    ///
    /// Non-2xx statuses are not errors at this layer; only failures to
    /// complete the round trip are.
    async fn send(&self, request: &SignedRequest) -> Result<HttpResponse, ThreelegError>;
}
