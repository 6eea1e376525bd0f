use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::OAuthConfig;
use crate::encode::percent_encode;
use crate::error::ThreelegError;
use crate::signature::{sign, Parameter};

pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";
pub const OAUTH_VERSION: &str = "1.0";

/// Request-token pair valid only for one authorization attempt.
#[derive(Clone, PartialEq, Eq)]
pub struct TemporaryCredentials {
    pub request_token: String,
    pub request_token_secret: String,
}

/// Long-lived access-token pair.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCredentials {
    pub access_token: String,
    pub access_token_secret: String,
}

// Secrets stay out of logs and panic messages.
impl fmt::Debug for TemporaryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemporaryCredentials")
            .field("request_token", &self.request_token)
            .field("request_token_secret", &"<redacted>")
            .finish()
    }
}

impl fmt::Debug for TokenCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCredentials")
            .field("access_token", &self.access_token)
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three request shapes of the protocol.
#[derive(Debug, Clone)]
pub enum RequestVariant {
    /// Step 1: obtain temporary credentials.
    TemporaryRequest { url: String },
    /// Step 3: redeem the verifier for token credentials.
    AccessRequest {
        url: String,
        temporary: TemporaryCredentials,
        verifier: String,
    },
    /// A resource request signed with token credentials.
    AuthorizedGet { url: String, token: TokenCredentials },
}

impl RequestVariant {
    pub fn url(&self) -> &str {
        match self {
            RequestVariant::TemporaryRequest { url }
            | RequestVariant::AccessRequest { url, .. }
            | RequestVariant::AuthorizedGet { url, .. } => url,
        }
    }

    pub fn method(&self) -> HttpMethod {
        match self {
            RequestVariant::TemporaryRequest { .. } | RequestVariant::AccessRequest { .. } => {
                HttpMethod::Post
            }
            RequestVariant::AuthorizedGet { .. } => HttpMethod::Get,
        }
    }

    /// Secret paired with the consumer secret in the signing key.
    pub fn token_secret(&self) -> Option<&str> {
        match self {
            RequestVariant::TemporaryRequest { .. } => None,
            RequestVariant::AccessRequest { temporary, .. } => {
                Some(&temporary.request_token_secret)
            }
            RequestVariant::AuthorizedGet { token, .. } => Some(&token.access_token_secret),
        }
    }

    /// Protocol parameters specific to this variant.
    pub fn extra_parameters(&self, config: &OAuthConfig) -> Vec<Parameter> {
        match self {
            RequestVariant::TemporaryRequest { .. } => {
                vec![Parameter::new("oauth_callback", config.callback.as_str())]
            }
            RequestVariant::AccessRequest {
                temporary,
                verifier,
                ..
            } => vec![
                Parameter::new("oauth_token", temporary.request_token.as_str()),
                Parameter::new("oauth_verifier", verifier.as_str()),
            ],
            RequestVariant::AuthorizedGet { token, .. } => {
                vec![Parameter::new("oauth_token", token.access_token.as_str())]
            }
        }
    }
}

/// A fully signed request, ready for the transport.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub authorization: String,
}

/// Per-request uniqueness inputs. Fixed values make signing reproducible.
#[derive(Debug, Clone)]
pub struct RequestNonce {
    pub nonce: String,
    pub timestamp: String,
}

impl RequestNonce {
    /// 16 random bytes, base64url without padding, plus the current Unix time.
    pub fn fresh() -> Self {
        let bytes: [u8; 16] = rand::random();
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            nonce: URL_SAFE_NO_PAD.encode(bytes),
            timestamp: timestamp.to_string(),
        }
    }

    pub fn fixed(nonce: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            nonce: nonce.into(),
            timestamp: timestamp.into(),
        }
    }
}

/// Parse a URL string and return it together with the signing base URL
/// (query and fragment removed) and its query parameters.
pub fn split_signing_url(raw: &str) -> Result<(Url, String, Vec<Parameter>), ThreelegError> {
    let url = Url::parse(raw).map_err(|e| ThreelegError::BadUrl(format!("{raw}: {e}")))?;
    if url.cannot_be_a_base() || !url.has_host() {
        return Err(ThreelegError::QueryStripFailed(raw.to_string()));
    }
    let query = url
        .query_pairs()
        .map(|(name, value)| Parameter::new(name, value))
        .collect();
    let mut base = url.clone();
    base.set_query(None);
    base.set_fragment(None);
    Ok((url, base.to_string(), query))
}

/// Assembles protocol parameters, signs them and renders the header.
pub struct RequestBuilder<'a> {
    config: &'a OAuthConfig,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(config: &'a OAuthConfig) -> Self {
        Self { config }
    }

    /// Build with a fresh nonce and timestamp.
    pub fn build(&self, variant: &RequestVariant) -> Result<SignedRequest, ThreelegError> {
        self.build_with(variant, &RequestNonce::fresh())
    }

    pub fn build_with(
        &self,
        variant: &RequestVariant,
        nonce: &RequestNonce,
    ) -> Result<SignedRequest, ThreelegError> {
        let (url, base_url, query) = split_signing_url(variant.url())?;
        let method = variant.method();

        let mut parameters = vec![
            Parameter::new("oauth_consumer_key", self.config.consumer_key.as_str()),
            Parameter::new("oauth_nonce", nonce.nonce.as_str()),
            Parameter::new("oauth_signature_method", SIGNATURE_METHOD),
            Parameter::new("oauth_timestamp", nonce.timestamp.as_str()),
            Parameter::new("oauth_version", OAUTH_VERSION),
        ];
        parameters.extend(variant.extra_parameters(self.config));
        parameters.extend(query);

        let signature = sign(
            method.as_str(),
            &base_url,
            &parameters,
            &self.config.consumer_secret,
            variant.token_secret(),
        )?;

        tracing::debug!(
            method = method.as_str(),
            base_url = %base_url,
            signed_parameters = parameters.len(),
            "built signed OAuth request"
        );

        parameters.push(Parameter::new("oauth_signature", signature));

        Ok(SignedRequest {
            method,
            url,
            authorization: authorization_header(&parameters),
        })
    }
}

/// `OAuth name="value", ...` with encoded names and values, sorted.
///
/// Every signed parameter is rendered, query parameters of the target URL
/// included, plus `oauth_signature`. The URL keeps its query as well.
pub fn authorization_header(parameters: &[Parameter]) -> String {
    let mut parts: Vec<String> = parameters
        .iter()
        .map(|p| format!("{}=\"{}\"", percent_encode(&p.name), percent_encode(&p.value)))
        .collect();
    parts.sort();
    format!("OAuth {}", parts.join(", "))
}
