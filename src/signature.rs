//! HMAC-SHA1 signature construction (RFC 5849 section 3.4).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::encode::percent_encode;
use crate::error::ThreelegError;

type HmacSha1 = Hmac<Sha1>;

/// A single name/value pair participating in a signature.
///
/// Duplicate names are legal and every occurrence is signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub value: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl<N: Into<String>, V: Into<String>> From<(N, V)> for Parameter {
    fn from((name, value): (N, V)) -> Self {
        Self::new(name, value)
    }
}

/// Build the normalized parameter string.
///
/// Names and values are encoded first, then ordered by encoded name with ties
/// broken by encoded value, and joined as `name=value` with `&`.
pub fn normalize_parameters(parameters: &[Parameter]) -> String {
    let mut encoded: Vec<(String, String)> = parameters
        .iter()
        .map(|p| (percent_encode(&p.name), percent_encode(&p.value)))
        .collect();
    encoded.sort();
    encoded
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// `METHOD&encoded(base_url)&encoded(parameter_string)`.
///
/// `base_url` must already have its query and fragment removed.
pub fn signature_base_string(method: &str, base_url: &str, parameters: &[Parameter]) -> String {
    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(base_url),
        percent_encode(&normalize_parameters(parameters))
    )
}

/// `encoded(consumer_secret)&encoded(token_secret)`; the token part is empty
/// when there is no token secret yet.
pub fn signing_key(consumer_secret: &str, token_secret: Option<&str>) -> String {
    format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret.unwrap_or(""))
    )
}

/// Base64 of the raw HMAC-SHA1 digest of `message` under `key`.
pub fn hmac_sha1_base64(key: &[u8], message: &[u8]) -> Result<String, ThreelegError> {
    let mut mac = <HmacSha1 as KeyInit>::new_from_slice(key)
        .map_err(|e| ThreelegError::Signing(format!("invalid HMAC-SHA1 key: {e}")))?;
    mac.update(message);
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Compute the `oauth_signature` value.
pub fn sign(
    method: &str,
    base_url: &str,
    parameters: &[Parameter],
    consumer_secret: &str,
    token_secret: Option<&str>,
) -> Result<String, ThreelegError> {
    let base_string = signature_base_string(method, base_url, parameters);
    let key = signing_key(consumer_secret, token_secret);
    hmac_sha1_base64(key.as_bytes(), base_string.as_bytes())
}
