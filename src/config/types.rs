use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ThreelegError;

/// Top-level config file: named providers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreelegConfig {
    #[serde(default)]
    pub providers: HashMap<String, OAuthConfig>,
}

impl ThreelegConfig {
    pub fn provider(&self, name: &str) -> Result<&OAuthConfig, ThreelegError> {
        self.providers
            .get(name)
            .ok_or_else(|| ThreelegError::ProviderNotFound(name.to_string()))
    }
}

/// Consumer registration and endpoints for one OAuth 1.0a provider.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OAuthConfig {
    #[serde(default)]
    pub client: String,
    pub consumer_key: String,
    pub consumer_secret: String,
    pub callback: String,
    #[serde(default)]
    pub callback_scheme: String,
    pub request_token_url: String,
    pub authorize_url: String,
    pub access_token_url: String,
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client", &self.client)
            .field("consumer_key", &self.consumer_key)
            .field("callback", &self.callback)
            .field("callback_scheme", &self.callback_scheme)
            .field("request_token_url", &self.request_token_url)
            .field("authorize_url", &self.authorize_url)
            .field("access_token_url", &self.access_token_url)
            .finish_non_exhaustive()
    }
}

impl OAuthConfig {
    /// Check that the record is usable before any request is signed.
    pub fn validate(&self) -> Result<(), ThreelegError> {
        if self.consumer_key.is_empty() {
            return Err(invalid("consumerKey must not be empty"));
        }
        if self.callback.is_empty() {
            return Err(invalid("callback must not be empty"));
        }
        for (field, value) in [
            ("requestTokenUrl", &self.request_token_url),
            ("authorizeUrl", &self.authorize_url),
            ("accessTokenUrl", &self.access_token_url),
        ] {
            Url::parse(value)
                .map_err(|e| invalid(&format!("{field} '{value}' is not a valid URL: {e}")))?;
        }
        // "oob" is the out-of-band callback and has no scheme.
        if self.callback != "oob" && !self.callback_scheme.is_empty() {
            let callback = Url::parse(&self.callback)
                .map_err(|e| invalid(&format!("callback '{}' is not a valid URL: {e}", self.callback)))?;
            if !callback.scheme().eq_ignore_ascii_case(&self.callback_scheme) {
                return Err(invalid(&format!(
                    "callbackScheme '{}' does not match callback scheme '{}'",
                    self.callback_scheme,
                    callback.scheme()
                )));
            }
        }
        Ok(())
    }
}

fn invalid(detail: &str) -> ThreelegError {
    ThreelegError::ConfigError {
        path: PathBuf::from("<provider>"),
        detail: detail.to_string(),
    }
}
