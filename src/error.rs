use std::path::PathBuf;

use crate::oauth::flow::AttemptId;

#[derive(Debug, thiserror::Error)]
pub enum ThreelegError {
    #[error("Bad URL: {0}")]
    BadUrl(String),

    #[error("Cannot remove the query component from {0}")]
    QueryStripFailed(String),

    #[error("Cannot compute request signature: {0}")]
    Signing(String),

    #[error("Authorization server responded with HTTP {0}")]
    HttpError(u16),

    #[error("Response body is not valid UTF-8 text")]
    CannotDecodeRawData,

    #[error("Unexpected response from authorization server: {0}")]
    UnexpectedResponse(String),

    #[error("Response contained no parameters")]
    ResponseParametersEmpty,

    #[error("Authorization server did not confirm the callback")]
    CallbackNotConfirmed,

    #[error("Cannot parse token response: missing {0}")]
    CannotParseResponse(&'static str),

    #[error("No temporary credentials in flight. Start a new authorization attempt")]
    NoCredentialsInFlight,

    #[error("Redirect is missing oauth_token or oauth_verifier")]
    MissingVerifiedTokens,

    #[error("Redirect token does not match the temporary credentials in flight")]
    CredentialsMismatch,

    #[error("No access token stored. Run: threeleg authorize <provider>")]
    MissingAccessToken,

    #[error("Authorization attempt {0} is already in flight")]
    AttemptInProgress(AttemptId),

    #[error("Provider '{0}' not found in configuration")]
    ProviderNotFound(String),

    #[error("Error in config {}: {detail}", path.display())]
    ConfigError { path: PathBuf, detail: String },

    #[error("Transport error: {0}")]
    Transport(Box<dyn std::error::Error + Send + Sync>),

    #[error("Credential store error: {0}")]
    Store(String),

    #[error("Cannot decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("OAuth callback error: {0}")]
    OAuthCallback(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ThreelegError {
    /// Error code string for structured JSON output.
    pub fn code(&self) -> &'static str {
        match self {
            ThreelegError::BadUrl(_) => "bad_url",
            ThreelegError::QueryStripFailed(_) => "query_strip_failed",
            ThreelegError::Signing(_) => "signing_error",
            ThreelegError::HttpError(_) => "http_error",
            ThreelegError::CannotDecodeRawData => "cannot_decode_raw_data",
            ThreelegError::UnexpectedResponse(_) => "unexpected_response",
            ThreelegError::ResponseParametersEmpty => "response_parameters_empty",
            ThreelegError::CallbackNotConfirmed => "callback_not_confirmed",
            ThreelegError::CannotParseResponse(_) => "cannot_parse_response",
            ThreelegError::NoCredentialsInFlight => "no_credentials_in_flight",
            ThreelegError::MissingVerifiedTokens => "missing_verified_tokens",
            ThreelegError::CredentialsMismatch => "credentials_mismatch",
            ThreelegError::MissingAccessToken => "missing_access_token",
            ThreelegError::AttemptInProgress(_) => "attempt_in_progress",
            ThreelegError::ProviderNotFound(_) => "not_found",
            ThreelegError::ConfigError { .. } => "config_error",
            ThreelegError::Transport(_) => "transport_error",
            ThreelegError::Store(_) => "store_error",
            ThreelegError::Decode(_) => "decode_error",
            ThreelegError::OAuthCallback(_) => "oauth_callback_error",
            ThreelegError::IoError(_) => "io_error",
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ThreelegError::HttpError(status) => Some(*status),
            _ => None,
        }
    }

    /// Produce a structured JSON error object.
    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::Map::new();
        if let Some(status) = self.status() {
            obj.insert("status".into(), serde_json::Value::from(status));
        }
        obj.insert("message".into(), serde_json::Value::String(self.to_string()));
        obj.insert("code".into(), serde_json::Value::String(self.code().to_string()));
        serde_json::json!({ "error": obj })
    }
}
