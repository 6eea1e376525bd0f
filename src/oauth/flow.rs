//! The temporary-credential to token-credential exchange.
//!
//! One `OAuthFlow` carries at most one authorization attempt at a time.
//! Every step mutates state only after its network round trip has completed,
//! so a failed or cancelled step leaves the flow where it was and the step can
//! simply be retried with a freshly signed request.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use url::Url;

use crate::config::OAuthConfig;
use crate::encode::{find_param, parse_query, percent_encode};
use crate::error::ThreelegError;
use crate::oauth::response::{
    parse_temporary_credentials, parse_token_credentials, response_parameters,
};
use crate::request::{
    RequestBuilder, RequestVariant, SignedRequest, TemporaryCredentials, TokenCredentials,
};
use crate::store::{CredentialKeys, CredentialStore};
use crate::transport::{HttpResponse, HttpTransport};

/// Identifies one authorization attempt of a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttemptId(u64);

impl AttemptId {
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub enum FlowState {
    Unauthenticated,
    TemporaryCredentialsObtained {
        attempt: AttemptId,
        credentials: TemporaryCredentials,
    },
    AwaitingUserRedirect {
        attempt: AttemptId,
        credentials: TemporaryCredentials,
    },
    Authenticated,
    /// The verifier was redeemed but the result could not be kept.
    Failed(String),
}

impl FlowState {
    pub fn name(&self) -> &'static str {
        match self {
            FlowState::Unauthenticated => "unauthenticated",
            FlowState::TemporaryCredentialsObtained { .. } => "temporary_credentials_obtained",
            FlowState::AwaitingUserRedirect { .. } => "awaiting_user_redirect",
            FlowState::Authenticated => "authenticated",
            FlowState::Failed(_) => "failed",
        }
    }

    /// The attempt currently holding temporary credentials, if any.
    pub fn in_flight(&self) -> Option<(AttemptId, &TemporaryCredentials)> {
        match self {
            FlowState::TemporaryCredentialsObtained {
                attempt,
                credentials,
            }
            | FlowState::AwaitingUserRedirect {
                attempt,
                credentials,
            } => Some((*attempt, credentials)),
            _ => None,
        }
    }
}

/// What the UI side needs to send the user off to authorize.
#[derive(Debug, Clone)]
pub struct AuthorizationAttempt {
    pub id: AttemptId,
    pub authorize_url: Url,
}

pub struct OAuthFlow {
    config: OAuthConfig,
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn CredentialStore>,
    keys: CredentialKeys,
    state: FlowState,
    next_attempt: u64,
}

impl fmt::Debug for OAuthFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthFlow")
            .field("client", &self.config.client)
            .field("state", &self.state.name())
            .finish_non_exhaustive()
    }
}

impl OAuthFlow {
    pub fn new(
        config: OAuthConfig,
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        let keys = CredentialKeys::for_callback(&config.callback);
        Self {
            config,
            transport,
            store,
            keys,
            state: FlowState::Unauthenticated,
            next_attempt: 1,
        }
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn keys(&self) -> &CredentialKeys {
        &self.keys
    }

    /// Obtain temporary credentials and open a new attempt.
    ///
    /// Fails with `AttemptInProgress` while another attempt holds temporary
    /// credentials; use [`restart`](Self::restart) to replace it.
    pub async fn start(&mut self) -> Result<AuthorizationAttempt, ThreelegError> {
        if let Some((attempt, _)) = self.state.in_flight() {
            return Err(ThreelegError::AttemptInProgress(attempt));
        }
        self.begin_attempt().await
    }

    /// Like [`start`](Self::start) but supersedes an attempt in flight.
    /// The old attempt stays valid until the new one has its credentials.
    pub async fn restart(&mut self) -> Result<AuthorizationAttempt, ThreelegError> {
        let previous = self.state.in_flight().map(|(attempt, _)| attempt);
        let attempt = self.begin_attempt().await?;
        if let Some(previous) = previous {
            tracing::warn!(%previous, current = %attempt.id, "superseded authorization attempt");
        }
        Ok(attempt)
    }

    /// Drop the attempt in flight, if any.
    pub fn cancel(&mut self) -> Option<AttemptId> {
        let attempt = self.state.in_flight().map(|(attempt, _)| attempt)?;
        tracing::debug!(%attempt, "authorization attempt cancelled");
        self.state = FlowState::Unauthenticated;
        Some(attempt)
    }

    async fn begin_attempt(&mut self) -> Result<AuthorizationAttempt, ThreelegError> {
        let variant = RequestVariant::TemporaryRequest {
            url: self.config.request_token_url.clone(),
        };
        let response = self.send(&variant).await?;
        let params = response_parameters(&response)?;
        let credentials = parse_temporary_credentials(&params)?;

        let id = AttemptId(self.next_attempt);
        let authorize_url = self.build_authorize_url(&credentials)?;

        self.next_attempt += 1;
        self.state = FlowState::TemporaryCredentialsObtained {
            attempt: id,
            credentials,
        };
        tracing::debug!(attempt = %id, "temporary credentials obtained");

        Ok(AuthorizationAttempt { id, authorize_url })
    }

    fn build_authorize_url(
        &self,
        credentials: &TemporaryCredentials,
    ) -> Result<Url, ThreelegError> {
        let separator = if self.config.authorize_url.contains('?') {
            '&'
        } else {
            '?'
        };
        let raw = format!(
            "{}{}oauth_token={}",
            self.config.authorize_url,
            separator,
            percent_encode(&credentials.request_token)
        );
        Url::parse(&raw).map_err(|e| ThreelegError::BadUrl(format!("{raw}: {e}")))
    }

    /// The URL to present to the user for the attempt in flight. Marks the
    /// flow as waiting for the redirect.
    pub fn authorize_url(&mut self) -> Result<Url, ThreelegError> {
        let (attempt, credentials) = self
            .state
            .in_flight()
            .ok_or(ThreelegError::NoCredentialsInFlight)?;
        let credentials = credentials.clone();
        let url = self.build_authorize_url(&credentials)?;
        self.state = FlowState::AwaitingUserRedirect {
            attempt,
            credentials,
        };
        Ok(url)
    }

    /// Check a redirect against the attempt in flight and return its verifier.
    ///
    /// Accepts a full redirect URL or a bare query string. Never touches the
    /// store or the flow state.
    pub fn validate_redirect(&self, redirect: &str) -> Result<String, ThreelegError> {
        let (_, credentials) = self
            .state
            .in_flight()
            .ok_or(ThreelegError::NoCredentialsInFlight)?;

        let params = parse_query(redirect_query(redirect));
        let (token, verifier) = match (
            find_param(&params, "oauth_token"),
            find_param(&params, "oauth_verifier"),
        ) {
            (Some(token), Some(verifier)) => (token, verifier),
            _ => return Err(ThreelegError::MissingVerifiedTokens),
        };

        if token != credentials.request_token {
            return Err(ThreelegError::CredentialsMismatch);
        }
        Ok(verifier.to_string())
    }

    /// Validate the redirect, redeem the verifier and persist the token
    /// credentials.
    pub async fn handle_redirect(&mut self, redirect: &str) -> Result<(), ThreelegError> {
        let verifier = self.validate_redirect(redirect)?;
        let (attempt, temporary) = match self.state.in_flight() {
            Some((attempt, credentials)) => (attempt, credentials.clone()),
            None => return Err(ThreelegError::NoCredentialsInFlight),
        };

        let variant = RequestVariant::AccessRequest {
            url: self.config.access_token_url.clone(),
            temporary,
            verifier,
        };
        let response = self.send(&variant).await?;
        let params = response_parameters(&response)?;
        let token = parse_token_credentials(&params)?;

        if let Err(e) = self.persist(&token) {
            tracing::warn!(%attempt, error = %e, "token credentials could not be stored");
            self.state = FlowState::Failed(e.to_string());
            return Err(e);
        }

        self.state = FlowState::Authenticated;
        tracing::debug!(%attempt, "authorization complete");
        Ok(())
    }

    /// Save both halves of `token`. If the second write fails, the entries
    /// are put back the way they were so the store never pairs a new key
    /// with an old secret.
    fn persist(&self, token: &TokenCredentials) -> Result<(), ThreelegError> {
        let previous_token = self.store.get(&self.keys.token)?;
        let previous_secret = self.store.get(&self.keys.secret)?;

        self.store.save(&self.keys.token, &token.access_token)?;
        if let Err(e) = self.store.save(&self.keys.secret, &token.access_token_secret) {
            self.restore(&self.keys.token, previous_token.as_deref());
            self.restore(&self.keys.secret, previous_secret.as_deref());
            return Err(e);
        }
        Ok(())
    }

    fn restore(&self, key: &str, previous: Option<&str>) {
        let result = match previous {
            Some(value) => self.store.save(key, value),
            None => self.store.remove(key),
        };
        if let Err(e) = result {
            tracing::warn!(key, error = %e, "could not restore stored credential");
        }
    }

    /// Stored token credentials; `None` unless both halves are present.
    pub fn token_credentials(&self) -> Result<Option<TokenCredentials>, ThreelegError> {
        let access_token = self.store.get(&self.keys.token)?;
        let access_token_secret = self.store.get(&self.keys.secret)?;
        Ok(match (access_token, access_token_secret) {
            (Some(access_token), Some(access_token_secret)) => Some(TokenCredentials {
                access_token,
                access_token_secret,
            }),
            _ => None,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        match self.token_credentials() {
            Ok(token) => token.is_some(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read token credentials");
                false
            }
        }
    }

    /// Sign a GET for `url` with the stored token credentials.
    pub fn sign_get(&self, url: &str) -> Result<SignedRequest, ThreelegError> {
        let token = self
            .token_credentials()?
            .ok_or(ThreelegError::MissingAccessToken)?;
        RequestBuilder::new(&self.config).build(&RequestVariant::AuthorizedGet {
            url: url.to_string(),
            token,
        })
    }

    /// Authenticated GET returning the raw 200 response.
    pub async fn get_raw(&self, url: &str) -> Result<HttpResponse, ThreelegError> {
        let request = self.sign_get(url)?;
        let response = self.transport.send(&request).await?;
        if !response.is_ok() {
            return Err(ThreelegError::HttpError(response.status));
        }
        Ok(response)
    }

    /// Authenticated GET decoding a JSON body into `T`.
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, ThreelegError> {
        let response = self.get_raw(url).await?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    /// Remove stored token credentials. Safe to call when nothing is stored.
    pub fn clear_credentials(&mut self) -> Result<(), ThreelegError> {
        self.store.remove(&self.keys.token)?;
        self.store.remove(&self.keys.secret)?;
        if matches!(self.state, FlowState::Authenticated) {
            self.state = FlowState::Unauthenticated;
        }
        Ok(())
    }

    async fn send(&self, variant: &RequestVariant) -> Result<HttpResponse, ThreelegError> {
        let request = RequestBuilder::new(&self.config).build(variant)?;
        self.transport.send(&request).await
    }
}

/// The query part of a redirect URL, or the input itself when it has none.
fn redirect_query(redirect: &str) -> &str {
    let without_fragment = redirect.split('#').next().unwrap_or(redirect);
    match without_fragment.split_once('?') {
        Some((_, query)) => query,
        None => without_fragment,
    }
}
