use std::sync::Arc;

use crate::config::{load_config, OAuthConfig};
use crate::error::ThreelegError;
use crate::oauth::OAuthFlow;
use crate::store::{CredentialStore, FileStore};
use crate::transports::ReqwestTransport;

/// Options shared by every command that talks to a provider.
#[derive(Debug, Clone, Default)]
pub struct ProviderOptions {
    pub config_path: Option<String>,
    pub allow_http: bool,
}

/// Look up and validate a provider record from the discovered config files.
pub fn resolve_provider(
    name: &str,
    options: &ProviderOptions,
) -> Result<OAuthConfig, ThreelegError> {
    let config = load_config(options.config_path.as_deref())?;
    let provider = config.provider(name)?.clone();
    provider.validate()?;
    Ok(provider)
}

/// Build a flow over the default file store and a reqwest transport.
pub fn open_flow(name: &str, options: &ProviderOptions) -> Result<OAuthFlow, ThreelegError> {
    let provider = resolve_provider(name, options)?;
    let store: Arc<dyn CredentialStore> = Arc::new(FileStore::open_default());
    flow_for(provider, store, options.allow_http)
}

pub fn flow_for(
    provider: OAuthConfig,
    store: Arc<dyn CredentialStore>,
    allow_http: bool,
) -> Result<OAuthFlow, ThreelegError> {
    let transport = Arc::new(ReqwestTransport::new(allow_http)?);
    Ok(OAuthFlow::new(provider, transport, store))
}
