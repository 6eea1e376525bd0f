pub mod cli;
pub mod config;
pub mod encode;
pub mod error;
pub mod oauth;
pub mod request;
pub mod signature;
pub mod store;
pub mod transport;
pub mod transports;

pub use config::{load_config, OAuthConfig, ThreelegConfig};
pub use error::ThreelegError;
pub use oauth::{AttemptId, AuthorizationAttempt, FlowState, OAuthFlow};
pub use request::{RequestBuilder, RequestVariant, SignedRequest, TemporaryCredentials, TokenCredentials};
pub use store::{CredentialStore, FileStore, MemoryStore};
pub use transport::{HttpResponse, HttpTransport};
pub use transports::ReqwestTransport;
