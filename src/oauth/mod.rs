pub mod callback;
pub mod flow;
pub mod response;

pub use callback::{loopback_port, RedirectListener};
pub use flow::{AttemptId, AuthorizationAttempt, FlowState, OAuthFlow};
pub use response::{parse_temporary_credentials, parse_token_credentials, response_parameters};
