pub mod authorize;
pub mod output;
pub mod provider;
pub mod request;
pub mod status;
