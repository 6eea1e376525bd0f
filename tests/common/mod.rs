use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use threeleg::config::{OAuthConfig, ThreelegConfig};
use threeleg::{HttpResponse, HttpTransport, SignedRequest, ThreelegError};

/// Provider record whose endpoints all live under `base`.
#[allow(dead_code)]
pub fn provider_config(base: &str, callback: &str) -> OAuthConfig {
    let scheme = callback.split("://").next().unwrap_or_default().to_string();
    OAuthConfig {
        client: "integration".into(),
        consumer_key: "test-consumer-key".into(),
        consumer_secret: "test-consumer-secret".into(),
        callback: callback.into(),
        callback_scheme: scheme,
        request_token_url: format!("{base}/oauth/request_token"),
        authorize_url: format!("{base}/oauth/authorize"),
        access_token_url: format!("{base}/oauth/access_token"),
    }
}

/// Create a temp directory with a threeleg.json config file.
#[allow(dead_code)]
pub fn temp_config_dir(config: &ThreelegConfig) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("threeleg.json");
    let json = serde_json::to_string_pretty(config).unwrap();
    std::fs::write(config_path, json).unwrap();
    dir
}

#[allow(dead_code)]
pub fn single_provider(name: &str, provider: OAuthConfig) -> ThreelegConfig {
    ThreelegConfig {
        providers: HashMap::from([(name.to_string(), provider)]),
    }
}

/// Transport that replays queued responses and records every request.
#[derive(Default)]
#[allow(dead_code)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    sent: Mutex<Vec<SignedRequest>>,
}

#[allow(dead_code)]
impl ScriptedTransport {
    pub fn new(responses: Vec<HttpResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<SignedRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: &SignedRequest) -> Result<HttpResponse, ThreelegError> {
        self.sent.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ThreelegError::Transport("script exhausted".into()))
    }
}

/// Value of one parameter in an `OAuth k="v", ...` header, still encoded.
#[allow(dead_code)]
pub fn header_param<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .strip_prefix("OAuth ")?
        .split(", ")
        .filter_map(|part| part.split_once('='))
        .find(|(n, _)| *n == name)
        .map(|(_, v)| v.trim_matches('"'))
}
