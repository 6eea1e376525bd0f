use colored::Colorize;
use serde_json::Value;

use crate::error::ThreelegError;
use crate::oauth::FlowState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Pretty,
    Json,
}

impl OutputMode {
    pub fn from_flag(json: bool) -> Self {
        if json {
            OutputMode::Json
        } else {
            OutputMode::Pretty
        }
    }
}

/// Summary printed by `status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderStatus {
    pub provider: String,
    pub authenticated: bool,
    pub access_token: Option<String>,
}

impl ProviderStatus {
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "provider": self.provider,
            "authenticated": self.authenticated,
            "accessToken": self.access_token,
        })
    }
}

/// Format a status line. Only a short prefix of the token is shown.
pub fn format_status(status: &ProviderStatus, is_tty: bool) -> String {
    let label = match (status.authenticated, is_tty) {
        (true, true) => "authenticated".green().bold().to_string(),
        (false, true) => "not authenticated".yellow().to_string(),
        (true, false) => "authenticated".to_string(),
        (false, false) => "not authenticated".to_string(),
    };
    match &status.access_token {
        Some(token) => format!("{}: {} (token {})", status.provider, label, token_prefix(token)),
        None => format!("{}: {}", status.provider, label),
    }
}

fn token_prefix(token: &str) -> String {
    let prefix: String = token.chars().take(6).collect();
    if prefix.len() < token.len() {
        format!("{prefix}...")
    } else {
        prefix
    }
}

pub fn print_status(status: &ProviderStatus, mode: OutputMode, is_tty: bool) {
    match mode {
        OutputMode::Json => print_json(&status.to_json()),
        OutputMode::Pretty => println!("{}", format_status(status, is_tty)),
    }
}

/// Print a response body: pretty JSON when it parses, raw text otherwise.
pub fn print_body(body: &[u8], mode: OutputMode) {
    match serde_json::from_slice::<Value>(body) {
        Ok(value) => print_json(&value),
        Err(_) if mode == OutputMode::Json => print_json(&serde_json::json!({
            "body": String::from_utf8_lossy(body),
        })),
        Err(_) => print!("{}", String::from_utf8_lossy(body)),
    }
}

pub fn print_json(value: &Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

pub fn describe_state(state: &FlowState) -> String {
    match state {
        FlowState::Failed(reason) => format!("failed: {reason}"),
        other => other.name().replace('_', " "),
    }
}

pub fn print_error(err: &ThreelegError, mode: OutputMode) {
    match mode {
        OutputMode::Json => print_json(&err.to_json()),
        OutputMode::Pretty => eprintln!("{}: {}", "Error".red().bold(), err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_from_flag() {
        assert_eq!(OutputMode::from_flag(true), OutputMode::Json);
        assert_eq!(OutputMode::from_flag(false), OutputMode::Pretty);
    }

    #[test]
    fn status_line_plain() {
        let status = ProviderStatus {
            provider: "discogs".into(),
            authenticated: true,
            access_token: Some("abcdefghij".into()),
        };
        assert_eq!(
            format_status(&status, false),
            "discogs: authenticated (token abcdef...)"
        );
    }

    #[test]
    fn status_line_unauthenticated() {
        let status = ProviderStatus {
            provider: "discogs".into(),
            authenticated: false,
            access_token: None,
        };
        assert_eq!(format_status(&status, false), "discogs: not authenticated");
    }

    #[test]
    fn short_token_is_not_elided() {
        assert_eq!(token_prefix("abc"), "abc");
    }

    #[test]
    fn status_json_shape() {
        let status = ProviderStatus {
            provider: "p".into(),
            authenticated: false,
            access_token: None,
        };
        let json = status.to_json();
        assert_eq!(json["provider"], "p");
        assert_eq!(json["authenticated"], false);
        assert!(json["accessToken"].is_null());
    }

    #[test]
    fn describe_states() {
        assert_eq!(describe_state(&FlowState::Authenticated), "authenticated");
        assert_eq!(
            describe_state(&FlowState::Failed("disk full".into())),
            "failed: disk full"
        );
        assert_eq!(
            describe_state(&FlowState::Unauthenticated),
            "unauthenticated"
        );
    }
}
