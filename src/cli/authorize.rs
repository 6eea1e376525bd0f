use std::io::{BufRead, Write};
use std::time::Duration;

use url::Url;

use crate::error::ThreelegError;
use crate::oauth::{loopback_port, OAuthFlow, RedirectListener};

use super::output::{describe_state, print_json, OutputMode};
use super::provider::{open_flow, ProviderOptions};

/// Default time to wait for the user to finish authorizing.
pub const DEFAULT_OAUTH_TIMEOUT_MS: u64 = 120_000;

#[derive(Debug, Clone)]
pub struct AuthorizeOptions {
    pub timeout: Duration,
    pub open_browser: bool,
    pub redirect_url: Option<String>,
}

/// Where the redirect URL comes from.
#[derive(Debug)]
enum RedirectSource {
    Given(String),
    Loopback(RedirectListener),
    Prompt,
}

/// Run the authorize command.
pub async fn run_authorize(
    provider: &str,
    provider_options: &ProviderOptions,
    options: &AuthorizeOptions,
    mode: OutputMode,
) -> Result<(), ThreelegError> {
    let mut flow = open_flow(provider, provider_options)?;

    let attempt = flow.start().await?;
    let authorize_url = flow.authorize_url()?;
    tracing::debug!(attempt = %attempt.id, "authorization attempt started");

    let source = redirect_source(&flow, options).await?;

    eprintln!("Open this URL to authorize '{provider}':\n\n  {authorize_url}\n");
    if options.open_browser && !matches!(source, RedirectSource::Given(_)) {
        open_in_browser(&authorize_url);
    }

    let redirect = match source {
        RedirectSource::Given(url) => url,
        RedirectSource::Loopback(listener) => listener.wait(options.timeout).await?,
        RedirectSource::Prompt => {
            let stdin = std::io::stdin();
            let mut reader = stdin.lock();
            prompt_redirect(&mut reader, &mut std::io::stderr())?
        }
    };

    if let Err(e) = flow.handle_redirect(&redirect).await {
        tracing::debug!(state = %describe_state(flow.state()), "authorization did not complete");
        return Err(e);
    }

    match mode {
        OutputMode::Json => print_json(&serde_json::json!({
            "provider": provider,
            "authenticated": true,
        })),
        OutputMode::Pretty => println!("Authorization successful for '{provider}'"),
    }
    Ok(())
}

async fn redirect_source(
    flow: &OAuthFlow,
    options: &AuthorizeOptions,
) -> Result<RedirectSource, ThreelegError> {
    if let Some(url) = &options.redirect_url {
        return Ok(RedirectSource::Given(url.clone()));
    }
    match loopback_port(&flow.config().callback) {
        Some(port) => Ok(RedirectSource::Loopback(RedirectListener::bind(port).await?)),
        None => Ok(RedirectSource::Prompt),
    }
}

fn open_in_browser(url: &Url) {
    if webbrowser::open(url.as_str()).is_err() {
        tracing::warn!("Could not open browser automatically. Please visit:\n{url}");
    }
}

/// Ask for the URL the provider redirected to. Blank lines are skipped.
pub fn prompt_redirect<R: BufRead, W: Write>(
    reader: &mut R,
    out: &mut W,
) -> Result<String, ThreelegError> {
    loop {
        write!(out, "Paste the redirect URL: ")?;
        out.flush()?;

        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Err(ThreelegError::OAuthCallback(
                "No redirect URL provided".to_string(),
            ));
        }
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
    }
}

/// Timeout from `--oauth-timeout` or `THREELEG_OAUTH_TIMEOUT_MS`.
pub fn resolve_timeout(flag: Option<u64>) -> Duration {
    Duration::from_millis(flag.unwrap_or(DEFAULT_OAUTH_TIMEOUT_MS))
}
