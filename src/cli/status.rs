use std::io::IsTerminal;

use crate::error::ThreelegError;

use super::output::{print_json, print_status, OutputMode, ProviderStatus};
use super::provider::{open_flow, ProviderOptions};

/// Run the status command.
pub fn run_status(
    provider: &str,
    options: &ProviderOptions,
    mode: OutputMode,
) -> Result<(), ThreelegError> {
    let flow = open_flow(provider, options)?;
    let token = flow.token_credentials()?;
    let status = ProviderStatus {
        provider: provider.to_string(),
        authenticated: token.is_some(),
        access_token: token.map(|t| t.access_token),
    };
    print_status(&status, mode, std::io::stdout().is_terminal());
    Ok(())
}

/// Run the logout command. Succeeds when nothing was stored.
pub fn run_logout(
    provider: &str,
    options: &ProviderOptions,
    mode: OutputMode,
) -> Result<(), ThreelegError> {
    let mut flow = open_flow(provider, options)?;
    let had_credentials = flow.token_credentials()?.is_some();
    flow.clear_credentials()?;
    match mode {
        OutputMode::Json => print_json(&serde_json::json!({
            "provider": provider,
            "removed": had_credentials,
        })),
        OutputMode::Pretty if had_credentials => {
            println!("Removed stored credentials for '{provider}'")
        }
        OutputMode::Pretty => println!("No stored credentials for '{provider}'"),
    }
    Ok(())
}
