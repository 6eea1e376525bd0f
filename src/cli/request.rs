use crate::error::ThreelegError;

use super::output::{print_body, print_json, OutputMode};
use super::provider::{open_flow, ProviderOptions};

/// Run the get command: authenticated GET, body to stdout.
pub async fn run_get(
    provider: &str,
    url: &str,
    options: &ProviderOptions,
    mode: OutputMode,
) -> Result<(), ThreelegError> {
    let flow = open_flow(provider, options)?;
    let response = flow.get_raw(url).await?;
    print_body(&response.body, mode);
    Ok(())
}

/// Run the sign command: print the Authorization header for a GET.
pub fn run_sign(
    provider: &str,
    url: &str,
    options: &ProviderOptions,
    mode: OutputMode,
) -> Result<(), ThreelegError> {
    let flow = open_flow(provider, options)?;
    let request = flow.sign_get(url)?;
    match mode {
        OutputMode::Json => print_json(&serde_json::json!({
            "method": request.method.as_str(),
            "url": request.url.as_str(),
            "authorization": request.authorization,
        })),
        OutputMode::Pretty => println!("Authorization: {}", request.authorization),
    }
    Ok(())
}
