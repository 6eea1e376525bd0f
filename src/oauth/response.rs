use crate::encode::{find_param, parse_query};
use crate::error::ThreelegError;
use crate::request::{TemporaryCredentials, TokenCredentials};
use crate::transport::HttpResponse;

/// Interpret an authorization-server response as form-encoded parameters.
pub fn response_parameters(response: &HttpResponse) -> Result<Vec<(String, String)>, ThreelegError> {
    if !response.is_ok() {
        tracing::debug!(
            status = response.status,
            body = %String::from_utf8_lossy(&response.body),
            "authorization server returned an error"
        );
        return Err(ThreelegError::HttpError(response.status));
    }

    let text = std::str::from_utf8(&response.body).map_err(|_| ThreelegError::CannotDecodeRawData)?;
    let params = parse_query(text.trim());
    if params.is_empty() {
        return Err(ThreelegError::ResponseParametersEmpty);
    }
    Ok(params)
}

/// Step 1 response: token, secret and a confirmed callback.
pub fn parse_temporary_credentials(
    params: &[(String, String)],
) -> Result<TemporaryCredentials, ThreelegError> {
    let request_token = find_param(params, "oauth_token")
        .ok_or_else(|| ThreelegError::UnexpectedResponse("missing oauth_token".into()))?;
    let request_token_secret = find_param(params, "oauth_token_secret")
        .ok_or_else(|| ThreelegError::UnexpectedResponse("missing oauth_token_secret".into()))?;

    if find_param(params, "oauth_callback_confirmed") != Some("true") {
        return Err(ThreelegError::CallbackNotConfirmed);
    }

    Ok(TemporaryCredentials {
        request_token: request_token.to_string(),
        request_token_secret: request_token_secret.to_string(),
    })
}

/// Step 3 response: the access token pair.
pub fn parse_token_credentials(
    params: &[(String, String)],
) -> Result<TokenCredentials, ThreelegError> {
    let access_token =
        find_param(params, "oauth_token").ok_or(ThreelegError::CannotParseResponse("oauth_token"))?;
    let access_token_secret = find_param(params, "oauth_token_secret")
        .ok_or(ThreelegError::CannotParseResponse("oauth_token_secret"))?;

    Ok(TokenCredentials {
        access_token: access_token.to_string(),
        access_token_secret: access_token_secret.to_string(),
    })
}
