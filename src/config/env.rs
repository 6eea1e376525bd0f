use crate::error::ThreelegError;

use super::types::OAuthConfig;

/// Expand environment variable references in a config value.
///
/// Supported syntaxes:
/// - `${VAR}` - replaced with env var value; error if unset
/// - `${VAR:-fallback}` - env var value, or fallback if unset or empty
/// - `$env:VAR` - same as `${VAR}`
///
/// Any other `$` is kept literally.
pub fn expand_env_vars(input: &str) -> Result<String, ThreelegError> {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        result.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(braced) = after.strip_prefix('{') {
            let close = braced.find('}').ok_or_else(|| {
                env_error(&format!("Unclosed variable reference: ${{{braced}"))
            })?;
            let expr = &braced[..close];
            match expr.split_once(":-") {
                Some((name, fallback)) => match std::env::var(name) {
                    Ok(val) if !val.is_empty() => result.push_str(&val),
                    _ => result.push_str(fallback),
                },
                None => result.push_str(&required_var(expr)?),
            }
            rest = &braced[close + 1..];
        } else if let Some(named) = after.strip_prefix("env:") {
            let end = named
                .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                .unwrap_or(named.len());
            if end == 0 {
                return Err(env_error("Empty variable name in $env: reference"));
            }
            result.push_str(&required_var(&named[..end])?);
            rest = &named[end..];
        } else {
            result.push('$');
            rest = after;
        }
    }
    result.push_str(rest);

    Ok(result)
}

/// Expand environment variables in every string field of a provider config.
pub fn expand_provider_config(config: &mut OAuthConfig) -> Result<(), ThreelegError> {
    for field in [
        &mut config.client,
        &mut config.consumer_key,
        &mut config.consumer_secret,
        &mut config.callback,
        &mut config.callback_scheme,
        &mut config.request_token_url,
        &mut config.authorize_url,
        &mut config.access_token_url,
    ] {
        *field = expand_env_vars(field)?;
    }
    Ok(())
}

fn required_var(name: &str) -> Result<String, ThreelegError> {
    std::env::var(name)
        .map_err(|_| env_error(&format!("Environment variable '{name}' is not set")))
}

fn env_error(detail: &str) -> ThreelegError {
    ThreelegError::ConfigError {
        path: std::path::PathBuf::from("<env>"),
        detail: detail.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_dollar_brace_var() {
        std::env::set_var("THREELEG_TEST_VAR1", "hello");
        let result = expand_env_vars("prefix-${THREELEG_TEST_VAR1}-suffix").unwrap();
        assert_eq!(result, "prefix-hello-suffix");
        std::env::remove_var("THREELEG_TEST_VAR1");
    }

    #[test]
    fn expand_dollar_brace_unset_errors() {
        std::env::remove_var("THREELEG_TEST_UNSET_XYZ");
        let err = expand_env_vars("${THREELEG_TEST_UNSET_XYZ}").unwrap_err();
        assert!(err.to_string().contains("THREELEG_TEST_UNSET_XYZ"));
        assert!(err.to_string().contains("not set"));
    }

    #[test]
    fn expand_unclosed_brace_errors() {
        let err = expand_env_vars("${OOPS").unwrap_err();
        assert!(err.to_string().contains("Unclosed"));
    }

    #[test]
    fn expand_fallback_when_unset() {
        std::env::remove_var("THREELEG_TEST_FB_UNSET");
        let result = expand_env_vars("${THREELEG_TEST_FB_UNSET:-default_val}").unwrap();
        assert_eq!(result, "default_val");
    }

    #[test]
    fn expand_fallback_when_empty() {
        std::env::set_var("THREELEG_TEST_FB_EMPTY", "");
        let result = expand_env_vars("${THREELEG_TEST_FB_EMPTY:-fallback}").unwrap();
        assert_eq!(result, "fallback");
        std::env::remove_var("THREELEG_TEST_FB_EMPTY");
    }

    #[test]
    fn expand_env_colon_var() {
        std::env::set_var("THREELEG_TEST_ENV_COLON", "envval");
        let result = expand_env_vars("secret=$env:THREELEG_TEST_ENV_COLON&x").unwrap();
        assert_eq!(result, "secret=envval&x");
        std::env::remove_var("THREELEG_TEST_ENV_COLON");
    }

    #[test]
    fn lone_dollar_is_literal() {
        assert_eq!(expand_env_vars("cost: $5").unwrap(), "cost: $5");
        assert_eq!(expand_env_vars("trailing$").unwrap(), "trailing$");
    }

    #[test]
    fn multibyte_text_preserved() {
        std::env::set_var("THREELEG_TEST_MB", "ü");
        let result = expand_env_vars("é-${THREELEG_TEST_MB}-日本").unwrap();
        assert_eq!(result, "é-ü-日本");
        std::env::remove_var("THREELEG_TEST_MB");
    }

    #[test]
    fn expand_provider_config_expands_secrets() {
        std::env::set_var("THREELEG_TEST_PC_KEY", "key123");
        std::env::set_var("THREELEG_TEST_PC_SECRET", "secret456");
        let mut cfg = OAuthConfig {
            client: "c".into(),
            consumer_key: "${THREELEG_TEST_PC_KEY}".into(),
            consumer_secret: "$env:THREELEG_TEST_PC_SECRET".into(),
            callback: "myapp://cb".into(),
            callback_scheme: "myapp".into(),
            request_token_url: "${THREELEG_TEST_PC_HOST:-https://api.example.com}/request".into(),
            authorize_url: "https://api.example.com/authorize".into(),
            access_token_url: "https://api.example.com/access".into(),
        };
        expand_provider_config(&mut cfg).unwrap();
        assert_eq!(cfg.consumer_key, "key123");
        assert_eq!(cfg.consumer_secret, "secret456");
        assert_eq!(cfg.request_token_url, "https://api.example.com/request");
        std::env::remove_var("THREELEG_TEST_PC_KEY");
        std::env::remove_var("THREELEG_TEST_PC_SECRET");
    }
}
