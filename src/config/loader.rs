use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::ThreelegError;

use super::env::expand_provider_config;
use super::types::{OAuthConfig, ThreelegConfig};

/// Strip JSONC comments (// line comments and /* */ block comments) from input.
pub fn strip_jsonc_comments(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escape_next = false;

    while let Some(ch) = chars.next() {
        if in_string {
            result.push(ch);
            if escape_next {
                escape_next = false;
            } else if ch == '\\' {
                escape_next = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        let next = chars.peek().copied();
        match (ch, next) {
            ('"', _) => {
                in_string = true;
                result.push(ch);
            }
            ('/', Some('/')) => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        result.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = ' ';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    // Keep line numbers stable for serde error positions.
                    if c == '\n' {
                        result.push('\n');
                    }
                    prev = c;
                }
            }
            _ => result.push(ch),
        }
    }

    result
}

/// Discover config files in precedence order (highest first).
///
/// 1. `--config` CLI flag
/// 2. `THREELEG_CONFIG` env var
/// 3. `./config/threeleg.json` (project-level)
/// 4. `~/.threeleg/threeleg.json` or `~/.threeleg/threeleg.jsonc`
pub fn discover_config_files(cli_config: Option<&str>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(path) = cli_config {
        candidates.push(PathBuf::from(path));
    }
    if let Ok(env_path) = std::env::var("THREELEG_CONFIG") {
        candidates.push(PathBuf::from(env_path));
    }
    candidates.push(PathBuf::from("./config/threeleg.json"));
    if let Some(home) = dirs::home_dir() {
        let base = home.join(".threeleg");
        let json = base.join("threeleg.json");
        if json.exists() {
            candidates.push(json);
        } else {
            candidates.push(base.join("threeleg.jsonc"));
        }
    }

    let mut files: Vec<PathBuf> = Vec::new();
    for path in candidates {
        if path.exists() && !files.contains(&path) {
            files.push(path);
        }
    }
    files
}

/// Load a single config file, stripping JSONC comments before parsing.
pub fn load_config_file(path: &Path) -> Result<ThreelegConfig, ThreelegError> {
    let content = std::fs::read_to_string(path).map_err(|e| ThreelegError::ConfigError {
        path: path.to_path_buf(),
        detail: format!("Cannot read file: {e}"),
    })?;

    let stripped = strip_jsonc_comments(&content);
    serde_json::from_str::<ThreelegConfig>(&stripped).map_err(|e| ThreelegError::ConfigError {
        path: path.to_path_buf(),
        detail: format!("Invalid JSON: {e}"),
    })
}

/// Merge providers from `source` into `target`; earlier sources win.
fn merge_providers(
    target: &mut HashMap<String, OAuthConfig>,
    source: HashMap<String, OAuthConfig>,
) {
    for (name, config) in source {
        target.entry(name).or_insert(config);
    }
}

/// Load, merge, and expand all configuration.
pub fn load_config(cli_config: Option<&str>) -> Result<ThreelegConfig, ThreelegError> {
    let mut providers: HashMap<String, OAuthConfig> = HashMap::new();

    for path in discover_config_files(cli_config) {
        tracing::debug!(path = %path.display(), "loading config file");
        let cfg = load_config_file(&path)?;
        merge_providers(&mut providers, cfg.providers);
    }

    for config in providers.values_mut() {
        expand_provider_config(config)?;
    }

    Ok(ThreelegConfig { providers })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(client: &str) -> OAuthConfig {
        OAuthConfig {
            client: client.into(),
            consumer_key: "ck".into(),
            consumer_secret: "cs".into(),
            callback: "oob".into(),
            callback_scheme: String::new(),
            request_token_url: "https://a.example.com/r".into(),
            authorize_url: "https://a.example.com/a".into(),
            access_token_url: "https://a.example.com/t".into(),
        }
    }

    #[test]
    fn strip_line_comments() {
        let input = r#"{
  // This is a comment
  "key": "value" // inline comment
}"#;
        let result = strip_jsonc_comments(input);
        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed["key"], "value");
    }

    #[test]
    fn strip_block_comments() {
        let input = r#"{
  /*
   * multi-line
   */
  "key": "value"
}"#;
        let result = strip_jsonc_comments(input);
        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed["key"], "value");
    }

    #[test]
    fn preserve_urls_in_strings() {
        let input = r#"{"url": "https://example.com/path", "escaped": "a\"//b"}"#;
        let result = strip_jsonc_comments(input);
        assert_eq!(result, input);
        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed["url"], "https://example.com/path");
        assert_eq!(parsed["escaped"], "a\"//b");
    }

    #[test]
    fn merge_providers_no_override() {
        let mut target = HashMap::from([("p".to_string(), provider("first"))]);
        let source = HashMap::from([
            ("p".to_string(), provider("second")),
            ("q".to_string(), provider("new")),
        ]);
        merge_providers(&mut target, source);
        assert_eq!(target["p"].client, "first");
        assert_eq!(target["q"].client, "new");
    }

    #[test]
    fn discover_skips_missing_cli_path() {
        let files = discover_config_files(Some("/nonexistent/path/threeleg.json"));
        for f in &files {
            assert!(f.exists());
        }
    }

    #[test]
    fn load_config_file_parses_jsonc() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("threeleg.jsonc");
        std::fs::write(
            &path,
            r#"{
  // providers registered with this app
  "providers": {
    "discogs": {
      "consumerKey": "ck",
      "consumerSecret": "cs",
      "callback": "oob",
      "requestTokenUrl": "https://api.discogs.com/oauth/request_token",
      "authorizeUrl": "https://www.discogs.com/oauth/authorize",
      "accessTokenUrl": "https://api.discogs.com/oauth/access_token"
    }
  }
}"#,
        )
        .unwrap();

        let config = load_config_file(&path).unwrap();
        let discogs = config.provider("discogs").unwrap();
        assert_eq!(discogs.consumer_key, "ck");
    }

    #[test]
    fn load_config_expands_env_from_cli_path() {
        std::env::set_var("THREELEG_TEST_LOADER_SECRET", "from-env");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("threeleg.json");
        let mut p = provider("c");
        p.consumer_secret = "${THREELEG_TEST_LOADER_SECRET}".into();
        let cfg = ThreelegConfig {
            providers: HashMap::from([("only-in-test-file".to_string(), p)]),
        };
        std::fs::write(&path, serde_json::to_string(&cfg).unwrap()).unwrap();

        let loaded = load_config(path.to_str()).unwrap();
        assert_eq!(
            loaded.provider("only-in-test-file").unwrap().consumer_secret,
            "from-env"
        );
        std::env::remove_var("THREELEG_TEST_LOADER_SECRET");
    }

    #[test]
    fn load_config_file_error_on_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "not valid json at all").unwrap();

        let err = load_config_file(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid JSON"));
    }

    #[test]
    fn load_config_file_error_on_missing_file() {
        let err = load_config_file(Path::new("/nonexistent/file.json")).unwrap_err();
        assert!(err.to_string().contains("Cannot read file"));
    }
}
