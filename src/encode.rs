//! RFC 3986 percent-encoding and form-style query parsing.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything except the RFC 3986 unreserved set (`A-Z a-z 0-9 - . _ ~`).
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode a string the way OAuth 1.0a signatures require.
///
/// Unreserved characters pass through, every other byte of the UTF-8
/// representation becomes `%XX` with uppercase hex. Spaces become `%20`,
/// never `+`.
pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, OAUTH_ENCODE_SET).to_string()
}

/// Inverse of [`percent_encode`]. Malformed escapes are kept literally and
/// invalid UTF-8 is replaced, so decoding never fails.
pub fn percent_decode(input: &str) -> String {
    percent_decode_str(input).decode_utf8_lossy().into_owned()
}

/// Parse an `application/x-www-form-urlencoded` string into ordered pairs.
///
/// Used for authorization-server response bodies and redirect query strings.
/// A leading `?` is tolerated and empty segments are skipped.
pub fn parse_query(input: &str) -> Vec<(String, String)> {
    let input = input.strip_prefix('?').unwrap_or(input);
    url::form_urlencoded::parse(input.as_bytes())
        .filter(|(name, _)| !name.is_empty())
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect()
}

/// First value for `name` in a parsed pair list.
pub fn find_param<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreserved_characters_untouched() {
        let unreserved = "ABCXYZabcxyz0189-._~";
        assert_eq!(percent_encode(unreserved), unreserved);
    }

    #[test]
    fn reserved_characters_escaped_uppercase() {
        assert_eq!(percent_encode("hello world"), "hello%20world");
        assert_eq!(percent_encode("foo=bar&baz"), "foo%3Dbar%26baz");
        assert_eq!(percent_encode("a+b/c?d"), "a%2Bb%2Fc%3Fd");
        assert_eq!(percent_encode("*"), "%2A");
        assert_eq!(percent_encode("%"), "%25");
    }

    #[test]
    fn multibyte_utf8_escaped_per_byte() {
        assert_eq!(percent_encode("é"), "%C3%A9");
        assert_eq!(percent_encode("☃"), "%E2%98%83");
    }

    #[test]
    fn empty_string_encodes_to_empty() {
        assert_eq!(percent_encode(""), "");
    }

    #[test]
    fn encoding_is_not_idempotent() {
        let once = percent_encode("a b");
        let twice = percent_encode(&once);
        assert_eq!(once, "a%20b");
        assert_eq!(twice, "a%2520b");
    }

    #[test]
    fn encoded_output_only_contains_safe_characters() {
        let samples = [
            "!\"#$%&'()*+,/:;<=>?@[\\]^`{|}",
            "Ladies + Gentlemen, a signed OAuth request!",
            "tab\tnewline\n\u{0}",
            "日本語テキスト",
        ];
        for sample in samples {
            let encoded = percent_encode(sample);
            for ch in encoded.chars() {
                assert!(
                    ch.is_ascii_alphanumeric() || "-._~%".contains(ch),
                    "unexpected char '{ch}' in {encoded}"
                );
            }
            assert_eq!(percent_decode(&encoded), sample);
        }
    }

    #[test]
    fn percent_decode_tolerates_malformed_escapes() {
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz"), "%zz");
    }

    #[test]
    fn parse_query_basic() {
        let params = parse_query("oauth_token=abc&oauth_token_secret=xyz");
        assert_eq!(
            params,
            vec![
                ("oauth_token".to_string(), "abc".to_string()),
                ("oauth_token_secret".to_string(), "xyz".to_string()),
            ]
        );
    }

    #[test]
    fn parse_query_decodes_values() {
        let params = parse_query("?name=a%20b&plus=c+d");
        assert_eq!(find_param(&params, "name"), Some("a b"));
        assert_eq!(find_param(&params, "plus"), Some("c d"));
    }

    #[test]
    fn parse_query_empty_input() {
        assert!(parse_query("").is_empty());
        assert!(parse_query("&&").is_empty());
    }

    #[test]
    fn find_param_returns_first_duplicate() {
        let params = parse_query("a=1&a=2");
        assert_eq!(find_param(&params, "a"), Some("1"));
        assert_eq!(find_param(&params, "b"), None);
    }
}
