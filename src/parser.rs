//! Splits an absolute-form request URI (`http://host[:port]/path`) into
//! `(host, port, path)`.
//!
//! Strips a leading `http://`, splits the authority on its last `:`
//! before the first `/`, falls back to port `"80"` on a missing or
//! out-of-range port and to path `"/"` when none is given. Input is
//! truncated to `MAXLINE` bytes before parsing. IPv6-bracketed hosts
//! and paths containing `:` are not special-cased.

use crate::MAXLINE;

const HTTP_PREFIX: &str = "http://";
const DEFAULT_PORT: &str = "80";

fn truncate_to_maxline(s: &str) -> &str {
    if s.len() <= MAXLINE {
        return s;
    }
    let mut end = MAXLINE;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Parses an absolute-form request-URI into `(host, port, path)`.
///
/// `port` is always present in the returned tuple, defaulting to
/// `"80"`; `path` always starts with `/`, defaulting to `"/"`.
pub fn parse_absolute_uri(request_uri: &str) -> (String, String, String) {
    let rest = truncate_to_maxline(request_uri.strip_prefix(HTTP_PREFIX).unwrap_or(request_uri));

    let (authority, path) = match rest.find('/') {
        Some(pos) => (&rest[..pos], rest[pos..].to_string()),
        None => (rest, "/".to_string()),
    };

    let (host, port) = match authority.rfind(':') {
        Some(pos) => {
            let host = authority[..pos].to_string();
            let port_str = &authority[pos + 1..];
            match port_str.parse::<i64>() {
                Ok(n) if (0..=65535).contains(&n) => (host, n.to_string()),
                _ => (host, DEFAULT_PORT.to_string()),
            }
        }
        None => (authority.to_string(), DEFAULT_PORT.to_string()),
    };

    (host, port, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_port_and_root_path() {
        let (host, port, path) = parse_absolute_uri("http://example.com/");
        assert_eq!(host, "example.com");
        assert_eq!(port, "80");
        assert_eq!(path, "/");
    }

    #[test]
    fn missing_path_defaults_to_root() {
        let (host, port, path) = parse_absolute_uri("http://example.com");
        assert_eq!(host, "example.com");
        assert_eq!(port, "80");
        assert_eq!(path, "/");
    }

    #[test]
    fn explicit_port_and_query_path() {
        let (host, port, path) = parse_absolute_uri("http://example.com:8080/a/b?x=1");
        assert_eq!(host, "example.com");
        assert_eq!(port, "8080");
        assert_eq!(path, "/a/b?x=1");
    }

    #[test]
    fn out_of_range_port_falls_back_to_80() {
        let (host, port, _) = parse_absolute_uri("http://example.com:99999/p");
        assert_eq!(host, "example.com");
        assert_eq!(port, "80");
    }

    #[test]
    fn non_numeric_port_falls_back_to_80() {
        let (host, port, _) = parse_absolute_uri("http://example.com:abc/p");
        assert_eq!(host, "example.com");
        assert_eq!(port, "80");
    }

    #[test]
    fn missing_scheme_is_treated_as_host() {
        // parse_absolute_uri is a pure splitter; scheme validation
        // happens earlier in the pipeline.
        let (host, port, path) = parse_absolute_uri("example.com/x");
        assert_eq!(host, "example.com");
        assert_eq!(port, "80");
        assert_eq!(path, "/x");
    }

    #[test]
    fn truncates_overlong_input_to_maxline() {
        let long_host = "a".repeat(MAXLINE + 100);
        let uri = format!("http://{long_host}/p");
        let (host, _port, _path) = parse_absolute_uri(&uri);
        assert!(host.len() <= MAXLINE);
    }
}
