//! Absolute-URI parsing for proxy request targets.

use thiserror::Error;

/// Why a request target could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UriError {
    #[error("request target does not start with http://")]
    MissingScheme,

    #[error("authority contains more than one ':'")]
    AmbiguousAuthority,

    #[error("empty host in request target")]
    EmptyHost,

    #[error("empty port in request target")]
    EmptyPort,
}

/// Host, port, and path decomposed from an absolute `http://` URI.
///
/// The port stays textual; it is only ever joined back into a `host:port`
/// dial string for the origin connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    pub host: String,
    pub port: String,
    pub path: String,
}

/// Decompose an absolute URI into `(host, port, path)`.
///
/// A target with no `/` after the authority gets the root path. IPv6
/// literals are unsupported: any second `:` in the authority is treated as
/// malformed rather than guessed at.
pub fn parse_absolute_uri(uri: &str) -> Result<RequestTarget, UriError> {
    let rest = uri.strip_prefix("http://").ok_or(UriError::MissingScheme)?;

    let (authority, path) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, "/"),
    };

    let (host, port) = match authority.split_once(':') {
        None => (authority, "80"),
        Some((host, port)) => {
            if port.contains(':') {
                return Err(UriError::AmbiguousAuthority);
            }
            if port.is_empty() {
                return Err(UriError::EmptyPort);
            }
            (host, port)
        }
    };

    if host.is_empty() {
        return Err(UriError::EmptyHost);
    }

    Ok(RequestTarget {
        host: host.to_string(),
        port: port.to_string(),
        path: path.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn parsed(uri: &str) -> RequestTarget {
        parse_absolute_uri(uri).unwrap()
    }

    #[test]
    fn splits_host_port_path() {
        let target = parsed("http://example.test:8080/dir/page.html");
        assert_eq!(target.host, "example.test");
        assert_eq!(target.port, "8080");
        assert_eq!(target.path, "/dir/page.html");
    }

    #[test]
    fn missing_port_defaults_to_80() {
        let target = parsed("http://example.test/index.html");
        assert_eq!(target.host, "example.test");
        assert_eq!(target.port, "80");
        assert_eq!(target.path, "/index.html");
    }

    #[test]
    fn missing_path_defaults_to_root() {
        assert_eq!(parsed("http://example.test").path, "/");
        assert_eq!(parsed("http://example.test:8080").path, "/");
        assert_eq!(parsed("http://example.test:8080").port, "8080");
    }

    #[test]
    fn path_may_contain_colons() {
        let target = parsed("http://example.test/a:b:c");
        assert_eq!(target.host, "example.test");
        assert_eq!(target.path, "/a:b:c");
    }

    #[test]
    fn multiple_colons_in_authority_are_malformed() {
        assert_eq!(
            parse_absolute_uri("http://example.test:80:80/x"),
            Err(UriError::AmbiguousAuthority)
        );
        assert_eq!(
            parse_absolute_uri("http://[::1]:80/x"),
            Err(UriError::AmbiguousAuthority)
        );
    }

    #[test]
    fn rejects_non_http_prefix() {
        assert_eq!(
            parse_absolute_uri("https://example.test/"),
            Err(UriError::MissingScheme)
        );
        assert_eq!(
            parse_absolute_uri("example.test/x"),
            Err(UriError::MissingScheme)
        );
    }

    #[test]
    fn rejects_empty_host_and_port() {
        assert_eq!(parse_absolute_uri("http:///x"), Err(UriError::EmptyHost));
        assert_eq!(
            parse_absolute_uri("http://example.test:/x"),
            Err(UriError::EmptyPort)
        );
    }

    proptest! {
        // Any well-formed host:port/path URI round-trips through the parser.
        #[test]
        fn roundtrip_with_port(
            host in "[a-z][a-z0-9.-]{0,20}",
            port in 1u32..65536,
            path in "/[a-zA-Z0-9./_-]{0,24}",
        ) {
            let uri = format!("http://{host}:{port}{path}");
            let target = parse_absolute_uri(&uri).unwrap();
            prop_assert_eq!(target.host, host);
            prop_assert_eq!(target.port, port.to_string());
            prop_assert_eq!(target.path, path);
        }

        // Without a colon the port always defaults to 80.
        #[test]
        fn roundtrip_default_port(
            host in "[a-z][a-z0-9.-]{0,20}",
            path in "/[a-zA-Z0-9./_-]{0,24}",
        ) {
            let uri = format!("http://{host}{path}");
            let target = parse_absolute_uri(&uri).unwrap();
            prop_assert_eq!(target.host, host);
            prop_assert_eq!(target.port, "80");
        }
    }
}
