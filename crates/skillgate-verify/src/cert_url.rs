//! Signing-certificate URL validation.
//!
//! Gates the `SignatureCertChainUrl` header value before it is ever
//! dereferenced. A crafted header must not be able to point the fetcher at
//! an attacker-controlled endpoint, so the URL has to match the platform's
//! exact shape: scheme, host, first path component, and port.
//!
//! Comparison semantics: the `url` crate normalizes scheme and host to
//! lowercase during parsing, so those checks are effectively
//! case-insensitive; the path comparison is case-sensitive and runs against
//! the percent-decoded, dot-segment-normalized first component.

use percent_encoding::percent_decode_str;
use url::Url;

/// URL shape policy for the signing-certificate chain header.
///
/// Fields are explicit configuration so tests can point the policy at a
/// local mock server; production code uses [`UrlPolicy::default`], which
/// carries the platform values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlPolicy {
    /// Required scheme (compared against the parser's lowercased form).
    pub scheme: String,
    /// Required host (compared against the parser's lowercased form).
    pub host: String,
    /// Required first path component, compared case-sensitively after
    /// percent-decoding.
    pub path_root: String,
    /// The only explicit port accepted; an absent port is always accepted.
    pub port: u16,
}

impl Default for UrlPolicy {
    fn default() -> Self {
        Self {
            scheme: "https".to_string(),
            host: "s3.amazonaws.com".to_string(),
            path_root: "echo-api".to_string(),
            port: 443,
        }
    }
}

impl UrlPolicy {
    /// Returns whether `raw` is an acceptable signing-certificate URL.
    ///
    /// Malformed input yields `false`, never an error: this is a boolean
    /// gate, not a parser. MUST be consulted before any network fetch is
    /// attempted against the value.
    pub fn is_valid_signing_url(&self, raw: &str) -> bool {
        let Ok(url) = Url::parse(raw) else {
            return false;
        };

        if url.scheme() != self.scheme {
            return false;
        }

        if url.host_str() != Some(self.host.as_str()) {
            return false;
        }

        // `Url::port` reports None for the scheme's default port, so an
        // explicit `:443` on https and an absent port are both accepted.
        if let Some(port) = url.port() {
            if port != self.port {
                return false;
            }
        }

        // The parser has already resolved dot segments; the first component
        // of the normalized path must be the policy root, exactly.
        let Some(mut segments) = url.path_segments() else {
            return false;
        };
        let Some(first) = segments.next() else {
            return false;
        };
        match percent_decode_str(first).decode_utf8() {
            Ok(decoded) => decoded == self.path_root,
            Err(_) => false,
        }
    }
}
