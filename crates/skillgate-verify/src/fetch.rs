//! Certificate chain retrieval.
//!
//! Fetches the PEM-encoded signing certificate chain referenced by a URL
//! that has already passed [`UrlPolicy`](crate::cert_url::UrlPolicy) and
//! decodes it into DER blocks. Every malformed-remote-content case is an
//! explicit error; a broken or hostile certificate host must never crash the
//! serving process.

use anyhow::Context as _;
use tracing::debug;

use skillgate_core::AuthError;

use crate::chain::CertificateChain;

/// Configuration for the certificate fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Timeout for the whole fetch, connect included.
    pub timeout: std::time::Duration,
    /// User agent string for requests.
    pub user_agent: String,
    /// Upper bound on the response body size in bytes.
    pub max_response_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: std::time::Duration::from_secs(10),
            user_agent: concat!("Skillgate/", env!("CARGO_PKG_VERSION")).to_string(),
            max_response_bytes: 256 * 1024,
        }
    }
}

/// HTTP client for retrieving signing certificate chains.
///
/// Built once and reused across requests for connection pooling. Redirects
/// are disabled: the URL was validated as-is, and a redirect would let the
/// certificate host bounce the fetch somewhere the validator never saw.
#[derive(Debug, Clone)]
pub struct ChainFetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl ChainFetcher {
    /// Creates a fetcher with the given configuration.
    ///
    /// # Errors
    ///
    /// Fails when the underlying HTTP client cannot be constructed with the
    /// requested settings.
    pub fn new(config: FetchConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("failed to build certificate fetch client")?;

        Ok(Self { client, config })
    }

    /// Creates a fetcher with default configuration.
    pub fn with_defaults() -> anyhow::Result<Self> {
        Self::new(FetchConfig::default())
    }

    /// Retrieves and decodes the certificate chain at `url`.
    ///
    /// One outbound GET per invocation; no caching, no retries. If the
    /// surrounding request is cancelled the in-flight fetch is dropped with
    /// it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::CertificateFetchFailed` when the request fails,
    /// the response status is not 2xx, the body exceeds the configured size
    /// cap, the body contains no CERTIFICATE PEM block, or any block fails
    /// X.509 parsing.
    pub async fn fetch(&self, url: &str) -> Result<CertificateChain, AuthError> {
        debug!(url, "fetching signing certificate chain");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                AuthError::CertificateFetchFailed(format!(
                    "timed out after {}s",
                    self.config.timeout.as_secs()
                ))
            } else if e.is_connect() {
                AuthError::CertificateFetchFailed(format!("connection failed: {e}"))
            } else {
                AuthError::CertificateFetchFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::CertificateFetchFailed(format!(
                "certificate host answered with status {status}"
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AuthError::CertificateFetchFailed(format!("failed to read body: {e}")))?;

        if body.len() > self.config.max_response_bytes {
            return Err(AuthError::CertificateFetchFailed(format!(
                "response of {} bytes exceeds the {} byte cap",
                body.len(),
                self.config.max_response_bytes
            )));
        }

        let chain = decode_chain(&body)?;
        debug!(certificates = chain.len(), "certificate chain decoded");
        Ok(chain)
    }
}

/// Decodes one or more PEM CERTIFICATE blocks into a [`CertificateChain`].
///
/// Non-certificate PEM blocks are ignored; at least one CERTIFICATE block
/// must be present and every one of them must parse as X.509.
///
/// # Errors
///
/// Returns `AuthError::CertificateFetchFailed` on PEM syntax errors, an
/// empty chain, or X.509 parse failures.
pub fn decode_chain(body: &[u8]) -> Result<CertificateChain, AuthError> {
    use x509_parser::prelude::{FromDer, X509Certificate};

    let blocks = pem::parse_many(body)
        .map_err(|e| AuthError::CertificateFetchFailed(format!("invalid PEM: {e}")))?;

    let der_blocks: Vec<Vec<u8>> = blocks
        .into_iter()
        .filter(|block| block.tag() == "CERTIFICATE")
        .map(pem::Pem::into_contents)
        .collect();

    if der_blocks.is_empty() {
        return Err(AuthError::CertificateFetchFailed(
            "no CERTIFICATE PEM block in response".to_string(),
        ));
    }

    for (depth, der) in der_blocks.iter().enumerate() {
        X509Certificate::from_der(der).map_err(|e| {
            AuthError::CertificateFetchFailed(format!(
                "certificate at depth {depth} failed X.509 parsing: {e}"
            ))
        })?;
    }

    Ok(CertificateChain::new(der_blocks))
}

#[cfg(test)]
mod tests {
    use skillgate_testing::certs::SigningFixture;
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn fetches_and_decodes_a_served_chain() {
        let fixture = SigningFixture::generate("echo-api.amazon.com").expect("fixture");
        let server = MockServer::start().await;

        Mock::given(matchers::method("GET"))
            .and(matchers::path("/echo-api/cert.pem"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(fixture.chain_pem(), "application/x-pem-file"),
            )
            .mount(&server)
            .await;

        let fetcher = ChainFetcher::with_defaults().expect("fetcher");
        let chain =
            fetcher.fetch(&format!("{}/echo-api/cert.pem", server.uri())).await.expect("chain");

        assert_eq!(chain.len(), 2);
    }

    #[tokio::test]
    async fn non_success_status_is_a_fetch_failure() {
        let server = MockServer::start().await;

        Mock::given(matchers::method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = ChainFetcher::with_defaults().expect("fetcher");
        let err = fetcher
            .fetch(&format!("{}/echo-api/cert.pem", server.uri()))
            .await
            .expect_err("404 must fail");

        assert!(matches!(err, AuthError::CertificateFetchFailed(_)));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_fetch_failure_not_a_panic() {
        let fetcher = ChainFetcher::with_defaults().expect("fetcher");
        // Port 1 is essentially never listening.
        let err =
            fetcher.fetch("http://127.0.0.1:1/echo-api/cert.pem").await.expect_err("must fail");

        assert!(matches!(err, AuthError::CertificateFetchFailed(_)));
    }

    #[tokio::test]
    async fn oversized_response_is_rejected() {
        let server = MockServer::start().await;

        Mock::given(matchers::method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![b'a'; 2048], "text/plain"))
            .mount(&server)
            .await;

        let fetcher = ChainFetcher::new(FetchConfig {
            max_response_bytes: 1024,
            ..FetchConfig::default()
        })
        .expect("fetcher");

        let err =
            fetcher.fetch(&format!("{}/cert.pem", server.uri())).await.expect_err("too large");
        assert!(err.to_string().contains("exceeds"));
    }

    #[test]
    fn decode_rejects_bodies_without_certificates() {
        assert!(decode_chain(b"").is_err());
        assert!(decode_chain(b"plain text, no PEM armor").is_err());

        // A PEM block with a non-certificate tag alone is not a chain.
        let key_block = pem::encode(&pem::Pem::new("PUBLIC KEY", vec![0u8; 32]));
        assert!(decode_chain(key_block.as_bytes()).is_err());
    }

    #[test]
    fn decode_rejects_garbage_der_inside_certificate_armor() {
        let bogus = pem::encode(&pem::Pem::new("CERTIFICATE", b"definitely not DER".to_vec()));
        let err = decode_chain(bogus.as_bytes()).expect_err("bogus DER must fail");

        assert!(matches!(err, AuthError::CertificateFetchFailed(_)));
        assert!(err.to_string().contains("X.509"));
    }

    #[test]
    fn decode_accepts_a_real_generated_chain() {
        let fixture = SigningFixture::generate("echo-api.amazon.com").expect("fixture");
        let chain = decode_chain(fixture.chain_pem().as_bytes()).expect("decodes");

        assert_eq!(chain.len(), 2);
        assert!(!chain.is_empty());
    }
}
