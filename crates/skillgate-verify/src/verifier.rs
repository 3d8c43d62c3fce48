//! Pipeline orchestration.
//!
//! [`RequestVerifier`] runs the authentication checks in strict sequence
//! over one captured request: body timestamp, certificate URL shape, chain
//! retrieval, chain verification, body signature, and the optional
//! application-id check. No step runs if an earlier step failed, and no
//! certificate is ever fetched for a URL the shape gate rejected.

use std::sync::Arc;

use tracing::debug;

use skillgate_core::{extract_application_id, extract_timestamp, AuthError, Clock, SystemClock};

use crate::cert_url::UrlPolicy;
use crate::chain::ChainPolicy;
use crate::fetch::{ChainFetcher, FetchConfig};
use crate::signature::verify_body_signature;
use crate::timestamp::TimestampPolicy;

/// Configuration for a [`RequestVerifier`].
///
/// Every knob is explicit so tests can point the pipeline at local mocks;
/// [`VerifierConfig::default`] carries the platform values.
#[derive(Debug, Clone, Default)]
pub struct VerifierConfig {
    /// Timestamp freshness policy.
    pub timestamp: TimestampPolicy,
    /// Certificate URL shape policy.
    pub url: UrlPolicy,
    /// Certificate fetch settings.
    pub fetch: FetchConfig,
    /// Chain acceptance policy.
    pub chain: ChainPolicy,
    /// When set, the authenticated request's application id must match.
    pub expected_application_id: Option<String>,
}

/// Sequential short-circuit verifier for inbound skill requests.
///
/// Stateless across requests: concurrent verifications are fully
/// independent and require no locking. The certificate fetch is the only
/// network-bound step; dropping the returned future (framework timeout or
/// client disconnect) aborts it promptly.
#[derive(Debug)]
pub struct RequestVerifier {
    timestamp: TimestampPolicy,
    url: UrlPolicy,
    fetcher: ChainFetcher,
    chain: ChainPolicy,
    expected_application_id: Option<String>,
    clock: Arc<dyn Clock>,
}

impl RequestVerifier {
    /// Creates a verifier from configuration and an injected clock.
    ///
    /// # Errors
    ///
    /// Fails when the certificate fetch client cannot be constructed.
    pub fn new(config: VerifierConfig, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        Ok(Self {
            timestamp: config.timestamp,
            url: config.url,
            fetcher: ChainFetcher::new(config.fetch)?,
            chain: config.chain,
            expected_application_id: config.expected_application_id,
            clock,
        })
    }

    /// Creates a verifier with platform defaults and the system clock.
    ///
    /// # Errors
    ///
    /// Fails when the certificate fetch client cannot be constructed.
    pub fn with_defaults() -> anyhow::Result<Self> {
        Self::new(VerifierConfig::default(), Arc::new(SystemClock::new()))
    }

    /// Runs the full authentication pipeline over one captured request.
    ///
    /// `certificate_url` and `signature` are the values of the
    /// `SignatureCertChainUrl` and `Signature` headers; `body` is the raw,
    /// unmodified request body. `Ok(())` means the request is authenticated
    /// and the body may be handed to the skill.
    ///
    /// # Errors
    ///
    /// The first failing step's `AuthError`; later steps do not run.
    pub async fn verify(
        &self,
        certificate_url: Option<&str>,
        signature: Option<&str>,
        body: &[u8],
    ) -> Result<(), AuthError> {
        let timestamp = extract_timestamp(body)?;
        let now = self.clock.now_utc();
        if !self.timestamp.is_fresh(timestamp, now) {
            return Err(AuthError::StaleTimestamp { timestamp });
        }
        debug!(%timestamp, "request timestamp is fresh");

        let url = certificate_url.unwrap_or_default();
        if !self.url.is_valid_signing_url(url) {
            return Err(AuthError::InvalidCertificateUrl { url: url.to_string() });
        }

        let chain = self.fetcher.fetch(url).await?;
        let verified = self.chain.verify(&chain, now)?;
        debug!(certificates = chain.len(), "certificate chain verified");

        let signature = signature.ok_or(AuthError::SignatureInvalid)?;
        verify_body_signature(body, signature, verified.public_key())?;

        if let Some(expected) = &self.expected_application_id {
            match extract_application_id(body) {
                Some(id) if id == *expected => {},
                _ => return Err(AuthError::ApplicationMismatch),
            }
        }

        debug!("request authenticated");
        Ok(())
    }
}
