//! Error types for request authentication.
//!
//! Defines the failure taxonomy for the verification pipeline with stable
//! codes for log correlation and the client/infrastructure split that drives
//! HTTP status mapping. Every failure is terminal for the request it belongs
//! to; none are retried.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type alias using `AuthError`.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Authentication failure taxonomy with codes matching the verification
/// pipeline stages.
///
/// Client-attributable failures (A1xxx) map to HTTP 400; infrastructure
/// failures (A2xxx) map to HTTP 500. The HTTP response body stays terse;
/// the full reason is only ever logged.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// Request timestamp outside the freshness tolerance window (A1001).
    #[error("[A1001] stale timestamp: {timestamp} outside tolerance window")]
    StaleTimestamp {
        /// The timestamp the request declared.
        timestamp: DateTime<Utc>,
    },

    /// Certificate chain URL header missing or failing shape validation
    /// (A1002). Never triggers a network call.
    #[error("[A1002] certificate chain URL rejected: {url}")]
    InvalidCertificateUrl {
        /// The header value as received (empty when the header was absent).
        url: String,
    },

    /// Request body could not be parsed far enough to extract the
    /// timestamp (A1003).
    #[error("[A1003] malformed request body: {0}")]
    MalformedBody(String),

    /// Certificate chain failed hostname, validity, or trust checks (A1004).
    #[error("[A1004] certificate chain rejected: {0}")]
    CertificateInvalid(String),

    /// Signature header malformed or cryptographic verification failed
    /// (A1005).
    #[error("[A1005] signature verification failed")]
    SignatureInvalid,

    /// Authenticated request was intended for a different skill (A1006).
    #[error("[A1006] application id mismatch")]
    ApplicationMismatch,

    /// Network or parse failure retrieving the certificate chain (A2001).
    #[error("[A2001] certificate fetch failed: {0}")]
    CertificateFetchFailed(String),
}

impl AuthError {
    /// Returns the stable error code (A1001-A2001).
    pub const fn code(&self) -> &'static str {
        match self {
            Self::StaleTimestamp { .. } => "A1001",
            Self::InvalidCertificateUrl { .. } => "A1002",
            Self::MalformedBody(_) => "A1003",
            Self::CertificateInvalid(_) => "A1004",
            Self::SignatureInvalid => "A1005",
            Self::ApplicationMismatch => "A1006",
            Self::CertificateFetchFailed(_) => "A2001",
        }
    }

    /// Returns whether the failure is attributable to the request itself.
    ///
    /// Client-attributable failures surface as HTTP 400; everything else is
    /// an infrastructure failure and surfaces as HTTP 500.
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::CertificateFetchFailed(_))
    }
}
