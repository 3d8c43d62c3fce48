//! Inbound request authentication pipeline.
//!
//! Proves that an inbound HTTP request genuinely originated from the voice
//! platform and is not a replayed old request. The pipeline runs five checks
//! in strict sequence, short-circuiting on the first failure:
//!
//! 1. **Timestamp freshness** - the declared request timestamp falls inside
//!    a symmetric tolerance window around "now" ([`TimestampPolicy`]).
//! 2. **Certificate URL shape** - the `SignatureCertChainUrl` header matches
//!    the platform's exact URL shape before it is ever dereferenced
//!    ([`UrlPolicy`]).
//! 3. **Chain retrieval** - the PEM certificate chain is fetched and decoded
//!    ([`ChainFetcher`]).
//! 4. **Chain verification** - signing-domain SAN, validity windows, issuer
//!    signatures, and root anchoring ([`ChainPolicy`]).
//! 5. **Body signature** - the base64 `Signature` header verifies against
//!    the SHA-1 digest of the exact body bytes using the leaf certificate's
//!    RSA key ([`verify_body_signature`]).
//!
//! [`RequestVerifier`] composes the five steps; the HTTP glue lives in the
//! `skillgate-api` crate.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cert_url;
pub mod chain;
pub mod fetch;
pub mod signature;
pub mod timestamp;
pub mod verifier;

pub use cert_url::UrlPolicy;
pub use chain::{CertificateChain, ChainPolicy, VerifiedChain};
pub use fetch::{decode_chain, ChainFetcher, FetchConfig};
pub use signature::verify_body_signature;
pub use timestamp::TimestampPolicy;
pub use verifier::{RequestVerifier, VerifierConfig};
