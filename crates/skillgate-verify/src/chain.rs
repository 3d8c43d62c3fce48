//! Certificate chain verification.
//!
//! Validates a fetched chain before its leaf key is trusted to verify a
//! request signature: the leaf must carry the platform's signing domain
//! among its subject alternative names, every certificate must be inside
//! its validity window at the reference time, each certificate must be
//! signed by its successor, and the final certificate must anchor to a
//! configured trust root. Only after all of that does the leaf's RSA public
//! key leave this module.

use chrono::{DateTime, Utc};
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::RsaPublicKey;
use x509_parser::oid_registry::OID_PKCS1_RSAENCRYPTION;
use x509_parser::prelude::{ASN1Time, FromDer, GeneralName, X509Certificate};

use skillgate_core::AuthError;

/// An ordered X.509 certificate chain, leaf first, as DER blocks.
///
/// Owned by the verification step that fetched it and discarded when the
/// request completes; never mutated.
#[derive(Debug, Clone)]
pub struct CertificateChain {
    der: Vec<Vec<u8>>,
}

impl CertificateChain {
    /// Wraps decoded DER blocks, leaf first.
    pub fn new(der: Vec<Vec<u8>>) -> Self {
        Self { der }
    }

    /// Number of certificates in the chain.
    pub fn len(&self) -> usize {
        self.der.len()
    }

    /// Returns true when the chain holds no certificates.
    pub fn is_empty(&self) -> bool {
        self.der.is_empty()
    }

    /// The raw DER blocks, leaf first.
    pub fn der_blocks(&self) -> &[Vec<u8>] {
        &self.der
    }
}

/// Chain acceptance policy: expected signing domain and trust roots.
#[derive(Debug, Clone)]
pub struct ChainPolicy {
    /// Domain that must appear among the leaf's subject alternative names.
    pub expected_san: String,
    /// DER-encoded trust anchor certificates. When empty, the chain's root
    /// must at least be a valid self-signed certificate; production
    /// deployments configure the platform root here.
    pub trust_anchors: Vec<Vec<u8>>,
}

impl Default for ChainPolicy {
    fn default() -> Self {
        Self { expected_san: "echo-api.amazon.com".to_string(), trust_anchors: Vec::new() }
    }
}

/// A chain that passed every check, exposing the leaf's public key.
#[derive(Debug, Clone)]
pub struct VerifiedChain {
    public_key: RsaPublicKey,
}

impl VerifiedChain {
    /// The leaf certificate's RSA public key.
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }
}

impl ChainPolicy {
    /// Verifies `chain` at `reference_time`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::CertificateInvalid` when the chain is empty, the
    /// leaf does not carry the expected signing domain, any certificate is
    /// outside its validity window, any link in the chain is not signed by
    /// its issuer, the root fails to anchor, or the leaf key is not RSA.
    pub fn verify(
        &self,
        chain: &CertificateChain,
        reference_time: DateTime<Utc>,
    ) -> Result<VerifiedChain, AuthError> {
        let parsed: Vec<X509Certificate<'_>> = chain
            .der_blocks()
            .iter()
            .map(|der| X509Certificate::from_der(der).map(|(_, cert)| cert))
            .collect::<Result<_, _>>()
            .map_err(|e| AuthError::CertificateInvalid(format!("X.509 parse failed: {e}")))?;

        let leaf = parsed
            .first()
            .ok_or_else(|| AuthError::CertificateInvalid("empty certificate chain".to_string()))?;

        if !leaf_has_expected_san(leaf, &self.expected_san)? {
            return Err(AuthError::CertificateInvalid(format!(
                "{} not present in the leaf's subject alternative names",
                self.expected_san
            )));
        }

        let at = ASN1Time::from_timestamp(reference_time.timestamp()).map_err(|e| {
            AuthError::CertificateInvalid(format!("reference time out of range: {e}"))
        })?;
        for (depth, cert) in parsed.iter().enumerate() {
            if !cert.validity().is_valid_at(at) {
                return Err(AuthError::CertificateInvalid(format!(
                    "certificate at depth {depth} is outside its validity window"
                )));
            }
        }

        for (depth, pair) in parsed.windows(2).enumerate() {
            pair[0].verify_signature(Some(pair[1].public_key())).map_err(|_| {
                AuthError::CertificateInvalid(format!(
                    "certificate at depth {depth} is not signed by its issuer"
                ))
            })?;
        }

        let root = parsed
            .last()
            .ok_or_else(|| AuthError::CertificateInvalid("empty certificate chain".to_string()))?;
        self.check_anchoring(chain, root)?;

        let public_key = extract_rsa_public_key(leaf)?;
        Ok(VerifiedChain { public_key })
    }

    /// Checks that `root` anchors to a configured trust root.
    ///
    /// A root that IS one of the anchors (byte-identical DER) or is signed
    /// by one of them is accepted. Without configured anchors the root must
    /// be a valid self-signed certificate.
    fn check_anchoring(
        &self,
        chain: &CertificateChain,
        root: &X509Certificate<'_>,
    ) -> Result<(), AuthError> {
        if self.trust_anchors.is_empty() {
            return root.verify_signature(None).map_err(|_| {
                AuthError::CertificateInvalid(
                    "root certificate is not self-signed and no trust anchors are configured"
                        .to_string(),
                )
            });
        }

        let root_der = chain.der_blocks().last().map(Vec::as_slice);
        let anchored = self.trust_anchors.iter().any(|anchor_der| {
            if root_der == Some(anchor_der.as_slice()) {
                return true;
            }
            match X509Certificate::from_der(anchor_der) {
                Ok((_, anchor)) => root.verify_signature(Some(anchor.public_key())).is_ok(),
                Err(_) => false,
            }
        });

        if anchored {
            Ok(())
        } else {
            Err(AuthError::CertificateInvalid(
                "certificate chain does not anchor to a configured trust root".to_string(),
            ))
        }
    }
}

/// Returns whether the leaf's subject alternative names cover `expected`.
fn leaf_has_expected_san(leaf: &X509Certificate<'_>, expected: &str) -> Result<bool, AuthError> {
    let san = leaf.subject_alternative_name().map_err(|e| {
        AuthError::CertificateInvalid(format!("malformed subjectAltName extension: {e}"))
    })?;

    Ok(san
        .map(|ext| {
            ext.value.general_names.iter().any(|name| match name {
                GeneralName::DNSName(dns) => dns_name_matches(dns, expected),
                _ => false,
            })
        })
        .unwrap_or(false))
}

/// DNS name comparison: ASCII case-insensitive with support for a single
/// left-most wildcard label in the certificate name.
fn dns_name_matches(pattern: &str, expected: &str) -> bool {
    let pattern = pattern.to_ascii_lowercase();
    let expected = expected.to_ascii_lowercase();

    if let Some(suffix) = pattern.strip_prefix("*.") {
        match expected.split_once('.') {
            Some((label, rest)) => !label.is_empty() && rest == suffix,
            None => false,
        }
    } else {
        pattern == expected
    }
}

/// Extracts the leaf's RSA public key from its SPKI.
fn extract_rsa_public_key(leaf: &X509Certificate<'_>) -> Result<RsaPublicKey, AuthError> {
    let spki = leaf.public_key();

    if spki.algorithm.algorithm != OID_PKCS1_RSAENCRYPTION {
        return Err(AuthError::CertificateInvalid(format!(
            "unsupported public key algorithm {}",
            spki.algorithm.algorithm
        )));
    }

    RsaPublicKey::from_pkcs1_der(spki.subject_public_key.data.as_ref())
        .map_err(|e| AuthError::CertificateInvalid(format!("invalid RSA public key: {e}")))
}
