//! Generated X.509 signing fixtures.
//!
//! Builds a test CA plus an RSA leaf certificate carrying a chosen subject
//! alternative name, and signs request bodies the way the platform does:
//! RSA PKCS#1 v1.5 over the SHA-1 digest of the exact body bytes.

use anyhow::Context as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair};
use rsa::pkcs8::EncodePrivateKey;
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use sha1::{Digest, Sha1};

/// A complete signing setup: CA, RSA leaf certificate, and the leaf's
/// private key for producing request signatures.
pub struct SigningFixture {
    leaf_key: RsaPrivateKey,
    leaf_pem: String,
    ca_pem: String,
    ca_der: Vec<u8>,
}

impl SigningFixture {
    /// Generates a CA-signed leaf certificate carrying `san` among its
    /// subject alternative names, valid from 1975 through 4096 (the
    /// generator's defaults), so any plausible test clock falls inside the
    /// window.
    pub fn generate(san: &str) -> anyhow::Result<Self> {
        Self::build(san, None)
    }

    /// Generates a chain whose leaf expired long before any plausible test
    /// clock.
    pub fn generate_expired(san: &str) -> anyhow::Result<Self> {
        Self::build(san, Some((rcgen::date_time_ymd(2000, 1, 1), rcgen::date_time_ymd(2001, 1, 1))))
    }

    fn build(
        san: &str,
        validity: Option<(time::OffsetDateTime, time::OffsetDateTime)>,
    ) -> anyhow::Result<Self> {
        let ca_key = KeyPair::generate().context("CA key generation")?;
        let mut ca_params =
            CertificateParams::new(Vec::new()).context("CA certificate parameters")?;
        ca_params.distinguished_name.push(DnType::CommonName, "Skillgate Test Root CA");
        ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        let ca_cert = ca_params.self_signed(&ca_key).context("CA self-signing")?;

        let leaf_key = RsaPrivateKey::new(&mut rand::thread_rng(), 2048)
            .context("leaf RSA key generation")?;
        let leaf_pkcs8 =
            leaf_key.to_pkcs8_pem(rsa::pkcs8::LineEnding::LF).context("leaf key encoding")?;
        let rcgen_leaf_key =
            KeyPair::from_pem_and_sign_algo(leaf_pkcs8.as_str(), &rcgen::PKCS_RSA_SHA256)
                .context("leaf key import")?;

        let mut leaf_params =
            CertificateParams::new(vec![san.to_string()]).context("leaf parameters")?;
        leaf_params.distinguished_name.push(DnType::CommonName, san);
        if let Some((not_before, not_after)) = validity {
            leaf_params.not_before = not_before;
            leaf_params.not_after = not_after;
        }
        let leaf_cert = leaf_params
            .signed_by(&rcgen_leaf_key, &ca_cert, &ca_key)
            .context("leaf signing")?;

        Ok(Self {
            leaf_key,
            leaf_pem: leaf_cert.pem(),
            ca_pem: ca_cert.pem(),
            ca_der: ca_cert.der().as_ref().to_vec(),
        })
    }

    /// Generates a single self-signed RSA certificate carrying `san`; its
    /// own DER doubles as the trust anchor.
    pub fn generate_self_signed(san: &str) -> anyhow::Result<Self> {
        let leaf_key = RsaPrivateKey::new(&mut rand::thread_rng(), 2048)
            .context("leaf RSA key generation")?;
        let leaf_pkcs8 =
            leaf_key.to_pkcs8_pem(rsa::pkcs8::LineEnding::LF).context("leaf key encoding")?;
        let rcgen_leaf_key =
            KeyPair::from_pem_and_sign_algo(leaf_pkcs8.as_str(), &rcgen::PKCS_RSA_SHA256)
                .context("leaf key import")?;

        let mut leaf_params =
            CertificateParams::new(vec![san.to_string()]).context("leaf parameters")?;
        leaf_params.distinguished_name.push(DnType::CommonName, san);
        let leaf_cert = leaf_params.self_signed(&rcgen_leaf_key).context("leaf self-signing")?;

        Ok(Self {
            leaf_key,
            leaf_pem: leaf_cert.pem(),
            ca_pem: leaf_cert.pem(),
            ca_der: leaf_cert.der().as_ref().to_vec(),
        })
    }

    /// The full chain as concatenated PEM, leaf first.
    pub fn chain_pem(&self) -> String {
        if self.leaf_pem == self.ca_pem {
            self.leaf_pem.clone()
        } else {
            format!("{}{}", self.leaf_pem, self.ca_pem)
        }
    }

    /// The leaf certificate alone as PEM.
    pub fn leaf_pem(&self) -> &str {
        &self.leaf_pem
    }

    /// The CA certificate alone as PEM.
    pub fn ca_pem(&self) -> &str {
        &self.ca_pem
    }

    /// The CA certificate in DER form, for use as a trust anchor.
    pub fn ca_der(&self) -> Vec<u8> {
        self.ca_der.clone()
    }

    /// Signs `body` the way the platform does: base64 of the RSA PKCS#1
    /// v1.5 signature over the body's SHA-1 digest.
    pub fn sign_body(&self, body: &[u8]) -> String {
        let digest = Sha1::digest(body);
        let signature = self
            .leaf_key
            .sign(Pkcs1v15Sign::new::<Sha1>(), &digest)
            .expect("signing with a freshly generated key cannot fail");
        BASE64.encode(signature)
    }
}

/// Generates a self-signed ECDSA certificate as PEM.
///
/// Useful as a negative fixture: the platform only ever signs with RSA, so
/// verifiers must reject a chain whose leaf key is not RSA.
pub fn ecdsa_self_signed_pem(san: &str) -> anyhow::Result<String> {
    let rcgen::CertifiedKey { cert, .. } =
        rcgen::generate_simple_self_signed(vec![san.to_string()])
            .context("ECDSA certificate generation")?;
    Ok(cert.pem())
}
