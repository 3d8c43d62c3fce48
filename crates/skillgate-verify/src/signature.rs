//! Request body signature verification.
//!
//! The platform signs the SHA-1 digest of the exact HTTPS request body with
//! the RSA key of its signing certificate and sends the result base64-encoded
//! in the `Signature` header. This check is what proves body integrity and
//! authenticity; everything before it only establishes that the certificate
//! is plausible.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha1::{Digest, Sha1};

use skillgate_core::AuthError;

/// Verifies the base64 signature header against the raw body bytes.
///
/// Decodes the header, hashes the body with SHA-1 (the digest the platform
/// specifies), and verifies the PKCS#1 v1.5 signature with the public key
/// extracted from the verified leaf certificate.
///
/// # Errors
///
/// Returns `AuthError::SignatureInvalid` on malformed base64 or when the
/// cryptographic verification fails. The two cases are deliberately not
/// distinguished in the error value; logs carry no more than the code.
pub fn verify_body_signature(
    body: &[u8],
    signature_b64: &str,
    public_key: &RsaPublicKey,
) -> Result<(), AuthError> {
    let signature =
        BASE64.decode(signature_b64.trim()).map_err(|_| AuthError::SignatureInvalid)?;

    let digest = Sha1::digest(body);

    public_key
        .verify(Pkcs1v15Sign::new::<Sha1>(), &digest, &signature)
        .map_err(|_| AuthError::SignatureInvalid)
}
