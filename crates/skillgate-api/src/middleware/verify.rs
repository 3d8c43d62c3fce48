//! Request verification middleware.
//!
//! Buffers the inbound body, runs the authentication pipeline over the raw
//! bytes and the two signature headers, and on success replays the identical
//! bytes to the downstream skill handler. The body is read once for
//! verification and must reach the handler intact; this is buffering
//! discipline, not streaming.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::warn;

use skillgate_core::AuthError;
use skillgate_verify::RequestVerifier;

/// Header carrying the URL of the signing certificate chain.
pub const CERT_CHAIN_URL_HEADER: &str = "SignatureCertChainUrl";

/// Header carrying the base64 request signature.
pub const SIGNATURE_HEADER: &str = "Signature";

/// Upper bound on a buffered request body. Platform requests are small JSON
/// documents; anything near this size is not a skill request.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Error response with code and message.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

/// Detailed error information.
#[derive(Debug, Serialize)]
struct ErrorDetail {
    /// Error code from the taxonomy (A1001-A2001).
    code: String,
    /// Terse category message; validation internals stay in the logs.
    message: String,
}

/// Rejection produced by the verification middleware.
///
/// Newtype over [`AuthError`] so this crate can map it onto an HTTP
/// response: 400 for request-attributable failures, 500 for infrastructure
/// failures. The response body carries only the code and a terse category;
/// the full reason is logged.
#[derive(Debug)]
pub struct VerificationRejection(AuthError);

impl From<AuthError> for VerificationRejection {
    fn from(err: AuthError) -> Self {
        Self(err)
    }
}

impl VerificationRejection {
    /// The underlying authentication error.
    pub fn auth_error(&self) -> &AuthError {
        &self.0
    }

    fn public_message(&self) -> &'static str {
        match &self.0 {
            AuthError::StaleTimestamp { .. } => "timestamp not recent",
            AuthError::InvalidCertificateUrl { .. } => "invalid certificate chain url",
            AuthError::MalformedBody(_) => "malformed request body",
            AuthError::CertificateInvalid(_) => "invalid certificate",
            AuthError::SignatureInvalid => "invalid signature",
            AuthError::ApplicationMismatch => "request not intended for this skill",
            AuthError::CertificateFetchFailed(_) => "certificate retrieval failed",
        }
    }
}

impl IntoResponse for VerificationRejection {
    fn into_response(self) -> Response {
        warn!(code = self.0.code(), error = %self.0, "request verification failed");

        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.0.code().to_string(),
                message: self.public_message().to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Extracts a header value as a string slice.
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Axum middleware that authenticates platform requests.
///
/// Every request passing this layer reaches the downstream handler only
/// after the full verification pipeline accepted it, with the original body
/// bytes restored for re-reading.
pub async fn verify_request(
    State(verifier): State<Arc<RequestVerifier>>,
    request: Request,
    next: Next,
) -> Result<Response, VerificationRejection> {
    let (parts, body) = request.into_parts();

    let bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| AuthError::MalformedBody(format!("failed to buffer body: {e}")))?;

    let certificate_url = header_str(&parts.headers, CERT_CHAIN_URL_HEADER);
    let signature = header_str(&parts.headers, SIGNATURE_HEADER);

    verifier.verify(certificate_url, signature, &bytes).await?;

    let request = Request::from_parts(parts, Body::from(bytes));
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use chrono::Utc;

    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "signaturecertchainurl",
            HeaderValue::from_static("https://s3.amazonaws.com/echo-api/cert.pem"),
        );
        headers.insert("signature", HeaderValue::from_static("c2lnbmF0dXJl"));

        assert_eq!(
            header_str(&headers, CERT_CHAIN_URL_HEADER),
            Some("https://s3.amazonaws.com/echo-api/cert.pem")
        );
        assert_eq!(header_str(&headers, SIGNATURE_HEADER), Some("c2lnbmF0dXJl"));
        assert_eq!(header_str(&headers, "Missing-Header"), None);
    }

    #[test]
    fn client_failures_map_to_bad_request() {
        let rejection =
            VerificationRejection::from(AuthError::StaleTimestamp { timestamp: Utc::now() });
        assert_eq!(rejection.into_response().status(), StatusCode::BAD_REQUEST);

        let rejection = VerificationRejection::from(AuthError::SignatureInvalid);
        assert_eq!(rejection.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn infrastructure_failures_map_to_internal_error() {
        let rejection =
            VerificationRejection::from(AuthError::CertificateFetchFailed("refused".into()));
        assert_eq!(rejection.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn public_messages_do_not_leak_internals() {
        let rejection = VerificationRejection::from(AuthError::CertificateInvalid(
            "certificate at depth 1 is not signed by its issuer".into(),
        ));

        assert_eq!(rejection.public_message(), "invalid certificate");
    }
}
