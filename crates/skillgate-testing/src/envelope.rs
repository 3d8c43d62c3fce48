//! Request envelope JSON builders.
//!
//! Produces wire-shaped request bodies with controllable timestamps and
//! application ids, so authentication tests can sign exactly the bytes a
//! real platform request would carry.

use chrono::{DateTime, SecondsFormat, Utc};

/// Builder for inbound request JSON bodies.
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    request_type: &'static str,
    timestamp: DateTime<Utc>,
    request_id: String,
    locale: String,
    application_id: Option<String>,
    intent_name: Option<String>,
}

impl EnvelopeBuilder {
    /// Starts a `LaunchRequest` body sent at `timestamp`.
    pub fn launch(timestamp: DateTime<Utc>) -> Self {
        Self {
            request_type: "LaunchRequest",
            timestamp,
            request_id: "req-0001".to_string(),
            locale: "en-US".to_string(),
            application_id: None,
            intent_name: None,
        }
    }

    /// Starts an `IntentRequest` body for `intent` sent at `timestamp`.
    pub fn intent(timestamp: DateTime<Utc>, intent: &str) -> Self {
        Self {
            request_type: "IntentRequest",
            intent_name: Some(intent.to_string()),
            ..Self::launch(timestamp)
        }
    }

    /// Starts a `SessionEndedRequest` body sent at `timestamp`.
    pub fn session_ended(timestamp: DateTime<Utc>) -> Self {
        Self { request_type: "SessionEndedRequest", ..Self::launch(timestamp) }
    }

    /// Overrides the request id.
    pub fn request_id(mut self, id: &str) -> Self {
        self.request_id = id.to_string();
        self
    }

    /// Sets the application id carried in the session.
    pub fn application_id(mut self, id: &str) -> Self {
        self.application_id = Some(id.to_string());
        self
    }

    /// Renders the body as compact JSON bytes.
    pub fn build(&self) -> Vec<u8> {
        let mut request = serde_json::json!({
            "type": self.request_type,
            "requestId": self.request_id,
            "timestamp": self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            "locale": self.locale,
        });
        if let Some(intent) = &self.intent_name {
            request["intent"] = serde_json::json!({ "name": intent, "slots": {} });
        }
        if self.request_type == "SessionEndedRequest" {
            request["reason"] = serde_json::json!("USER_INITIATED");
        }

        let mut session = serde_json::json!({
            "new": true,
            "sessionId": "session-0001",
        });
        if let Some(app_id) = &self.application_id {
            session["application"] = serde_json::json!({ "applicationId": app_id });
        }

        serde_json::json!({
            "version": "1.0",
            "session": session,
            "request": request,
        })
        .to_string()
        .into_bytes()
    }
}
