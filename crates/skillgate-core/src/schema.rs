//! Inbound request envelope schema.
//!
//! Models the JSON the voice platform POSTs to a skill endpoint: an envelope
//! with session and device context around one of three request variants,
//! dispatched by the wire-level `type` tag. The verification pipeline only
//! needs two fields from this document (the request timestamp and the
//! application id), so lightweight probes are provided that read those
//! without requiring the full schema to parse.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Top-level envelope for every inbound request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    /// Version specifier, currently always `"1.0"`.
    pub version: String,
    /// Session context. Present for session-bound request types, absent for
    /// out-of-session interfaces.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<Session>,
    /// Platform and device state at the time the request was sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,
    /// The request payload, dispatched on the `type` tag.
    pub request: RequestBody,
}

impl RequestEnvelope {
    /// Parses an envelope from raw body bytes.
    pub fn from_slice(body: &[u8]) -> Result<Self, AuthError> {
        serde_json::from_slice(body).map_err(|e| AuthError::MalformedBody(e.to_string()))
    }

    /// Returns the application id the request was addressed to, if present.
    ///
    /// The session carries it for session-bound requests; out-of-session
    /// requests only carry it in the context's system object.
    pub fn application_id(&self) -> Option<&str> {
        self.session
            .as_ref()
            .and_then(|s| s.application.as_ref())
            .or_else(|| {
                self.context
                    .as_ref()
                    .and_then(|c| c.system.as_ref())
                    .and_then(|s| s.application.as_ref())
            })
            .map(|a| a.id.as_str())
    }
}

/// Request payload variants, dispatched on the wire-level `type` tag.
///
/// Every variant carries the common request detail (id, timestamp, locale);
/// matching is exhaustive so a new platform request type is a compile error
/// at every dispatch site rather than a silently ignored branch.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum RequestBody {
    /// The user opened the skill without stating a specific intent.
    LaunchRequest {
        /// Common request detail.
        #[serde(flatten)]
        detail: RequestDetail,
    },
    /// The user stated an intent, possibly with slot values.
    IntentRequest {
        /// Common request detail.
        #[serde(flatten)]
        detail: RequestDetail,
        /// The resolved intent and its slots.
        intent: Intent,
        /// Dialog progress for multi-turn intents.
        #[serde(default, rename = "dialogState", skip_serializing_if = "Option::is_none")]
        dialog_state: Option<String>,
    },
    /// The session ended without the skill returning a response.
    SessionEndedRequest {
        /// Common request detail.
        #[serde(flatten)]
        detail: RequestDetail,
        /// Why the platform ended the session.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<SessionEndedReason>,
    },
}

impl RequestBody {
    /// Returns the common detail shared by every request variant.
    pub fn detail(&self) -> &RequestDetail {
        match self {
            Self::LaunchRequest { detail }
            | Self::IntentRequest { detail, .. }
            | Self::SessionEndedRequest { detail, .. } => detail,
        }
    }

    /// Returns the moment the platform sent the request.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.detail().timestamp
    }
}

/// Fields common to every request variant.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetail {
    /// Unique identifier for this specific request.
    pub request_id: String,
    /// When the platform sent the request, as an ISO-8601 instant.
    pub timestamp: DateTime<Utc>,
    /// The user's locale, e.g. `en-US`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

/// The resolved intent of an `IntentRequest`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    /// Intent name as declared in the interaction model.
    pub name: String,
    /// Slot values captured from the utterance, keyed by slot name.
    #[serde(default)]
    pub slots: HashMap<String, Slot>,
}

/// A single captured slot value.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    /// Slot name.
    pub name: String,
    /// Raw value spoken by the user, absent when the slot went unfilled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Why the platform ended a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionEndedReason {
    /// The user explicitly exited the skill.
    UserInitiated,
    /// The skill returned an invalid response.
    Error,
    /// The user did not respond within the reprompt limit.
    ExceededMaxReprompts,
}

/// Session context for session-bound request types.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// True on the first request of a session.
    pub new: bool,
    /// Stable identifier for the user's active session.
    #[serde(rename = "sessionId")]
    pub id: String,
    /// Key-value attributes the skill asked to persist across turns.
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
    /// The skill the request was addressed to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<Application>,
    /// The user making the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

/// Identifies the skill a request is addressed to.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Application {
    /// The skill's application id from the developer console.
    #[serde(rename = "applicationId")]
    pub id: String,
}

/// The user making a request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Opaque user identifier, generated when the user enables the skill.
    #[serde(rename = "userId")]
    pub id: String,
    /// Account-linking token, present only after a successful link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

/// Platform and device state accompanying every request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    /// Service-level state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<System>,
}

/// Service-level state inside the request context.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct System {
    /// The skill the request was addressed to (duplicated from the session
    /// for session-bound requests).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<Application>,
    /// The user making the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    /// Regional base URI for platform API calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_endpoint: Option<String>,
}

/// Minimal probe for the request timestamp.
#[derive(Debug, Deserialize)]
struct TimestampEnvelope {
    request: TimestampDetail,
}

#[derive(Debug, Deserialize)]
struct TimestampDetail {
    timestamp: DateTime<Utc>,
}

/// Extracts the declared request timestamp from raw body bytes.
///
/// Deserializes only the one nested field the freshness check needs, so a
/// request with unknown or future schema elements still yields a timestamp.
///
/// # Errors
///
/// Returns `AuthError::MalformedBody` when the body is not JSON or carries
/// no parseable `request.timestamp` field.
pub fn extract_timestamp(body: &[u8]) -> Result<DateTime<Utc>, AuthError> {
    let probe: TimestampEnvelope =
        serde_json::from_slice(body).map_err(|e| AuthError::MalformedBody(e.to_string()))?;
    Ok(probe.request.timestamp)
}

/// Extracts the application id from raw body bytes, if one is present.
///
/// Lenient by design: a body that fails to parse yields `None`, leaving the
/// caller to decide whether an absent id is acceptable.
pub fn extract_application_id(body: &[u8]) -> Option<String> {
    let envelope = RequestEnvelope::from_slice(body).ok()?;
    envelope.application_id().map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn launch_body(timestamp: &str) -> String {
        format!(
            r#"{{
                "version": "1.0",
                "session": {{
                    "new": true,
                    "sessionId": "session-0001",
                    "application": {{"applicationId": "app-123"}},
                    "user": {{"userId": "user-456"}}
                }},
                "request": {{
                    "type": "LaunchRequest",
                    "requestId": "req-0001",
                    "timestamp": "{timestamp}",
                    "locale": "en-US"
                }}
            }}"#
        )
    }

    #[test]
    fn launch_request_round_trips_through_tag() {
        let envelope = RequestEnvelope::from_slice(launch_body("2024-05-14T12:00:00Z").as_bytes())
            .expect("valid launch request");

        assert_eq!(envelope.version, "1.0");
        match &envelope.request {
            RequestBody::LaunchRequest { detail } => {
                assert_eq!(detail.request_id, "req-0001");
                assert_eq!(detail.locale.as_deref(), Some("en-US"));
            },
            other => panic!("expected LaunchRequest, got {other:?}"),
        }
    }

    #[test]
    fn intent_request_carries_intent_and_slots() {
        let body = r#"{
            "version": "1.0",
            "request": {
                "type": "IntentRequest",
                "requestId": "req-0002",
                "timestamp": "2024-05-14T12:00:00Z",
                "dialogState": "COMPLETED",
                "intent": {
                    "name": "RollDice",
                    "slots": {"Sides": {"name": "Sides", "value": "20"}}
                }
            }
        }"#;

        let envelope = RequestEnvelope::from_slice(body.as_bytes()).expect("valid intent request");
        match &envelope.request {
            RequestBody::IntentRequest { intent, dialog_state, .. } => {
                assert_eq!(intent.name, "RollDice");
                assert_eq!(intent.slots["Sides"].value.as_deref(), Some("20"));
                assert_eq!(dialog_state.as_deref(), Some("COMPLETED"));
            },
            other => panic!("expected IntentRequest, got {other:?}"),
        }
    }

    #[test]
    fn session_ended_request_parses_reason() {
        let body = r#"{
            "version": "1.0",
            "request": {
                "type": "SessionEndedRequest",
                "requestId": "req-0003",
                "timestamp": "2024-05-14T12:00:00Z",
                "reason": "USER_INITIATED"
            }
        }"#;

        let envelope = RequestEnvelope::from_slice(body.as_bytes()).expect("valid request");
        match &envelope.request {
            RequestBody::SessionEndedRequest { reason, .. } => {
                assert_eq!(*reason, Some(SessionEndedReason::UserInitiated));
            },
            other => panic!("expected SessionEndedRequest, got {other:?}"),
        }
    }

    #[test]
    fn unknown_request_type_is_rejected() {
        let body = r#"{
            "version": "1.0",
            "request": {
                "type": "TeleportRequest",
                "requestId": "req-0004",
                "timestamp": "2024-05-14T12:00:00Z"
            }
        }"#;

        assert!(RequestEnvelope::from_slice(body.as_bytes()).is_err());
    }

    #[test]
    fn timestamp_probe_ignores_unknown_schema() {
        let body = r#"{
            "version": "7.0",
            "unknownTopLevel": {"deeply": ["nested"]},
            "request": {
                "type": "SomethingNotYetInvented",
                "timestamp": "2024-05-14T12:00:00Z",
                "extraField": 42
            }
        }"#;

        let ts = extract_timestamp(body.as_bytes()).expect("probe tolerates unknown fields");
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 5, 14, 12, 0, 0).unwrap());
    }

    #[test]
    fn timestamp_probe_rejects_garbage() {
        assert!(matches!(
            extract_timestamp(b"not json at all"),
            Err(AuthError::MalformedBody(_))
        ));
        assert!(matches!(
            extract_timestamp(br#"{"request": {}}"#),
            Err(AuthError::MalformedBody(_))
        ));
        assert!(matches!(
            extract_timestamp(br#"{"request": {"timestamp": "yesterday-ish"}}"#),
            Err(AuthError::MalformedBody(_))
        ));
    }

    #[test]
    fn application_id_prefers_session_over_context() {
        let body = r#"{
            "version": "1.0",
            "session": {
                "new": false,
                "sessionId": "s",
                "application": {"applicationId": "from-session"}
            },
            "context": {
                "system": {"application": {"applicationId": "from-context"}}
            },
            "request": {
                "type": "LaunchRequest",
                "requestId": "r",
                "timestamp": "2024-05-14T12:00:00Z"
            }
        }"#;

        assert_eq!(extract_application_id(body.as_bytes()).as_deref(), Some("from-session"));
    }

    #[test]
    fn application_id_falls_back_to_context_system() {
        let body = r#"{
            "version": "1.0",
            "context": {
                "system": {"application": {"applicationId": "from-context"}}
            },
            "request": {
                "type": "LaunchRequest",
                "requestId": "r",
                "timestamp": "2024-05-14T12:00:00Z"
            }
        }"#;

        assert_eq!(extract_application_id(body.as_bytes()).as_deref(), Some("from-context"));
        assert_eq!(extract_application_id(b"{}"), None);
    }
}
