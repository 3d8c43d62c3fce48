//! Core domain types for the skillgate voice-skill SDK.
//!
//! Provides the authentication error taxonomy, the inbound request envelope
//! schema, and the clock abstraction. The verification and HTTP crates build
//! on these foundational types.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod schema;
pub mod time;

pub use error::{AuthError, Result};
pub use schema::{
    extract_application_id, extract_timestamp, Application, Intent, RequestBody, RequestDetail,
    RequestEnvelope, Session, SessionEndedReason,
};
pub use time::{Clock, SystemClock};
