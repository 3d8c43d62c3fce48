//! HTTP middleware for request authentication.
//!
//! Provides the verification middleware that gates every skill route behind
//! the authentication pipeline.

pub mod verify;
