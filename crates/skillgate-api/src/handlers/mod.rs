//! HTTP handlers the SDK serves alongside the skill's own routes.
//!
//! Only operational endpoints live here; the skill's request handling is
//! supplied by the embedding application and gated by the verification
//! middleware.

pub mod health;

pub use health::{health_check, liveness_check};
