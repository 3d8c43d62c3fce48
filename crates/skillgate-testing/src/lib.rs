//! Test infrastructure for deterministic authentication testing.
//!
//! Provides a controllable clock, generated X.509 signing fixtures, and
//! request envelope builders. Certificate material is always generated at
//! test time; embedded PEM constants could never stay cryptographically
//! consistent with the signatures the tests produce.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod certs;
pub mod envelope;
pub mod time;

pub use certs::SigningFixture;
pub use envelope::EnvelopeBuilder;
pub use time::TestClock;
