//! Skillgate HTTP boundary.
//!
//! Wraps a skill's axum routes behind the request authentication middleware
//! and provides server setup with graceful shutdown, health endpoints, and
//! figment-layered configuration.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod server;

pub use config::Config;
pub use middleware::verify::{verify_request, VerificationRejection};
pub use server::{create_router, start_server};

/// Initializes tracing with environment-based filtering.
///
/// Reads `RUST_LOG` when set, defaulting to info globally with debug detail
/// for the SDK's own crates. Call once at process start from the binary
/// embedding the SDK.
///
/// # Panics
///
/// Panics when `RUST_LOG` contains an invalid filter directive or when a
/// global subscriber is already installed.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,skillgate=debug,tower_http=debug"))
        .expect("Invalid RUST_LOG environment variable");

    let fmt_layer = fmt::layer().with_target(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}
