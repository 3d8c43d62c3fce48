//! HTTP server configuration and request routing.
//!
//! Assembles the skill's routes behind the verification middleware and
//! serves them with graceful shutdown. Requests flow through middleware in
//! order:
//! 1. Request ID generation
//! 2. Request/response logging
//! 3. Timeout enforcement (30s default)
//! 4. Request authentication (skill routes only)
//! 5. Handler execution
//!
//! Health endpoints are merged outside the authentication gate; probes
//! carry no platform signature.
//!
//! # Graceful Shutdown
//!
//! The server stops accepting connections on SIGINT/SIGTERM and waits for
//! in-flight requests before returning.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use skillgate_verify::RequestVerifier;

use crate::handlers;
use crate::middleware::verify::verify_request;

/// Creates the axum router gating `skill_routes` behind the verifier.
///
/// Every route the skill supplies is wrapped by the authentication
/// middleware; a request only reaches a skill handler after the full
/// pipeline accepted it, with the body bytes intact for re-reading.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use axum::{routing::post, Router};
/// use skillgate_api::create_router;
/// use skillgate_verify::RequestVerifier;
///
/// async fn handle_skill_request(_body: axum::body::Bytes) -> &'static str {
///     "{}"
/// }
///
/// let verifier = Arc::new(RequestVerifier::with_defaults().unwrap());
/// let skill_routes = Router::new().route("/", post(handle_skill_request));
/// let app = create_router(verifier, skill_routes);
/// ```
pub fn create_router(verifier: Arc<RequestVerifier>, skill_routes: Router) -> Router {
    let health_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/live", get(handlers::liveness_check));

    let gated_routes =
        skill_routes.layer(middleware::from_fn_with_state(verifier, verify_request));

    Router::new()
        .merge(health_routes)
        .merge(gated_routes)
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(inject_request_id))
}

/// Middleware to inject a request ID into all responses.
///
/// Adds an X-Request-Id header for tracing requests across services.
async fn inject_request_id(req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();

    let mut req = req;
    req.extensions_mut().insert(request_id.clone());

    let mut response = next.run(req).await;

    if let Ok(header_value) = request_id.parse() {
        response.headers_mut().insert("X-Request-Id", header_value);
    }

    response
}

/// Starts the HTTP server with graceful shutdown support.
///
/// Binds to the specified address and serves until a shutdown signal is
/// received.
///
/// # Errors
///
/// Returns `std::io::Error` when the port is already in use or the network
/// interface is unavailable.
pub async fn start_server(
    verifier: Arc<RequestVerifier>,
    skill_routes: Router,
    addr: SocketAddr,
) -> Result<(), std::io::Error> {
    let app = create_router(verifier, skill_routes);

    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("HTTP server listening on {}", actual_addr);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    info!("HTTP server stopped gracefully");
    Ok(())
}

/// Waits for shutdown signal (CTRL+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received CTRL+C, starting graceful shutdown");
        },
        () = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }

    warn!("Waiting for in-flight requests to complete");
}
