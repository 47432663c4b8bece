//! Read-only status API.
//!
//! # Routes
//! - `GET /healthz`: liveness, never authenticated
//! - `GET /status`: full snapshot of every alert
//! - `GET /status/alerts/{name}`: one alert, 404 when unknown
//!
//! The `/status` routes require `Authorization: Bearer <key>` when an API key is configured.

pub mod auth;
pub mod handlers;

use std::time::Duration;
use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::evaluator::StatusHandle;
use self::auth::{require_api_key, ApiKey};
use self::handlers::{get_alert, get_health, get_status};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the status router.
#[allow(deprecated)]
pub fn status_router(status: StatusHandle, api_key: Option<String>) -> Router {
    let mut protected = Router::new()
        .route("/status", get(get_status))
        .route("/status/alerts/{name}", get(get_alert));

    if let Some(key) = api_key {
        protected = protected.route_layer(middleware::from_fn_with_state(
            ApiKey::new(key),
            require_api_key,
        ));
    }

    Router::new()
        .route("/healthz", get(get_health))
        .merge(protected)
        .with_state(status)
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
}

/// Serve `router` until the shutdown signal fires.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Status API listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;

    tracing::info!("Status API stopped");
    Ok(())
}
