//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the axum Router with the notification, probe and platform routes
//! - Wire up middleware (tracing, body limit)
//! - Serve until shutdown is requested

use std::path::PathBuf;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::config::ListenerConfig;
use crate::control::EventSender;
use crate::http::handlers::{measurements, notify, probe, symptomdata};
use crate::http::{MEASUREMENTS_PATH, SUPERVISION_PATH, SYMPTOMDATA_PATH};
use crate::lifecycle::ShutdownSignal;

/// Application state injected into handlers.
#[derive(Debug, Clone)]
pub struct HttpState {
    pub events: EventSender,
    /// Realized agent configuration file served by symptomdata.
    pub config_file: PathBuf,
}

/// Build the router with all middleware layers.
pub fn build_router(config: &ListenerConfig, state: HttpState) -> Router {
    Router::new()
        .route(&config.notification_path, post(notify))
        .route(SUPERVISION_PATH, get(probe))
        .route(MEASUREMENTS_PATH, post(measurements))
        .route(SYMPTOMDATA_PATH, get(symptomdata))
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(TraceLayer::new_for_http())
}

/// HTTP server delivering inbound requests into the control loop.
pub struct NotificationServer {
    router: Router,
}

impl NotificationServer {
    pub fn new(config: &ListenerConfig, state: HttpState) -> Self {
        Self {
            router: build_router(config, state),
        }
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.triggered().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
