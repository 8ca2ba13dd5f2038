use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tokio::sync::oneshot;

use crate::control::NotificationEvent;
use crate::http::server::HttpState;

/// `GET /supervision/`: ask the control loop, relay its answer.
pub async fn probe(State(state): State<HttpState>) -> Response {
    let (tx, rx) = oneshot::channel();
    if state.events.send(NotificationEvent::SupervisionProbe(tx)).await.is_err() {
        return loop_gone();
    }
    match rx.await {
        Ok(reply) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            reply,
        )
            .into_response(),
        Err(_) => loop_gone(),
    }
}

/// `POST <notification_path>`: payload is opaque, forwarded as-is.
pub async fn notify(State(state): State<HttpState>, body: Bytes) -> Response {
    tracing::debug!(bytes = body.len(), "Change notification received");
    forward(&state, NotificationEvent::XAppChangeNotification(body)).await
}

/// `POST /ric/v1/measurements`
pub async fn measurements(State(state): State<HttpState>, body: Bytes) -> Response {
    tracing::debug!(bytes = body.len(), "Platform measurements received");
    forward(&state, NotificationEvent::PlatformMeasurements(body)).await
}

/// `GET /ric/v1/symptomdata`: the agent configuration as last written.
pub async fn symptomdata(State(state): State<HttpState>) -> Response {
    match tokio::fs::read(&state.config_file).await {
        Ok(content) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/yaml")],
            content,
        )
            .into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            (StatusCode::NOT_FOUND, "Agent configuration not written yet").into_response()
        }
        Err(e) => {
            tracing::error!(path = %state.config_file.display(), error = %e, "Cannot read agent configuration");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn forward(state: &HttpState, event: NotificationEvent) -> Response {
    match state.events.send(event).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(_) => loop_gone(),
    }
}

fn loop_gone() -> Response {
    tracing::warn!("Control loop is gone, rejecting request");
    (StatusCode::SERVICE_UNAVAILABLE, "Control loop stopped").into_response()
}
