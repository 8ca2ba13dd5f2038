//! Events, state, and fatal conditions of the control loop.

use std::process::ExitStatus;

use axum::body::Bytes;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::agent::RunnerError;
use crate::lifecycle::ShutdownSignal;
use crate::manager::{SubscribeError, SubscriptionOutcome};
use crate::synth::SynthError;

/// Reply to every supervision probe.
pub const PROBE_REPLY: &str = "OK";

/// Inbound events from the notification endpoint.
#[derive(Debug)]
pub enum NotificationEvent {
    /// Liveness check; the loop answers on the channel.
    SupervisionProbe(oneshot::Sender<String>),
    /// Workload metrics definitions changed. Payload is opaque.
    XAppChangeNotification(Bytes),
    /// Platform metrics descriptor for the next regeneration.
    PlatformMeasurements(Bytes),
}

/// Sending half handed to the notification endpoint.
pub type EventSender = mpsc::Sender<NotificationEvent>;

/// Where the supervised agent is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisionState {
    /// Agent is (or should be) running under the current configuration.
    Normal,
    /// A kill was issued; waiting for the exit before starting the next generation.
    Terminating,
}

/// Everything the loop listens to besides the agent exit signal.
#[derive(Debug)]
pub struct EventSources {
    pub notifications: mpsc::Receiver<NotificationEvent>,
    pub subscription: Option<oneshot::Receiver<SubscriptionOutcome>>,
    pub shutdown: ShutdownSignal,
}

/// Conditions that end the controller. `main` maps all of them to exit status 1.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("agent exited unexpectedly: {0}")]
    AgentExited(ExitStatus),

    #[error("agent failed: {0}")]
    AgentFailed(#[source] RunnerError),

    #[error("agent termination could not be confirmed: {0}")]
    TerminationUnconfirmed(#[source] RunnerError),

    #[error("notification subscription failed: {0}")]
    Subscription(#[from] SubscribeError),

    #[error("subscription task ended without an outcome")]
    SubscriptionLost,

    #[error(transparent)]
    ConfigWrite(#[from] SynthError),

    #[error("notification endpoint closed its event channel")]
    EventsClosed,
}
