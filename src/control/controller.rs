//! The supervision and reconfiguration loop.
//!
//! # State Transitions
//! ```text
//! Normal      + SupervisionProbe        → reply "OK"                      → Normal
//! Normal      + XAppChangeNotification  → fetch; ok: kill, hold descriptor → Terminating
//!                                         fetch failed: log               → Normal
//! Terminating + AgentExit(exited)       → regenerate from held descriptor,
//!                                         start next generation           → Normal
//! Terminating + AgentExit(failed)       → fatal
//! Normal      + AgentExit(any)          → fatal (unplanned)
//! any         + SubscriptionOutcome(err)→ fatal
//! Terminating + SupervisionProbe        → reply "OK"                      → Terminating
//! ```
//!
//! Events are taken one at a time; nothing is handled while another event is
//! mid-flight. A start only ever follows a consumed exit signal.
//!
//! Each source is drained in its own arrival order. When several sources are
//! ready at once the order is fixed: agent exit, subscription outcome,
//! notifications, shutdown. An exit that is already pending is therefore
//! never overtaken by a notification that would act on the dead agent.

use std::time::Duration;

use axum::body::Bytes;
use tokio::sync::oneshot;

use crate::agent::{AgentRunner, ExitReport, ExitSignal, KillError, RunnerError};
use crate::control::events::{
    ControllerError, EventSources, NotificationEvent, SupervisionState, PROBE_REPLY,
};
use crate::manager::{DescriptorSource, SubscriptionOutcome};
use crate::observability::metrics;
use crate::synth::ConfigWriter;

/// How long shutdown waits for the agent to exit after the kill.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Owns the agent and every piece of supervision state.
pub struct Controller<R, S> {
    runner: R,
    source: S,
    writer: ConfigWriter,
    state: SupervisionState,
    /// Descriptor that triggered the current termination.
    pending: Option<Bytes>,
    platform: Option<Bytes>,
    /// A change arrived while terminating; handle it once the next generation runs.
    deferred_change: bool,
    fetch_on_subscribe: bool,
    subscription_id: Option<String>,
}

impl<R, S> Controller<R, S>
where
    R: AgentRunner,
    S: DescriptorSource,
{
    pub fn new(runner: R, source: S, writer: ConfigWriter) -> Self {
        Self {
            runner,
            source,
            writer,
            state: SupervisionState::Normal,
            pending: None,
            platform: None,
            deferred_change: false,
            fetch_on_subscribe: false,
            subscription_id: None,
        }
    }

    /// Fetch descriptors and reconfigure once the subscription succeeds.
    pub fn fetch_on_subscribe(mut self, enabled: bool) -> Self {
        self.fetch_on_subscribe = enabled;
        self
    }

    pub fn state(&self) -> SupervisionState {
        self.state
    }

    pub fn subscription_id(&self) -> Option<&str> {
        self.subscription_id.as_deref()
    }

    /// Write the initial configuration, start the first generation, and
    /// dispatch events until shutdown (`Ok`) or a fatal condition (`Err`).
    pub async fn run(mut self, sources: EventSources) -> Result<(), ControllerError> {
        let EventSources {
            mut notifications,
            mut subscription,
            mut shutdown,
        } = sources;

        let mut exit = self.start_generation(None)?;
        tracing::info!("Control loop ready");

        loop {
            tokio::select! {
                biased;

                report = &mut exit => {
                    let report = report
                        .unwrap_or(ExitReport::Failed(RunnerError::WatcherLost));
                    exit = self.handle_exit(report).await?;
                }
                outcome = next_outcome(&mut subscription), if subscription.is_some() => {
                    subscription = None;
                    self.handle_subscription(outcome).await?;
                }
                event = notifications.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => return Err(ControllerError::EventsClosed),
                },
                _ = shutdown.triggered() => {
                    return self.shutdown(exit).await;
                }
            }
        }
    }

    async fn handle_event(&mut self, event: NotificationEvent) {
        match event {
            NotificationEvent::SupervisionProbe(reply) => {
                tracing::debug!(state = ?self.state, "Supervision probe");
                metrics::record_probe();
                let _ = reply.send(PROBE_REPLY.to_string());
            }
            NotificationEvent::XAppChangeNotification(payload) => {
                tracing::info!(bytes = payload.len(), state = ?self.state, "Change notification");
                metrics::record_notification();
                match self.state {
                    SupervisionState::Normal => self.reconfigure().await,
                    SupervisionState::Terminating => {
                        tracing::info!("Restart in progress, change deferred until the next generation runs");
                        self.deferred_change = true;
                    }
                }
            }
            NotificationEvent::PlatformMeasurements(payload) => {
                tracing::info!(bytes = payload.len(), "Platform measurements stored for next regeneration");
                self.platform = Some(payload);
            }
        }
    }

    /// Fetch the current descriptor and, if that worked, kill the agent.
    /// A failed fetch leaves the running agent untouched.
    async fn reconfigure(&mut self) {
        let descriptor = match self.source.fetch().await {
            Ok(descriptor) => descriptor,
            Err(e) => {
                tracing::warn!(error = %e, "Keeping current agent configuration");
                return;
            }
        };

        match self.runner.kill().await {
            Ok(()) => {
                self.pending = Some(descriptor);
                self.state = SupervisionState::Terminating;
                tracing::info!("Agent terminating for reconfiguration");
            }
            Err(KillError::NoProcess) => {
                // Its exit report is already on the way and will be handled as unplanned.
                tracing::warn!("No running agent to reconfigure");
            }
            Err(e) => {
                tracing::error!(error = %e, "Cannot terminate agent, keeping current configuration");
            }
        }
    }

    async fn handle_exit(&mut self, report: ExitReport) -> Result<ExitSignal, ControllerError> {
        match (self.state, report) {
            (SupervisionState::Terminating, ExitReport::Exited(status)) => {
                tracing::info!(status = %status, "Agent termination completed");
                let descriptor = self.pending.take();
                let exit = self.start_generation(descriptor.as_deref())?;
                self.state = SupervisionState::Normal;
                metrics::record_reconfiguration();

                if std::mem::take(&mut self.deferred_change) {
                    tracing::info!("Applying change deferred during restart");
                    self.reconfigure().await;
                }
                Ok(exit)
            }
            (SupervisionState::Terminating, ExitReport::Failed(e)) => {
                tracing::error!(error = %e, "Agent termination failed, exiting");
                Err(ControllerError::TerminationUnconfirmed(e))
            }
            (SupervisionState::Normal, ExitReport::Exited(status)) => {
                tracing::error!(status = %status, "Agent exited, exiting");
                Err(ControllerError::AgentExited(status))
            }
            (SupervisionState::Normal, ExitReport::Failed(e)) => {
                tracing::error!(error = %e, "Agent failed, exiting");
                Err(ControllerError::AgentFailed(e))
            }
        }
    }

    async fn handle_subscription(
        &mut self,
        outcome: Option<SubscriptionOutcome>,
    ) -> Result<(), ControllerError> {
        match outcome {
            Some(Ok(id)) => {
                tracing::info!(id = %id, "Notification subscription active");
                self.subscription_id = Some(id);
                if self.fetch_on_subscribe {
                    match self.state {
                        SupervisionState::Normal => self.reconfigure().await,
                        SupervisionState::Terminating => self.deferred_change = true,
                    }
                }
                Ok(())
            }
            Some(Err(e)) => {
                tracing::error!(error = %e, "Failed to subscribe for notifications, exiting");
                Err(e.into())
            }
            None => Err(ControllerError::SubscriptionLost),
        }
    }

    /// Regenerate the configuration file, then launch the next generation.
    fn start_generation(&mut self, descriptor: Option<&[u8]>) -> Result<ExitSignal, ControllerError> {
        self.writer.regenerate(descriptor, self.platform.as_deref())?;
        Ok(self.runner.start())
    }

    async fn shutdown(mut self, exit: ExitSignal) -> Result<(), ControllerError> {
        tracing::info!(state = ?self.state, "Shutdown requested, stopping agent");
        if self.state == SupervisionState::Normal {
            if let Err(e) = self.runner.kill().await {
                tracing::debug!(error = %e, "Agent already gone");
            }
        }

        match tokio::time::timeout(SHUTDOWN_GRACE, exit).await {
            Ok(_) => tracing::info!("Agent stopped"),
            Err(_) => tracing::warn!("Agent did not exit within the grace period"),
        }
        Ok(())
    }
}

async fn next_outcome(
    rx: &mut Option<oneshot::Receiver<SubscriptionOutcome>>,
) -> Option<SubscriptionOutcome> {
    match rx {
        Some(rx) => rx.await.ok(),
        None => std::future::pending().await,
    }
}
