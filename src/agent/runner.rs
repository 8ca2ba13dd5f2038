//! Subprocess runner owning one agent child at a time.
//!
//! # Responsibilities
//! - Launch one agent generation per `start` call
//! - Watch the child in a background task and report its exit exactly once
//! - Deliver a termination signal on `kill`
//!
//! # Design Decisions
//! - The watcher task owns the `Child`; `kill` reaches it over a channel so
//!   waiting and killing never contend for the handle
//! - Launch failures are reported through the exit signal, not returned
//! - `kill_on_drop` so a dropped runtime never leaks an agent

use std::future::Future;
use std::io;
use std::process::{ExitStatus, Stdio};

use thiserror::Error;
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};

use crate::config::AgentConfig;
use crate::observability::metrics;

/// Single-fire notification of an agent generation ending.
pub type ExitSignal = oneshot::Receiver<ExitReport>;

/// How an agent generation ended.
#[derive(Debug)]
pub enum ExitReport {
    /// The process ran and the OS reported its status (killed included).
    Exited(ExitStatus),
    /// The process never ran, or its status could not be collected.
    Failed(RunnerError),
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to launch '{executable}': {source}")]
    Launch {
        executable: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to wait for agent: {0}")]
    Wait(#[source] io::Error),

    #[error("agent exit watcher stopped without reporting")]
    WatcherLost,
}

#[derive(Debug, Error)]
pub enum KillError {
    #[error("no active agent process")]
    NoProcess,

    #[error("termination signal not delivered: {0}")]
    Signal(#[source] io::Error),
}

/// Start/kill capability over the supervised agent.
///
/// Callers must consume the previous [`ExitSignal`] before calling `start`
/// again; the control loop's state machine is what guarantees it.
pub trait AgentRunner {
    /// Launch a new generation and return its exit signal.
    fn start(&mut self) -> ExitSignal;

    /// Send a termination signal. Resolves once the signal is delivered;
    /// the exit itself arrives later on the exit signal.
    fn kill(&mut self) -> impl Future<Output = Result<(), KillError>> + Send;
}

type KillRequest = oneshot::Sender<io::Result<()>>;

#[derive(Debug)]
struct ActiveChild {
    pid: Option<u32>,
    kill_tx: mpsc::Sender<KillRequest>,
}

/// [`AgentRunner`] backed by an OS process.
#[derive(Debug)]
pub struct CommandRunner {
    executable: String,
    args: Vec<String>,
    active: Option<ActiveChild>,
}

impl CommandRunner {
    pub fn new(executable: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            executable: executable.into(),
            args,
            active: None,
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(config.executable.clone(), config.args())
    }

    /// Pid of the current generation, if one was launched.
    pub fn pid(&self) -> Option<u32> {
        self.active.as_ref().and_then(|a| a.pid)
    }
}

impl AgentRunner for CommandRunner {
    fn start(&mut self) -> ExitSignal {
        let (exit_tx, exit_rx) = oneshot::channel();

        let mut command = Command::new(&self.executable);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        match command.spawn() {
            Ok(child) => {
                let pid = child.id();
                let (kill_tx, kill_rx) = mpsc::channel(1);
                tokio::spawn(watch(child, kill_rx, exit_tx));
                self.active = Some(ActiveChild { pid, kill_tx });

                metrics::record_agent_start();
                tracing::info!(executable = %self.executable, pid = ?pid, "Agent started");
            }
            Err(source) => {
                self.active = None;
                tracing::error!(executable = %self.executable, error = %source, "Agent launch failed");
                let _ = exit_tx.send(ExitReport::Failed(RunnerError::Launch {
                    executable: self.executable.clone(),
                    source,
                }));
            }
        }

        exit_rx
    }

    async fn kill(&mut self) -> Result<(), KillError> {
        let active = self.active.take().ok_or(KillError::NoProcess)?;
        tracing::info!(pid = ?active.pid, "Killing agent");

        let (reply_tx, reply_rx) = oneshot::channel();
        // A closed channel means the watcher already saw the exit.
        active
            .kill_tx
            .send(reply_tx)
            .await
            .map_err(|_| KillError::NoProcess)?;

        reply_rx
            .await
            .map_err(|_| KillError::NoProcess)?
            .map_err(KillError::Signal)
    }
}

async fn watch(
    mut child: Child,
    mut kill_rx: mpsc::Receiver<KillRequest>,
    exit_tx: oneshot::Sender<ExitReport>,
) {
    let report = loop {
        tokio::select! {
            status = child.wait() => {
                break match status {
                    Ok(status) => ExitReport::Exited(status),
                    Err(e) => ExitReport::Failed(RunnerError::Wait(e)),
                };
            }
            Some(reply) = kill_rx.recv() => {
                let _ = reply.send(child.start_kill());
            }
        }
    };

    metrics::record_agent_exit();
    tracing::debug!(report = ?report, "Agent exit observed");
    let _ = exit_tx.send(report);
}
