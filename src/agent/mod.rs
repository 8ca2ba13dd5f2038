//! Agent process subsystem.
//!
//! # Data Flow
//! ```text
//! control loop
//!     → runner.rs start()  → spawn child + watcher task → ExitSignal
//!     → runner.rs kill()   → watcher delivers the signal → Ok once sent
//! watcher task
//!     → child exits (or never launched) → ExitReport on the ExitSignal
//! ```

pub mod runner;

pub use runner::{AgentRunner, CommandRunner, ExitReport, ExitSignal, KillError, RunnerError};
