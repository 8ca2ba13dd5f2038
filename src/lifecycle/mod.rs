//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Bind listener → Resolve callback URL → Spawn HTTP server
//!     → Spawn subscription → Run control loop
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Control loop kills agent and waits → HTTP server drains → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: listener first, so the callback URL names a bound port
//! - Any startup error is fatal
//! - The control loop's result decides the process exit status

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use startup::{run, StartupError};
