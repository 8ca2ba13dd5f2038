//! Supervision and reconfiguration control loop.
//!
//! # Data Flow
//! ```text
//! http endpoint ──NotificationEvent──┐
//! agent watcher ──ExitReport─────────┤
//! subscription  ──SubscriptionOutcome┼──▶ controller.rs (single consumer)
//! lifecycle     ──shutdown───────────┘        │
//!                                             ├─▶ manager fetch
//!                                             ├─▶ synth writer (regenerate)
//!                                             └─▶ agent runner (kill / start)
//! ```
//!
//! # Design Decisions
//! - All supervision state lives in the controller; collaborators only send
//!   events in
//! - Fatal conditions end `run` with an error instead of being recovered

pub mod controller;
pub mod events;

pub use controller::Controller;
pub use events::{
    ControllerError, EventSender, EventSources, NotificationEvent, SupervisionState, PROBE_REPLY,
};
