//! Notification endpoint subsystem.
//!
//! # Data Flow
//! ```text
//! POST <notification_path>   → XAppChangeNotification(body) → control loop → 200
//! GET  /supervision/         → SupervisionProbe(reply)      → control loop → 200 "OK"
//! POST /ric/v1/measurements  → PlatformMeasurements(body)   → control loop → 200
//! GET  /ric/v1/symptomdata   → realized agent config file   → 200 | 404
//! ```
//!
//! # Design Decisions
//! - Handlers never touch supervision state; they only send events
//! - Wrong methods are rejected by axum method routing (405)

pub mod handlers;
pub mod server;

pub use server::{build_router, HttpState, NotificationServer};

/// Liveness probe route.
pub const SUPERVISION_PATH: &str = "/supervision/";

/// Platform metrics descriptor upload route.
pub const MEASUREMENTS_PATH: &str = "/ric/v1/measurements";

/// Realized agent configuration download route.
pub const SYMPTOMDATA_PATH: &str = "/ric/v1/symptomdata";
