//! Sidecar that keeps a telemetry agent configured and running.

pub mod agent;
pub mod config;
pub mod control;
pub mod http;
pub mod lifecycle;
pub mod manager;
pub mod observability;
pub mod resilience;
pub mod synth;

pub use config::schema::SidecarConfig;
pub use control::Controller;
pub use lifecycle::Shutdown;
