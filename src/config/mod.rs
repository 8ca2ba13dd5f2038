//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (SIDECAR_* environment overrides)
//!     → validation.rs (semantic checks)
//!     → SidecarConfig (validated, immutable)
//!     → cloned into each subsystem at construction
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a controller restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::AgentConfig;
pub use schema::CollectorConfig;
pub use schema::EventConfig;
pub use schema::ListenerConfig;
pub use schema::LogFormat;
pub use schema::ManagerConfig;
pub use schema::ObservabilityConfig;
pub use schema::SidecarConfig;
