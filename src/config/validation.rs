//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Reject paths that would collide with the supervision route
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SidecarConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::SidecarConfig;
use crate::http::SUPERVISION_PATH;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("listener.notification_path '{0}' must start and end with '/'")]
    NotificationPath(String),

    #[error("listener.notification_path must not be the supervision path")]
    NotificationPathCollision,

    #[error("manager.base_url '{0}' is not an http(s) URL")]
    ManagerUrl(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("collector.port {0} is outside 1..=65535")]
    CollectorPort(u32),
}

/// Validate a loaded configuration.
pub fn validate_config(config: &SidecarConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let path = &config.listener.notification_path;
    if !path.starts_with('/') || !path.ends_with('/') || path.len() < 2 {
        errors.push(ValidationError::NotificationPath(path.clone()));
    } else if path == SUPERVISION_PATH {
        errors.push(ValidationError::NotificationPathCollision);
    }

    match url::Url::parse(&config.manager.base_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        _ => errors.push(ValidationError::ManagerUrl(config.manager.base_url.clone())),
    }

    let manager = &config.manager;
    for (name, value) in [
        ("manager.subscribe_timeout_secs", manager.subscribe_timeout_secs),
        ("manager.fetch_timeout_secs", manager.fetch_timeout_secs),
        ("manager.retry_interval_ms", manager.retry_interval_ms),
    ] {
        if value == 0 {
            errors.push(ValidationError::Zero(name));
        }
    }
    if manager.max_attempts == Some(0) {
        errors.push(ValidationError::Zero("manager.max_attempts"));
    }

    if config.agent.executable.trim().is_empty() {
        errors.push(ValidationError::Empty("agent.executable"));
    }
    if config.agent.config_file.trim().is_empty() {
        errors.push(ValidationError::Empty("agent.config_file"));
    }

    if !(1..=65535).contains(&config.collector.port) {
        errors.push(ValidationError::CollectorPort(config.collector.port));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
