//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the sidecar.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the sidecar.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SidecarConfig {
    /// Notification listener (bind address, callback path).
    pub listener: ListenerConfig,

    /// Manager endpoints and retry policy.
    pub manager: ManagerConfig,

    /// Supervised agent process.
    pub agent: AgentConfig,

    /// Event reporting block of the agent configuration.
    pub event: EventConfig,

    /// Primary collector block of the agent configuration.
    pub collector: CollectorConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Notification listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Path the manager posts change notifications to.
    pub notification_path: String,

    /// Host (optionally host:port) advertised in the callback URL.
    /// Derived from the outbound interface when absent.
    pub advertise_address: Option<String>,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            notification_path: "/xapp_notification/".to_string(),
            advertise_address: None,
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Manager endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Scheme, host and port of the manager.
    pub base_url: String,

    /// Path serving the current metrics descriptors.
    pub config_path: String,

    /// Path accepting notification subscriptions.
    pub subscriptions_path: String,

    /// Timeout of a single subscribe attempt in seconds.
    pub subscribe_timeout_secs: u64,

    /// Timeout of a descriptor fetch in seconds.
    pub fetch_timeout_secs: u64,

    /// Fixed delay between subscribe attempts in milliseconds.
    pub retry_interval_ms: u64,

    /// Subscribe attempt bound. Retries forever when unset.
    pub max_attempts: Option<u32>,

    /// `maxRetries` requested from the manager for notification delivery.
    pub notify_max_retries: u32,

    /// `retryTimer` requested from the manager for notification delivery.
    pub notify_retry_timer: u32,

    /// Fetch descriptors once the subscription is in place.
    pub fetch_on_startup: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://service-ricplt-appmgr-http.ricplt.svc.cluster.local:8080".to_string(),
            config_path: "/ric/v1/config".to_string(),
            subscriptions_path: "/ric/v1/subscriptions".to_string(),
            subscribe_timeout_secs: 5,
            fetch_timeout_secs: 10,
            retry_interval_ms: 5000,
            max_attempts: None,
            notify_max_retries: 5,
            notify_retry_timer: 5,
            fetch_on_startup: true,
        }
    }
}

/// Supervised agent process configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Executable name or path.
    pub executable: String,

    /// Where the realized agent configuration is written.
    pub config_file: String,

    /// Heartbeat interval passed to the agent (e.g. "60s").
    pub heartbeat_interval: String,

    /// Measurement interval passed to the agent (e.g. "30s").
    pub measurement_interval: String,

    /// Prometheus address the agent scrapes.
    pub prometheus_address: String,

    /// Alert manager bind address, if the agent should expose one.
    pub alert_manager_bind: Option<String>,

    /// Run the agent with debug output and write `debug: true`.
    pub debug: bool,

    /// Additional arguments appended verbatim.
    pub extra_args: Vec<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            executable: "ves-agent".to_string(),
            config_file: "/etc/ves-agent/ves-agent.yaml".to_string(),
            heartbeat_interval: "60s".to_string(),
            measurement_interval: "30s".to_string(),
            prometheus_address: "http://localhost:9090".to_string(),
            alert_manager_bind: None,
            debug: false,
            extra_args: Vec::new(),
        }
    }
}

impl AgentConfig {
    /// Command line arguments for one agent generation.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-i".to_string(),
            self.heartbeat_interval.clone(),
            "-m".to_string(),
            self.measurement_interval.clone(),
        ];
        if self.debug {
            args.push("--Debug".to_string());
        }
        args.push("--Measurement.Prometheus.Address".to_string());
        args.push(self.prometheus_address.clone());
        if let Some(bind) = &self.alert_manager_bind {
            args.push("--AlertManager.Bind".to_string());
            args.push(bind.clone());
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

/// Event reporting configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EventConfig {
    /// Agent data directory.
    pub data_dir: String,

    pub vnf_name: String,

    pub nf_naming_code: String,

    pub reporting_entity_name: String,

    /// File holding the host UUID used as reporting entity id.
    pub system_uuid_path: String,

    /// Maximum event payload size in bytes.
    pub max_size: u64,

    pub retry_interval_secs: u64,

    /// Missed heartbeats tolerated by the collector.
    pub max_missed: u32,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            data_dir: "/tmp/data".to_string(),
            vnf_name: "Vespa".to_string(),
            nf_naming_code: "ricp".to_string(),
            reporting_entity_name: "Vespa".to_string(),
            system_uuid_path: "/sys/class/dmi/id/product_uuid".to_string(),
            max_size: 2_000_000,
            retry_interval_secs: 5,
            max_missed: 2,
        }
    }
}

/// Primary collector configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub user: String,
    pub password: String,
    pub passphrase: String,
    /// Collector host.
    pub address: String,
    pub port: u32,
    /// Use TLS towards the collector.
    pub secure: bool,
    pub server_root: String,
    pub topic: String,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            user: String::new(),
            password: String::new(),
            passphrase: String::new(),
            address: String::new(),
            port: 8443,
            secure: false,
            server_root: String::new(),
            topic: String::new(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
