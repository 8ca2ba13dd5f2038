//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::SidecarConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load the TOML file (defaults when `path` is `None`), apply environment
/// overrides read through `env`, then validate.
pub fn load_config<F>(path: Option<&Path>, env: F) -> Result<SidecarConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => SidecarConfig::default(),
    };

    apply_env_overrides(&mut config, env);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Environment lookup backed by the process environment.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Overlay `SIDECAR_*` variables on top of the file configuration.
pub fn apply_env_overrides<F>(config: &mut SidecarConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    let set = |target: &mut String, key: &str| {
        if let Some(value) = env(key) {
            *target = value;
        }
    };

    set(&mut config.manager.base_url, "SIDECAR_MANAGER_URL");
    set(&mut config.agent.heartbeat_interval, "SIDECAR_HB_INTERVAL");
    set(&mut config.agent.measurement_interval, "SIDECAR_MEAS_INTERVAL");
    set(&mut config.agent.prometheus_address, "SIDECAR_PROMETHEUS_ADDR");
    set(&mut config.event.vnf_name, "SIDECAR_VNF_NAME");
    set(&mut config.event.nf_naming_code, "SIDECAR_NF_NAMING_CODE");

    let collector = &mut config.collector;
    set(&mut collector.user, "SIDECAR_COLLECTOR_USER");
    set(&mut collector.password, "SIDECAR_COLLECTOR_PASSWORD");
    set(&mut collector.passphrase, "SIDECAR_COLLECTOR_PASSPHRASE");
    set(&mut collector.address, "SIDECAR_COLLECTOR_ADDR");
    set(&mut collector.server_root, "SIDECAR_COLLECTOR_SERVER_ROOT");
    set(&mut collector.topic, "SIDECAR_COLLECTOR_TOPIC");

    if let Some(port) = env("SIDECAR_COLLECTOR_PORT") {
        // Garbage becomes 0 so validation rejects it instead of silently defaulting.
        collector.port = port.trim().parse().unwrap_or(0);
    }
    if let Some(secure) = env("SIDECAR_COLLECTOR_SECURE") {
        collector.secure = secure == "true";
    }

    if let Some(addr) = env("SIDECAR_ADVERTISE_ADDR") {
        config.listener.advertise_address = Some(addr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_collector_from_environment() {
        let mut config = SidecarConfig::default();
        apply_env_overrides(
            &mut config,
            env_from(&[
                ("SIDECAR_COLLECTOR_USER", "user123"),
                ("SIDECAR_COLLECTOR_PASSWORD", "pass123"),
                ("SIDECAR_COLLECTOR_PASSPHRASE", "phrase123"),
                ("SIDECAR_COLLECTOR_ADDR", "1.2.3.4"),
                ("SIDECAR_COLLECTOR_PORT", "1234"),
                ("SIDECAR_COLLECTOR_SERVER_ROOT", "vescollector"),
                ("SIDECAR_COLLECTOR_TOPIC", "sometopic"),
                ("SIDECAR_COLLECTOR_SECURE", "true"),
            ]),
        );

        let c = &config.collector;
        assert_eq!(c.user, "user123");
        assert_eq!(c.password, "pass123");
        assert_eq!(c.passphrase, "phrase123");
        assert_eq!(c.address, "1.2.3.4");
        assert_eq!(c.port, 1234);
        assert_eq!(c.server_root, "vescollector");
        assert_eq!(c.topic, "sometopic");
        assert!(c.secure);
    }

    #[test]
    fn test_unset_environment_keeps_defaults() {
        let mut config = SidecarConfig::default();
        apply_env_overrides(&mut config, env_from(&[]));
        assert_eq!(config.collector.port, 8443);
        assert!(!config.collector.secure);
        assert!(config.collector.user.is_empty());
    }

    #[test]
    fn test_bad_port_and_secure_values() {
        let mut config = SidecarConfig::default();
        apply_env_overrides(
            &mut config,
            env_from(&[
                ("SIDECAR_COLLECTOR_PORT", "abcd"),
                ("SIDECAR_COLLECTOR_SECURE", "foo"),
            ]),
        );
        assert_eq!(config.collector.port, 0);
        assert!(!config.collector.secure);
    }

    #[test]
    fn test_load_from_file_with_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[agent]\nexecutable = \"/usr/bin/agent\"\n[manager]\nretry_interval_ms = 250"
        )
        .unwrap();

        let config = load_config(
            Some(file.path()),
            env_from(&[("SIDECAR_MANAGER_URL", "http://appmgr.local:8080")]),
        )
        .unwrap();
        assert_eq!(config.agent.executable, "/usr/bin/agent");
        assert_eq!(config.manager.retry_interval_ms, 250);
        assert_eq!(config.manager.base_url, "http://appmgr.local:8080");
    }

    #[test]
    fn test_load_rejects_invalid_override() {
        let err = load_config(None, env_from(&[("SIDECAR_COLLECTOR_PORT", "x")])).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref e) if e.len() == 1));
        assert!(err.to_string().contains("collector.port"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Some(Path::new("/nonexistent/sidecar.toml")), env_from(&[]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
