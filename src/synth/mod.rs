//! Agent configuration synthesis.
//!
//! # Data Flow
//! ```text
//! SidecarConfig (event + collector sections, host UUID)
//!     → BaseConfiguration (resolved once at startup)
//! descriptor bytes (+ optional platform descriptor)
//!     → rules.rs (schema-tolerant walk → Counters → MetricRules)
//!     → synthesize() (pure: base + rules → AgentConfiguration)
//!     → writer.rs (YAML, temp file + rename over the target)
//! ```
//!
//! # Design Decisions
//! - `synthesize` has no side effects; all file access lives in the writer
//!   and in `BaseConfiguration::from_config`
//! - The document is regenerated wholesale, never patched

pub mod document;
pub mod rules;
pub mod writer;

use std::path::Path;
use std::time::Duration;

use crate::config::{CollectorConfig, EventConfig, SidecarConfig};
use crate::synth::document::{
    AgentConfiguration, CollectorConfiguration, EventConfiguration, GoDuration,
    MeasurementConfiguration, MetricRule, MetricRules, PrometheusConfiguration,
};
use crate::synth::rules::{make_rule, parse_descriptor, Counters};

pub use writer::{write_config, ConfigWriter, SynthError};

/// Everything the document needs that does not come from a descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseConfiguration {
    pub debug: bool,
    pub event: EventConfig,
    pub collector: CollectorConfig,
    pub reporting_entity_id: String,
}

impl BaseConfiguration {
    /// Resolve from the sidecar config, reading the host UUID file.
    pub fn from_config(config: &SidecarConfig) -> Self {
        Self {
            debug: config.agent.debug,
            event: config.event.clone(),
            collector: config.collector.clone(),
            reporting_entity_id: read_system_uuid(Path::new(&config.event.system_uuid_path)),
        }
    }
}

/// Host UUID from `path`, or the nil UUID when unreadable or malformed.
pub fn read_system_uuid(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let content = content.trim();
            if uuid::Uuid::parse_str(content).is_ok() {
                content.to_string()
            } else {
                tracing::warn!(path = %path.display(), "System UUID malformed, using nil UUID");
                uuid::Uuid::nil().to_string()
            }
        }
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "System UUID unavailable, using nil UUID");
            uuid::Uuid::nil().to_string()
        }
    }
}

/// Build the full agent document from the base and zero or one descriptor,
/// plus an optional platform descriptor whose counters never shadow the
/// descriptor's.
pub fn synthesize(
    base: &BaseConfiguration,
    descriptor: Option<&[u8]>,
    platform: Option<&[u8]>,
) -> AgentConfiguration {
    let mut counters = Counters::new();
    for payload in [descriptor, platform].into_iter().flatten() {
        parse_descriptor(payload, &mut counters);
    }

    let metrics: Vec<MetricRule> = counters
        .iter()
        .map(|(name, counter)| make_rule(name, counter))
        .collect();
    if metrics.is_empty() {
        tracing::info!("Agent configuration has no metric rules");
    } else {
        tracing::info!(rules = metrics.len(), "Agent configuration metric rules built");
    }

    let event = &base.event;
    let collector = &base.collector;

    AgentConfiguration {
        data_dir: event.data_dir.clone(),
        debug: base.debug,
        event: EventConfiguration {
            vnf_name: event.vnf_name.clone(),
            reporting_entity_name: event.reporting_entity_name.clone(),
            reporting_entity_id: base.reporting_entity_id.clone(),
            max_size: event.max_size,
            nf_naming_code: event.nf_naming_code.clone(),
            nfc_naming_codes: Vec::new(),
            retry_interval: GoDuration::from_secs(event.retry_interval_secs),
            max_missed: event.max_missed,
        },
        measurement: MeasurementConfiguration {
            // "Mvfs" is the VES 5.3 domain; later VES versions use "Measurement".
            domain_abbreviation: "Mvfs".to_string(),
            max_buffering_duration: GoDuration(Duration::from_secs(3600)),
            prometheus: PrometheusConfiguration {
                timeout: GoDuration::from_secs(30),
                keep_alive: GoDuration::from_secs(30),
                rules: MetricRules {
                    default_values: Some(MetricRule {
                        vmid_label: "'{{.labels.instance}}'".to_string(),
                        ..MetricRule::default()
                    }),
                    metrics,
                },
            },
        },
        primary_collector: CollectorConfiguration {
            server_root: collector.server_root.clone(),
            fqdn: collector.address.clone(),
            port: collector.port,
            secure: collector.secure,
            topic: collector.topic.clone(),
            user: collector.user.clone(),
            password: collector.password.clone(),
            pass_phrase: collector.passphrase.clone(),
        },
    }
}
