//! Agent configuration document.
//!
//! Keys are the flattened lowercase field names the agent reads; durations
//! are written in Go duration text (`5s`, `1h0m0s`).

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfiguration {
    #[serde(rename = "datadir")]
    pub data_dir: String,
    pub debug: bool,
    pub event: EventConfiguration,
    pub measurement: MeasurementConfiguration,
    #[serde(rename = "primarycollector")]
    pub primary_collector: CollectorConfiguration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventConfiguration {
    #[serde(rename = "vnfname")]
    pub vnf_name: String,
    #[serde(rename = "reportingentityname")]
    pub reporting_entity_name: String,
    #[serde(rename = "reportingentityid")]
    pub reporting_entity_id: String,
    #[serde(rename = "maxsize")]
    pub max_size: u64,
    #[serde(rename = "nfnamingcode")]
    pub nf_naming_code: String,
    #[serde(rename = "nfcnamingcodes", default)]
    pub nfc_naming_codes: Vec<NfcNamingCode>,
    #[serde(rename = "retryinterval")]
    pub retry_interval: GoDuration,
    #[serde(rename = "maxmissed")]
    pub max_missed: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NfcNamingCode {
    #[serde(rename = "type")]
    pub kind: String,
    pub vnfcs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementConfiguration {
    #[serde(rename = "domainabbreviation")]
    pub domain_abbreviation: String,
    #[serde(rename = "maxbufferingduration")]
    pub max_buffering_duration: GoDuration,
    pub prometheus: PrometheusConfiguration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrometheusConfiguration {
    pub timeout: GoDuration,
    #[serde(rename = "keepalive")]
    pub keep_alive: GoDuration,
    pub rules: MetricRules,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRules {
    #[serde(rename = "defaultvalues", default, skip_serializing_if = "Option::is_none")]
    pub default_values: Option<MetricRule>,
    #[serde(default)]
    pub metrics: Vec<MetricRule>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricRule {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub expr: String,
    #[serde(rename = "vmid", default, skip_serializing_if = "String::is_empty")]
    pub vmid_label: String,
    #[serde(rename = "objectinstance", default, skip_serializing_if = "String::is_empty")]
    pub object_instance: String,
    #[serde(rename = "objectname", default, skip_serializing_if = "String::is_empty")]
    pub object_name: String,
    #[serde(rename = "objectkeys", default, skip_serializing_if = "Vec::is_empty")]
    pub object_keys: Vec<Label>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub expr: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectorConfiguration {
    #[serde(rename = "serverroot")]
    pub server_root: String,
    pub fqdn: String,
    pub port: u32,
    pub secure: bool,
    pub topic: String,
    pub user: String,
    pub password: String,
    #[serde(rename = "passphrase")]
    pub pass_phrase: String,
}

/// Duration written as Go's `time.Duration.String()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct GoDuration(pub Duration);

impl GoDuration {
    pub fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    /// Parse the `h`/`m`/`s`/`ms` subset of Go duration text.
    pub fn parse(text: &str) -> Option<Self> {
        if text == "0" {
            return Some(Self(Duration::ZERO));
        }
        let mut total = Duration::ZERO;
        let mut rest = text;
        while !rest.is_empty() {
            let split = rest.find(|c: char| !(c.is_ascii_digit() || c == '.'))?;
            let (number, tail) = rest.split_at(split);
            let value: f64 = number.parse().ok()?;
            let unit_len = tail.find(|c: char| c.is_ascii_digit()).unwrap_or(tail.len());
            let (unit, next) = tail.split_at(unit_len);
            let scale = match unit {
                "h" => 3600.0,
                "m" => 60.0,
                "s" => 1.0,
                "ms" => 0.001,
                _ => return None,
            };
            let part = Duration::try_from_secs_f64(value * scale).ok()?;
            total = total.checked_add(part)?;
            rest = next;
        }
        Some(Self(total))
    }
}

impl fmt::Display for GoDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = self.0;
        if d.is_zero() {
            return write!(f, "0s");
        }
        if d < Duration::from_secs(1) {
            return write!(f, "{}ms", d.as_millis());
        }

        let total = d.as_secs();
        let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
        if hours > 0 {
            write!(f, "{}h", hours)?;
        }
        if hours > 0 || minutes > 0 {
            write!(f, "{}m", minutes)?;
        }
        write!(f, "{}", seconds)?;
        let nanos = d.subsec_nanos();
        if nanos > 0 {
            let fraction = format!("{:09}", nanos);
            write!(f, ".{}", fraction.trim_end_matches('0'))?;
        }
        write!(f, "s")
    }
}

impl Serialize for GoDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GoDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        GoDuration::parse(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid duration '{}'", text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_go_duration_text() {
        assert_eq!(GoDuration::from_secs(5).to_string(), "5s");
        assert_eq!(GoDuration::from_secs(90).to_string(), "1m30s");
        assert_eq!(GoDuration::from_secs(3600).to_string(), "1h0m0s");
        assert_eq!(GoDuration(Duration::from_millis(1500)).to_string(), "1.5s");
        assert_eq!(GoDuration(Duration::from_millis(250)).to_string(), "250ms");
        assert_eq!(GoDuration(Duration::ZERO).to_string(), "0s");
    }

    #[test]
    fn test_go_duration_parse() {
        assert_eq!(GoDuration::parse("1h0m0s"), Some(GoDuration::from_secs(3600)));
        assert_eq!(GoDuration::parse("30s"), Some(GoDuration::from_secs(30)));
        assert_eq!(GoDuration::parse("1m30s"), Some(GoDuration::from_secs(90)));
        assert_eq!(GoDuration::parse("5x"), None);
        assert_eq!(GoDuration::parse("s"), None);
    }

    #[test]
    fn test_go_duration_parse_rejects_overflow() {
        assert_eq!(GoDuration::parse("99999999999999999999999h"), None);
        assert_eq!(GoDuration::parse("10000000000000000000s10000000000000000000s"), None);
        assert!(serde_yaml::from_str::<GoDuration>("99999999999999999999999h").is_err());
    }
}
