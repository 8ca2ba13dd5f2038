//! Descriptor parsing into metric extraction rules.
//!
//! A descriptor is a JSON array of application objects:
//!
//! ```text
//! [ { "config": { "measurements": [
//!       { "moId": "..", "measType": "..", "measId": "..", "measInterval": "..",
//!         "metrics": [ { "name": "..", "objectName": "..",
//!                        "objectInstance": "..", "counterId": ".." } ] } ] } } ]
//! ```
//!
//! Anything missing or of the wrong type is skipped; nothing here fails.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::synth::document::{Label, MetricRule};

/// One counter exported by an application measurement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counter {
    pub mo_id: String,
    pub meas_type: String,
    pub meas_id: String,
    pub meas_interval: String,
    pub object_name: String,
    pub object_instance: String,
    pub counter_id: String,
}

/// Counters keyed by metric name. Ordered so rule output is deterministic.
pub type Counters = BTreeMap<String, Counter>;

/// Add every well-formed counter in `descriptor` to `counters`.
/// Names already present are kept; the first descriptor to declare a name wins.
pub fn parse_descriptor(descriptor: &[u8], counters: &mut Counters) {
    if descriptor.iter().all(u8::is_ascii_whitespace) {
        return;
    }

    let apps = match serde_json::from_slice::<Value>(descriptor) {
        Ok(Value::Array(apps)) => apps,
        Ok(_) => {
            tracing::warn!("Descriptor is not a JSON array, no metrics taken");
            return;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Descriptor is not valid JSON, no metrics taken");
            return;
        }
    };

    for app in &apps {
        let Some(measurements) = app
            .get("config")
            .and_then(|config| config.get("measurements"))
            .and_then(Value::as_array)
        else {
            tracing::debug!("No measurements in application config");
            continue;
        };

        for measurement in measurements {
            parse_measurement(measurement, counters);
        }
    }
}

fn parse_measurement(measurement: &Value, counters: &mut Counters) {
    let text = |key: &str| measurement.get(key).and_then(Value::as_str);

    let (Some(mo_id), Some(meas_type), Some(meas_id), Some(meas_interval), Some(metrics)) = (
        text("moId"),
        text("measType"),
        text("measId"),
        text("measInterval"),
        measurement.get("metrics").and_then(Value::as_array),
    ) else {
        tracing::debug!(measurement = %measurement, "Incomplete measurement skipped");
        return;
    };

    tracing::debug!(mo_id, meas_type, meas_id, meas_interval, "Parsed measurement");

    for metric in metrics {
        let text = |key: &str| metric.get(key).and_then(Value::as_str);
        let Some(name) = text("name") else {
            continue;
        };

        if counters.contains_key(name) {
            tracing::debug!(name, "Skipped duplicate counter");
            continue;
        }

        let (Some(object_name), Some(object_instance), Some(counter_id)) =
            (text("objectName"), text("objectInstance"), text("counterId"))
        else {
            tracing::debug!(name, "Incomplete counter skipped");
            continue;
        };

        tracing::debug!(name, object_name, object_instance, meas_id, counter_id, "Parsed counter");
        counters.insert(
            name.to_string(),
            Counter {
                mo_id: mo_id.to_string(),
                meas_type: meas_type.to_string(),
                meas_id: meas_id.to_string(),
                meas_interval: meas_interval.to_string(),
                object_name: object_name.to_string(),
                object_instance: object_instance.to_string(),
                counter_id: counter_id.to_string(),
            },
        );
    }
}

/// Extraction rule for one counter.
pub fn make_rule(name: &str, counter: &Counter) -> MetricRule {
    let label = |name: &str, expr: &str| Label {
        name: name.to_string(),
        expr: expr.to_string(),
    };

    MetricRule {
        target: "AdditionalObjects".to_string(),
        expr: name.to_string(),
        object_instance: format!("{}:{}", counter.object_instance, counter.counter_id),
        object_name: counter.object_name.clone(),
        object_keys: vec![
            label("ricComponentName", "'{{.labels.kubernetes_name}}'"),
            label("moId", &counter.mo_id),
            label("measType", &counter.meas_type),
            label("measId", &counter.meas_id),
            label("measInterval", &counter.meas_interval),
        ],
        ..MetricRule::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTOR: &str = r#"[
        {
            "config": {
                "measurements": [
                    {
                        "moId": "SEP-12/XYZ",
                        "measType": "X2",
                        "measId": "9001",
                        "measInterval": "60",
                        "metrics": [
                            { "name": "App1ExampleCounterOne", "objectName": "App1ExampleCounterOneObject",
                              "objectInstance": "App1ExampleCounterOneObjectInstance", "counterId": "0011" },
                            { "name": "App1ExampleCounterTwo", "objectName": "App1ExampleCounterTwoObject",
                              "objectInstance": "App1ExampleCounterTwoObjectInstance", "counterId": "0012" },
                            { "name": "MissingCounterId", "objectName": "o", "objectInstance": "i" }
                        ]
                    },
                    { "moId": "no-metrics", "measType": "X2", "measId": "1", "measInterval": "60" }
                ]
            }
        },
        { "metadata": {} },
        {
            "config": {
                "measurements": [
                    {
                        "moId": "SEP-12/ABC",
                        "measType": "X2",
                        "measId": "9002",
                        "measInterval": "60",
                        "metrics": [
                            { "name": "App1ExampleCounterOne", "objectName": "Duplicate",
                              "objectInstance": "Duplicate", "counterId": "9999" },
                            { "name": "App2ExampleCounterOne", "objectName": "App2ExampleCounterOneObject",
                              "objectInstance": "App2ExampleCounterOneObjectInstance", "counterId": "0021" }
                        ]
                    }
                ]
            }
        }
    ]"#;

    #[test]
    fn test_parses_valid_counters_and_skips_the_rest() {
        let mut counters = Counters::new();
        parse_descriptor(DESCRIPTOR.as_bytes(), &mut counters);

        let names: Vec<_> = counters.keys().cloned().collect();
        assert_eq!(
            names,
            ["App1ExampleCounterOne", "App1ExampleCounterTwo", "App2ExampleCounterOne"]
        );

        let first = &counters["App1ExampleCounterOne"];
        assert_eq!(first.mo_id, "SEP-12/XYZ");
        assert_eq!(first.counter_id, "0011");
    }

    #[test]
    fn test_garbage_yields_no_counters() {
        let inputs: [&[u8]; 5] = [b"", b"   ", b"not json", b"{\"config\": {}}", b"[1, \"two\"]"];
        for input in inputs {
            let mut counters = Counters::new();
            parse_descriptor(input, &mut counters);
            assert!(counters.is_empty(), "input {:?}", String::from_utf8_lossy(input));
        }
    }

    #[test]
    fn test_wrong_typed_fields_are_skipped() {
        let input = br#"[{"config": {"measurements": [
            {"moId": 7, "measType": "X2", "measId": "1", "measInterval": "60", "metrics": []},
            {"moId": "m", "measType": "X2", "measId": "1", "measInterval": "60",
             "metrics": [{"name": "n", "objectName": 1, "objectInstance": "i", "counterId": "c"}]}
        ]}}]"#;
        let mut counters = Counters::new();
        parse_descriptor(input, &mut counters);
        assert!(counters.is_empty());
    }

    #[test]
    fn test_make_rule() {
        let mut counters = Counters::new();
        parse_descriptor(DESCRIPTOR.as_bytes(), &mut counters);
        let rule = make_rule("App1ExampleCounterTwo", &counters["App1ExampleCounterTwo"]);

        assert_eq!(rule.target, "AdditionalObjects");
        assert_eq!(rule.expr, "App1ExampleCounterTwo");
        assert_eq!(rule.object_instance, "App1ExampleCounterTwoObjectInstance:0012");
        assert_eq!(rule.object_name, "App1ExampleCounterTwoObject");
        assert_eq!(rule.object_keys.len(), 5);
        assert_eq!(rule.object_keys[1], Label { name: "moId".into(), expr: "SEP-12/XYZ".into() });
    }
}
