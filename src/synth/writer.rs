//! Persisting the agent configuration document.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::synth::document::AgentConfiguration;
use crate::synth::{synthesize, BaseConfiguration};

#[derive(Debug, Error)]
pub enum SynthError {
    #[error("cannot serialize agent configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("cannot write agent configuration to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Serialize `doc` as YAML and replace `path` with it.
///
/// The document goes to a sibling temp file first and is renamed into
/// place, so readers see either the old or the new file.
pub fn write_config(path: &Path, doc: &AgentConfiguration) -> Result<(), SynthError> {
    let yaml = serde_yaml::to_string(doc)?;
    let io_err = |source| SynthError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, yaml).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;

    tracing::info!(path = %path.display(), "Agent configuration written");
    Ok(())
}

/// Regenerates the agent configuration file from descriptors.
#[derive(Debug, Clone)]
pub struct ConfigWriter {
    base: BaseConfiguration,
    path: PathBuf,
}

impl ConfigWriter {
    pub fn new(base: BaseConfiguration, path: impl Into<PathBuf>) -> Self {
        Self {
            base,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Synthesize and persist one generation's configuration.
    pub fn regenerate(
        &self,
        descriptor: Option<&[u8]>,
        platform: Option<&[u8]>,
    ) -> Result<AgentConfiguration, SynthError> {
        let doc = synthesize(&self.base, descriptor, platform);
        write_config(&self.path, &doc)?;
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SidecarConfig;
    use crate::synth::document::GoDuration;

    fn writer(dir: &Path) -> ConfigWriter {
        let mut config = SidecarConfig::default();
        config.event.system_uuid_path = dir.join("missing").display().to_string();
        ConfigWriter::new(BaseConfiguration::from_config(&config), dir.join("agent/agent.yaml"))
    }

    #[test]
    fn test_yaml_round_trips_base_values() {
        let dir = tempfile::tempdir().unwrap();
        let writer = writer(dir.path());
        let written = writer.regenerate(None, None).unwrap();

        let text = fs::read_to_string(writer.path()).unwrap();
        assert!(text.contains("datadir: /tmp/data"));
        assert!(text.contains("retryinterval: 5s"));
        assert!(text.contains("maxbufferingduration: 1h0m0s"));

        let parsed: AgentConfiguration = serde_yaml::from_str(&text).unwrap();
        assert_eq!(parsed, written);
        assert_eq!(parsed.measurement.prometheus.keep_alive, GoDuration::from_secs(30));
    }

    #[test]
    fn test_regenerate_replaces_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let writer = writer(dir.path());
        let descriptor = br#"[{"config": {"measurements": [{"moId": "m", "measType": "X2",
            "measId": "1", "measInterval": "60", "metrics": [{"name": "counter_a",
            "objectName": "o", "objectInstance": "i", "counterId": "c"}]}]}}]"#;

        writer.regenerate(Some(&descriptor[..]), None).unwrap();
        assert!(fs::read_to_string(writer.path()).unwrap().contains("counter_a"));

        writer.regenerate(None, None).unwrap();
        let text = fs::read_to_string(writer.path()).unwrap();
        assert!(!text.contains("counter_a"));
        assert!(!dir.path().join("agent/agent.yaml.tmp").exists());
    }

    #[test]
    fn test_unwritable_target() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();

        let doc = synthesize(
            &BaseConfiguration::from_config(&SidecarConfig::default()),
            None,
            None,
        );
        let err = write_config(&blocker.join("agent.yaml"), &doc).unwrap_err();
        assert!(matches!(err, SynthError::Io { .. }));
    }
}
