use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{TopologyError, TopologyResult};

/// Inputs to the composition root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    /// Name of the deployable unit.
    pub stack_name: String,
    /// Directory holding the packaged service artifacts.
    pub services_root: PathBuf,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            stack_name: "PrestigeAPIStack".into(),
            services_root: PathBuf::from("services"),
        }
    }
}

impl StackConfig {
    pub fn from_toml_str(s: &str) -> TopologyResult<Self> {
        toml::from_str(s).map_err(|e| TopologyError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> TopologyResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Location of a named service artifact under [`Self::services_root`].
    pub fn artifact_dir(&self, service: &str) -> PathBuf {
        self.services_root.join(service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config() {
        let c = StackConfig::default();
        assert_eq!(c.stack_name, "PrestigeAPIStack");
        assert_eq!(c.artifact_dir("rankings-api"), PathBuf::from("services/rankings-api"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = StackConfig::from_toml_str("services_root = \"/opt/prestige\"").unwrap();
        assert_eq!(c.stack_name, "PrestigeAPIStack");
        assert_eq!(c.services_root, PathBuf::from("/opt/prestige"));
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let err = StackConfig::from_toml_str("stack_name = [").unwrap_err();
        assert!(matches!(err, TopologyError::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "stack_name = \"Staging\"").unwrap();
        let c = StackConfig::load(file.path()).unwrap();
        assert_eq!(c.stack_name, "Staging");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = StackConfig::load("/nonexistent/prestige.toml").unwrap_err();
        assert!(matches!(err, TopologyError::Io(_)));
    }
}
