use std::path::{Path, PathBuf};

use anyhow::Context;
use prestige_server::ServerConfig;
use prestige_topology::StackConfig;
use serde::{Deserialize, Serialize};

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "prestige.toml";

/// Contents of `prestige.toml`. Both tables are optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrestigeConfig {
    pub stack: StackConfig,
    pub server: ServerConfig,
}

impl PrestigeConfig {
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Load `path`, or the default file if present, or built-in defaults.
    pub fn resolve(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    tracing::debug!("no {DEFAULT_CONFIG_FILE}, using defaults");
                    return Ok(Self::default());
                }
                default
            }
        };
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = Self::from_toml_str(&text)
            .with_context(|| format!("parsing {}", path.display()))?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn empty_file_is_defaults() {
        assert_eq!(PrestigeConfig::from_toml_str("").unwrap(), PrestigeConfig::default());
    }

    #[test]
    fn both_tables() {
        let config = PrestigeConfig::from_toml_str(
            r#"
            [stack]
            stack_name = "PrestigeStaging"
            services_root = "build/services"

            [server]
            bind_addr = "0.0.0.0:9000"
            integration_timeout = 10000
            "#,
        )
        .unwrap();
        assert_eq!(config.stack.stack_name, "PrestigeStaging");
        assert_eq!(config.stack.services_root, PathBuf::from("build/services"));
        assert_eq!(config.server.bind_addr.port(), 9000);
        assert_eq!(config.server.integration_timeout, Duration::from_secs(10));
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PrestigeConfig::resolve(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn explicit_path_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prestige.toml");
        std::fs::write(&path, "[stack]\nstack_name = \"Other\"\n").unwrap();
        let config = PrestigeConfig::resolve(Some(&path)).unwrap();
        assert_eq!(config.stack.stack_name, "Other");
        assert_eq!(config.server, ServerConfig::default());
    }
}
