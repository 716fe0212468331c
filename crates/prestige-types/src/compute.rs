use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Execution runtime a compute unit is registered with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Runtime {
    #[serde(rename = "go1.x")]
    Go1x,
    #[serde(rename = "provided.al2")]
    ProvidedAl2,
    #[serde(rename = "provided.al2023")]
    ProvidedAl2023,
}

impl Runtime {
    /// Runtime identifier as the hosting platform spells it.
    pub fn identifier(&self) -> &'static str {
        match self {
            Self::Go1x => "go1.x",
            Self::ProvidedAl2 => "provided.al2",
            Self::ProvidedAl2023 => "provided.al2023",
        }
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl FromStr for Runtime {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "go1.x" => Ok(Self::Go1x),
            "provided.al2" => Ok(Self::ProvidedAl2),
            "provided.al2023" => Ok(Self::ProvidedAl2023),
            other => Err(TypeError::UnknownRuntime(other.to_string())),
        }
    }
}

/// Declaration of an independently deployable request handler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeUnitDefinition {
    /// Logical unit name, unique within the stack.
    pub name: String,
    /// Execution runtime.
    pub runtime: Runtime,
    /// Directory holding the prebuilt, packaged handler.
    pub artifact: PathBuf,
    /// The single entry point invoked per request.
    pub entry_point: String,
}

impl ComputeUnitDefinition {
    pub fn new(
        name: impl Into<String>,
        runtime: Runtime,
        artifact: impl Into<PathBuf>,
        entry_point: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            runtime,
            artifact: artifact.into(),
            entry_point: entry_point.into(),
        }
    }

    /// Check the declaration's own invariants.
    ///
    /// Whether the artifact actually exists is only known at deploy time.
    pub fn validate(&self) -> Result<(), TypeError> {
        if self.name.trim().is_empty() {
            return Err(TypeError::EmptyUnitName);
        }
        if self.entry_point.is_empty() || self.entry_point.chars().any(char::is_whitespace) {
            return Err(TypeError::InvalidEntryPoint {
                unit: self.name.clone(),
                entry_point: self.entry_point.clone(),
            });
        }
        if self.artifact.as_os_str().is_empty() {
            return Err(TypeError::EmptyArtifact {
                unit: self.name.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rankings() -> ComputeUnitDefinition {
        ComputeUnitDefinition::new("Rankings", Runtime::Go1x, "services/rankings-api", "main")
    }

    #[test]
    fn valid_unit_passes() {
        assert!(rankings().validate().is_ok());
    }

    #[test]
    fn empty_name_rejected() {
        let mut unit = rankings();
        unit.name = " ".into();
        assert_eq!(unit.validate(), Err(TypeError::EmptyUnitName));
    }

    #[test]
    fn entry_point_with_space_rejected() {
        let mut unit = rankings();
        unit.entry_point = "main handler".into();
        assert!(matches!(unit.validate(), Err(TypeError::InvalidEntryPoint { .. })));
    }

    #[test]
    fn empty_artifact_rejected() {
        let mut unit = rankings();
        unit.artifact = PathBuf::new();
        assert!(matches!(unit.validate(), Err(TypeError::EmptyArtifact { .. })));
    }

    #[test]
    fn runtime_identifier_round_trip() {
        for rt in [Runtime::Go1x, Runtime::ProvidedAl2, Runtime::ProvidedAl2023] {
            assert_eq!(rt.identifier().parse::<Runtime>().unwrap(), rt);
        }
        assert!("nodejs18.x".parse::<Runtime>().is_err());
    }

    #[test]
    fn runtime_serializes_as_identifier() {
        let json = serde_json::to_string(&Runtime::Go1x).unwrap();
        assert_eq!(json, "\"go1.x\"");
    }
}
