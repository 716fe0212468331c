use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use prestige_types::ComputeUnitDefinition;

use crate::error::{ComputeError, ComputeResult};
use crate::handler::Handler;

/// Resolves a unit definition's prebuilt artifact to something invokable.
pub trait ArtifactCatalog: Send + Sync {
    fn resolve(&self, definition: &ComputeUnitDefinition) -> ComputeResult<Arc<dyn Handler>>;
}

/// Catalog of in-process handlers, keyed by artifact path and entry point.
#[derive(Default)]
pub struct InMemoryCatalog {
    artifacts: RwLock<BTreeMap<PathBuf, BTreeMap<String, Arc<dyn Handler>>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` as `entry_point` of the artifact at `artifact`.
    /// Replaces any handler previously registered under the same pair.
    pub fn register(
        &self,
        artifact: impl Into<PathBuf>,
        entry_point: impl Into<String>,
        handler: Arc<dyn Handler>,
    ) {
        let mut map = self.artifacts.write().expect("lock poisoned");
        map.entry(artifact.into())
            .or_default()
            .insert(entry_point.into(), handler);
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(
        self,
        artifact: impl Into<PathBuf>,
        entry_point: impl Into<String>,
        handler: Arc<dyn Handler>,
    ) -> Self {
        self.register(artifact, entry_point, handler);
        self
    }

    pub fn contains(&self, artifact: &Path) -> bool {
        self.artifacts
            .read()
            .expect("lock poisoned")
            .contains_key(artifact)
    }
}

impl ArtifactCatalog for InMemoryCatalog {
    fn resolve(&self, definition: &ComputeUnitDefinition) -> ComputeResult<Arc<dyn Handler>> {
        definition.validate()?;
        let map = self.artifacts.read().expect("lock poisoned");
        let entries = map
            .get(&definition.artifact)
            .ok_or_else(|| ComputeError::ArtifactNotFound {
                unit: definition.name.clone(),
                artifact: definition.artifact.clone(),
            })?;
        entries
            .get(&definition.entry_point)
            .map(Arc::clone)
            .ok_or_else(|| ComputeError::EntryPointMissing {
                unit: definition.name.clone(),
                artifact: definition.artifact.clone(),
                entry_point: definition.entry_point.clone(),
            })
    }
}

impl std::fmt::Debug for InMemoryCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let map = self.artifacts.read().expect("lock poisoned");
        f.debug_struct("InMemoryCatalog")
            .field("artifacts", &map.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::EchoHandler;
    use prestige_types::Runtime;

    fn rankings() -> ComputeUnitDefinition {
        ComputeUnitDefinition::new("Rankings", Runtime::Go1x, "services/rankings-api", "main")
    }

    #[test]
    fn resolves_registered_entry_point() {
        let catalog = InMemoryCatalog::new().with("services/rankings-api", "main", Arc::new(EchoHandler));
        assert!(catalog.resolve(&rankings()).is_ok());
        assert!(catalog.contains(Path::new("services/rankings-api")));
    }

    #[test]
    fn missing_artifact_is_fatal() {
        let catalog = InMemoryCatalog::new();
        let err = catalog.resolve(&rankings()).err().unwrap();
        assert!(matches!(err, ComputeError::ArtifactNotFound { unit, .. } if unit == "Rankings"));
    }

    #[test]
    fn missing_entry_point_is_fatal() {
        let catalog = InMemoryCatalog::new().with("services/rankings-api", "bootstrap", Arc::new(EchoHandler));
        let err = catalog.resolve(&rankings()).err().unwrap();
        assert!(matches!(
            err,
            ComputeError::EntryPointMissing { entry_point, .. } if entry_point == "main"
        ));
    }

    #[test]
    fn invalid_definition_rejected() {
        let catalog = InMemoryCatalog::new();
        let def = ComputeUnitDefinition::new("Rankings", Runtime::Go1x, "services/rankings-api", "");
        assert!(matches!(
            catalog.resolve(&def).err().unwrap(),
            ComputeError::InvalidDefinition(_)
        ));
    }
}
