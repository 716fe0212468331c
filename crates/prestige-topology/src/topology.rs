use std::collections::HashSet;

use prestige_types::{
    AccessGrant, ComputeUnitDefinition, CorsPolicy, PermissionSet, RouteDefinition,
    StoreDefinition,
};
use serde::{Deserialize, Serialize};

use crate::error::{TopologyError, TopologyResult};

// ---------------------------------------------------------------------------
// ApiDefinition
// ---------------------------------------------------------------------------

/// The HTTP entry point of the stack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiDefinition {
    pub name: String,
    pub description: String,
    /// Applied uniformly to every route.
    pub cors: CorsPolicy,
}

impl ApiDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, cors: CorsPolicy) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            cors,
        }
    }
}

impl Default for ApiDefinition {
    fn default() -> Self {
        Self::new("api", "", CorsPolicy::ALLOW_ALL)
    }
}

// ---------------------------------------------------------------------------
// Topology
// ---------------------------------------------------------------------------

/// A validated deployment description: stores, compute units, grants, routes.
///
/// Constructed only through [`TopologyBuilder::build`] (or deserialization
/// followed by [`Topology::validate`]).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    pub stack_name: String,
    pub api: ApiDefinition,
    pub stores: Vec<StoreDefinition>,
    pub compute_units: Vec<ComputeUnitDefinition>,
    pub grants: Vec<AccessGrant>,
    pub routes: Vec<RouteDefinition>,
}

impl Topology {
    /// Start building a topology for the named stack.
    pub fn builder(stack_name: impl Into<String>) -> TopologyBuilder {
        TopologyBuilder::new(stack_name)
    }

    pub fn store(&self, name: &str) -> Option<&StoreDefinition> {
        self.stores.iter().find(|s| s.name == name)
    }

    pub fn compute_unit(&self, name: &str) -> Option<&ComputeUnitDefinition> {
        self.compute_units.iter().find(|u| u.name == name)
    }

    pub fn route(&self, path_segment: &str) -> Option<&RouteDefinition> {
        self.routes.iter().find(|r| r.path_segment == path_segment)
    }

    /// All grants held by a compute unit.
    pub fn grants_for<'a>(&'a self, unit: &'a str) -> impl Iterator<Item = &'a AccessGrant> + 'a {
        self.grants.iter().filter(move |g| g.grantee == unit)
    }

    /// Effective permissions of `unit` on `store`. Empty when no grant exists.
    pub fn permissions(&self, unit: &str, store: &str) -> PermissionSet {
        self.grants_for(unit)
            .filter(|g| g.store == store)
            .fold(PermissionSet::NONE, |acc, g| acc.union(g.permissions))
    }

    /// Re-check every structural invariant.
    pub fn validate(&self) -> TopologyResult<()> {
        if self.stack_name.trim().is_empty() {
            return Err(TopologyError::EmptyStackName);
        }

        let mut store_names = HashSet::new();
        for store in &self.stores {
            store.validate()?;
            if !store_names.insert(store.name.as_str()) {
                return Err(TopologyError::DuplicateStore(store.name.clone()));
            }
        }

        let mut unit_names = HashSet::new();
        for unit in &self.compute_units {
            unit.validate()?;
            if !unit_names.insert(unit.name.as_str()) {
                return Err(TopologyError::DuplicateUnit(unit.name.clone()));
            }
        }

        for grant in &self.grants {
            if !unit_names.contains(grant.grantee.as_str()) {
                return Err(TopologyError::UnknownUnit {
                    unit: grant.grantee.clone(),
                    context: format!("grant on '{}'", grant.store),
                });
            }
            if !store_names.contains(grant.store.as_str()) {
                return Err(TopologyError::UnknownStore {
                    unit: grant.grantee.clone(),
                    store: grant.store.clone(),
                });
            }
            if grant.permissions.is_empty() {
                return Err(TopologyError::EmptyGrant {
                    unit: grant.grantee.clone(),
                    store: grant.store.clone(),
                });
            }
        }

        let mut segments = HashSet::new();
        for route in &self.routes {
            route.validate()?;
            if !segments.insert(route.path_segment.as_str()) {
                return Err(TopologyError::DuplicateRoute(route.path_segment.clone()));
            }
            if !unit_names.contains(route.unit.as_str()) {
                return Err(TopologyError::UnknownUnit {
                    unit: route.unit.clone(),
                    context: format!("route {}", route.path()),
                });
            }
        }

        Ok(())
    }

    /// Canonical JSON form.
    pub fn to_json(&self) -> TopologyResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| TopologyError::Serialization(e.to_string()))
    }

    /// Parse and validate a topology from JSON.
    pub fn from_json(json: &str) -> TopologyResult<Self> {
        let topology: Topology =
            serde_json::from_str(json).map_err(|e| TopologyError::Serialization(e.to_string()))?;
        topology.validate()?;
        Ok(topology)
    }

    /// BLAKE3 fingerprint of the canonical form, hex encoded.
    ///
    /// Two topologies with the same fingerprint describe the same stack.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"prestige-topology-v1:");
        match serde_json::to_vec(self) {
            Ok(bytes) => {
                hasher.update(&bytes);
            }
            Err(e) => tracing::warn!(error = %e, "topology serialization failed while fingerprinting"),
        }
        hex::encode(hasher.finalize().as_bytes())
    }
}

// ---------------------------------------------------------------------------
// TopologyBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`Topology`].
///
/// Declarations are collected in order; nothing is checked until
/// [`Self::build`].
#[derive(Clone, Debug)]
pub struct TopologyBuilder {
    stack_name: String,
    api: ApiDefinition,
    stores: Vec<StoreDefinition>,
    compute_units: Vec<ComputeUnitDefinition>,
    grants: Vec<AccessGrant>,
    routes: Vec<RouteDefinition>,
}

impl TopologyBuilder {
    pub fn new(stack_name: impl Into<String>) -> Self {
        Self {
            stack_name: stack_name.into(),
            api: ApiDefinition::default(),
            stores: Vec::new(),
            compute_units: Vec::new(),
            grants: Vec::new(),
            routes: Vec::new(),
        }
    }

    pub fn api(mut self, api: ApiDefinition) -> Self {
        self.api = api;
        self
    }

    pub fn store(mut self, store: StoreDefinition) -> Self {
        self.stores.push(store);
        self
    }

    pub fn compute_unit(mut self, unit: ComputeUnitDefinition) -> Self {
        self.compute_units.push(unit);
        self
    }

    /// Grant `unit` the given permissions on `store`.
    ///
    /// Repeated grants for the same pair merge into one.
    pub fn grant(
        mut self,
        unit: impl Into<String>,
        store: impl Into<String>,
        permissions: PermissionSet,
    ) -> Self {
        let grant = AccessGrant::new(unit, store, permissions);
        match self
            .grants
            .iter_mut()
            .find(|g| g.grantee == grant.grantee && g.store == grant.store)
        {
            Some(existing) => existing.permissions = existing.permissions.union(grant.permissions),
            None => self.grants.push(grant),
        }
        self
    }

    pub fn route(mut self, route: RouteDefinition) -> Self {
        self.routes.push(route);
        self
    }

    /// Validate and produce the topology.
    pub fn build(self) -> TopologyResult<Topology> {
        let topology = Topology {
            stack_name: self.stack_name,
            api: self.api,
            stores: self.stores,
            compute_units: self.compute_units,
            grants: self.grants,
            routes: self.routes,
        };
        topology.validate()?;
        Ok(topology)
    }
}
