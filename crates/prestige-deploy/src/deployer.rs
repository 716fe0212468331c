use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use prestige_compute::{ArtifactCatalog, ComputeProvisioner};
use prestige_gate::{GrantResolver, ScopedStores};
use prestige_server::{IngressRouter, ServerConfig};
use prestige_store::{StoreProvisioner, TableStore};
use prestige_topology::Topology;
use uuid::Uuid;

use crate::deployment::{Deployment, TeardownReport};
use crate::error::{DeployError, DeployResult};

/// Turns a [`Topology`] into a live [`Deployment`].
pub struct Deployer {
    stores: Arc<dyn StoreProvisioner>,
    catalog: Arc<dyn ArtifactCatalog>,
    server: ServerConfig,
}

impl Deployer {
    pub fn new(
        stores: Arc<dyn StoreProvisioner>,
        catalog: Arc<dyn ArtifactCatalog>,
        server: ServerConfig,
    ) -> Self {
        Self {
            stores,
            catalog,
            server,
        }
    }

    pub fn provisioner(&self) -> &Arc<dyn StoreProvisioner> {
        &self.stores
    }

    pub fn server_config(&self) -> &ServerConfig {
        &self.server
    }

    /// Everything that can fail without side effects: store schema checks and
    /// artifact resolution. Nothing is created or changed.
    pub fn preflight(&self, topology: &Topology) -> DeployResult<()> {
        topology.validate()?;
        for store in &topology.stores {
            self.stores.check(store)?;
        }
        for unit in &topology.compute_units {
            self.catalog.resolve(unit)?;
        }
        Ok(())
    }

    /// Deploy `topology`.
    ///
    /// A schema conflict or unresolvable artifact aborts before any store is
    /// created or modified.
    pub fn deploy(&self, topology: &Topology) -> DeployResult<Deployment> {
        let id = Uuid::now_v7();
        let fingerprint = topology.fingerprint();
        tracing::info!(stack = %topology.stack_name, deployment = %id, %fingerprint, "deploy started");

        if let Err(e) = self.preflight(topology) {
            tracing::error!(stack = %topology.stack_name, error = %e, "pre-flight failed, nothing changed");
            return Err(e);
        }

        let mut tables: BTreeMap<String, Arc<dyn TableStore>> = BTreeMap::new();
        for store in &topology.stores {
            tables.insert(store.name.clone(), self.stores.provision(store)?);
        }

        let policies = GrantResolver::resolve(
            topology.compute_units.iter().map(|u| u.name.as_str()),
            &topology.grants,
        );

        let mut units = BTreeMap::new();
        for definition in &topology.compute_units {
            let stores = match policies.get(&definition.name) {
                Some(policy) => ScopedStores::new(policy.clone(), &tables)?,
                None => ScopedStores::empty(definition.name.clone()),
            };
            let unit = ComputeProvisioner::provision(definition, self.catalog.as_ref(), Arc::new(stores))?;
            units.insert(definition.name.clone(), Arc::new(unit));
        }

        let mut ingress = IngressRouter::new(topology.api.cors.clone(), self.server.clone());
        for route in &topology.routes {
            let unit = units.get(&route.unit).ok_or_else(|| {
                DeployError::Topology(prestige_topology::TopologyError::UnknownUnit {
                    unit: route.unit.clone(),
                    context: format!("route {}", route.path()),
                })
            })?;
            ingress.bind(route.clone(), Arc::clone(unit))?;
        }

        tracing::info!(
            stack = %topology.stack_name,
            deployment = %id,
            stores = tables.len(),
            units = units.len(),
            routes = topology.routes.len(),
            "deploy finished"
        );
        Ok(Deployment {
            id,
            stack_name: topology.stack_name.clone(),
            deployed_at: Utc::now(),
            fingerprint,
            topology: topology.clone(),
            policies,
            units,
            ingress,
        })
    }

    /// Tear a deployment down against this deployer's provisioner.
    pub fn teardown(&self, deployment: Deployment) -> DeployResult<TeardownReport> {
        deployment.teardown(self.stores.as_ref())
    }
}
