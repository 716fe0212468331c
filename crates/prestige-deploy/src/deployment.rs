use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use prestige_compute::ComputeUnit;
use prestige_gate::CredentialPolicy;
use prestige_server::IngressRouter;
use prestige_store::{StoreProvisioner, TeardownOutcome};
use prestige_topology::Topology;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DeployError, DeployResult};

/// A live, in-process deployment of a topology.
#[derive(Debug)]
pub struct Deployment {
    pub id: Uuid,
    pub stack_name: String,
    pub deployed_at: DateTime<Utc>,
    pub fingerprint: String,
    pub topology: Topology,
    pub policies: BTreeMap<String, CredentialPolicy>,
    pub units: BTreeMap<String, Arc<ComputeUnit>>,
    pub ingress: IngressRouter,
}

impl Deployment {
    pub fn unit(&self, name: &str) -> Option<&Arc<ComputeUnit>> {
        self.units.get(name)
    }

    pub fn policy(&self, unit: &str) -> Option<&CredentialPolicy> {
        self.policies.get(unit)
    }

    /// Build the HTTP router for this deployment.
    pub fn router(&self) -> axum::Router {
        self.ingress.build()
    }

    /// Serializable summary, suitable as a state file for later planning.
    pub fn record(&self) -> DeploymentRecord {
        DeploymentRecord {
            id: self.id,
            stack_name: self.stack_name.clone(),
            deployed_at: self.deployed_at,
            fingerprint: self.fingerprint.clone(),
            topology: self.topology.clone(),
            policies: self.policies.clone(),
        }
    }

    /// Tear the stack down, applying each store's retention policy.
    pub fn teardown(self, provisioner: &dyn StoreProvisioner) -> DeployResult<TeardownReport> {
        let mut report = TeardownReport::default();
        for store in &self.topology.stores {
            match provisioner.teardown(store)? {
                TeardownOutcome::Retained => report.retained.push(store.name.clone()),
                TeardownOutcome::Deleted => report.deleted.push(store.name.clone()),
                TeardownOutcome::Absent => report.absent.push(store.name.clone()),
            }
        }
        tracing::info!(
            stack = %self.stack_name,
            deployment = %self.id,
            retained = report.retained.len(),
            deleted = report.deleted.len(),
            "stack torn down"
        );
        Ok(report)
    }
}

/// What a teardown did to each store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeardownReport {
    pub retained: Vec<String>,
    pub deleted: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub absent: Vec<String>,
}

/// Persistent record of a deployment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub id: Uuid,
    pub stack_name: String,
    pub deployed_at: DateTime<Utc>,
    pub fingerprint: String,
    pub topology: Topology,
    pub policies: BTreeMap<String, CredentialPolicy>,
}

impl DeploymentRecord {
    /// Record for a synthesized but not yet deployed topology.
    pub fn synthesized(topology: Topology, policies: BTreeMap<String, CredentialPolicy>) -> Self {
        Self {
            id: Uuid::now_v7(),
            stack_name: topology.stack_name.clone(),
            deployed_at: Utc::now(),
            fingerprint: topology.fingerprint(),
            topology,
            policies,
        }
    }

    pub fn to_json(&self) -> DeployResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| DeployError::Record(e.to_string()))
    }

    /// Parse a record. The embedded topology is re-validated and must match
    /// the stored fingerprint.
    pub fn from_json(json: &str) -> DeployResult<Self> {
        let record: Self =
            serde_json::from_str(json).map_err(|e| DeployError::Record(e.to_string()))?;
        record.topology.validate()?;
        let actual = record.topology.fingerprint();
        if actual != record.fingerprint {
            return Err(DeployError::Record(format!(
                "fingerprint mismatch: recorded {}, computed {actual}",
                record.fingerprint
            )));
        }
        Ok(record)
    }

    pub fn save(&self, path: &Path) -> DeployResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> DeployResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}
