use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use prestige_types::{KeySchema, RetentionPolicy, StoreDefinition, Throughput};
use serde::Serialize;

use crate::error::{StoreError, StoreResult};
use crate::memory::InMemoryTable;
use crate::traits::{StoreProvisioner, TableStore};

/// Observable state of a provisioned table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TableDescription {
    pub name: String,
    pub key: KeySchema,
    pub throughput: Throughput,
    pub retention: RetentionPolicy,
    pub item_count: usize,
    /// `false` once the owning stack has been torn down with `Retain`.
    pub attached: bool,
}

/// Result of tearing down one store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TeardownOutcome {
    /// The table and its data were kept.
    Retained,
    /// The table was deleted.
    Deleted,
    /// Nothing to tear down.
    Absent,
}

struct ProvisionedTable {
    definition: StoreDefinition,
    table: Arc<InMemoryTable>,
    attached: bool,
}

/// Account-like registry of in-memory tables.
///
/// Tables persist across deploys of the same provisioner, which is what makes
/// schema conflicts and retention observable.
pub struct InMemoryProvisioner {
    tables: RwLock<BTreeMap<String, ProvisionedTable>>,
}

impl InMemoryProvisioner {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of tables in the registry, attached or not.
    pub fn len(&self) -> usize {
        self.tables.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handle to an existing table.
    pub fn table(&self, name: &str) -> Option<Arc<dyn TableStore>> {
        let map = self.tables.read().expect("lock poisoned");
        map.get(name)
            .map(|t| Arc::clone(&t.table) as Arc<dyn TableStore>)
    }

    fn conflict(existing: &StoreDefinition, requested: &StoreDefinition) -> StoreError {
        StoreError::SchemaConflict {
            store: requested.name.clone(),
            existing: existing.partition_key.clone(),
            requested: requested.partition_key.clone(),
        }
    }
}

impl Default for InMemoryProvisioner {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreProvisioner for InMemoryProvisioner {
    fn check(&self, definition: &StoreDefinition) -> StoreResult<()> {
        definition.validate()?;
        let map = self.tables.read().expect("lock poisoned");
        match map.get(&definition.name) {
            Some(existing) if !existing.definition.same_key_schema(definition) => {
                Err(Self::conflict(&existing.definition, definition))
            }
            _ => Ok(()),
        }
    }

    fn provision(&self, definition: &StoreDefinition) -> StoreResult<Arc<dyn TableStore>> {
        definition.validate()?;
        let mut map = self.tables.write().expect("lock poisoned");

        if let Some(existing) = map.get_mut(&definition.name) {
            if !existing.definition.same_key_schema(definition) {
                tracing::error!(
                    store = %definition.name,
                    existing = %existing.definition.partition_key,
                    requested = %definition.partition_key,
                    "store schema conflict"
                );
                return Err(Self::conflict(&existing.definition, definition));
            }
            if existing.definition.throughput != definition.throughput {
                tracing::info!(
                    store = %definition.name,
                    read = definition.throughput.read_units,
                    write = definition.throughput.write_units,
                    "updating provisioned throughput"
                );
            }
            existing.definition = definition.clone();
            existing.attached = true;
            return Ok(Arc::clone(&existing.table) as Arc<dyn TableStore>);
        }

        tracing::info!(
            store = %definition.name,
            key = %definition.partition_key,
            read = definition.throughput.read_units,
            write = definition.throughput.write_units,
            "creating store"
        );
        let table = Arc::new(InMemoryTable::new(
            definition.name.clone(),
            definition.partition_key.clone(),
        ));
        map.insert(
            definition.name.clone(),
            ProvisionedTable {
                definition: definition.clone(),
                table: Arc::clone(&table),
                attached: true,
            },
        );
        Ok(table)
    }

    fn describe(&self, name: &str) -> Option<TableDescription> {
        let map = self.tables.read().expect("lock poisoned");
        map.get(name).map(|t| TableDescription {
            name: t.definition.name.clone(),
            key: t.definition.partition_key.clone(),
            throughput: t.definition.throughput,
            retention: t.definition.retention,
            item_count: t.table.len(),
            attached: t.attached,
        })
    }

    fn teardown(&self, definition: &StoreDefinition) -> StoreResult<TeardownOutcome> {
        let mut map = self.tables.write().expect("lock poisoned");
        let Some(existing) = map.get_mut(&definition.name) else {
            return Ok(TeardownOutcome::Absent);
        };
        match definition.retention {
            RetentionPolicy::Retain => {
                existing.attached = false;
                tracing::info!(store = %definition.name, "store retained after teardown");
                Ok(TeardownOutcome::Retained)
            }
            RetentionPolicy::Destroy => {
                map.remove(&definition.name);
                tracing::info!(store = %definition.name, "store deleted");
                Ok(TeardownOutcome::Deleted)
            }
        }
    }

    fn provisioned_capacity(&self) -> Throughput {
        let map = self.tables.read().expect("lock poisoned");
        map.values()
            .fold(Throughput::new(0, 0), |acc, t| acc.saturating_add(t.definition.throughput))
    }
}

impl std::fmt::Debug for InMemoryProvisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryProvisioner")
            .field("table_count", &self.len())
            .finish()
    }
}
