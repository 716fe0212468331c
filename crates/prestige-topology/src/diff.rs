//! Change planning: compare a previously deployed topology with a new one.
//!
//! Resources are matched by identity (store name, unit name, grant pair,
//! route segment). A store whose key schema differs is a conflict, never an
//! update: the key of an existing store cannot change.

use std::collections::BTreeMap;
use std::fmt;

use prestige_types::{KeySchema, RetentionPolicy};
use serde::Serialize;

use crate::topology::Topology;

/// Kind of resource a change applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Api,
    Store,
    ComputeUnit,
    Grant,
    Route,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Api => "api",
            Self::Store => "store",
            Self::ComputeUnit => "compute unit",
            Self::Grant => "grant",
            Self::Route => "route",
        };
        f.write_str(s)
    }
}

/// A single planned change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Change {
    Create { kind: ResourceKind, name: String },
    Update { kind: ResourceKind, name: String },
    Remove { kind: ResourceKind, name: String },
    /// A retained store leaves the stack but keeps existing with its data.
    Orphan { name: String },
    /// The store's key schema would change. Deployment must fail.
    Conflict {
        name: String,
        existing: KeySchema,
        requested: KeySchema,
    },
}

impl Change {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create { kind, name } => write!(f, "+ {kind} {name}"),
            Self::Update { kind, name } => write!(f, "~ {kind} {name}"),
            Self::Remove { kind, name } => write!(f, "- {kind} {name}"),
            Self::Orphan { name } => write!(f, "- store {name} (retained)"),
            Self::Conflict {
                name,
                existing,
                requested,
            } => write!(f, "! store {name}: key {existing} cannot become {requested}"),
        }
    }
}

/// Ordered change set between two topologies.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub changes: Vec<Change>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn has_conflicts(&self) -> bool {
        self.changes.iter().any(Change::is_conflict)
    }

    pub fn conflicts(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter().filter(|c| c.is_conflict())
    }
}

/// Plan the changes needed to go from `previous` (if any) to `next`.
pub fn plan(previous: Option<&Topology>, next: &Topology) -> Plan {
    let mut changes = Vec::new();

    let Some(previous) = previous else {
        for store in &next.stores {
            changes.push(create(ResourceKind::Store, &store.name));
        }
        for unit in &next.compute_units {
            changes.push(create(ResourceKind::ComputeUnit, &unit.name));
        }
        for grant in &next.grants {
            changes.push(create(ResourceKind::Grant, &grant_name(&grant.grantee, &grant.store)));
        }
        changes.push(create(ResourceKind::Api, &next.api.name));
        for route in &next.routes {
            changes.push(create(ResourceKind::Route, &route.path()));
        }
        return Plan { changes };
    };

    // Stores.
    let old_stores: BTreeMap<_, _> = previous.stores.iter().map(|s| (s.name.as_str(), s)).collect();
    let new_stores: BTreeMap<_, _> = next.stores.iter().map(|s| (s.name.as_str(), s)).collect();
    for (name, old) in &old_stores {
        match new_stores.get(name) {
            Some(new) if !old.same_key_schema(new) => changes.push(Change::Conflict {
                name: name.to_string(),
                existing: old.partition_key.clone(),
                requested: new.partition_key.clone(),
            }),
            Some(new) if old != new => changes.push(update(ResourceKind::Store, name)),
            Some(_) => {}
            None if old.retention == RetentionPolicy::Retain => changes.push(Change::Orphan {
                name: name.to_string(),
            }),
            None => changes.push(remove(ResourceKind::Store, name)),
        }
    }
    for name in new_stores.keys().filter(|n| !old_stores.contains_key(*n)) {
        changes.push(create(ResourceKind::Store, name));
    }

    // Compute units.
    diff_keyed(
        &mut changes,
        ResourceKind::ComputeUnit,
        previous.compute_units.iter().map(|u| (u.name.clone(), u)).collect(),
        next.compute_units.iter().map(|u| (u.name.clone(), u)).collect(),
    );

    // Grants.
    diff_keyed(
        &mut changes,
        ResourceKind::Grant,
        previous
            .grants
            .iter()
            .map(|g| (grant_name(&g.grantee, &g.store), g))
            .collect(),
        next.grants
            .iter()
            .map(|g| (grant_name(&g.grantee, &g.store), g))
            .collect(),
    );

    // Api.
    if previous.api != next.api {
        changes.push(update(ResourceKind::Api, &next.api.name));
    }

    // Routes.
    diff_keyed(
        &mut changes,
        ResourceKind::Route,
        previous.routes.iter().map(|r| (r.path(), r)).collect(),
        next.routes.iter().map(|r| (r.path(), r)).collect(),
    );

    Plan { changes }
}

fn diff_keyed<T: PartialEq>(
    changes: &mut Vec<Change>,
    kind: ResourceKind,
    old: BTreeMap<String, &T>,
    new: BTreeMap<String, &T>,
) {
    for (name, old_value) in &old {
        match new.get(name) {
            Some(new_value) if old_value != new_value => changes.push(update(kind, name)),
            Some(_) => {}
            None => changes.push(remove(kind, name)),
        }
    }
    for name in new.keys().filter(|n| !old.contains_key(*n)) {
        changes.push(create(kind, name));
    }
}

fn grant_name(unit: &str, store: &str) -> String {
    format!("{unit} -> {store}")
}

fn create(kind: ResourceKind, name: &str) -> Change {
    Change::Create {
        kind,
        name: name.to_string(),
    }
}

fn update(kind: ResourceKind, name: &str) -> Change {
    Change::Update {
        kind,
        name: name.to_string(),
    }
}

fn remove(kind: ResourceKind, name: &str) -> Change {
    Change::Remove {
        kind,
        name: name.to_string(),
    }
}
