use std::collections::BTreeMap;

use prestige_types::{AccessGrant, PermissionSet};

use crate::policy::{CredentialPolicy, PolicyStatement};

/// Derives credential policies from declared grants.
pub struct GrantResolver;

impl GrantResolver {
    /// Resolve one policy per compute unit.
    ///
    /// Every unit in `units` gets a policy, empty when it holds no grant.
    /// Grants for the same (unit, store) pair merge additively; a grant on
    /// one store never contributes to a statement on another. Grants naming
    /// a unit outside `units` are ignored.
    pub fn resolve<'a, I>(units: I, grants: &[AccessGrant]) -> BTreeMap<String, CredentialPolicy>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut merged: BTreeMap<String, BTreeMap<String, PermissionSet>> = units
            .into_iter()
            .map(|u| (u.to_string(), BTreeMap::new()))
            .collect();

        for grant in grants {
            let Some(stores) = merged.get_mut(&grant.grantee) else {
                tracing::warn!(unit = %grant.grantee, store = %grant.store, "grant for undeclared unit ignored");
                continue;
            };
            let entry = stores.entry(grant.store.clone()).or_insert(PermissionSet::NONE);
            *entry = entry.union(grant.permissions);
        }

        merged
            .into_iter()
            .map(|(unit, stores)| {
                let statements = stores
                    .into_iter()
                    .filter(|(_, perms)| !perms.is_empty())
                    .map(|(store, perms)| PolicyStatement::allow(store, perms))
                    .collect();
                let policy = CredentialPolicy {
                    principal: unit.clone(),
                    statements,
                };
                tracing::debug!(unit = %unit, statements = policy.statements.len(), "resolved credential policy");
                (unit, policy)
            })
            .collect()
    }
}
