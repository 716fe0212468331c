use std::collections::BTreeMap;
use std::sync::Arc;

use prestige_store::{AttributeValue, Condition, Item, TableStore};

use crate::action::Action;
use crate::error::{GateError, GateResult};
use crate::policy::CredentialPolicy;

/// The stores a compute unit can reach, filtered through its policy.
///
/// Only stores the policy mentions are attached. Every operation is checked
/// against the policy before it touches the table.
pub struct ScopedStores {
    policy: CredentialPolicy,
    tables: BTreeMap<String, Arc<dyn TableStore>>,
}

impl ScopedStores {
    /// Attach the tables `policy` mentions from the provisioned set.
    pub fn new(
        policy: CredentialPolicy,
        provisioned: &BTreeMap<String, Arc<dyn TableStore>>,
    ) -> GateResult<Self> {
        let mut tables = BTreeMap::new();
        for store in policy.stores() {
            let table = provisioned
                .get(store)
                .ok_or_else(|| GateError::UnknownStore(store.to_string()))?;
            tables.insert(store.to_string(), Arc::clone(table));
        }
        Ok(Self { policy, tables })
    }

    /// Scoped stores with no access to anything.
    pub fn empty(principal: impl Into<String>) -> Self {
        Self {
            policy: CredentialPolicy::deny_all(principal),
            tables: BTreeMap::new(),
        }
    }

    pub fn principal(&self) -> &str {
        &self.policy.principal
    }

    pub fn policy(&self) -> &CredentialPolicy {
        &self.policy
    }

    /// Names of the attached stores.
    pub fn attached(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Handle to a store. Access is checked per operation, so a handle to
    /// an ungranted store exists but every call on it is denied.
    pub fn table(&self, name: &str) -> ScopedTable<'_> {
        ScopedTable {
            scope: self,
            name: name.to_string(),
        }
    }

    fn authorize(&self, store: &str, action: Action) -> GateResult<&Arc<dyn TableStore>> {
        if !self.policy.allows(store, action) {
            tracing::warn!(
                principal = %self.policy.principal,
                store = %store,
                action = %action,
                "access denied"
            );
            return Err(GateError::AccessDenied {
                principal: self.policy.principal.clone(),
                action,
                store: store.to_string(),
            });
        }
        self.tables
            .get(store)
            .ok_or_else(|| GateError::UnknownStore(store.to_string()))
    }
}

impl std::fmt::Debug for ScopedStores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedStores")
            .field("principal", &self.policy.principal)
            .field("attached", &self.tables.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A policy-checked view of one store.
pub struct ScopedTable<'a> {
    scope: &'a ScopedStores,
    name: String,
}

impl ScopedTable<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_item(&self, key: &AttributeValue) -> GateResult<Option<Item>> {
        let table = self.scope.authorize(&self.name, Action::GetItem)?;
        Ok(table.get_item(key)?)
    }

    pub fn scan(&self) -> GateResult<Vec<Item>> {
        let table = self.scope.authorize(&self.name, Action::Scan)?;
        Ok(table.scan()?)
    }

    pub fn item_count(&self) -> GateResult<usize> {
        let table = self.scope.authorize(&self.name, Action::DescribeTable)?;
        Ok(table.len())
    }

    pub fn put_item(&self, item: Item) -> GateResult<()> {
        let table = self.scope.authorize(&self.name, Action::PutItem)?;
        Ok(table.put_item(item)?)
    }

    pub fn put_item_if(&self, item: Item, condition: &Condition) -> GateResult<()> {
        let table = self.scope.authorize(&self.name, Action::PutItem)?;
        Ok(table.put_item_if(item, condition)?)
    }

    pub fn update_item(
        &self,
        key: &AttributeValue,
        updates: Item,
        condition: Option<&Condition>,
    ) -> GateResult<Item> {
        let table = self.scope.authorize(&self.name, Action::UpdateItem)?;
        Ok(table.update_item(key, updates, condition)?)
    }

    pub fn delete_item(&self, key: &AttributeValue) -> GateResult<Option<Item>> {
        let table = self.scope.authorize(&self.name, Action::DeleteItem)?;
        Ok(table.delete_item(key)?)
    }
}
