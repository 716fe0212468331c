use std::collections::BTreeMap;
use std::sync::RwLock;

use prestige_types::KeySchema;

use crate::error::{StoreError, StoreResult};
use crate::traits::TableStore;
use crate::value::{AttributeValue, Condition, Item};

/// In-memory, `BTreeMap`-based table.
///
/// Intended for tests and embedding. Items are held behind a `RwLock` for
/// safe concurrent access and cloned on read/write.
pub struct InMemoryTable {
    name: String,
    key: KeySchema,
    items: RwLock<BTreeMap<AttributeValue, Item>>,
}

impl InMemoryTable {
    /// Create a new empty table.
    pub fn new(name: impl Into<String>, key: KeySchema) -> Self {
        Self {
            name: name.into(),
            key,
            items: RwLock::new(BTreeMap::new()),
        }
    }

    /// Remove all items.
    pub fn clear(&self) {
        self.items.write().expect("lock poisoned").clear();
    }

    fn check_key(&self, key: &AttributeValue) -> StoreResult<()> {
        if key.key_type() == Some(self.key.key_type) {
            Ok(())
        } else {
            Err(StoreError::KeyTypeMismatch {
                store: self.name.clone(),
                attribute: self.key.name.clone(),
                expected: self.key.key_type,
            })
        }
    }

    fn extract_key(&self, item: &Item) -> StoreResult<AttributeValue> {
        let key = item
            .get(&self.key.name)
            .ok_or_else(|| StoreError::MissingKey {
                store: self.name.clone(),
                attribute: self.key.name.clone(),
            })?;
        self.check_key(key)?;
        Ok(key.clone())
    }

    fn condition_failed(&self, condition: &Condition) -> StoreError {
        StoreError::ConditionFailed {
            store: self.name.clone(),
            condition: condition.to_string(),
        }
    }
}

impl TableStore for InMemoryTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn key_schema(&self) -> &KeySchema {
        &self.key
    }

    fn get_item(&self, key: &AttributeValue) -> StoreResult<Option<Item>> {
        self.check_key(key)?;
        let map = self.items.read().expect("lock poisoned");
        Ok(map.get(key).cloned())
    }

    fn put_item(&self, item: Item) -> StoreResult<()> {
        let key = self.extract_key(&item)?;
        let mut map = self.items.write().expect("lock poisoned");
        map.insert(key, item);
        Ok(())
    }

    fn put_item_if(&self, item: Item, condition: &Condition) -> StoreResult<()> {
        let key = self.extract_key(&item)?;
        let mut map = self.items.write().expect("lock poisoned");
        if !condition.holds(map.get(&key)) {
            return Err(self.condition_failed(condition));
        }
        map.insert(key, item);
        Ok(())
    }

    fn update_item(
        &self,
        key: &AttributeValue,
        updates: Item,
        condition: Option<&Condition>,
    ) -> StoreResult<Item> {
        self.check_key(key)?;
        if let Some(value) = updates.get(&self.key.name) {
            if value != key {
                return Err(StoreError::KeyUpdate {
                    store: self.name.clone(),
                    attribute: self.key.name.clone(),
                });
            }
        }

        let mut map = self.items.write().expect("lock poisoned");
        if let Some(condition) = condition {
            if !condition.holds(map.get(key)) {
                return Err(self.condition_failed(condition));
            }
        }

        let item = map.entry(key.clone()).or_insert_with(|| {
            let mut fresh = Item::new();
            fresh.insert(self.key.name.clone(), key.clone());
            fresh
        });
        item.extend(updates);
        Ok(item.clone())
    }

    fn delete_item(&self, key: &AttributeValue) -> StoreResult<Option<Item>> {
        self.check_key(key)?;
        let mut map = self.items.write().expect("lock poisoned");
        Ok(map.remove(key))
    }

    fn scan(&self) -> StoreResult<Vec<Item>> {
        let map = self.items.read().expect("lock poisoned");
        Ok(map.values().cloned().collect())
    }

    fn len(&self) -> usize {
        self.items.read().expect("lock poisoned").len()
    }
}

impl std::fmt::Debug for InMemoryTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryTable")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("item_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prestige_types::KeyType;

    fn companies() -> InMemoryTable {
        InMemoryTable::new("prestige-companies", KeySchema::string("Company"))
    }

    fn company(name: &str, wins: i64) -> Item {
        let mut item = Item::new();
        item.insert("Company".into(), name.into());
        item.insert("Wins".into(), wins.into());
        item
    }

    // -----------------------------------------------------------------------
    // Core CRUD
    // -----------------------------------------------------------------------

    #[test]
    fn put_and_get() {
        let table = companies();
        table.put_item(company("Acme", 1)).unwrap();
        let item = table.get_item(&"Acme".into()).unwrap().expect("should exist");
        assert_eq!(item["Wins"], AttributeValue::n(1));
    }

    #[test]
    fn put_replaces_existing_key() {
        let table = companies();
        table.put_item(company("Acme", 1)).unwrap();
        table.put_item(company("Acme", 5)).unwrap();
        assert_eq!(table.len(), 1);
        let item = table.get_item(&"Acme".into()).unwrap().unwrap();
        assert_eq!(item["Wins"], AttributeValue::n(5));
    }

    #[test]
    fn get_missing_returns_none() {
        assert!(companies().get_item(&"Nobody".into()).unwrap().is_none());
    }

    #[test]
    fn delete_returns_removed_item() {
        let table = companies();
        table.put_item(company("Acme", 1)).unwrap();
        assert!(table.delete_item(&"Acme".into()).unwrap().is_some());
        assert!(table.delete_item(&"Acme".into()).unwrap().is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn scan_is_ordered_by_key() {
        let table = companies();
        table.put_item(company("Zeta", 1)).unwrap();
        table.put_item(company("Acme", 2)).unwrap();
        let names: Vec<_> = table
            .scan()
            .unwrap()
            .iter()
            .map(|i| i["Company"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["Acme", "Zeta"]);
    }

    // -----------------------------------------------------------------------
    // Key validation
    // -----------------------------------------------------------------------

    #[test]
    fn missing_key_rejected() {
        let mut item = Item::new();
        item.insert("Wins".into(), 1.into());
        let err = companies().put_item(item).unwrap_err();
        assert!(matches!(err, StoreError::MissingKey { attribute, .. } if attribute == "Company"));
    }

    #[test]
    fn mistyped_key_rejected() {
        let mut item = Item::new();
        item.insert("Company".into(), 42.into());
        let err = companies().put_item(item).unwrap_err();
        assert!(matches!(
            err,
            StoreError::KeyTypeMismatch { expected: KeyType::String, .. }
        ));
        assert!(companies().get_item(&AttributeValue::n(1)).is_err());
    }

    // -----------------------------------------------------------------------
    // Conditional writes
    // -----------------------------------------------------------------------

    #[test]
    fn put_if_not_exists() {
        let table = companies();
        let cond = Condition::AttributeNotExists("Company".into());
        table.put_item_if(company("Acme", 1), &cond).unwrap();
        let err = table.put_item_if(company("Acme", 9), &cond).unwrap_err();
        assert!(matches!(err, StoreError::ConditionFailed { .. }));
        let item = table.get_item(&"Acme".into()).unwrap().unwrap();
        assert_eq!(item["Wins"], AttributeValue::n(1));
    }

    #[test]
    fn update_creates_missing_item() {
        let table = companies();
        let mut updates = Item::new();
        updates.insert("Wins".into(), 1.into());
        let item = table.update_item(&"Acme".into(), updates, None).unwrap();
        assert_eq!(item["Company"], AttributeValue::s("Acme"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn conditional_update_guards_state() {
        let table = InMemoryTable::new("prestige-matchups", KeySchema::string("VerificationCode"));
        let mut item = Item::new();
        item.insert("VerificationCode".into(), "code".into());
        item.insert("Voted".into(), "undecided".into());
        table.put_item(item).unwrap();

        let cond = Condition::equals("Voted", "undecided");
        let mut updates = Item::new();
        updates.insert("Voted".into(), "decided".into());
        table
            .update_item(&"code".into(), updates.clone(), Some(&cond))
            .unwrap();

        let err = table
            .update_item(&"code".into(), updates, Some(&cond))
            .unwrap_err();
        assert!(matches!(err, StoreError::ConditionFailed { .. }));
    }

    #[test]
    fn update_cannot_change_key() {
        let table = companies();
        table.put_item(company("Acme", 1)).unwrap();
        let mut updates = Item::new();
        updates.insert("Company".into(), "Other".into());
        let err = table.update_item(&"Acme".into(), updates, None).unwrap_err();
        assert!(matches!(err, StoreError::KeyUpdate { .. }));
    }

    // -----------------------------------------------------------------------
    // Concurrency
    // -----------------------------------------------------------------------

    #[test]
    fn concurrent_writers_keep_one_item_per_key() {
        use std::sync::Arc;
        use std::thread;

        let table = Arc::new(companies());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let table = Arc::clone(&table);
                thread::spawn(move || {
                    table.put_item(company("Acme", i)).unwrap();
                    table.put_item(company(&format!("Co{i}"), i)).unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().expect("thread should not panic");
        }
        assert_eq!(table.len(), 9);
    }

    #[test]
    fn debug_format() {
        let debug = format!("{:?}", companies());
        assert!(debug.contains("InMemoryTable"));
        assert!(debug.contains("item_count"));
    }
}
