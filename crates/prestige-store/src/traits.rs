use prestige_types::{KeySchema, StoreDefinition, Throughput};

use crate::error::StoreResult;
use crate::provisioner::{TableDescription, TeardownOutcome};
use crate::value::{AttributeValue, Condition, Item};

/// A provisioned key-value table.
///
/// All implementations must satisfy these invariants:
/// - At most one item exists per partition key value.
/// - Writes reject items whose key attribute is missing or mistyped.
/// - A failed condition leaves the item untouched.
/// - Concurrent reads are always safe.
pub trait TableStore: Send + Sync {
    /// Physical table name.
    fn name(&self) -> &str;

    /// The partition key this table was created with.
    fn key_schema(&self) -> &KeySchema;

    /// Read the item stored under `key`.
    fn get_item(&self, key: &AttributeValue) -> StoreResult<Option<Item>>;

    /// Insert or replace an item. The key is taken from the item itself.
    fn put_item(&self, item: Item) -> StoreResult<()>;

    /// Insert an item only if `condition` holds against the current one.
    fn put_item_if(&self, item: Item, condition: &Condition) -> StoreResult<()>;

    /// Set attributes on the item under `key`, creating it if absent.
    ///
    /// Returns the item as it is after the update.
    fn update_item(
        &self,
        key: &AttributeValue,
        updates: Item,
        condition: Option<&Condition>,
    ) -> StoreResult<Item>;

    /// Remove the item under `key`. Returns the removed item, if any.
    fn delete_item(&self, key: &AttributeValue) -> StoreResult<Option<Item>>;

    /// All items, ordered by key.
    fn scan(&self) -> StoreResult<Vec<Item>>;

    /// Number of items.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Turns store declarations into tables.
pub trait StoreProvisioner: Send + Sync {
    /// Verify that `definition` can be provisioned without a schema conflict.
    ///
    /// Never creates or mutates anything.
    fn check(&self, definition: &StoreDefinition) -> StoreResult<()>;

    /// Create the table, or reconcile an existing one with the same key schema.
    fn provision(&self, definition: &StoreDefinition) -> StoreResult<std::sync::Arc<dyn TableStore>>;

    /// Current state of a table, if it exists.
    fn describe(&self, name: &str) -> Option<TableDescription>;

    /// Apply the definition's retention policy on stack teardown.
    fn teardown(&self, definition: &StoreDefinition) -> StoreResult<TeardownOutcome>;

    /// Total billable capacity currently allocated.
    fn provisioned_capacity(&self) -> Throughput;
}
