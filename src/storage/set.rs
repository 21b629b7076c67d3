//! Set of strings backed by a [`HashTable`] that maps each member to itself.

use super::error::StoreResult;
use super::hashtable::HashTable;
use super::Named;

#[derive(Debug, Clone)]
pub struct Set {
    table: HashTable,
}

impl Set {
    /// Creates an empty set whose table has `capacity` slots.
    pub fn with_capacity(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            table: HashTable::with_capacity(name, capacity),
        }
    }

    pub fn name(&self) -> &str {
        self.table.name()
    }

    /// Adds a member. Adding an existing member is a no-op.
    pub fn add(&mut self, value: impl Into<String>) -> StoreResult<()> {
        let value = value.into();
        self.table.add(value.clone(), value)
    }

    pub fn is_member(&self, value: &str) -> bool {
        self.table.contains(value)
    }

    /// Removes a member, failing with `NotFound` if it is absent.
    pub fn remove(&mut self, value: &str) -> StoreResult<()> {
        self.table.delete(value).map(|_| ())
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Iterates members in slot order.
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.table.entries().map(|entry| entry.key.as_str())
    }
}

impl Named for Set {
    fn name(&self) -> &str {
        self.table.name()
    }
}
