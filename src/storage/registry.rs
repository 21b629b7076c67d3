//! The process-wide set of databases.
//!
//! Databases are kept in creation order and looked up by name. The registry
//! itself is not synchronized; the command layer owns the single lock that
//! guards it.

use super::database::Database;
use super::hashtable::DEFAULT_CAPACITY;
use super::{find_or_insert_with, Named};

#[derive(Debug, Clone)]
pub struct Registry {
    databases: Vec<Database>,
    /// Slot count handed to every new hash table and set
    table_capacity: usize,
}

impl Registry {
    /// Creates an empty registry whose tables get `table_capacity` slots.
    pub fn new(table_capacity: usize) -> Self {
        Self {
            databases: Vec::new(),
            table_capacity,
        }
    }

    /// Looks up a database without creating it.
    pub fn database(&self, name: &str) -> Option<&Database> {
        self.databases.iter().find(|db| db.name() == name)
    }

    /// Looks up a database, creating an empty one on first reference.
    pub fn database_or_create(&mut self, name: &str) -> &mut Database {
        let capacity = self.table_capacity;
        find_or_insert_with(&mut self.databases, name, || Database::new(name, capacity))
    }

    /// Database names in creation order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.databases.iter().map(Named::name)
    }

    pub fn len(&self) -> usize {
        self.databases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_lazily_in_order() {
        let mut registry = Registry::default();
        assert!(registry.is_empty());
        assert!(registry.database("db1").is_none());

        registry.database_or_create("db1");
        registry.database_or_create("db2");
        registry.database_or_create("db1");

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["db1", "db2"]);
    }

    #[test]
    fn test_databases_are_isolated() {
        let mut registry = Registry::new(16);
        registry
            .database_or_create("a")
            .hash_table_or_create("t")
            .add("k", "from-a")
            .unwrap();
        registry
            .database_or_create("b")
            .hash_table_or_create("t")
            .add("k", "from-b")
            .unwrap();

        let a = registry.database_or_create("a").hash_table_mut("t").unwrap();
        assert_eq!(a.get("k"), Ok("from-a"));
        assert_eq!(a.capacity(), 16);
    }
}
