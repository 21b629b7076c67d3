//! Storage Module
//!
//! The collection library and the containers that hold it.
//!
//! ## Layout
//!
//! ```text
//! Registry
//!  └── Database "db1"
//!       ├── HashTables  name -> HashTable   (open addressing, double hashing)
//!       ├── Stacks      name -> Stack       (LIFO)
//!       ├── Queues      name -> Queue       (FIFO)
//!       └── Sets        name -> Set         (HashTable of member -> member)
//! ```
//!
//! Nothing in this module locks. The whole [`Registry`] sits behind one mutex
//! owned by the command layer, so every operation here runs with exclusive
//! access.
//!
//! ## Example
//!
//! ```
//! use shelfkv::storage::Registry;
//!
//! let mut registry = Registry::default();
//! let db = registry.database_or_create("db1");
//!
//! db.hash_table_or_create("table1").add("foo", "bar").unwrap();
//! assert_eq!(db.hash_table_mut("table1").unwrap().get("foo"), Ok("bar"));
//!
//! db.stack_or_create("s1").push("a");
//! db.stack_or_create("s1").push("b");
//! assert_eq!(db.stack_mut("s1").unwrap().pop(), Ok("b".to_string()));
//! ```

pub mod database;
pub mod error;
pub mod hashtable;
pub mod linear;
pub mod registry;
pub mod set;

// Re-export commonly used types
pub use database::Database;
pub use error::{CollectionKind, StoreError, StoreResult};
pub use hashtable::{Entry, HashTable, DEFAULT_CAPACITY};
pub use linear::{Queue, Stack};
pub use registry::Registry;
pub use set::Set;

/// Anything stored under a name inside its parent container.
pub(crate) trait Named {
    fn name(&self) -> &str;
}

fn find_mut<'a, T: Named>(items: &'a mut [T], name: &str) -> Option<&'a mut T> {
    items.iter_mut().find(|item| item.name() == name)
}

fn find_or_insert_with<'a, T: Named>(
    items: &'a mut Vec<T>,
    name: &str,
    make: impl FnOnce() -> T,
) -> &'a mut T {
    let index = match items.iter().position(|item| item.name() == name) {
        Some(index) => index,
        None => {
            items.push(make());
            items.len() - 1
        }
    };
    &mut items[index]
}
