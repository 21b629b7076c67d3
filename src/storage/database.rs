//! A named bundle of hash tables, stacks, queues and sets.
//!
//! Each collection kind has its own namespace: a stack and a hash table may
//! share a name without interfering. Collections are created on first write
//! and never removed.

use super::hashtable::HashTable;
use super::linear::{Queue, Stack};
use super::set::Set;
use super::{find_mut, find_or_insert_with, Named};
use std::fmt;

#[derive(Debug, Clone)]
pub struct Database {
    name: String,
    /// Slot count for tables and sets created in this database
    table_capacity: usize,
    hash_tables: Vec<HashTable>,
    stacks: Vec<Stack>,
    queues: Vec<Queue>,
    sets: Vec<Set>,
}

impl Database {
    pub fn new(name: impl Into<String>, table_capacity: usize) -> Self {
        Self {
            name: name.into(),
            table_capacity,
            hash_tables: Vec::new(),
            stacks: Vec::new(),
            queues: Vec::new(),
            sets: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hash_table_mut(&mut self, name: &str) -> Option<&mut HashTable> {
        find_mut(&mut self.hash_tables, name)
    }

    pub fn hash_table_or_create(&mut self, name: &str) -> &mut HashTable {
        let capacity = self.table_capacity;
        find_or_insert_with(&mut self.hash_tables, name, || {
            HashTable::with_capacity(name, capacity)
        })
    }

    pub fn stack_mut(&mut self, name: &str) -> Option<&mut Stack> {
        find_mut(&mut self.stacks, name)
    }

    pub fn stack_or_create(&mut self, name: &str) -> &mut Stack {
        find_or_insert_with(&mut self.stacks, name, || Stack::new(name))
    }

    pub fn queue_mut(&mut self, name: &str) -> Option<&mut Queue> {
        find_mut(&mut self.queues, name)
    }

    pub fn queue_or_create(&mut self, name: &str) -> &mut Queue {
        find_or_insert_with(&mut self.queues, name, || Queue::new(name))
    }

    pub fn set_mut(&mut self, name: &str) -> Option<&mut Set> {
        find_mut(&mut self.sets, name)
    }

    pub fn set_or_create(&mut self, name: &str) -> &mut Set {
        let capacity = self.table_capacity;
        find_or_insert_with(&mut self.sets, name, || Set::with_capacity(name, capacity))
    }

    /// Total number of collections of every kind.
    pub fn collection_count(&self) -> usize {
        self.hash_tables.len() + self.stacks.len() + self.queues.len() + self.sets.len()
    }
}

impl Named for Database {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Multi-line rendering used by the `dump` command.
impl fmt::Display for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Database '{}'", self.name)?;

        writeln!(f, "--- HashTables:")?;
        for table in &self.hash_tables {
            write!(f, "{} ({}/{}):", table.name(), table.len(), table.capacity())?;
            for entry in table.entries() {
                write!(f, " {}={}", entry.key, entry.value)?;
            }
            writeln!(f)?;
        }

        writeln!(f, "--- Stacks:")?;
        for stack in &self.stacks {
            write!(f, "{} ({}):", stack.name(), stack.len())?;
            for value in stack.iter() {
                write!(f, " {}", value)?;
            }
            writeln!(f)?;
        }

        writeln!(f, "--- Queues:")?;
        for queue in &self.queues {
            write!(f, "{} ({}):", queue.name(), queue.len())?;
            for value in queue.iter() {
                write!(f, " {}", value)?;
            }
            writeln!(f)?;
        }

        writeln!(f, "--- Sets:")?;
        for set in &self.sets {
            write!(f, "{} ({}):", set.name(), set.len())?;
            for member in set.members() {
                write!(f, " {}", member)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
