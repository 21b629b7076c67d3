//! Fixed-Capacity Hash Table with Double Hashing
//!
//! This is the one structure in ShelfKV that does its own collision
//! resolution. Every entry lives directly in the slot array (open
//! addressing); a key whose home slot is taken walks a probe sequence whose
//! stride comes from a second, independent hash of the key.
//!
//! ## Probe Sequence
//!
//! ```text
//! home  = (sum of key bytes)            mod capacity
//! step  = (polynomial hash, base 31)    mod capacity, forced odd
//!
//! attempt k visits   (home + k * step) mod capacity,   k = 0, 1, ..., capacity - 1
//! ```
//!
//! The capacity is always a power of two. An odd step is then coprime with
//! the capacity, so the sequence visits every slot exactly once before it
//! gives up with [`StoreError::TableFull`]. The table never grows.
//!
//! ## Deletes
//!
//! Removing an entry leaves a tombstone rather than an empty slot. Lookups
//! walk past tombstones and stop at the first never-used slot, so keys that
//! were placed further along the same chain stay reachable. Inserts reuse the
//! first tombstone they passed once the key is known to be absent.

use super::error::{StoreError, StoreResult};
use super::Named;

/// Default number of slots in a freshly created table.
pub const DEFAULT_CAPACITY: usize = 512;

/// Base of the polynomial hash that yields the probe step.
const STEP_BASE: usize = 31;

/// A key/value pair held by exactly one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default)]
enum Slot {
    /// Never used. Terminates every probe that reaches it.
    #[default]
    Empty,
    /// Previously occupied. Probes walk past it.
    Deleted,
    Occupied(Entry),
}

/// The slot indices visited for one key, in order.
///
/// Holds no borrow of the table so callers can mutate slots while walking it.
#[derive(Debug, Clone, Copy)]
struct Probe {
    home: usize,
    step: usize,
    mask: usize,
    attempt: usize,
}

impl Iterator for Probe {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.attempt > self.mask {
            return None;
        }
        let index = self
            .home
            .wrapping_add(self.attempt.wrapping_mul(self.step))
            & self.mask;
        self.attempt += 1;
        Some(index)
    }
}

/// A named, fixed-capacity string table using double hashing.
///
/// # Example
///
/// ```
/// use shelfkv::storage::HashTable;
///
/// let mut table = HashTable::new("links");
/// table.add("abc", "https://example.com").unwrap();
/// assert_eq!(table.get("abc"), Ok("https://example.com"));
/// ```
#[derive(Debug, Clone)]
pub struct HashTable {
    name: String,
    slots: Vec<Slot>,
    len: usize,
}

impl HashTable {
    /// Creates an empty table with [`DEFAULT_CAPACITY`] slots.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_capacity(name, DEFAULT_CAPACITY)
    }

    /// Creates an empty table. `capacity` is rounded up to a power of two.
    pub fn with_capacity(name: impl Into<String>, capacity: usize) -> Self {
        let capacity = capacity.max(1).next_power_of_two();
        Self {
            name: name.into(),
            slots: vec![Slot::Empty; capacity],
            len: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of slots. Fixed for the lifetime of the table.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts `key`, or overwrites its value if already present.
    ///
    /// Fails with [`StoreError::TableFull`] only when the key is absent and
    /// no slot on its probe sequence is free.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) -> StoreResult<()> {
        let key = key.into();
        let value = value.into();
        let mut vacant = None;

        for index in self.probe(&key) {
            match &mut self.slots[index] {
                Slot::Occupied(entry) if entry.key == key => {
                    entry.value = value;
                    return Ok(());
                }
                Slot::Occupied(_) => {}
                Slot::Deleted => {
                    vacant.get_or_insert(index);
                }
                Slot::Empty => {
                    vacant.get_or_insert(index);
                    break;
                }
            }
        }

        let index = vacant.ok_or(StoreError::TableFull)?;
        self.slots[index] = Slot::Occupied(Entry { key, value });
        self.len += 1;
        Ok(())
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> StoreResult<&str> {
        let index = self.find(key).ok_or(StoreError::NotFound)?;
        match &self.slots[index] {
            Slot::Occupied(entry) => Ok(&entry.value),
            _ => Err(StoreError::NotFound),
        }
    }

    /// Returns true if `key` has a live entry.
    pub fn contains(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    /// Removes `key`, returning the value it held.
    pub fn delete(&mut self, key: &str) -> StoreResult<String> {
        let index = self.find(key).ok_or(StoreError::NotFound)?;
        match std::mem::replace(&mut self.slots[index], Slot::Deleted) {
            Slot::Occupied(entry) => {
                self.len -= 1;
                Ok(entry.value)
            }
            other => {
                self.slots[index] = other;
                Err(StoreError::NotFound)
            }
        }
    }

    /// Iterates live entries in slot order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Occupied(entry) => Some(entry),
            _ => None,
        })
    }

    /// Locates the slot holding `key`.
    fn find(&self, key: &str) -> Option<usize> {
        for index in self.probe(key) {
            match &self.slots[index] {
                Slot::Empty => return None,
                Slot::Occupied(entry) if entry.key == key => return Some(index),
                _ => {}
            }
        }
        None
    }

    fn probe(&self, key: &str) -> Probe {
        Probe {
            home: self.home_index(key),
            step: self.step(key),
            mask: self.capacity() - 1,
            attempt: 0,
        }
    }

    /// Primary hash: sum of the key's bytes.
    fn home_index(&self, key: &str) -> usize {
        let capacity = self.capacity();
        key.bytes()
            .fold(0, |hash, byte| (hash + byte as usize) % capacity)
    }

    /// Secondary hash: polynomial rolling hash, forced odd (never zero).
    fn step(&self, key: &str) -> usize {
        let capacity = self.capacity();
        let hash = key
            .bytes()
            .fold(0, |hash, byte| (hash * STEP_BASE + byte as usize) % capacity);
        hash | 1
    }
}

impl Named for HashTable {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_get() {
        let mut table = HashTable::new("t");
        table.add("foo", "bar").unwrap();
        assert_eq!(table.get("foo"), Ok("bar"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_get_missing() {
        let table = HashTable::new("t");
        assert_eq!(table.get("nope"), Err(StoreError::NotFound));
    }

    #[test]
    fn test_overwrite_keeps_len() {
        let mut table = HashTable::new("t");
        table.add("k", "v1").unwrap();
        table.add("k", "v2").unwrap();
        assert_eq!(table.get("k"), Ok("v2"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_delete() {
        let mut table = HashTable::new("t");
        table.add("k", "v").unwrap();
        assert_eq!(table.delete("k"), Ok("v".to_string()));
        assert_eq!(table.get("k"), Err(StoreError::NotFound));
        assert_eq!(table.delete("k"), Err(StoreError::NotFound));
        assert!(table.is_empty());
    }

    #[test]
    fn test_capacity_rounds_to_power_of_two() {
        assert_eq!(HashTable::with_capacity("t", 500).capacity(), 512);
        assert_eq!(HashTable::with_capacity("t", 0).capacity(), 1);
        assert_eq!(HashTable::new("t").capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn test_collision_resolved_by_probing() {
        // Anagrams share a byte sum, so they share a home slot.
        let mut table = HashTable::new("t");
        assert_eq!(table.home_index("ab"), table.home_index("ba"));

        table.add("ab", "first").unwrap();
        table.add("ba", "second").unwrap();

        assert_eq!(table.get("ab"), Ok("first"));
        assert_eq!(table.get("ba"), Ok("second"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_delete_keeps_chain_reachable() {
        let mut table = HashTable::new("t");
        table.add("abc", "1").unwrap();
        table.add("bca", "2").unwrap();
        table.add("cab", "3").unwrap();

        table.delete("abc").unwrap();
        assert_eq!(table.get("bca"), Ok("2"));
        assert_eq!(table.get("cab"), Ok("3"));

        // Re-adding a key further down the chain must overwrite, not duplicate.
        table.add("cab", "33").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("cab"), Ok("33"));
        assert_eq!(table.entries().filter(|e| e.key == "cab").count(), 1);

        // The tombstone is reused by a fresh key.
        table.add("abc", "11").unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.get("abc"), Ok("11"));
    }

    #[test]
    fn test_probe_visits_every_slot() {
        let table = HashTable::with_capacity("t", 64);
        for key in ["a", "zz", "hello", "\u{0}", "ba"] {
            let mut seen: Vec<usize> = table.probe(key).collect();
            seen.sort_unstable();
            seen.dedup();
            assert_eq!(seen.len(), 64, "probe for {:?} skipped slots", key);
        }
    }

    #[test]
    fn test_table_full() {
        let mut table = HashTable::with_capacity("t", 4);
        for i in 0..4 {
            table.add(format!("key{}", i), "v").unwrap();
        }
        assert_eq!(table.add("another", "v"), Err(StoreError::TableFull));

        // Overwrites still succeed on a full table.
        table.add("key2", "updated").unwrap();
        assert_eq!(table.get("key2"), Ok("updated"));
        assert_eq!(table.len(), 4);

        // Freeing a slot makes room again.
        table.delete("key0").unwrap();
        table.add("another", "v").unwrap();
        assert_eq!(table.get("another"), Ok("v"));
    }

    #[test]
    fn test_many_keys() {
        let mut table = HashTable::new("t");
        for i in 0..400 {
            table.add(format!("key-{}", i), format!("value-{}", i)).unwrap();
        }
        assert_eq!(table.len(), 400);
        for i in 0..400 {
            assert_eq!(
                table.get(&format!("key-{}", i)),
                Ok(format!("value-{}", i).as_str())
            );
        }
        assert_eq!(table.entries().count(), 400);
    }

    #[test]
    fn test_empty_key() {
        let mut table = HashTable::new("t");
        table.add("", "empty").unwrap();
        assert_eq!(table.get(""), Ok("empty"));
    }
}
