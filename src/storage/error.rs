//! Errors raised by the collection library.
//!
//! The `Display` text of each variant is exactly the line a client receives,
//! so changing a message here changes the wire protocol.

use std::fmt;
use thiserror::Error;

/// The four structure types a database can hold, each independently named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    HashTable,
    Stack,
    Queue,
    Set,
}

impl CollectionKind {
    /// Returns the name used for this kind in replies and dumps.
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::HashTable => "Hashtable",
            CollectionKind::Stack => "Stack",
            CollectionKind::Queue => "Queue",
            CollectionKind::Set => "Set",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data-level failures. These never leave the connection that caused them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Key (or set member) is absent.
    #[error("Key not found")]
    NotFound,

    /// Pop on a stack or queue with no elements left.
    #[error("{0} is empty")]
    EmptyCollection(CollectionKind),

    /// Every slot on the probe sequence is taken by another key.
    #[error("Table is full")]
    TableFull,

    /// A read verb named a collection that was never written to.
    #[error("{0} doesn't exist")]
    MissingCollection(CollectionKind),
}

/// Result type for collection operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_texts() {
        assert_eq!(StoreError::NotFound.to_string(), "Key not found");
        assert_eq!(
            StoreError::EmptyCollection(CollectionKind::Stack).to_string(),
            "Stack is empty"
        );
        assert_eq!(
            StoreError::MissingCollection(CollectionKind::HashTable).to_string(),
            "Hashtable doesn't exist"
        );
        assert_eq!(StoreError::TableFull.to_string(), "Table is full");
    }
}
