//! Stack and Queue
//!
//! Both structures own their elements exclusively, so a growable buffer is
//! enough: a `Vec` used from its end for the stack, and a `VecDeque` for the
//! queue. Push and pop are O(1) (amortized) in both.

use super::error::{CollectionKind, StoreError, StoreResult};
use super::Named;
use std::collections::VecDeque;

/// A named LIFO stack of strings.
#[derive(Debug, Clone, Default)]
pub struct Stack {
    name: String,
    items: Vec<String>,
}

impl Stack {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pushes a value on top of the stack.
    pub fn push(&mut self, value: impl Into<String>) {
        self.items.push(value.into());
    }

    /// Removes and returns the most recently pushed value.
    pub fn pop(&mut self) -> StoreResult<String> {
        self.items
            .pop()
            .ok_or(StoreError::EmptyCollection(CollectionKind::Stack))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates from the top of the stack down, without consuming anything.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().rev().map(String::as_str)
    }
}

impl Named for Stack {
    fn name(&self) -> &str {
        &self.name
    }
}

/// A named FIFO queue of strings.
#[derive(Debug, Clone, Default)]
pub struct Queue {
    name: String,
    items: VecDeque<String>,
}

impl Queue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: VecDeque::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends a value at the tail.
    pub fn push(&mut self, value: impl Into<String>) {
        self.items.push_back(value.into());
    }

    /// Removes and returns the oldest value.
    pub fn pop(&mut self) -> StoreResult<String> {
        self.items
            .pop_front()
            .ok_or(StoreError::EmptyCollection(CollectionKind::Queue))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates from head to tail.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }
}

impl Named for Queue {
    fn name(&self) -> &str {
        &self.name
    }
}
