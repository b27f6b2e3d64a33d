//! Bounded ring
//!
//! Fixed-capacity FIFO that refuses new items when full.

use std::collections::VecDeque;

/// Fixed-capacity FIFO
///
/// A push onto a full ring hands the item back untouched; existing entries
/// are never overwritten.
#[derive(Debug)]
pub struct Ring<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> Ring<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append at the tail, or return the item if the ring is full
    pub fn push(&mut self, item: T) -> Result<(), T> {
        if self.is_full() {
            return Err(item);
        }
        self.items.push_back(item);
        Ok(())
    }

    /// Oldest item, without removing it
    pub fn peek(&self) -> Option<&T> {
        self.items.front()
    }

    /// Remove and return the oldest item
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    /// Remove every item, oldest first
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.items.drain(..)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of free slots
    pub fn free(&self) -> usize {
        self.capacity - self.items.len()
    }
}
