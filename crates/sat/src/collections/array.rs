// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Growable array with an explicit logical capacity.
//!
//! Unlike `Vec`, the capacity is part of the contract: a [`Growth::Static`]
//! array refuses insertions once full, a [`Growth::Dynamic`] array doubles its
//! capacity and notifies an optional observer.

use super::iter::{Capability, Indexed, Iterable};
use crate::error::{Error, Result};
use std::fmt;

/// Behaviour of [`Array::add`] when the array is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Growth {
    /// Insertion fails with `Error::CapacityExceeded`.
    Static,
    /// Capacity doubles before the insertion.
    #[default]
    Dynamic,
}

/// Observer invoked with the new capacity after a dynamic growth.
pub type GrowthCallback = Box<dyn FnMut(usize) + Send>;

/// Contiguous storage with order-preserving removal.
///
/// Invariant: `len() <= capacity()`.
pub struct Array<T> {
    items: Vec<T>,
    capacity: usize,
    growth: Growth,
    on_grow: Option<GrowthCallback>,
}

impl<T> Array<T> {
    /// Create an empty array.
    ///
    /// # Errors
    /// `Error::InvalidArgument` if `capacity` is zero.
    pub fn new(capacity: usize, growth: Growth) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidArgument(
                "array capacity must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            items: Vec::with_capacity(capacity),
            capacity,
            growth,
            on_grow: None,
        })
    }

    /// Register an observer called after each capacity doubling.
    #[must_use]
    pub fn with_growth_notification<F>(mut self, callback: F) -> Self
    where
        F: FnMut(usize) + Send + 'static,
    {
        self.on_grow = Some(Box::new(callback));
        self
    }

    /// Append `item`.
    ///
    /// # Errors
    /// `Error::CapacityExceeded` if the array is static and full.
    pub fn add(&mut self, item: T) -> Result<()> {
        if self.items.len() >= self.capacity {
            match self.growth {
                Growth::Static => {
                    return Err(Error::CapacityExceeded {
                        capacity: self.capacity,
                    })
                }
                Growth::Dynamic => self.grow(),
            }
        }
        self.items.push(item);
        Ok(())
    }

    fn grow(&mut self) {
        let new_capacity = self.capacity.saturating_mul(2);
        self.items
            .reserve_exact(new_capacity.saturating_sub(self.items.len()));
        log::trace!(
            "[array] capacity {} -> {} (len={})",
            self.capacity,
            new_capacity,
            self.items.len()
        );
        self.capacity = new_capacity;
        if let Some(on_grow) = self.on_grow.as_mut() {
            on_grow(new_capacity);
        }
    }

    pub fn get(&self, index: usize) -> Result<&T> {
        let len = self.items.len();
        self.items
            .get(index)
            .ok_or(Error::IndexOutOfBounds { index, len })
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut T> {
        let len = self.items.len();
        self.items
            .get_mut(index)
            .ok_or(Error::IndexOutOfBounds { index, len })
    }

    /// Replace the element at `index`, returning the previous one.
    pub fn update(&mut self, index: usize, item: T) -> Result<T> {
        let slot = self.get_mut(index)?;
        Ok(std::mem::replace(slot, item))
    }

    /// Remove the element at `index`; later elements shift down by one.
    pub fn remove(&mut self, index: usize) -> Result<T> {
        let len = self.items.len();
        if index >= len {
            return Err(Error::IndexOutOfBounds { index, len });
        }
        Ok(self.items.remove(index))
    }

    /// First element (lowest index) matching `predicate`.
    pub fn find_by<P>(&self, predicate: P) -> Option<&T>
    where
        P: FnMut(&T) -> bool,
    {
        self.position_by(predicate).map(|i| &self.items[i])
    }

    /// Mutable variant of [`Array::find_by`].
    pub fn find_by_mut<P>(&mut self, predicate: P) -> Option<&mut T>
    where
        P: FnMut(&T) -> bool,
    {
        let index = self.position_by(predicate)?;
        self.items.get_mut(index)
    }

    pub fn position_by<P>(&self, mut predicate: P) -> Option<usize>
    where
        P: FnMut(&T) -> bool,
    {
        self.items.iter().position(|item| predicate(item))
    }

    /// Remove and return the first element matching `predicate`.
    pub fn remove_by<P>(&mut self, predicate: P) -> Option<T>
    where
        P: FnMut(&T) -> bool,
    {
        self.position_by(predicate).map(|i| self.items.remove(i))
    }

    /// Remove every element matching `predicate`, returning how many were dropped.
    pub fn retain<P>(&mut self, mut keep: P) -> usize
    where
        P: FnMut(&T) -> bool,
    {
        let before = self.items.len();
        self.items.retain(|item| keep(item));
        before - self.items.len()
    }

    /// Drop all elements. Capacity is kept.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn growth(&self) -> Growth {
        self.growth
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }
}

impl<T> Indexed<T> for Array<T> {
    fn count(&self) -> usize {
        self.items.len()
    }

    fn get_by_index(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }
}

impl<T> Iterable<T> for Array<T> {
    fn capability(&self) -> Option<Capability<'_, T>> {
        Some(Capability::Index(self))
    }
}

impl<'a, T> IntoIterator for &'a Array<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: fmt::Debug> fmt::Debug for Array<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Array")
            .field("items", &self.items)
            .field("capacity", &self.capacity)
            .field("growth", &self.growth)
            .field("on_grow", &self.on_grow.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::Cursor;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            Array::<u32>::new(0, Growth::Dynamic),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_static_array_refuses_when_full() {
        let mut array = Array::new(2, Growth::Static).expect("array");
        array.add(1).expect("add");
        array.add(2).expect("add");
        assert!(matches!(
            array.add(3),
            Err(Error::CapacityExceeded { capacity: 2 })
        ));
        assert_eq!(array.len(), 2);
        assert_eq!(array.capacity(), 2);
    }

    #[test]
    fn test_dynamic_growth_doubles_and_notifies() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut array = Array::new(2, Growth::Dynamic)
            .expect("array")
            .with_growth_notification(move |cap| sink.lock().expect("sink").push(cap));

        for i in 0..9 {
            array.add(i).expect("add");
        }

        assert_eq!(array.capacity(), 16);
        assert_eq!(*seen.lock().expect("seen"), vec![4, 8, 16]);
        for i in 0..9 {
            assert_eq!(*array.get(i).expect("get"), i);
        }
    }

    #[test]
    fn test_remove_shifts_tail() {
        let mut array = Array::new(8, Growth::Static).expect("array");
        for c in ['a', 'b', 'c', 'd'] {
            array.add(c).expect("add");
        }
        assert_eq!(array.remove(1).expect("remove"), 'b');
        assert_eq!(array.as_slice(), &['a', 'c', 'd']);
        assert!(matches!(
            array.remove(3),
            Err(Error::IndexOutOfBounds { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_update_and_get_bounds() {
        let mut array = Array::new(2, Growth::Static).expect("array");
        array.add(10).expect("add");
        assert_eq!(array.update(0, 11).expect("update"), 10);
        assert_eq!(*array.get(0).expect("get"), 11);
        assert!(array.update(1, 12).is_err());
        assert!(array.get(5).is_err());
    }

    #[test]
    fn test_find_and_remove_by_lowest_index() {
        let mut array = Array::new(4, Growth::Static).expect("array");
        for (k, v) in [(1, "x"), (2, "y"), (1, "z")] {
            array.add((k, v)).expect("add");
        }
        assert_eq!(array.find_by(|e| e.0 == 1), Some(&(1, "x")));
        assert_eq!(array.remove_by(|e| e.0 == 1), Some((1, "x")));
        assert_eq!(array.find_by(|e| e.0 == 1), Some(&(1, "z")));
        assert_eq!(array.remove_by(|e| e.0 == 7), None);
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut array = Array::new(1, Growth::Dynamic).expect("array");
        for i in 0..5 {
            array.add(i).expect("add");
        }
        let capacity = array.capacity();
        array.clear();
        assert!(array.is_empty());
        assert_eq!(array.capacity(), capacity);
    }

    #[test]
    fn test_cursor_over_array() {
        let mut array = Array::new(3, Growth::Static).expect("array");
        for i in [5, 6, 7] {
            array.add(i).expect("add");
        }
        let collected: Vec<i32> = Cursor::open(&array).expect("cursor").copied().collect();
        assert_eq!(collected, vec![5, 6, 7]);
    }
}
