// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Array with caller-defined uniqueness.

use super::array::{Array, Growth};
use super::iter::{Capability, Iterable};
use crate::error::{Error, Result};
use std::fmt;

/// Equality predicate deciding whether two elements are the same entry.
pub type Equality<T> = Box<dyn Fn(&T, &T) -> bool + Send + Sync>;

/// Uniqueness-enforcing collection backed by an [`Array`].
///
/// Only [`Set::add`] checks for duplicates. `update` replaces in place
/// without re-checking, so it is the caller's job not to introduce a
/// duplicate through it.
pub struct Set<T> {
    array: Array<T>,
    equals: Equality<T>,
}

impl<T> Set<T> {
    /// # Errors
    /// `Error::InvalidArgument` if `capacity` is zero.
    pub fn new<F>(capacity: usize, equals: F, growth: Growth) -> Result<Self>
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        Ok(Self {
            array: Array::new(capacity, growth)?,
            equals: Box::new(equals),
        })
    }

    /// Insert `item` unless an equal element is already present.
    ///
    /// # Errors
    /// - `Error::AlreadyPresent` if an equal element exists (set unchanged)
    /// - `Error::CapacityExceeded` if the set is static and full
    pub fn add(&mut self, item: T) -> Result<()> {
        if self.contains(&item) {
            return Err(Error::AlreadyPresent);
        }
        self.array.add(item)
    }

    /// True if an element equal to `item` is present.
    pub fn contains(&self, item: &T) -> bool {
        self.array.iter().any(|existing| (self.equals)(existing, item))
    }

    pub fn get(&self, index: usize) -> Result<&T> {
        self.array.get(index)
    }

    pub fn update(&mut self, index: usize, item: T) -> Result<T> {
        self.array.update(index, item)
    }

    pub fn remove(&mut self, index: usize) -> Result<T> {
        self.array.remove(index)
    }

    pub fn find_by<P>(&self, predicate: P) -> Option<&T>
    where
        P: FnMut(&T) -> bool,
    {
        self.array.find_by(predicate)
    }

    pub fn find_by_mut<P>(&mut self, predicate: P) -> Option<&mut T>
    where
        P: FnMut(&T) -> bool,
    {
        self.array.find_by_mut(predicate)
    }

    pub fn position_by<P>(&self, predicate: P) -> Option<usize>
    where
        P: FnMut(&T) -> bool,
    {
        self.array.position_by(predicate)
    }

    pub fn remove_by<P>(&mut self, predicate: P) -> Option<T>
    where
        P: FnMut(&T) -> bool,
    {
        self.array.remove_by(predicate)
    }

    pub fn retain<P>(&mut self, keep: P) -> usize
    where
        P: FnMut(&T) -> bool,
    {
        self.array.retain(keep)
    }

    pub fn clear(&mut self) {
        self.array.clear();
    }

    pub fn len(&self) -> usize {
        self.array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.array.capacity()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.array.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.array.iter_mut()
    }
}

impl<T> Iterable<T> for Set<T> {
    fn capability(&self) -> Option<Capability<'_, T>> {
        self.array.capability()
    }
}

impl<'a, T> IntoIterator for &'a Set<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.array.iter()
    }
}

impl<T: fmt::Debug> fmt::Debug for Set<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Set").field("array", &self.array).finish()
    }
}
