// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Capability-based cursor.
//!
//! A collection advertises how it can be walked through [`Iterable::capability`]:
//!
//! - **Index**: `count()` + `get_by_index(i)` (random access, e.g. [`super::Array`])
//! - **Link**: `first()` + `next(link)` + `extract(link)` (chained, e.g. [`super::LinkedList`])
//!
//! [`Cursor`] normalizes both into a single forward pass yielding borrowed
//! references. The cursor borrows its source, so the source cannot be mutated
//! while a cursor is alive.

use crate::error::{Error, Result};
use std::iter::FusedIterator;

/// Random access by position.
pub trait Indexed<T> {
    /// Number of elements currently stored.
    fn count(&self) -> usize;
    /// Element at `index`, `None` when out of range.
    fn get_by_index(&self, index: usize) -> Option<&T>;
}

/// Opaque position inside a link-addressed collection.
///
/// Carries the generation of the slot it was issued for; once that element is
/// removed the link no longer resolves, even if the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Link {
    pub(crate) index: usize,
    pub(crate) generation: u32,
}

/// Walk by following a next-link chain.
pub trait Linked<T> {
    /// Position of the first element, `None` when empty.
    fn first(&self) -> Option<Link>;
    /// Position following `link`, `None` at the tail.
    fn next(&self, link: Link) -> Option<Link>;
    /// Element stored at `link`.
    fn extract(&self, link: Link) -> Option<&T>;
}

/// Iteration capability exposed by a collection.
pub enum Capability<'a, T: 'a> {
    Index(&'a dyn Indexed<T>),
    Link(&'a dyn Linked<T>),
}

/// Collections that can be opened by a [`Cursor`].
pub trait Iterable<T> {
    /// `None` when the collection cannot be walked.
    fn capability(&self) -> Option<Capability<'_, T>>;
}

enum State<'a, T: 'a> {
    Index {
        source: &'a dyn Indexed<T>,
        position: usize,
        count: usize,
    },
    Linked {
        source: &'a dyn Linked<T>,
        next: Option<Link>,
    },
}

/// Single-pass cursor over an [`Iterable`] collection.
///
/// Index mode captures the element count when opened. Once the cursor has
/// returned `None` it keeps returning `None`.
///
/// # Examples
/// ```
/// use sat::collections::{Array, Cursor, Growth};
///
/// let mut array = Array::new(4, Growth::Static).unwrap();
/// array.add("a").unwrap();
/// array.add("b").unwrap();
///
/// let mut cursor = Cursor::open(&array).unwrap();
/// assert_eq!(cursor.next(), Some(&"a"));
/// assert_eq!(cursor.next(), Some(&"b"));
/// assert_eq!(cursor.next(), None);
/// assert_eq!(cursor.next(), None);
/// ```
pub struct Cursor<'a, T: 'a> {
    state: State<'a, T>,
    finished: bool,
}

impl<'a, T> Cursor<'a, T> {
    /// Open a cursor on `source`.
    ///
    /// # Errors
    /// `Error::UnsupportedSource` if the collection exposes no capability.
    pub fn open<S>(source: &'a S) -> Result<Self>
    where
        S: Iterable<T> + ?Sized,
    {
        match source.capability() {
            Some(capability) => Ok(Self::from_capability(capability)),
            None => Err(Error::UnsupportedSource),
        }
    }

    /// Build a cursor from an already resolved capability.
    pub fn from_capability(capability: Capability<'a, T>) -> Self {
        let state = match capability {
            Capability::Index(source) => State::Index {
                source,
                position: 0,
                count: source.count(),
            },
            Capability::Link(source) => State::Linked {
                source,
                next: source.first(),
            },
        };
        Self {
            state,
            finished: false,
        }
    }

    /// True once the end has been reached.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl<'a, T> Iterator for Cursor<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.finished {
            return None;
        }

        let item = match &mut self.state {
            State::Index {
                source,
                position,
                count,
            } => {
                let source: &'a dyn Indexed<T> = *source;
                if *position < *count {
                    let item = source.get_by_index(*position);
                    *position += 1;
                    item
                } else {
                    None
                }
            }
            State::Linked { source, next } => {
                let source: &'a dyn Linked<T> = *source;
                match next.take() {
                    Some(link) => {
                        *next = source.next(link);
                        source.extract(link)
                    }
                    None => None,
                }
            }
        };

        if item.is_none() {
            self.finished = true;
        }
        item
    }
}

impl<T> FusedIterator for Cursor<'_, T> {}
