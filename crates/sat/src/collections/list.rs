// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Arena-backed singly linked list.
//!
//! Nodes live in a `Vec` of slots and are chained by index, so a [`Link`]
//! stays valid across unrelated insertions and removals. Freed slots are
//! recycled before the arena grows; each slot counts its reuses so a link to a
//! removed element resolves to `None` instead of the slot's new occupant.

use super::iter::{Capability, Cursor, Iterable, Link, Linked};

#[derive(Debug)]
struct Slot<T> {
    value: Option<T>,
    next: Option<usize>,
    generation: u32,
}

#[derive(Debug)]
pub struct LinkedList<T> {
    slots: Vec<Slot<T>>,
    head: Option<usize>,
    tail: Option<usize>,
    free: Vec<usize>,
    len: usize,
}

impl<T> Default for LinkedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LinkedList<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            head: None,
            tail: None,
            free: Vec::new(),
            len: 0,
        }
    }

    fn alloc(&mut self, value: T, next: Option<usize>) -> usize {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.value = Some(value);
                slot.next = next;
                index
            }
            None => {
                self.slots.push(Slot {
                    value: Some(value),
                    next,
                    generation: 0,
                });
                self.slots.len() - 1
            }
        }
    }

    fn release(&mut self, index: usize) -> Option<T> {
        let slot = &mut self.slots[index];
        let value = slot.value.take();
        slot.next = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index);
        self.len -= 1;
        value
    }

    fn link(&self, index: usize) -> Link {
        Link {
            index,
            generation: self.slots[index].generation,
        }
    }

    pub fn push_back(&mut self, value: T) -> Link {
        let index = self.alloc(value, None);
        match self.tail {
            Some(tail) => self.slots[tail].next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;
        self.link(index)
    }

    pub fn push_front(&mut self, value: T) -> Link {
        let index = self.alloc(value, self.head);
        if self.tail.is_none() {
            self.tail = Some(index);
        }
        self.head = Some(index);
        self.len += 1;
        self.link(index)
    }

    pub fn pop_front(&mut self) -> Option<T> {
        let head = self.head?;
        self.head = self.slots[head].next;
        if self.head.is_none() {
            self.tail = None;
        }
        self.release(head)
    }

    /// Unlink and return the first element matching `predicate`.
    pub fn remove_by<P>(&mut self, mut predicate: P) -> Option<T>
    where
        P: FnMut(&T) -> bool,
    {
        let mut previous: Option<usize> = None;
        let mut current = self.head;

        while let Some(index) = current {
            let next = self.slots[index].next;
            let matched = self.slots[index]
                .value
                .as_ref()
                .is_some_and(|value| predicate(value));

            if matched {
                match previous {
                    Some(prev) => self.slots[prev].next = next,
                    None => self.head = next,
                }
                if self.tail == Some(index) {
                    self.tail = previous;
                }
                return self.release(index);
            }

            previous = Some(index);
            current = next;
        }
        None
    }

    /// Element behind `link`, `None` once it has been removed.
    pub fn get(&self, link: Link) -> Option<&T> {
        self.slots
            .get(link.index)
            .filter(|slot| slot.generation == link.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> Cursor<'_, T> {
        Cursor::from_capability(Capability::Link(self))
    }
}

impl<T> Linked<T> for LinkedList<T> {
    fn first(&self) -> Option<Link> {
        self.head.map(|index| self.link(index))
    }

    fn next(&self, link: Link) -> Option<Link> {
        self.slots
            .get(link.index)
            .filter(|slot| slot.generation == link.generation)
            .and_then(|slot| slot.next)
            .map(|index| self.link(index))
    }

    fn extract(&self, link: Link) -> Option<&T> {
        self.get(link)
    }
}

impl<T> Iterable<T> for LinkedList<T> {
    fn capability(&self) -> Option<Capability<'_, T>> {
        Some(Capability::Link(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_walk() {
        let mut list = LinkedList::new();
        list.push_back(2);
        list.push_back(3);
        list.push_front(1);
        let walked: Vec<i32> = Cursor::open(&list).expect("cursor").copied().collect();
        assert_eq!(walked, vec![1, 2, 3]);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_remove_tail_then_append() {
        let mut list = LinkedList::new();
        for i in 0..3 {
            list.push_back(i);
        }
        assert_eq!(list.remove_by(|v| *v == 2), Some(2));
        list.push_back(9);
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![0, 1, 9]);
    }

    #[test]
    fn test_links_survive_unrelated_removal() {
        let mut list = LinkedList::new();
        list.push_back("a");
        let b = list.push_back("b");
        list.push_back("c");
        assert_eq!(list.pop_front(), Some("a"));
        assert_eq!(list.remove_by(|v| *v == "c"), Some("c"));
        assert_eq!(list.get(b), Some(&"b"));
        // freed slot is reused
        let d = list.push_back("d");
        assert_eq!(list.get(d), Some(&"d"));
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec!["b", "d"]);
    }

    #[test]
    fn test_stale_link_does_not_see_slot_reuse() {
        let mut list = LinkedList::new();
        let first = list.push_back(10);
        list.push_back(20);
        assert_eq!(list.pop_front(), Some(10));
        assert_eq!(list.get(first), None);

        let reused = list.push_back(30);
        assert_eq!(reused.index, first.index);
        assert_ne!(reused, first);
        assert_eq!(list.get(first), None);
        assert_eq!(list.get(reused), Some(&30));
        assert_eq!(Linked::next(&list, first), None);
    }

    #[test]
    fn test_empty_list() {
        let mut list: LinkedList<u8> = LinkedList::default();
        assert!(list.is_empty());
        assert_eq!(list.pop_front(), None);
        assert_eq!(list.iter().next(), None);
    }
}
