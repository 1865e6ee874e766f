// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::cast_possible_truncation)] // Test parameters
#![allow(clippy::missing_panics_doc)] // Tests/examples panic on failure
#![allow(clippy::redundant_closure_for_method_calls)] // Test code clarity

//! Container properties over randomized operation sequences.

use sat::collections::{Array, Cursor, Growth, LinkedList, Set};
use sat::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const ROUNDS: usize = 64;

#[test]
fn dynamic_array_doubles_and_preserves_content() {
    let mut rng = fastrand::Rng::with_seed(0x5a7);
    for _ in 0..ROUNDS {
        let initial = rng.usize(1..8);
        let amount = rng.usize(0..200);
        let grown = Arc::new(AtomicUsize::new(0));
        let observed = Arc::clone(&grown);
        let mut array = Array::new(initial, Growth::Dynamic)
            .expect("array")
            .with_growth_notification(move |_| {
                observed.fetch_add(1, Ordering::Relaxed);
            });

        let mut expected_capacity = initial;
        let mut doublings = 0;
        for value in 0..amount {
            if array.len() == expected_capacity {
                expected_capacity *= 2;
                doublings += 1;
            }
            array.add(value as u32).expect("dynamic add never fails");
            assert_eq!(array.capacity(), expected_capacity);
        }

        assert_eq!(grown.load(Ordering::Relaxed), doublings);
        for index in 0..amount {
            assert_eq!(*array.get(index).expect("in bounds"), index as u32);
        }
    }
}

#[test]
fn static_array_rejects_when_full() {
    let mut array = Array::new(3, Growth::Static).expect("array");
    for value in 0..3 {
        array.add(value).expect("fits");
    }
    assert!(matches!(
        array.add(3),
        Err(Error::CapacityExceeded { capacity: 3 })
    ));
    assert_eq!(array.len(), 3);
    assert_eq!(array.capacity(), 3);
}

#[test]
fn array_removal_shifts_tail() {
    let mut rng = fastrand::Rng::with_seed(42);
    for _ in 0..ROUNDS {
        let len = rng.usize(1..50);
        let mut array = Array::new(len, Growth::Static).expect("array");
        for value in 0..len {
            array.add(value).expect("fits");
        }
        let before: Vec<usize> = array.iter().copied().collect();
        let index = rng.usize(0..len);

        assert_eq!(array.remove(index).expect("in bounds"), before[index]);
        assert_eq!(array.len(), len - 1);
        assert_eq!(&array.as_slice()[..index], &before[..index]);
        assert_eq!(&array.as_slice()[index..], &before[index + 1..]);
        assert!(matches!(
            array.remove(len - 1),
            Err(Error::IndexOutOfBounds { .. })
        ));
    }
}

#[test]
fn set_rejects_equal_elements() {
    let mut rng = fastrand::Rng::with_seed(7);
    let mut set = Set::new(4, |a: &u8, b: &u8| a % 16 == b % 16, Growth::Dynamic).expect("set");
    let mut classes = std::collections::HashSet::new();
    for _ in 0..500 {
        let value = rng.u8(..);
        let size = set.len();
        match set.add(value) {
            Ok(()) => assert!(classes.insert(value % 16)),
            Err(Error::AlreadyPresent) => {
                assert!(classes.contains(&(value % 16)));
                assert_eq!(set.len(), size);
            }
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
    assert_eq!(set.len(), classes.len());
}

#[test]
fn cursor_walks_both_capabilities() {
    let mut array = Array::new(2, Growth::Dynamic).expect("array");
    let mut list = LinkedList::new();
    for value in ["a", "b", "c"] {
        array.add(value).expect("add");
        list.push_back(value);
    }

    let by_index: Vec<&str> = Cursor::open(&array).expect("index cursor").copied().collect();
    let by_link: Vec<&str> = Cursor::open(&list).expect("link cursor").copied().collect();
    assert_eq!(by_index, vec!["a", "b", "c"]);
    assert_eq!(by_link, by_index);

    let mut cursor = Cursor::open(&array).expect("cursor");
    assert_eq!(cursor.by_ref().count(), 3);
    assert!(cursor.is_finished());
    assert!(cursor.next().is_none());
}
