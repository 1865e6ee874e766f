// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Generic containers and the capability-based cursor.
//!
//! | Type | Storage | Iteration capability |
//! |------|---------|----------------------|
//! | [`Array`] | contiguous, explicit capacity | index |
//! | [`Set`] | [`Array`] + equality predicate | index |
//! | [`LinkedList`] | arena of slots chained by [`Link`] | link |
//!
//! All containers are single-writer; share them behind a lock
//! (`parking_lot::Mutex`) when several threads need access.

pub mod array;
pub mod iter;
pub mod list;
pub mod set;

pub use array::{Array, Growth, GrowthCallback};
pub use iter::{Capability, Cursor, Indexed, Iterable, Link, Linked};
pub use list::LinkedList;
pub use set::{Equality, Set};
