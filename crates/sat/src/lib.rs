// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # SAT - toolkit core
//!
//! Generic containers, a named-timer scheduler and a decentralized UDP multicast
//! peer-discovery protocol built on top of them.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sat::discovery::{Discovery, DiscoveryConfig};
//! use std::time::Duration;
//!
//! fn main() -> sat::Result<()> {
//!     let config = DiscoveryConfig::new("api", "8080").address("10.0.0.7");
//!     let mut discovery = Discovery::open(config)?;
//!     discovery.add_interest("db")?;
//!     discovery.start()?;
//!
//!     std::thread::sleep(Duration::from_secs(2));
//!     if let Some(info) = discovery.get_service_info("db") {
//!         println!("db is at {}:{}", info.address, info.port);
//!     }
//!
//!     discovery.stop()
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                         Discovery                                    |
//! |   announce | heartbeat | interest | scan | ageing  (scheduled)       |
//! |   frame handlers (receive thread) -> Registry { interests, nodes }   |
//! +---------------------------------------------------------------------+
//! |        Scheduler (sat-scheduler)      |   Transport (sat-udp-rx)      |
//! +---------------------------------------------------------------------+
//! |             Array | Set | LinkedList | Cursor                        |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Modules Overview
//!
//! - [`collections`] - Array, Set, LinkedList and the capability-based cursor
//! - [`scheduler`] - periodic and one-shot named timers on a dedicated thread
//! - [`transport`] - UDP multicast endpoint and intra-process bus
//! - [`discovery`] - frame codec, node registry and the protocol engine
//! - [`config`] - protocol constants and defaults

pub mod collections;
pub mod config;
pub mod discovery;
pub mod error;
pub mod scheduler;
pub mod transport;

pub use collections::{Array, Cursor, Growth, LinkedList, Set};
pub use discovery::{Discovery, DiscoveryConfig, ServiceInfo};
pub use error::{Error, Result};
pub use scheduler::{Event, EventKind, Scheduler, SchedulerConfig};
