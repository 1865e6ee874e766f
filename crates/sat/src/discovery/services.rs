// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! State shared by the scheduler handlers and the receive callback, and the
//! five scheduled protocol actions.
//!
//! Every action takes what it needs from the registry under the lock, releases
//! it, then sends.

use super::config::DiscoveryConfig;
use super::frame::Frame;
use super::registry::Registry;
use crate::config::FRAME_SIZE;
use crate::error::Result;
use crate::transport::Transport;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Discovery counters for diagnostics
#[derive(Debug, Default)]
pub struct DiscoveryMetrics {
    /// Frames decoded and dispatched
    pub frames_handled: AtomicU64,
    /// Datagrams that failed to decode
    pub frames_rejected: AtomicU64,
    /// Frames carrying the local uuid (multicast loopback)
    pub own_frames: AtomicU64,
    /// Nodes removed by the ageing sweep
    pub nodes_evicted: AtomicU64,
    /// Nodes removed by a Vanish frame
    pub nodes_vanished: AtomicU64,
}

/// Point-in-time copy of [`DiscoveryMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryStats {
    pub frames_handled: u64,
    pub frames_rejected: u64,
    pub own_frames: u64,
    pub nodes_evicted: u64,
    pub nodes_vanished: u64,
}

impl DiscoveryMetrics {
    pub fn snapshot(&self) -> DiscoveryStats {
        DiscoveryStats {
            frames_handled: self.frames_handled.load(Ordering::Relaxed),
            frames_rejected: self.frames_rejected.load(Ordering::Relaxed),
            own_frames: self.own_frames.load(Ordering::Relaxed),
            nodes_evicted: self.nodes_evicted.load(Ordering::Relaxed),
            nodes_vanished: self.nodes_vanished.load(Ordering::Relaxed),
        }
    }
}

pub(crate) struct Shared {
    pub uuid: Uuid,
    pub config: DiscoveryConfig,
    /// Address carried in local Announce frames (may be empty)
    pub address: String,
    pub registry: Mutex<Registry>,
    pub transport: Arc<dyn Transport>,
    pub metrics: DiscoveryMetrics,
    /// Set between `start` and `stop`; Announce frames only go out then
    active: AtomicBool,
    /// Serializes `active` transitions with gated announces, so no Announce
    /// follows the Vanish sent by `stop`
    announce_gate: Mutex<()>,
    announce_frame: [u8; FRAME_SIZE],
    heartbeat_frame: [u8; FRAME_SIZE],
    vanish_frame: [u8; FRAME_SIZE],
}

impl Shared {
    pub fn new(
        uuid: Uuid,
        config: DiscoveryConfig,
        address: String,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let name = config.service_name.as_str();
        let announce_frame =
            Frame::announce(uuid, name, &config.service_port, &address)?.to_bytes()?;
        let heartbeat_frame = Frame::heartbeat(uuid, name)?.to_bytes()?;
        let vanish_frame = Frame::vanish(uuid, name)?.to_bytes()?;

        Ok(Self {
            uuid,
            config,
            address,
            registry: Mutex::new(Registry::new()?),
            transport,
            metrics: DiscoveryMetrics::default(),
            active: AtomicBool::new(false),
            announce_gate: Mutex::new(()),
            announce_frame,
            heartbeat_frame,
            vanish_frame,
        })
    }

    pub fn service_name(&self) -> &str {
        &self.config.service_name
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    pub fn set_active(&self, active: bool) {
        let _gate = self.announce_gate.lock();
        self.active.store(active, Ordering::Relaxed);
    }

    /// Send one encoded frame to the group. Failures are logged, never fatal.
    pub fn broadcast(&self, bytes: &[u8], what: &str) {
        match self.transport.send(bytes) {
            Ok(_) => log::trace!("[discovery] sent {}", what),
            Err(e) => log::warn!("[discovery] failed to send {}: {}", what, e),
        }
    }

    /// Announce unless stopped.
    pub fn announce_if_active(&self) {
        let _gate = self.announce_gate.lock();
        if self.is_active() {
            self.announce();
        }
    }

    fn announce(&self) {
        log::debug!(
            "[discovery] announcing '{}' at {}:{}",
            self.service_name(),
            self.address,
            self.config.service_port
        );
        self.broadcast(&self.announce_frame, "ANNOUNCE");
    }

    pub fn heartbeat(&self) {
        self.broadcast(&self.heartbeat_frame, "HEARTBEAT");
    }

    pub fn vanish(&self) {
        log::debug!("[discovery] vanishing '{}'", self.service_name());
        self.broadcast(&self.vanish_frame, "VANISH");
    }

    /// Ask the group who provides `service_name`.
    pub fn solicit(&self, service_name: &str) {
        match Frame::interest(self.uuid, service_name).and_then(|f| f.to_bytes()) {
            Ok(bytes) => self.broadcast(&bytes, "INTEREST"),
            Err(e) => log::warn!("[discovery] cannot encode interest '{}': {}", service_name, e),
        }
    }

    /// One Interest frame per registered interest.
    pub fn solicit_interests(&self) {
        let names = self.registry.lock().interest_names();
        for name in &names {
            self.solicit(name);
        }
    }

    pub fn scan(&self) {
        let registry = self.registry.lock();
        log::trace!(
            "[discovery] scan: {} nodes, {} unresolved interests",
            registry.node_count(),
            registry.unresolved_interests()
        );
    }

    pub fn age_nodes(&self) {
        let evicted = self
            .registry
            .lock()
            .evict_stale(Instant::now(), self.config.timing.node_timeout);
        for node in &evicted {
            log::info!(
                "[discovery] node {} '{}' timed out",
                node.uuid,
                node.service_name
            );
        }
        self.metrics
            .nodes_evicted
            .fetch_add(evicted.len() as u64, Ordering::Relaxed);
    }
}
