// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Decentralized service discovery over UDP multicast.
//!
//! Each instance provides one named service and may register interest in any
//! number of remote services. Peers learn about each other through four frame
//! types exchanged on a shared multicast group:
//!
//! | Frame | Sent | Receiver effect |
//! |---|---|---|
//! | Announce | once after `start`, and in reply to Interest | track the node (if interested) |
//! | Heartbeat | every `heartbeat_period` | refresh the node's `last_seen` |
//! | Interest | every `interest_period`, per interest | providers reply with Announce |
//! | Vanish | on `stop` | drop the node immediately |
//!
//! Nodes silent for longer than `node_timeout` are evicted by the ageing
//! sweep.
//!
//! # Threads
//! ```text
//! sat-scheduler : announce | heartbeat | interest | scan | ageing
//! sat-udp-rx    : handle_datagram()
//!          both -> Mutex<Registry { interests, nodes }>  (never held across send)
//! ```
//!
//! # Lifecycle
//! `Opened -> Started <-> Stopped -> Closed`

pub mod config;
pub mod frame;
mod handlers;
mod registry;
mod services;
mod wire;

pub use config::{DiscoveryConfig, DiscoveryTiming};
pub use frame::{Frame, FrameType, Payload};
pub use registry::{Node, ServiceInfo};
pub use services::{DiscoveryMetrics, DiscoveryStats};
pub use uuid::Uuid;

use crate::config::{
    EVENT_AGEING, EVENT_ANNOUNCE, EVENT_HEARTBEAT, EVENT_INTEREST, EVENT_SCAN, SERVICE_NAME_FIELD,
};
use crate::error::{Error, Result};
use crate::scheduler::{Event, Scheduler};
use crate::transport::multicast::primary_interface_ip;
use crate::transport::{ReceiveCallback, Transport, TransportStats, UdpMulticastTransport};
use services::Shared;
use std::net::SocketAddr;
use std::sync::{Arc, Weak};
use std::thread;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryState {
    Opened,
    Started,
    Stopped,
    Closed,
}

/// One discovery participant.
///
/// The receive path is active from `open` on, so nodes are tracked even before
/// `start`; scheduled actions and replies to Interest frames only run while
/// started.
pub struct Discovery {
    shared: Arc<Shared>,
    scheduler: Scheduler,
    state: DiscoveryState,
}

impl Discovery {
    /// Open on the multicast group described by `config.multicast`.
    ///
    /// # Errors
    /// Configuration errors from [`DiscoveryConfig::validate`],
    /// `Error::BindFailed` / `Error::MulticastJoinFailed` from the socket layer.
    pub fn open(config: DiscoveryConfig) -> Result<Self> {
        config.validate()?;
        let transport = UdpMulticastTransport::open(&config.multicast)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Open on any [`Transport`], e.g. an [`crate::transport::IntraProcessBus`]
    /// endpoint.
    pub fn with_transport(config: DiscoveryConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;

        let uuid = Uuid::new_v4();
        let address = resolve_address(&config);
        let scheduler = Scheduler::open(config.scheduler)?;
        let shared = Arc::new(Shared::new(uuid, config, address, Arc::clone(&transport))?);

        register_periodic_actions(&scheduler, &shared)?;

        let weak: Weak<Shared> = Arc::downgrade(&shared);
        let callback: ReceiveCallback = Arc::new(move |data: &[u8], src: SocketAddr| {
            if let Some(shared) = weak.upgrade() {
                handlers::handle_datagram(&shared, data, src);
            }
        });
        transport.listen(callback)?;

        log::info!(
            "[discovery] opened '{}' as {} (advertised address '{}')",
            shared.service_name(),
            uuid,
            shared.address
        );

        Ok(Self {
            shared,
            scheduler,
            state: DiscoveryState::Opened,
        })
    }

    /// Register interest in `service_name`.
    ///
    /// Returns `Ok(false)` if the interest was already registered.
    ///
    /// # Errors
    /// `Error::InvalidState` after close; `Error::InvalidArgument` /
    /// `Error::FieldTooLong` for an empty or oversized name.
    pub fn add_interest(&self, service_name: &str) -> Result<bool> {
        self.ensure_open()?;
        config::validate_field("service_name", service_name, SERVICE_NAME_FIELD)?;
        let added = self.shared.registry.lock().add_interest(service_name)?;
        if added {
            log::debug!("[discovery] interest in '{}' registered", service_name);
        }
        Ok(added)
    }

    /// Drop interest in `service_name`. Nodes already tracked for it stay
    /// until they vanish or age out.
    pub fn remove_interest(&self, service_name: &str) -> bool {
        self.shared.registry.lock().remove_interest(service_name)
    }

    /// Address and port of the first known node providing `service_name`.
    pub fn get_service_info(&self, service_name: &str) -> Option<ServiceInfo> {
        self.shared.registry.lock().service_info(service_name)
    }

    /// Snapshot of every tracked node.
    pub fn nodes(&self) -> Vec<Node> {
        self.shared.registry.lock().nodes()
    }

    /// Registered interest names.
    pub fn interests(&self) -> Vec<String> {
        self.shared.registry.lock().interest_names()
    }

    /// Begin the scheduled protocol actions. The first Announce goes out after
    /// `timing.announce_delay`.
    ///
    /// # Errors
    /// `Error::InvalidState` if already started or closed.
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            DiscoveryState::Started => {
                return Err(Error::InvalidState("discovery already started".to_string()))
            }
            DiscoveryState::Closed => {
                return Err(Error::InvalidState("discovery is closed".to_string()))
            }
            DiscoveryState::Opened | DiscoveryState::Stopped => {}
        }

        // a previous start may have been stopped before the announce fired
        self.scheduler.remove_event(EVENT_ANNOUNCE);
        let shared = Arc::clone(&self.shared);
        self.scheduler.add_event(Event::one_shot(
            EVENT_ANNOUNCE,
            self.shared.config.timing.announce_delay,
            move || shared.announce_if_active(),
        ))?;

        self.shared.set_active(true);
        if let Err(e) = self.scheduler.start() {
            self.shared.set_active(false);
            return Err(e);
        }
        self.state = DiscoveryState::Started;
        log::debug!("[discovery] '{}' started", self.shared.service_name());
        Ok(())
    }

    /// Broadcast Vanish, halt the scheduled actions and give the datagram
    /// `timing.vanish_flush` to leave.
    ///
    /// # Errors
    /// `Error::InvalidState` if not started.
    pub fn stop(&mut self) -> Result<()> {
        if self.state != DiscoveryState::Started {
            return Err(Error::InvalidState("discovery not started".to_string()));
        }
        self.shared.set_active(false);
        self.shared.vanish();
        self.scheduler.stop();
        thread::sleep(self.shared.config.timing.vanish_flush);
        self.state = DiscoveryState::Stopped;
        log::debug!("[discovery] '{}' stopped", self.shared.service_name());
        Ok(())
    }

    /// Stop if started, drop the scheduler and shut the transport down.
    pub fn close(&mut self) {
        if self.state == DiscoveryState::Closed {
            return;
        }
        if self.state == DiscoveryState::Started {
            let _ = self.stop();
        }
        self.scheduler.close();
        self.shared.transport.shutdown();
        self.state = DiscoveryState::Closed;
        log::debug!("[discovery] '{}' closed", self.shared.service_name());
    }

    /// Random identity carried in every frame sent by this instance.
    pub fn uuid(&self) -> Uuid {
        self.shared.uuid
    }

    pub fn service_name(&self) -> &str {
        self.shared.service_name()
    }

    /// Address carried in local Announce frames (empty if none could be
    /// resolved; peers then use the datagram source).
    pub fn advertised_address(&self) -> &str {
        &self.shared.address
    }

    pub fn state(&self) -> DiscoveryState {
        self.state
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.shared.config
    }

    pub fn metrics(&self) -> DiscoveryStats {
        self.shared.metrics.snapshot()
    }

    pub fn transport_metrics(&self) -> TransportStats {
        self.shared.transport.metrics().snapshot()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state == DiscoveryState::Closed {
            return Err(Error::InvalidState("discovery is closed".to_string()));
        }
        Ok(())
    }
}

impl Drop for Discovery {
    fn drop(&mut self) {
        self.close();
    }
}

fn register_periodic_actions(scheduler: &Scheduler, shared: &Arc<Shared>) -> Result<()> {
    let timing = shared.config.timing;

    let s = Arc::clone(shared);
    scheduler.add_event(Event::periodic(EVENT_HEARTBEAT, timing.heartbeat_period, move || {
        s.heartbeat()
    }))?;
    let s = Arc::clone(shared);
    scheduler.add_event(Event::periodic(EVENT_INTEREST, timing.interest_period, move || {
        s.solicit_interests()
    }))?;
    let s = Arc::clone(shared);
    scheduler.add_event(Event::periodic(EVENT_SCAN, timing.scan_period, move || {
        s.scan()
    }))?;
    let s = Arc::clone(shared);
    scheduler.add_event(Event::periodic(EVENT_AGEING, timing.ageing_period, move || {
        s.age_nodes()
    }))?;
    Ok(())
}

/// Configured address, else the primary IPv4 interface, else empty.
fn resolve_address(config: &DiscoveryConfig) -> String {
    if let Some(address) = &config.address {
        return address.clone();
    }
    match primary_interface_ip() {
        Some(ip) => ip.to_string(),
        None => {
            log::warn!("[discovery] no IPv4 interface found, announcing without address");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::IntraProcessBus;
    use std::time::Duration;

    fn quick(name: &str, port: &str) -> DiscoveryConfig {
        DiscoveryConfig::new(name, port)
            .address("127.0.0.1")
            .interest_period(Duration::from_millis(20))
    }

    #[test]
    fn test_lifecycle_transitions() {
        let bus = IntraProcessBus::new();
        let mut discovery =
            Discovery::with_transport(quick("api", "80"), bus.endpoint()).expect("open");
        assert_eq!(discovery.state(), DiscoveryState::Opened);
        assert!(matches!(discovery.stop(), Err(Error::InvalidState(_))));

        discovery.start().expect("start");
        assert!(matches!(discovery.start(), Err(Error::InvalidState(_))));
        discovery.stop().expect("stop");
        discovery.start().expect("restart");
        discovery.close();

        assert_eq!(discovery.state(), DiscoveryState::Closed);
        assert!(discovery.start().is_err());
        assert!(discovery.add_interest("db").is_err());
        assert!(bus.is_empty());
    }

    #[test]
    fn test_add_interest_validation() {
        let bus = IntraProcessBus::new();
        let discovery = Discovery::with_transport(quick("api", "80"), bus.endpoint()).expect("open");
        assert!(discovery.add_interest("db").expect("add"));
        assert!(!discovery.add_interest("db").expect("idempotent"));
        assert!(discovery.add_interest("").is_err());
        assert!(discovery
            .add_interest(&"x".repeat(SERVICE_NAME_FIELD))
            .is_err());
        assert_eq!(discovery.interests(), vec!["db".to_string()]);
        assert!(discovery.remove_interest("db"));
    }

    #[test]
    fn test_invalid_config_rejected_before_transport() {
        let bus = IntraProcessBus::new();
        let result = Discovery::with_transport(DiscoveryConfig::new("api", ""), bus.endpoint());
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_unrunnable_timing_rejected_at_open() {
        let bus = IntraProcessBus::new();
        let flooding = quick("api", "80").heartbeat_period(Duration::ZERO);
        assert!(matches!(
            Discovery::with_transport(flooding, bus.endpoint()),
            Err(Error::InvalidArgument(_))
        ));

        let cramped = quick("api", "80").scheduler(crate::scheduler::SchedulerConfig::bounded(4));
        assert!(matches!(
            Discovery::with_transport(cramped, bus.endpoint()),
            Err(Error::InvalidArgument(_))
        ));
        assert!(bus.is_empty());
    }

    #[test]
    fn test_peers_find_each_other() {
        let bus = IntraProcessBus::new();
        let mut db = Discovery::with_transport(
            quick("db", "5432").address("10.0.0.5"),
            bus.endpoint(),
        )
        .expect("open db");
        let mut api = Discovery::with_transport(quick("api", "80"), bus.endpoint()).expect("open api");
        api.add_interest("db").expect("interest");

        db.start().expect("start db");
        api.start().expect("start api");

        let mut found = None;
        for _ in 0..100 {
            found = api.get_service_info("db");
            if found.is_some() {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        let info = found.expect("db discovered");
        assert_eq!(info.address, "10.0.0.5");
        assert_eq!(info.port, "5432");
        assert!(db.get_service_info("api").is_none());
    }
}
