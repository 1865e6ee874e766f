// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! SAT Global Configuration - Single Source of Truth
//!
//! Protocol constants, wire field widths and default timings.
//! **NEVER hardcode these values elsewhere!**
//!
//! Runtime configuration lives in [`crate::discovery::DiscoveryConfig`] and
//! [`crate::scheduler::SchedulerConfig`]; their defaults are taken from here.

use std::net::Ipv4Addr;
use std::time::Duration;

// =======================================================================
// Wire protocol
// =======================================================================

/// Discovery protocol version carried in byte 0 of every frame.
pub const PROTOCOL_VERSION: u8 = 1;

/// Length of the sender identity (UUID) in bytes.
pub const UUID_SIZE: usize = 16;

/// Frame header: version (1) + type (1) + sender uuid (16).
pub const HEADER_SIZE: usize = 2 + UUID_SIZE;

/// Service name slot, including the terminating NUL.
pub const SERVICE_NAME_FIELD: usize = 129;

/// Service port slot, including the terminating NUL.
pub const SERVICE_PORT_FIELD: usize = 7;

/// Address slot, including the terminating NUL.
pub const ADDRESS_FIELD: usize = 65;

/// Largest payload (Announce).
pub const MAX_PAYLOAD_SIZE: usize = SERVICE_NAME_FIELD + SERVICE_PORT_FIELD + ADDRESS_FIELD;

/// Every frame is emitted at this size (payload zero padded).
pub const FRAME_SIZE: usize = HEADER_SIZE + MAX_PAYLOAD_SIZE;

/// Receive buffer size; anything larger than a frame is ignored past this.
pub const MAX_PACKET_SIZE: usize = 1500;

// =======================================================================
// Multicast defaults
// =======================================================================

/// Default discovery multicast group (administratively scoped).
pub const DEFAULT_MULTICAST_GROUP: Ipv4Addr = Ipv4Addr::new(239, 255, 0, 42);

/// Default discovery multicast port.
pub const DEFAULT_MULTICAST_PORT: u16 = 7650;

/// Default multicast TTL (link-local only).
pub const DEFAULT_MULTICAST_TTL: u32 = 1;

/// Receive loop poll timeout (bounds shutdown latency).
pub const RECEIVE_POLL_TIMEOUT: Duration = Duration::from_millis(50);

// =======================================================================
// Scheduler defaults
// =======================================================================

/// Initial size of the scheduler event set.
pub const DEFAULT_MAX_EVENTS: usize = 16;

/// Pause between two full sweeps of the event set.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_micros(50);

// =======================================================================
// Discovery timings
// =======================================================================

/// Delay between `start` and the initial announce.
pub const ANNOUNCE_DELAY: Duration = Duration::from_millis(10);

/// Heartbeat period.
pub const HEARTBEAT_PERIOD: Duration = Duration::from_millis(5000);

/// Interest broadcast period.
pub const INTEREST_PERIOD: Duration = Duration::from_millis(1000);

/// Reconciliation tick period.
pub const SCAN_PERIOD: Duration = Duration::from_millis(100);

/// Ageing sweep period.
pub const AGEING_PERIOD: Duration = Duration::from_millis(1000);

/// Node eviction threshold (3 x heartbeat).
pub const NODE_TIMEOUT: Duration = Duration::from_millis(15000);

/// Pause after the Vanish broadcast so the datagram leaves before teardown.
pub const VANISH_FLUSH: Duration = Duration::from_millis(20);

/// Initial capacity of the interest and node sets (dynamic growth).
pub const REGISTRY_CAPACITY: usize = 8;

// =======================================================================
// Scheduled event names
// =======================================================================

pub const EVENT_ANNOUNCE: &str = "announce";
pub const EVENT_HEARTBEAT: &str = "heartbeat";
pub const EVENT_INTEREST: &str = "interest";
pub const EVENT_SCAN: &str = "scan";
pub const EVENT_AGEING: &str = "ageing";

/// Events one discovery instance registers on its scheduler
pub const DISCOVERY_EVENT_COUNT: usize = 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_layout() {
        assert_eq!(HEADER_SIZE, 18);
        assert_eq!(MAX_PAYLOAD_SIZE, 201);
        assert_eq!(FRAME_SIZE, 219);
        assert!(FRAME_SIZE <= MAX_PACKET_SIZE);
    }

    #[test]
    fn test_eviction_is_three_heartbeats() {
        assert_eq!(NODE_TIMEOUT, HEARTBEAT_PERIOD * 3);
    }
}
