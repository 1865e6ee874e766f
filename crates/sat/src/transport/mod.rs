// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Datagram transports used by discovery.
//!
//! - [`UdpMulticastTransport`]: real network, one socket joined to the group,
//!   `sat-udp-rx` receive thread driven by mio.
//! - [`IntraProcessBus`]: in-memory fan-out between endpoints of the same
//!   process, with the same threading model (callbacks on a delivery thread).
//!
//! Both deliver to every member of the group, including the sender itself
//! (multicast loopback). Discovery filters its own frames by sender uuid.

pub mod intra;
pub mod multicast;
pub mod udp;

pub use intra::{BusEndpoint, IntraProcessBus};
pub use udp::{MulticastConfig, UdpMulticastTransport};

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Callback invoked for every received datagram, on the transport's own thread.
///
/// Arguments:
/// - `&[u8]`: datagram payload
/// - `SocketAddr`: source address
pub type ReceiveCallback = Arc<dyn Fn(&[u8], SocketAddr) + Send + Sync>;

/// Group-addressed datagram endpoint.
pub trait Transport: Send + Sync {
    /// Send `data` to the whole group.
    fn send(&self, data: &[u8]) -> io::Result<usize>;

    /// Start delivering received datagrams to `callback`.
    ///
    /// Fails if a receive thread is already running.
    fn listen(&self, callback: ReceiveCallback) -> io::Result<()>;

    /// Stop the receive thread (idempotent).
    fn shutdown(&self);

    /// Counters for diagnostics.
    fn metrics(&self) -> &TransportMetrics;
}

/// Transport counters for diagnostics
#[derive(Debug, Default)]
pub struct TransportMetrics {
    /// Datagrams sent
    pub packets_sent: AtomicU64,
    /// Send failures
    pub send_errors: AtomicU64,
    /// Datagrams received
    pub packets_received: AtomicU64,
    /// Total bytes received
    pub bytes_received: AtomicU64,
    /// Receive callback panics (caught)
    pub callback_errors: AtomicU64,
}

/// Point-in-time copy of [`TransportMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportStats {
    pub packets_sent: u64,
    pub send_errors: u64,
    pub packets_received: u64,
    pub bytes_received: u64,
    pub callback_errors: u64,
}

impl TransportMetrics {
    pub(crate) fn record_send(&self, result: &io::Result<usize>) {
        match result {
            Ok(_) => self.packets_sent.fetch_add(1, Ordering::Relaxed),
            Err(_) => self.send_errors.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub(crate) fn record_receive(&self, len: usize) {
        self.packets_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received
            .fetch_add(len as u64, Ordering::Relaxed);
    }

    /// Get snapshot of metrics
    pub fn snapshot(&self) -> TransportStats {
        TransportStats {
            packets_sent: self.packets_sent.load(Ordering::Relaxed),
            send_errors: self.send_errors.load(Ordering::Relaxed),
            packets_received: self.packets_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            callback_errors: self.callback_errors.load(Ordering::Relaxed),
        }
    }
}

/// Run `callback` for one datagram, containing panics at the boundary.
pub(crate) fn deliver(
    callback: &ReceiveCallback,
    data: &[u8],
    src: SocketAddr,
    metrics: &TransportMetrics,
    tag: &str,
) {
    metrics.record_receive(data.len());
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| callback(data, src)));
    if let Err(e) = result {
        metrics.callback_errors.fetch_add(1, Ordering::Relaxed);
        log::debug!("[{}] receive callback panicked: {:?}", tag, e);
    }
}
