// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Intra-process datagram bus.
//!
//! Every [`BusEndpoint`] created from the same [`IntraProcessBus`] receives
//! every datagram sent by any endpoint of that bus, itself included. Each
//! endpoint owns an unbounded inbox and a `sat-bus-rx` delivery thread, so
//! callbacks never run on the sender's thread.
//!
//! Endpoints get a synthetic `127.0.0.1:<id>` source address.

use super::{deliver, ReceiveCallback, Transport, TransportMetrics};
use crate::config::RECEIVE_POLL_TIMEOUT;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

type Datagram = (Vec<u8>, SocketAddr);

struct Member {
    id: u16,
    inbox: Sender<Datagram>,
}

#[derive(Default)]
struct BusInner {
    members: Mutex<Vec<Member>>,
    next_id: AtomicU16,
}

/// Shared in-memory group. Cheap to clone.
#[derive(Clone, Default)]
pub struct IntraProcessBus {
    inner: Arc<BusInner>,
}

impl IntraProcessBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the bus with a new endpoint.
    pub fn endpoint(&self) -> Arc<BusEndpoint> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        let (tx, rx) = channel::unbounded();
        self.inner.members.lock().push(Member {
            id,
            inbox: tx,
        });
        log::debug!("[bus] endpoint {} joined", id);
        Arc::new(BusEndpoint {
            id,
            addr: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, id)),
            bus: Arc::clone(&self.inner),
            inbox: rx,
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
            metrics: Arc::new(TransportMetrics::default()),
        })
    }

    /// Endpoints currently attached.
    pub fn len(&self) -> usize {
        self.inner.members.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One member of an [`IntraProcessBus`].
pub struct BusEndpoint {
    id: u16,
    addr: SocketAddr,
    bus: Arc<BusInner>,
    inbox: Receiver<Datagram>,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
    metrics: Arc<TransportMetrics>,
}

impl BusEndpoint {
    /// Source address seen by receivers of this endpoint's datagrams.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn run_loop(
        inbox: Receiver<Datagram>,
        running: Arc<AtomicBool>,
        metrics: Arc<TransportMetrics>,
        callback: ReceiveCallback,
    ) {
        while running.load(Ordering::Relaxed) {
            match inbox.recv_timeout(RECEIVE_POLL_TIMEOUT) {
                Ok((data, src)) => deliver(&callback, &data, src, &metrics, "sat-bus-rx"),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }
}

impl Transport for BusEndpoint {
    fn send(&self, data: &[u8]) -> io::Result<usize> {
        let members = self.bus.members.lock();
        for member in members.iter() {
            // a detached receiver only means that endpoint is gone
            let _ = member.inbox.send((data.to_vec(), self.addr));
        }
        let result = Ok(data.len());
        self.metrics.record_send(&result);
        result
    }

    fn listen(&self, callback: ReceiveCallback) -> io::Result<()> {
        let mut handle = self.handle.lock();
        if handle.is_some() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "receive thread already running",
            ));
        }

        self.running.store(true, Ordering::Relaxed);
        let inbox = self.inbox.clone();
        let running = Arc::clone(&self.running);
        let metrics = Arc::clone(&self.metrics);

        let spawned = std::thread::Builder::new()
            .name("sat-bus-rx".to_string())
            .spawn(move || Self::run_loop(inbox, running, metrics, callback));
        match spawned {
            Ok(h) => {
                *handle = Some(h);
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    fn shutdown(&self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.lock().take() {
            let _ = handle.join();
        }
        let mut members = self.bus.members.lock();
        let before = members.len();
        members.retain(|m| m.id != self.id);
        if members.len() != before {
            log::debug!("[bus] endpoint {} left", self.id);
        }
    }

    fn metrics(&self) -> &TransportMetrics {
        &self.metrics
    }
}

impl Drop for BusEndpoint {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn collector() -> (ReceiveCallback, Receiver<Datagram>) {
        let (tx, rx) = channel::unbounded();
        let callback: ReceiveCallback = Arc::new(move |data: &[u8], src: SocketAddr| {
            let _ = tx.send((data.to_vec(), src));
        });
        (callback, rx)
    }

    #[test]
    fn test_fan_out_includes_sender() {
        let bus = IntraProcessBus::new();
        let a = bus.endpoint();
        let b = bus.endpoint();
        let (cb_a, rx_a) = collector();
        let (cb_b, rx_b) = collector();
        a.listen(cb_a).expect("listen a");
        b.listen(cb_b).expect("listen b");

        a.send(b"hello").expect("send");

        let timeout = Duration::from_secs(1);
        let (data, src) = rx_b.recv_timeout(timeout).expect("b receives");
        assert_eq!(data, b"hello");
        assert_eq!(src, a.addr());
        assert_eq!(rx_a.recv_timeout(timeout).expect("a loopback").0, b"hello");
        assert_eq!(b.metrics().snapshot().packets_received, 1);
    }

    #[test]
    fn test_listen_twice_fails() {
        let bus = IntraProcessBus::new();
        let a = bus.endpoint();
        let (cb, _rx) = collector();
        a.listen(Arc::clone(&cb)).expect("listen");
        assert!(a.listen(cb).is_err());
    }

    #[test]
    fn test_shutdown_detaches_endpoint() {
        let bus = IntraProcessBus::new();
        let a = bus.endpoint();
        let b = bus.endpoint();
        assert_eq!(bus.len(), 2);
        a.shutdown();
        assert_eq!(bus.len(), 1);
        drop(b);
        assert!(bus.is_empty());
    }

    #[test]
    fn test_panicking_callback_is_counted() {
        let bus = IntraProcessBus::new();
        let a = bus.endpoint();
        a.listen(Arc::new(|_: &[u8], _: SocketAddr| panic!("callback failure")))
            .expect("listen");
        a.send(b"x").expect("send");
        std::thread::sleep(Duration::from_millis(200));
        assert_eq!(a.metrics().snapshot().callback_errors, 1);
    }
}
