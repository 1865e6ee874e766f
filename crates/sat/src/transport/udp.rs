// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! UDP multicast transport.
//!
//! One socket bound to `0.0.0.0:<group port>` and joined to the group is used
//! for both directions. Receiving runs on a dedicated thread:
//!
//! ```text
//! mio::poll() -> recv_from(buf) -> ReceiveCallback(&buf[..len], src)
//! ```

use super::multicast::join_multicast_group;
use super::{deliver, ReceiveCallback, Transport, TransportMetrics};
use crate::config::{
    DEFAULT_MULTICAST_GROUP, DEFAULT_MULTICAST_PORT, DEFAULT_MULTICAST_TTL, MAX_PACKET_SIZE,
    RECEIVE_POLL_TIMEOUT,
};
use crate::error::{Error, Result};
use mio::{Events, Interest, Poll, Token};
use parking_lot::Mutex;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Multicast endpoint parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MulticastConfig {
    /// Multicast group
    pub group: Ipv4Addr,
    /// Group port (also the local bind port)
    pub port: u16,
    /// Interface to join on, `UNSPECIFIED` joins on all non-loopback interfaces
    pub interface: Ipv4Addr,
    /// Multicast TTL (1 = link-local)
    pub ttl: u32,
    /// Deliver our own datagrams back to us
    pub loopback: bool,
    /// Set SO_REUSEPORT so several processes on one host can share the port
    pub reuse_port: bool,
}

impl Default for MulticastConfig {
    fn default() -> Self {
        Self {
            group: DEFAULT_MULTICAST_GROUP,
            port: DEFAULT_MULTICAST_PORT,
            interface: Ipv4Addr::UNSPECIFIED,
            ttl: DEFAULT_MULTICAST_TTL,
            loopback: true,
            reuse_port: true,
        }
    }
}

/// UDP transport for discovery datagrams.
pub struct UdpMulticastTransport {
    socket: Arc<UdpSocket>,
    destination: SocketAddr,
    interface: Ipv4Addr,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
    metrics: Arc<TransportMetrics>,
}

impl UdpMulticastTransport {
    /// Bind the group port and join the group.
    ///
    /// # Errors
    /// - `Error::InvalidArgument` if `group` is not a multicast address
    /// - `Error::BindFailed` if the socket cannot be created or bound
    /// - `Error::MulticastJoinFailed` if the group cannot be joined
    pub fn open(config: &MulticastConfig) -> Result<Self> {
        if !config.group.is_multicast() {
            return Err(Error::InvalidArgument(format!(
                "{} is not a multicast address",
                config.group
            )));
        }

        let bind_addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, config.port);
        let socket = bind_socket(bind_addr, config.reuse_port)
            .map_err(|e| Error::BindFailed(format!("{}: {}", bind_addr, e)))?;
        log::debug!("[UDP] transport bind addr={}", bind_addr);

        let interface = join_multicast_group(
            &socket,
            config.group,
            config.interface,
            config.ttl,
            config.loopback,
        )
        .map_err(|e| Error::MulticastJoinFailed(format!("{}: {}", config.group, e)))?;

        if !interface.is_unspecified() {
            // make outgoing datagrams leave through the joined interface
            let _ = socket2::SockRef::from(&socket).set_multicast_if_v4(&interface);
        }

        Ok(Self {
            socket: Arc::new(socket),
            destination: SocketAddr::V4(SocketAddrV4::new(config.group, config.port)),
            interface,
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
            metrics: Arc::new(TransportMetrics::default()),
        })
    }

    /// Group address datagrams are sent to.
    pub fn destination(&self) -> SocketAddr {
        self.destination
    }

    /// Interface used for outgoing multicast.
    pub fn interface(&self) -> Ipv4Addr {
        self.interface
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Main IO loop (runs in dedicated thread)
    fn run_loop(
        socket: Arc<UdpSocket>,
        running: Arc<AtomicBool>,
        metrics: Arc<TransportMetrics>,
        callback: ReceiveCallback,
    ) {
        let mut poll = match Poll::new() {
            Ok(p) => p,
            Err(e) => {
                log::error!("[sat-udp-rx] failed to create mio Poll: {}", e);
                return;
            }
        };
        let mut events = Events::with_capacity(16);

        let socket_clone = match socket.try_clone() {
            Ok(s) => s,
            Err(e) => {
                log::error!("[sat-udp-rx] failed to clone socket: {}", e);
                return;
            }
        };
        let mut mio_socket = mio::net::UdpSocket::from_std(socket_clone);

        const SOCKET_TOKEN: Token = Token(0);
        if let Err(e) = poll
            .registry()
            .register(&mut mio_socket, SOCKET_TOKEN, Interest::READABLE)
        {
            log::error!("[sat-udp-rx] failed to register socket with poll: {}", e);
            return;
        }

        let mut buf = vec![0u8; MAX_PACKET_SIZE];

        while running.load(Ordering::Relaxed) {
            if let Err(e) = poll.poll(&mut events, Some(RECEIVE_POLL_TIMEOUT)) {
                if e.kind() != io::ErrorKind::Interrupted {
                    log::debug!("[sat-udp-rx] poll error: {:?}", e);
                }
                continue;
            }

            for event in events.iter() {
                if event.token() != SOCKET_TOKEN {
                    continue;
                }

                // drain until WouldBlock
                loop {
                    let (len, src) = match mio_socket.recv_from(&mut buf) {
                        Ok(result) => result,
                        Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                        Err(e) => {
                            log::debug!("[sat-udp-rx] recv_from error: {:?}", e);
                            break;
                        }
                    };
                    log::trace!("[sat-udp-rx] recv len={} src={}", len, src);
                    deliver(&callback, &buf[..len], src, &metrics, "sat-udp-rx");
                }
            }
        }
        log::debug!("[sat-udp-rx] thread exiting");
    }
}

impl Transport for UdpMulticastTransport {
    fn send(&self, data: &[u8]) -> io::Result<usize> {
        let result = self.socket.send_to(data, self.destination);
        if let Err(ref e) = result {
            log::debug!(
                "[UDP] send error={} dest={} len={}",
                e,
                self.destination,
                data.len()
            );
        }
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

        self.socket.set_nonblocking(true)?;
        self.running.store(true, Ordering::Relaxed);

        let socket = Arc::clone(&self.socket);
        let running = Arc::clone(&self.running);
        let metrics = Arc::clone(&self.metrics);

        let spawned = std::thread::Builder::new()
            .name("sat-udp-rx".to_string())
            .spawn(move || Self::run_loop(socket, running, metrics, callback));
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
    }

    fn metrics(&self) -> &TransportMetrics {
        &self.metrics
    }
}

impl Drop for UdpMulticastTransport {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn bind_socket(addr: SocketAddrV4, reuse_port: bool) -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    if reuse_port {
        set_reuseport(&socket)?;
    }
    #[cfg(not(unix))]
    let _ = reuse_port;
    socket.bind(&addr.into())?;
    Ok(socket.into())
}

/// Set SO_REUSEPORT so several discovery processes can share the group port.
#[cfg(unix)]
fn set_reuseport(socket: &Socket) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;
    let fd = socket.as_raw_fd();
    let optval: libc::c_int = 1;
    // SAFETY: setsockopt FFI with valid fd, standard socket option, and correctly sized optval pointer
    let ret = unsafe {
        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_REUSEPORT,
            &optval as *const _ as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
