// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Inbound frame dispatch (runs on the transport receive thread).

use super::frame::{Frame, Payload};
use super::services::Shared;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::time::Instant;
use uuid::Uuid;

/// Decode one datagram and apply it to the registry.
///
/// Malformed datagrams and frames sent by this instance are dropped.
pub(crate) fn handle_datagram(shared: &Shared, data: &[u8], src: SocketAddr) {
    let frame = match Frame::unpack(data) {
        Ok(frame) => frame,
        Err(e) => {
            shared.metrics.frames_rejected.fetch_add(1, Ordering::Relaxed);
            log::debug!("[discovery] dropped {} bytes from {}: {}", data.len(), src, e);
            return;
        }
    };

    if frame.sender == shared.uuid {
        shared.metrics.own_frames.fetch_add(1, Ordering::Relaxed);
        return;
    }

    shared.metrics.frames_handled.fetch_add(1, Ordering::Relaxed);
    log::trace!(
        "[discovery] {} '{}' from {} ({})",
        frame.frame_type(),
        frame.payload.service_name(),
        frame.sender,
        src
    );

    let sender = frame.sender;
    match frame.payload {
        Payload::Announce {
            service_name,
            service_port,
            address,
        } => on_announce(shared, sender, &service_name, &service_port, &address, src),
        Payload::Heartbeat { service_name } => on_heartbeat(shared, sender, &service_name),
        Payload::Interest { service_name } => on_interest(shared, &service_name),
        Payload::Vanish { service_name } => on_vanish(shared, sender, &service_name),
    }
}

fn on_announce(
    shared: &Shared,
    sender: Uuid,
    service_name: &str,
    port: &str,
    address: &str,
    src: SocketAddr,
) {
    if service_name == shared.service_name() {
        return;
    }

    let address = if address.is_empty() {
        src.ip().to_string()
    } else {
        address.to_string()
    };

    let inserted = {
        let mut registry = shared.registry.lock();
        if !shared.config.track_all_services && !registry.has_interest(service_name) {
            return;
        }
        registry.upsert_node(sender, service_name, &address, port, Instant::now())
    };

    match inserted {
        Ok(true) => log::info!(
            "[discovery] node {} '{}' at {}:{}",
            sender,
            service_name,
            address,
            port
        ),
        Ok(false) => {}
        Err(e) => log::warn!("[discovery] cannot track '{}': {}", service_name, e),
    }
}

fn on_heartbeat(shared: &Shared, sender: Uuid, service_name: &str) {
    let solicit = {
        let mut registry = shared.registry.lock();
        if registry.refresh_node(&sender, service_name, Instant::now()) {
            return;
        }
        shared.config.solicit_unknown_heartbeats && registry.has_interest(service_name)
    };

    if solicit && shared.is_active() {
        log::debug!(
            "[discovery] heartbeat from unknown node {} '{}', soliciting",
            sender,
            service_name
        );
        shared.solicit(service_name);
    }
}

fn on_interest(shared: &Shared, service_name: &str) {
    if service_name == shared.service_name() {
        shared.announce_if_active();
    }
}

fn on_vanish(shared: &Shared, sender: Uuid, service_name: &str) {
    let removed = shared.registry.lock().remove_node(&sender, service_name);
    if removed.is_some() {
        shared.metrics.nodes_vanished.fetch_add(1, Ordering::Relaxed);
        log::info!("[discovery] node {} '{}' vanished", sender, service_name);
    }
}
