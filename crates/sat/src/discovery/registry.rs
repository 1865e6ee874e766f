// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Interest and node bookkeeping for one discovery instance.
//!
//! The registry itself is not synchronized; [`super::Discovery`] keeps it
//! behind a single mutex shared by the scheduler and receive threads.

use crate::collections::{Growth, Set};
use crate::config::REGISTRY_CAPACITY;
use crate::error::{Error, Result};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// A remote service this instance wants to locate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Interest {
    pub service_name: String,
    /// At least one node providing the service is currently tracked
    pub registered: bool,
}

/// Cached record of a remote peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub uuid: Uuid,
    pub service_name: String,
    pub address: String,
    pub port: String,
    pub last_seen: Instant,
}

impl Node {
    /// True if the node has not been heard from for longer than `timeout`.
    pub fn is_expired(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.last_seen) > timeout
    }

    fn same_identity(&self, uuid: &Uuid, service_name: &str) -> bool {
        self.uuid == *uuid && self.service_name == service_name
    }
}

/// Where a service can be reached.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceInfo {
    pub address: String,
    pub port: String,
}

pub(crate) struct Registry {
    interests: Set<Interest>,
    nodes: Set<Node>,
}

impl Registry {
    pub fn new() -> Result<Self> {
        Ok(Self {
            interests: Set::new(
                REGISTRY_CAPACITY,
                |a: &Interest, b: &Interest| a.service_name == b.service_name,
                Growth::Dynamic,
            )?,
            nodes: Set::new(
                REGISTRY_CAPACITY,
                |a: &Node, b: &Node| a.same_identity(&b.uuid, &b.service_name),
                Growth::Dynamic,
            )?,
        })
    }

    /// Returns `Ok(false)` if the interest was already registered.
    pub fn add_interest(&mut self, service_name: &str) -> Result<bool> {
        let registered = self
            .nodes
            .iter()
            .any(|n| n.service_name == service_name);
        match self.interests.add(Interest {
            service_name: service_name.to_string(),
            registered,
        }) {
            Ok(()) => Ok(true),
            Err(Error::AlreadyPresent) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn remove_interest(&mut self, service_name: &str) -> bool {
        self.interests
            .remove_by(|i| i.service_name == service_name)
            .is_some()
    }

    pub fn has_interest(&self, service_name: &str) -> bool {
        self.interests
            .find_by(|i| i.service_name == service_name)
            .is_some()
    }

    pub fn interest_names(&self) -> Vec<String> {
        self.interests
            .iter()
            .map(|i| i.service_name.clone())
            .collect()
    }

    /// Interests for which no provider is tracked yet.
    pub fn unresolved_interests(&self) -> usize {
        self.interests.iter().filter(|i| !i.registered).count()
    }

    /// Insert or refresh the node `(uuid, service_name)`.
    ///
    /// Returns true if the node was not known before.
    pub fn upsert_node(
        &mut self,
        uuid: Uuid,
        service_name: &str,
        address: &str,
        port: &str,
        now: Instant,
    ) -> Result<bool> {
        if let Some(interest) = self
            .interests
            .find_by_mut(|i| i.service_name == service_name)
        {
            interest.registered = true;
        }

        if let Some(node) = self
            .nodes
            .find_by_mut(|n| n.same_identity(&uuid, service_name))
        {
            node.address = address.to_string();
            node.port = port.to_string();
            node.last_seen = now;
            return Ok(false);
        }

        self.nodes.add(Node {
            uuid,
            service_name: service_name.to_string(),
            address: address.to_string(),
            port: port.to_string(),
            last_seen: now,
        })?;
        Ok(true)
    }

    /// Refresh `last_seen` of a known node. Returns false if unknown.
    pub fn refresh_node(&mut self, uuid: &Uuid, service_name: &str, now: Instant) -> bool {
        match self
            .nodes
            .find_by_mut(|n| n.same_identity(uuid, service_name))
        {
            Some(node) => {
                node.last_seen = now;
                true
            }
            None => false,
        }
    }

    pub fn remove_node(&mut self, uuid: &Uuid, service_name: &str) -> Option<Node> {
        let node = self
            .nodes
            .remove_by(|n| n.same_identity(uuid, service_name))?;
        self.sync_registered(&node.service_name);
        Some(node)
    }

    /// Remove every node silent for longer than `timeout` and return them.
    pub fn evict_stale(&mut self, now: Instant, timeout: Duration) -> Vec<Node> {
        let mut evicted = Vec::new();
        while let Some(node) = self.nodes.remove_by(|n| n.is_expired(now, timeout)) {
            evicted.push(node);
        }
        for node in &evicted {
            self.sync_registered(&node.service_name);
        }
        evicted
    }

    /// First node providing `service_name`, in insertion order.
    pub fn service_info(&self, service_name: &str) -> Option<ServiceInfo> {
        self.nodes
            .find_by(|n| n.service_name == service_name)
            .map(|n| ServiceInfo {
                address: n.address.clone(),
                port: n.port.clone(),
            })
    }

    pub fn nodes(&self) -> Vec<Node> {
        self.nodes.iter().cloned().collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn sync_registered(&mut self, service_name: &str) {
        let still_provided = self.nodes.iter().any(|n| n.service_name == service_name);
        if let Some(interest) = self
            .interests
            .find_by_mut(|i| i.service_name == service_name)
        {
            interest.registered = still_provided;
        }
    }
}
