// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Discovery instance configuration.
//!
//! Built in code with the setters below, optionally overlaid with environment
//! variables through [`DiscoveryConfig::from_env`]:
//!
//! - `SAT_DISCOVERY_SERVICE_NAME`: local service name
//! - `SAT_DISCOVERY_SERVICE_PORT`: advertised service port
//! - `SAT_DISCOVERY_ADDRESS`: advertised address (default: primary IPv4 interface)
//! - `SAT_DISCOVERY_GROUP`: multicast group (default: 239.255.0.42)
//! - `SAT_DISCOVERY_GROUP_PORT`: multicast port (default: 7650)
//! - `SAT_DISCOVERY_INTERFACE`: IPv4 address of the interface to join on
//! - `SAT_DISCOVERY_TTL`: multicast TTL (1-255)
//! - `SAT_DISCOVERY_NODE_TIMEOUT_MS`: eviction threshold
//! - `SAT_DISCOVERY_HEARTBEAT_MS`: heartbeat period
//! - `SAT_DISCOVERY_INTEREST_MS`: interest broadcast period
//! - `SAT_DISCOVERY_TRACK_ALL`: track every announced service ("1" or "true")
//!
//! Invalid values are logged and ignored.
//!
//! # Example
//!
//! ```bash
//! export SAT_DISCOVERY_SERVICE_NAME=db
//! export SAT_DISCOVERY_SERVICE_PORT=5432
//! export SAT_DISCOVERY_NODE_TIMEOUT_MS=30000
//! ```

use crate::collections::Growth;
use crate::config::{
    ADDRESS_FIELD, AGEING_PERIOD, ANNOUNCE_DELAY, DISCOVERY_EVENT_COUNT, HEARTBEAT_PERIOD,
    INTEREST_PERIOD, NODE_TIMEOUT, SCAN_PERIOD, SERVICE_NAME_FIELD, SERVICE_PORT_FIELD,
    VANISH_FLUSH,
};
use crate::error::{Error, Result};
use crate::scheduler::SchedulerConfig;
use crate::transport::MulticastConfig;
use std::env;
use std::net::Ipv4Addr;
use std::time::Duration;

/// Environment variable names
pub const ENV_SERVICE_NAME: &str = "SAT_DISCOVERY_SERVICE_NAME";
pub const ENV_SERVICE_PORT: &str = "SAT_DISCOVERY_SERVICE_PORT";
pub const ENV_ADDRESS: &str = "SAT_DISCOVERY_ADDRESS";
pub const ENV_GROUP: &str = "SAT_DISCOVERY_GROUP";
pub const ENV_GROUP_PORT: &str = "SAT_DISCOVERY_GROUP_PORT";
pub const ENV_INTERFACE: &str = "SAT_DISCOVERY_INTERFACE";
pub const ENV_TTL: &str = "SAT_DISCOVERY_TTL";
pub const ENV_NODE_TIMEOUT_MS: &str = "SAT_DISCOVERY_NODE_TIMEOUT_MS";
pub const ENV_HEARTBEAT_MS: &str = "SAT_DISCOVERY_HEARTBEAT_MS";
pub const ENV_INTEREST_MS: &str = "SAT_DISCOVERY_INTEREST_MS";
pub const ENV_TRACK_ALL: &str = "SAT_DISCOVERY_TRACK_ALL";

/// Periods of the five scheduled protocol actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryTiming {
    /// Delay between `start` and the initial announce (one-shot)
    pub announce_delay: Duration,
    pub heartbeat_period: Duration,
    pub interest_period: Duration,
    pub scan_period: Duration,
    pub ageing_period: Duration,
    /// Nodes not seen for longer than this are evicted by the ageing sweep
    pub node_timeout: Duration,
    /// Pause after broadcasting Vanish in `stop`
    pub vanish_flush: Duration,
}

impl Default for DiscoveryTiming {
    fn default() -> Self {
        Self {
            announce_delay: ANNOUNCE_DELAY,
            heartbeat_period: HEARTBEAT_PERIOD,
            interest_period: INTEREST_PERIOD,
            scan_period: SCAN_PERIOD,
            ageing_period: AGEING_PERIOD,
            node_timeout: NODE_TIMEOUT,
            vanish_flush: VANISH_FLUSH,
        }
    }
}

/// Configuration of one discovery instance.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Name of the service this instance provides
    pub service_name: String,
    /// Port advertised for the service (free-form, up to 6 characters)
    pub service_port: String,
    /// Advertised address; `None` uses the primary IPv4 interface
    pub address: Option<String>,
    /// Multicast group, port, interface and TTL
    pub multicast: MulticastConfig,
    pub timing: DiscoveryTiming,
    /// Track every announced service, not only the ones with a local interest
    pub track_all_services: bool,
    /// Answer heartbeats from unknown peers with an Interest frame
    pub solicit_unknown_heartbeats: bool,
    /// Scheduler owning the protocol actions
    pub scheduler: SchedulerConfig,
}

impl DiscoveryConfig {
    pub fn new(service_name: impl Into<String>, service_port: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            service_port: service_port.into(),
            address: None,
            multicast: MulticastConfig::default(),
            timing: DiscoveryTiming::default(),
            track_all_services: false,
            solicit_unknown_heartbeats: false,
            scheduler: SchedulerConfig::default(),
        }
    }

    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    #[must_use]
    pub fn multicast_group(mut self, group: Ipv4Addr) -> Self {
        self.multicast.group = group;
        self
    }

    #[must_use]
    pub fn multicast_port(mut self, port: u16) -> Self {
        self.multicast.port = port;
        self
    }

    #[must_use]
    pub fn interface(mut self, interface: Ipv4Addr) -> Self {
        self.multicast.interface = interface;
        self
    }

    #[must_use]
    pub fn ttl(mut self, ttl: u32) -> Self {
        self.multicast.ttl = ttl;
        self
    }

    #[must_use]
    pub fn timing(mut self, timing: DiscoveryTiming) -> Self {
        self.timing = timing;
        self
    }

    #[must_use]
    pub fn heartbeat_period(mut self, period: Duration) -> Self {
        self.timing.heartbeat_period = period;
        self
    }

    #[must_use]
    pub fn interest_period(mut self, period: Duration) -> Self {
        self.timing.interest_period = period;
        self
    }

    #[must_use]
    pub fn node_timeout(mut self, timeout: Duration) -> Self {
        self.timing.node_timeout = timeout;
        self
    }

    #[must_use]
    pub fn track_all_services(mut self, enabled: bool) -> Self {
        self.track_all_services = enabled;
        self
    }

    #[must_use]
    pub fn solicit_unknown_heartbeats(mut self, enabled: bool) -> Self {
        self.solicit_unknown_heartbeats = enabled;
        self
    }

    #[must_use]
    pub fn scheduler(mut self, scheduler: SchedulerConfig) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Overlay `SAT_DISCOVERY_*` environment variables.
    #[must_use]
    pub fn from_env(self) -> Self {
        self.overlay(|key| env::var(key).ok())
    }

    fn overlay<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(name) = var(ENV_SERVICE_NAME) {
            self.service_name = name;
        }
        if let Some(port) = var(ENV_SERVICE_PORT) {
            self.service_port = port;
        }
        if let Some(address) = var(ENV_ADDRESS) {
            self.address = Some(address);
        }
        if let Some(group) = parse_var::<Ipv4Addr>(&var, ENV_GROUP) {
            self.multicast.group = group;
        }
        if let Some(port) = parse_var::<u16>(&var, ENV_GROUP_PORT) {
            self.multicast.port = port;
        }
        if let Some(interface) = parse_var::<Ipv4Addr>(&var, ENV_INTERFACE) {
            self.multicast.interface = interface;
        }
        if let Some(ttl) = parse_var::<u32>(&var, ENV_TTL) {
            if (1..=255).contains(&ttl) {
                self.multicast.ttl = ttl;
            } else {
                log::warn!("[config] {}={} out of range (1-255), ignored", ENV_TTL, ttl);
            }
        }
        if let Some(timeout) = parse_millis(&var, ENV_NODE_TIMEOUT_MS) {
            self.timing.node_timeout = timeout;
        }
        if let Some(period) = parse_millis(&var, ENV_HEARTBEAT_MS) {
            self.timing.heartbeat_period = period;
        }
        if let Some(period) = parse_millis(&var, ENV_INTEREST_MS) {
            self.timing.interest_period = period;
        }
        if let Some(flag) = var(ENV_TRACK_ALL) {
            self.track_all_services = flag == "1" || flag.eq_ignore_ascii_case("true");
        }
        self
    }

    /// Check every field before any socket is opened.
    ///
    /// # Errors
    /// `Error::InvalidArgument` for empty required fields, a non-multicast
    /// group, a zero period or a static scheduler too small for the protocol
    /// events; `Error::FieldTooLong` for fields exceeding their wire slot.
    pub fn validate(&self) -> Result<()> {
        validate_field("service_name", &self.service_name, SERVICE_NAME_FIELD)?;
        validate_field("service_port", &self.service_port, SERVICE_PORT_FIELD)?;
        if let Some(address) = &self.address {
            validate_field("address", address, ADDRESS_FIELD)?;
        }
        if !self.multicast.group.is_multicast() {
            return Err(Error::InvalidArgument(format!(
                "{} is not a multicast address",
                self.multicast.group
            )));
        }
        if self.multicast.port == 0 {
            return Err(Error::InvalidArgument(
                "multicast port must not be zero".to_string(),
            ));
        }
        let periods = [
            ("announce delay", self.timing.announce_delay),
            ("heartbeat period", self.timing.heartbeat_period),
            ("interest period", self.timing.interest_period),
            ("scan period", self.timing.scan_period),
            ("ageing period", self.timing.ageing_period),
            ("node timeout", self.timing.node_timeout),
        ];
        for (what, period) in periods {
            if period.is_zero() {
                return Err(Error::InvalidArgument(format!("{} must not be zero", what)));
            }
        }
        if self.scheduler.growth == Growth::Static
            && self.scheduler.max_events < DISCOVERY_EVENT_COUNT
        {
            return Err(Error::InvalidArgument(format!(
                "static scheduler holds {} events, discovery needs {}",
                self.scheduler.max_events, DISCOVERY_EVENT_COUNT
            )));
        }
        Ok(())
    }
}

/// Millisecond duration variable; zero is rejected.
fn parse_millis(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Duration> {
    match parse_var::<u64>(var, key)? {
        0 => {
            log::warn!("[config] {}=0 must be positive, ignored", key);
            None
        }
        ms => Some(Duration::from_millis(ms)),
    }
}

fn parse_var<T>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    let raw = var(key)?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("[config] invalid value for {}: '{}', ignored", key, raw);
            None
        }
    }
}

/// Non-empty, fits `width` bytes including the NUL terminator, no interior NUL.
pub(crate) fn validate_field(field: &'static str, value: &str, width: usize) -> Result<()> {
    if value.is_empty() {
        return Err(Error::InvalidArgument(format!("{} must not be empty", field)));
    }
    if value.len() >= width {
        return Err(Error::FieldTooLong {
            field,
            max: width - 1,
        });
    }
    if value.contains('\0') {
        return Err(Error::InvalidArgument(format!(
            "{} must not contain NUL",
            field
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DiscoveryConfig::new("db", "5432");
        assert_eq!(config.timing.heartbeat_period, Duration::from_millis(5000));
        assert_eq!(config.timing.node_timeout, Duration::from_millis(15000));
        assert!(!config.track_all_services);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_fields() {
        assert!(matches!(
            DiscoveryConfig::new("", "1").validate(),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            DiscoveryConfig::new("db", "1234567").validate(),
            Err(Error::FieldTooLong {
                field: "service_port",
                max: 6
            })
        ));
        let long_name = "x".repeat(129);
        assert!(matches!(
            DiscoveryConfig::new(long_name, "1").validate(),
            Err(Error::FieldTooLong { max: 128, .. })
        ));
        assert!(DiscoveryConfig::new("db", "1")
            .multicast_group(Ipv4Addr::new(192, 168, 1, 1))
            .validate()
            .is_err());
    }

    #[test]
    fn test_env_overlay() {
        let config = DiscoveryConfig::new("api", "80").overlay(lookup(&[
            (ENV_SERVICE_NAME, "db"),
            (ENV_GROUP, "239.1.2.3"),
            (ENV_GROUP_PORT, "9999"),
            (ENV_NODE_TIMEOUT_MS, "2500"),
            (ENV_TRACK_ALL, "true"),
        ]));
        assert_eq!(config.service_name, "db");
        assert_eq!(config.service_port, "80");
        assert_eq!(config.multicast.group, Ipv4Addr::new(239, 1, 2, 3));
        assert_eq!(config.multicast.port, 9999);
        assert_eq!(config.timing.node_timeout, Duration::from_millis(2500));
        assert!(config.track_all_services);
    }

    #[test]
    fn test_env_overlay_ignores_invalid_values() {
        let config = DiscoveryConfig::new("api", "80").overlay(lookup(&[
            (ENV_GROUP_PORT, "not-a-port"),
            (ENV_TTL, "900"),
            (ENV_SERVICE_NAME, "   "),
        ]));
        assert_eq!(config.multicast.port, crate::config::DEFAULT_MULTICAST_PORT);
        assert_eq!(config.multicast.ttl, 1);
        assert_eq!(config.service_name, "api");
    }

    #[test]
    fn test_env_overlay_ignores_zero_periods() {
        let config = DiscoveryConfig::new("api", "80").overlay(lookup(&[
            (ENV_HEARTBEAT_MS, "0"),
            (ENV_INTEREST_MS, "0"),
            (ENV_NODE_TIMEOUT_MS, "0"),
        ]));
        assert_eq!(config.timing, DiscoveryTiming::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_periods() {
        let zeroed: [fn(&mut DiscoveryTiming); 6] = [
            |t| t.announce_delay = Duration::ZERO,
            |t| t.heartbeat_period = Duration::ZERO,
            |t| t.interest_period = Duration::ZERO,
            |t| t.scan_period = Duration::ZERO,
            |t| t.ageing_period = Duration::ZERO,
            |t| t.node_timeout = Duration::ZERO,
        ];
        for zero in zeroed {
            let mut timing = DiscoveryTiming::default();
            zero(&mut timing);
            assert!(matches!(
                DiscoveryConfig::new("db", "5432").timing(timing).validate(),
                Err(Error::InvalidArgument(_))
            ));
        }
        assert!(matches!(
            DiscoveryConfig::new("db", "5432")
                .heartbeat_period(Duration::ZERO)
                .validate(),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_validate_checks_static_scheduler_capacity() {
        let small = DiscoveryConfig::new("db", "5432")
            .scheduler(SchedulerConfig::bounded(DISCOVERY_EVENT_COUNT - 1));
        assert!(matches!(small.validate(), Err(Error::InvalidArgument(_))));

        let exact = DiscoveryConfig::new("db", "5432")
            .scheduler(SchedulerConfig::bounded(DISCOVERY_EVENT_COUNT));
        assert!(exact.validate().is_ok());

        let mut growable = SchedulerConfig::bounded(1);
        growable.growth = Growth::Dynamic;
        assert!(DiscoveryConfig::new("db", "5432")
            .scheduler(growable)
            .validate()
            .is_ok());
    }
}
