// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Named timer entries.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Callback run on the scheduler thread when an event is due.
pub type EventHandler = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Re-armed after each firing; next firing one period after the handler returned.
    Periodic,
    /// Removed right after its handler returns.
    OneShot,
}

/// A named timer. The name is the event's identity inside a scheduler.
pub struct Event {
    pub(crate) name: String,
    pub(crate) handler: EventHandler,
    pub(crate) kind: EventKind,
    pub(crate) period: Duration,
    pub(crate) last_fired: Instant,
    /// Registration sequence number, assigned by the scheduler
    pub(crate) seq: u64,
}

impl Event {
    pub fn new<F>(name: impl Into<String>, kind: EventKind, period: Duration, handler: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            handler: Arc::new(handler),
            kind,
            period,
            last_fired: Instant::now(),
            seq: 0,
        }
    }

    /// Event firing every `period`.
    pub fn periodic<F>(name: impl Into<String>, period: Duration, handler: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::new(name, EventKind::Periodic, period, handler)
    }

    /// Event firing once, `delay` after it is armed.
    pub fn one_shot<F>(name: impl Into<String>, delay: Duration, handler: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::new(name, EventKind::OneShot, delay, handler)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub(crate) fn arm(&mut self, now: Instant) {
        self.last_fired = now;
    }

    /// Strictly more than one period elapsed since the last arm.
    pub(crate) fn is_due(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_fired) > self.period
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("period", &self.period)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_due_only_after_period() {
        let mut event = Event::periodic("tick", Duration::from_millis(100), || {});
        let t0 = Instant::now();
        event.arm(t0);
        assert!(!event.is_due(t0));
        assert!(!event.is_due(t0 + Duration::from_millis(100)));
        assert!(event.is_due(t0 + Duration::from_millis(101)));
    }

    #[test]
    fn test_constructors_set_kind() {
        assert_eq!(
            Event::one_shot("once", Duration::ZERO, || {}).kind(),
            EventKind::OneShot
        );
        let event = Event::periodic("tick", Duration::from_secs(1), || {});
        assert_eq!(event.kind(), EventKind::Periodic);
        assert_eq!(event.name(), "tick");
        assert_eq!(event.period(), Duration::from_secs(1));
    }
}
