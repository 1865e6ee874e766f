// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Named-timer engine.
//!
//! A dedicated thread sweeps the event set, compares elapsed time against each
//! event's period and runs due handlers synchronously.
//!
//! # Architecture
//! ```text
//! sat-scheduler thread:
//!   loop while running {
//!       lock(events) -> collect due (seq, name, handler, kind) -> unlock
//!       for each due: handler()  (panics caught, counted)
//!                     lock(events) -> match seq:
//!                         one-shot: remove | periodic: re-arm(now)
//!       sleep(poll_interval)
//!   }
//! ```
//!
//! The event lock is never held while a handler runs, so handlers may add or
//! remove events on the same scheduler. Every registration gets a fresh
//! sequence number; an event replaced under the same name while its
//! predecessor's handler runs is left untouched by that firing.
//!
//! # Lifecycle
//! `Opened -> Running <-> Stopped -> Closed`

mod event;

pub use event::{Event, EventHandler, EventKind};

use crate::collections::{Growth, Set};
use crate::config::{DEFAULT_MAX_EVENTS, DEFAULT_POLL_INTERVAL};
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Scheduler construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Initial size of the event set
    pub max_events: usize,
    /// Whether the event set may grow past `max_events`
    pub growth: Growth,
    /// Pause between two full sweeps
    pub poll_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_events: DEFAULT_MAX_EVENTS,
            growth: Growth::Dynamic,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl SchedulerConfig {
    /// Fixed-size event set holding at most `max_events`.
    pub fn bounded(max_events: usize) -> Self {
        Self {
            max_events,
            growth: Growth::Static,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Opened,
    Running,
    Stopped,
    Closed,
}

/// Scheduler counters for diagnostics
#[derive(Debug, Default)]
pub struct SchedulerMetrics {
    /// Handler invocations
    pub fired: AtomicU64,
    /// Handlers that panicked (caught)
    pub handler_panics: AtomicU64,
}

type EventSet = Arc<Mutex<Set<Event>>>;

/// Periodic and one-shot timers on a dedicated thread.
///
/// # Examples
/// ```no_run
/// use sat::scheduler::{Event, Scheduler, SchedulerConfig};
/// use std::time::Duration;
///
/// let mut scheduler = Scheduler::open(SchedulerConfig::default()).unwrap();
/// scheduler
///     .add_event(Event::periodic("tick", Duration::from_millis(100), || println!("tick")))
///     .unwrap();
/// scheduler.start().unwrap();
/// std::thread::sleep(Duration::from_secs(1));
/// scheduler.close();
/// ```
pub struct Scheduler {
    events: EventSet,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    state: SchedulerState,
    poll_interval: Duration,
    metrics: Arc<SchedulerMetrics>,
    next_seq: AtomicU64,
}

impl Scheduler {
    /// Allocate the event set.
    ///
    /// # Errors
    /// `Error::InvalidArgument` if `max_events` is zero.
    pub fn open(config: SchedulerConfig) -> Result<Self> {
        let events = Set::new(
            config.max_events,
            |a: &Event, b: &Event| a.name == b.name,
            config.growth,
        )?;
        Ok(Self {
            events: Arc::new(Mutex::new(events)),
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
            state: SchedulerState::Opened,
            poll_interval: config.poll_interval,
            metrics: Arc::new(SchedulerMetrics::default()),
            next_seq: AtomicU64::new(1),
        })
    }

    /// Register `event`. Allowed before or after [`Scheduler::start`]; an event
    /// added while running is armed now.
    ///
    /// # Errors
    /// - `Error::InvalidState` if the scheduler is closed
    /// - `Error::InvalidArgument` if the name is empty
    /// - `Error::AlreadyPresent` if an event with that name exists
    /// - `Error::CapacityExceeded` if the event set is bounded and full
    pub fn add_event(&self, mut event: Event) -> Result<()> {
        if self.state == SchedulerState::Closed {
            return Err(Error::InvalidState("scheduler is closed".to_string()));
        }
        if event.name.is_empty() {
            return Err(Error::InvalidArgument(
                "event name must not be empty".to_string(),
            ));
        }
        event.arm(Instant::now());
        event.seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let name = event.name.clone();
        self.events.lock().add(event)?;
        log::debug!("[scheduler] event '{}' registered", name);
        Ok(())
    }

    /// Unregister the event named `name`. Returns false if absent.
    pub fn remove_event(&self, name: &str) -> bool {
        self.events.lock().remove_by(|e| e.name == name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.events.lock().find_by(|e| e.name == name).is_some()
    }

    /// Number of registered events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Handler invocations since open.
    pub fn fired(&self) -> u64 {
        self.metrics.fired.load(Ordering::Relaxed)
    }

    /// Handlers that panicked since open.
    pub fn handler_panics(&self) -> u64 {
        self.metrics.handler_panics.load(Ordering::Relaxed)
    }

    /// Arm every event at the current instant and spawn the polling thread.
    ///
    /// # Errors
    /// `Error::InvalidState` if already running or closed; `Error::IoError` if
    /// the thread cannot be spawned.
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            SchedulerState::Running => {
                return Err(Error::InvalidState("scheduler already running".to_string()))
            }
            SchedulerState::Closed => {
                return Err(Error::InvalidState("scheduler is closed".to_string()))
            }
            SchedulerState::Opened | SchedulerState::Stopped => {}
        }

        {
            let now = Instant::now();
            let mut events = self.events.lock();
            for event in events.iter_mut() {
                event.arm(now);
            }
        }

        self.running.store(true, Ordering::Relaxed);
        let events = Arc::clone(&self.events);
        let running = Arc::clone(&self.running);
        let metrics = Arc::clone(&self.metrics);
        let poll_interval = self.poll_interval;

        let handle = thread::Builder::new()
            .name("sat-scheduler".to_string())
            .spawn(move || {
                Self::run_loop(events, running, metrics, poll_interval);
            });
        let handle = match handle {
            Ok(handle) => handle,
            Err(e) => {
                self.running.store(false, Ordering::Relaxed);
                return Err(e.into());
            }
        };

        self.handle = Some(handle);
        self.state = SchedulerState::Running;
        log::debug!("[scheduler] started ({} events)", self.len());
        Ok(())
    }

    /// Main loop (runs in the scheduler thread)
    fn run_loop(
        events: EventSet,
        running: Arc<AtomicBool>,
        metrics: Arc<SchedulerMetrics>,
        poll_interval: Duration,
    ) {
        while running.load(Ordering::Relaxed) {
            let now = Instant::now();
            let due: Vec<(u64, String, EventHandler, EventKind)> = events
                .lock()
                .iter()
                .filter(|e| e.is_due(now))
                .map(|e| (e.seq, e.name.clone(), Arc::clone(&e.handler), e.kind))
                .collect();

            for (seq, name, handler, kind) in due {
                if !running.load(Ordering::Relaxed) {
                    break;
                }

                if catch_unwind(AssertUnwindSafe(|| handler())).is_err() {
                    metrics.handler_panics.fetch_add(1, Ordering::Relaxed);
                    log::error!("[scheduler] handler '{}' panicked", name);
                }
                metrics.fired.fetch_add(1, Ordering::Relaxed);

                let mut guard = events.lock();
                match kind {
                    EventKind::OneShot => {
                        if guard.remove_by(|e| e.seq == seq).is_some() {
                            log::trace!("[scheduler] one-shot '{}' fired and removed", name);
                        }
                    }
                    EventKind::Periodic => {
                        if let Some(event) = guard.find_by_mut(|e| e.seq == seq) {
                            event.arm(Instant::now());
                        }
                    }
                }
            }

            thread::sleep(poll_interval);
        }
        log::debug!("[scheduler] thread exiting");
    }

    /// Clear the running flag and join the polling thread.
    ///
    /// No-op if not running. When called from a handler (on the scheduler
    /// thread itself) the thread is signalled but not joined.
    pub fn stop(&mut self) {
        if self.state != SchedulerState::Running {
            return;
        }
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() == thread::current().id() {
                log::warn!("[scheduler] stop() called from a handler, not joining");
            } else {
                let _ = handle.join();
            }
        }
        self.state = SchedulerState::Stopped;
        log::debug!("[scheduler] stopped");
    }

    /// Stop if running and drop every event.
    pub fn close(&mut self) {
        if self.state == SchedulerState::Closed {
            return;
        }
        self.stop();
        self.events.lock().clear();
        self.state = SchedulerState::Closed;
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        (count, move || {
            c.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_zero_max_events_rejected() {
        assert!(matches!(
            Scheduler::open(SchedulerConfig::bounded(0)),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_add_event_validation() {
        let scheduler = Scheduler::open(SchedulerConfig::bounded(1)).expect("open");
        assert!(matches!(
            scheduler.add_event(Event::periodic("", Duration::from_secs(1), || {})),
            Err(Error::InvalidArgument(_))
        ));
        scheduler
            .add_event(Event::periodic("a", Duration::from_secs(1), || {}))
            .expect("add");
        assert!(matches!(
            scheduler.add_event(Event::one_shot("a", Duration::ZERO, || {})),
            Err(Error::AlreadyPresent)
        ));
        assert!(matches!(
            scheduler.add_event(Event::one_shot("b", Duration::ZERO, || {})),
            Err(Error::CapacityExceeded { capacity: 1 })
        ));
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn test_one_shot_fires_once_and_is_removed() {
        let (count, handler) = counter();
        let mut scheduler = Scheduler::open(SchedulerConfig::default()).expect("open");
        scheduler
            .add_event(Event::one_shot("once", Duration::from_millis(5), handler))
            .expect("add");
        scheduler.start().expect("start");
        thread::sleep(Duration::from_millis(150));
        scheduler.stop();

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!scheduler.contains("once"));
    }

    #[test]
    fn test_panicking_handler_is_contained() {
        let (count, handler) = counter();
        let mut scheduler = Scheduler::open(SchedulerConfig::default()).expect("open");
        scheduler
            .add_event(Event::one_shot("boom", Duration::ZERO, || panic!("handler failure")))
            .expect("add");
        scheduler
            .add_event(Event::periodic("tick", Duration::from_millis(5), handler))
            .expect("add");
        scheduler.start().expect("start");
        thread::sleep(Duration::from_millis(100));
        scheduler.stop();

        assert_eq!(scheduler.handler_panics(), 1);
        assert!(count.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut scheduler = Scheduler::open(SchedulerConfig::default()).expect("open");
        assert_eq!(scheduler.state(), SchedulerState::Opened);
        scheduler.start().expect("start");
        assert!(matches!(scheduler.start(), Err(Error::InvalidState(_))));
        scheduler.stop();
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
        scheduler.start().expect("restart");
        assert!(scheduler.is_running());
        scheduler.close();
        assert_eq!(scheduler.state(), SchedulerState::Closed);
        assert!(matches!(scheduler.start(), Err(Error::InvalidState(_))));
        assert!(scheduler
            .add_event(Event::periodic("late", Duration::from_secs(1), || {}))
            .is_err());
    }

    #[test]
    fn test_replacement_during_handler_survives() {
        let entered = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&entered);
        let mut scheduler = Scheduler::open(SchedulerConfig::default()).expect("open");
        scheduler
            .add_event(Event::one_shot("job", Duration::ZERO, move || {
                flag.store(true, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(100));
            }))
            .expect("add");
        scheduler.start().expect("start");

        for _ in 0..100 {
            if entered.load(Ordering::SeqCst) {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert!(entered.load(Ordering::SeqCst));

        // swap in a new "job" while the old handler is still running
        assert!(scheduler.remove_event("job"));
        scheduler
            .add_event(Event::one_shot("job", Duration::from_secs(60), || {}))
            .expect("replace");
        thread::sleep(Duration::from_millis(200));
        scheduler.stop();

        assert!(scheduler.contains("job"));
        assert_eq!(scheduler.fired(), 1);
    }

    #[test]
    fn test_remove_event() {
        let scheduler = Scheduler::open(SchedulerConfig::default()).expect("open");
        scheduler
            .add_event(Event::periodic("a", Duration::from_secs(1), || {}))
            .expect("add");
        assert!(scheduler.remove_event("a"));
        assert!(!scheduler.remove_event("a"));
        assert!(scheduler.is_empty());
    }
}
