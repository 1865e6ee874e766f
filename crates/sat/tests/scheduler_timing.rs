// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::missing_panics_doc)] // Tests/examples panic on failure

//! Scheduler timing guarantees measured against wall clock.

use parking_lot::Mutex;
use sat::scheduler::{Event, Scheduler, SchedulerConfig};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn recorder() -> (Arc<Mutex<Vec<Instant>>>, impl Fn() + Send + Sync + 'static) {
    let fired = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&fired);
    (fired, move || sink.lock().push(Instant::now()))
}

#[test]
fn periodic_firings_are_at_least_one_period_apart() {
    let period = Duration::from_millis(20);
    let (fired, handler) = recorder();
    let mut scheduler = Scheduler::open(SchedulerConfig::default()).expect("open");
    scheduler
        .add_event(Event::periodic("tick", period, handler))
        .expect("add");

    let started = Instant::now();
    scheduler.start().expect("start");
    thread::sleep(Duration::from_millis(250));
    scheduler.stop();

    let fired = fired.lock();
    assert!(fired.len() >= 3, "only {} firings", fired.len());
    assert!(fired[0].duration_since(started) >= period);
    for pair in fired.windows(2) {
        assert!(pair[1].duration_since(pair[0]) >= period);
    }
}

#[test]
fn one_shot_fires_at_most_once() {
    let (fired, handler) = recorder();
    let mut scheduler = Scheduler::open(SchedulerConfig::default()).expect("open");
    scheduler
        .add_event(Event::one_shot("once", Duration::from_millis(10), handler))
        .expect("add");
    scheduler.start().expect("start");
    thread::sleep(Duration::from_millis(150));

    assert_eq!(fired.lock().len(), 1);
    assert!(!scheduler.contains("once"));
    scheduler.close();
}

#[test]
fn events_added_while_running_are_armed_at_add_time() {
    let mut scheduler = Scheduler::open(SchedulerConfig::default()).expect("open");
    scheduler.start().expect("start");
    thread::sleep(Duration::from_millis(50));

    let (fired, handler) = recorder();
    let added = Instant::now();
    scheduler
        .add_event(Event::one_shot("late", Duration::from_millis(30), handler))
        .expect("add");
    thread::sleep(Duration::from_millis(150));
    scheduler.stop();

    let fired = fired.lock();
    assert_eq!(fired.len(), 1);
    assert!(fired[0].duration_since(added) >= Duration::from_millis(30));
}

#[test]
fn stop_halts_firing() {
    let (fired, handler) = recorder();
    let mut scheduler = Scheduler::open(SchedulerConfig::default()).expect("open");
    scheduler
        .add_event(Event::periodic("tick", Duration::from_millis(5), handler))
        .expect("add");
    scheduler.start().expect("start");
    thread::sleep(Duration::from_millis(60));
    scheduler.stop();

    let count = fired.lock().len();
    thread::sleep(Duration::from_millis(60));
    assert_eq!(fired.lock().len(), count);
    assert!(scheduler.fired() >= count as u64);
}
