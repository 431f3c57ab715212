
use harness::Harness;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use swatch::{Status, Stopwatch, StopwatchConfig};

fn counter() -> (Arc<AtomicUsize>, impl FnMut() + Send + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let c = count.clone();
    (count, move || {
        c.fetch_add(1, Ordering::SeqCst);
    })
}

#[test]
fn alarm_fires_once_then_stops_and_resets() {
    let h = Harness::new();
    let (count, alarm) = counter();
    let mut sw = Stopwatch::new(StopwatchConfig::named("tea"), h.host.clone());
    sw.set_timer(5_000, alarm);
    assert!(sw.is_running());
    assert!(h.record("tea").is_some());

    h.run_for(&mut sw, 5_010, 10);
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(sw.status(), Status::Paused);
    assert_eq!(sw.current(), 0);
    assert_eq!(sw.start_time(), None);
    assert!(h.record("tea").is_none());
    assert_eq!(h.scheduler.armed(), 0);

    h.run_for(&mut sw, 10_000, 10);
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn alarm_waits_for_threshold() {
    let h = Harness::new();
    let (count, alarm) = counter();
    let mut sw = Stopwatch::new(StopwatchConfig::named("egg"), h.host.clone());
    sw.set_timer(5_000, alarm);
    h.run_for(&mut sw, 4_990, 10);
    assert_eq!(count.load(Ordering::SeqCst), 0);
    assert!(sw.is_running());
    assert_eq!(sw.current(), 4_990);
}

#[test]
fn alarm_fires_again_after_restart() {
    let h = Harness::new();
    let (count, alarm) = counter();
    let mut sw = Stopwatch::new(StopwatchConfig::named("laps"), h.host.clone());
    sw.set_timer(1_000, alarm);
    h.run_for(&mut sw, 1_000, 10);
    assert_eq!(count.load(Ordering::SeqCst), 1);

    sw.start();
    h.run_for(&mut sw, 1_000, 10);
    assert_eq!(count.load(Ordering::SeqCst), 2);
    assert!(!sw.is_running());
}

#[test]
fn alarm_counts_previously_accumulated_time() {
    let h = Harness::new();
    let (count, alarm) = counter();
    let mut sw = Stopwatch::new(StopwatchConfig::named("acc"), h.host.clone());
    sw.start();
    h.run_for(&mut sw, 3_000, 10);
    sw.stop();

    sw.set_timer(5_000, alarm);
    h.run_for(&mut sw, 1_990, 10);
    assert_eq!(count.load(Ordering::SeqCst), 0);
    h.run_for(&mut sw, 10, 10);
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn zero_threshold_disables_alarm() {
    let h = Harness::new();
    let (count, alarm) = counter();
    let mut sw = Stopwatch::new(StopwatchConfig::named("off"), h.host.clone());
    sw.set_timer(0, alarm);
    h.run_for(&mut sw, 2_000, 10);
    assert_eq!(count.load(Ordering::SeqCst), 0);
    assert!(sw.is_running());
}
