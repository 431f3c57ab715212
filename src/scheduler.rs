use crate::clock::Clock;
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

/// Identifies one armed periodic poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PollHandle(u64);

/// Host scheduler that arms and cancels fixed-interval pollers.
pub trait Scheduler: Send + Sync {
    fn arm(&self, interval: Duration) -> PollHandle;
    fn cancel(&self, handle: PollHandle);
}

struct Entry {
    interval_ms: i64,
    next_due: i64,
}

/// Interval scheduler driven by a [`Clock`].
///
/// The host loop calls [`IntervalScheduler::due`] and forwards each returned
/// handle to the instance that armed it. Intervals missed while the host was
/// busy collapse into a single tick.
pub struct IntervalScheduler {
    clock: Arc<dyn Clock>,
    next_id: AtomicU64,
    entries: Mutex<HashMap<u64, Entry>>,
}

impl IntervalScheduler {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            next_id: AtomicU64::new(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Handles whose deadline has passed, in arming order.
    pub fn due(&self) -> Vec<PollHandle> {
        let now = self.clock.now_ms();
        let mut fired = Vec::new();
        if let Ok(mut guard) = self.entries.lock() {
            for (id, entry) in guard.iter_mut() {
                if entry.next_due <= now {
                    fired.push(PollHandle(*id));
                    let behind = (now - entry.next_due) / entry.interval_ms + 1;
                    entry.next_due += behind * entry.interval_ms;
                }
            }
        }
        fired.sort_by_key(|h| h.0);
        fired
    }

    /// Time until the earliest armed deadline, `None` when nothing is armed.
    pub fn until_next(&self) -> Option<Duration> {
        let now = self.clock.now_ms();
        let earliest = {
            let guard = self.entries.lock().ok()?;
            guard.values().map(|e| e.next_due).min()
        };
        earliest.map(|due| Duration::from_millis((due - now).max(0) as u64))
    }

    /// Number of currently armed pollers.
    pub fn armed(&self) -> usize {
        self.entries.lock().map(|g| g.len()).unwrap_or(0)
    }
}

impl Scheduler for IntervalScheduler {
    fn arm(&self, interval: Duration) -> PollHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let interval_ms = (interval.as_millis() as i64).max(1);
        let entry = Entry {
            interval_ms,
            next_due: self.clock.now_ms() + interval_ms,
        };
        if let Ok(mut guard) = self.entries.lock() {
            guard.insert(id, entry);
        }
        tracing::debug!(handle = id, interval_ms, "poller armed");
        PollHandle(id)
    }

    fn cancel(&self, handle: PollHandle) {
        if let Ok(mut guard) = self.entries.lock() {
            if guard.remove(&handle.0).is_some() {
                tracing::debug!(handle = handle.0, "poller cancelled");
            }
        }
    }
}
