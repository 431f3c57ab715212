pub mod elapsed;
pub mod record;

pub use elapsed::{pad2, Elapsed, Readout};

use crate::clock::Clock;
use crate::scheduler::{PollHandle, Scheduler};
use crate::storage::{KeyValueStore, StoreError};
use record::{DecodeError, Restored};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_NAME: &str = "default";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;

const PROBE_KEY: &str = "__sw-test__";
const PROBE_VALUE: &str = "sw-test";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Paused,
    Running,
}

impl Status {
    /// Numeric form used in the persisted record.
    pub fn code(self) -> u8 {
        match self {
            Status::Paused => 0,
            Status::Running => 1,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Paused => write!(f, "paused"),
            Status::Running => write!(f, "running"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error(transparent)]
    Unavailable(#[from] StoreError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("failed to encode record: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Render sink, called with zero-padded hour, minute, second and centisecond.
pub type RenderFn = Box<dyn FnMut(&str, &str, &str, &str) + Send>;
pub type AlarmFn = Box<dyn FnMut() + Send>;

/// Host services a stopwatch depends on.
#[derive(Clone)]
pub struct Host {
    pub store: Arc<dyn KeyValueStore>,
    pub scheduler: Arc<dyn Scheduler>,
    pub clock: Arc<dyn Clock>,
}

impl Host {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        scheduler: Arc<dyn Scheduler>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            scheduler,
            clock,
        }
    }
}

pub struct StopwatchConfig {
    /// Empty names fall back to [`DEFAULT_NAME`].
    pub name: String,
    /// Tags supplied here take precedence over persisted tags.
    pub tags: Vec<String>,
    /// Zero falls back to [`DEFAULT_POLL_INTERVAL_MS`].
    pub poll_interval_ms: u64,
    pub render: Option<RenderFn>,
}

impl Default for StopwatchConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            tags: Vec::new(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            render: None,
        }
    }
}

impl StopwatchConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    pub fn with_render<F>(mut self, render: F) -> Self
    where
        F: FnMut(&str, &str, &str, &str) + Send + 'static,
    {
        self.render = Some(Box::new(render));
        self
    }
}

/// A named stopwatch whose state survives through a [`KeyValueStore`].
pub struct Stopwatch {
    name: String,
    status: Status,
    start_time: Option<i64>,
    elapsed: Elapsed,
    tags: Vec<String>,
    poll_interval: Duration,
    timeout_ms: u64,
    alarm: Option<AlarmFn>,
    render: Option<RenderFn>,
    poller: Option<PollHandle>,
    host: Host,
}

impl Stopwatch {
    /// Create a stopwatch, restoring any persisted state for its name.
    ///
    /// A stopwatch that was persisted while running is resumed, which arms a
    /// fresh poller and recomputes the start time from the restored fields.
    pub fn new(config: StopwatchConfig, host: Host) -> Self {
        let mut sw = Self::init(config, host);
        if sw.status == Status::Running {
            sw.status = Status::Paused;
            sw.start();
        }
        sw
    }

    fn init(config: StopwatchConfig, host: Host) -> Self {
        let name = if config.name.is_empty() {
            DEFAULT_NAME.to_string()
        } else {
            config.name
        };
        let poll_ms = if config.poll_interval_ms == 0 {
            DEFAULT_POLL_INTERVAL_MS
        } else {
            config.poll_interval_ms
        };
        let mut sw = Self {
            name,
            status: Status::Paused,
            start_time: None,
            elapsed: Elapsed::default(),
            tags: config.tags,
            poll_interval: Duration::from_millis(poll_ms),
            timeout_ms: 0,
            alarm: None,
            render: config.render,
            poller: None,
            host,
        };
        sw.restore();
        sw
    }

    /// Restored, never-started instance used by the `*_for` lookups.
    fn transient(name: &str, host: &Host) -> Self {
        Self::init(StopwatchConfig::named(name), host.clone())
    }

    pub fn status_for(name: &str, host: &Host) -> Status {
        Self::transient(name, host).status()
    }

    pub fn current_for(name: &str, host: &Host) -> u64 {
        Self::transient(name, host).current()
    }

    pub fn tags_for(name: &str, host: &Host) -> Vec<String> {
        Self::transient(name, host).tags().to_vec()
    }

    pub fn is_running_for(name: &str, host: &Host) -> bool {
        Self::transient(name, host).is_running()
    }

    pub fn can_use_store_for(name: &str, host: &Host) -> bool {
        Self::transient(name, host).can_use_store()
    }

    pub fn start(&mut self) {
        if self.status == Status::Running {
            return;
        }
        self.status = Status::Running;
        self.poller = Some(self.host.scheduler.arm(self.poll_interval));
        self.start_time = Some(
            self.host
                .clock
                .now_ms()
                .saturating_sub(self.current() as i64),
        );
        tracing::debug!(name = %self.name, start_time = ?self.start_time, "stopwatch started");
        self.store();
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.poller.take() {
            self.host.scheduler.cancel(handle);
        }
        self.status = Status::Paused;
        tracing::debug!(name = %self.name, current = self.current(), "stopwatch stopped");
        self.render();
        self.store();
    }

    /// Zero the stopwatch and forget its record. Ignored while running.
    pub fn reset(&mut self) {
        if self.status == Status::Running {
            tracing::debug!(name = %self.name, "reset ignored while running");
            return;
        }
        self.poller = None;
        self.start_time = None;
        self.elapsed = Elapsed::default();
        tracing::debug!(name = %self.name, "stopwatch reset");
        self.render();
        self.delete();
    }

    /// Recompute the elapsed fields, render, and fire the alarm when due.
    pub fn run(&mut self) {
        let now = self.host.clock.now_ms();
        let diff = now.saturating_sub(self.start_time.unwrap_or(now)).max(0) as u64;
        self.elapsed = Elapsed::from_millis(diff);
        self.render();

        if self.timeout_ms > 0 && diff >= self.timeout_ms {
            if let Some(mut alarm) = self.alarm.take() {
                tracing::debug!(name = %self.name, timeout_ms = self.timeout_ms, "alarm fired");
                alarm();
                self.alarm = Some(alarm);
                self.stop();
                self.reset();
            }
        }
    }

    /// Tick entry point for the host scheduler. Handles other than the one
    /// this instance armed are ignored.
    pub fn on_poll(&mut self, handle: PollHandle) {
        if self.poller == Some(handle) {
            self.run();
        }
    }

    /// Arm a one-shot alarm at `timeout_ms` of elapsed time and start.
    pub fn set_timer<F>(&mut self, timeout_ms: u64, alarm: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.timeout_ms = timeout_ms;
        self.alarm = Some(Box::new(alarm));
        self.start();
    }

    /// Total elapsed milliseconds, recomposed from the elapsed fields.
    pub fn current(&self) -> u64 {
        self.elapsed.total_millis()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == Status::Running
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn hour(&self) -> u64 {
        self.elapsed.hour
    }

    pub fn minute(&self) -> u64 {
        self.elapsed.minute
    }

    pub fn second(&self) -> u64 {
        self.elapsed.second
    }

    pub fn millisecond(&self) -> u64 {
        self.elapsed.millisecond
    }

    pub fn centisecond(&self) -> u64 {
        self.elapsed.centisecond
    }

    pub fn start_time(&self) -> Option<i64> {
        self.start_time
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn poll_handle(&self) -> Option<PollHandle> {
        self.poller
    }

    pub fn readout(&self) -> Readout {
        self.elapsed.readout()
    }

    pub fn str_hour(&self) -> String {
        pad2(self.elapsed.hour)
    }

    pub fn str_minute(&self) -> String {
        pad2(self.elapsed.minute)
    }

    pub fn str_second(&self) -> String {
        pad2(self.elapsed.second)
    }

    pub fn str_centisecond(&self) -> String {
        pad2(self.elapsed.centisecond)
    }

    /// Check that the store accepts writes.
    pub fn can_use_store(&self) -> bool {
        match self.host.store.set(PROBE_KEY, PROBE_VALUE) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("cannot use stopwatch store: {e}");
                false
            }
        }
    }

    /// Persist the current state. Failures are logged and otherwise ignored.
    pub fn store(&self) {
        if let Err(e) = self.try_store() {
            tracing::error!(name = %self.name, "failed to store stopwatch: {e}");
        }
    }

    /// Reload state from the store, falling back to a zeroed paused stopwatch
    /// when there is no usable record.
    pub fn restore(&mut self) {
        let restored = match self.load_record() {
            Ok(Some(r)) => r,
            Ok(None) => Restored::default(),
            Err(e) => {
                tracing::error!(name = %self.name, "failed to restore stopwatch: {e}");
                Restored::default()
            }
        };
        let now = self.host.clock.now_ms();
        self.status = restored.status;
        if self.tags.is_empty() {
            self.tags = restored.tags.unwrap_or_default();
        }
        self.start_time = Some(match self.status {
            Status::Running => restored.start_time.unwrap_or(now),
            Status::Paused => now.saturating_sub(restored.current.unwrap_or(0) as i64),
        });
        self.run();
    }

    fn try_store(&self) -> Result<(), PersistenceError> {
        let text = record::encode(self.start_time, self.current(), self.status, &self.tags)
            .map_err(PersistenceError::Encode)?;
        self.host.store.set(&record::storage_key(&self.name), &text)?;
        Ok(())
    }

    fn load_record(&self) -> Result<Option<Restored>, PersistenceError> {
        let text = self.host.store.get(&record::storage_key(&self.name))?;
        match text {
            Some(text) if !text.is_empty() => Ok(Some(record::decode(&text)?)),
            _ => Ok(None),
        }
    }

    fn delete(&self) {
        if let Err(e) = self.host.store.remove(&record::storage_key(&self.name)) {
            tracing::error!(name = %self.name, "failed to delete stopwatch record: {e}");
        }
    }

    fn render(&mut self) {
        let readout = self.elapsed.readout();
        if let Some(render) = self.render.as_mut() {
            render(
                &readout.hour,
                &readout.minute,
                &readout.second,
                &readout.centisecond,
            );
        }
    }
}

impl Drop for Stopwatch {
    fn drop(&mut self) {
        if let Some(handle) = self.poller.take() {
            self.host.scheduler.cancel(handle);
        }
    }
}

impl fmt::Debug for Stopwatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stopwatch")
            .field("name", &self.name)
            .field("status", &self.status)
            .field("start_time", &self.start_time)
            .field("elapsed", &self.elapsed)
            .field("tags", &self.tags)
            .field("timeout_ms", &self.timeout_ms)
            .field("poller", &self.poller)
            .finish()
    }
}
