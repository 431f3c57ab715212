pub mod clock;
pub mod logging;
pub mod scheduler;
pub mod settings;
pub mod stopwatch;
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use scheduler::{IntervalScheduler, PollHandle, Scheduler};
pub use stopwatch::{Host, Status, Stopwatch, StopwatchConfig};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore, StoreError};
