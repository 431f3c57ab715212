use crate::stopwatch::{StopwatchConfig, DEFAULT_POLL_INTERVAL_MS};
use serde::{Deserialize, Serialize};

pub const SETTINGS_FILE: &str = "swatch.json";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// When enabled the logger is initialised at debug level.
    /// Defaults to `false` when the field is missing in the settings file.
    #[serde(default)]
    pub debug_logging: bool,
    /// Optional file receiving log output instead of stderr.
    #[serde(default)]
    pub log_file: Option<String>,
    /// JSON file holding the persisted stopwatch records.
    #[serde(default = "default_store_path")]
    pub store_path: String,
    /// Interval between poller ticks in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Tags applied to stopwatches started without explicit tags.
    #[serde(default)]
    pub default_tags: Vec<String>,
}

fn default_store_path() -> String {
    "swatch_store.json".into()
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug_logging: false,
            log_file: None,
            store_path: default_store_path(),
            poll_interval_ms: default_poll_interval_ms(),
            default_tags: Vec::new(),
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Stopwatch configuration for `name`. Explicit tags win over
    /// `default_tags`.
    pub fn stopwatch_config(&self, name: &str, tags: Vec<String>) -> StopwatchConfig {
        let tags = if tags.is_empty() {
            self.default_tags.clone()
        } else {
            tags
        };
        StopwatchConfig::named(name)
            .with_tags(tags)
            .with_poll_interval_ms(self.poll_interval_ms)
    }
}
