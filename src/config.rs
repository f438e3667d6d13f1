use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const MIN_MINUTES: u32 = 1;
pub const MAX_MINUTES: u32 = 45;
pub const MAX_WORD_TARGET: u32 = 499;
pub const MAX_PERCENT: u32 = 100;
pub const MIN_SECONDS_PER_WORD: f64 = 0.01;
/// One answer per run at the longest timer; anything slower never answers.
pub const MAX_SECONDS_PER_WORD: f64 = (MAX_MINUTES * 60) as f64;

/// Options for one run. Values are clamped on construction and never
/// change afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivityConfig {
    time_limit_minutes: u32,
    word_target: u32,
    target_percent: u32,
    seconds_per_word: f64,
    auto_submit: bool,
}

impl ActivityConfig {
    pub fn new(
        time_limit_minutes: u32,
        word_target: u32,
        target_percent: u32,
        seconds_per_word: f64,
        auto_submit: bool,
    ) -> Self {
        let seconds_per_word = if seconds_per_word.is_finite() {
            seconds_per_word.clamp(MIN_SECONDS_PER_WORD, MAX_SECONDS_PER_WORD)
        } else {
            MIN_SECONDS_PER_WORD
        };
        Self {
            time_limit_minutes: time_limit_minutes.clamp(MIN_MINUTES, MAX_MINUTES),
            word_target: word_target.min(MAX_WORD_TARGET),
            target_percent: target_percent.min(MAX_PERCENT),
            seconds_per_word,
            auto_submit,
        }
    }

    pub fn time_limit_minutes(&self) -> u32 {
        self.time_limit_minutes
    }

    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(60 * u64::from(self.time_limit_minutes))
    }

    pub fn word_target(&self) -> u32 {
        self.word_target
    }

    pub fn target_percent(&self) -> u32 {
        self.target_percent
    }

    pub fn seconds_per_word(&self) -> f64 {
        self.seconds_per_word
    }

    pub fn answer_interval(&self) -> Duration {
        Duration::from_secs_f64(self.seconds_per_word)
    }

    pub fn auto_submit(&self) -> bool {
        self.auto_submit
    }
}

impl Default for ActivityConfig {
    fn default() -> Self {
        StoredOptions::default().into()
    }
}

impl From<StoredOptions> for ActivityConfig {
    fn from(o: StoredOptions) -> Self {
        Self::new(
            o.time_limit_minutes,
            o.word_target,
            o.target_percent,
            o.seconds_per_word,
            o.auto_submit,
        )
    }
}

/// Accepts `10` or `10m`.
pub fn parse_minutes(input: &str) -> Result<u32, ConfigError> {
    parse_whole("timer", input.trim().trim_end_matches('m'))
}

pub fn parse_word_target(input: &str) -> Result<u32, ConfigError> {
    parse_whole("word target", input)
}

/// Accepts `80` or `80%`.
pub fn parse_percent(input: &str) -> Result<u32, ConfigError> {
    parse_whole("target percent", input.trim().trim_end_matches('%'))
}

/// Accepts `0.5` or `0.5s`.
pub fn parse_seconds(input: &str) -> Result<f64, ConfigError> {
    let trimmed = input.trim().trim_end_matches('s').trim();
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ConfigError::InvalidNumber {
            field: "seconds per word",
            value: input.to_string(),
        })
}

fn parse_whole(field: &'static str, input: &str) -> Result<u32, ConfigError> {
    let trimmed = input.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(ConfigError::InvalidNumber {
            field,
            value: input.to_string(),
        });
    }
    // digits only, so overflow is the sole failure; saturate and let clamping handle it
    Ok(trimmed.parse().unwrap_or(u32::MAX))
}

/// Last-used options, remembered between runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredOptions {
    pub time_limit_minutes: u32,
    pub word_target: u32,
    pub target_percent: u32,
    pub seconds_per_word: f64,
    pub auto_submit: bool,
}

impl Default for StoredOptions {
    fn default() -> Self {
        Self {
            time_limit_minutes: 10,
            word_target: 100,
            target_percent: 100,
            seconds_per_word: 0.01,
            auto_submit: false,
        }
    }
}

impl From<&ActivityConfig> for StoredOptions {
    fn from(c: &ActivityConfig) -> Self {
        Self {
            time_limit_minutes: c.time_limit_minutes,
            word_target: c.word_target,
            target_percent: c.target_percent,
            seconds_per_word: c.seconds_per_word,
            auto_submit: c.auto_submit,
        }
    }
}

pub trait OptionsStore {
    fn load(&self) -> StoredOptions;
    fn save(&self, options: &StoredOptions) -> Result<(), ConfigError>;
}

#[derive(Debug, Clone)]
pub struct FileOptionsStore {
    path: PathBuf,
}

impl FileOptionsStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "drillpace") {
            pd.config_dir().join("options.json")
        } else {
            PathBuf::from("drillpace_options.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileOptionsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OptionsStore for FileOptionsStore {
    fn load(&self) -> StoredOptions {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(options) = serde_json::from_slice::<StoredOptions>(&bytes) {
                return options;
            }
            tracing::warn!(path = %self.path.display(), "ignoring unreadable options file");
        }
        StoredOptions::default()
    }

    fn save(&self, options: &StoredOptions) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(options)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}
