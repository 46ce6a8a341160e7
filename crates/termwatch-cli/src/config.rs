//! Tool configuration.

use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use termwatch_core::{ClassifierConfig, MonitorConfig, RecorderConfig, SummaryConfig};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_dispatch_queue")]
    pub dispatch_queue: usize,
    #[serde(default)]
    pub classifier: ClassifierSection,
    #[serde(default)]
    pub recorder: RecorderSection,
    #[serde(default)]
    pub summary: SummarySection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierSection {
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_window_bytes")]
    pub window_bytes: usize,
    #[serde(default = "default_prompt_lines")]
    pub prompt_lines: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecorderSection {
    #[serde(default = "default_flush_threshold_bytes")]
    pub flush_threshold_bytes: usize,
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummarySection {
    #[serde(default = "default_title_context_chars")]
    pub title_context_chars: usize,
    #[serde(default = "default_learnings_context_chars")]
    pub learnings_context_chars: usize,
    #[serde(default = "default_title_max_chars")]
    pub title_max_chars: usize,
    #[serde(default = "default_min_title_input_chars")]
    pub min_title_input_chars: usize,
    #[serde(default = "default_min_learnings_input_chars")]
    pub min_learnings_input_chars: usize,
    #[serde(default = "default_max_learnings")]
    pub max_learnings: usize,
}

fn default_dispatch_queue() -> usize {
    termwatch_core::DEFAULT_QUEUE_CAPACITY
}

fn default_idle_timeout_ms() -> u64 {
    10_000
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_window_bytes() -> usize {
    4096
}

fn default_prompt_lines() -> usize {
    3
}

fn default_flush_threshold_bytes() -> usize {
    1024
}

fn default_flush_interval_ms() -> u64 {
    5_000
}

fn default_title_context_chars() -> usize {
    2000
}

fn default_learnings_context_chars() -> usize {
    4000
}

fn default_title_max_chars() -> usize {
    80
}

fn default_min_title_input_chars() -> usize {
    50
}

fn default_min_learnings_input_chars() -> usize {
    100
}

fn default_max_learnings() -> usize {
    10
}

impl Default for ClassifierSection {
    fn default() -> Self {
        Self {
            idle_timeout_ms: default_idle_timeout_ms(),
            debounce_ms: default_debounce_ms(),
            window_bytes: default_window_bytes(),
            prompt_lines: default_prompt_lines(),
        }
    }
}

impl Default for RecorderSection {
    fn default() -> Self {
        Self {
            flush_threshold_bytes: default_flush_threshold_bytes(),
            flush_interval_ms: default_flush_interval_ms(),
        }
    }
}

impl Default for SummarySection {
    fn default() -> Self {
        Self {
            title_context_chars: default_title_context_chars(),
            learnings_context_chars: default_learnings_context_chars(),
            title_max_chars: default_title_max_chars(),
            min_title_input_chars: default_min_title_input_chars(),
            min_learnings_input_chars: default_min_learnings_input_chars(),
            max_learnings: default_max_learnings(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dispatch_queue: default_dispatch_queue(),
            classifier: ClassifierSection::default(),
            recorder: RecorderSection::default(),
            summary: SummarySection::default(),
        }
    }
}

impl Config {
    /// Load config from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.monitor_config().validate()?;
        config.summary_config().validate()?;
        Ok(config)
    }

    /// Load config from the user config directory, or fall back to defaults.
    pub fn load() -> Result<Self> {
        if let Some(path) = default_config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Config::default())
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            classifier: ClassifierConfig {
                idle_timeout: Duration::from_millis(self.classifier.idle_timeout_ms),
                debounce_interval: Duration::from_millis(self.classifier.debounce_ms),
                window_bytes: self.classifier.window_bytes,
                prompt_lines: self.classifier.prompt_lines,
            },
            recorder: RecorderConfig {
                flush_threshold_bytes: self.recorder.flush_threshold_bytes,
                flush_interval: Duration::from_millis(self.recorder.flush_interval_ms),
            },
        }
    }

    pub fn summary_config(&self) -> SummaryConfig {
        SummaryConfig {
            title_context_chars: self.summary.title_context_chars,
            learnings_context_chars: self.summary.learnings_context_chars,
            title_max_chars: self.summary.title_max_chars,
            min_title_input_chars: self.summary.min_title_input_chars,
            min_learnings_input_chars: self.summary.min_learnings_input_chars,
            max_learnings: self.summary.max_learnings,
        }
    }
}

/// `<config dir>/termwatch/config.toml`, e.g. `~/.config/termwatch/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("termwatch").join("config.toml"))
}
