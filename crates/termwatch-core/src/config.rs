//! Tunables for the classifier, recorder and summary helpers.

use crate::{Result, TermwatchError};
use std::time::Duration;

/// Settings for [`crate::ActivityClassifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierConfig {
    /// Quiet period after which an active session is considered idle.
    pub idle_timeout: Duration,
    /// Minimum time between two accepted status changes.
    pub debounce_interval: Duration,
    /// Maximum bytes of trailing output kept for prompt matching.
    pub window_bytes: usize,
    /// Number of trailing lines examined for prompt signatures.
    pub prompt_lines: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(10),
            debounce_interval: Duration::from_millis(500),
            window_bytes: 4096,
            prompt_lines: 3,
        }
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<()> {
        if self.idle_timeout.is_zero() {
            return Err(TermwatchError::InvalidConfig("idle_timeout must be non-zero".into()));
        }
        if self.window_bytes == 0 {
            return Err(TermwatchError::InvalidConfig("window_bytes must be non-zero".into()));
        }
        if self.prompt_lines == 0 {
            return Err(TermwatchError::InvalidConfig("prompt_lines must be non-zero".into()));
        }
        Ok(())
    }
}

/// Settings for [`crate::TranscriptRecorder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderConfig {
    /// Buffered byte count that triggers an immediate flush.
    pub flush_threshold_bytes: usize,
    /// Period of the background flush timer.
    pub flush_interval: Duration,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            flush_threshold_bytes: 1024,
            flush_interval: Duration::from_secs(5),
        }
    }
}

impl RecorderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.flush_threshold_bytes == 0 {
            return Err(TermwatchError::InvalidConfig(
                "flush_threshold_bytes must be non-zero".into(),
            ));
        }
        if self.flush_interval.is_zero() {
            return Err(TermwatchError::InvalidConfig("flush_interval must be non-zero".into()));
        }
        Ok(())
    }
}

/// Limits applied when preparing transcript text for a summarizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryConfig {
    /// Leading characters of terminal output used to derive a title.
    pub title_context_chars: usize,
    /// Trailing characters of a transcript used to extract learnings.
    pub learnings_context_chars: usize,
    /// Longest title kept from a summarizer reply.
    pub title_max_chars: usize,
    /// Below this many characters there is not enough output to title.
    pub min_title_input_chars: usize,
    /// Below this many characters a transcript is too short for learnings.
    pub min_learnings_input_chars: usize,
    /// Most recent learnings carried into a new session's context.
    pub max_learnings: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            title_context_chars: 2000,
            learnings_context_chars: 4000,
            title_max_chars: 80,
            min_title_input_chars: 50,
            min_learnings_input_chars: 100,
            max_learnings: 10,
        }
    }
}

impl SummaryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.title_context_chars == 0
            || self.learnings_context_chars == 0
            || self.title_max_chars == 0
            || self.max_learnings == 0
        {
            return Err(TermwatchError::InvalidConfig(
                "summary context limits must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Settings for a [`crate::SessionMonitor`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorConfig {
    pub classifier: ClassifierConfig,
    pub recorder: RecorderConfig,
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<()> {
        self.classifier.validate()?;
        self.recorder.validate()
    }
}
