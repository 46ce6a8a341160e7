//! Activity classification and transcript recording for live terminal sessions.
//!
//! Each monitored session owns an [`ActivityClassifier`] and a
//! [`TranscriptRecorder`], usually bundled in a [`SessionMonitor`]. Both are
//! fed raw PTY bytes on the reader's hot path; anything slow (status
//! notifications, transcript persistence) is handed to a [`Dispatcher`].

mod classifier;
mod config;
mod dispatch;
mod error;
mod monitor;
mod recorder;
mod summary;
mod transcript;

pub mod text;

pub use classifier::{matches_prompt, ActivityClassifier, StatusCallback};
pub use config::{ClassifierConfig, MonitorConfig, RecorderConfig, SummaryConfig};
pub use dispatch::{Dispatcher, DEFAULT_QUEUE_CAPACITY};
pub use error::TermwatchError;
pub use monitor::SessionMonitor;
pub use recorder::{FlushCallback, TranscriptRecorder};
pub use summary::{
    clean_for_summary, dedupe_learnings, learnings_context, parse_learnings, sanitize_title,
    session_context, title_context,
};
pub use transcript::{
    extract_snippet, parse_transcript, read_transcript_file, render_transcript,
    search_transcript, SNIPPET_CONTEXT_CHARS,
};

/// Result type for termwatch operations.
pub type Result<T> = std::result::Result<T, TermwatchError>;

/// Lock a mutex, recovering the guard if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &std::sync::Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
