//! Cleaned, deduplicated transcript recording.
//!
//! Output is stripped of terminal control sequences, repeated spinner and
//! progress frames are collapsed into a single summary entry, and entries
//! are buffered until either the byte threshold or the flush timer hands
//! them to the persistence callback as a JSONL batch.

use crate::text::{clean_for_transcript, incomplete_tail_start, is_animation_frame};
use crate::{lock, now_ms, Dispatcher, RecorderConfig, Result, TermwatchError};
use std::sync::{Arc, Mutex};
use termwatch_types::TranscriptEntry;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Longest unfinished escape sequence held back for the next chunk. Anything
/// longer is cleaned as-is.
const MAX_PENDING_BYTES: usize = 4096;

/// Persistence callback. Receives newline-delimited JSON, one entry per line.
pub type FlushCallback = Arc<dyn Fn(Vec<u8>) + Send + Sync>;

#[derive(Debug, Default)]
struct RecorderState {
    buffer: Vec<TranscriptEntry>,
    buffer_bytes: usize,
    /// Last stored output, compared against incoming animation frames.
    last_output: String,
    /// Identical animation frames swallowed since `last_output` was stored.
    repeat_count: usize,
    /// Raw tail of the last chunk ending inside an escape sequence or a
    /// multi-byte character.
    pending: Vec<u8>,
    stopped: bool,
}

struct Shared {
    config: RecorderConfig,
    dispatcher: Dispatcher,
    flush_fn: FlushCallback,
    state: Mutex<RecorderState>,
}

impl Shared {
    /// Store one piece of cleaned output, collapsing repeated animation frames.
    fn store_output(&self, state: &mut RecorderState, cleaned: String) {
        if cleaned.is_empty() {
            return;
        }
        if is_animation_frame(&cleaned) && cleaned == state.last_output {
            state.repeat_count += 1;
            return;
        }
        push_repeat_summary(state);
        state.last_output.clone_from(&cleaned);
        self.push(state, TranscriptEntry::output(now_ms(), cleaned));
    }

    fn push(&self, state: &mut RecorderState, entry: TranscriptEntry) {
        state.buffer_bytes += entry.text.len();
        state.buffer.push(entry);
        if state.buffer_bytes >= self.config.flush_threshold_bytes {
            self.flush(state);
        }
    }

    /// Empty the buffer and hand its entries to the flush callback.
    /// Must be called with the state lock held.
    fn flush(&self, state: &mut RecorderState) {
        if state.buffer.is_empty() {
            return;
        }
        let entries = std::mem::take(&mut state.buffer);
        let bytes = std::mem::replace(&mut state.buffer_bytes, 0);
        debug!(
            target: "termwatch::transcript",
            entries = entries.len(),
            bytes,
            "Flushing transcript batch"
        );

        let flush_fn = self.flush_fn.clone();
        self.dispatcher.submit(move || {
            let batch = serialize_batch(&entries);
            if !batch.is_empty() {
                flush_fn(batch);
            }
        });
    }
}

/// Record how many frames were swallowed since the last stored output.
fn push_repeat_summary(state: &mut RecorderState) {
    if state.repeat_count == 0 {
        return;
    }
    let repeats = std::mem::replace(&mut state.repeat_count, 0);
    trace!(target: "termwatch::transcript", repeats, "Collapsed repeated frames");
    state
        .buffer
        .push(TranscriptEntry::output(now_ms(), format!("[repeated {} times]", repeats)));
}

/// Serialize entries as JSONL. Entries that fail to encode are skipped.
fn serialize_batch(entries: &[TranscriptEntry]) -> Vec<u8> {
    let mut batch = Vec::new();
    for entry in entries {
        match serde_json::to_vec(entry) {
            Ok(line) => {
                batch.extend_from_slice(&line);
                batch.push(b'\n');
            }
            Err(e) => {
                warn!(target: "termwatch::transcript", "Skipping unserializable entry: {}", e);
            }
        }
    }
    batch
}

/// Whether a raw input payload is a lone control keystroke (arrows arrive
/// as escape sequences, but a bare ESC, tab or ctrl-key is one byte).
fn is_control_keystroke(data: &[u8]) -> bool {
    matches!(data, [b] if *b < 0x20 && *b != b'\n' && *b != b'\r')
}

/// Records a session's cleaned input and output.
///
/// Owned by exactly one session. Dropping it performs the final flush.
pub struct TranscriptRecorder {
    shared: Arc<Shared>,
    flush_task: JoinHandle<()>,
}

impl std::fmt::Debug for TranscriptRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.shared.state);
        f.debug_struct("TranscriptRecorder")
            .field("config", &self.shared.config)
            .field("buffered_entries", &state.buffer.len())
            .field("buffered_bytes", &state.buffer_bytes)
            .finish()
    }
}

impl TranscriptRecorder {
    /// Create a recorder with default settings on the global dispatcher.
    ///
    /// Must be called from within a tokio runtime, which drives the flush timer.
    pub fn new<F>(flush_fn: F) -> Result<Self>
    where
        F: Fn(Vec<u8>) + Send + Sync + 'static,
    {
        Self::with_config(RecorderConfig::default(), Dispatcher::global(), flush_fn)
    }

    pub fn with_config<F>(config: RecorderConfig, dispatcher: Dispatcher, flush_fn: F) -> Result<Self>
    where
        F: Fn(Vec<u8>) + Send + Sync + 'static,
    {
        config.validate()?;
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| TermwatchError::NoRuntime)?;

        let shared = Arc::new(Shared {
            config,
            dispatcher,
            flush_fn: Arc::new(flush_fn),
            state: Mutex::new(RecorderState::default()),
        });
        let flush_task = runtime.spawn(run_flush_timer(shared.clone()));

        Ok(Self { shared, flush_task })
    }

    /// Record a chunk of terminal output.
    pub fn record_output(&self, data: &[u8]) {
        let shared = &self.shared;
        let mut state = lock(&shared.state);
        if state.stopped {
            return;
        }

        let mut raw = std::mem::take(&mut state.pending);
        raw.extend_from_slice(data);
        let cut = incomplete_tail_start(&raw);
        if raw.len() - cut <= MAX_PENDING_BYTES {
            state.pending = raw.split_off(cut);
        }

        let cleaned = clean_for_transcript(&String::from_utf8_lossy(&raw));
        shared.store_output(&mut state, cleaned);
    }

    /// Record a chunk of user input. Lone control keystrokes are ignored.
    pub fn record_input(&self, data: &[u8]) {
        if data.is_empty() || is_control_keystroke(data) {
            return;
        }
        let shared = &self.shared;
        let mut state = lock(&shared.state);
        if state.stopped {
            return;
        }
        let text = String::from_utf8_lossy(data).into_owned();
        shared.push(&mut state, TranscriptEntry::input(now_ms(), text));
    }

    /// Hand any buffered entries to the flush callback now.
    pub fn flush(&self) {
        let mut state = lock(&self.shared.state);
        if state.stopped {
            return;
        }
        self.shared.flush(&mut state);
    }

    /// Number of entries waiting for the next flush.
    pub fn buffered_entries(&self) -> usize {
        lock(&self.shared.state).buffer.len()
    }

    /// Stop the flush timer and flush whatever is left, including an
    /// unreported run of repeated frames. Idempotent.
    pub fn stop(&self) {
        let mut state = lock(&self.shared.state);
        if state.stopped {
            return;
        }
        state.stopped = true;
        self.flush_task.abort();

        let pending = std::mem::take(&mut state.pending);
        if pending.first() == Some(&0x1b) {
            debug!(
                target: "termwatch::transcript",
                bytes = pending.len(),
                "Dropping unterminated escape sequence"
            );
        } else if !pending.is_empty() {
            let cleaned = clean_for_transcript(&String::from_utf8_lossy(&pending));
            self.shared.store_output(&mut state, cleaned);
        }
        push_repeat_summary(&mut state);
        self.shared.flush(&mut state);
        trace!(target: "termwatch::transcript", "Recorder stopped");
    }
}

impl Drop for TranscriptRecorder {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_flush_timer(shared: Arc<Shared>) {
    let period = shared.config.flush_interval;
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    loop {
        ticker.tick().await;
        let mut state = lock(&shared.state);
        if state.stopped {
            return;
        }
        shared.flush(&mut state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_keystrokes() {
        assert!(is_control_keystroke(&[27]));
        assert!(is_control_keystroke(&[3]));
        assert!(is_control_keystroke(b"\t"));
        assert!(!is_control_keystroke(b"\n"));
        assert!(!is_control_keystroke(b"\r"));
        assert!(!is_control_keystroke(b"a"));
        assert!(!is_control_keystroke(b"\x1b[A"));
    }

    #[test]
    fn test_serialize_batch_is_jsonl() {
        let entries = vec![
            TranscriptEntry::output(1, "hello"),
            TranscriptEntry::input(2, "y\n"),
        ];
        let batch = String::from_utf8(serialize_batch(&entries)).unwrap();
        let lines: Vec<&str> = batch.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"ts":1,"type":"output","text":"hello"}"#);
        assert_eq!(lines[1], r#"{"ts":2,"type":"input","text":"y\n"}"#);
        assert!(batch.ends_with('\n'));
    }

    #[test]
    fn test_serialize_empty_batch() {
        assert!(serialize_batch(&[]).is_empty());
    }
}
