//! Transcript record types.

use serde::{Deserialize, Serialize};

/// Direction of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Keystrokes typed into the session.
    Input,
    /// Cleaned terminal output.
    Output,
}

/// A single line of the transcript log.
///
/// Serialized as one JSON object per line: `{"ts":..,"type":..,"text":..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Wall-clock time in milliseconds since the Unix epoch.
    pub ts: i64,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub text: String,
}

impl TranscriptEntry {
    pub fn output(ts: i64, text: impl Into<String>) -> Self {
        Self {
            ts,
            kind: EntryKind::Output,
            text: text.into(),
        }
    }

    pub fn input(ts: i64, text: impl Into<String>) -> Self {
        Self {
            ts,
            kind: EntryKind::Input,
            text: text.into(),
        }
    }
}

/// A search hit inside a stored transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptMatch {
    /// Where the transcript came from (file path, session name).
    pub source: String,
    /// Byte offset of the match in the raw transcript.
    pub offset: usize,
    /// Text around the match, whitespace collapsed.
    pub snippet: String,
}
