//! Session activity states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Activity state of a monitored session.
///
/// A session starts `Active`. `Idle` is only entered from `Active` after a
/// quiet period, and `Exited` is terminal once the process is gone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    /// Producing output.
    #[default]
    Active,
    /// Trailing output looks like a prompt waiting on the user.
    NeedsInput,
    /// No output for at least the idle timeout.
    Idle,
    /// The process has exited.
    Exited,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::NeedsInput => "needs-input",
            SessionStatus::Idle => "idle",
            SessionStatus::Exited => "exited",
        }
    }

    /// Whether the session is doing something a user may want to look at.
    pub fn is_live(&self) -> bool {
        matches!(self, SessionStatus::Active | SessionStatus::NeedsInput)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An accepted status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub previous: SessionStatus,
    pub current: SessionStatus,
}

impl fmt::Display for StatusChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.previous, self.current)
    }
}
