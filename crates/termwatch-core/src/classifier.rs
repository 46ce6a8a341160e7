//! Real-time activity classification from raw terminal output.
//!
//! The classifier keeps a bounded tail of recent output, matches its last few
//! lines against known prompt signatures, and drives a debounced state machine
//! over [`SessionStatus`]. A background timer moves an active session to
//! `Idle` once output has been quiet for the idle timeout.
//!
//! `Exited` is terminal: once accepted, no later output moves the session
//! out of it.
//!
//! Debounce drops, it does not defer: a candidate status arriving within the
//! debounce interval of the last accepted change is discarded, so rapid
//! toggling can hide a real `NeedsInput` until the next chunk of output.

use crate::text::{last_lines, strip_ansi};
use crate::{lock, ClassifierConfig, Dispatcher, Result, TermwatchError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::{Arc, Mutex};
use termwatch_types::SessionStatus;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, trace};

/// Patterns indicating the session is waiting for user input.
/// These match the tail of terminal output once escape codes are removed.
static PROMPT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"❯\s*$",                              // main prompt chevron
        r">\s*$",                              // continuation prompt
        r"\$\s*$",                             // shell prompt
        r"\?\s*\(?(yes|no|y/n)\)?",            // yes/no confirmation
        r"Do you want to proceed",             // permission prompt
        r"\(Y\)es.*\(N\)o",                    // (Y)es / (N)o menu
        r"Press Enter to continue",            // continue prompt
        r"\[Y/n\]",                            // standard Y/n prompt
        r"waiting for (?:input|response)",     // explicit waiting message
    ]
    .iter()
    .map(|p| Regex::new(p).expect("prompt pattern is valid"))
    .collect()
});

/// Check whether text matches any known prompt signature.
pub fn matches_prompt(text: &str) -> bool {
    PROMPT_PATTERNS.iter().any(|p| p.is_match(text))
}

/// Listener for accepted status changes, called with `(previous, new)`.
pub type StatusCallback = Arc<dyn Fn(SessionStatus, SessionStatus) + Send + Sync>;

/// Tail of recent output, capped in bytes. Oldest bytes are dropped first.
///
/// Bytes are kept raw so multi-byte characters and escape sequences split
/// across chunks are reassembled before matching.
#[derive(Debug)]
struct TailWindow {
    bytes: Vec<u8>,
    cap: usize,
}

impl TailWindow {
    fn new(cap: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(cap),
            cap,
        }
    }

    fn push(&mut self, data: &[u8]) {
        if data.len() >= self.cap {
            self.bytes.clear();
            self.bytes.extend_from_slice(&data[data.len() - self.cap..]);
            return;
        }
        self.bytes.extend_from_slice(data);
        if self.bytes.len() > self.cap {
            let excess = self.bytes.len() - self.cap;
            self.bytes.drain(..excess);
        }
    }

    fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

#[derive(Debug)]
struct ClassifierState {
    status: SessionStatus,
    window: TailWindow,
    last_output_at: Instant,
    /// `None` until the first accepted change, so it is never debounced.
    last_change_at: Option<Instant>,
    /// When the idle timer should next evaluate. Pushed forward by output.
    idle_deadline: Instant,
    stopped: bool,
}

struct Shared {
    config: ClassifierConfig,
    dispatcher: Dispatcher,
    notify: StatusCallback,
    state: Mutex<ClassifierState>,
}

impl Shared {
    /// Debounced status setter. Must be called with the state lock held.
    fn set_status(&self, state: &mut ClassifierState, candidate: SessionStatus) {
        if candidate == state.status || state.status == SessionStatus::Exited {
            return;
        }
        let now = Instant::now();
        if let Some(last) = state.last_change_at {
            if now.duration_since(last) < self.config.debounce_interval {
                trace!(
                    target: "termwatch::activity",
                    current = %state.status,
                    candidate = %candidate,
                    "Status change discarded by debounce"
                );
                return;
            }
        }

        let previous = state.status;
        state.status = candidate;
        state.last_change_at = Some(now);
        debug!(target: "termwatch::activity", "Status {} -> {}", previous, candidate);

        let notify = self.notify.clone();
        self.dispatcher.submit(move || notify(previous, candidate));
    }
}

/// Classifies a session's activity from its output stream.
///
/// Owned by exactly one session. Dropping it stops the idle timer.
pub struct ActivityClassifier {
    shared: Arc<Shared>,
    idle_task: JoinHandle<()>,
}

impl std::fmt::Debug for ActivityClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityClassifier")
            .field("config", &self.shared.config)
            .field("status", &self.status())
            .finish()
    }
}

impl ActivityClassifier {
    /// Create a classifier with default settings on the global dispatcher.
    ///
    /// Must be called from within a tokio runtime, which drives the idle timer.
    pub fn new<F>(notify: F) -> Result<Self>
    where
        F: Fn(SessionStatus, SessionStatus) + Send + Sync + 'static,
    {
        Self::with_config(ClassifierConfig::default(), Dispatcher::global(), notify)
    }

    pub fn with_config<F>(config: ClassifierConfig, dispatcher: Dispatcher, notify: F) -> Result<Self>
    where
        F: Fn(SessionStatus, SessionStatus) + Send + Sync + 'static,
    {
        config.validate()?;
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| TermwatchError::NoRuntime)?;

        let now = Instant::now();
        let state = ClassifierState {
            status: SessionStatus::Active,
            window: TailWindow::new(config.window_bytes),
            last_output_at: now,
            last_change_at: None,
            idle_deadline: now + config.idle_timeout,
            stopped: false,
        };
        let shared = Arc::new(Shared {
            config,
            dispatcher,
            notify: Arc::new(notify),
            state: Mutex::new(state),
        });

        let idle_task = runtime.spawn(run_idle_timer(shared.clone()));

        Ok(Self { shared, idle_task })
    }

    /// Feed a chunk of terminal output.
    ///
    /// Called from the PTY read loop; never blocks on I/O. Empty reads are
    /// not output and leave the idle timer alone.
    pub fn process_output(&self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        let shared = &self.shared;
        let mut state = lock(&shared.state);
        if state.stopped {
            return;
        }

        let now = Instant::now();
        state.last_output_at = now;
        state.idle_deadline = now + shared.config.idle_timeout;
        state.window.push(data);

        let window = state.window.text();
        let tail = strip_ansi(last_lines(&window, shared.config.prompt_lines));
        let candidate = if matches_prompt(&tail) {
            SessionStatus::NeedsInput
        } else {
            SessionStatus::Active
        };
        drop(window);

        shared.set_status(&mut state, candidate);
    }

    /// Mark the session as exited. Goes through the same debounce as any
    /// other change.
    pub fn set_exited(&self) {
        let mut state = lock(&self.shared.state);
        if state.stopped {
            return;
        }
        self.shared.set_status(&mut state, SessionStatus::Exited);
    }

    /// Current status.
    pub fn status(&self) -> SessionStatus {
        lock(&self.shared.state).status
    }

    /// Stop the idle timer. Later calls on this classifier are no-ops.
    pub fn stop(&self) {
        let mut state = lock(&self.shared.state);
        if state.stopped {
            return;
        }
        state.stopped = true;
        self.idle_task.abort();
        trace!(target: "termwatch::activity", "Classifier stopped");
    }
}

impl Drop for ActivityClassifier {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Idle timer loop. Sleeps until the current deadline, then re-checks under
/// the lock; output arriving meanwhile pushes the deadline forward.
async fn run_idle_timer(shared: Arc<Shared>) {
    let idle_timeout = shared.config.idle_timeout;
    loop {
        let deadline = {
            let state = lock(&shared.state);
            if state.stopped {
                return;
            }
            state.idle_deadline
        };

        tokio::time::sleep_until(deadline).await;

        let mut state = lock(&shared.state);
        if state.stopped {
            return;
        }
        let now = Instant::now();
        if now < state.idle_deadline {
            continue;
        }
        if state.status == SessionStatus::Active
            && now.duration_since(state.last_output_at) >= idle_timeout
        {
            info!(
                target: "termwatch::activity",
                quiet_ms = now.duration_since(state.last_output_at).as_millis() as u64,
                "No output within idle timeout"
            );
            shared.set_status(&mut state, SessionStatus::Idle);
        }
        state.idle_deadline = now + idle_timeout;
    }
}
