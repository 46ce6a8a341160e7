//! Per-session pairing of classifier and recorder.

use crate::{ActivityClassifier, Dispatcher, MonitorConfig, Result, TranscriptRecorder};
use std::sync::atomic::{AtomicBool, Ordering};
use termwatch_types::SessionStatus;
use tracing::info;

/// Everything watched for one session. Created when monitoring starts and
/// torn down once, on [`SessionMonitor::stop`] or drop.
#[derive(Debug)]
pub struct SessionMonitor {
    name: String,
    classifier: ActivityClassifier,
    recorder: TranscriptRecorder,
    stopped: AtomicBool,
}

impl SessionMonitor {
    /// Start monitoring a session.
    ///
    /// `on_status` receives `(previous, new)` for every accepted transition;
    /// `on_flush` receives JSONL transcript batches. Both run on `dispatcher`.
    pub fn start<S, F>(
        name: impl Into<String>,
        config: MonitorConfig,
        dispatcher: Dispatcher,
        on_status: S,
        on_flush: F,
    ) -> Result<Self>
    where
        S: Fn(SessionStatus, SessionStatus) + Send + Sync + 'static,
        F: Fn(Vec<u8>) + Send + Sync + 'static,
    {
        config.validate()?;
        let name = name.into();
        let classifier =
            ActivityClassifier::with_config(config.classifier, dispatcher.clone(), on_status)?;
        let recorder = TranscriptRecorder::with_config(config.recorder, dispatcher, on_flush)?;
        info!(target: "termwatch::session", session = %name, "Monitoring started");

        Ok(Self {
            name,
            classifier,
            recorder,
            stopped: AtomicBool::new(false),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fan a chunk of session output out to both components.
    pub fn process_output(&self, data: &[u8]) {
        self.classifier.process_output(data);
        self.recorder.record_output(data);
    }

    /// Record a chunk of user keystrokes.
    pub fn record_input(&self, data: &[u8]) {
        self.recorder.record_input(data);
    }

    /// Signal that the session's process has exited.
    pub fn set_exited(&self) {
        self.classifier.set_exited();
    }

    pub fn status(&self) -> SessionStatus {
        self.classifier.status()
    }

    /// Stop both components and flush the transcript. Only the first call
    /// does anything.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        self.classifier.stop();
        self.recorder.stop();
        info!(
            target: "termwatch::session",
            session = %self.name,
            status = %self.classifier.status(),
            "Monitoring stopped"
        );
    }
}

impl Drop for SessionMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
