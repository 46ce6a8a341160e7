//! Live monitoring of a session's output stream read from stdin.

use crate::config::Config;
use crate::sink::TranscriptFile;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use termwatch_core::{Dispatcher, SessionMonitor};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

const READ_CHUNK: usize = 8192;

/// Options for `termwatch watch`.
#[derive(Debug, Clone, Default)]
pub struct WatchOptions {
    /// Name used in logs for this session.
    pub name: String,
    /// Where flushed transcript batches are appended.
    pub transcript: Option<PathBuf>,
    /// File or FIFO carrying the session's keystrokes.
    pub input: Option<PathBuf>,
    /// Copy output through to stdout.
    pub tee: bool,
}

/// Watch stdin until EOF.
pub async fn run(config: &Config, opts: WatchOptions) -> Result<()> {
    let dispatcher = Dispatcher::new(config.dispatch_queue);
    let mut stdout = tokio::io::stdout();
    let sink = if opts.tee { Some(&mut stdout) } else { None };
    watch_stream(config, opts, dispatcher, tokio::io::stdin(), sink).await
}

/// Feed `output` to a fresh monitor until it ends, then tear the monitor down
/// and wait for the last transcript batch to be written.
pub async fn watch_stream<R, W>(
    config: &Config,
    opts: WatchOptions,
    dispatcher: Dispatcher,
    mut output: R,
    mut tee: Option<&mut W>,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let monitor_config = config.monitor_config();
    let debounce = monitor_config.classifier.debounce_interval;
    let transcript = opts.transcript.clone().map(TranscriptFile::new);
    let session = opts.name.clone();

    let monitor = Arc::new(
        SessionMonitor::start(
            opts.name.clone(),
            monitor_config,
            dispatcher.clone(),
            move |old, new| {
                info!(target: "termwatch::cli", session = %session, "Status {} -> {}", old, new);
            },
            move |batch| match &transcript {
                Some(file) => file.append(&batch),
                None => debug!(target: "termwatch::cli", bytes = batch.len(), "Discarding batch"),
            },
        )
        .context("failed to start session monitor")?,
    );

    let input_task = opts
        .input
        .clone()
        .map(|path| tokio::spawn(pump_input(path, monitor.clone())));

    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        let n = output.read(&mut buf).await.context("failed to read session output")?;
        if n == 0 {
            break;
        }
        let chunk = &buf[..n];
        if let Some(writer) = tee.as_deref_mut() {
            writer.write_all(chunk).await?;
            writer.flush().await?;
        }
        monitor.process_output(chunk);
    }
    debug!(target: "termwatch::cli", "Session output closed");

    if let Some(task) = input_task {
        task.abort();
    }

    // A change inside the debounce window would be dropped.
    tokio::time::sleep(debounce).await;
    monitor.set_exited();
    monitor.stop();
    info!(target: "termwatch::cli", status = %monitor.status(), "Session ended");

    dispatcher.settle().await?;
    Ok(())
}

async fn pump_input(path: PathBuf, monitor: Arc<SessionMonitor>) {
    let mut file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) => {
            warn!(target: "termwatch::cli", path = %path.display(), "Cannot open input stream: {}", e);
            return;
        }
    };
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        match file.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => monitor.record_input(&buf[..n]),
            Err(e) => {
                warn!(target: "termwatch::cli", "Input stream failed: {}", e);
                break;
            }
        }
    }
}
