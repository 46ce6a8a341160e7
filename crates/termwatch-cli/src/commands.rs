//! Offline commands over stored transcripts.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use termwatch_core::{
    learnings_context, parse_learnings, read_transcript_file, render_transcript,
    search_transcript, session_context, title_context, SummaryConfig,
};
use termwatch_types::TranscriptMatch;
use tracing::debug;

/// Which summarizer input to prepare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ContextKind {
    /// Leading output, for a short session title
    Title,
    /// Trailing transcript, for extracting learnings
    Learnings,
}

/// Rendered text of a transcript file.
pub fn show(path: &Path) -> Result<String> {
    let data = read_transcript_file(path)
        .with_context(|| format!("failed to read transcript {}", path.display()))?;
    Ok(render_transcript(&data))
}

/// First match of `query` in each transcript. Unreadable files are skipped.
pub fn search(query: &str, paths: &[PathBuf]) -> Result<Vec<TranscriptMatch>> {
    if query.is_empty() {
        bail!("query cannot be empty");
    }
    let mut hits = Vec::new();
    for path in paths {
        let data = match read_transcript_file(path) {
            Ok(data) => data,
            Err(e) => {
                debug!(target: "termwatch::cli", path = %path.display(), "Skipping transcript: {}", e);
                continue;
            }
        };
        if let Some(hit) = search_transcript(&path.display().to_string(), &data, query)? {
            hits.push(hit);
        }
    }
    Ok(hits)
}

/// Summarizer input for a transcript, or `None` if it is too short.
pub fn context(path: &Path, kind: ContextKind, config: &SummaryConfig) -> Result<Option<String>> {
    let text = show(path)?;
    Ok(match kind {
        ContextKind::Title => title_context(&text, config),
        ContextKind::Learnings => learnings_context(&text, config),
    })
}

/// Context for a new session built from saved learnings files, one learning
/// per line, oldest file first. `None` when no learnings were found.
pub fn insights(paths: &[PathBuf], config: &SummaryConfig) -> Result<Option<String>> {
    let mut learnings = Vec::new();
    for path in paths {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read learnings {}", path.display()))?;
        learnings.extend(parse_learnings(&raw));
    }
    Ok(session_context(&learnings, config.max_learnings))
}

pub fn format_match(hit: &TranscriptMatch) -> String {
    format!("{}:{}: {}", hit.source, hit.offset, hit.snippet)
}
