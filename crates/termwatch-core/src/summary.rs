//! Preparing session text for an external summarizer and cleaning its replies.
//!
//! The summarizer itself lives outside this crate; these helpers bound the
//! context it is given and normalize what comes back.

use crate::text::{collapse_whitespace, strip_ansi};
use crate::SummaryConfig;

/// Strip escape sequences and collapse whitespace to single spaces.
pub fn clean_for_summary(text: &str) -> String {
    collapse_whitespace(&strip_ansi(text))
}

/// Leading slice of cleaned output used to title a session, or `None` when
/// there is too little output to say anything.
pub fn title_context(text: &str, config: &SummaryConfig) -> Option<String> {
    let cleaned = clean_for_summary(text);
    if cleaned.chars().count() < config.min_title_input_chars {
        return None;
    }
    Some(cleaned.chars().take(config.title_context_chars).collect())
}

/// Trailing slice of a transcript used to extract learnings, or `None` when
/// the transcript is too short.
pub fn learnings_context(transcript: &str, config: &SummaryConfig) -> Option<String> {
    let total = transcript.chars().count();
    if total < config.min_learnings_input_chars {
        return None;
    }
    let skip = total.saturating_sub(config.learnings_context_chars);
    Some(transcript.chars().skip(skip).collect())
}

/// Reduce a summarizer reply to a single short title line.
pub fn sanitize_title(raw: &str, config: &SummaryConfig) -> String {
    let first_line = raw.trim().lines().next().unwrap_or("").trim();
    first_line.chars().take(config.title_max_chars).collect()
}

/// One learning per non-empty line of a summarizer reply.
pub fn parse_learnings(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Drop learnings that repeat an earlier one, ignoring case.
pub fn dedupe_learnings(learnings: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    learnings
        .into_iter()
        .filter(|l| seen.insert(l.to_lowercase()))
        .collect()
}

/// Prior learnings rendered for injection into a new session, keeping the
/// `max` most recent after dropping repeats. `None` when there are none.
pub fn session_context(learnings: &[String], max: usize) -> Option<String> {
    let unique = dedupe_learnings(learnings.to_vec());
    if unique.is_empty() || max == 0 {
        return None;
    }
    let recent = &unique[unique.len().saturating_sub(max)..];

    let mut context = String::from("Engineering insights from previous sessions:\n");
    for learning in recent {
        context.push_str("- ");
        context.push_str(learning);
        context.push('\n');
    }
    Some(context)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SummaryConfig {
        SummaryConfig {
            title_context_chars: 10,
            learnings_context_chars: 5,
            title_max_chars: 8,
            min_title_input_chars: 4,
            min_learnings_input_chars: 6,
            max_learnings: 2,
        }
    }

    #[test]
    fn test_clean_for_summary() {
        assert_eq!(
            clean_for_summary("\x1b[1mfix\x1b[0m  the\n\nbuild\r\n"),
            "fix the build"
        );
    }

    #[test]
    fn test_title_context_truncates_head() {
        let config = small_config();
        assert_eq!(title_context("abc", &config), None);
        assert_eq!(
            title_context("refactor the parser module", &config).as_deref(),
            Some("refactor t")
        );
    }

    #[test]
    fn test_learnings_context_keeps_tail() {
        let config = small_config();
        assert_eq!(learnings_context("short", &config), None);
        assert_eq!(learnings_context("0123456789", &config).as_deref(), Some("56789"));
    }

    #[test]
    fn test_learnings_context_multibyte() {
        let config = small_config();
        assert_eq!(learnings_context("❯❯❯❯❯❯❯", &config).as_deref(), Some("❯❯❯❯❯"));
    }

    #[test]
    fn test_sanitize_title() {
        let config = small_config();
        assert_eq!(sanitize_title("  Fix CI\nextra words", &config), "Fix CI");
        assert_eq!(sanitize_title("A very long title", &config), "A very l");
        assert_eq!(sanitize_title("", &config), "");
    }

    #[test]
    fn test_parse_and_dedupe_learnings() {
        let parsed = parse_learnings("Use rg for search\n\n  use RG for search \nPin tool versions\n");
        assert_eq!(parsed.len(), 3);
        let unique = dedupe_learnings(parsed);
        assert_eq!(unique, vec!["Use rg for search", "Pin tool versions"]);
    }

    #[test]
    fn test_session_context_keeps_most_recent() {
        let learnings = parse_learnings(
            "Run clippy before pushing\nPin tool versions\npin TOOL versions\nPrefer rg\n",
        );
        let config = small_config();
        assert_eq!(
            session_context(&learnings, config.max_learnings).as_deref(),
            Some("Engineering insights from previous sessions:\n- Pin tool versions\n- Prefer rg\n")
        );
    }

    #[test]
    fn test_session_context_empty() {
        assert_eq!(session_context(&[], 10), None);
        assert_eq!(session_context(&["x".to_string()], 0), None);
    }
}
