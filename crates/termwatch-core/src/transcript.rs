//! Reading and searching stored transcripts.

use crate::text::collapse_whitespace;
use crate::{Result, TermwatchError};
use std::path::Path;
use termwatch_types::{TranscriptEntry, TranscriptMatch};
use tracing::debug;

/// Characters of context kept on each side of a search match.
pub const SNIPPET_CONTEXT_CHARS: usize = 100;

/// Parse concatenated JSONL batches. Blank and malformed lines are skipped.
pub fn parse_transcript(data: &[u8]) -> Vec<TranscriptEntry> {
    String::from_utf8_lossy(data)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_str::<TranscriptEntry>(line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(target: "termwatch::transcript", "Skipping malformed line: {}", e);
                None
            }
        })
        .collect()
}

/// Concatenate the text of every entry, in order.
pub fn render_transcript(data: &[u8]) -> String {
    parse_transcript(data)
        .into_iter()
        .map(|entry| entry.text)
        .collect()
}

pub fn read_transcript_file(path: &Path) -> Result<Vec<u8>> {
    Ok(std::fs::read(path)?)
}

/// Text around a match, at most `context` characters either side, with
/// whitespace collapsed for single-line display.
///
/// `match_offset` and `match_len` are byte positions; they are widened to
/// the nearest character boundaries.
pub fn extract_snippet(text: &str, match_offset: usize, match_len: usize, context: usize) -> String {
    let start_byte = floor_char_boundary(text, match_offset);
    let end_byte = ceil_char_boundary(text, match_offset.saturating_add(match_len));

    let start = text[..start_byte]
        .char_indices()
        .rev()
        .take(context)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(start_byte);
    let end = text[end_byte..]
        .char_indices()
        .nth(context)
        .map(|(i, _)| end_byte + i)
        .unwrap_or(text.len());

    collapse_whitespace(&text[start..end])
}

/// Case-insensitive search for the first occurrence of `query` in a raw
/// transcript.
pub fn search_transcript(
    source: &str,
    data: &[u8],
    query: &str,
) -> Result<Option<TranscriptMatch>> {
    if query.is_empty() {
        return Err(TermwatchError::EmptyQuery);
    }
    let text = String::from_utf8_lossy(data);
    let Some((offset, len)) = find_case_insensitive(&text, query) else {
        return Ok(None);
    };
    Ok(Some(TranscriptMatch {
        source: source.to_string(),
        offset,
        snippet: extract_snippet(&text, offset, len, SNIPPET_CONTEXT_CHARS),
    }))
}

/// Byte offset and length in `haystack` of the first case-insensitive match.
///
/// Compares char by char so offsets stay valid in the original text even
/// when lowercasing changes byte lengths.
fn find_case_insensitive(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    let needle: Vec<char> = needle.chars().flat_map(char::to_lowercase).collect();
    haystack.char_indices().find_map(|(start, _)| {
        let mut matched = 0;
        for (i, c) in haystack[start..].char_indices() {
            for lc in c.to_lowercase() {
                if matched == needle.len() || needle[matched] != lc {
                    return None;
                }
                matched += 1;
            }
            if matched == needle.len() {
                return Some((start, i + c.len_utf8()));
            }
        }
        None
    })
}

fn floor_char_boundary(text: &str, mut idx: usize) -> usize {
    if idx >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_char_boundary(text: &str, mut idx: usize) -> usize {
    if idx >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;
    use termwatch_types::EntryKind;

    const SAMPLE: &str = concat!(
        r#"{"ts":1,"type":"output","text":"Compiling crate"}"#,
        "\n",
        "not json at all\n",
        "\n",
        r#"{"ts":2,"type":"input","text":"cargo test\n"}"#,
        "\n",
    );

    #[test]
    fn test_parse_skips_bad_lines() {
        let entries = parse_transcript(SAMPLE.as_bytes());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, EntryKind::Output);
        assert_eq!(entries[1].text, "cargo test\n");
    }

    #[test]
    fn test_render_concatenates_text() {
        assert_eq!(render_transcript(SAMPLE.as_bytes()), "Compiling cratecargo test\n");
    }

    #[test]
    fn test_extract_snippet_window() {
        let text = "0123456789MATCH0123456789";
        assert_eq!(extract_snippet(text, 10, 5, 3), "789MATCH012");
        assert_eq!(extract_snippet(text, 10, 5, 100), text);
    }

    #[test]
    fn test_extract_snippet_collapses_newlines() {
        let text = "line one\n\nfound it\n  next";
        let offset = text.find("found").unwrap();
        assert_eq!(extract_snippet(text, offset, 5, 100), "line one found it next");
    }

    #[test]
    fn test_extract_snippet_multibyte_context() {
        let text = "❯❯❯ hit ❯❯❯";
        let offset = text.find("hit").unwrap();
        assert_eq!(extract_snippet(text, offset, 3, 2), "❯ hit ❯");
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let hit = search_transcript("a.jsonl", SAMPLE.as_bytes(), "CARGO TEST")
            .unwrap()
            .unwrap();
        assert_eq!(hit.source, "a.jsonl");
        assert_eq!(&SAMPLE[hit.offset..hit.offset + 10], "cargo test");
        assert!(hit.snippet.contains("cargo test"));
    }

    #[test]
    fn test_search_no_match() {
        assert!(search_transcript("a", SAMPLE.as_bytes(), "rustfmt").unwrap().is_none());
    }

    #[test]
    fn test_search_rejects_empty_query() {
        assert!(matches!(
            search_transcript("a", SAMPLE.as_bytes(), ""),
            Err(TermwatchError::EmptyQuery)
        ));
    }
}
