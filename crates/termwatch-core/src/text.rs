//! Stateless text cleanup shared by the classifier and the recorder.
//!
//! All patterns are compiled once per process and shared by every session.

use once_cell::sync::Lazy;
use regex::Regex;

/// Comprehensive regex for ANSI escape sequences.
/// Matches:
/// - CSI sequences: ESC [ ... letter (colors, cursor, private modes)
/// - OSC sequences: ESC ] ... BEL or ESC \ (window title, etc.)
/// - Character set: ESC ( or ESC ) followed by character
/// - Other escapes: ESC = ESC > ESC M etc.
static ANSI_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\x1b\[[0-9;?]*[A-Za-z]",    // CSI sequences
        r"|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)", // OSC sequences ending with BEL or ST
        r"|\x1b[()][A-Z0-9]",          // Character set selection
        r"|\x1b[=>MNOP78]",            // Other single-char escapes
        r"|\x1b",                       // Catch any remaining bare ESC
    ))
    .expect("ANSI pattern is valid")
});

static BLANK_LINE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("blank line pattern is valid"));

/// Transient output that should not be logged verbatim when repeated.
static ANIMATION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^[\s⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏⣾⣽⣻⢿⡿⣟⣯⣷|/\-\\]+$", // spinner glyphs
        r"^\s*\d+%",                                // progress percentages
    ]
    .iter()
    .map(|p| Regex::new(p).expect("animation pattern is valid"))
    .collect()
});

/// Strip ANSI escape codes from text.
pub fn strip_ansi(text: &str) -> String {
    ANSI_REGEX.replace_all(text, "").into_owned()
}

/// Return the last `n` newline-separated lines of `text`.
///
/// A trailing newline counts as an (empty) final line, so `"a\nb\n"` with
/// `n = 2` yields `"b\n"`.
pub fn last_lines(text: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match text.rmatch_indices('\n').nth(n - 1) {
        Some((idx, _)) => &text[idx + 1..],
        None => text,
    }
}

/// Normalize raw terminal output for the transcript.
///
/// Strips escape sequences and carriage returns, collapses runs of three or
/// more newlines down to two, and trims surrounding whitespace.
pub fn clean_for_transcript(text: &str) -> String {
    let stripped = strip_ansi(text);
    let without_cr = stripped.replace('\r', "");
    let collapsed = BLANK_LINE_RUN.replace_all(&without_cr, "\n\n");
    collapsed.trim().to_string()
}

/// Whether cleaned output looks like a spinner or progress frame.
pub fn is_animation_frame(text: &str) -> bool {
    ANIMATION_PATTERNS.iter().any(|p| p.is_match(text))
}

/// Offset where an unfinished escape sequence or a partial UTF-8 character
/// begins at the end of `bytes`, or `bytes.len()` when the tail is complete.
///
/// Bytes from that offset on should wait for the next chunk before cleaning.
pub fn incomplete_tail_start(bytes: &[u8]) -> usize {
    let end = match bytes.iter().rposition(|&b| b == 0x1b) {
        Some(esc) if !escape_complete(&bytes[esc..]) => esc,
        _ => bytes.len(),
    };
    end - partial_char_len(&bytes[..end])
}

/// Whether `seq`, starting at ESC and holding no later ESC, is finished.
fn escape_complete(seq: &[u8]) -> bool {
    match seq.get(1) {
        None => false,
        // CSI: parameter and intermediate bytes, then a final byte.
        Some(b'[') => seq[2..].iter().any(|b| !(0x20..=0x3f).contains(b)),
        // OSC: a terminating ST would start with another ESC, so only BEL counts.
        Some(b']') => seq[2..].contains(&0x07),
        Some(b'(') | Some(b')') => seq.len() > 2,
        Some(_) => true,
    }
}

/// Length of a multi-byte character cut off at the end of `bytes`.
fn partial_char_len(bytes: &[u8]) -> usize {
    for back in 1..=bytes.len().min(3) {
        let b = bytes[bytes.len() - back];
        if b & 0xc0 == 0x80 {
            continue;
        }
        let width = match b {
            0xf0..=0xff => 4,
            0xe0..=0xef => 3,
            0xc0..=0xdf => 2,
            _ => 1,
        };
        return if width > back { back } else { 0 };
    }
    0
}

/// Collapse every whitespace run (including newlines) to a single space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strip_ansi_codes() {
        let cases = [
            ("hello world", "hello world"),
            ("\x1b[32mgreen\x1b[0m", "green"),
            ("\x1b[1;1Hhello", "hello"),
            ("\x1b]0;My Title\x07rest", "rest"),
            ("\x1b]0;title\x1b\\after", "after"),
            ("\x1b[?25lhidden cursor\x1b[?25h", "hidden cursor"),
            ("\x1b(Bplain", "plain"),
        ];
        for (input, want) in cases {
            assert_eq!(strip_ansi(input), want, "input {:?}", input);
        }
    }

    #[test]
    fn test_strip_ansi_split_sequence_drops_bare_escape() {
        // A chunk boundary inside a CSI sequence leaves only its tail behind.
        assert_eq!(strip_ansi("text\x1b"), "text");
    }

    #[test]
    fn test_osc_with_st_does_not_reach_later_bel() {
        assert_eq!(
            strip_ansi("\x1b]0;title\x1b\\visible text\x07"),
            "visible text\x07"
        );
    }

    #[test]
    fn test_incomplete_tail_start() {
        let cases: [(&[u8], usize); 11] = [
            (b"plain", 5),
            (b"text\x1b", 4),
            (b"text\x1b[3", 4),
            (b"text\x1b[32m", 9),
            (b"a\x1b]0;title", 1),
            (b"a\x1b]0;title\x07", 11),
            (b"a\x1b]0;t\x1b\\", 8),
            (b"\x1b(", 0),
            (b"\x1b(B", 3),
            ("done \u{2714}".as_bytes(), 8),
            (&"done \u{2714}".as_bytes()[..7], 5),
        ];
        for (input, want) in cases {
            assert_eq!(incomplete_tail_start(input), want, "input {:?}", input);
        }
    }

    #[test]
    fn test_last_lines() {
        assert_eq!(last_lines("hello", 3), "hello");
        assert_eq!(last_lines("a\nb\nc", 3), "a\nb\nc");
        assert_eq!(last_lines("a\nb\nc\nd\ne", 3), "c\nd\ne");
        assert_eq!(last_lines("a\nb\n", 2), "b\n");
        assert_eq!(last_lines("a\nb", 0), "");
    }

    #[test]
    fn test_clean_for_transcript() {
        assert_eq!(clean_for_transcript("  \x1b[1mBuild\x1b[0m ok\r\n"), "Build ok");
        assert_eq!(clean_for_transcript("a\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(clean_for_transcript("a\r\n\r\n\r\nb"), "a\n\nb");
        assert_eq!(clean_for_transcript("\x1b[2K\r"), "");
    }

    #[test]
    fn test_is_animation_frame() {
        assert!(is_animation_frame("⠋"));
        assert!(is_animation_frame("⠙ ⠹"));
        assert!(is_animation_frame("|"));
        assert!(is_animation_frame("45% downloaded"));
        assert!(is_animation_frame("  7%"));
        assert!(!is_animation_frame("Compiling termwatch"));
        assert!(!is_animation_frame("step 45%"));
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\n b\tc  "), "a b c");
    }

    proptest! {
        #[test]
        fn strip_ansi_removes_every_escape(s in "(\\PC|\x1b|\\[|\\]|\x07|[0-9;?m])*") {
            prop_assert!(!strip_ansi(&s).contains('\x1b'));
        }

        #[test]
        fn cleaned_text_is_normalized(s in "(\\PC|\r|\n|\x1b\\[[0-9]{1,2}m)*") {
            let cleaned = clean_for_transcript(&s);
            prop_assert!(!cleaned.contains('\r'));
            prop_assert!(!cleaned.contains("\n\n\n"));
            prop_assert_eq!(cleaned.trim(), cleaned.as_str());
        }
    }
}
